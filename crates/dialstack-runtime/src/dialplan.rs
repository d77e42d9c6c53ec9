//! Dialplan executor interface
//!
//! The executor itself lives in the host. The runtime consumes three things
//! from it: existence checks for dialplan locations, priority-label lookup,
//! and single-stepping for the AGI bridge's driving loop.

use tracing::error;

use crate::channel::{Channel, DialplanLocation};
use crate::error::StackError;
use crate::target::{GosubTarget, PrioritySpec};

/// Outcome of one executor step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The channel has a next location to execute
    Continue,
    /// The pbx detached from the channel; the driving loop stops
    Detached,
}

/// Host dialplan executor, as seen by the stack runtime
pub trait DialplanExec {
    /// Does `(context, extension, priority)` exist for this channel?
    fn exists(
        &self,
        chan: &Channel,
        context: &str,
        extension: &str,
        priority: u32,
        caller_id: Option<&str>,
    ) -> bool;

    /// Resolve a textual priority label to a numeric priority
    fn find_label(
        &self,
        chan: &Channel,
        context: &str,
        extension: &str,
        label: &str,
    ) -> Option<u32>;

    /// Execute whatever sits at the channel's current location and advance
    fn step(&self, chan: &Channel) -> StepOutcome;
}

/// Resolve a parsed target against the channel's current location and jump
///
/// Omitted fields default to the current context/extension. Label
/// priorities go through the executor's lookup. The jump is unconditional;
/// it is the caller's job to verify the destination exists and restore the
/// previous location if it does not.
pub fn parse_and_jump(
    dialplan: &dyn DialplanExec,
    chan: &Channel,
    target: &GosubTarget,
    data: &str,
) -> Result<(), StackError> {
    let here = chan.location();
    let context = target.context.clone().unwrap_or(here.context);
    let extension = target.extension.clone().unwrap_or(here.extension);

    let priority = match &target.priority {
        PrioritySpec::Number(n) if *n >= 1 => *n,
        PrioritySpec::Number(_) => {
            error!(target_string = data, "priority must be a number > 0");
            return Err(StackError::InvalidTarget {
                target: data.to_string(),
            });
        }
        PrioritySpec::Label(label) => {
            match dialplan.find_label(chan, &context, &extension, label) {
                Some(priority) if priority >= 1 => priority,
                _ => {
                    error!(
                        target_string = data,
                        label = %label,
                        "priority label does not resolve"
                    );
                    return Err(StackError::InvalidTarget {
                        target: data.to_string(),
                    });
                }
            }
        }
    };

    chan.set_location(DialplanLocation {
        context,
        extension,
        priority,
    });
    Ok(())
}

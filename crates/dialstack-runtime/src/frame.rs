//! Activation frames for the gosub stack
//!
//! A frame records where a `Gosub` should return to and which variable names
//! it shadowed, so releasing the frame can unshadow them in reverse order.

use tracing::debug;

use crate::channel::{Channel, DialplanLocation, VarStore};
use crate::error::StackError;
use crate::events::EventPublisher;

/// One activation record on the gosub stack
#[derive(Debug)]
pub struct Frame {
    return_to: DialplanLocation,
    argument_count: usize,
    // names shadowed by this frame, in install order
    locals: Vec<String>,
    is_agi: bool,
}

impl Frame {
    /// Construct a frame with empty locals
    ///
    /// `argc` is only a sizing hint and the recorded argument count; the
    /// arguments themselves are installed afterwards with
    /// [`Frame::install_local`].
    pub fn make(return_to: DialplanLocation, argc: usize) -> Result<Self, StackError> {
        let mut locals = Vec::new();
        // ARG1..ARGN plus ARGC
        locals
            .try_reserve(argc + 1)
            .map_err(|_| StackError::OutOfMemory)?;
        Ok(Self {
            return_to,
            argument_count: argc,
            locals,
            is_agi: false,
        })
    }

    /// Where a matching `Return` resumes
    pub fn return_to(&self) -> &DialplanLocation {
        &self.return_to
    }

    pub fn argument_count(&self) -> usize {
        self.argument_count
    }

    /// True when the frame was created by the AGI bridge
    pub fn is_agi(&self) -> bool {
        self.is_agi
    }

    pub(crate) fn set_agi(&mut self, is_agi: bool) {
        self.is_agi = is_agi;
    }

    /// Whether this frame installed a local binding for `name`
    pub fn has_local(&self, name: &str) -> bool {
        self.locals.iter().any(|local| local == name)
    }

    /// Install or update a frame-local binding
    ///
    /// First install of a name pushes a shadowing binding on the store and
    /// records the name; a repeat install overwrites the innermost value
    /// without adding a second shadow, so release issues exactly one
    /// unshadow per recorded name.
    pub fn install_local(
        &mut self,
        chan: &Channel,
        vars: &mut VarStore,
        events: &EventPublisher,
        name: &str,
        value: &str,
    ) {
        if self.has_local(name) {
            vars.set_innermost(name, value);
        } else {
            vars.push_shadowing(name, value);
            self.locals.push(name.to_string());
        }
        events.publish_local_set(chan, name, value);
    }

    /// Release the frame, unshadowing its locals in reverse install order
    ///
    /// `vars` is `None` during channel teardown: the store is being
    /// destroyed wholesale, so the unshadow step is skipped.
    pub fn release(self, vars: Option<&mut VarStore>) {
        if let Some(vars) = vars {
            for name in self.locals.iter().rev() {
                vars.pop_innermost(name);
            }
        }
        debug!(
            return_to = %self.return_to,
            locals = self.locals.len(),
            "released gosub frame"
        );
    }
}

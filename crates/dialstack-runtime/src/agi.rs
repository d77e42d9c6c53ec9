//! AGI bridge: run a dialplan subroutine synchronously for a script
//!
//! The external scripting transport can ask for a subroutine to run NOW on
//! a live channel. The bridge validates the target, performs the Gosub,
//! marks the pushed frame so `Return` stops the stepping loop, drives the
//! executor until the pbx detaches, and puts the channel back where the
//! script left it.

use crate::apps::Dialstack;
use crate::channel::Channel;
use crate::dialplan::{DialplanExec, StepOutcome};
use crate::error::StackError;

/// Usage text for the AGI `gosub` command
pub const AGI_GOSUB_USAGE: &str = "Usage: GOSUB <context> <extension> <priority> [<optional-argument>]\n\
\tCause the channel to execute the specified dialplan subroutine, returning\n\
\tto the dialplan with execution of a Return()\n";

/// Line-oriented reply sink toward the AGI script
pub trait AgiTransport {
    fn send(&mut self, line: &str);
}

/// Result the AGI dispatcher acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgiStatus {
    Success,
    Failure,
    /// Malformed argument count; the dispatcher prints the usage text
    ShowUsage,
}

impl Dialstack {
    /// AGI `gosub context extension priority [argument]`
    ///
    /// `argv` carries the command's arguments, command name excluded.
    pub fn handle_agi_gosub(
        &self,
        dialplan: &dyn DialplanExec,
        chan: &Channel,
        argv: &[&str],
        transport: &mut dyn AgiTransport,
    ) -> AgiStatus {
        if argv.len() < 3 || argv.len() > 4 {
            return AgiStatus::ShowUsage;
        }
        let (context, extension, pri_str) = (argv[0], argv[1], argv[2]);
        let arg = argv.get(3).copied().unwrap_or("");

        let priority = match pri_str.parse::<u32>() {
            Ok(p) if p >= 1 => Some(p),
            Ok(_) => None,
            Err(_) => dialplan
                .find_label(chan, context, extension, pri_str)
                .filter(|p| *p >= 1),
        };
        let Some(priority) = priority else {
            transport.send("200 result=-1 Gosub label not found\n");
            return AgiStatus::Failure;
        };

        let saved = chan.location();
        // Without a pbx the bridge drives the first step itself, so the
        // target priority is not advanced.
        let bump = u32::from(chan.has_pbx());
        let target = if arg.is_empty() {
            format!("{},{},{}", context, extension, priority + bump)
        } else {
            format!("{},{},{}({})", context, extension, priority + bump, arg)
        };

        match self.gosub(dialplan, chan, &target) {
            Ok(()) => {}
            Err(StackError::OutOfMemory) => {
                transport.send("503 result=-2 Memory allocation failure\n");
                return AgiStatus::Failure;
            }
            Err(StackError::NoSuchTarget { .. }) | Err(StackError::InvalidTarget { .. }) => {
                transport.send("200 result=-1 Gosub label not found\n");
                return AgiStatus::Failure;
            }
            Err(_) => {
                transport.send("200 result=-1 Gosub failed\n");
                return AgiStatus::Failure;
            }
        }

        {
            let mut slot = chan.lock_stack();
            if let Some(frame) = slot.as_mut().and_then(|frames| frames.peek_mut()) {
                frame.set_agi(true);
            }
        }

        transport.send("100 result=0 Trying...\n");
        let prev_hangup = chan.set_no_hangup_on_exit(true);
        let prev_pbx = chan.set_pbx_attached(true);
        while dialplan.step(chan) == StepOutcome::Continue {}
        chan.set_pbx_attached(prev_pbx);
        chan.set_no_hangup_on_exit(prev_hangup);
        transport.send("200 result=0 Gosub complete\n");

        chan.set_location(saved);
        AgiStatus::Success
    }
}

//! Dialplan applications: Gosub, GosubIf, Return, StackPop
//!
//! [`Dialstack`] is the runtime a host embeds: it holds the manager event
//! publisher and exposes one handler per application plus a string-name
//! dispatch for hosts that register applications by name. The `LOCAL` and
//! `LOCAL_PEEK` function handlers live in [`crate::funcs`], the AGI bridge
//! in [`crate::agi`].

use tracing::{debug, error};

use crate::channel::{Channel, DialplanLocation};
use crate::dialplan::{self, DialplanExec};
use crate::error::StackError;
use crate::events::EventPublisher;
use crate::frame::Frame;
use crate::stack;
use crate::target;

/// Channel variable holding the last `Return` value; never frame-local
pub const GOSUB_RETVAL: &str = "GOSUB_RETVAL";

/// The registered stack applications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackApp {
    Gosub,
    GosubIf,
    Return,
    StackPop,
}

impl StackApp {
    /// Look up an application by its registered name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "Gosub" => Some(Self::Gosub),
            "GosubIf" => Some(Self::GosubIf),
            "Return" => Some(Self::Return),
            "StackPop" => Some(Self::StackPop),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gosub => "Gosub",
            Self::GosubIf => "GosubIf",
            Self::Return => "Return",
            Self::StackPop => "StackPop",
        }
    }

    pub fn synopsis(self) -> &'static str {
        match self {
            Self::Gosub => "Jump to label, saving return address",
            Self::GosubIf => "Conditionally jump to label, saving return address",
            Self::Return => "Return from gosub routine",
            Self::StackPop => "Remove one address from the gosub stack",
        }
    }
}

/// What the host should do after a `Return`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnDisposition {
    /// Keep executing dialplan at the channel's (new) location
    Continue,
    /// The returned-from frame was AGI-originated: stop stepping so the
    /// AGI bridge's driving loop exits
    StopAgi,
}

/// The gosub stack runtime
pub struct Dialstack {
    pub(crate) events: EventPublisher,
}

impl Dialstack {
    /// Runtime with no manager connection
    pub fn new() -> Self {
        Self {
            events: EventPublisher::disabled(),
        }
    }

    /// Runtime publishing `VarSet` events through `events`
    pub fn with_events(events: EventPublisher) -> Self {
        Self { events }
    }

    /// Dispatch an application by registry identity
    pub fn exec(
        &self,
        dialplan: &dyn DialplanExec,
        chan: &Channel,
        app: StackApp,
        data: &str,
    ) -> Result<ReturnDisposition, StackError> {
        match app {
            StackApp::Gosub => self
                .gosub(dialplan, chan, data)
                .map(|()| ReturnDisposition::Continue),
            StackApp::GosubIf => self
                .gosub_if(dialplan, chan, data)
                .map(|()| ReturnDisposition::Continue),
            StackApp::Return => self.return_from(chan, data),
            StackApp::StackPop => {
                self.stack_pop(chan);
                Ok(ReturnDisposition::Continue)
            }
        }
    }

    /// `Gosub([[context,]extension,]priority[(arg1[,...[,argN]])])`
    ///
    /// Jumps to the target and pushes a frame recording where to return.
    /// On any failure the channel position and the stack are left exactly
    /// as they were.
    pub fn gosub(
        &self,
        dialplan: &dyn DialplanExec,
        chan: &Channel,
        data: &str,
    ) -> Result<(), StackError> {
        if data.trim().is_empty() {
            error!("Gosub requires a target: Gosub([[context,]extension,]priority[(args)])");
            return Err(StackError::InvalidArguments {
                msg: "Gosub requires a target".to_string(),
            });
        }
        let target = target::parse(data)?;
        stack::ensure(chan)?;

        let here = chan.location();
        // A channel driven from outside the pbx (AGI bridge before any pbx
        // is attached) resumes at its current priority, not the next one.
        let bump = u32::from(chan.has_pbx());
        let return_to = DialplanLocation {
            context: here.context.clone(),
            extension: here.extension.clone(),
            priority: here.priority + bump,
        };
        let mut frame = Frame::make(return_to, target.args.len())?;

        dialplan::parse_and_jump(dialplan, chan, &target, data)?;

        let landed = chan.location();
        if !dialplan.exists(
            chan,
            &landed.context,
            &landed.extension,
            landed.priority,
            chan.caller_id().as_deref(),
        ) {
            error!(
                channel = chan.name(),
                destination = %landed,
                "attempt to reach a non-existent destination"
            );
            chan.set_location(here);
            return Err(StackError::NoSuchTarget {
                context: landed.context,
                extension: landed.extension,
                priority: landed.priority,
            });
        }

        {
            let mut state = chan.lock_state();
            for (i, arg) in target.args.iter().enumerate() {
                let name = format!("ARG{}", i + 1);
                frame.install_local(chan, &mut state.vars, &self.events, &name, arg);
            }
            let argc = target.args.len().to_string();
            frame.install_local(chan, &mut state.vars, &self.events, "ARGC", &argc);
        }

        {
            let mut slot = chan.lock_stack();
            match slot.as_mut() {
                Some(frames) => frames.push(frame),
                // teardown raced us; the store goes away with the channel
                None => frame.release(None),
            }
        }
        debug!(channel = chan.name(), destination = %chan.location(), "gosub");
        Ok(())
    }

    /// `GosubIf(condition?true_target[:false_target])`
    ///
    /// A missing branch on the taken side is a successful no-op.
    pub fn gosub_if(
        &self,
        dialplan: &dyn DialplanExec,
        chan: &Channel,
        data: &str,
    ) -> Result<(), StackError> {
        let branches = target::parse_gosub_if(data)?;
        let taken = if target::is_truthy(branches.condition) {
            branches.if_true
        } else {
            branches.if_false
        };
        match taken {
            Some(branch) => self.gosub(dialplan, chan, branch),
            None => Ok(()),
        }
    }

    /// `Return([value])`
    ///
    /// Pops the top frame, resumes at its return address, restores the
    /// frame's shadowed variables, and stores `value` in `GOSUB_RETVAL`.
    pub fn return_from(
        &self,
        chan: &Channel,
        value: &str,
    ) -> Result<ReturnDisposition, StackError> {
        let popped = {
            let mut slot = chan.lock_stack();
            match slot.as_mut() {
                Some(frames) => frames.pop(),
                None => {
                    error!(channel = chan.name(), "Return on a channel with no gosub stack");
                    return Err(StackError::NotInSubroutine);
                }
            }
        };
        let Some(frame) = popped else {
            error!(channel = chan.name(), "Return without Gosub");
            return Err(StackError::EmptyStack);
        };

        let is_agi = frame.is_agi();
        let mut state = chan.lock_state();
        state.location = frame.return_to().clone();
        frame.release(Some(&mut state.vars));
        state.vars.set_innermost(GOSUB_RETVAL, value);
        drop(state);

        debug!(channel = chan.name(), destination = %chan.location(), "return");
        Ok(if is_agi {
            ReturnDisposition::StopAgi
        } else {
            ReturnDisposition::Continue
        })
    }

    /// `StackPop()`
    ///
    /// Forget the last Gosub without returning to it. An empty stack is
    /// deliberately tolerated.
    pub fn stack_pop(&self, chan: &Channel) {
        let popped = {
            let mut slot = chan.lock_stack();
            slot.as_mut().and_then(|frames| frames.pop())
        };
        match popped {
            Some(frame) => {
                let mut state = chan.lock_state();
                frame.release(Some(&mut state.vars));
            }
            None => debug!(channel = chan.name(), "StackPop with an empty stack"),
        }
    }
}

impl Default for Dialstack {
    fn default() -> Self {
        Self::new()
    }
}

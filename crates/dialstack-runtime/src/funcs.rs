//! Dialplan functions: LOCAL and LOCAL_PEEK
//!
//! `LOCAL(name)` reads and writes frame-local bindings in the top frame.
//! `LOCAL_PEEK(n, name)` reads through the shadow layers at the variable
//! store level, regardless of which frame installed them.

use tracing::error;

use crate::apps::Dialstack;
use crate::channel::Channel;
use crate::error::StackError;

/// Registered name of the LOCAL read/write function
pub const FUNC_LOCAL: &str = "LOCAL";
/// Registered name of the LOCAL_PEEK read-only function
pub const FUNC_LOCAL_PEEK: &str = "LOCAL_PEEK";

impl Dialstack {
    /// Read `LOCAL(name)`
    ///
    /// Empty when the stack is empty or `name` is not frame-local in the
    /// top frame; the dialplan read protocol treats absent and empty the
    /// same for LOCAL.
    pub fn local_read(&self, chan: &Channel, name: &str) -> String {
        let state = chan.lock_state();
        let slot = chan.lock_stack();
        let Some(frame) = slot.as_ref().and_then(|frames| frames.peek()) else {
            return String::new();
        };
        if frame.has_local(name) {
            state.vars.read(name).unwrap_or_default().to_string()
        } else {
            String::new()
        }
    }

    /// Write `LOCAL(name) = value` into the top frame
    pub fn local_write(&self, chan: &Channel, name: &str, value: &str) -> Result<(), StackError> {
        let mut state = chan.lock_state();
        let mut slot = chan.lock_stack();
        let Some(frame) = slot.as_mut().and_then(|frames| frames.peek_mut()) else {
            error!(
                channel = chan.name(),
                name, "tried to set LOCAL outside a Gosub routine"
            );
            return Err(StackError::NotInSubroutine);
        };
        frame.install_local(chan, &mut state.vars, &self.events, name, value);
        Ok(())
    }

    /// Read `LOCAL_PEEK(n, name)`: the (n+1)-th shadow layer of `name`,
    /// counting from the innermost; empty when fewer layers exist
    pub fn local_peek(
        &self,
        chan: Option<&Channel>,
        n: usize,
        name: &str,
    ) -> Result<String, StackError> {
        let Some(chan) = chan else {
            error!("LOCAL_PEEK requires a channel");
            return Err(StackError::NoChannel);
        };
        let state = chan.lock_state();
        let value = state
            .vars
            .layers(name)
            .nth(n)
            .unwrap_or_default()
            .to_string();
        Ok(value)
    }

    /// Parse and evaluate a raw `LOCAL_PEEK` argument string, `n,name`
    pub fn local_peek_args(&self, chan: Option<&Channel>, data: &str) -> Result<String, StackError> {
        let Some((n, name)) = data.split_once(',') else {
            return Err(StackError::InvalidArguments {
                msg: "LOCAL_PEEK requires (n, name)".to_string(),
            });
        };
        let n: usize = n.trim().parse().map_err(|_| StackError::InvalidArguments {
            msg: format!("LOCAL_PEEK index '{}' is not a number", n.trim()),
        })?;
        self.local_peek(chan, n, name.trim())
    }
}

//! Channel shim: dialplan position, variable store, and the stack slot
//!
//! The real host owns the channel object. This module provides the minimal
//! concrete stand-in the stack runtime needs: the current dialplan location,
//! a stack-of-bindings variable store, the pbx flags the AGI bridge toggles,
//! and the owned slot holding the gosub frame stack.
//!
//! Lock ordering: the channel state lock is acquired BEFORE the stack slot
//! lock whenever both are held. The slot has its own mutex so that pop and
//! peek can run from asynchronous managers without entering the channel
//! lock at all.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::stack::FrameStack;

/// A dialplan address: (context, extension, priority)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialplanLocation {
    pub context: String,
    pub extension: String,
    pub priority: u32,
}

impl DialplanLocation {
    pub fn new(context: impl Into<String>, extension: impl Into<String>, priority: u32) -> Self {
        Self {
            context: context.into(),
            extension: extension.into(),
            priority,
        }
    }
}

impl std::fmt::Display for DialplanLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.context, self.extension, self.priority)
    }
}

/// Per-channel variable store: a stack of bindings per name
///
/// Reads return the innermost binding. A shadowing push adds a new innermost
/// binding without destroying the previous one; popping it restores whatever
/// was there before, including "nothing".
#[derive(Debug, Default)]
pub struct VarStore {
    // innermost binding is the last element
    bindings: HashMap<String, Vec<String>>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the innermost binding of `name`, or `None` if unbound
    pub fn read(&self, name: &str) -> Option<&str> {
        self.bindings
            .get(name)
            .and_then(|layers| layers.last())
            .map(String::as_str)
    }

    /// Add a new innermost binding for `name`, hiding the previous one
    pub fn push_shadowing(&mut self, name: &str, value: &str) {
        self.bindings
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Overwrite the innermost binding, creating one if `name` is unbound
    pub fn set_innermost(&mut self, name: &str, value: &str) {
        let layers = self.bindings.entry(name.to_string()).or_default();
        match layers.last_mut() {
            Some(current) => *current = value.to_string(),
            None => layers.push(value.to_string()),
        }
    }

    /// Remove the innermost binding of `name`, restoring the previous one
    pub fn pop_innermost(&mut self, name: &str) {
        if let Some(layers) = self.bindings.get_mut(name) {
            layers.pop();
            if layers.is_empty() {
                self.bindings.remove(name);
            }
        }
    }

    /// All shadow layers of `name`, innermost first
    pub fn layers(&self, name: &str) -> impl Iterator<Item = &str> {
        self.bindings
            .get(name)
            .into_iter()
            .flat_map(|layers| layers.iter().rev().map(String::as_str))
    }
}

/// Mutable channel state guarded by the channel lock
#[derive(Debug)]
pub(crate) struct ChannelState {
    pub(crate) location: DialplanLocation,
    pub(crate) vars: VarStore,
    pub(crate) caller_id: Option<String>,
    pub(crate) pbx_attached: bool,
    pub(crate) no_hangup_on_exit: bool,
}

/// Per-call channel object
///
/// Opaque to the dialplan applications except through the accessors below.
/// The gosub stack lives in an owned slot whose destructor runs
/// unconditionally at [`Channel::teardown`].
#[derive(Debug)]
pub struct Channel {
    name: String,
    uniqueid: String,
    state: Mutex<ChannelState>,
    // Stack slot. Locked AFTER `state` when both are needed.
    stack: Mutex<Option<FrameStack>>,
}

impl Channel {
    /// Create a channel positioned at `location`, with no pbx attached
    pub fn new(
        name: impl Into<String>,
        uniqueid: impl Into<String>,
        location: DialplanLocation,
    ) -> Self {
        Self {
            name: name.into(),
            uniqueid: uniqueid.into(),
            state: Mutex::new(ChannelState {
                location,
                vars: VarStore::new(),
                caller_id: None,
                pbx_attached: false,
                no_hangup_on_exit: false,
            }),
            stack: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniqueid(&self) -> &str {
        &self.uniqueid
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn lock_stack(&self) -> MutexGuard<'_, Option<FrameStack>> {
        self.stack.lock().unwrap()
    }

    /// Current dialplan position
    pub fn location(&self) -> DialplanLocation {
        self.lock_state().location.clone()
    }

    /// Jump to `location`; the executor resumes there on its next step
    pub fn set_location(&self, location: DialplanLocation) {
        self.lock_state().location = location;
    }

    pub fn caller_id(&self) -> Option<String> {
        self.lock_state().caller_id.clone()
    }

    pub fn set_caller_id(&self, caller_id: Option<String>) {
        self.lock_state().caller_id = caller_id;
    }

    pub fn has_pbx(&self) -> bool {
        self.lock_state().pbx_attached
    }

    /// Returns the previous value so callers can restore it
    pub fn set_pbx_attached(&self, attached: bool) -> bool {
        let mut state = self.lock_state();
        std::mem::replace(&mut state.pbx_attached, attached)
    }

    pub fn no_hangup_on_exit(&self) -> bool {
        self.lock_state().no_hangup_on_exit
    }

    /// Returns the previous value so callers can restore it
    pub fn set_no_hangup_on_exit(&self, no_hangup: bool) -> bool {
        let mut state = self.lock_state();
        std::mem::replace(&mut state.no_hangup_on_exit, no_hangup)
    }

    /// Read the innermost binding of a channel variable
    pub fn read_var(&self, name: &str) -> Option<String> {
        self.lock_state().vars.read(name).map(str::to_string)
    }

    /// Set a channel variable without shadowing (host `Set()` semantics)
    pub fn set_var(&self, name: &str, value: &str) {
        self.lock_state().vars.set_innermost(name, value);
    }

    /// Depth of the gosub stack, zero when no slot exists
    pub fn stack_depth(&self) -> usize {
        self.lock_stack().as_ref().map_or(0, FrameStack::depth)
    }

    /// Channel teardown hook: destroy the stack slot and every frame in it
    ///
    /// Frames are released without unshadowing; the variable store is being
    /// destroyed along with the channel.
    pub fn teardown(&self) {
        if let Some(stack) = self.lock_stack().take() {
            stack.destroy();
        }
    }
}

//! Error types for the gosub stack runtime
//!
//! Every failure surfaced to a dialplan application or function handler is
//! one of these kinds. No sentinel return values; callers match on the
//! variant they care about and treat the rest as fatal for the call.

use thiserror::Error;

/// Runtime error for stack applications and functions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StackError {
    /// Missing or malformed application argument string
    #[error("Invalid arguments: {msg}")]
    InvalidArguments { msg: String },
    /// Target string refused by the dialplan parser
    #[error("Gosub address is invalid: {target}")]
    InvalidTarget { target: String },
    /// Target parsed but does not resolve to an existing dialplan location
    #[error("Attempt to reach a non-existent destination {context},{extension},{priority}")]
    NoSuchTarget {
        context: String,
        extension: String,
        priority: u32,
    },
    /// Allocation failure while creating the stack slot or a frame
    #[error("Memory allocation failure")]
    OutOfMemory,
    /// Return executed with no frame to pop
    #[error("Return without Gosub")]
    EmptyStack,
    /// LOCAL access on a channel with no gosub stack
    #[error("Not within a Gosub routine")]
    NotInSubroutine,
    /// Function requires a live channel and none was given
    #[error("No channel was provided")]
    NoChannel,
}

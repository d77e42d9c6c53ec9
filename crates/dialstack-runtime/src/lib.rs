//! Dialstack Runtime - gosub/return call stack for the dialplan
//!
//! This library provides the per-channel subroutine runtime:
//! - Activation frames and the LIFO frame stack attached to a channel
//! - Frame-scoped variable shadowing over the channel variable store
//! - The Gosub, GosubIf, Return, and StackPop dialplan applications
//! - The LOCAL and LOCAL_PEEK dialplan functions
//! - The synchronous AGI bridge for script-driven subroutines

/// Dialstack runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod agi;
pub mod apps;
pub mod channel;
pub mod dialplan;
pub mod error;
pub mod events;
pub mod frame;
pub mod funcs;
pub mod stack;
pub mod target;

// Re-export commonly used types
pub use agi::{AgiStatus, AgiTransport, AGI_GOSUB_USAGE};
pub use apps::{Dialstack, ReturnDisposition, StackApp, GOSUB_RETVAL};
pub use channel::{Channel, DialplanLocation, VarStore};
pub use dialplan::{DialplanExec, StepOutcome};
pub use error::StackError;
pub use events::{EventPublisher, VarSetEvent, DEFAULT_EVENT_CAPACITY};
pub use frame::Frame;
pub use funcs::{FUNC_LOCAL, FUNC_LOCAL_PEEK};
pub use stack::FrameStack;
pub use target::MAX_ARGS;

//! Process execution for interpreter invocations
//!
//! Spawns a child process with captured output streams, bounds its running
//! time, and reports Started/Exited notifications to lifecycle listeners.
//!
//! # Security Model
//!
//! All process execution goes through [`CommandSpec`] to ensure argv-style invocation.
//! Arguments are passed as discrete elements rather than shell strings, so
//! embedded spaces, quotes and metacharacters reach the child unchanged.

pub mod command_spec;
pub mod error;
mod io;
pub mod lifecycle;
pub mod native;
mod platform;
pub mod process;
pub mod types;

pub use command_spec::CommandSpec;
pub use error::RunnerError;
pub use lifecycle::{ChannelListener, LifecycleEvent, LifecycleListener, Listeners};
pub use native::NativeRunner;
pub use process::{ExecutionResult, ProcessRunner, TIMEOUT_SENTINEL};
pub use types::InvocationState;

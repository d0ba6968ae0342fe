//! Async glue between the AGI codec and tokio I/O.
//!
//! - `reader`: background task forwarding decoded events over `mpsc`.
//! - `channel`: request/response command execution for scripts.

pub mod channel;
pub mod reader;

pub use channel::AgiChannel;
pub use reader::run_reader;

//! JavaScript sandbox: bindings, output capture, limits, and the runtime.

pub mod bindings;
pub mod config;
pub mod executor;
pub mod io;
pub mod limits;
pub mod result;
pub mod script;
pub mod timers;

//! Initialization of logging shared by the binaries of this workspace and
//! a panic hook that routes panics through the logger.
pub mod config;
pub mod panic_hook;
pub mod tracing;

pub use config::Config;

//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - Command execution with error handling
//! - `io` - File and JSON I/O with consistent error handling
//! - `shell` - Shell quoting for displaying command lines

pub mod command;
pub mod io;
pub mod shell;

// Public modules
pub mod clean;
pub mod defaults;
pub mod dependency;
pub mod docs;
pub mod error;
pub mod form;
pub mod git;
pub mod grammar;
pub mod host;
pub mod inspect;
pub mod project;
pub mod publish;
pub mod scaffold;
pub mod skills;
pub mod tool4d;
pub mod workflows;

// Internal modules - not part of public API
pub(crate) mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};

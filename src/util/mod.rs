//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod shlex;
pub mod slash_path;

pub use config::Config;
pub use diagnostic::Diagnostic;
pub use slash_path::SlashPath;

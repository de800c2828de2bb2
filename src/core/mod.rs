//! Project configuration model.

pub mod project;
pub mod registry;
pub mod variables;

pub use project::{Directive, ProjectConfig};
pub use registry::{Registry, RegistryLayout};
pub use variables::{Environment, Prompter};

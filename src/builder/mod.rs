//! Build description output.

pub mod makefile;

pub use makefile::{render, write_makefile, LoadPathFlags, MakefileOptions};

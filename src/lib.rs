//! coqconf - generate a Makefile for a Coq project
//!
//! This crate resolves a project's load path (source directories, external
//! libraries, abstract libraries described by a variable registry, and other
//! projects) and the dependencies between its source files, then writes a
//! Makefile that builds them in order.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use core::{Directive, Environment, ProjectConfig};
pub use resolver::{LoadPathEntry, Report, Resolution, ResolveError};

//! Musubi core library.
//!
//! Musubi composes declarative project descriptors for native builds: a
//! root project names source files, include directories, preprocessor
//! defines, language standards, and dependency sub-projects; the resolver
//! loads the dependency graph, each dependency adapts itself for library
//! consumption, and the flatten engine merges everything into one build
//! unit for an external build-file generator.

pub mod ast;
pub mod cli;
pub mod emit;
pub mod flatten;
pub mod manifest;
pub mod output;
pub mod project;
pub mod resolve;
pub mod runner;

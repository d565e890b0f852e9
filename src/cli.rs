//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. The
//! conditional inclusion of optional dependencies is an explicit flag here
//! rather than ambient process state, so a resolution run is fully
//! described by its arguments.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A YAML-powered project composer for native builds.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the root project descriptor.
    #[arg(short, long, value_name = "FILE", default_value = "project.yml")]
    pub file: Utf8PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Include dependencies marked `optional` in descriptors.
    #[arg(long)]
    pub include_optional: bool,

    /// Fail when two projects declare differing language standards
    /// instead of letting the root-ward declaration win.
    #[arg(long)]
    pub strict_standards: bool,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `flatten` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse command-line arguments, providing `flatten` as the default
    /// command.
    #[must_use]
    pub fn parse_with_default() -> Self {
        Self::parse().with_default_command()
    }

    /// Parse the provided arguments, applying the default command when
    /// needed.
    ///
    /// # Panics
    ///
    /// Panics if argument parsing fails.
    #[must_use]
    pub fn parse_from_with_default<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
            .unwrap_or_else(|e| panic!("CLI parsing failed: {e}"))
            .with_default_command()
    }

    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Flatten);
        }
        self
    }
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Resolve and flatten the project tree, printing the build
    /// description `default`.
    Flatten,

    /// Write the flattened build description to the specified file.
    Emit {
        /// Output path for the build description.
        #[arg(value_name = "FILE")]
        file: Utf8PathBuf,

        /// Write JSON instead of the line-oriented text form.
        #[arg(long)]
        json: bool,
    },

    /// Display the resolved dependency tree.
    Graph,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_is_the_default_command() {
        let cli = Cli::parse_from_with_default(["musubi"]);
        assert_eq!(cli.command, Some(Commands::Flatten));
        assert!(!cli.include_optional);
        assert!(!cli.strict_standards);
    }

    #[test]
    fn emit_accepts_a_json_switch() {
        let cli = Cli::parse_from_with_default(["musubi", "emit", "out.txt", "--json"]);
        match cli.command {
            Some(Commands::Emit { file, json }) => {
                assert_eq!(file, Utf8PathBuf::from("out.txt"));
                assert!(json);
            }
            other => panic!("expected Emit, got {other:?}"),
        }
    }

    #[test]
    fn optional_and_strict_flags_parse() {
        let cli = Cli::parse_from_with_default([
            "musubi",
            "--include-optional",
            "--strict-standards",
            "graph",
        ]);
        assert!(cli.include_optional);
        assert!(cli.strict_standards);
        assert_eq!(cli.command, Some(Commands::Graph));
    }
}

//! Project descriptor Abstract Syntax Tree structures.
//!
//! This module defines the data structures used to represent a parsed
//! `project.yml` descriptor. They mirror the YAML schema and are
//! deserialised with `serde-saphyr`.
//!
//! The following example shows how to parse a minimal descriptor string:
//!
//! ```rust
//! use musubi::ast::ProjectManifest;
//!
//! let yaml = "musubi_version: \"1.0.0\"\nname: krass\nfiles:\n  - src/krass.c";
//! let manifest: ProjectManifest = serde_saphyr::from_str(yaml).expect("parse");
//! assert_eq!(manifest.name, "krass");
//! ```

use crate::project::{Define, Project};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Top-level descriptor structure parsed from a `project.yml` file.
///
/// Each field mirrors a key in the YAML descriptor. Optional collections
/// default to empty to simplify deserialisation.
///
/// ```yaml
/// musubi_version: "1.0.0"
/// name: krass
/// files:
///   - src/krass.c
/// include_dirs:
///   - src
/// c_std: c99
/// ```
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    /// Semantic version of the descriptor format.
    pub musubi_version: Version,

    /// Project name, unique within one resolution session.
    pub name: String,

    /// Ordered source files contributed by this project.
    #[serde(default)]
    pub files: Vec<Utf8PathBuf>,

    /// Paths removed from the flattened file list.
    #[serde(default)]
    pub excludes: Vec<Utf8PathBuf>,

    /// Ordered include directories.
    #[serde(default)]
    pub include_dirs: Vec<Utf8PathBuf>,

    /// Preprocessor defines; a null value yields a bare `-DKEY`.
    #[serde(default)]
    pub defines: IndexMap<String, Option<String>>,

    /// Dependencies, either a bare name or a detailed entry.
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,

    /// Output directory for a standalone debug binary.
    #[serde(default)]
    pub debug_dir: Option<Utf8PathBuf>,

    /// C language standard, passed through to the build-file generator.
    #[serde(default)]
    pub c_std: Option<String>,

    /// C++ language standard, passed through to the build-file generator.
    #[serde(default)]
    pub cpp_std: Option<String>,

    /// Adjustments applied when this project is consumed as a dependency.
    #[serde(default)]
    pub library: Option<LibraryOverlay>,
}

/// A dependency declaration.
///
/// Mirrors YAML syntax where either a scalar name or a mapping with an
/// `optional` marker is allowed:
///
/// ```yaml
/// dependencies:
///   - krink
///   - name: krinktest
///     optional: true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencyEntry {
    /// A bare dependency name, always included.
    Name(String),
    /// A dependency with inclusion detail.
    Detailed {
        /// Dependency project name.
        name: String,
        /// Skip this dependency unless optional inclusion is requested.
        ///
        /// Evaluated while converting the descriptor, before resolution
        /// begins, so an excluded dependency is never fetched.
        #[serde(default)]
        optional: bool,
    },
}

impl DependencyEntry {
    /// The dependency's project name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }

    /// Whether the dependency is gated on optional inclusion.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        match self {
            Self::Name(_) => false,
            Self::Detailed { optional, .. } => *optional,
        }
    }
}

/// Declarative library-mode adjustments.
///
/// When a project is attached as a dependency rather than built standalone,
/// this overlay is applied to it exactly once, before its fields are merged
/// upward. It is the declarative counterpart of
/// [`crate::project::LibraryAdapt`], covering the common adjustments: a
/// library drops its debug binary, hides its test sources, and may add
/// consumer-facing defines.
///
/// ```yaml
/// library:
///   drop_debug_dir: true
///   excludes:
///     - tests/basic.c
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LibraryOverlay {
    /// Clear `debug_dir`, suppressing the standalone debug binary.
    #[serde(default)]
    pub drop_debug_dir: bool,

    /// Extra exclusion paths contributed in library mode.
    #[serde(default)]
    pub excludes: Vec<Utf8PathBuf>,

    /// Extra defines contributed in library mode.
    #[serde(default)]
    pub defines: IndexMap<String, Option<String>>,
}

impl crate::project::LibraryAdapt for LibraryOverlay {
    fn adapt(&self, project: &mut Project) {
        if self.drop_debug_dir {
            project.set_debug_dir(None);
        }
        project.excludes.extend(self.excludes.iter().cloned());
        project.defines.extend(
            self.defines
                .iter()
                .map(|(name, value)| Define::new(name.clone(), value.clone())),
        );
    }
}

//! Descriptor loading helpers.
//!
//! This module reads `project.yml` descriptors from disk, converts YAML
//! parse failures into [`miette`] diagnostics with source spans, and turns
//! the parsed [`ProjectManifest`] into a [`Project`] ready for resolution.
//! [`FsProjectSource`] implements the project-source collaborator over a
//! directory tree where each dependency lives in `<base>/<name>/project.yml`,
//! mirroring the sub-project-as-subdirectory convention of native build
//! descriptors.
//!
//! Optional dependencies are evaluated here, before resolution begins: the
//! `include_optional` flag is an explicit parameter, never ambient process
//! state, so resolution stays a pure function of its inputs.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;
use tracing::debug;

use crate::ast::ProjectManifest;
use crate::project::{Define, Project};
use crate::resolve::{ProjectSource, SourceError};

/// Conventional descriptor file name within a project directory.
pub const DESCRIPTOR_FILE: &str = "project.yml";

/// Failure while reading or parsing a descriptor.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// The descriptor file could not be read.
    #[error("failed to read descriptor `{path}`")]
    #[diagnostic(code(musubi::manifest::read))]
    Read {
        /// Path that failed to read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor did not parse as a valid project declaration.
    #[error("failed to parse descriptor `{name}`")]
    #[diagnostic(code(musubi::manifest::parse))]
    Parse {
        /// Descriptor name used in the diagnostic.
        name: String,
        /// Span-carrying parse diagnostic.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(musubi::yaml::parse))]
struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("parse error here")]
    span: Option<SourceSpan>,
    #[source]
    source: serde_saphyr::Error,
    message: String,
}

/// Reconstruct the byte offset for a `serde_saphyr` location.
///
/// `serde_saphyr` exposes only line and column accessors, so the byte index
/// is derived by walking the source. Offsets past the line are clamped.
fn byte_index(src: &str, line: u64, column: u64) -> usize {
    let target_line = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
    let target_column = usize::try_from(column.saturating_sub(1)).unwrap_or(usize::MAX);
    let mut offset = 0usize;
    for (idx, segment) in src.split_inclusive('\n').enumerate() {
        if idx == target_line {
            let cleaned = segment.trim_end_matches(['\n', '\r']);
            let column_offset = cleaned
                .char_indices()
                .nth(target_column)
                .map_or(cleaned.len(), |(byte_idx, _)| byte_idx);
            return offset + column_offset;
        }
        offset += segment.len();
    }
    src.len()
}

fn map_yaml_error(err: serde_saphyr::Error, src: &str, name: &str) -> ManifestError {
    let (message, span) = err.location().map_or_else(
        || (format!("YAML parse error: {err}"), None),
        |loc| {
            let at = byte_index(src, loc.line(), loc.column());
            let len = usize::from(src.as_bytes().get(at).is_some());
            (
                format!(
                    "YAML parse error at line {}, column {}: {err}",
                    loc.line(),
                    loc.column(),
                ),
                Some(SourceSpan::new(at.into(), len)),
            )
        },
    );
    ManifestError::Parse {
        name: name.to_owned(),
        source: Box::new(YamlDiagnostic {
            src: NamedSource::new(name, src.to_owned()),
            span,
            source: err,
            message,
        }),
    }
}

/// Parse a descriptor from a YAML string.
///
/// `name` labels the source in diagnostics; pass the file path when the
/// string came from disk.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] with a span-carrying diagnostic when
/// the YAML is malformed or does not match the descriptor schema.
pub fn from_str(yaml: &str, name: &str) -> Result<ProjectManifest, ManifestError> {
    serde_saphyr::from_str(yaml).map_err(|err| map_yaml_error(err, yaml, name))
}

/// Read and parse the descriptor at `path`.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] when the file cannot be read and
/// [`ManifestError::Parse`] when its contents are invalid.
pub fn load(path: &Utf8Path) -> Result<ProjectManifest, ManifestError> {
    let yaml = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    from_str(&yaml, path.as_str())
}

/// Convert a parsed descriptor into a [`Project`].
///
/// Dependencies marked `optional` are included only when
/// `include_optional` is set; an excluded dependency is never registered,
/// so it is never fetched. A `library:` overlay becomes the project's
/// library-mode hook.
#[must_use]
pub fn into_project(manifest: ProjectManifest, include_optional: bool) -> Project {
    let ProjectManifest {
        musubi_version: _,
        name,
        files,
        excludes,
        include_dirs,
        defines,
        dependencies,
        debug_dir,
        c_std,
        cpp_std,
        library,
    } = manifest;

    let mut project = Project::new(name);
    project.files = files;
    project.excludes = excludes;
    project.include_dirs = include_dirs;
    project.defines = defines
        .into_iter()
        .map(|(key, value)| Define::new(key, value))
        .collect();
    project.debug_dir = debug_dir;
    project.c_std = c_std;
    project.cpp_std = cpp_std;
    for entry in dependencies {
        if entry.is_optional() && !include_optional {
            debug!(
                project = %project.name,
                dependency = entry.name(),
                "skipping optional dependency",
            );
            continue;
        }
        project.add_dependency(entry.name());
    }
    if let Some(overlay) = library {
        project.set_library_hook(overlay);
    }
    project
}

/// Project source backed by a directory tree.
///
/// A dependency named `krink` is expected at `<base>/krink/project.yml`.
/// The `include_optional` flag is applied to every loaded descriptor, so
/// one resolution session treats optional dependencies uniformly.
#[derive(Clone, Debug)]
pub struct FsProjectSource {
    base: Utf8PathBuf,
    include_optional: bool,
}

impl FsProjectSource {
    /// Create a source rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<Utf8PathBuf>, include_optional: bool) -> Self {
        Self {
            base: base.into(),
            include_optional,
        }
    }

    /// The descriptor path used for a given project name.
    #[must_use]
    pub fn descriptor_path(&self, name: &str) -> Utf8PathBuf {
        self.base.join(name).join(DESCRIPTOR_FILE)
    }
}

impl ProjectSource for FsProjectSource {
    fn load(&self, name: &str) -> Result<Project, SourceError> {
        let path = self.descriptor_path(name);
        let manifest = load(&path).map_err(|err| match err {
            ManifestError::Read { ref source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                SourceError::NotFound {
                    name: name.to_owned(),
                }
            }
            other => SourceError::Load {
                name: name.to_owned(),
                source: Box::new(other),
            },
        })?;
        Ok(into_project(manifest, self.include_optional))
    }
}

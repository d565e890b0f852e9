//! Core project descriptor structures.
//!
//! This module defines [`Project`], the mutable value object holding one
//! build unit's raw, unmerged settings, along with [`Define`] for
//! preprocessor symbols and the [`LibraryAdapt`] capability a project may
//! carry to customise itself when consumed as a dependency.
//!
//! Mutators never fail and never deduplicate: paths and names are accepted
//! as opaque strings, and duplicate entries are removed later by
//! [`crate::flatten::flatten`], not at insertion time.
//!
//! # Examples
//!
//! ```
//! use musubi::project::Project;
//!
//! let mut project = Project::new("krass");
//! project.add_file("src/krass.c");
//! project.add_include_dir("src");
//! project.set_c_std("c99");
//! project.add_dependency("krink");
//! assert_eq!(project.dependencies, vec!["krink".to_owned()]);
//! ```

use camino::Utf8PathBuf;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Self-adaptation applied to a project when it is consumed as a library
/// rather than built standalone.
///
/// The resolver invokes this exactly once per project, on first visit, and
/// only for projects attached as dependencies; the resolution root keeps its
/// originally declared settings. Closures implement the trait, so callers
/// can attach ad-hoc behaviour:
///
/// ```
/// use musubi::project::Project;
///
/// let mut project = Project::new("krass");
/// project.set_library_hook(|p: &mut Project| {
///     p.set_debug_dir(None);
///     p.add_exclude("tests/basic.c");
/// });
/// assert!(project.library_hook.is_some());
/// ```
pub trait LibraryAdapt: Send + Sync {
    /// Mutate `project` into its library-mode configuration.
    fn adapt(&self, project: &mut Project);
}

impl<F> LibraryAdapt for F
where
    F: Fn(&mut Project) + Send + Sync,
{
    fn adapt(&self, project: &mut Project) {
        self(project);
    }
}

/// A preprocessor define with an optional value.
///
/// Parsed from `KEY` or `KEY=VALUE` form; parsing never fails because keys
/// are opaque strings validated only by downstream consumers.
///
/// ```
/// use musubi::project::Define;
///
/// let plain = Define::parse_str("KR_FULL_RGBA_FONTS");
/// assert_eq!(plain.value, None);
/// let valued = Define::parse_str("KR_VERSION=2");
/// assert_eq!(valued.value.as_deref(), Some("2"));
/// assert_eq!(valued.to_string(), "KR_VERSION=2");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Define {
    /// Symbol name, the deduplication key during flatten.
    pub name: String,
    /// Optional symbol value; `None` renders as a bare `-DKEY`.
    pub value: Option<String>,
}

impl Define {
    /// Construct a define from a name and optional value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Split `KEY` or `KEY=VALUE` form into a define. Never fails.
    #[must_use]
    pub fn parse_str(s: &str) -> Self {
        s.split_once('=').map_or_else(
            || Self::new(s, None),
            |(key, val)| Self::new(key, Some(val.to_owned())),
        )
    }
}

impl FromStr for Define {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_str(s))
    }
}

impl Display for Define {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One build unit's declarative settings.
///
/// A `Project` is constructed once by its declaring code, optionally mutated
/// by its own library hook when attached as a dependency, contributes its
/// fields exactly once during flatten, and holds no state needed afterwards.
///
/// Fields are public in the manner of a plain data carrier; the mutator
/// methods exist for call-site readability and are all infallible.
#[derive(Clone, Default)]
pub struct Project {
    /// Identifier, unique within one resolution session.
    pub name: String,
    /// Ordered source files. May contain duplicates before flatten.
    pub files: Vec<Utf8PathBuf>,
    /// Paths removed from `files` at flatten time, after all contributions.
    pub excludes: Vec<Utf8PathBuf>,
    /// Ordered include directories, deduplicated at flatten time.
    pub include_dirs: Vec<Utf8PathBuf>,
    /// Preprocessor defines; later entries win on key collision.
    pub defines: Vec<Define>,
    /// Names of dependency projects, resolved by [`crate::resolve`].
    pub dependencies: Vec<String>,
    /// Output directory for a standalone debug binary; `None` suppresses it.
    pub debug_dir: Option<Utf8PathBuf>,
    /// C language standard, e.g. `c99`. Opaque to this crate.
    pub c_std: Option<String>,
    /// C++ language standard, e.g. `c++11`. Opaque to this crate.
    pub cpp_std: Option<String>,
    /// Library-mode adaptation, applied by the resolver on first attach.
    pub library_hook: Option<Arc<dyn LibraryAdapt>>,
}

impl Project {
    /// Create an empty project with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a source file. Duplicates are tolerated until flatten.
    pub fn add_file(&mut self, path: impl Into<Utf8PathBuf>) {
        self.files.push(path.into());
    }

    /// Append an exclusion pattern applied after all files are collected.
    pub fn add_exclude(&mut self, path: impl Into<Utf8PathBuf>) {
        self.excludes.push(path.into());
    }

    /// Append an include directory.
    pub fn add_include_dir(&mut self, path: impl Into<Utf8PathBuf>) {
        self.include_dirs.push(path.into());
    }

    /// Remove every occurrence of an include directory from this project.
    pub fn remove_include_dir(&mut self, path: &Utf8PathBuf) {
        self.include_dirs.retain(|dir| dir != path);
    }

    /// Append a preprocessor define parsed from `KEY` or `KEY=VALUE` form.
    pub fn add_define(&mut self, define: &str) {
        self.defines.push(Define::parse_str(define));
    }

    /// Set or clear the debug binary output directory.
    ///
    /// Passing `None` explicitly suppresses standalone binary generation
    /// for this node, which is how library hooks disable test binaries.
    pub fn set_debug_dir(&mut self, dir: Option<Utf8PathBuf>) {
        self.debug_dir = dir;
    }

    /// Set the C language standard.
    pub fn set_c_std(&mut self, std: impl Into<String>) {
        self.c_std = Some(std.into());
    }

    /// Set the C++ language standard.
    pub fn set_cpp_std(&mut self, std: impl Into<String>) {
        self.cpp_std = Some(std.into());
    }

    /// Register a dependency by name. Resolution happens later and the
    /// name is not validated here.
    pub fn add_dependency(&mut self, name: impl Into<String>) {
        self.dependencies.push(name.into());
    }

    /// Attach the library-mode adaptation for this project.
    pub fn set_library_hook(&mut self, hook: impl LibraryAdapt + 'static) {
        self.library_hook = Some(Arc::new(hook));
    }

    /// Apply this project's library hook to itself, if one is attached.
    ///
    /// Used by the resolver when the project is pulled in as a dependency;
    /// the hook itself is dropped afterwards so it cannot fire twice.
    pub(crate) fn adapt_for_library(&mut self) {
        if let Some(hook) = self.library_hook.take() {
            hook.adapt(self);
        }
    }
}

impl Debug for Project {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("files", &self.files)
            .field("excludes", &self.excludes)
            .field("include_dirs", &self.include_dirs)
            .field("defines", &self.defines)
            .field("dependencies", &self.dependencies)
            .field("debug_dir", &self.debug_dir)
            .field("c_std", &self.c_std)
            .field("cpp_std", &self.cpp_std)
            .field("library_hook", &self.library_hook.as_ref().map(|_| "…"))
            .finish()
    }
}

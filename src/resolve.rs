//! Dependency resolution.
//!
//! This module turns a root [`Project`] plus a [`ProjectSource`] into a
//! [`Resolved`] tree ready for flattening. Resolution happens in two
//! stages:
//!
//! 1. **Fetch** ([`session`]): the closure of dependency names is collected
//!    breadth-first. Independent names discovered in the same wave are
//!    fetched concurrently, and each unique name is fetched exactly once
//!    per call; there is no state shared across resolution sessions.
//! 2. **Link** ([`link`]): a single-threaded depth-first walk validates the
//!    graph, rejects cycles, applies each dependency's library-mode hook on
//!    first visit, and records the post-order merge sequence.
//!
//! Any failure aborts the whole call; no partial result is produced.
//!
//! # Examples
//!
//! ```
//! use musubi::project::Project;
//! use musubi::resolve::{ProjectSource, SourceError, resolve};
//!
//! struct Static(Vec<Project>);
//!
//! impl ProjectSource for Static {
//!     fn load(&self, name: &str) -> Result<Project, SourceError> {
//!         self.0
//!             .iter()
//!             .find(|p| p.name == name)
//!             .cloned()
//!             .ok_or_else(|| SourceError::NotFound { name: name.into() })
//!     }
//! }
//!
//! let mut root = Project::new("krass");
//! root.add_dependency("krink");
//! let resolved = resolve(root, &Static(vec![Project::new("krink")])).expect("resolve");
//! assert_eq!(resolved.order.len(), 2);
//! ```

use crate::project::Project;
use miette::Diagnostic;
use thiserror::Error;

mod link;
mod session;

pub use link::Resolved;

/// External collaborator that locates a project declaration by name.
///
/// Implementations own the descriptor format and its storage; the resolver
/// only cares that a name maps to a [`Project`] or a failure. Loads may run
/// on worker threads, so implementations must be [`Sync`]. Retries and
/// timeouts are the implementation's concern.
pub trait ProjectSource: Sync {
    /// Load the raw project declaration for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] when no project of that name
    /// exists, or another [`SourceError`] when loading fails.
    fn load(&self, name: &str) -> Result<Project, SourceError>;
}

/// Failure reported by a [`ProjectSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// No project of the requested name exists.
    #[error("project `{name}` not found")]
    NotFound {
        /// The name that could not be located.
        name: String,
    },

    /// The descriptor declares a different name than the one requested.
    #[error("project `{name}` declares itself as `{declared}`")]
    NameMismatch {
        /// The requested name.
        name: String,
        /// The name found in the descriptor.
        declared: String,
    },

    /// Loading or parsing the declaration failed.
    #[error("failed to load project `{name}`")]
    Load {
        /// The name being loaded.
        name: String,
        /// Underlying loader failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Failure of a resolve call.
///
/// All variants are fatal: the caller receives no partial tree and must
/// treat any error as "no build description available".
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// The dependency relation contains a cycle.
    #[error("dependency cycle detected: {}", path.join(" -> "))]
    #[diagnostic(
        code(musubi::resolve::cycle),
        help("remove one of the dependency edges on the reported path")
    )]
    CycleDetected {
        /// The cycle, canonicalised to start at its smallest name and
        /// closed by repeating the first entry.
        path: Vec<String>,
    },

    /// A named dependency could not be located.
    #[error("unknown project `{name}`, required by `{requested_by}`")]
    #[diagnostic(code(musubi::resolve::unknown_project))]
    UnknownProject {
        /// The missing name.
        name: String,
        /// The project whose dependency list names it.
        requested_by: String,
    },

    /// A named dependency was located but could not be loaded.
    #[error("failed to load project `{name}`, required by `{requested_by}`")]
    #[diagnostic(code(musubi::resolve::load))]
    Load {
        /// The name being loaded.
        name: String,
        /// The project whose dependency list names it.
        requested_by: String,
        /// Underlying source failure.
        #[source]
        source: SourceError,
    },
}

/// Resolve `root` and every transitive dependency into a [`Resolved`] tree.
///
/// The root keeps its originally declared settings; every dependency has
/// its library-mode hook applied exactly once, even when reached via more
/// than one path.
///
/// # Errors
///
/// Returns [`ResolveError`] when the graph is cyclic, a dependency name is
/// unknown, or a declaration fails to load.
pub fn resolve(root: Project, source: &dyn ProjectSource) -> Result<Resolved, ResolveError> {
    let fetched = session::fetch_closure(&root, source)?;
    link::link(root, fetched)
}

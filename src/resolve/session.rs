//! Session-scoped concurrent fetching of project declarations.
//!
//! One fetch session serves one top-level resolve call. Dependency names
//! discovered in the same breadth-first wave are loaded on scoped worker
//! threads, and a session-local memo guarantees that no name is fetched
//! twice even when the graph contains diamonds. The memo is discarded with
//! the session, so repeated resolve calls observe no shared state.

use std::collections::{HashMap, HashSet};
use std::thread;

use tracing::debug;

use super::{ProjectSource, ResolveError, SourceError};
use crate::project::Project;

/// Fetch the transitive dependency closure of `root`, keyed by name.
///
/// The root itself is not fetched; its declaration is already in hand. A
/// dependency that names the root is left unfetched here and surfaces as a
/// cycle during linking.
pub(crate) fn fetch_closure(
    root: &Project,
    source: &dyn ProjectSource,
) -> Result<HashMap<String, Project>, ResolveError> {
    let mut fetched: HashMap<String, Project> = HashMap::new();
    let mut seen: HashSet<String> = HashSet::from([root.name.clone()]);
    let mut wave = next_wave(&root.name, &root.dependencies, &mut seen);

    while !wave.is_empty() {
        let results = fetch_wave(&wave, source);
        let mut next = Vec::new();
        for ((name, requested_by), joined) in wave.into_iter().zip(results) {
            let project = check_loaded(&name, &requested_by, joined)?;
            debug!(name = %name, requested_by = %requested_by, "fetched project declaration");
            next.extend(next_wave(&name, &project.dependencies, &mut seen));
            fetched.insert(name, project);
        }
        wave = next;
    }

    Ok(fetched)
}

/// Collect the not-yet-seen dependency names of one project, paired with
/// the requesting project for error reporting.
fn next_wave(
    requested_by: &str,
    dependencies: &[String],
    seen: &mut HashSet<String>,
) -> Vec<(String, String)> {
    dependencies
        .iter()
        .filter(|name| seen.insert((*name).clone()))
        .map(|name| (name.clone(), requested_by.to_owned()))
        .collect()
}

/// Load every name in `wave` concurrently, one scoped thread per name.
///
/// Graphs are small, so a thread per declaration is proportionate; the
/// scope joins every worker before returning, including after a failure.
fn fetch_wave(
    wave: &[(String, String)],
    source: &dyn ProjectSource,
) -> Vec<thread::Result<Result<Project, SourceError>>> {
    thread::scope(|scope| {
        let handles: Vec<_> = wave
            .iter()
            .map(|(name, _)| scope.spawn(move || source.load(name)))
            .collect();
        handles.into_iter().map(thread::ScopedJoinHandle::join).collect()
    })
}

/// Validate one joined load result, mapping source failures to
/// [`ResolveError`] and enforcing that the declaration's name matches the
/// requested one (resolution keys everything by name).
fn check_loaded(
    name: &str,
    requested_by: &str,
    joined: thread::Result<Result<Project, SourceError>>,
) -> Result<Project, ResolveError> {
    let loaded = joined.unwrap_or_else(|_| {
        Err(SourceError::Load {
            name: name.to_owned(),
            source: "project loader panicked".into(),
        })
    });
    let project = loaded.map_err(|err| match err {
        SourceError::NotFound { name: missing } => ResolveError::UnknownProject {
            name: missing,
            requested_by: requested_by.to_owned(),
        },
        other => ResolveError::Load {
            name: name.to_owned(),
            requested_by: requested_by.to_owned(),
            source: other,
        },
    })?;
    if project.name != name {
        return Err(ResolveError::Load {
            name: name.to_owned(),
            requested_by: requested_by.to_owned(),
            source: SourceError::NameMismatch {
                name: name.to_owned(),
                declared: project.name,
            },
        });
    }
    Ok(project)
}

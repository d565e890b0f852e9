//! Flattening of a resolved dependency tree into one build unit.
//!
//! The flatten engine folds a [`Resolved`] tree's post-order merge sequence
//! into a single [`Project`] under deterministic rules:
//!
//! - `files` and `include_dirs` are concatenated in traversal order and
//!   deduplicated keeping the first occurrence, so a path contributed deep
//!   in the tree keeps its earliest position;
//! - `defines` are merged by key, later-merged (root-ward) value wins;
//! - scalars (`debug_dir`, `c_std`, `cpp_std`) are last-write-wins, so a
//!   dependent overrides its dependencies and the root overrides everyone;
//! - `excludes` are unioned across all nodes and applied as a final filter
//!   over the deduplicated file list, regardless of which node declared or
//!   excluded a path.
//!
//! Flatten is pure: no input project is mutated, and the result is a new
//! value with no dependencies and no library hook.

use camino::Utf8PathBuf;
use indexmap::{IndexMap, IndexSet};
use miette::Diagnostic;
use thiserror::Error;

use crate::project::{Define, Project};
use crate::resolve::Resolved;

/// How competing language-standard declarations are reconciled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StandardsPolicy {
    /// Last-write-wins with root-ward precedence. The default.
    #[default]
    RootWins,
    /// Reject differing standards instead of overwriting.
    Strict,
}

/// Failure of a flatten call.
#[derive(Debug, Error, Diagnostic)]
pub enum FlattenError {
    /// Two projects declare differing language standards under
    /// [`StandardsPolicy::Strict`].
    #[error(
        "conflicting {setting}: `{earlier}` (from `{earlier_project}`) vs \
         `{later}` (from `{later_project}`)"
    )]
    #[diagnostic(
        code(musubi::flatten::conflicting_standard),
        help("align the two declarations, or drop --strict-standards to let the root win")
    )]
    ConflictingStandard {
        /// Which setting conflicts, `c_std` or `cpp_std`.
        setting: &'static str,
        /// Value merged first, dependency-ward.
        earlier: String,
        /// Project that contributed the earlier value.
        earlier_project: String,
        /// Value merged later, root-ward.
        later: String,
        /// Project that contributed the later value.
        later_project: String,
    },
}

/// A scalar accumulator remembering which project last set it.
#[derive(Default)]
struct Scalar {
    value: Option<String>,
    set_by: String,
}

impl Scalar {
    fn merge(
        &mut self,
        incoming: Option<&String>,
        project: &str,
        setting: &'static str,
        policy: StandardsPolicy,
    ) -> Result<(), FlattenError> {
        let Some(incoming_value) = incoming else {
            return Ok(());
        };
        if let Some(current) = &self.value {
            if policy == StandardsPolicy::Strict && current != incoming_value {
                return Err(FlattenError::ConflictingStandard {
                    setting,
                    earlier: current.clone(),
                    earlier_project: self.set_by.clone(),
                    later: incoming_value.clone(),
                    later_project: project.to_owned(),
                });
            }
        }
        self.value = Some(incoming_value.clone());
        self.set_by = project.to_owned();
        Ok(())
    }
}

/// Merge a resolved tree into one flattened [`Project`].
///
/// The output carries the root's name, an exclusion-filtered and
/// deduplicated file list, unique include directories and define keys, and
/// single scalar values. Its `dependencies` list is empty: they have been
/// consumed.
///
/// # Errors
///
/// Returns [`FlattenError::ConflictingStandard`] only under
/// [`StandardsPolicy::Strict`]; the default policy never fails.
pub fn flatten(resolved: &Resolved, policy: StandardsPolicy) -> Result<Project, FlattenError> {
    let mut files: IndexSet<Utf8PathBuf> = IndexSet::new();
    let mut include_dirs: IndexSet<Utf8PathBuf> = IndexSet::new();
    let mut defines: IndexMap<String, Option<String>> = IndexMap::new();
    let mut excludes: IndexSet<Utf8PathBuf> = IndexSet::new();
    let mut debug_dir: Option<Utf8PathBuf> = None;
    let mut c_std = Scalar::default();
    let mut cpp_std = Scalar::default();

    for node in &resolved.order {
        files.extend(node.files.iter().cloned());
        include_dirs.extend(node.include_dirs.iter().cloned());
        for define in &node.defines {
            defines.insert(define.name.clone(), define.value.clone());
        }
        excludes.extend(node.excludes.iter().cloned());
        if node.debug_dir.is_some() {
            debug_dir.clone_from(&node.debug_dir);
        }
        c_std.merge(node.c_std.as_ref(), &node.name, "c_std", policy)?;
        cpp_std.merge(node.cpp_std.as_ref(), &node.name, "cpp_std", policy)?;
    }

    Ok(Project {
        name: resolved.root.name.clone(),
        files: files
            .into_iter()
            .filter(|file| !excludes.contains(file))
            .collect(),
        excludes: excludes.into_iter().collect(),
        include_dirs: include_dirs.into_iter().collect(),
        defines: defines
            .into_iter()
            .map(|(name, value)| Define::new(name, value))
            .collect(),
        dependencies: Vec::new(),
        debug_dir,
        c_std: c_std.value,
        cpp_std: cpp_std.value,
        library_hook: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Build a `Resolved` whose merge order is exactly `order`, with the
    /// last entry acting as root.
    fn resolved(order: Vec<Project>) -> Resolved {
        let order: Vec<Arc<Project>> = order.into_iter().map(Arc::new).collect();
        let nodes: HashMap<String, Arc<Project>> = order
            .iter()
            .map(|node| (node.name.clone(), Arc::clone(node)))
            .collect();
        let root = order.last().cloned().expect("non-empty order");
        Resolved { root, order, nodes }
    }

    fn paths(raw: &[&str]) -> Vec<Utf8PathBuf> {
        raw.iter().map(Utf8PathBuf::from).collect()
    }

    #[test]
    fn flatten_without_dependencies_is_identity_modulo_dedup() {
        let mut solo = Project::new("solo");
        solo.add_file("src/a.c");
        solo.add_file("src/a.c");
        solo.add_include_dir("src");
        solo.set_debug_dir(Some("bin".into()));
        solo.set_c_std("c99");

        let flat = flatten(&resolved(vec![solo]), StandardsPolicy::default()).expect("flatten");
        assert_eq!(flat.name, "solo");
        assert_eq!(flat.files, paths(&["src/a.c"]));
        assert_eq!(flat.include_dirs, paths(&["src"]));
        assert_eq!(flat.debug_dir, Some(Utf8PathBuf::from("bin")));
        assert_eq!(flat.c_std.as_deref(), Some("c99"));
        assert!(flat.dependencies.is_empty());
        assert!(flat.library_hook.is_none());
    }

    #[test]
    fn sequences_keep_first_occurrence_across_nodes() {
        let mut dep = Project::new("dep");
        dep.add_file("shared.c");
        dep.add_file("dep.c");
        dep.add_include_dir("include");
        let mut root = Project::new("root");
        root.add_file("root.c");
        root.add_file("shared.c");
        root.add_include_dir("include");
        root.add_include_dir("src");

        let flat = flatten(&resolved(vec![dep, root]), StandardsPolicy::default())
            .expect("flatten");
        assert_eq!(flat.files, paths(&["shared.c", "dep.c", "root.c"]));
        assert_eq!(flat.include_dirs, paths(&["include", "src"]));
    }

    #[test]
    fn excludes_filter_files_from_any_node() {
        let mut dep = Project::new("dep");
        dep.add_file("dep.c");
        dep.add_file("tests/basic.c");
        dep.add_exclude("tests/basic.c");
        let mut root = Project::new("root");
        root.add_file("root.c");

        let flat = flatten(&resolved(vec![dep, root]), StandardsPolicy::default())
            .expect("flatten");
        assert_eq!(flat.files, paths(&["dep.c", "root.c"]));
        assert!(flat.excludes.contains(&Utf8PathBuf::from("tests/basic.c")));
    }

    #[test]
    fn a_node_can_exclude_a_file_contributed_elsewhere() {
        let mut dep = Project::new("dep");
        dep.add_file("generated.c");
        let mut root = Project::new("root");
        root.add_file("root.c");
        root.add_exclude("generated.c");

        let flat = flatten(&resolved(vec![dep, root]), StandardsPolicy::default())
            .expect("flatten");
        assert_eq!(flat.files, paths(&["root.c"]));
    }

    #[test]
    fn defines_merge_by_key_with_root_ward_precedence() {
        let mut dep = Project::new("dep");
        dep.add_define("KR_VERSION=1");
        dep.add_define("KR_STATIC");
        let mut root = Project::new("root");
        root.add_define("KR_VERSION=2");

        let flat = flatten(&resolved(vec![dep, root]), StandardsPolicy::default())
            .expect("flatten");
        assert_eq!(
            flat.defines,
            vec![
                Define::new("KR_VERSION", Some("2".into())),
                Define::new("KR_STATIC", None),
            ],
        );
    }

    #[test]
    fn later_define_wins_within_one_project() {
        let mut solo = Project::new("solo");
        solo.add_define("KR_VERSION=1");
        solo.add_define("KR_VERSION=3");

        let flat = flatten(&resolved(vec![solo]), StandardsPolicy::default()).expect("flatten");
        assert_eq!(flat.defines, vec![Define::new("KR_VERSION", Some("3".into()))]);
    }

    #[test]
    fn root_standard_overrides_dependency_by_default() {
        let mut dep = Project::new("dep");
        dep.set_c_std("c11");
        let mut root = Project::new("root");
        root.set_c_std("c99");

        let flat = flatten(&resolved(vec![dep, root]), StandardsPolicy::default())
            .expect("flatten");
        assert_eq!(flat.c_std.as_deref(), Some("c99"));
    }

    #[test]
    fn unset_root_standard_inherits_from_dependency() {
        let mut dep = Project::new("dep");
        dep.set_cpp_std("c++11");
        let root = Project::new("root");

        let flat = flatten(&resolved(vec![dep, root]), StandardsPolicy::default())
            .expect("flatten");
        assert_eq!(flat.cpp_std.as_deref(), Some("c++11"));
    }

    #[test]
    fn strict_policy_rejects_differing_standards() {
        let mut dep = Project::new("dep");
        dep.set_c_std("c11");
        let mut root = Project::new("root");
        root.set_c_std("c99");

        let err = flatten(&resolved(vec![dep, root]), StandardsPolicy::Strict)
            .expect_err("conflict");
        match err {
            FlattenError::ConflictingStandard {
                setting,
                earlier,
                earlier_project,
                later,
                later_project,
            } => {
                assert_eq!(setting, "c_std");
                assert_eq!((earlier.as_str(), earlier_project.as_str()), ("c11", "dep"));
                assert_eq!((later.as_str(), later_project.as_str()), ("c99", "root"));
            }
        }
    }

    #[test]
    fn strict_policy_accepts_matching_standards() {
        let mut dep = Project::new("dep");
        dep.set_c_std("c99");
        let mut root = Project::new("root");
        root.set_c_std("c99");

        let flat =
            flatten(&resolved(vec![dep, root]), StandardsPolicy::Strict).expect("flatten");
        assert_eq!(flat.c_std.as_deref(), Some("c99"));
    }

    #[test]
    fn inputs_are_not_mutated() {
        let mut dep = Project::new("dep");
        dep.add_file("dep.c");
        let mut root = Project::new("root");
        root.add_file("root.c");
        let tree = resolved(vec![dep, root]);

        let _flat = flatten(&tree, StandardsPolicy::default()).expect("flatten");
        assert_eq!(tree.order[0].files, paths(&["dep.c"]));
        assert_eq!(tree.order[1].files, paths(&["root.c"]));
    }
}

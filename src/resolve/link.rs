//! Linking of fetched declarations into a validated, adapted tree.
//!
//! This is the single-threaded second stage of resolution: a depth-first
//! walk over the fetched declarations that rejects cycles, fires each
//! dependency's library-mode hook exactly once, and records the post-order
//! merge sequence consumed by [`crate::flatten::flatten`].

use std::collections::HashMap;
use std::sync::Arc;

use super::ResolveError;
use crate::project::Project;

/// Tracks the visitation state of a node during the link walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// A fully resolved dependency tree, ready to flatten.
///
/// `order` lists every node exactly once in post-order: dependencies before
/// dependents, first encounter wins for diamond nodes, root last. Every
/// non-root node has already had its library hook applied; shared nodes are
/// shared by reference.
#[derive(Clone, Debug)]
pub struct Resolved {
    /// The resolution root, never library-adapted.
    pub root: Arc<Project>,
    /// Post-order merge sequence over the whole tree, root included.
    pub order: Vec<Arc<Project>>,
    /// Adapted nodes keyed by name, for tree inspection.
    pub nodes: HashMap<String, Arc<Project>>,
}

/// Walk the fetched declarations from `root`, producing a [`Resolved`].
pub(crate) fn link(
    root: Project,
    fetched: HashMap<String, Project>,
) -> Result<Resolved, ResolveError> {
    let root_name = root.name.clone();
    let mut linker = Linker::new(fetched);
    linker.declarations.insert(root_name.clone(), root);
    linker.visit(&root_name, true)?;

    let root_arc = linker
        .nodes
        .get(&root_name)
        .cloned()
        .ok_or_else(|| ResolveError::UnknownProject {
            name: root_name.clone(),
            requested_by: root_name,
        })?;
    Ok(Resolved {
        root: root_arc,
        order: linker.order,
        nodes: linker.nodes,
    })
}

struct Linker {
    declarations: HashMap<String, Project>,
    states: HashMap<String, VisitState>,
    stack: Vec<String>,
    order: Vec<Arc<Project>>,
    nodes: HashMap<String, Arc<Project>>,
}

impl Linker {
    fn new(declarations: HashMap<String, Project>) -> Self {
        Self {
            declarations,
            states: HashMap::new(),
            stack: Vec::new(),
            order: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    fn visit(&mut self, name: &str, is_root: bool) -> Result<(), ResolveError> {
        match self.states.get(name) {
            Some(VisitState::Visited) => return Ok(()),
            Some(VisitState::Visiting) => {
                return Err(ResolveError::CycleDetected {
                    path: self.cycle_path(name),
                });
            }
            None => {
                self.states.insert(name.to_owned(), VisitState::Visiting);
            }
        }
        self.stack.push(name.to_owned());

        let Some(mut project) = self.declarations.remove(name) else {
            // The fetch stage materialises the whole closure, so a missing
            // declaration here means the source raced its own storage.
            let requested_by = self
                .stack
                .iter()
                .rev()
                .nth(1)
                .cloned()
                .unwrap_or_else(|| name.to_owned());
            return Err(ResolveError::UnknownProject {
                name: name.to_owned(),
                requested_by,
            });
        };
        for dep in project.dependencies.clone() {
            self.visit(&dep, false)?;
        }

        self.stack.pop();
        self.states.insert(name.to_owned(), VisitState::Visited);
        if !is_root {
            project.adapt_for_library();
        }
        let node = Arc::new(project);
        self.order.push(Arc::clone(&node));
        self.nodes.insert(name.to_owned(), node);
        Ok(())
    }

    /// Slice the active stack from the first occurrence of `name`, close
    /// the loop, and canonicalise so the report is deterministic.
    fn cycle_path(&self, name: &str) -> Vec<String> {
        let idx = self.stack.iter().position(|n| n == name).unwrap_or(0);
        let mut cycle: Vec<String> = self.stack.iter().skip(idx).cloned().collect();
        cycle.push(name.to_owned());
        canonicalize_cycle(cycle)
    }
}

/// Rotate a closed cycle so it starts at its smallest name.
///
/// The walk may enter a cycle at any of its nodes; rotating makes the
/// reported path independent of the entry point.
fn canonicalize_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}

//! Flattened build description output.
//!
//! This module renders a flattened [`Project`] for the downstream
//! build-file generator. The text form is line-oriented and stable: field
//! order is fixed and sequence fields keep their merge order, which is
//! already deterministic and semantically meaningful (compiler invocation
//! order), so nothing is re-sorted here. A JSON form is provided for
//! generators that prefer structured input.

use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use serde_json::json;

use crate::project::Project;
use crate::resolve::Resolved;

/// Render the flattened build description as text.
///
/// # Examples
///
/// ```
/// use musubi::emit;
/// use musubi::project::Project;
///
/// let mut project = Project::new("krass");
/// project.add_file("src/krass.c");
/// let text = emit::render(&project);
/// assert!(text.starts_with("project krass"));
/// ```
#[must_use]
pub fn render(project: &Project) -> String {
    BuildDescription(project).to_string()
}

struct BuildDescription<'a>(&'a Project);

impl Display for BuildDescription<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let project = self.0;
        writeln!(f, "project {}", project.name)?;
        if let Some(std) = &project.c_std {
            writeln!(f, "c_std {std}")?;
        }
        if let Some(std) = &project.cpp_std {
            writeln!(f, "cpp_std {std}")?;
        }
        if let Some(dir) = &project.debug_dir {
            writeln!(f, "debug_dir {dir}")?;
        }
        writeln!(f, "sources")?;
        for file in &project.files {
            writeln!(f, "  {file}")?;
        }
        if !project.include_dirs.is_empty() {
            writeln!(f, "include_flags {}", include_flags(project).iter().join(" "))?;
        }
        if !project.defines.is_empty() {
            writeln!(f, "define_flags {}", define_flags(project).iter().join(" "))?;
        }
        Ok(())
    }
}

/// Compiler `-I` flags for the project's include directories, in order.
#[must_use]
pub fn include_flags(project: &Project) -> Vec<String> {
    project
        .include_dirs
        .iter()
        .map(|dir| format!("-I{dir}"))
        .collect()
}

/// Compiler `-D` flags for the project's defines, in merge order.
#[must_use]
pub fn define_flags(project: &Project) -> Vec<String> {
    project
        .defines
        .iter()
        .map(|define| format!("-D{define}"))
        .collect()
}

/// Render the flattened build description as JSON.
///
/// The object mirrors the text form; `defines` keep their optional values
/// rather than being collapsed into flag strings.
#[must_use]
pub fn to_json(project: &Project) -> serde_json::Value {
    json!({
        "project": project.name,
        "files": project.files,
        "include_dirs": project.include_dirs,
        "defines": project
            .defines
            .iter()
            .map(|d| json!({ "name": d.name, "value": d.value }))
            .collect::<Vec<_>>(),
        "debug_dir": project.debug_dir,
        "c_std": project.c_std,
        "cpp_std": project.cpp_std,
    })
}

/// Render the resolved dependency tree as an indented listing.
///
/// Diamond nodes reappear under every dependent; the graph is acyclic by
/// construction, so the walk terminates.
#[must_use]
pub fn render_graph(resolved: &Resolved) -> String {
    let mut out = String::new();
    render_node(resolved, &resolved.root.name, 0, &mut out);
    out
}

fn render_node(resolved: &Resolved, name: &str, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(name);
    out.push('\n');
    if let Some(node) = resolved.nodes.get(name) {
        for dep in &node.dependencies {
            render_node(resolved, dep, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn sample() -> Project {
        let mut project = Project::new("krass");
        project.add_file("src/krass.c");
        project.add_include_dir("src");
        project.add_define("KR_FULL_RGBA_FONTS");
        project.add_define("KR_VERSION=2");
        project.set_debug_dir(Some("tests/bin".into()));
        project.set_c_std("c99");
        project.set_cpp_std("c++11");
        project
    }

    #[test]
    fn render_is_stable_and_ordered() {
        let text = render(&sample());
        let expected = concat!(
            "project krass\n",
            "c_std c99\n",
            "cpp_std c++11\n",
            "debug_dir tests/bin\n",
            "sources\n",
            "  src/krass.c\n",
            "include_flags -Isrc\n",
            "define_flags -DKR_FULL_RGBA_FONTS -DKR_VERSION=2\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn render_omits_unset_scalars() {
        let mut project = Project::new("bare");
        project.add_file("a.c");
        let text = render(&project);
        assert!(!text.contains("c_std"));
        assert!(!text.contains("debug_dir"));
        assert!(!text.contains("include_flags"));
    }

    #[test]
    fn json_mirrors_the_text_form() {
        let value = to_json(&sample());
        assert_eq!(value["project"], "krass");
        assert_eq!(value["files"][0], "src/krass.c");
        assert_eq!(value["defines"][1]["value"], "2");
        assert_eq!(value["cpp_std"], "c++11");
    }

    #[test]
    fn graph_lists_dependencies_indented() {
        let mut root = Project::new("root");
        root.add_dependency("dep");
        let dep = Project::new("dep");
        let root = Arc::new(root);
        let dep = Arc::new(dep);
        let resolved = Resolved {
            root: Arc::clone(&root),
            order: vec![Arc::clone(&dep), Arc::clone(&root)],
            nodes: HashMap::from([
                ("root".to_owned(), root),
                ("dep".to_owned(), dep),
            ]),
        };
        assert_eq!(render_graph(&resolved), "root\n  dep\n");
    }
}

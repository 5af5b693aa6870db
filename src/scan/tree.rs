//! Directory tree rendering from the repository index.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::scan::index::RepositoryIndex;

#[derive(Debug, Default)]
struct Node {
    dirs: BTreeMap<String, Node>,
    files: BTreeSet<String>,
}

impl Node {
    fn insert(&mut self, path: &str) {
        match path.split_once('/') {
            Some((dir, rest)) => self.dirs.entry(dir.to_string()).or_default().insert(rest),
            None => {
                self.files.insert(path.to_string());
            }
        }
    }
}

/// Render indexed paths as a tree, directories before files.
///
/// Paths in `highlights` (typically the changed files) are marked with a star.
pub fn render_tree(index: &RepositoryIndex, root_name: &str, highlights: &HashSet<String>) -> String {
    let mut root = Node::default();
    for path in index.iter() {
        root.insert(path);
    }

    let mut lines = vec![format!("{}/", root_name)];
    walk_tree(&root, "", "", highlights, &mut lines);
    lines.join("\n")
}

fn walk_tree(node: &Node, rel_dir: &str, prefix: &str, highlights: &HashSet<String>, lines: &mut Vec<String>) {
    let total_entries = node.dirs.len() + node.files.len();
    let mut idx = 0;

    for (name, child) in &node.dirs {
        idx += 1;
        let is_last = idx == total_entries;
        let connector = if is_last { "└── " } else { "├── " };
        lines.push(format!("{}{}{}/", prefix, connector, name));

        let rel_path = child_path(rel_dir, name);
        let extension = if is_last { "    " } else { "│   " };
        walk_tree(child, &rel_path, &format!("{}{}", prefix, extension), highlights, lines);
    }

    for name in &node.files {
        idx += 1;
        let connector = if idx == total_entries { "└── " } else { "├── " };
        let marker = if highlights.contains(&child_path(rel_dir, name)) { " ⭐" } else { "" };
        lines.push(format!("{}{}{}{}", prefix, connector, name, marker));
    }
}

fn child_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_directories_before_files() {
        let index = RepositoryIndex::from_paths(["README.md", "src/main.ts", "src/lib/util.ts"]);
        let tree = render_tree(&index, "demo", &HashSet::new());
        let expected = "demo/\n├── src/\n│   ├── lib/\n│   │   └── util.ts\n│   └── main.ts\n└── README.md";
        similar_asserts::assert_eq!(tree, expected);
    }

    #[test]
    fn highlights_changed_files() {
        let index = RepositoryIndex::from_paths(["src/a.ts", "src/b.ts"]);
        let highlights: HashSet<String> = ["src/b.ts".to_string()].into_iter().collect();
        let tree = render_tree(&index, ".", &highlights);
        assert!(tree.contains("└── b.ts ⭐"));
        assert!(!tree.contains("a.ts ⭐"));
    }

    #[test]
    fn empty_index_renders_root_only() {
        let tree = render_tree(&RepositoryIndex::default(), "repo", &HashSet::new());
        assert_eq!(tree, "repo/");
    }
}

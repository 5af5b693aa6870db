//! Repository-relative path manipulation.
//!
//! Paths in this crate are `/`-separated strings relative to the repository
//! root, never absolute and never carrying `.` or `..` segments once
//! normalized. The root itself is the empty string.

pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Collapse `.` and `..` segments and empty components.
///
/// `..` above the root is clamped at the root.
pub fn normalize_segments(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            _ => stack.push(part),
        }
    }
    stack.join("/")
}

/// Parent directory, `""` for top-level entries.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Split a file name into stem and extension (extension keeps its dot).
///
/// Dotfiles such as `.eslintrc` have no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => (&name[..idx], &name[idx..]),
    }
}

/// Lowercased extension of a path, including the leading dot.
pub fn extension(path: &str) -> String {
    split_extension(file_name(path)).1.to_ascii_lowercase()
}

/// Join path parts, skipping empty ones.
pub fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// `dir` followed by up to `levels` of its ancestors, ending at the root.
pub fn ancestors(dir: &str, levels: usize) -> Vec<String> {
    let mut out = vec![dir.to_string()];
    let mut current = dir;
    for _ in 0..levels {
        if current.is_empty() {
            break;
        }
        current = parent_dir(current);
        out.push(current.to_string());
    }
    out
}

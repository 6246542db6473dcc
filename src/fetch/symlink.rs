//! Symbolic link target resolution inside a repository.
//!
//! Pure path arithmetic over `/`-separated repo-relative paths; no I/O.

/// Resolve a link `target` found in `current_dir` to a repo-relative path.
///
/// - `/a/b` is relative to the repository root
/// - `./a`, `a` are relative to `current_dir`
/// - `../a` walks up from `current_dir`; walking above the root stops at the root
///
/// The result never starts or ends with `/` and contains no `.` or `..`
/// segments. An empty string denotes the repository root.
#[must_use]
pub fn resolve_link_target(current_dir: &str, target: &str) -> String {
    let target = target.trim();
    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        split_segments(current_dir).collect()
    };

    for segment in split_segments(target) {
        match segment {
            "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Join a relative prefix and a name with `/`, tolerating an empty prefix.
#[must_use]
pub fn join_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let name = name.trim_matches('/');
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{name}"),
    }
}

/// True when `path` is `dir` itself or lies somewhere beneath it.
#[must_use]
pub fn contains_path(dir: &str, path: &str) -> bool {
    let mut path_segments = split_segments(path);
    split_segments(dir).all(|segment| path_segments.next() == Some(segment))
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

//! Node path helpers
//!
//! Full node paths look like `|group1|ns:pCube1`. `|` separates hierarchy
//! levels and `:` separates namespaces.

/// Last path segment without its namespace (`|grp|ns:pCube1` → `pCube1`)
pub fn base_name(path: &str) -> &str {
    let leaf = root_name(path);
    leaf.rsplit(':').next().unwrap_or(leaf)
}

/// Last path segment, namespace included (`|grp|ns:pCube1` → `ns:pCube1`)
pub fn root_name(path: &str) -> &str {
    path.rsplit('|').next().unwrap_or(path)
}

/// Namespace of the last path segment, if any (`|grp|a:b:pCube1` → `a:b`)
pub fn namespace(path: &str) -> Option<&str> {
    root_name(path).rsplit_once(':').map(|(ns, _)| ns)
}

/// Number of hierarchy levels of a full path
pub fn depth(path: &str) -> usize {
    path.split('|').filter(|s| !s.is_empty()).count()
}

//! Conversion between logical template names and filesystem paths.
//!
//! Templates are addressed by extensionless, slash-separated names relative to
//! the template root (`"pages/home"`). The filesystem collaborator works with
//! paths relative to its base, including the root and the extension
//! (`"views/pages/home.tpl"`). This module converts between the two and builds
//! the composite keys used by the template set cache.
//!
//! Roots are handled as prefixes with a trailing slash (`"views/"`). The base
//! directory itself is the empty prefix, see [`dir_prefix`].

use regex::escape;

/// Joins `parts` with `/` and lexically cleans the result.
///
/// Backslashes are treated as separators, `.` segments are dropped, `..` pops
/// the preceding segment and repeated separators collapse. An empty result is
/// `"."`.
///
/// ```rust
/// use trellis::path::normalize_path;
///
/// assert_eq!(normalize_path(&["views/", "./pages//home.tpl"]), "views/pages/home.tpl");
/// assert_eq!(normalize_path(&["views", "../layout.tpl"]), "layout.tpl");
/// assert_eq!(normalize_path(&[""]), ".");
/// ```
pub fn normalize_path(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/");

    let rooted = joined.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let cleaned = segments.join("/");
    match (rooted, cleaned.is_empty()) {
        (true, _) => format!("/{}", cleaned),
        (false, true) => ".".to_string(),
        (false, false) => cleaned,
    }
}

/// Normalizes a directory into the prefix form used by [`to_name`] and [`to_path`].
///
/// The base directory (`""`, `"."`, `"./"`) becomes the empty prefix; any other
/// directory gets exactly one trailing slash.
///
/// ```rust
/// use trellis::path::dir_prefix;
///
/// assert_eq!(dir_prefix("views"), "views/");
/// assert_eq!(dir_prefix("./views/partials/"), "views/partials/");
/// assert_eq!(dir_prefix("."), "");
/// ```
pub fn dir_prefix(dir: &str) -> String {
    match normalize_path(&[dir.trim()]).as_str() {
        "." => String::new(),
        dir => format!("{}/", dir),
    }
}

/// Converts a file path into a template name by stripping `root` and `ext`.
///
/// ```rust
/// use trellis::path::to_name;
///
/// assert_eq!(to_name("views/pages/home.tpl", "views/", ".tpl"), "pages/home");
/// assert_eq!(to_name("", "views/", ".tpl"), "");
/// ```
pub fn to_name(path: &str, root: &str, ext: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let path = path.strip_prefix(root).unwrap_or(path);
    let path = path.strip_suffix(ext).unwrap_or(path);
    normalize_path(&[path])
}

/// Converts a template name into a file path under `root` with `ext`.
///
/// A root prefix or extension already present on `name` is not doubled.
///
/// ```rust
/// use trellis::path::to_path;
///
/// assert_eq!(to_path("pages/home", "views/", ".tpl"), "views/pages/home.tpl");
/// assert_eq!(to_path("views/pages/home.tpl", "views/", ".tpl"), "views/pages/home.tpl");
/// assert_eq!(to_path("", "views/", ".tpl"), "");
/// ```
pub fn to_path(name: &str, root: &str, ext: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let name = name.strip_prefix(root).unwrap_or(name);
    let name = name.strip_suffix(ext).unwrap_or(name);
    normalize_path(&[root, &format!("{}{}", name, ext)])
}

/// Separator between the identifiers of a composite cache key.
pub const KEY_SEPARATOR: char = ':';

/// Builds a cache key from ordered identifiers, skipping empty ones.
///
/// The first identifier is the view, the second the layout (possibly empty)
/// and the rest are per-call partials. Order is significant.
///
/// ```rust
/// use trellis::path::to_key;
///
/// assert_eq!(to_key(["pages/home", "layout", "forms/contact"]), "pages/home:layout:forms/contact");
/// assert_eq!(to_key(["x", "", ""]), "x");
/// ```
pub fn to_key<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::new();
    for id in ids {
        let id = id.as_ref();
        if id.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(id);
    }
    key
}

/// Builds a regex source matching files with `ext`, optionally under `prefix`.
///
/// ```rust
/// use trellis::path::ext_pattern;
///
/// assert_eq!(ext_pattern("", ".tpl"), r".*\.tpl$");
/// assert_eq!(ext_pattern("views/partials/", ".tpl"), r"^views/partials/.*\.tpl$");
/// ```
pub fn ext_pattern(prefix: &str, ext: &str) -> String {
    if prefix.is_empty() {
        format!(".*{}$", escape(ext))
    } else {
        format!("^{}.*{}$", escape(prefix), escape(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use regex::Regex;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(&["a", "b", "c.tpl"]), "a/b/c.tpl");
        assert_eq!(normalize_path(&["a//b/./c"]), "a/b/c");
        assert_eq!(normalize_path(&["a/b/../c"]), "a/c");
        assert_eq!(normalize_path(&["../a"]), "../a");
        assert_eq!(normalize_path(&["/../a"]), "/a");
        assert_eq!(normalize_path(&["a\\b"]), "a/b");
        assert_eq!(normalize_path(&["", ""]), ".");
        assert_eq!(normalize_path(&["./"]), ".");
    }

    #[test]
    fn test_dir_prefix() {
        assert_eq!(dir_prefix(""), "");
        assert_eq!(dir_prefix("./"), "");
        assert_eq!(dir_prefix("views//"), "views/");
        assert_eq!(dir_prefix(" views "), "views/");
    }

    #[test]
    fn test_to_name_with_base_root() {
        assert_eq!(to_name("pages/home.tpl", "", ".tpl"), "pages/home");
        assert_eq!(to_name(".hidden/x.tpl", "", ".tpl"), ".hidden/x");
    }

    #[test]
    fn test_to_name_partials() {
        assert_eq!(
            to_name("views/partials/nav/menu.tpl", "views/partials/", ".tpl"),
            "nav/menu"
        );
    }

    #[test]
    fn test_to_path_normalizes_name() {
        assert_eq!(to_path("./pages//home", "views/", ".tpl"), "views/pages/home.tpl");
        assert_eq!(to_path("pages/home.tpl", "", ".tpl"), "pages/home.tpl");
        assert_eq!(to_path("layout", "", ".html"), "layout.html");
    }

    #[test]
    fn test_key_skips_empty_entries() {
        assert_eq!(to_key(["x", "", ""]), "x");
        assert_eq!(to_key(["x", "", "p"]), "x:p");
        assert_eq!(to_key(Vec::<String>::new()), "");
    }

    #[test]
    fn test_ext_pattern_escapes_and_anchors() {
        let rx = Regex::new(&ext_pattern("", ".tpl")).unwrap();
        assert!(rx.is_match("views/home.tpl"));
        assert!(!rx.is_match("views/home.tpl.bak"));
        assert!(!rx.is_match("views/homextpl"));

        let rx = Regex::new(&ext_pattern("views/partials/", ".tpl")).unwrap();
        assert!(rx.is_match("views/partials/header.tpl"));
        assert!(!rx.is_match("views/pages/header.tpl"));
        assert!(!rx.is_match("other/views/partials/header.tpl"));
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,7}"
    }

    fn name() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..4).prop_map(|parts| parts.join("/"))
    }

    proptest! {
        #[test]
        fn prop_path_name_round_trip(name in name(), root in prop::option::of(segment())) {
            let root = root.map(|r| dir_prefix(&r)).unwrap_or_default();
            prop_assume!(root.is_empty() || !name.starts_with(&root));
            let path = to_path(&name, &root, ".tpl");
            prop_assert_eq!(&to_name(&path, &root, ".tpl"), &name);
            prop_assert_eq!(to_path(&to_name(&path, &root, ".tpl"), &root, ".tpl"), path.clone());
            prop_assert_eq!(to_path(&path, &root, ".tpl"), path);
        }

        #[test]
        fn prop_key_is_order_sensitive(a in segment(), b in segment(), c in segment()) {
            prop_assume!(a != b);
            prop_assert_ne!(to_key([&a, &b, &c]), to_key([&b, &a, &c]));
        }

        #[test]
        fn prop_key_ignores_empty(ids in prop::collection::vec(prop::option::of(segment()), 0..6)) {
            let with_gaps: Vec<String> = ids.iter().map(|id| id.clone().unwrap_or_default()).collect();
            let compact: Vec<String> = ids.into_iter().flatten().collect();
            prop_assert_eq!(to_key(&with_gaps), to_key(&compact));
        }
    }
}

/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! Helpers for server-relative paths and the loosely typed JSON returned by the API.

use serde_json::Value;

/// Returns the path without its leading slash (if it has one).
///
/// `"/a/b"` becomes `"a/b"`, `"a/b"` is returned as is.
pub fn normalize_relative(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Returns the canonical absolute form of a path: a single leading slash, no empty segments
/// and no trailing slash.
///
/// ```
/// use sharepoint::rest::normalize_absolute;
/// assert_eq!(normalize_absolute(""), "/");
/// assert_eq!(normalize_absolute("/a//b/"), "/a/b");
/// ```
pub fn normalize_absolute(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Splits a path into its canonical parent folder and its last segment.
pub fn split_parent(path: &str) -> (String, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, name)) => (normalize_absolute(parent), name),
        None => ("/".to_string(), trimmed),
    }
}

/// Walks nested JSON objects following `path` and returns the terminal value.
///
/// A missing key, a non object intermediate value or a `null` yields `None`.
pub fn get_from_json_path<'a>(path: &[&str], json: &'a Value) -> Option<&'a Value> {
    path.iter()
        .try_fold(json, |node, key| node.as_object()?.get(*key))
        .filter(|v| !v.is_null())
}

/// Escapes a value so it can be embedded in a single quoted XML attribute.
pub fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// OData type name of the items of a list created from its title.
///
/// The title is capitalized (first letter upper case, the rest lower case) and spaces are
/// encoded as `_x0020_`, e.g. `"My List"` gives `SP.Data.My_x0020_listListItem`.
pub fn list_item_entity_type(list_title: &str) -> String {
    let mut chars = list_title.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    };
    format!("SP.Data.{}ListItem", capitalized.replace(' ', "_x0020_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absolute_paths() {
        assert_eq!(normalize_absolute(""), "/");
        assert_eq!(normalize_absolute("/"), "/");
        assert_eq!(normalize_absolute("/a//b/"), "/a/b");
        assert_eq!(normalize_absolute("a/b"), "/a/b");
        assert_eq!(normalize_absolute("//"), "/");
    }

    #[test]
    fn relative_of_absolute_is_idempotent() {
        for p in ["", "/", "a", "/a", "//a//b/", "a/b/c/"] {
            let rel = normalize_relative(&normalize_absolute(p)).to_string();
            assert!(!rel.starts_with('/'), "{p:?} -> {rel:?}");
            assert_eq!(normalize_relative(&rel), rel);
        }
        assert_eq!(normalize_relative("/a/b"), "a/b");
        assert_eq!(normalize_relative("//a"), "/a");
        assert_eq!(normalize_relative("a"), "a");
    }

    #[test]
    fn split_into_parent_and_name() {
        assert_eq!(split_parent("/a/b/c.txt"), ("/a/b".to_string(), "c.txt"));
        assert_eq!(split_parent("/c.txt"), ("/".to_string(), "c.txt"));
        assert_eq!(split_parent("c.txt"), ("/".to_string(), "c.txt"));
    }

    #[test]
    fn json_path_lookup() {
        let doc = json!({"d": {"x": {"y": 42}}, "n": null});
        assert_eq!(get_from_json_path(&["d", "x", "y"], &doc), Some(&json!(42)));
        assert_eq!(get_from_json_path(&["d", "missing", "y"], &doc), None);
        assert_eq!(get_from_json_path(&["d", "x", "y", "z"], &doc), None);
        assert_eq!(get_from_json_path(&["n"], &doc), None);
        assert_eq!(get_from_json_path(&[], &doc), Some(&doc));
    }

    #[test]
    fn escapes_xml_attribute() {
        assert_eq!(
            xml_escape(r#"R&D "new" <a/b>"#),
            "R&amp;D &quot;new&quot; &lt;a&#x2F;b&gt;"
        );
        assert_eq!(xml_escape("it's"), "it&apos;s");
    }

    #[test]
    fn entity_type_from_title() {
        assert_eq!(list_item_entity_type("My List"), "SP.Data.My_x0020_listListItem");
        assert_eq!(list_item_entity_type("tasks"), "SP.Data.TasksListItem");
        assert_eq!(list_item_entity_type(""), "SP.Data.ListItem");
    }
}

//! Directive Extractor.
//!
//! A declaration becomes a route when its doc comment carries a line such as
//! `// @server path=/items method=GET`.

use std::sync::LazyLock;

use regex::Regex;

/// Token a comment line must contain to be considered at all.
pub const MARKER: &str = "@server";

#[allow(clippy::expect_used)]
static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"path\s*=\s*(\S+)").expect("path pattern is valid"));

#[allow(clippy::expect_used)]
static METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"method\s*=\s*(\S+)").expect("method pattern is valid"));

/// Route address extracted from a doc comment. Both fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Route path, query string included
    pub path: String,
    /// HTTP verb exactly as written
    pub verb: String,
}

#[derive(Default)]
struct Fold {
    path: String,
    method: String,
}

/// Extract the route directive from the ordered lines of a doc comment.
///
/// Returns `None` when the declaration is not routable.
pub fn extract<S: AsRef<str>>(lines: &[S]) -> Option<Directive> {
    let mut state = Fold::default();
    let mut considered = false;

    for line in lines.iter().map(AsRef::as_ref) {
        if !line.contains(MARKER) {
            continue;
        }
        considered = true;

        if let Some(value) = capture(&PATH_RE, line) {
            state.path = value.to_string();
        }
        if let Some(value) = capture(&METHOD_RE, line) {
            state.method = value.to_string();
        }

        // An empty path is never a valid partial state.
        if state.path.is_empty() {
            return None;
        }
    }

    if !considered || state.method.is_empty() {
        return None;
    }

    Some(Directive {
        path: state.path,
        verb: state.method,
    })
}

fn capture<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(path: &str, verb: &str) -> Option<Directive> {
        Some(Directive {
            path: path.to_string(),
            verb: verb.to_string(),
        })
    }

    #[test]
    fn test_path_and_method_on_one_line() {
        assert_eq!(
            extract(&["// @server path=/api/users method=GET"]),
            directive("/api/users", "GET")
        );
    }

    #[test]
    fn test_regular_comment_is_not_routable() {
        assert_eq!(extract(&["// This is just a regular comment"]), None);
        assert_eq!(extract::<&str>(&[]), None);
    }

    #[test]
    fn test_last_directive_wins() {
        let lines = [
            "// @server path=/api/v1/users method=GET",
            "// @server path=/api/v2/users method=POST",
        ];
        assert_eq!(extract(&lines), directive("/api/v2/users", "POST"));
    }

    #[test]
    fn test_last_wins_per_field() {
        let lines = ["// @server path=/a method=GET", "// @server path=/b"];
        assert_eq!(extract(&lines), directive("/b", "GET"));
    }

    #[test]
    fn test_order_of_keys_does_not_matter() {
        assert_eq!(
            extract(&["// @server method=PUT path=/api/update"]),
            directive("/api/update", "PUT")
        );
    }

    #[test]
    fn test_path_keeps_punctuation() {
        assert_eq!(
            extract(&["// @server path=/api/users/{id}/posts?sort=desc method=GET"]),
            directive("/api/users/{id}/posts?sort=desc", "GET")
        );
        assert_eq!(
            extract(&["// @server path=/api/v1/data-export/{format} method=GET"]),
            directive("/api/v1/data-export/{format}", "GET")
        );
    }

    #[test]
    fn test_whitespace_around_equals() {
        assert_eq!(
            extract(&["// @server path = /api/resources method = PATCH"]),
            directive("/api/resources", "PATCH")
        );
        assert_eq!(
            extract(&["// @server path=/api/v1      method=GET"]),
            directive("/api/v1", "GET")
        );
    }

    #[test]
    fn test_empty_values_are_not_routable() {
        assert_eq!(extract(&["// @server path= method="]), None);
        assert_eq!(extract(&["// @server method=GET"]), None);
        assert_eq!(extract(&["// @server path=/items"]), None);
    }

    #[test]
    fn test_empty_path_fails_fast() {
        let lines = ["// @server method=GET", "// @server path=/later method=POST"];
        assert_eq!(extract(&lines), None);
    }

    #[test]
    fn test_method_may_arrive_on_a_later_line() {
        let lines = ["// @server path=/items", "// @server method=DELETE"];
        assert_eq!(extract(&lines), directive("/items", "DELETE"));
    }

    #[test]
    fn test_verb_is_verbatim() {
        assert_eq!(
            extract(&["// @server path=/api/data method=get"]),
            directive("/api/data", "get")
        );
    }

    #[test]
    fn test_unmarked_lines_are_ignored() {
        let lines = [
            "// ListItems returns every item.",
            "// path=/ignored method=PUT",
            "// @server path=/items method=GET",
        ];
        assert_eq!(extract(&lines), directive("/items", "GET"));
    }
}

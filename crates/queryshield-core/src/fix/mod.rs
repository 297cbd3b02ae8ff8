//! Turns structured fix suggestions into pasteable snippets.

use crate::report::Suggestion;

pub const SELECT_RELATED: &str = "select_related";
pub const PREFETCH_RELATED: &str = "prefetch_related";
pub const AVOID_SELECT_STAR: &str = "avoid_select_star";

const DEFAULT_COLUMN_RESTRICTION: &str = ".only()";

/// Render a suggestion as literal code or DDL.
///
/// Never fails. DDL takes precedence over `kind`; unknown kinds fall back to the
/// suggestion serialized as JSON; no suggestion renders as an empty string,
/// meaning "no automated fix available".
pub fn render(suggestion: Option<&Suggestion>) -> String {
    let Some(s) = suggestion else {
        return String::new();
    };

    if let Some(ddl) = s.ddl.as_deref().filter(|d| !d.trim().is_empty()) {
        return ddl.to_string();
    }

    match s.kind.as_deref() {
        Some(SELECT_RELATED) => eager_load(SELECT_RELATED, s),
        Some(PREFETCH_RELATED) => eager_load(PREFETCH_RELATED, s),
        Some(AVOID_SELECT_STAR) => s
            .arg_str("use")
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_COLUMN_RESTRICTION)
            .to_string(),
        _ => serde_json::to_string(s).unwrap_or_default(),
    }
}

/// `.select_related()` or, with `args.fields`, `.select_related("author", "publisher")`.
fn eager_load(method: &str, s: &Suggestion) -> String {
    let fields: Vec<String> = s
        .args
        .as_ref()
        .and_then(|a| a.get("fields"))
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(|f| format!("\"{f}\""))
                .collect()
        })
        .unwrap_or_default();
    format!(".{method}({})", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_suggestion_renders_empty() {
        assert_eq!(render(None), "");
    }

    #[test]
    fn ddl_wins_regardless_of_kind() {
        let s = Suggestion::of_kind(SELECT_RELATED)
            .with_ddl("CREATE INDEX idx_books_author_id ON books (author_id);");
        assert_eq!(
            render(Some(&s)),
            "CREATE INDEX idx_books_author_id ON books (author_id);"
        );
        let s = Suggestion::default().with_ddl("CREATE INDEX ...");
        assert_eq!(render(Some(&s)), "CREATE INDEX ...");
    }

    #[test]
    fn eager_load_snippets() {
        assert_eq!(render(Some(&Suggestion::of_kind(SELECT_RELATED))), ".select_related()");
        assert_eq!(
            render(Some(&Suggestion::of_kind(PREFETCH_RELATED))),
            ".prefetch_related()"
        );
        let s = Suggestion::of_kind(SELECT_RELATED).with_args(json!({"fields": ["author", "publisher"]}));
        assert_eq!(render(Some(&s)), r#".select_related("author", "publisher")"#);
    }

    #[test]
    fn avoid_select_star_prefers_use_argument() {
        let s = Suggestion::of_kind(AVOID_SELECT_STAR).with_args(json!({"use": ".only(\"id\", \"title\")"}));
        assert_eq!(render(Some(&s)), ".only(\"id\", \"title\")");
        assert_eq!(render(Some(&Suggestion::of_kind(AVOID_SELECT_STAR))), ".only()");
    }

    #[test]
    fn unknown_kind_falls_back_to_json() {
        let s: Suggestion = serde_json::from_value(json!({"kind": "create_index", "args": {"table": "books"}})).unwrap();
        assert_eq!(
            render(Some(&s)),
            r#"{"kind":"create_index","args":{"table":"books"}}"#
        );
    }
}

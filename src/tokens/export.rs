//! Assembles a project's token set into exportable byte content. The
//! HTTP boundary owns content-type and disposition headers.

use chrono::Utc;
use serde_json::json;

use crate::models::{Project, Token};

/// CSS stylesheet with one custom-property declaration per token,
/// sorted by category then name so repeated exports diff cleanly.
/// Deprecated tokens are excluded unless asked for.
pub fn css_bundle(tokens: &[Token], include_deprecated: bool) -> String {
    let mut selected: Vec<&Token> = tokens
        .iter()
        .filter(|t| include_deprecated || !t.deprecated)
        .collect();
    selected.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));

    let mut css = String::from(":root {\n");
    for token in selected {
        css.push_str("  ");
        css.push_str(&token.to_css_variable());
        css.push('\n');
    }
    css.push_str("}\n");
    css
}

/// JSON bundle with full token records in storage order.
pub fn json_bundle(project: &Project, tokens: &[Token]) -> serde_json::Value {
    json!({
        "project": {
            "id": project.id,
            "name": project.name,
        },
        "exported_at": Utc::now(),
        "count": tokens.len(),
        "tokens": tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn token(name: &str, category: &str, value: serde_json::Value, deprecated: bool) -> Token {
        let now = Utc::now();
        Token {
            id: Uuid::now_v7(),
            project_id: Uuid::nil(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            path: name.replace('-', "."),
            category: category.to_string(),
            value: sqlx::types::Json(serde_json::from_value(value).unwrap()),
            description: String::new(),
            deprecated,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn declarations_are_sorted_by_category_then_name() {
        let tokens = vec![
            token("spacing-md", "spacing", json!(16), false),
            token("primary-color", "color", json!("#8cd5b4"), false),
            token("accent-color", "color", json!("#ff8800"), false),
        ];
        let css = css_bundle(&tokens, false);
        let lines: Vec<&str> = css.lines().collect();
        assert_eq!(
            lines,
            vec![
                ":root {",
                "  --color-accent-color: #ff8800;",
                "  --color-primary-color: #8cd5b4;",
                "  --spacing-spacing-md: 16;",
                "}",
            ]
        );
    }

    #[test]
    fn deprecated_tokens_are_excluded_by_default() {
        let tokens = vec![
            token("old-color", "color", json!("#000"), true),
            token("new-color", "color", json!("#fff"), false),
        ];
        assert!(!css_bundle(&tokens, false).contains("old-color"));
        assert!(css_bundle(&tokens, true).contains("old-color"));
    }

    #[test]
    fn structured_value_without_subfield_emits_json() {
        let tokens = vec![token(
            "shadow-md",
            "effect",
            json!({"x": 0, "y": 4, "blur": 8, "spread": 0, "color": "rgba(0,0,0,0.2)"}),
            false,
        )];
        let css = css_bundle(&tokens, false);
        assert!(css.contains("--effect-shadow-md: {"));
        assert!(css.contains("\"blur\":8"));
    }

    #[test]
    fn json_bundle_keeps_storage_order() {
        let now = Utc::now();
        let project = Project {
            id: Uuid::now_v7(),
            user_id: Uuid::nil(),
            name: "Demo".to_string(),
            description: String::new(),
            status: "draft".to_string(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let tokens = vec![
            token("b-color", "color", json!("#222"), false),
            token("a-color", "color", json!("#111"), false),
        ];
        let bundle = json_bundle(&project, &tokens);
        assert_eq!(bundle["count"], 2);
        assert_eq!(bundle["tokens"][0]["name"], "b-color");
        assert_eq!(bundle["tokens"][1]["name"], "a-color");
        assert_eq!(bundle["project"]["name"], "Demo");
    }
}

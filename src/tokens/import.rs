//! Bulk token import with per-item outcomes.
//!
//! Each draft is validated and inserted independently: one bad row
//! rejects that row, never the batch. Duplicates are caught twice —
//! within the batch itself, and by the unique indexes on
//! (project_id, name) and (project_id, path), which stay authoritative
//! under concurrent imports.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::{Token, token};
use crate::tokens::value::TokenValue;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// An incoming token definition, shared by single create and bulk import.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenDraft {
    pub name: String,
    pub path: String,
    pub category: String,
    pub value: TokenValue,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportRejection {
    pub index: usize,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub created: Vec<Token>,
    pub failed: Vec<ImportRejection>,
}

/// Field constraints applied to every write path, mirrored by the
/// unique indexes only for the scoped name/path pairs.
pub fn validate(draft: &TokenDraft) -> Result<(), String> {
    if draft.name.trim().is_empty() {
        return Err("Token name is required".to_string());
    }
    if draft.name.len() > MAX_NAME_LEN {
        return Err(format!("Name cannot be more than {MAX_NAME_LEN} characters"));
    }
    if draft.path.trim().is_empty() {
        return Err("Token path is required".to_string());
    }
    if !token::CATEGORIES.contains(&draft.category.as_str()) {
        return Err(format!("Invalid category '{}'", draft.category));
    }
    if draft.description.len() > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "Description cannot be more than {MAX_DESCRIPTION_LEN} characters"
        ));
    }
    Ok(())
}

pub async fn run(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
    drafts: Vec<TokenDraft>,
) -> Result<ImportReport, AppError> {
    let mut report = ImportReport {
        created: Vec::new(),
        failed: Vec::new(),
    };
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut seen_paths: HashSet<String> = HashSet::new();

    for (index, draft) in drafts.into_iter().enumerate() {
        let name = draft.name.clone();

        if let Err(error) = validate(&draft) {
            report.failed.push(ImportRejection { index, name, error });
            continue;
        }
        if !seen_names.insert(draft.name.clone()) {
            report.failed.push(ImportRejection {
                index,
                name,
                error: "Duplicate token name within this import".to_string(),
            });
            continue;
        }
        if !seen_paths.insert(draft.path.clone()) {
            report.failed.push(ImportRejection {
                index,
                name,
                error: "Duplicate token path within this import".to_string(),
            });
            continue;
        }

        match db::tokens::create(pool, project_id, user_id, &draft).await {
            Ok(created) => report.created.push(created),
            Err(err) => match duplicate_reason(&err) {
                Some(error) => {
                    // Losing a race against a concurrent writer lands
                    // here too; rejected, never retried.
                    report.failed.push(ImportRejection { index, name, error });
                }
                None => return Err(AppError::Database(err)),
            },
        }
    }

    Ok(report)
}

/// Distinguish which scoped unique index rejected the insert.
fn duplicate_reason(err: &sqlx::Error) -> Option<String> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if !db_err.is_unique_violation() {
        return None;
    }
    match db_err.constraint() {
        Some(c) if c.contains("path") => {
            Some("A token with this path already exists in the project".to_string())
        }
        _ => Some("A token with this name already exists in the project".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(name: &str, path: &str, category: &str) -> TokenDraft {
        TokenDraft {
            name: name.to_string(),
            path: path.to_string(),
            category: category.to_string(),
            value: serde_json::from_value(json!("#fff")).unwrap(),
            description: String::new(),
            deprecated: false,
            tags: Vec::new(),
        }
    }

    #[test]
    fn accepts_a_well_formed_draft() {
        assert!(validate(&draft("primary-color", "color.primary", "color")).is_ok());
    }

    #[test]
    fn rejects_missing_fields_and_unknown_category() {
        assert!(validate(&draft("", "color.primary", "color")).is_err());
        assert!(validate(&draft("primary-color", "  ", "color")).is_err());
        assert!(validate(&draft("primary-color", "color.primary", "gradient")).is_err());
    }

    #[test]
    fn rejects_overlong_name_and_description() {
        assert!(validate(&draft(&"x".repeat(101), "p", "color")).is_err());

        let mut d = draft("ok", "p", "color");
        d.description = "x".repeat(201);
        assert!(validate(&d).is_err());
    }

    #[test]
    fn drafts_deserialize_without_optional_fields() {
        let d: TokenDraft = serde_json::from_value(json!({
            "name": "spacing-sm",
            "path": "spacing.sm",
            "category": "spacing",
            "value": 8
        }))
        .unwrap();
        assert_eq!(d.description, "");
        assert!(!d.deprecated);
        assert!(d.tags.is_empty());
    }

    #[test]
    fn missing_value_fails_deserialization() {
        let result: Result<TokenDraft, _> = serde_json::from_value(json!({
            "name": "spacing-sm",
            "path": "spacing.sm",
            "category": "spacing"
        }));
        assert!(result.is_err());
    }
}

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::Token;
use crate::query::{FieldKind, Manifest};
use crate::tokens::import::TokenDraft;
use crate::tokens::value::TokenValue;

/// Tokens are tenant-scoped by their owning project.
pub const MANIFEST: Manifest = Manifest {
    table: "tokens",
    scope_column: "project_id",
    filterable: &[
        ("name", FieldKind::Text),
        ("path", FieldKind::Text),
        ("category", FieldKind::Text),
        ("deprecated", FieldKind::Bool),
        ("tags", FieldKind::TextArray),
        ("created_at", FieldKind::Timestamp),
        ("updated_at", FieldKind::Timestamp),
    ],
    searchable: &["name", "path", "description", "tags"],
    sortable: &["name", "path", "category", "created_at", "updated_at"],
};

pub async fn create(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
    draft: &TokenDraft,
) -> Result<Token, sqlx::Error> {
    sqlx::query_as::<_, Token>(
        "INSERT INTO tokens (project_id, user_id, name, path, category, value, description, deprecated, tags)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(&draft.name)
    .bind(&draft.path)
    .bind(&draft.category)
    .bind(Json(&draft.value))
    .bind(&draft.description)
    .bind(draft.deprecated)
    .bind(&draft.tags)
    .fetch_one(pool)
    .await
}

/// Scoped through the owning project: a token in another user's
/// project is indistinguishable from a missing one.
pub async fn find_by_id_scoped(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Token>, sqlx::Error> {
    sqlx::query_as::<_, Token>(
        "SELECT t.* FROM tokens t
         JOIN projects p ON t.project_id = p.id
         WHERE t.id = $1 AND p.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    name: Option<&str>,
    path: Option<&str>,
    category: Option<&str>,
    value: Option<&TokenValue>,
    description: Option<&str>,
    deprecated: Option<bool>,
    tags: Option<&[String]>,
) -> Result<Token, sqlx::Error> {
    sqlx::query_as::<_, Token>(
        "UPDATE tokens t SET
            name = COALESCE($3, t.name),
            path = COALESCE($4, t.path),
            category = COALESCE($5, t.category),
            value = COALESCE($6, t.value),
            description = COALESCE($7, t.description),
            deprecated = COALESCE($8, t.deprecated),
            tags = COALESCE($9, t.tags),
            updated_at = now()
         FROM projects p
         WHERE t.id = $1 AND t.project_id = p.id AND p.user_id = $2
         RETURNING t.*",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(path)
    .bind(category)
    .bind(value.map(Json))
    .bind(description)
    .bind(deprecated)
    .bind(tags)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM tokens t
         USING projects p
         WHERE t.id = $1 AND t.project_id = p.id AND p.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Full token set in storage order, for export bundling.
pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Token>, sqlx::Error> {
    sqlx::query_as::<_, Token>(
        "SELECT * FROM tokens WHERE project_id = $1 ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

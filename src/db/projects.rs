use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Project;
use crate::query::{FieldKind, Manifest};

/// Projects are tenant-scoped by their owning user.
pub const MANIFEST: Manifest = Manifest {
    table: "projects",
    scope_column: "user_id",
    filterable: &[
        ("name", FieldKind::Text),
        ("status", FieldKind::Text),
        ("tags", FieldKind::TextArray),
        ("created_at", FieldKind::Timestamp),
        ("updated_at", FieldKind::Timestamp),
    ],
    searchable: &["name", "description", "tags"],
    sortable: &["name", "status", "created_at", "updated_at"],
};

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    description: &str,
    status: &str,
    tags: &[String],
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (user_id, name, description, status, tags)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(status)
    .bind(tags)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    status: Option<&str>,
    tags: Option<&[String]>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            status = COALESCE($5, status),
            tags = COALESCE($6, tags),
            updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(status)
    .bind(tags)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

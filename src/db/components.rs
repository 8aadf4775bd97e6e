use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Component;
use crate::query::{FieldKind, Manifest};

/// Components are tenant-scoped by their owning project.
pub const MANIFEST: Manifest = Manifest {
    table: "components",
    scope_column: "project_id",
    filterable: &[
        ("name", FieldKind::Text),
        ("slug", FieldKind::Text),
        ("category", FieldKind::Text),
        ("status", FieldKind::Text),
        ("tags", FieldKind::TextArray),
        ("created_at", FieldKind::Timestamp),
        ("updated_at", FieldKind::Timestamp),
    ],
    searchable: &["name", "description", "tags"],
    sortable: &["name", "category", "status", "created_at", "updated_at"],
};

pub struct NewComponent<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub code_html: Option<&'a str>,
    pub code_css: Option<&'a str>,
    pub code_js: Option<&'a str>,
    pub used_tokens: &'a [Uuid],
    pub status: &'a str,
    pub tags: &'a [String],
    pub style_guide_id: Option<Uuid>,
}

pub async fn create(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
    new: &NewComponent<'_>,
) -> Result<Component, sqlx::Error> {
    sqlx::query_as::<_, Component>(
        "INSERT INTO components
            (project_id, user_id, style_guide_id, name, slug, description, category,
             code_html, code_css, code_js, used_tokens, status, tags)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING *",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(new.style_guide_id)
    .bind(new.name)
    .bind(new.slug)
    .bind(new.description)
    .bind(new.category)
    .bind(new.code_html)
    .bind(new.code_css)
    .bind(new.code_js)
    .bind(new.used_tokens)
    .bind(new.status)
    .bind(new.tags)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id_scoped(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Component>, sqlx::Error> {
    sqlx::query_as::<_, Component>(
        "SELECT c.* FROM components c
         JOIN projects p ON c.project_id = p.id
         WHERE c.id = $1 AND p.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub struct ComponentPatch<'a> {
    /// Name and slug always travel together; the slug is recomputed
    /// from the new name before this call.
    pub name_and_slug: Option<(&'a str, &'a str)>,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub code_html: Option<&'a str>,
    pub code_css: Option<&'a str>,
    pub code_js: Option<&'a str>,
    pub used_tokens: Option<&'a [Uuid]>,
    pub status: Option<&'a str>,
    pub tags: Option<&'a [String]>,
    pub style_guide_id: Option<Option<Uuid>>,
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    patch: &ComponentPatch<'_>,
) -> Result<Component, sqlx::Error> {
    let (name, slug) = match patch.name_and_slug {
        Some((name, slug)) => (Some(name), Some(slug)),
        None => (None, None),
    };
    sqlx::query_as::<_, Component>(
        "UPDATE components c SET
            name = COALESCE($3, c.name),
            slug = COALESCE($4, c.slug),
            description = COALESCE($5, c.description),
            category = COALESCE($6, c.category),
            code_html = COALESCE($7, c.code_html),
            code_css = COALESCE($8, c.code_css),
            code_js = COALESCE($9, c.code_js),
            used_tokens = COALESCE($10, c.used_tokens),
            status = COALESCE($11, c.status),
            tags = COALESCE($12, c.tags),
            style_guide_id = CASE WHEN $13 THEN $14 ELSE c.style_guide_id END,
            updated_at = now()
         FROM projects p
         WHERE c.id = $1 AND c.project_id = p.id AND p.user_id = $2
         RETURNING c.*",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(slug)
    .bind(patch.description)
    .bind(patch.category)
    .bind(patch.code_html)
    .bind(patch.code_css)
    .bind(patch.code_js)
    .bind(patch.used_tokens)
    .bind(patch.status)
    .bind(patch.tags)
    .bind(patch.style_guide_id.is_some())
    .bind(patch.style_guide_id.flatten())
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM components c
         USING projects p
         WHERE c.id = $1 AND c.project_id = p.id AND p.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_by_style_guide(
    pool: &PgPool,
    style_guide_id: Uuid,
) -> Result<Vec<Component>, sqlx::Error> {
    sqlx::query_as::<_, Component>(
        "SELECT * FROM components WHERE style_guide_id = $1 ORDER BY created_at DESC",
    )
    .bind(style_guide_id)
    .fetch_all(pool)
    .await
}

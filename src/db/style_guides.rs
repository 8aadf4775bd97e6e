use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{StyleGuide, TeamMember};
use crate::query::{FieldKind, Manifest};

/// Style guides are tenant-scoped by their owning user.
pub const MANIFEST: Manifest = Manifest {
    table: "style_guides",
    scope_column: "user_id",
    filterable: &[
        ("name", FieldKind::Text),
        ("slug", FieldKind::Text),
        ("version", FieldKind::Text),
        ("status", FieldKind::Text),
        ("visibility", FieldKind::Text),
        ("tags", FieldKind::TextArray),
        ("created_at", FieldKind::Timestamp),
        ("updated_at", FieldKind::Timestamp),
    ],
    searchable: &["name", "description", "tags"],
    sortable: &["name", "version", "status", "created_at", "updated_at"],
};

pub struct NewStyleGuide<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub version: &'a str,
    pub description: &'a str,
    pub project_id: Option<Uuid>,
    pub colors: &'a serde_json::Value,
    pub typography: &'a serde_json::Value,
    pub spacing: &'a serde_json::Value,
    pub status: &'a str,
    pub visibility: &'a str,
    pub tags: &'a [String],
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    new: &NewStyleGuide<'_>,
) -> Result<StyleGuide, sqlx::Error> {
    // The creator is always the first team member
    let team = Json(vec![TeamMember {
        user_id,
        role: "owner".to_string(),
    }]);
    sqlx::query_as::<_, StyleGuide>(
        "INSERT INTO style_guides
            (user_id, project_id, name, slug, version, description, colors, typography,
             spacing, status, visibility, team, tags)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING *",
    )
    .bind(user_id)
    .bind(new.project_id)
    .bind(new.name)
    .bind(new.slug)
    .bind(new.version)
    .bind(new.description)
    .bind(new.colors)
    .bind(new.typography)
    .bind(new.spacing)
    .bind(new.status)
    .bind(new.visibility)
    .bind(team)
    .bind(new.tags)
    .fetch_one(pool)
    .await
}

/// Unscoped fetch; visibility rules are applied by the caller so that
/// public and team guides stay readable across tenants.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<StyleGuide>, sqlx::Error> {
    sqlx::query_as::<_, StyleGuide>("SELECT * FROM style_guides WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub struct StyleGuidePatch<'a> {
    pub name_and_slug: Option<(&'a str, &'a str)>,
    pub version: Option<&'a str>,
    pub description: Option<&'a str>,
    pub project_id: Option<Option<Uuid>>,
    pub colors: Option<&'a serde_json::Value>,
    pub typography: Option<&'a serde_json::Value>,
    pub spacing: Option<&'a serde_json::Value>,
    pub status: Option<&'a str>,
    pub visibility: Option<&'a str>,
    pub tags: Option<&'a [String]>,
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    patch: &StyleGuidePatch<'_>,
) -> Result<StyleGuide, sqlx::Error> {
    let (name, slug) = match patch.name_and_slug {
        Some((name, slug)) => (Some(name), Some(slug)),
        None => (None, None),
    };
    sqlx::query_as::<_, StyleGuide>(
        "UPDATE style_guides SET
            name = COALESCE($3, name),
            slug = COALESCE($4, slug),
            version = COALESCE($5, version),
            description = COALESCE($6, description),
            project_id = CASE WHEN $7 THEN $8 ELSE project_id END,
            colors = COALESCE($9, colors),
            typography = COALESCE($10, typography),
            spacing = COALESCE($11, spacing),
            status = COALESCE($12, status),
            visibility = COALESCE($13, visibility),
            tags = COALESCE($14, tags),
            updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(slug)
    .bind(patch.version)
    .bind(patch.description)
    .bind(patch.project_id.is_some())
    .bind(patch.project_id.flatten())
    .bind(patch.colors)
    .bind(patch.typography)
    .bind(patch.spacing)
    .bind(patch.status)
    .bind(patch.visibility)
    .bind(patch.tags)
    .fetch_one(pool)
    .await
}

pub async fn update_team(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    team: &[TeamMember],
) -> Result<StyleGuide, sqlx::Error> {
    sqlx::query_as::<_, StyleGuide>(
        "UPDATE style_guides SET team = $3, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(Json(team))
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM style_guides WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

//! Grouped rollups for dashboards. Groups with zero members are
//! omitted; callers needing the full enum domain reconcile sparsity
//! themselves.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq, Eq)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ResourceCounts {
    pub tokens: i64,
    pub components: i64,
}

/// Derived token rollup for a style guide's linked project.
#[derive(Debug, Serialize)]
pub struct TokenSummary {
    pub total: i64,
    pub categories: Vec<CategoryCount>,
    pub last_import_at: Option<DateTime<Utc>>,
}

pub async fn token_category_counts(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCount>(
        "SELECT category, COUNT(*) AS count FROM tokens
         WHERE project_id = $1 GROUP BY category ORDER BY category",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn component_category_counts(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCount>(
        "SELECT category, COUNT(*) AS count FROM components
         WHERE project_id = $1 GROUP BY category ORDER BY category",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn component_status_counts(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM components
         WHERE project_id = $1 GROUP BY status ORDER BY status",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn resource_counts(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<ResourceCounts, sqlx::Error> {
    let row: (i64, i64) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM tokens WHERE project_id = $1),
            (SELECT COUNT(*) FROM components WHERE project_id = $1)",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await?;
    Ok(ResourceCounts {
        tokens: row.0,
        components: row.1,
    })
}

pub async fn token_summary(pool: &PgPool, project_id: Uuid) -> Result<TokenSummary, sqlx::Error> {
    let categories = token_category_counts(pool, project_id).await?;
    let total = categories.iter().map(|c| c.count).sum();
    let last_import_at: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MAX(created_at) FROM tokens WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;
    Ok(TokenSummary {
        total,
        categories,
        last_import_at,
    })
}

/// How a component's token references resolve against the project's
/// live token set. Dangling references count as missing rather than
/// erroring, since tokens may be deleted out from under a component.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub referenced: usize,
    pub live: usize,
    pub missing: usize,
    pub deprecated: usize,
}

pub async fn component_token_usage(
    pool: &PgPool,
    project_id: Uuid,
    used_tokens: &[Uuid],
) -> Result<TokenUsage, sqlx::Error> {
    if used_tokens.is_empty() {
        return Ok(resolve_token_usage(0, &[]));
    }
    let resolved: Vec<(Uuid, bool)> = sqlx::query_as(
        "SELECT id, deprecated FROM tokens WHERE project_id = $1 AND id = ANY($2)",
    )
    .bind(project_id)
    .bind(used_tokens)
    .fetch_all(pool)
    .await?;
    Ok(resolve_token_usage(used_tokens.len(), &resolved))
}

fn resolve_token_usage(referenced: usize, resolved: &[(Uuid, bool)]) -> TokenUsage {
    let live = resolved.len();
    TokenUsage {
        referenced,
        live,
        missing: referenced - live,
        deprecated: resolved.iter().filter(|(_, deprecated)| *deprecated).count(),
    }
}

/// Derived count of components referencing a style guide.
pub async fn style_guide_component_count(
    pool: &PgPool,
    style_guide_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM components WHERE style_guide_id = $1")
        .bind(style_guide_id)
        .fetch_one(pool)
        .await
}

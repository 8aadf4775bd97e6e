use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CATEGORIES: &[&str] = &[
    "button",
    "form",
    "navigation",
    "layout",
    "data-display",
    "feedback",
    "overlay",
    "typography",
    "other",
];

pub const STATUSES: &[&str] = &["draft", "review", "approved", "deprecated"];

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Component {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub style_guide_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub code_html: Option<String>,
    pub code_css: Option<String>,
    pub code_js: Option<String>,
    pub used_tokens: Vec<Uuid>,
    pub status: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

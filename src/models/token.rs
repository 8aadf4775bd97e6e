use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tokens::value::{TokenValue, css_variable};

pub const CATEGORIES: &[&str] = &[
    "color",
    "typography",
    "spacing",
    "effect",
    "grid",
    "shape",
    "other",
];

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub path: String,
    pub category: String,
    pub value: sqlx::types::Json<TokenValue>,
    pub description: String,
    pub deprecated: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Token {
    /// Render this token as a CSS custom-property declaration.
    pub fn to_css_variable(&self) -> String {
        css_variable(&self.category, &self.name, &self.value)
    }
}

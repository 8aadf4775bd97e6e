use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const STATUSES: &[&str] = &["draft", "published", "archived"];
pub const VISIBILITIES: &[&str] = &["private", "team", "public"];
pub const TEAM_ROLES: &[&str] = &["owner", "editor", "viewer"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub user_id: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct StyleGuide {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Optional link to the project whose tokens this guide summarizes.
    pub project_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub version: String,
    pub description: String,
    // Legacy structures kept for backward compatibility with old exports
    pub colors: serde_json::Value,
    pub typography: serde_json::Value,
    pub spacing: serde_json::Value,
    pub status: String,
    pub visibility: String,
    pub team: sqlx::types::Json<Vec<TeamMember>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StyleGuide {
    /// A guide is readable by its owner, by anyone when public, and by
    /// team members when team-visible.
    pub fn readable_by(&self, user_id: Uuid) -> bool {
        if self.user_id == user_id || self.visibility == "public" {
            return true;
        }
        self.visibility == "team" && self.team.iter().any(|m| m.user_id == user_id)
    }
}

pub mod auth;
pub mod components;
pub mod projects;
pub mod style_guides;
pub mod tokens;

use axum::Router;
use axum::routing::{get, post, put};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::SharedState;

/// Malformed ids are reported exactly like missing resources so that
/// probing requests cannot distinguish the two.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{what} not found")))
}

/// Deserializer for nullable patch fields: absent = leave alone,
/// explicit null = clear. Pair with `#[serde(default)]`.
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me).put(auth::update_me))
        .route("/api/v1/auth/password", put(auth::update_password))
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/api/v1/projects/{id}/stats", get(projects::stats))
        .route("/api/v1/projects/{id}/export/css", get(projects::export_css))
        .route("/api/v1/projects/{id}/export/json", get(projects::export_json))
        // Tokens
        .route(
            "/api/v1/projects/{id}/tokens",
            get(tokens::list).post(tokens::create),
        )
        .route("/api/v1/projects/{id}/tokens/import", post(tokens::import))
        .route(
            "/api/v1/tokens/{id}",
            get(tokens::get).put(tokens::update).delete(tokens::delete),
        )
        // Components
        .route(
            "/api/v1/projects/{id}/components",
            get(components::list).post(components::create),
        )
        .route(
            "/api/v1/components/{id}",
            get(components::get)
                .put(components::update)
                .delete(components::delete),
        )
        .route(
            "/api/v1/components/{id}/duplicate",
            post(components::duplicate),
        )
        .route(
            "/api/v1/components/{id}/analytics",
            get(components::analytics),
        )
        // Style guides
        .route(
            "/api/v1/styleguides",
            get(style_guides::list).post(style_guides::create),
        )
        .route(
            "/api/v1/styleguides/{id}",
            get(style_guides::get)
                .put(style_guides::update)
                .delete(style_guides::delete),
        )
        .route(
            "/api/v1/styleguides/{id}/components",
            get(style_guides::components),
        )
        .route("/api/v1/styleguides/{id}/team", post(style_guides::add_team_member))
}

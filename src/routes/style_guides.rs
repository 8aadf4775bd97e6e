use std::collections::HashMap;
use std::sync::LazyLock;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::style_guides::{NewStyleGuide, StyleGuidePatch};
use crate::error::{AppError, on_unique_violation};
use crate::models::style_guide::{STATUSES, TEAM_ROLES, VISIBILITIES};
use crate::models::{StyleGuide, TeamMember};
use crate::query;
use crate::routes::{double_option, parse_id};
use crate::slug::slugify;
use crate::state::SharedState;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid version pattern"));

#[derive(Deserialize)]
pub struct CreateStyleGuide {
    pub name: String,
    pub version: Option<String>,
    #[serde(default)]
    pub description: String,
    pub project_id: Option<Uuid>,
    pub colors: Option<serde_json::Value>,
    pub typography: Option<serde_json::Value>,
    pub spacing: Option<serde_json::Value>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateStyleGuide {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Double option: absent = leave alone, null = unlink.
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub project_id: Option<Option<Uuid>>,
    pub colors: Option<serde_json::Value>,
    pub typography: Option<serde_json::Value>,
    pub spacing: Option<serde_json::Value>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct AddTeamMember {
    pub user_id: Uuid,
    pub role: String,
}

fn validate_fields(
    name: Option<&str>,
    version: Option<&str>,
    status: Option<&str>,
    visibility: Option<&str>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        if name.trim().is_empty() || name.len() > 100 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 100 characters".to_string(),
            ));
        }
    }
    if let Some(version) = version {
        if !VERSION_RE.is_match(version) {
            return Err(AppError::BadRequest(
                "Version must use semantic versioning (e.g. 1.0.0)".to_string(),
            ));
        }
    }
    if let Some(status) = status {
        if !STATUSES.contains(&status) {
            return Err(AppError::BadRequest(format!("Invalid status '{status}'")));
        }
    }
    if let Some(visibility) = visibility {
        if !VISIBILITIES.contains(&visibility) {
            return Err(AppError::BadRequest(format!(
                "Invalid visibility '{visibility}'"
            )));
        }
    }
    Ok(())
}

/// Fetch a guide and apply the read-visibility rules; foreign private
/// guides are indistinguishable from missing ones.
async fn readable_guide(
    state: &SharedState,
    raw_id: &str,
    user_id: Uuid,
) -> Result<StyleGuide, AppError> {
    let id = parse_id(raw_id, "Style guide")?;
    let guide = db::style_guides::find_by_id(&state.pool, id)
        .await?
        .filter(|g| g.readable_by(user_id))
        .ok_or_else(|| AppError::NotFound("Style guide not found".to_string()))?;
    Ok(guide)
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let descriptor = query::translate(&params, &db::style_guides::MANIFEST);
    let page = query::execute::<StyleGuide>(
        &state.pool,
        &db::style_guides::MANIFEST,
        auth.user_id,
        &descriptor,
        state.config.max_page_size,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "count": page.count,
        "total": page.total,
        "pagination": page.pagination,
        "data": page.data,
    })))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateStyleGuide>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_editor()?;

    let version = req.version.as_deref().unwrap_or("1.0.0");
    validate_fields(
        Some(&req.name),
        Some(version),
        req.status.as_deref(),
        req.visibility.as_deref(),
    )?;

    // A linked project must belong to the caller
    if let Some(project_id) = req.project_id {
        db::projects::find_by_id(&state.pool, project_id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    }

    let name = req.name.trim();
    let guide = db::style_guides::create(
        &state.pool,
        auth.user_id,
        &NewStyleGuide {
            name,
            slug: &slugify(name),
            version,
            description: &req.description,
            project_id: req.project_id,
            colors: req.colors.as_ref().unwrap_or(&json!([])),
            typography: req.typography.as_ref().unwrap_or(&json!({})),
            spacing: req.spacing.as_ref().unwrap_or(&json!({})),
            status: req.status.as_deref().unwrap_or("draft"),
            visibility: req.visibility.as_deref().unwrap_or("private"),
            tags: &req.tags,
        },
    )
    .await
    .map_err(|e| on_unique_violation(e, "A style guide with this name already exists"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": guide })),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let guide = readable_guide(&state, &id, auth.user_id).await?;

    // Derived, never stored: component count and the token rollup of
    // the linked project
    let component_count = db::stats::style_guide_component_count(&state.pool, guide.id).await?;
    let token_summary = match guide.project_id {
        Some(project_id) => Some(db::stats::token_summary(&state.pool, project_id).await?),
        None => None,
    };

    Ok(Json(json!({
        "success": true,
        "data": {
            "style_guide": guide,
            "component_count": component_count,
            "token_summary": token_summary,
        },
    })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStyleGuide>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Style guide")?;

    validate_fields(
        req.name.as_deref(),
        req.version.as_deref(),
        req.status.as_deref(),
        req.visibility.as_deref(),
    )?;

    // A new link must point at the caller's own project; null unlinks
    if let Some(Some(project_id)) = req.project_id {
        db::projects::find_by_id(&state.pool, project_id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    }

    let name_and_slug = req
        .name
        .as_deref()
        .map(str::trim)
        .map(|name| (name.to_string(), slugify(name)));

    let guide = db::style_guides::update(
        &state.pool,
        id,
        auth.user_id,
        &StyleGuidePatch {
            name_and_slug: name_and_slug
                .as_ref()
                .map(|(name, slug)| (name.as_str(), slug.as_str())),
            version: req.version.as_deref(),
            description: req.description.as_deref(),
            project_id: req.project_id,
            colors: req.colors.as_ref(),
            typography: req.typography.as_ref(),
            spacing: req.spacing.as_ref(),
            status: req.status.as_deref(),
            visibility: req.visibility.as_deref(),
            tags: req.tags.as_deref(),
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Style guide not found".to_string()),
        _ => on_unique_violation(e, "A style guide with this name already exists"),
    })?;

    Ok(Json(json!({ "success": true, "data": guide })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;
    let id = parse_id(&id, "Style guide")?;

    let deleted = db::style_guides::delete(&state.pool, id, auth.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Style guide not found".to_string()));
    }
    Ok(Json(json!({ "success": true, "data": {} })))
}

pub async fn components(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let guide = readable_guide(&state, &id, auth.user_id).await?;

    let components = db::components::list_by_style_guide(&state.pool, guide.id).await?;
    Ok(Json(json!({
        "success": true,
        "count": components.len(),
        "data": components,
    })))
}

pub async fn add_team_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<AddTeamMember>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Style guide")?;

    if !TEAM_ROLES.contains(&req.role.as_str()) {
        return Err(AppError::BadRequest(format!("Invalid role '{}'", req.role)));
    }

    // Only the owner manages the team
    let guide = db::style_guides::find_by_id(&state.pool, id)
        .await?
        .filter(|g| g.user_id == auth.user_id)
        .ok_or_else(|| AppError::NotFound("Style guide not found".to_string()))?;

    db::users::find_by_id(&state.pool, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if guide.team.iter().any(|m| m.user_id == req.user_id) {
        return Err(AppError::Conflict(
            "User is already a team member".to_string(),
        ));
    }

    let mut team = guide.team.0.clone();
    team.push(TeamMember {
        user_id: req.user_id,
        role: req.role,
    });

    let guide = db::style_guides::update_team(&state.pool, id, auth.user_id, &team).await?;
    Ok(Json(json!({ "success": true, "data": guide })))
}

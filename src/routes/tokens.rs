use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::{AppError, on_unique_violation};
use crate::models::Token;
use crate::models::token::CATEGORIES;
use crate::query;
use crate::routes::parse_id;
use crate::state::SharedState;
use crate::tokens::import::{self, TokenDraft};
use crate::tokens::value::TokenValue;

#[derive(Deserialize)]
pub struct UpdateToken {
    pub name: Option<String>,
    pub path: Option<String>,
    pub category: Option<String>,
    pub value: Option<TokenValue>,
    pub description: Option<String>,
    pub deprecated: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ImportRequest {
    pub tokens: Vec<TokenDraft>,
}

async fn scoped_project(
    state: &SharedState,
    raw_id: &str,
    user_id: Uuid,
) -> Result<Uuid, AppError> {
    let id = parse_id(raw_id, "Project")?;
    db::projects::find_by_id(&state.pool, id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Ok(id)
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project_id = scoped_project(&state, &project_id, auth.user_id).await?;

    let descriptor = query::translate(&params, &db::tokens::MANIFEST);
    let page = query::execute::<Token>(
        &state.pool,
        &db::tokens::MANIFEST,
        project_id,
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
    Path(project_id): Path<String>,
    Json(draft): Json<TokenDraft>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_editor()?;
    let project_id = scoped_project(&state, &project_id, auth.user_id).await?;

    import::validate(&draft).map_err(AppError::BadRequest)?;

    let token = db::tokens::create(&state.pool, project_id, auth.user_id, &draft)
        .await
        .map_err(|e| {
            on_unique_violation(e, "A token with this name or path already exists in the project")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": token })),
    ))
}

pub async fn import(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Json(req): Json<ImportRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_editor()?;
    let project_id = scoped_project(&state, &project_id, auth.user_id).await?;

    if req.tokens.is_empty() {
        return Err(AppError::BadRequest("No tokens to import".to_string()));
    }

    let report = import::run(&state.pool, project_id, auth.user_id, req.tokens).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "count": report.created.len(),
            "data": report.created,
            "failed": report.failed,
        })),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_id(&id, "Token")?;
    let token = db::tokens::find_by_id_scoped(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Token not found".to_string()))?;
    Ok(Json(json!({ "success": true, "data": token })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateToken>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Token")?;

    if let Some(name) = &req.name {
        if name.trim().is_empty() || name.len() > import::MAX_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Name must be between 1 and {} characters",
                import::MAX_NAME_LEN
            )));
        }
    }
    if let Some(path) = &req.path {
        if path.trim().is_empty() {
            return Err(AppError::BadRequest("Path cannot be empty".to_string()));
        }
    }
    if let Some(category) = &req.category {
        if !CATEGORIES.contains(&category.as_str()) {
            return Err(AppError::BadRequest(format!("Invalid category '{category}'")));
        }
    }
    if let Some(description) = &req.description {
        if description.len() > import::MAX_DESCRIPTION_LEN {
            return Err(AppError::BadRequest(format!(
                "Description cannot be more than {} characters",
                import::MAX_DESCRIPTION_LEN
            )));
        }
    }

    let token = db::tokens::update(
        &state.pool,
        id,
        auth.user_id,
        req.name.as_deref(),
        req.path.as_deref(),
        req.category.as_deref(),
        req.value.as_ref(),
        req.description.as_deref(),
        req.deprecated,
        req.tags.as_deref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Token not found".to_string()),
        _ => on_unique_violation(
            e,
            "A token with this name or path already exists in the project",
        ),
    })?;

    Ok(Json(json!({ "success": true, "data": token })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Token")?;

    let deleted = db::tokens::delete(&state.pool, id, auth.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Token not found".to_string()));
    }
    Ok(Json(json!({ "success": true, "data": {} })))
}

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::{AppError, on_unique_violation};
use crate::models::Project;
use crate::models::project::STATUSES;
use crate::query;
use crate::routes::parse_id;
use crate::state::SharedState;
use crate::tokens::export;

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub include_deprecated: bool,
}

fn validate_status(status: &str) -> Result<(), AppError> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid status '{status}'")))
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let descriptor = query::translate(&params, &db::projects::MANIFEST);
    let page = query::execute::<Project>(
        &state.pool,
        &db::projects::MANIFEST,
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
    Json(req): Json<CreateProject>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_editor()?;

    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Project name is required".to_string()));
    }
    if req.name.len() > 100 {
        return Err(AppError::BadRequest(
            "Name cannot be more than 100 characters".to_string(),
        ));
    }
    if req.description.len() > 500 {
        return Err(AppError::BadRequest(
            "Description cannot be more than 500 characters".to_string(),
        ));
    }
    let status = req.status.as_deref().unwrap_or("draft");
    validate_status(status)?;

    let project = db::projects::create(
        &state.pool,
        auth.user_id,
        req.name.trim(),
        &req.description,
        status,
        &req.tags,
    )
    .await
    .map_err(|e| on_unique_violation(e, "A project with this name already exists"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": project })),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_id(&id, "Project")?;
    let project = db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Ok(Json(json!({ "success": true, "data": project })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Project")?;

    if let Some(name) = &req.name {
        if name.trim().is_empty() || name.len() > 100 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 100 characters".to_string(),
            ));
        }
    }
    if let Some(status) = &req.status {
        validate_status(status)?;
    }

    let project = db::projects::update(
        &state.pool,
        id,
        auth.user_id,
        req.name.as_deref().map(str::trim),
        req.description.as_deref(),
        req.status.as_deref(),
        req.tags.as_deref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Project not found".to_string()),
        _ => on_unique_violation(e, "A project with this name already exists"),
    })?;

    Ok(Json(json!({ "success": true, "data": project })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Project")?;

    // Tokens and components go with the project via FK cascade
    let deleted = db::projects::delete(&state.pool, id, auth.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Project not found".to_string()));
    }
    Ok(Json(json!({ "success": true, "data": {} })))
}

pub async fn stats(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_id(&id, "Project")?;
    let project = db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let counts = db::stats::resource_counts(&state.pool, id).await?;
    let token_categories = db::stats::token_category_counts(&state.pool, id).await?;
    let component_categories = db::stats::component_category_counts(&state.pool, id).await?;
    let component_statuses = db::stats::component_status_counts(&state.pool, id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "project": project,
            "counts": counts,
            "token_categories": token_categories,
            "component_categories": component_categories,
            "component_statuses": component_statuses,
        },
    })))
}

pub async fn export_css(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "Project")?;
    db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let tokens = db::tokens::list_by_project(&state.pool, id).await?;
    let css = export::css_bundle(&tokens, params.include_deprecated);

    Ok((
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"tokens.css\"",
            ),
        ],
        css,
    ))
}

pub async fn export_json(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "Project")?;
    let project = db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let tokens = db::tokens::list_by_project(&state.pool, id).await?;
    let bundle = export::json_bundle(&project, &tokens);

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"tokens.json\"",
        )],
        Json(bundle),
    ))
}

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::components::{ComponentPatch, NewComponent};
use crate::error::{AppError, on_unique_violation};
use crate::models::Component;
use crate::models::component::{CATEGORIES, STATUSES};
use crate::query;
use crate::routes::{double_option, parse_id};
use crate::slug::slugify;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateComponent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub code_html: Option<String>,
    pub code_css: Option<String>,
    pub code_js: Option<String>,
    #[serde(default)]
    pub used_tokens: Vec<Uuid>,
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub style_guide_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateComponent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub code_html: Option<String>,
    pub code_css: Option<String>,
    pub code_js: Option<String>,
    pub used_tokens: Option<Vec<Uuid>>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Double option: absent = leave alone, null = unlink.
    #[serde(default, deserialize_with = "double_option::deserialize")]
    pub style_guide_id: Option<Option<Uuid>>,
}

fn validate_fields(
    name: Option<&str>,
    description: Option<&str>,
    category: Option<&str>,
    status: Option<&str>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        if name.trim().is_empty() || name.len() > 50 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 50 characters".to_string(),
            ));
        }
    }
    if let Some(description) = description {
        if description.len() > 500 {
            return Err(AppError::BadRequest(
                "Description cannot be more than 500 characters".to_string(),
            ));
        }
    }
    if let Some(category) = category {
        if !CATEGORIES.contains(&category) {
            return Err(AppError::BadRequest(format!("Invalid category '{category}'")));
        }
    }
    if let Some(status) = status {
        if !STATUSES.contains(&status) {
            return Err(AppError::BadRequest(format!("Invalid status '{status}'")));
        }
    }
    Ok(())
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

    let descriptor = query::translate(&params, &db::components::MANIFEST);
    let page = query::execute::<Component>(
        &state.pool,
        &db::components::MANIFEST,
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
    Json(req): Json<CreateComponent>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_editor()?;
    let project_id = scoped_project(&state, &project_id, auth.user_id).await?;

    validate_fields(
        Some(&req.name),
        Some(&req.description),
        req.category.as_deref(),
        req.status.as_deref(),
    )?;

    let name = req.name.trim();
    let slug = slugify(name);
    let component = db::components::create(
        &state.pool,
        project_id,
        auth.user_id,
        &NewComponent {
            name,
            slug: &slug,
            description: &req.description,
            category: req.category.as_deref().unwrap_or("other"),
            code_html: req.code_html.as_deref(),
            code_css: req.code_css.as_deref(),
            code_js: req.code_js.as_deref(),
            used_tokens: &req.used_tokens,
            status: req.status.as_deref().unwrap_or("draft"),
            tags: &req.tags,
            style_guide_id: req.style_guide_id,
        },
    )
    .await
    .map_err(|e| on_unique_violation(e, "A component with this name already exists in the project"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": component })),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_id(&id, "Component")?;
    let component = db::components::find_by_id_scoped(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Component not found".to_string()))?;
    Ok(Json(json!({ "success": true, "data": component })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateComponent>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Component")?;

    validate_fields(
        req.name.as_deref(),
        req.description.as_deref(),
        req.category.as_deref(),
        req.status.as_deref(),
    )?;

    // The slug is a pure function of the name, recomputed on rename
    let name_and_slug = req
        .name
        .as_deref()
        .map(str::trim)
        .map(|name| (name.to_string(), slugify(name)));

    let component = db::components::update(
        &state.pool,
        id,
        auth.user_id,
        &ComponentPatch {
            name_and_slug: name_and_slug
                .as_ref()
                .map(|(name, slug)| (name.as_str(), slug.as_str())),
            description: req.description.as_deref(),
            category: req.category.as_deref(),
            code_html: req.code_html.as_deref(),
            code_css: req.code_css.as_deref(),
            code_js: req.code_js.as_deref(),
            used_tokens: req.used_tokens.as_deref(),
            status: req.status.as_deref(),
            tags: req.tags.as_deref(),
            style_guide_id: req.style_guide_id,
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Component not found".to_string()),
        _ => on_unique_violation(
            e,
            "A component with this name already exists in the project",
        ),
    })?;

    Ok(Json(json!({ "success": true, "data": component })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Component")?;

    let deleted = db::components::delete(&state.pool, id, auth.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Component not found".to_string()));
    }
    Ok(Json(json!({ "success": true, "data": {} })))
}

/// Clone a component within its project under a derived name. The copy
/// starts back in draft.
pub async fn duplicate(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_editor()?;
    let id = parse_id(&id, "Component")?;

    let source = db::components::find_by_id_scoped(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Component not found".to_string()))?;

    let name = format!("{} (copy)", source.name);
    if name.len() > 50 {
        return Err(AppError::BadRequest(
            "Component name is too long to duplicate".to_string(),
        ));
    }
    let slug = slugify(&name);

    let copy = db::components::create(
        &state.pool,
        source.project_id,
        auth.user_id,
        &NewComponent {
            name: &name,
            slug: &slug,
            description: &source.description,
            category: &source.category,
            code_html: source.code_html.as_deref(),
            code_css: source.code_css.as_deref(),
            code_js: source.code_js.as_deref(),
            used_tokens: &source.used_tokens,
            status: "draft",
            tags: &source.tags,
            style_guide_id: source.style_guide_id,
        },
    )
    .await
    .map_err(|e| on_unique_violation(e, "A copy of this component already exists"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": copy })),
    ))
}

/// Derived usage report: how the component's token references resolve
/// against the project's live token set. Computed at read time, never
/// stored.
pub async fn analytics(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_id(&id, "Component")?;
    let component = db::components::find_by_id_scoped(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Component not found".to_string()))?;

    let token_usage = db::stats::component_token_usage(
        &state.pool,
        component.project_id,
        &component.used_tokens,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "component": {
                "id": component.id,
                "name": component.name,
                "slug": component.slug,
                "category": component.category,
                "status": component.status,
                "created_at": component.created_at,
                "updated_at": component.updated_at,
            },
            "token_usage": token_usage,
        },
    })))
}

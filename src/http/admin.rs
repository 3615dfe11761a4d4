//! `/api/admin/*`: content management behind the admin key.

use super::{created, success, ApiError, ApiResult, AppState};
use crate::i18n::{
    validate_namespace, CacheStats, ComparisonResult, LocaleRegistry, MetricsReport,
};
use crate::models::{BlogPostRequest, FaqRequest, ProjectRequest};
use crate::store::Visibility;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

type Id = Result<Path<i64>, PathRejection>;

fn deleted(id: i64) -> impl IntoResponse {
    success(json!({ "id": id }))
}

// ==================== Contacts ====================

pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(success(state.store.list_contacts().await?))
}

pub async fn mark_contact_read(
    State(state): State<AppState>,
    id: Id,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let contact = state
        .store
        .mark_contact_read(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Contact not found"))?;
    Ok(success(contact))
}

pub async fn delete_contact(State(state): State<AppState>, id: Id) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    if !state.store.delete_contact(id).await? {
        return Err(ApiError::not_found("Contact not found"));
    }
    info!("Deleted contact {}", id);
    Ok(deleted(id))
}

// ==================== Advice ====================

/// Every entry, approved or not.
pub async fn list_advice(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(success(state.store.list_advice(Visibility::All).await?))
}

pub async fn approve_advice(
    State(state): State<AppState>,
    id: Id,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let advice = state
        .store
        .approve_advice(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Advice not found"))?;
    info!("Approved advice {}", id);
    Ok(success(advice))
}

pub async fn delete_advice(State(state): State<AppState>, id: Id) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    if !state.store.delete_advice(id).await? {
        return Err(ApiError::not_found("Advice not found"));
    }
    info!("Deleted advice {}", id);
    Ok(deleted(id))
}

// ==================== FAQ ====================

pub async fn create_faq(
    State(state): State<AppState>,
    payload: Result<Json<FaqRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let faq = request.validate_new().map_err(ApiError::validation)?;
    let faq = state.store.create_faq(faq).await?;
    info!("Created FAQ {}", faq.id);
    Ok(created(faq))
}

// ==================== Projects ====================

pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let project = request.validate_new().map_err(ApiError::validation)?;
    let project = state.store.create_project(project).await?;
    info!("Created project {} ({})", project.id, project.title);
    Ok(created(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    id: Id,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let patch = request.validate_patch().map_err(ApiError::validation)?;
    let project = state
        .store
        .update_project(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok(success(project))
}

pub async fn delete_project(State(state): State<AppState>, id: Id) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    if !state.store.delete_project(id).await? {
        return Err(ApiError::not_found("Project not found"));
    }
    info!("Deleted project {}", id);
    Ok(deleted(id))
}

// ==================== Blog ====================

/// Drafts included.
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(success(state.store.list_posts(Visibility::All).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<BlogPostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let post = request.validate_new().map_err(ApiError::validation)?;
    let post = state.store.create_post(post).await?;
    info!("Created post {} ({})", post.id, post.slug);
    Ok(created(post))
}

pub async fn update_post(
    State(state): State<AppState>,
    id: Id,
    payload: Result<Json<BlogPostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let patch = request.validate_patch().map_err(ApiError::validation)?;
    let post = state
        .store
        .update_post(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(success(post))
}

pub async fn delete_post(State(state): State<AppState>, id: Id) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    if !state.store.delete_post(id).await? {
        return Err(ApiError::not_found("Post not found"));
    }
    info!("Deleted post {}", id);
    Ok(deleted(id))
}

// ==================== Translations ====================

#[derive(Debug, Serialize)]
struct TranslationReport {
    is_valid: bool,
    reference_locale: &'static str,
    /// namespace -> locale -> comparison
    namespaces: BTreeMap<String, BTreeMap<String, ComparisonResult>>,
}

/// Compare every namespace of every locale against the default locale.
pub async fn validate_translations(
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let registry = LocaleRegistry::get();
    let reference_locale = registry.default_locale().code;
    let namespaces = state
        .locales
        .namespaces(reference_locale)
        .await
        .map_err(|e| ApiError::internal(&e))?;

    let mut report = TranslationReport {
        is_valid: true,
        reference_locale,
        namespaces: BTreeMap::new(),
    };
    for namespace in namespaces {
        let results = validate_namespace(&state.locales, registry, &namespace)
            .await
            .map_err(|e| ApiError::internal(&e))?;
        report.is_valid &= results.values().all(|result| result.is_valid);
        report.namespaces.insert(namespace, results);
    }

    Ok(success(report))
}

// ==================== Stats ====================

#[derive(Debug, Serialize)]
struct ContentStats {
    contacts: usize,
    unread_contacts: usize,
    advice: usize,
    pending_advice: usize,
    faqs: usize,
    projects: usize,
    posts: usize,
    published_posts: usize,
    visitors: i64,
}

#[derive(Debug, Serialize)]
struct Stats {
    content: ContentStats,
    translation_cache: CacheStats,
    translation_metrics: MetricsReport,
    uptime_secs: u64,
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let store = &state.store;
    let contacts = store.list_contacts().await?;
    let advice = store.list_advice(Visibility::All).await?;
    let posts = store.list_posts(Visibility::All).await?;

    let content = ContentStats {
        contacts: contacts.len(),
        unread_contacts: contacts.iter().filter(|c| !c.is_read).count(),
        advice: advice.len(),
        pending_advice: advice.iter().filter(|a| !a.is_approved).count(),
        faqs: store.list_faqs().await?.len(),
        projects: store.list_projects().await?.len(),
        posts: posts.len(),
        published_posts: posts.iter().filter(|p| p.published).count(),
        visitors: store.visitor_count().await?,
    };

    Ok(success(Stats {
        content,
        translation_cache: state.translations.stats(),
        translation_metrics: state.metrics.report(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    }))
}

//! `GET /locales/:locale/:namespace.json`: optimized translation files.
//!
//! Files are read from `LOCALES_DIR`, optimized once and kept in the shared
//! translation cache until their TTL runs out.

use super::{ApiError, ApiResult, AppState};
use crate::i18n::{optimize, Dictionary, LocaleRegistry, OptimizeOptions, TranslationSource};
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info};

pub async fn serve(
    State(state): State<AppState>,
    Path((locale, file)): Path<(String, String)>,
) -> ApiResult<Response> {
    let namespace = file
        .strip_suffix(".json")
        .ok_or_else(|| ApiError::not_found("Translation file not found"))?;
    if !LocaleRegistry::get().is_enabled(&locale) {
        return Err(ApiError::not_found(format!("Unknown locale '{}'", locale)));
    }

    let dictionary = load(&state, &locale, namespace).await?;

    let mut response = Json(dictionary).into_response();
    let max_age = format!(
        "public, max-age={}",
        state.config.translation_cache_ttl.as_secs()
    );
    if let Ok(value) = HeaderValue::from_str(&max_age) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    Ok(response)
}

async fn load(state: &AppState, locale: &str, namespace: &str) -> ApiResult<Dictionary> {
    if let Some(cached) = state.translations.get(locale, namespace) {
        state.metrics.record_cache_hit();
        return Ok(cached);
    }
    state.metrics.record_cache_miss();
    state.metrics.record_load();

    let raw = match state.locales.load(locale, namespace).await {
        Ok(raw) => raw,
        Err(e) => {
            state.metrics.record_load_failure();
            if e.is_not_found() {
                debug!("No translation file for {}/{}: {}", locale, namespace, e);
                return Err(ApiError::not_found("Translation file not found"));
            }
            return Err(ApiError::internal(&e));
        }
    };

    let result = optimize(&raw, &OptimizeOptions::default());
    info!(
        "Optimized {}/{}: {} -> {} bytes ({:.1}% saved)",
        locale,
        namespace,
        result.stats.original_size,
        result.stats.optimized_size,
        result.stats.percent_saved
    );

    state
        .translations
        .set(locale, result.optimized.clone(), namespace, None);
    Ok(result.optimized)
}

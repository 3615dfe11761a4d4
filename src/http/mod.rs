//! HTTP API: site content, admin panel and translation files.

mod admin;
mod advice;
mod blog;
mod contact;
mod error;
mod faq;
mod health;
mod locales;
mod projects;
mod visitors;

pub use error::{created, success, ApiError, ApiResult, Envelope};

use crate::config::Config;
use crate::i18n::{DirectorySource, TranslationCache, TranslationMetrics};
use crate::mailer::Mailer;
use crate::security::admin_key_matches;
use crate::store::Store;
use axum::extract::{Request, State};
use axum::http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub translations: Arc<TranslationCache>,
    pub locales: DirectorySource,
    pub metrics: &'static TranslationMetrics,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        let translations = Arc::new(TranslationCache::new(config.translation_cache_ttl));
        let locales = DirectorySource::new(&config.locales_dir);
        Self {
            config: Arc::new(config),
            store,
            mailer,
            translations,
            locales,
            metrics: TranslationMetrics::global(),
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, metrics: &'static TranslationMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Rejects requests whose `x-admin-key` does not match `ADMIN_KEY`.
async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if !admin_key_matches(state.config.admin_key.as_deref(), presented) {
        warn!(
            "Rejected admin request to {} {}",
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::unauthorized());
    }

    Ok(next.run(request).await)
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ADMIN_KEY_HEADER)]);

    match frontend_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            warn!("FRONTEND_URL is not a valid origin; allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

pub fn router(state: AppState) -> Router {
    let require_admin = middleware::from_fn_with_state(state.clone(), require_admin);

    let admin_routes = Router::new()
        .route("/contacts", get(admin::list_contacts))
        .route("/contacts/:id", delete(admin::delete_contact))
        .route("/contacts/:id/read", put(admin::mark_contact_read))
        .route("/advice", get(admin::list_advice))
        .route("/advice/:id", delete(admin::delete_advice))
        .route("/advice/:id/approve", put(admin::approve_advice))
        .route("/faqs", get(faq::list).post(admin::create_faq))
        .route("/faqs/:id", put(faq::update).delete(faq::remove))
        .route(
            "/projects",
            get(projects::list).post(admin::create_project),
        )
        .route(
            "/projects/:id",
            put(admin::update_project).delete(admin::delete_project),
        )
        .route("/posts", get(admin::list_posts).post(admin::create_post))
        .route(
            "/posts/:id",
            put(admin::update_post).delete(admin::delete_post),
        )
        .route("/translations/validate", get(admin::validate_translations))
        .route("/stats", get(admin::stats))
        .route_layer(require_admin.clone());

    let api_routes = Router::new()
        .route(
            "/contact",
            post(contact::create).merge(get(contact::list).route_layer(require_admin.clone())),
        )
        .route("/advice", get(advice::list).post(advice::create))
        .route("/faq", get(faq::list))
        .route(
            "/faq/:id",
            put(faq::update)
                .delete(faq::remove)
                .route_layer(require_admin),
        )
        .route("/projects", get(projects::list))
        .route("/blog", get(blog::list))
        .route("/blog/:slug", get(blog::show))
        .route("/visitors/count", get(visitors::count))
        .route("/visitors/increment", post(visitors::increment))
        .nest("/admin", admin_routes);

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http.request",
            method = %request.method(),
            route = %request.uri().path(),
        )
    });

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/locales/:locale/:file", get(locales::serve))
        .nest("/api", api_routes)
        .layer(cors_layer(state.config.frontend_url.as_deref()))
        .layer(trace_layer);

    if state.config.environment.is_development() {
        router = router.layer(middleware::from_fn(error::expose_error_details));
    }

    router.with_state(state)
}

//! HTTP surface: save events in, downloads and history out.
//!
//! Routes:
//!
//! - `GET  /download/{digest}` and legacy `GET /?d={digest}` - stored text as an attachment
//! - `POST /api/v1/content` - deliver an edit event
//! - `GET  /api/v1/history?p=` - one page of remote history
//! - `GET  /api/v1/status` - ledger status
//! - `GET|PUT /api/v1/settings` - credential presence and notification address

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use originstamp_client::{Mailer, TimestampApi};
use originstamp_core::{ContentDigest, EditEvent, Settings};
use originstamp_store::{Ledger, LedgerAdmin, LedgerStatus, SettingsStore};

use crate::config::resolve_settings;
use crate::error::{not_found_response, AppError};
use crate::gateway::{GatewayConfig, RemotePage};
use crate::services::Services;
use crate::stamper::SaveReport;

/// Everything the ledger must provide to back the server.
pub trait Backend: Ledger + SettingsStore + LedgerAdmin + 'static {}

impl<T> Backend for T where T: Ledger + SettingsStore + LedgerAdmin + 'static {}

/// Shared handler state.
///
/// Holds the current [`Services`] behind a lock so a settings update can swap
/// in a freshly built set without restarting.
pub struct AppState<L, A, M> {
    ledger: Arc<L>,
    api: Arc<A>,
    mailer: Arc<M>,
    gateway_config: GatewayConfig,
    services: Arc<RwLock<Arc<Services<L, A, M>>>>,
}

impl<L, A, M> Clone for AppState<L, A, M> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            api: Arc::clone(&self.api),
            mailer: Arc::clone(&self.mailer),
            gateway_config: self.gateway_config.clone(),
            services: Arc::clone(&self.services),
        }
    }
}

impl<L, A, M> AppState<L, A, M>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    pub fn new(
        settings: Settings,
        ledger: Arc<L>,
        api: Arc<A>,
        mailer: Arc<M>,
        gateway_config: GatewayConfig,
    ) -> Self {
        let services = Services::build(
            settings,
            Arc::clone(&ledger),
            Arc::clone(&api),
            Arc::clone(&mailer),
            gateway_config.clone(),
        );
        Self {
            ledger,
            api,
            mailer,
            gateway_config,
            services: Arc::new(RwLock::new(Arc::new(services))),
        }
    }

    /// The services built from the current settings.
    pub async fn services(&self) -> Arc<Services<L, A, M>> {
        Arc::clone(&*self.services.read().await)
    }

    /// Persist `settings` and rebuild the services from what is now in effect.
    pub async fn update_settings(&self, settings: &Settings) -> Result<Settings, AppError> {
        self.ledger.save_settings(settings).await?;
        let effective = resolve_settings(self.ledger.as_ref()).await?;

        let services = Services::build(
            effective.clone(),
            Arc::clone(&self.ledger),
            Arc::clone(&self.api),
            Arc::clone(&self.mailer),
            self.gateway_config.clone(),
        );
        *self.services.write().await = Arc::new(services);
        tracing::info!(
            api_key = effective.api_key().is_some(),
            email = effective.notify_email().is_some(),
            "Settings updated"
        );
        Ok(effective)
    }
}

/// Build the router with all routes and middleware.
pub fn build_router<L, A, M>(state: AppState<L, A, M>) -> Router
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    let api_routes = Router::new()
        .route("/content", post(save_content::<L, A, M>))
        .route("/history", get(history::<L, A, M>))
        .route("/status", get(status::<L, A, M>))
        .route(
            "/settings",
            get(get_settings::<L, A, M>).put(put_settings::<L, A, M>),
        );

    Router::new()
        .route("/", get(index::<L, A, M>))
        .route("/download/{digest}", get(download::<L, A, M>))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn serve<L, A, M>(
    listener: tokio::net::TcpListener,
    state: AppState<L, A, M>,
) -> std::io::Result<()>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Listening");
    }
    axum::serve(listener, build_router(state)).await
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    d: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    p: Option<String>,
}

/// Credential presence and notification address. The key itself is never
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsView {
    pub api_key_configured: bool,
    pub notify_email: Option<String>,
}

impl From<&Settings> for SettingsView {
    fn from(settings: &Settings) -> Self {
        Self {
            api_key_configured: settings.api_key().is_some(),
            notify_email: settings.notify_email().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub ledger: LedgerStatus,
    pub settings: SettingsView,
}

async fn index<L, A, M>(
    State(state): State<AppState<L, A, M>>,
    Query(query): Query<IndexQuery>,
) -> Result<Response, AppError>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    match query.d {
        Some(digest) => download_response(&state, &digest).await,
        None => Ok(Json(serde_json::json!({
            "service": "originstamp",
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response()),
    }
}

async fn download<L, A, M>(
    State(state): State<AppState<L, A, M>>,
    Path(digest): Path<String>,
) -> Result<Response, AppError>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    download_response(&state, &digest).await
}

async fn download_response<L, A, M>(
    state: &AppState<L, A, M>,
    raw: &str,
) -> Result<Response, AppError>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    // A malformed digest cannot be in the ledger.
    let Ok(digest) = raw.parse::<ContentDigest>() else {
        tracing::debug!(digest = raw, "Malformed digest requested");
        return Ok(not_found_response());
    };

    let services = state.services().await;
    let payload = services.gateway.fetch_local(&digest).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/x-msdownload".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}.txt", digest),
            ),
            (header::PRAGMA, "no-cache".to_string()),
            (header::EXPIRES, "0".to_string()),
        ],
        payload,
    )
        .into_response())
}

async fn save_content<L, A, M>(
    State(state): State<AppState<L, A, M>>,
    Json(event): Json<EditEvent>,
) -> Json<SaveReport>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    let services = state.services().await;
    Json(services.stamper.on_save(&event).await)
}

async fn history<L, A, M>(
    State(state): State<AppState<L, A, M>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<RemotePage>, AppError>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    // Anything that is not a positive integer means the first page.
    let page = query
        .p
        .and_then(|p| p.trim().parse::<u64>().ok())
        .unwrap_or(1);
    let services = state.services().await;
    Ok(Json(services.gateway.fetch_remote_page(page).await?))
}

async fn status<L, A, M>(
    State(state): State<AppState<L, A, M>>,
) -> Result<Json<StatusView>, AppError>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    let ledger = state.ledger.status().await?;
    let services = state.services().await;
    Ok(Json(StatusView {
        ledger,
        settings: SettingsView::from(&services.settings),
    }))
}

async fn get_settings<L, A, M>(State(state): State<AppState<L, A, M>>) -> Json<SettingsView>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    let services = state.services().await;
    Json(SettingsView::from(&services.settings))
}

async fn put_settings<L, A, M>(
    State(state): State<AppState<L, A, M>>,
    Json(update): Json<Settings>,
) -> Result<Json<SettingsView>, AppError>
where
    L: Backend,
    A: TimestampApi + 'static,
    M: Mailer + 'static,
{
    let settings = Settings::new(update.api_key, update.notify_email);
    let effective = state.update_settings(&settings).await?;
    Ok(Json(SettingsView::from(&effective)))
}

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::{
    domain::Track,
    error::{ApiError, ErrorCode},
    locale::Locale,
    protocol::{Dictionary, LocaleDictionaries},
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

mod api;
mod app_state;
mod catalog;
mod config;

use api::{list_tracks, locale_dictionaries, module_dictionary, ApiContext};
use app_state::AppState;
use catalog::Catalog;
use config::load_settings;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let catalog = Catalog::load(&settings.data_dir).map_err(|error| {
        error!(
            data_dir = %settings.data_dir.display(),
            error = %format!("{error:#}"),
            "failed to load catalog; verify the data directory layout"
        );
        error
    })?;
    info!(locales = ?catalog.supported_locales(), "serving locales");

    let state = AppState {
        api: ApiContext {
            catalog: Arc::new(catalog),
        },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/tracks", get(http_list_tracks))
        .route("/i18n", get(http_list_locales))
        .route("/i18n/:locale", get(http_locale_dictionaries))
        .route("/i18n/:locale/:module", get(http_module_dictionary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_tracks(State(state): State<Arc<AppState>>) -> Json<Vec<Track>> {
    Json(list_tracks(&state.api))
}

async fn http_list_locales(State(state): State<Arc<AppState>>) -> Json<Vec<Locale>> {
    Json(state.api.catalog.supported_locales())
}

async fn http_locale_dictionaries(
    State(state): State<Arc<AppState>>,
    Path(locale): Path<String>,
) -> ApiResult<LocaleDictionaries> {
    locale_dictionaries(&state.api, &locale)
        .map(Json)
        .map_err(error_response)
}

async fn http_module_dictionary(
    State(state): State<Arc<AppState>>,
    Path((locale, module)): Path<(String, String)>,
) -> ApiResult<Dictionary> {
    module_dictionary(&state.api, &locale, &module)
        .map(Json)
        .map_err(error_response)
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

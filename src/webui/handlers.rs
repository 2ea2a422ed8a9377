use axum::{
    extract::{OriginalUri, State},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, warn};

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::config::{self, AppConfig};
use crate::oidc;
use crate::render::{render_html, PageView, Statuses};
use crate::router::{dispatch, NavigationEvent, Route};

/// Every GET of the page is a page load: reload config, then route.
pub async fn page(State(state): State<Arc<AppState>>, OriginalUri(uri): OriginalUri) -> Response {
    let url = match state.origin.join(&uri.to_string()) {
        Ok(url) => url,
        Err(e) => {
            warn!(%uri, error = %e, "Unparseable request URI");
            state.origin.clone()
        }
    };
    let route = dispatch(&NavigationEvent::PageLoad { url: url.clone() });

    // The config may be served by this process, so fetch before locking.
    let loaded = if route.load_config {
        Some(config::load_config(&state.http, &state.config_source).await)
    } else {
        None
    };

    let mut store = state.store.lock().await;
    if let Some(loaded) = loaded {
        config::seed_loaded(&mut store, loaded, &state.config_source);
    }

    if route.route == Route::Callback {
        let query = url.query().unwrap_or_default();
        if let Err(e) = oidc::handle_callback(&state.http, &mut store, query).await {
            error!(error = %e, "Callback token exchange failed");
        }
        return Redirect::to("/").into_response();
    }

    let view = PageView::from_store(&store);
    drop(store);
    let statuses = *state.statuses.lock().await;
    Html(render_html(&view, &statuses)).into_response()
}

pub async fn login(State(state): State<Arc<AppState>>) -> Redirect {
    let mut store = state.store.lock().await;
    match oidc::start_login(&mut store) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(e) => {
            error!(error = %e, "Could not start login");
            Redirect::to("/")
        }
    }
}

pub async fn call_api(State(state): State<Arc<AppState>>) -> Redirect {
    let store = state.store.lock().await;
    match oidc::call_protected(&state.http, &store).await {
        Ok(status) => state.statuses.lock().await.api = Some(status.as_u16()),
        Err(e) => error!(error = %e, "Error calling protected API"),
    }
    Redirect::to("/")
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Redirect {
    let mut store = state.store.lock().await;
    match oidc::logout(&state.http, &mut store).await {
        Ok(status) => state.statuses.lock().await.logout = Some(status.as_u16()),
        Err(e) => error!(error = %e, "Error calling logout"),
    }
    Redirect::to("/")
}

pub async fn reset(State(state): State<Arc<AppState>>) -> ApiResult<Redirect> {
    let loaded = config::load_config(&state.http, &state.config_source).await;
    let mut store = state.store.lock().await;
    oidc::reset(&mut store, loaded, &state.config_source)?;
    drop(store);
    *state.statuses.lock().await = Statuses::default();
    Ok(Redirect::to("/"))
}

/// The stored config, in the shape of the config document.
pub async fn config_json(State(state): State<Arc<AppState>>) -> ApiResult<Json<AppConfig>> {
    let store = state.store.lock().await;
    AppConfig::from_store(&store)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No config loaded".to_string()))
}

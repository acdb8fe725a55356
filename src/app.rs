use crate::api::{AnimeApi, AnimeClient, SearchParams};
use crate::config::Config;
use crate::detail::{DetailFailure, DetailNavigator};
use crate::error::{RequestError, UserAction};
use crate::images::ImageUrls;
use crate::models::Title;
use crate::pages;
use crate::recommend::RecommendationView;
use crate::search::SearchView;
use crate::session::{SessionStore, MAX_SESSIONS};
use crate::timeline::BucketExpansion;
use crate::view::DisplayContext;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

const MAX_FORM_BYTES: usize = 16 * 1024;

/// A title page between requests: the header title, if one was asked for,
/// and the loaded seasons.
pub struct DetailSession {
    pub title: Option<Title>,
    pub nav: DetailNavigator,
}

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn AnimeApi>,
    pub display: Arc<DisplayContext>,
    pub page_size: u32,
    pub searches: Arc<SessionStore<SearchView>>,
    pub details: Arc<SessionStore<DetailSession>>,
}

impl AppState {
    pub fn new(api: Arc<dyn AnimeApi>, config: &Config) -> Self {
        Self {
            api,
            display: Arc::new(DisplayContext::new(
                ImageUrls::new(config.image_base_url.clone()),
                config.locale,
            )),
            page_size: config.page_size,
            searches: Arc::new(SessionStore::new(config.session_ttl, MAX_SESSIONS)),
            details: Arc::new(SessionStore::new(config.session_ttl, MAX_SESSIONS)),
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let client = AnimeClient::new(&config.api_url)?;
    info!("Using backend API at {}", client.base_url());
    let state = AppState::new(Arc::new(client), &config);

    let app = build_router(state);

    info!("Listening on {}", config.web_addr);
    let listener = tokio::net::TcpListener::bind(config.web_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(search))
        .route("/anime/:tmdb_id", get(detail))
        .route(
            "/anime/:tmdb_id/seasons/:season/episodes/:episode",
            get(episode),
        )
        .route("/recommend", get(recommend_form).post(recommend_submit))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES)),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    keyword: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
    rating: Option<String>,
    view: Option<String>,
    expanded: Option<String>,
    session: Option<u64>,
}

/// Searches only when the session is new or the search parameters changed.
/// Mode, rating and bucket changes re-render the stored page.
async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Html<String> {
    let params = SearchParams {
        keyword: query.keyword.filter(|k| !k.trim().is_empty()),
        start_date: query.start_date.filter(|d| !d.is_empty()),
        end_date: query.end_date.filter(|d| !d.is_empty()),
        page: query.page,
        size: Some(query.size.unwrap_or(state.page_size)),
    };
    let (session, stored) = resume(&state.searches, query.session).await;
    let stale = stored.as_ref().map_or(true, |v| v.params != params);
    let mut view = stored.unwrap_or_else(|| SearchView::new(state.display.locale));
    view.set_rating(parse_or_default(query.rating.as_deref(), "rating"));
    view.set_mode(parse_or_default(query.view.as_deref(), "view"));
    view.expansion = BucketExpansion::from_keys(split_list(query.expanded.as_deref()));

    if stale {
        view.params = params;
        let result = state.api.search(&view.params).await;
        view.apply(result);
    } else {
        debug!("Re-rendering search session {}", session);
    }

    let html = pages::search_page(&view, &state.display, session);
    state.searches.put(session, view).await;
    Html(html)
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    id: Option<i64>,
    season: Option<i32>,
    open: Option<String>,
    session: Option<u64>,
}

/// A known session only fetches when the season changes; opening and closing
/// episodes never reaches the backend.
async fn detail(
    State(state): State<AppState>,
    Path(tmdb_id): Path<i64>,
    Query(query): Query<DetailQuery>,
) -> (StatusCode, Html<String>) {
    let (session, stored) = resume(&state.details, query.session).await;
    let stored = stored.filter(|s| {
        s.nav.tmdb_id() == tmdb_id
            && query
                .id
                .map_or(true, |id| s.title.as_ref().is_some_and(|t| t.id == id))
    });

    let mut entry = match stored {
        Some(mut entry) => {
            if let Some(season) = query.season {
                entry.nav.select_season(season).await;
            }
            entry
        }
        None => {
            let mut nav =
                DetailNavigator::new(Arc::clone(&state.api), tmdb_id, state.display.locale);
            let title = match query.id {
                Some(id) => {
                    let (title, _) =
                        tokio::join!(state.api.fetch_title(id), nav.load_at(query.season));
                    match title {
                        Ok(t) => Some(t),
                        Err(e) => return failure(&state, &e, UserAction::Detail),
                    }
                }
                None => {
                    nav.load_at(query.season).await;
                    None
                }
            };
            DetailSession { title, nav }
        }
    };
    entry
        .nav
        .show_only(split_list(query.open.as_deref()).filter_map(|n| n.parse::<i32>().ok()));

    let status = match entry.nav.failure() {
        None => StatusCode::OK,
        Some(DetailFailure::NotFound | DetailFailure::NoSeasons) => StatusCode::NOT_FOUND,
        Some(DetailFailure::Upstream) => StatusCode::BAD_GATEWAY,
    };
    let html = pages::detail_page(
        entry.title.as_ref(),
        &entry.nav,
        &state.display,
        Some(session),
    );
    if status == StatusCode::OK {
        state.details.put(session, entry).await;
    }
    (status, Html(html))
}

/// Picks up the stored state for `id`, or issues a fresh session.
async fn resume<T>(store: &SessionStore<T>, id: Option<u64>) -> (u64, Option<T>) {
    if let Some(id) = id {
        if let Some(value) = store.take(id).await {
            return (id, Some(value));
        }
        debug!("Session {} unknown or expired, starting over", id);
    }
    (store.issue(), None)
}

async fn episode(
    State(state): State<AppState>,
    Path((tmdb_id, season, number)): Path<(i64, i32, i32)>,
) -> (StatusCode, Html<String>) {
    match state.api.fetch_episode(tmdb_id, season, number).await {
        Ok(episode) => (
            StatusCode::OK,
            Html(pages::episode_page(tmdb_id, season, &episode, &state.display)),
        ),
        Err(e) => failure(&state, &e, UserAction::Episode),
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendForm {
    #[serde(default)]
    query: String,
}

async fn recommend_form(State(state): State<AppState>) -> Html<String> {
    let view = RecommendationView::new(state.display.locale);
    Html(pages::recommend_page(&view, &state.display))
}

async fn recommend_submit(
    State(state): State<AppState>,
    Form(form): Form<RecommendForm>,
) -> Html<String> {
    let mut view = RecommendationView::new(state.display.locale);
    view.submit(state.api.as_ref(), &form.query).await;
    Html(pages::recommend_page(&view, &state.display))
}

fn failure(state: &AppState, e: &RequestError, action: UserAction) -> (StatusCode, Html<String>) {
    warn!("Request for {:?} page failed: {}", action, e);
    let status = if e.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::BAD_GATEWAY
    };
    let message = e.user_message(action, state.display.locale);
    (status, Html(pages::error_page(&state.display, &message)))
}

fn parse_or_default<T>(raw: Option<&str>, name: &str) -> T
where
    T: std::str::FromStr<Err = String> + Default,
{
    match raw.map(str::parse::<T>) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            warn!("Ignoring {} parameter: {}", name, e);
            T::default()
        }
        None => T::default(),
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}


use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hexboard_engine::{Action, Game, GameError, Journal, LoggedEvent, Settings};
use hexboard_protocol::{
    scene, ActionRequest, ActionResponse, DevCardsView, ErrorBody, StateSnapshot, CANVAS_HEIGHT,
    CANVAS_WIDTH,
};
use std::net::{IpAddr, Ipv4Addr};
use std::net::SocketAddr;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info, warn};

mod client;
pub mod config;
mod ws;

#[cfg(test)]
mod tests;

/// Snapshots buffered per live-feed subscriber before it starts skipping.
const UPDATE_BUFFER: usize = 64;

const DEFAULT_EVENT_LIMIT: usize = 50;
const MAX_EVENT_LIMIT: usize = 500;

/// The game plus the journal revision it corresponds to.
pub struct Table {
    pub game: Game,
    pub rev: i64,
}

pub struct AppState {
    pub table: Mutex<Table>,
    pub journal: Journal,
    pub updates: broadcast::Sender<Arc<StateSnapshot>>,
}

impl AppState {
    /// Resume the saved table from `journal`, or seat a new one.
    pub fn open(journal: Journal, settings: Settings, fresh: bool) -> anyhow::Result<Self> {
        let restored = if fresh { None } else { journal.load_game()? };
        let game = match restored {
            Some(game) => {
                info!(db = %journal.db_path().display(), "resuming saved table");
                game
            }
            None => {
                let game = Game::new(settings)?;
                journal.save_game(&game)?;
                game
            }
        };
        let rev = journal.rev()?;
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        Ok(Self {
            table: Mutex::new(Table { game, rev }),
            journal,
            updates,
        })
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        let table = self.table.lock().await;
        table.game.snapshot(table.rev)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StateSnapshot>> {
        self.updates.subscribe()
    }

    /// Apply one client action. Changes are journaled and pushed to every
    /// subscriber while the table is still locked, so pushes leave in `rev`
    /// order. The action runs on a copy of the game that only replaces the
    /// live table once the journal has it.
    pub async fn apply(&self, req: &ActionRequest) -> Result<ActionResponse, ApiError> {
        let action = Action::from_request(req)?;
        let mut table = self.table.lock().await;
        let mut next = table.game.clone();
        let applied = next.apply(&req.color, action)?;

        if applied.changed {
            let rev =
                self.journal
                    .commit(action.kind(), Some(&req.color), &applied.detail, &next)?;
            table.game = next;
            table.rev = rev;
        }
        let state = table.game.snapshot(table.rev);
        if applied.changed {
            // No subscribers is fine.
            let _ = self.updates.send(Arc::new(state.clone()));
        }
        drop(table);

        info!(
            color = %req.color,
            action = action.kind(),
            changed = applied.changed,
            rev = state.rev,
            "action applied"
        );
        Ok(ActionResponse {
            state,
            notice: applied.notice,
        })
    }
}

#[derive(Debug)]
pub enum ApiError {
    Game(GameError),
    /// The request body could not be read as an action.
    Malformed(String),
    Internal(anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::Malformed(e.body_text())
    }
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        Self::Game(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Game(e) => {
                let status = if e.is_conflict() {
                    StatusCode::CONFLICT
                } else {
                    StatusCode::BAD_REQUEST
                };
                warn!(error = %e, "action rejected");
                (status, e.to_string())
            }
            ApiError::Malformed(message) => {
                warn!(%message, "malformed request");
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Internal(e) => {
                error!(error = %format!("{e:#}"), "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub fn build_router(state: Arc<AppState>, open: bool) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/event", post(post_event))
        .route("/ws", get(ws::handle_ws))
        .route("/api/state", get(get_state))
        .route("/api/events", get(recent_events))
        .route("/api/board.svg", get(board_svg))
        .route("/api/players/{color}/dev-cards", get(dev_cards))
        .with_state(state);

    // Players join over the tailnet unless the table is explicitly opened up.
    let router = if open {
        router
    } else {
        router.layer(middleware::from_fn(ip_allowlist))
    };

    router.layer(
        ServiceBuilder::new()
            .layer(local_only_cors())
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CACHE_CONTROL,
                header::HeaderValue::from_static("no-store"),
            )),
    )
}

async fn health() -> &'static str {
    "ok"
}

async fn index() -> Html<&'static str> {
    Html(client::CLIENT_HTML)
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateSnapshot> {
    Json(state.snapshot().await)
}

async fn post_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(req) = payload?;
    state.apply(&req).await.map(Json)
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

/// Newest journal entries first.
async fn recent_events(
    State(state): State<Arc<AppState>>,
    Query(q): Query<EventsQuery>,
) -> Result<Json<Vec<LoggedEvent>>, ApiError> {
    let limit = q.limit.unwrap_or(DEFAULT_EVENT_LIMIT).min(MAX_EVENT_LIMIT);
    Ok(Json(state.journal.recent(limit)?))
}

async fn board_svg(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot().await;
    let svg = scene::to_svg(&scene::build(&snapshot), CANVAS_WIDTH, CANVAS_HEIGHT);
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}

async fn dev_cards(
    State(state): State<Arc<AppState>>,
    Path(color): Path<String>,
) -> Result<Json<DevCardsView>, ApiError> {
    let table = state.table.lock().await;
    let cards = table
        .game
        .dev_cards(&color)?
        .iter()
        .map(ToString::to_string)
        .collect();
    Ok(Json(DevCardsView { color, cards }))
}

pub struct ServerConfig {
    pub db_path: PathBuf,
    pub settings: Settings,
    /// Accept peers outside loopback and the tailnet.
    pub open: bool,
    /// Ignore any saved table and start over.
    pub fresh: bool,
}

pub async fn serve(addr: SocketAddr, config: ServerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::open(
        Journal::new(config.db_path),
        config.settings,
        config.fresh,
    )?);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, open = config.open, "hexboard listening");
    serve_listener(listener, state, config.open, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down");
    })
    .await?;
    Ok(())
}

pub async fn serve_listener(
    listener: tokio::net::TcpListener,
    state: Arc<AppState>,
    open: bool,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<SocketAddr> {
    let app = build_router(state, open);
    let addr = listener.local_addr()?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(addr)
}

async fn ip_allowlist(
    axum::extract::ConnectInfo(peer): axum::extract::ConnectInfo<SocketAddr>,
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    let ip = peer.ip();
    if is_allowed_peer_ip(ip) {
        return next.run(req).await;
    }
    warn!(%ip, "refused peer outside allowlist");
    let body = ErrorBody {
        error: "forbidden".to_string(),
    };
    (StatusCode::FORBIDDEN, Json(body)).into_response()
}

/// Tailscale hands out peer addresses from the CGNAT block 100.64.0.0/10.
const TAILNET: (Ipv4Addr, u32) = (Ipv4Addr::new(100, 64, 0, 0), 10);

/// Browser origins the client may be served from.
const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

fn in_tailnet(v4: Ipv4Addr) -> bool {
    let (base, prefix) = TAILNET;
    let mask = u32::MAX << (32 - prefix);
    u32::from(v4) & mask == u32::from(base)
}

fn is_allowed_peer_ip(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(v4) => v4.is_loopback() || in_tailnet(v4),
        IpAddr::V6(v6) => v6.is_loopback(),
    }
}

fn local_only_cors() -> CorsLayer {
    use axum::http::HeaderValue;
    use axum::http::Method;

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _req| {
            is_allowed_local_origin(origin)
        }))
}

fn is_allowed_local_origin(origin: &axum::http::HeaderValue) -> bool {
    let Some(uri) = origin
        .to_str()
        .ok()
        .and_then(|s| s.parse::<axum::http::Uri>().ok())
    else {
        return false;
    };
    // An origin is scheme://host[:port] and nothing else.
    let bare = uri.authority().is_some_and(|a| !a.as_str().contains('@'))
        && uri.path_and_query().map_or(true, |pq| pq.as_str() == "/");
    matches!(uri.scheme_str(), Some("http" | "https"))
        && bare
        && uri.host().is_some_and(|host| LOCAL_HOSTS.contains(&host))
}

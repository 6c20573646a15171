use super::*;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{HeaderValue, Request};
use futures::StreamExt;
use hexboard_protocol::Push;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast::error::TryRecvError;
use tower::ServiceExt;

fn temp_db(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "hexboard-server-{name}-{}.db",
        time::OffsetDateTime::now_utc().unix_timestamp_nanos()
    ))
}

fn seeded_settings() -> Settings {
    Settings {
        seed: Some(17),
        ..Settings::default()
    }
}

fn temp_state(name: &str) -> Arc<AppState> {
    Arc::new(AppState::open(Journal::new(temp_db(name)), seeded_settings(), false).unwrap())
}

fn event(action: &str, color: &str, x: Option<f64>, y: Option<f64>) -> Request<Body> {
    let body = serde_json::to_vec(&ActionRequest {
        action: action.to_string(),
        color: color.to_string(),
        x,
        y,
    })
    .unwrap();
    Request::post("/event")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body<T: DeserializeOwned>(resp: Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let app = build_router(temp_state("health"), true);
    let resp = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
}

#[tokio::test]
async fn index_serves_the_client() {
    let app = build_router(temp_state("index"), true);
    let resp = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<canvas id=\"canvas\""));
    assert!(html.contains("state_update"));
}

#[tokio::test]
async fn state_endpoint_returns_full_snapshot() {
    let app = build_router(temp_state("state"), true);
    let resp = send(&app, Request::get("/api/state").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let snapshot: StateSnapshot = json_body(resp).await;
    assert_eq!(snapshot.hexagons.len(), 19);
    assert_eq!(snapshot.vertices.len(), 54);
    assert_eq!(snapshot.lines.len(), 72);
    assert_eq!(snapshot.players.len(), 4);
    assert_eq!(snapshot.dice, [0, 0]);
}

#[tokio::test]
async fn roll_is_journaled_and_pushed() {
    let state = temp_state("roll");
    let mut updates = state.subscribe();
    let app = build_router(state.clone(), true);

    let resp = send(&app, event("roll", "cyan", None, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let reply: ActionResponse = json_body(resp).await;
    assert!(reply.state.dice.iter().all(|d| (1..=6).contains(d)));
    assert!(reply.notice.is_none());

    let pushed = updates.try_recv().expect("roll is broadcast");
    assert_eq!(pushed.rev, reply.state.rev);
    assert_eq!(pushed.dice, reply.state.dice);
    assert_eq!(state.journal.rev().unwrap(), reply.state.rev);
}

#[tokio::test]
async fn click_on_empty_canvas_is_not_pushed() {
    let state = temp_state("miss");
    let mut updates = state.subscribe();
    let app = build_router(state.clone(), true);
    let before = state.snapshot().await.rev;

    let resp = send(&app, event("click", "cyan", Some(1.0), Some(1.0))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let reply: ActionResponse = json_body(resp).await;
    assert_eq!(reply.state.rev, before);
    assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn clicking_a_vertex_colors_it() {
    let state = temp_state("vertex");
    let app = build_router(state.clone(), true);
    let v = state.snapshot().await.vertices[10].clone();

    let reply: ActionResponse =
        json_body(send(&app, event("click", "magenta", Some(v.x), Some(v.y))).await).await;
    assert_eq!(reply.state.vertices[10].color, "magenta");
    assert!(reply.state.rev > 0);
}

#[tokio::test]
async fn bad_requests_are_400() {
    let app = build_router(temp_state("bad"), true);

    let resp = send(&app, event("teleport", "cyan", None, None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = json_body(resp).await;
    assert_eq!(body.error, "unknown action: teleport");

    let resp = send(&app, event("roll", "orange", None, None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, event("click", "cyan", None, None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn state_conflicts_are_409() {
    let app = build_router(temp_state("conflict"), true);
    let resp = send(&app, event("remove_wood", "cyan", None, None)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(&app, event("undo_card", "cyan", None, None)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_body_gets_an_error_body() {
    let app = build_router(temp_state("malformed"), true);
    let req = Request::post("/event")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"action\": \"roll\""))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = json_body(resp).await;
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn failed_commit_leaves_the_table_untouched() {
    let db = temp_db("commit-fails");
    let state = Arc::new(AppState::open(Journal::new(&db), seeded_settings(), false).unwrap());
    let mut updates = state.subscribe();
    let app = build_router(state.clone(), true);
    let before = state.snapshot().await;

    // A directory where the database file was makes every open fail.
    for suffix in ["", "-wal", "-shm"] {
        let mut path = db.clone().into_os_string();
        path.push(suffix);
        let _ = std::fs::remove_file(&path);
    }
    std::fs::create_dir_all(&db).unwrap();

    let resp = send(&app, event("add_ore", "cyan", None, None)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let after = state.snapshot().await;
    assert_eq!(after, before);
    assert_eq!(after.players["cyan"].resources["ore"], 0);
    assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn events_endpoint_lists_newest_first() {
    let app = build_router(temp_state("events"), true);
    send(&app, event("roll", "cyan", None, None)).await;
    send(&app, event("add_brick", "blue", None, None)).await;

    let resp = send(&app, Request::get("/api/events").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let events: Vec<serde_json::Value> = json_body(resp).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["kind"], "add_resource");
    assert_eq!(events[0]["color"], "blue");
    assert_eq!(events[0]["payload"]["resource"], "brick");
    assert_eq!(events[1]["kind"], "roll");

    let resp = send(
        &app,
        Request::get("/api/events?limit=1").body(Body::empty()).unwrap(),
    )
    .await;
    let events: Vec<serde_json::Value> = json_body(resp).await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn drawn_card_is_private_to_the_drawer() {
    let state = temp_state("draw");
    let mut updates = state.subscribe();
    let app = build_router(state.clone(), true);

    let reply: ActionResponse =
        json_body(send(&app, event("draw_card", "purple", None, None)).await).await;
    let notice = reply.notice.expect("drawer sees the card");
    assert_eq!(reply.state.players["purple"].dev_cards, 1);

    // The broadcast copy carries the count only.
    let pushed = updates.try_recv().unwrap();
    let pushed_json = serde_json::to_value(&*pushed).unwrap();
    assert!(pushed_json.get("notice").is_none());

    let resp = send(
        &app,
        Request::get("/api/players/purple/dev-cards")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let view: DevCardsView = json_body(resp).await;
    assert_eq!(view.cards, vec![notice.card]);

    let resp = send(
        &app,
        Request::get("/api/players/orange/dev-cards")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resources_show_up_in_the_tally() {
    let app = build_router(temp_state("tally"), true);
    send(&app, event("add_wheat", "blue", None, None)).await;
    let reply: ActionResponse =
        json_body(send(&app, event("add_wheat", "blue", None, None)).await).await;
    let blue = &reply.state.players["blue"];
    assert_eq!(blue.resources["wheat"], 2);
    assert_eq!(blue.num_cards, 2);
}

#[tokio::test]
async fn board_svg_renders_the_scene() {
    let app = build_router(temp_state("svg"), true);
    let resp = send(&app, Request::get("/api/board.svg").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/svg+xml"
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let svg = String::from_utf8(bytes.to_vec()).unwrap();
    // 19 tiles + 72 roads.
    assert_eq!(svg.matches("<polygon").count(), 19 + 72);
    // 18 number tokens + 54 settlement slots.
    assert_eq!(svg.matches("<circle").count(), 18 + 54);
}

#[tokio::test]
async fn restart_resumes_the_saved_table() {
    let db = temp_db("resume");
    let state = Arc::new(AppState::open(Journal::new(&db), seeded_settings(), false).unwrap());
    let app = build_router(state.clone(), true);
    send(&app, event("add_ore", "cyan", None, None)).await;
    let before = state.snapshot().await;

    let resumed = AppState::open(Journal::new(&db), Settings::default(), false).unwrap();
    let after = resumed.snapshot().await;
    assert_eq!(after, before);
    assert_eq!(after.players["cyan"].resources["ore"], 1);

    let fresh = AppState::open(Journal::new(&db), Settings::default(), true).unwrap();
    assert_eq!(fresh.snapshot().await.players["cyan"].resources["ore"], 0);
}

#[tokio::test]
async fn allowlist_refuses_strangers() {
    let state = temp_state("allow");
    let stranger = build_router(state.clone(), false)
        .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 7], 5000))));
    let resp = send(&stranger, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: ErrorBody = json_body(resp).await;
    assert_eq!(body.error, "forbidden");

    let tailnet = build_router(state.clone(), false)
        .layer(MockConnectInfo(SocketAddr::from(([100, 101, 2, 3], 5000))));
    let resp = send(&tailnet, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let open = build_router(state, true)
        .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 7], 5000))));
    let resp = send(&open, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn peer_ip_ranges() {
    assert!(is_allowed_peer_ip("127.0.0.1".parse().unwrap()));
    assert!(is_allowed_peer_ip("::1".parse().unwrap()));
    assert!(is_allowed_peer_ip("100.64.0.1".parse().unwrap()));
    assert!(is_allowed_peer_ip("100.127.255.255".parse().unwrap()));
    assert!(!is_allowed_peer_ip("100.128.0.1".parse().unwrap()));
    assert!(!is_allowed_peer_ip("192.168.1.4".parse().unwrap()));
    assert!(is_allowed_peer_ip("::ffff:100.100.1.1".parse().unwrap()));
    assert!(is_allowed_peer_ip("::ffff:127.0.0.1".parse().unwrap()));
    assert!(!is_allowed_peer_ip("::ffff:100.63.0.1".parse().unwrap()));
    assert!(!is_allowed_peer_ip("fd7a:115c:a1e0::1".parse().unwrap()));
}

#[test]
fn local_origins_only() {
    let ok = |s: &str| is_allowed_local_origin(&HeaderValue::from_str(s).unwrap());
    assert!(ok("http://localhost"));
    assert!(ok("http://localhost:39333"));
    assert!(ok("https://127.0.0.1:8080"));
    assert!(!ok("http://localhost.evil.com"));
    assert!(!ok("https://example.com"));
    assert!(!ok("ftp://localhost"));
    assert!(!ok("http://localhost/admin"));
    assert!(!ok("null"));
}

#[tokio::test]
async fn websocket_gets_snapshot_then_updates() {
    let state = temp_state("ws");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_listener(listener, state.clone(), false, async move {
        let _ = stop_rx.await;
    }));

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    let first = socket.next().await.unwrap().unwrap();
    let push: Push = serde_json::from_str(first.to_text().unwrap()).unwrap();
    assert_eq!(push.event, "state_update");
    assert_eq!(push.payload.hexagons.len(), 19);

    let reply = state
        .apply(&ActionRequest {
            action: "roll".into(),
            color: "cyan".into(),
            x: None,
            y: None,
        })
        .await
        .unwrap();

    let next = socket.next().await.unwrap().unwrap();
    let push: Push = serde_json::from_str(next.to_text().unwrap()).unwrap();
    assert_eq!(push.payload.rev, reply.state.rev);
    assert_eq!(push.payload.dice, reply.state.dice);

    drop(socket);
    let _ = stop_tx.send(());
    let _ = server.await;
}

//! End-to-end: mocked upstream -> poller -> WebSocket client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cryptodash::api::{self, ApiState};
use cryptodash::cache::SnapshotCache;
use cryptodash::config::{Provider, SourceConfig, TrackedAsset};
use cryptodash::hub::BroadcastHub;
use cryptodash::poll::Poller;
use cryptodash::source::build_source;
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestStack {
    poller: Poller,
    addr: SocketAddr,
}

async fn start_stack(upstream: &MockServer) -> TestStack {
    let cfg = SourceConfig {
        provider: Provider::Coingecko,
        endpoint: format!("{}/simple/price", upstream.uri()),
        request_timeout_secs: 2,
        assets: [("bitcoin", "BTCUSDT"), ("ethereum", "ETHUSDT"), ("solana", "SOLUSDT")]
            .into_iter()
            .map(|(id, symbol)| TrackedAsset {
                id: id.to_string(),
                symbol: symbol.to_string(),
            })
            .collect(),
    };

    let cache = Arc::new(SnapshotCache::new());
    let hub = Arc::new(BroadcastHub::new(Arc::clone(&cache)));
    let poller = Poller::new(
        build_source(&cfg).unwrap(),
        Arc::clone(&cache),
        Arc::clone(&hub),
        Duration::from_secs(10),
    );

    let state = Arc::new(ApiState { hub });
    let router = api::create_router(state, &["*".to_string()]).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestStack { poller, addr }
}

async fn mount_prices(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bitcoin": {"usd": 50000.0, "usd_24h_change": 2.1},
            "ethereum": {"usd": 3000.0, "usd_24h_change": -1.5},
            "solana": {"usd": 100.0, "usd_24h_change": 0.0},
        })))
        .mount(server)
        .await;
}

async fn next_frame(
    read: &mut (impl futures::Stream<
        Item = Result<
            tokio_tungstenite::tungstenite::Message,
            tokio_tungstenite::tungstenite::Error,
        >,
    > + Unpin),
) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(3), read.next())
        .await
        .expect("timed out waiting for frame")
        .expect("stream ended")
        .expect("websocket error");
    serde_json::from_str(msg.to_text().expect("text frame")).expect("json frame")
}

#[tokio::test]
async fn late_joiner_receives_the_cached_snapshot_immediately() {
    let upstream = MockServer::start().await;
    mount_prices(&upstream).await;
    let stack = start_stack(&upstream).await;

    // populate the cache before anyone connects
    stack.poller.run_cycle().await;

    let (ws, _) = connect_async(format!("ws://{}/ws", stack.addr))
        .await
        .expect("connect");
    let (_write, mut read) = ws.split();

    let frame = next_frame(&mut read).await;
    assert_eq!(frame["event"], "crypto-update");
    assert_eq!(frame["data"]["bitcoin"]["usd"], json!(50000.0));
    assert_eq!(frame["data"]["ethereum"]["usd_24h_change"], json!(-1.5));
    assert_eq!(frame["data"]["solana"]["usd"], json!(100.0));
}

#[tokio::test]
async fn client_with_empty_cache_waits_for_the_first_successful_poll() {
    let upstream = MockServer::start().await;
    mount_prices(&upstream).await;
    let stack = start_stack(&upstream).await;

    // connect before any poll cycle has run
    let (ws, _) = connect_async(format!("ws://{}/ws", stack.addr))
        .await
        .expect("connect");
    let (_write, mut read) = ws.split();

    // nothing arrives while the cache is empty
    let nothing = tokio::time::timeout(Duration::from_millis(300), read.next()).await;
    assert!(nothing.is_err());

    stack.poller.run_cycle().await;

    let frame = next_frame(&mut read).await;
    assert_eq!(frame["event"], "crypto-update");
    assert_eq!(frame["data"]["bitcoin"]["usd"], json!(50000.0));
}

#[tokio::test]
async fn every_poll_cycle_reaches_a_connected_client_in_order() {
    let upstream = MockServer::start().await;
    mount_prices(&upstream).await;
    let stack = start_stack(&upstream).await;

    stack.poller.run_cycle().await;

    let (ws, _) = connect_async(format!("ws://{}/ws", stack.addr))
        .await
        .expect("connect");
    let (_write, mut read) = ws.split();

    // catch-up frame, then one frame per cycle
    let _catch_up = next_frame(&mut read).await;
    stack.poller.run_cycle().await;
    stack.poller.run_cycle().await;

    let first = next_frame(&mut read).await;
    let second = next_frame(&mut read).await;
    assert_eq!(first["event"], "crypto-update");
    assert_eq!(second["event"], "crypto-update");
}

#[tokio::test]
async fn health_endpoint_responds() {
    let upstream = MockServer::start().await;
    let stack = start_stack(&upstream).await;

    let body = reqwest::get(format!("http://{}/health", stack.addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "OK");
}

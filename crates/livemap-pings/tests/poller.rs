//! Integration tests for `TelegramClient` and `PingPoller` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use livemap_pings::{DisplayMode, PingError, PingLayer, PingPoller, TelegramClient};
use tokio::sync::{watch, RwLock};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:test";

fn client(server: &MockServer) -> TelegramClient {
    TelegramClient::with_base_url(TOKEN, 1, &server.uri())
        .expect("client construction should not fail")
}

fn poller(server: &MockServer, max_retries: u32) -> (PingPoller, Arc<RwLock<PingLayer>>) {
    let layer = Arc::new(RwLock::new(PingLayer::new()));
    let poller = PingPoller::new(client(server), Arc::clone(&layer), 1, max_retries)
        .with_backoff_base_ms(0);
    (poller, layer)
}

fn updates(items: &[(i64, &str)]) -> serde_json::Value {
    let result: Vec<_> = items
        .iter()
        .map(|(id, text)| serde_json::json!({ "update_id": id, "message": { "text": text } }))
        .collect();
    serde_json::json!({ "ok": true, "result": result })
}

#[tokio::test]
async fn get_updates_sends_offset_and_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(query_param("offset", "5"))
        .and(query_param("timeout", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(updates(&[(5, "hi")])))
        .expect(1)
        .mount(&server)
        .await;

    let got = client(&server).get_updates(5, 1).await.expect("updates");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].text(), Some("hi"));
}

#[tokio::test]
async fn api_failure_surfaces_description() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let err = client(&server).get_updates(0, 1).await.unwrap_err();
    match err {
        PingError::Api {
            error_code,
            description,
        } => {
            assert_eq!(error_code, Some(401));
            assert_eq!(description, "Unauthorized");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn poll_once_advances_offset_past_every_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(updates(&[
            (10, "at https://www.waze.com/ul?ll=-31.95,115.86"),
            (11, "no link here"),
        ])))
        .mount(&server)
        .await;

    let (mut poller, layer) = poller(&server, 3);
    let added = poller.poll_once().await.expect("poll");

    assert_eq!(added, 1);
    assert_eq!(poller.offset(), 12);
    let layer = layer.read().await;
    assert_eq!(layer.len(), 1);
    assert_eq!(layer.mode(), DisplayMode::Markers);
}

#[tokio::test]
async fn run_stops_when_signalled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(updates(&[]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let (mut poller, _layer) = poller(&server, 3);
    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { poller.run(stop_rx).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(true).expect("poller is listening");

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("poller should stop promptly")
        .expect("task should not panic");
    assert!(result.is_ok());
}

#[tokio::test]
async fn run_gives_up_after_consecutive_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(3)
        .mount(&server)
        .await;

    let (mut poller, _layer) = poller(&server, 3);
    let (_stop_tx, stop_rx) = watch::channel(false);
    let err = tokio::time::timeout(Duration::from_secs(5), poller.run(stop_rx))
        .await
        .expect("poller should give up promptly")
        .unwrap_err();

    match err {
        PingError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, PingError::Deserialize { .. }));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(poller.offset(), 0);
}

//! A real socket: tiny_http accept thread, runtime handoff, headers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::sample_retriever;
use shortlist::server::{AppContext, HttpServer, MAX_BODY_BYTES};
use shortlist::testing::SlowProvider;
use shortlist::Synthesizer;

struct Running {
    base: String,
    shutdown: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

impl Running {
    async fn stop(self) {
        self.shutdown.cancel();
        self.task.await.unwrap().unwrap();
    }
}

fn start() -> Running {
    start_with(Synthesizer::unconfigured())
}

fn start_with(synthesizer: Synthesizer) -> Running {
    let server = HttpServer::bind("127.0.0.1:0").unwrap();
    let addr: SocketAddr = server.local_addr().unwrap();
    let ctx = Arc::new(AppContext::new(sample_retriever(), synthesizer));

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(server.run(ctx, shutdown.clone()));
    Running {
        base: format!("http://{addr}"),
        shutdown,
        task,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_over_socket() {
    let server = start();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "healthy" }));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recommend_over_socket() {
    let server = start();
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/recommend", server.base))
        .json(&json!({ "query": "java developer", "top_k": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    assert!(
        text.starts_with(r#"{"recommended_assessments":[{"url":"#),
        "{text}"
    );
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["recommended_assessments"].as_array().unwrap().len(), 3);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_error_statuses_over_socket() {
    let server = start();
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/missing", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    let wrong_method = client
        .get(format!("{}/recommend", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_method.status(), 405);
    assert_eq!(wrong_method.headers()["allow"].to_str().unwrap(), "POST");

    let blank = client
        .post(format!("{}/recommend", server.base))
        .json(&json!({ "query": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), 400);
    let body: Value = blank.json().await.unwrap();
    assert_eq!(body["detail"], "Empty query");

    let huge = format!(r#"{{"query": "{}"}}"#, "a".repeat(MAX_BODY_BYTES + 1));
    let too_large = client
        .post(format!("{}/recommend", server.base))
        .header("content-type", "application/json")
        .body(huge)
        .send()
        .await
        .unwrap();
    assert_eq!(too_large.status(), 413);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_requests() {
    let server = start();
    let client = reqwest::Client::new();

    let requests = (0..16).map(|i| {
        let client = client.clone();
        let url = format!("{}/recommend", server.base);
        async move {
            let query = if i % 2 == 0 { "python" } else { "personality" };
            let response = client
                .post(url)
                .json(&json!({ "query": query }))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
            response.json::<Value>().await.unwrap()
        }
    });
    let bodies = futures_join_all(requests).await;

    let evens: Vec<&Value> = bodies.iter().step_by(2).collect();
    assert!(evens.windows(2).all(|w| w[0] == w[1]));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_answers_in_flight_requests() {
    let slow = Arc::new(SlowProvider::new(Duration::from_millis(800)));
    let server = start_with(Synthesizer::new(slow.clone(), Duration::from_secs(5), 2));

    let url = format!("{}/strategy", server.base);
    let pending = tokio::spawn(async move {
        reqwest::Client::new()
            .post(url)
            .json(&json!({ "query": "java developer", "top_k": 2 }))
            .send()
            .await
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    server.stop().await;

    let response = pending.await.unwrap().unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ai_response"], "ok");
    assert_eq!(body["raw_results"].as_array().unwrap().len(), 2);
    assert_eq!(slow.calls(), 1);
}

/// Await a batch of futures concurrently on the current runtime.
async fn futures_join_all<F>(futures: impl Iterator<Item = F>) -> Vec<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}

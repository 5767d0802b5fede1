//! End-to-end request scenarios against an in-process context.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::common::{empty_retriever, hash_retriever, make_item, placed_retriever, QUERY};
use shortlist::server::{dispatch, AppContext};
use shortlist::testing::HangingProvider;
use shortlist::{Item, Synthesizer, TIMEOUT_SENTINEL};

fn context(retriever: shortlist::Retriever) -> Arc<AppContext> {
    Arc::new(AppContext::new(retriever, Synthesizer::unconfigured()))
}

async fn post(ctx: &Arc<AppContext>, path: &str, body: Value) -> (u16, Value) {
    let reply = dispatch(ctx, "POST", path, body.to_string().as_bytes()).await;
    (reply.status, reply.body)
}

#[tokio::test]
async fn test_single_item_with_defaults() {
    let item = Item::new("https://example.com/view/bare/", "Bare Assessment");
    let ctx = context(hash_retriever(vec![item]));

    let (status, body) = post(&ctx, "/recommend", json!({ "query": "anything" })).await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "recommended_assessments": [{
                "url": "https://example.com/view/bare/",
                "name": "Bare Assessment",
                "adaptive_support": "No",
                "description": "",
                "duration": 0,
                "remote_support": "Yes",
                "test_type": ["Unknown"]
            }]
        })
    );
}

#[tokio::test]
async fn test_empty_corpus_returns_empty_list() {
    let ctx = context(empty_retriever());

    let (status, body) = post(&ctx, "/recommend", json!({ "query": "java developer" })).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "recommended_assessments": [] }));

    let (status, body) = post(&ctx, "/strategy", json!({ "query": "java developer" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["raw_results"], json!([]));
}

#[tokio::test]
async fn test_top_k_beyond_corpus_returns_everything() {
    let items: Vec<Item> = (0..5)
        .map(|i| {
            make_item(
                &format!("https://example.com/view/test-{i}/"),
                &format!("Test {i}"),
                &["K"],
            )
        })
        .collect();
    let ctx = context(hash_retriever(items));

    let (status, body) = post(&ctx, "/recommend", json!({ "query": "test", "top_k": 20 })).await;
    assert_eq!(status, 200);
    assert_eq!(body["recommended_assessments"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_duplicate_url_returned_once() {
    let url = "https://example.com/view/java-8-new/";
    let retriever = placed_retriever(
        &[
            (url, "Java Far", [4.0, 0.0]),
            ("https://example.com/view/python/", "Python", [2.0, 0.0]),
            (url, "Java Near", [1.0, 0.0]),
        ],
        [0.0, 0.0],
    );
    let ctx = context(retriever);

    let (status, body) = post(&ctx, "/recommend", json!({ "query": QUERY, "top_k": 10 })).await;
    assert_eq!(status, 200);

    let names: Vec<&str> = body["recommended_assessments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Java Near", "Python"]);
}

#[tokio::test(start_paused = true)]
async fn test_hung_provider_times_out_with_results() {
    let items: Vec<Item> = (0..3)
        .map(|i| {
            make_item(
                &format!("https://example.com/view/skill-{i}/"),
                &format!("Skill {i}"),
                &["A"],
            )
        })
        .collect();
    let provider = Arc::new(HangingProvider::new());
    let synthesizer = Synthesizer::new(provider.clone(), Duration::from_secs(5), 4);
    let ctx = Arc::new(AppContext::new(hash_retriever(items), synthesizer));

    let started = tokio::time::Instant::now();
    let (status, body) = post(
        &ctx,
        "/strategy",
        json!({ "query": "skills", "top_k": 3, "detail_level": "Deep Dive" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["ai_response"], TIMEOUT_SENTINEL);
    assert_eq!(body["raw_results"].as_array().unwrap().len(), 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6), "{elapsed:?}");

    for _ in 0..10 {
        if provider.was_cancelled() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(provider.was_cancelled());
}

#[tokio::test]
async fn test_recommend_ignores_hung_provider() {
    let items = vec![make_item("https://example.com/view/a/", "Alpha", &["K"])];
    let synthesizer = Synthesizer::new(
        Arc::new(HangingProvider::new()),
        Duration::from_secs(60),
        1,
    );
    let ctx = Arc::new(AppContext::new(hash_retriever(items), synthesizer));

    let started = Instant::now();
    let (status, body) = post(&ctx, "/recommend", json!({ "query": "alpha" })).await;

    assert_eq!(status, 200);
    assert_eq!(body["recommended_assessments"].as_array().unwrap().len(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

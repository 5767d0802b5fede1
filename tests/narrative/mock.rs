//! A tiny_http server that answers like the Gemini REST API.

#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{json, Value};
use tiny_http::{Header, Response, Server};

pub const API_KEY: &str = "test-key";

/// One request as the mock saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub url: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Canned answers.
#[derive(Clone)]
pub struct Script {
    pub models: (u16, Value),
    pub generate: (u16, Value),
    pub generate_delay: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            models: (200, models(&["gemini-1.5-flash", "gemini-1.5-pro"])),
            generate: (200, text_response("Start with the Java 8 test.")),
            generate_delay: Duration::ZERO,
        }
    }
}

/// A `models.list` body where every model supports `generateContent`.
pub fn models(names: &[&str]) -> Value {
    json!({
        "models": names
            .iter()
            .map(|n| json!({
                "name": format!("models/{n}"),
                "supportedGenerationMethods": ["generateContent", "countTokens"]
            }))
            .collect::<Vec<_>>()
    })
}

pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

pub struct MockGemini {
    pub base: String,
    seen: Arc<Mutex<Vec<Seen>>>,
    server: Arc<Server>,
    thread: Option<JoinHandle<()>>,
}

impl MockGemini {
    pub fn start(script: Script) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let thread = {
            let server = Arc::clone(&server);
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                while let Ok(mut request) = server.recv() {
                    let mut raw = String::new();
                    let _ = request.as_reader().read_to_string(&mut raw);
                    let api_key = request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("x-goog-api-key"))
                        .map(|h| h.value.as_str().to_string());
                    let url = request.url().to_string();
                    seen.lock().unwrap().push(Seen {
                        method: request.method().as_str().to_string(),
                        url: url.clone(),
                        api_key,
                        body: serde_json::from_str(&raw).unwrap_or(Value::Null),
                    });

                    let (status, body) = if url.ends_with(":generateContent") {
                        thread::sleep(script.generate_delay);
                        script.generate.clone()
                    } else if url.starts_with("/v1beta/models") {
                        script.models.clone()
                    } else {
                        (404, json!({ "error": "not found" }))
                    };

                    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                    let response = Response::from_string(body.to_string())
                        .with_status_code(status)
                        .with_header(header);
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            base: format!("http://{addr}"),
            seen,
            server,
            thread: Some(thread),
        }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockGemini {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

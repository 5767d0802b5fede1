// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Gemini `generateContent` provider.
//!
//! Model choice happens once, at startup: [`GeminiProvider::resolve`] lists
//! the models the key can use and picks the first configured candidate that
//! is on the list. A request path never discovers models.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{NarrativeError, NarrativeProvider};
use crate::config::NarrativeSettings;

const API_KEY_HEADER: &str = "x-goog-api-key";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

// ============================================================================
// PROVIDER
// ============================================================================

/// HTTP client for one resolved model.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    settings: NarrativeSettings,
}

impl GeminiProvider {
    /// Provider for an already-chosen model. No network calls.
    pub fn with_model(
        settings: &NarrativeSettings,
        api_key: String,
        model: String,
    ) -> Result<Self, NarrativeError> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| NarrativeError::Provider(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: strip_models_prefix(&model).to_string(),
            settings: settings.clone(),
        })
    }

    /// List available models and pick the first configured candidate.
    ///
    /// If the listing itself fails (network down at boot), the first
    /// candidate is used and the failure is logged. If the listing succeeds
    /// and no candidate is on it, startup fails with `NoModelAvailable`.
    pub async fn resolve(settings: &NarrativeSettings, api_key: String) -> Result<Self, NarrativeError> {
        let candidates: Vec<String> = settings
            .models
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        let mut provider = Self::with_model(settings, api_key, String::new())?;

        let model = match provider.list_models().await {
            Ok(available) => pick_model(&candidates, &available).ok_or_else(|| {
                NarrativeError::NoModelAvailable {
                    candidates: candidates.clone(),
                }
            })?,
            Err(e) => {
                let fallback = candidates
                    .first()
                    .cloned()
                    .ok_or(NarrativeError::NoModelAvailable { candidates: Vec::new() })?;
                warn!(error = %e, model = %fallback, "model listing failed, using first candidate");
                fallback
            }
        };

        info!(model = %model, "narrative model selected");
        provider.model = model;
        Ok(provider)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of models that support `generateContent`, without the `models/` prefix.
    async fn list_models(&self) -> Result<Vec<String>, NarrativeError> {
        let response = self
            .client
            .get(format!("{}/v1beta/models", self.api_base))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| NarrativeError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Provider(format!("status {status}: {text}")));
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| NarrativeError::Provider(format!("invalid model list: {e}")))?;

        Ok(list
            .models
            .into_iter()
            .filter(|m| m.supported_generation_methods.iter().any(|g| g == "generateContent"))
            .map(|m| strip_models_prefix(&m.name).to_string())
            .collect())
    }

    async fn request(&self, prompt: &str) -> Result<String, NarrativeError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                top_p: self.settings.top_p,
                top_k: self.settings.top_k,
                max_output_tokens: self.settings.max_output_tokens,
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base, self.model
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrativeError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Provider(format!("status {status}: {text}")));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| NarrativeError::Provider(format!("invalid response: {e}")))?;
        parse_response(&json)
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key stays out of logs
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NarrativeProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, NarrativeError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(NarrativeError::Cancelled),
            result = self.request(prompt) => result,
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn strip_models_prefix(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

/// First candidate present in `available`. Both sides may carry `models/`.
pub fn pick_model(candidates: &[String], available: &[String]) -> Option<String> {
    candidates
        .iter()
        .map(|c| strip_models_prefix(c))
        .find(|c| available.iter().any(|a| strip_models_prefix(a) == *c))
        .map(str::to_string)
}

/// Text from a `generateContent` response, or why there isn't any.
pub fn parse_response(json: &Value) -> Result<String, NarrativeError> {
    if let Some(reason) = json
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(NarrativeError::Blocked {
            reason: reason.to_string(),
        });
    }

    let candidate = json
        .pointer("/candidates/0")
        .ok_or_else(|| NarrativeError::Provider("response has no candidates".to_string()))?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let finish = candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");
        if finish == "SAFETY" {
            return Err(NarrativeError::Blocked {
                reason: finish.to_string(),
            });
        }
        return Err(NarrativeError::Provider(format!(
            "empty response (finish reason {finish})"
        )));
    }

    Ok(text)
}

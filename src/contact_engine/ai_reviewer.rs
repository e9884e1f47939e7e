//! Optional AI second opinion on whether two contacts are the same person

use crate::contact_engine::{ContactRecord, EngineConfig};
use crate::error::{EngineError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const SYSTEM_PROMPT: &str = "You are a CRM data quality assistant. You decide whether two contact \
records describe the same real-world person. Answer with a JSON object only.";

/// Text completion backend used for AI reviews.
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Chat-completions client for OpenAI-compatible APIs
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, config: &EngineConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.ai_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.ai_model.clone(),
            api_base: config.ai_api_base.trim_end_matches('/').to_string(),
        })
    }
}

impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": 0.1,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| EngineError::InvalidResponse("missing message content".to_string()))
    }
}

/// Independent same-person likelihood from the AI reviewer.
#[derive(Debug, Clone, PartialEq)]
pub struct AiVerdict {
    pub similarity: f64,
    pub reasons: Vec<String>,
}

#[derive(Deserialize)]
struct RawVerdict {
    similarity: f64,
    #[serde(default)]
    reasons: Vec<String>,
}

/// Wraps a provider so that a review can never fail the caller.
pub struct AiReviewer<P> {
    provider: P,
    timeout: Duration,
}

impl<P: CompletionProvider> AiReviewer<P> {
    pub fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    #[cfg(test)]
    pub(crate) fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns `None` on any provider, timeout or parse failure.
    pub async fn review(&self, contact1: &ContactRecord, contact2: &ContactRecord) -> Option<AiVerdict> {
        match self.try_review(contact1, contact2).await {
            Ok(verdict) => Some(verdict),
            Err(e) => {
                warn!(
                    contact_id = %contact1.id,
                    candidate_id = %contact2.id,
                    error = %e,
                    "AI review failed, using rule-based score"
                );
                None
            }
        }
    }

    async fn try_review(&self, contact1: &ContactRecord, contact2: &ContactRecord) -> Result<AiVerdict> {
        let prompt = build_prompt(contact1, contact2)?;
        let text = tokio::time::timeout(self.timeout, self.provider.complete(&prompt))
            .await
            .map_err(|_| EngineError::Timeout(self.timeout))??;
        parse_verdict(&text)
    }
}

fn build_prompt(contact1: &ContactRecord, contact2: &ContactRecord) -> Result<String> {
    Ok(format!(
        "Compare these two contacts and estimate how likely they are the same person.\n\n\
         Contact 1:\n{}\n\nContact 2:\n{}\n\n\
         Respond with JSON: {{\"similarity\": <number between 0 and 1>, \"reasons\": [<short strings>]}}",
        serde_json::to_string_pretty(contact1)?,
        serde_json::to_string_pretty(contact2)?,
    ))
}

/// Parses the verdict object, tolerating markdown fences or prose around it.
fn parse_verdict(text: &str) -> Result<AiVerdict> {
    let start = text.find('{');
    let end = text.rfind('}');
    let object = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(EngineError::InvalidResponse("no JSON object in completion".to_string())),
    };

    let raw: RawVerdict = serde_json::from_str(object)?;
    if !raw.similarity.is_finite() {
        return Err(EngineError::InvalidResponse("similarity is not a number".to_string()));
    }

    Ok(AiVerdict {
        similarity: raw.similarity.clamp(0.0, 1.0),
        reasons: raw.reasons,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::contact_engine::test_support::contact;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct FixedProvider {
        response: String,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        pub fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CompletionProvider for FixedProvider {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    pub struct FailingProvider;

    impl CompletionProvider for FailingProvider {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(EngineError::ProviderStatus {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    pub struct SlowProvider;

    impl CompletionProvider for SlowProvider {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(r#"{"similarity": 1.0}"#.to_string())
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let verdict = parse_verdict(r#"{"similarity": 0.82, "reasons": ["Same email domain"]}"#).unwrap();
        assert_eq!(verdict.similarity, 0.82);
        assert_eq!(verdict.reasons, vec!["Same email domain".to_string()]);
    }

    #[test]
    fn test_parse_fenced_json_without_reasons() {
        let verdict = parse_verdict("```json\n{\"similarity\": 0.5}\n```").unwrap();
        assert_eq!(verdict.similarity, 0.5);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        assert_eq!(parse_verdict(r#"{"similarity": 1.7}"#).unwrap().similarity, 1.0);
        assert_eq!(parse_verdict(r#"{"similarity": -2}"#).unwrap().similarity, 0.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_verdict("I think they are the same").is_err());
        assert!(parse_verdict(r#"{"score": 0.4}"#).is_err());
    }

    #[test]
    fn test_prompt_contains_both_contacts() {
        let mut a = contact("a");
        a.email = Some("jane@co.com".into());
        let mut b = contact("b");
        b.company = Some("Acme".into());

        let prompt = build_prompt(&a, &b).unwrap();
        assert!(prompt.contains("jane@co.com"));
        assert!(prompt.contains("Acme"));
        assert!(prompt.contains("\"similarity\""));
    }

    #[tokio::test]
    async fn test_review_swallows_provider_errors() {
        let reviewer = AiReviewer::new(FailingProvider, Duration::from_secs(1));
        assert!(reviewer.review(&contact("a"), &contact("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_review_swallows_unparseable_output() {
        let reviewer = AiReviewer::new(FixedProvider::new("no idea"), Duration::from_secs(1));
        assert!(reviewer.review(&contact("a"), &contact("b")).await.is_none());
        assert_eq!(reviewer.provider().calls(), 1);
    }

    #[tokio::test]
    async fn test_review_times_out() {
        let reviewer = AiReviewer::new(SlowProvider, Duration::from_millis(10));
        assert!(reviewer.review(&contact("a"), &contact("b")).await.is_none());
    }

    #[test]
    fn test_openai_provider_builds_from_config() {
        let config = EngineConfig {
            ai_api_base: "http://localhost:9999/v1/".to_string(),
            ..Default::default()
        };
        let provider = OpenAiProvider::new("sk-test", &config).unwrap();
        assert_eq!(provider.api_base, "http://localhost:9999/v1");
        assert_eq!(provider.model, "gpt-4o-mini");
    }
}

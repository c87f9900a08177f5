//! Generation invoker
//!
//! Abstracts over any text-generation backend: structured prompt in,
//! structured output or parse failure out. The invoker owns the reliability
//! policy around the single external call:
//! - per-call deadline (`InvocationTimeout`)
//! - exponential backoff on `RateLimited` / timeout
//! - exactly one repair-prompt retry when the output fails to parse

use crate::error::GenerationError;
use horizon_types::BackoffPolicy;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Backend-signalled generation failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeneratorFailure {
    /// The backend is throttling; retryable with backoff
    #[error("backend rate limited")]
    RateLimited,

    /// The backend failed outright; not retryable
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Black-box text-generation capability
///
/// One external call per invocation; stateless from the pipeline's view.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Complete a prompt, returning the raw response text
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorFailure>;
}

/// Invokes the generation backend and parses typed output
#[derive(Clone)]
pub struct GenerationInvoker {
    backend: Arc<dyn Generator>,
    timeout: Duration,
    backoff: BackoffPolicy,
}

impl std::fmt::Debug for GenerationInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationInvoker")
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl GenerationInvoker {
    /// Create an invoker over a generation backend
    #[inline]
    #[must_use]
    pub fn new(backend: Arc<dyn Generator>, timeout: Duration, backoff: BackoffPolicy) -> Self {
        Self {
            backend,
            timeout,
            backoff,
        }
    }

    /// Invoke the backend and parse its response into `T`
    ///
    /// # Errors
    /// - `GenerationError::Timeout` / `RateLimited` after backoff retries
    ///   are exhausted
    /// - `GenerationError::ParseFailure` after the single repair attempt
    /// - `GenerationError::Backend` on a hard backend failure
    pub async fn invoke<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, GenerationError> {
        let raw = self.complete_with_backoff(prompt).await?;
        match parse_structured::<T>(&raw) {
            Ok(value) => Ok(value),
            Err(parse_err) => {
                tracing::warn!(error = %parse_err, "generation output unparsable, issuing repair prompt");
                let repair = repair_prompt(prompt, &raw, &parse_err);
                let repaired = self.complete_with_backoff(&repair).await?;
                parse_structured::<T>(&repaired).map_err(|detail| {
                    tracing::warn!(error = %detail, "repair attempt also unparsable");
                    GenerationError::ParseFailure { detail }
                })
            }
        }
    }

    /// One logical completion: per-call timeout plus backoff on transient
    /// failures, up to the configured attempt budget.
    async fn complete_with_backoff(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut attempt = 1u32;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, self.backend.complete(prompt))
                .await
            {
                Err(_) => Err(GenerationError::Timeout {
                    deadline_secs: self.timeout.as_secs(),
                }),
                Ok(Err(GeneratorFailure::RateLimited)) => Err(GenerationError::RateLimited),
                Ok(Err(GeneratorFailure::Unavailable(detail))) => {
                    Err(GenerationError::Backend(detail))
                }
                Ok(Ok(text)) => Ok(text),
            };

            match outcome {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.backoff.max_attempts => {
                    let delay = self.backoff.delay_for(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "generation attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Parse a backend response into `T`, tolerating prose and code fences
/// around the JSON body.
fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let body = extract_json(raw).ok_or_else(|| "no JSON object in response".to_string())?;
    serde_json::from_str::<T>(body).map_err(|e| e.to_string())
}

/// Locate the outermost JSON object in a response
///
/// Backends are instructed to answer with bare JSON but routinely wrap it
/// in markdown fences or a leading sentence.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Build the repair prompt for an unparsable response
fn repair_prompt(original: &str, response: &str, parse_error: &str) -> String {
    format!(
        "{original}\n\n\
         Your previous response could not be parsed as the required JSON \
         schema (error: {parse_error}).\n\
         Previous response:\n{response}\n\n\
         Respond again with ONLY a valid JSON object matching the schema. \
         No prose, no code fences."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        covered: bool,
    }

    /// Backend scripted with one response per call; records call count
    struct ScriptedBackend {
        responses: Mutex<Vec<Result<String, GeneratorFailure>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedBackend {
        fn new(mut responses: Vec<Result<String, GeneratorFailure>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait::async_trait]
    impl Generator for ScriptedBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, GeneratorFailure> {
            *self.calls.lock() += 1;
            self.responses
                .lock()
                .pop()
                .unwrap_or_else(|| Err(GeneratorFailure::Unavailable("script exhausted".into())))
        }
    }

    fn invoker(backend: Arc<ScriptedBackend>) -> GenerationInvoker {
        GenerationInvoker::new(backend, Duration::from_secs(30), BackoffPolicy::default())
    }

    #[tokio::test]
    async fn parses_clean_json() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(
            r#"{"covered": true}"#.to_string()
        )]));
        let result: Verdict = invoker(backend).invoke("prompt").await.unwrap();
        assert_eq!(result, Verdict { covered: true });
    }

    #[tokio::test]
    async fn parses_json_wrapped_in_fences() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(
            "Here is the result:\n```json\n{\"covered\": false}\n```".to_string(),
        )]));
        let result: Verdict = invoker(backend).invoke("prompt").await.unwrap();
        assert_eq!(result, Verdict { covered: false });
    }

    #[tokio::test]
    async fn repair_prompt_recovers_bad_output() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok("covered: yes, definitely".to_string()),
            Ok(r#"{"covered": true}"#.to_string()),
        ]));
        let result: Verdict = invoker(Arc::clone(&backend)).invoke("prompt").await.unwrap();
        assert_eq!(result, Verdict { covered: true });
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn persistent_garbage_degrades_to_parse_failure() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok("not json".to_string()),
            Ok("still not json".to_string()),
        ]));
        let err = invoker(Arc::clone(&backend))
            .invoke::<Verdict>("prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::ParseFailure { .. }));
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_is_retried_with_backoff() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(GeneratorFailure::RateLimited),
            Err(GeneratorFailure::RateLimited),
            Ok(r#"{"covered": true}"#.to_string()),
        ]));
        let started = tokio::time::Instant::now();
        let result: Verdict = invoker(Arc::clone(&backend)).invoke("prompt").await.unwrap();
        assert_eq!(result, Verdict { covered: true });
        assert_eq!(backend.call_count(), 3);
        // 1s after the first failure, 2s after the second
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_escalates_after_attempt_budget() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(GeneratorFailure::RateLimited),
            Err(GeneratorFailure::RateLimited),
            Err(GeneratorFailure::RateLimited),
        ]));
        let err = invoker(Arc::clone(&backend))
            .invoke::<Verdict>("prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited));
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn hard_backend_failure_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(
            GeneratorFailure::Unavailable("model down".to_string()),
        )]));
        let err = invoker(Arc::clone(&backend))
            .invoke::<Verdict>("prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Backend(_)));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        struct SlowBackend;

        #[async_trait::async_trait]
        impl Generator for SlowBackend {
            async fn complete(&self, _prompt: &str) -> Result<String, GeneratorFailure> {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(String::new())
            }
        }

        let invoker = GenerationInvoker::new(
            Arc::new(SlowBackend),
            Duration::from_secs(30),
            BackoffPolicy {
                base_delay_ms: 1_000,
                max_delay_ms: 8_000,
                max_attempts: 1,
            },
        );
        let err = invoker.invoke::<Verdict>("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { deadline_secs: 30 }));
    }

    #[test]
    fn extract_json_finds_outermost_object() {
        assert_eq!(extract_json(r#"{"a": {"b": 1}}"#), Some(r#"{"a": {"b": 1}}"#));
        assert_eq!(extract_json("prefix {\"a\": 1} suffix"), Some("{\"a\": 1}"));
        assert_eq!(extract_json("no json here"), None);
    }
}

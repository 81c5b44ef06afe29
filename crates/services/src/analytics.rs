use std::env;

use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};

use quiz_core::model::QuizId;

/// A named usage event with loosely-structured attributes.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub name: &'static str,
    pub attributes: Value,
}

impl AnalyticsEvent {
    #[must_use]
    pub fn screen_view(screen_name: &str) -> Self {
        Self {
            name: "screen_view",
            attributes: json!({ "screen_name": screen_name }),
        }
    }

    #[must_use]
    pub fn select_quiz(quiz_id: &QuizId) -> Self {
        Self {
            name: "select_quiz",
            attributes: json!({ "quiz_id": quiz_id }),
        }
    }

    #[must_use]
    pub fn quiz_start(quiz_id: &QuizId, quiz_title: &str) -> Self {
        Self {
            name: "quiz_start",
            attributes: json!({ "quiz_id": quiz_id, "quiz_title": quiz_title }),
        }
    }

    #[must_use]
    pub fn select_option(quiz_id: &QuizId, question_number: usize, option: &str) -> Self {
        Self {
            name: "select_option",
            attributes: json!({
                "quiz_id": quiz_id,
                "question_number": question_number,
                "option_selected": option,
            }),
        }
    }

    #[must_use]
    pub fn answer_question(quiz_id: &QuizId, question_number: usize, is_correct: bool) -> Self {
        Self {
            name: "answer_question",
            attributes: json!({
                "quiz_id": quiz_id,
                "question_number": question_number,
                "is_correct": is_correct,
            }),
        }
    }

    #[must_use]
    pub fn quiz_complete(quiz_id: &QuizId, score: u32, total_questions: u32) -> Self {
        Self {
            name: "quiz_complete",
            attributes: json!({
                "quiz_id": quiz_id,
                "score": score,
                "total_questions": total_questions,
            }),
        }
    }

    #[must_use]
    pub fn quiz_retry(quiz_id: &QuizId) -> Self {
        Self {
            name: "quiz_retry",
            attributes: json!({ "quiz_id": quiz_id }),
        }
    }
}

/// Best-effort usage telemetry.
///
/// Recording must never block or fail the caller; implementations drop
/// events they cannot deliver.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record(&self, _event: AnalyticsEvent) {}
}

/// Sink that POSTs events as JSON to a collector endpoint.
///
/// Requires a Tokio runtime: each event is shipped on a detached task, and
/// delivery failures are logged at debug and dropped.
#[derive(Debug, Clone)]
pub struct HttpAnalytics {
    client: Client,
    endpoint: String,
}

impl HttpAnalytics {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Build from `QUIZ_ANALYTICS_URL`, if set and non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let endpoint = env::var("QUIZ_ANALYTICS_URL").ok()?;
        if endpoint.trim().is_empty() {
            return None;
        }
        Some(Self::new(endpoint))
    }
}

impl AnalyticsSink for HttpAnalytics {
    fn record(&self, event: AnalyticsEvent) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            if let Err(e) = client.post(&endpoint).json(&event).send().await {
                tracing::debug!(event = event.name, error = %e, "analytics event dropped");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_name_and_attributes() {
        let event = AnalyticsEvent::answer_question(&QuizId::new("q1"), 2, true);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["name"], "answer_question");
        assert_eq!(value["attributes"]["quiz_id"], "q1");
        assert_eq!(value["attributes"]["question_number"], 2);
        assert_eq!(value["attributes"]["is_correct"], true);
    }

    #[test]
    fn quiz_events_carry_the_quiz_id() {
        for event in [
            AnalyticsEvent::select_quiz(&QuizId::new("q7")),
            AnalyticsEvent::quiz_start(&QuizId::new("q7"), "Title"),
            AnalyticsEvent::quiz_retry(&QuizId::new("q7")),
        ] {
            assert_eq!(event.attributes["quiz_id"], "q7");
        }
    }
}

//! HTTP client for the external attack classifier.
//!
//! One bounded POST per event: 3-second deadline, no retries. Any
//! failure (timeout, transport error, non-success status, malformed
//! body) degrades to the deterministic fallback classification and
//! is logged; it never fails the ingest call.

use std::time::Duration;

use mirage_core::models::event::{AttackKind, Classification};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::FeatureVector;

const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    failed_logins: f64,
    request_rate: f64,
    commands_count: f64,
    sql_payload: f64,
    honeytoken_access: f64,
    session_time: f64,
}

impl From<FeatureVector> for PredictRequest {
    fn from(f: FeatureVector) -> Self {
        PredictRequest {
            failed_logins: f.failed_logins,
            request_rate: f.request_rate,
            commands_count: f.commands_count,
            sql_payload: f.sql_payload,
            honeytoken_access: f.honeytoken_access,
            session_time: f.session_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    attack_type: String,
    risk_score: f64,
    confidence: f64,
    is_anomaly: bool,
}

/// Stateless, thread-safe classifier client. Cloning shares the
/// underlying connection pool.
#[derive(Clone)]
pub struct ClassifierClient {
    http: reqwest::Client,
    predict_url: String,
}

impl ClassifierClient {
    /// Build a client for the given base URL. `/predict` is appended
    /// unless the URL already ends with it.
    pub fn new(base_url: &str) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .timeout(CLASSIFY_TIMEOUT)
            .build()?;

        let trimmed = base_url.trim_end_matches('/');
        let predict_url = if trimmed.ends_with("/predict") {
            trimmed.to_string()
        } else {
            format!("{trimmed}/predict")
        };

        Ok(Self { http, predict_url })
    }

    /// Classify one feature vector. Never fails: degraded paths
    /// return [`Classification::fallback`].
    pub async fn classify(&self, features: FeatureVector) -> Classification {
        let request = PredictRequest::from(features.clamped());

        let response = match self.http.post(&self.predict_url).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "classifier unreachable, using fallback");
                return Classification::fallback();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                status = %response.status(),
                "classifier returned non-success status, using fallback"
            );
            return Classification::fallback();
        }

        match response.json::<PredictResponse>().await {
            Ok(p) => Classification {
                attack_kind: AttackKind::parse(&p.attack_type),
                risk: p.risk_score.clamp(0.0, 10.0),
                confidence: p.confidence.clamp(0.0, 1.0),
                anomaly: p.is_anomaly,
            },
            Err(e) => {
                tracing::warn!(error = %e, "malformed classifier response, using fallback");
                Classification::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_url_is_normalised() {
        let c = ClassifierClient::new("http://localhost:8000").unwrap();
        assert_eq!(c.predict_url, "http://localhost:8000/predict");
        let c = ClassifierClient::new("http://localhost:8000/").unwrap();
        assert_eq!(c.predict_url, "http://localhost:8000/predict");
        let c = ClassifierClient::new("http://localhost:8000/predict").unwrap();
        assert_eq!(c.predict_url, "http://localhost:8000/predict");
    }

    #[tokio::test]
    async fn unreachable_classifier_degrades_to_fallback() {
        // Nothing listens on this port.
        let client = ClassifierClient::new("http://127.0.0.1:9").unwrap();
        let result = client
            .classify(FeatureVector::honeytoken_indicator())
            .await;
        assert_eq!(result, Classification::fallback());
    }
}

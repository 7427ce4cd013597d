//! Feature derivation for the attack classifier.
//!
//! The classifier consumes exactly six numeric features in a fixed
//! order. Out-of-range values are clamped to the classifier's
//! documented training ranges rather than rejected.

use mirage_core::models::event::HoneypotLogInput;

/// Documented feature ranges.
const FAILED_LOGINS_MAX: f64 = 150.0;
const REQUEST_RATE_MIN: f64 = 1.0;
const REQUEST_RATE_MAX: f64 = 600.0;
const COMMANDS_MAX: f64 = 20.0;
const SESSION_TIME_MIN: f64 = 10.0;
const SESSION_TIME_MAX: f64 = 600.0;

/// Fixed-order feature vector: failed logins, request rate, commands
/// count, SQL-payload flag, honeytoken-access flag, session seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub failed_logins: f64,
    pub request_rate: f64,
    pub commands_count: f64,
    pub sql_payload: f64,
    pub honeytoken_access: f64,
    pub session_time: f64,
}

impl FeatureVector {
    /// Derive features from a honeypot log.
    ///
    /// Request rate and session time are caller-provided through the
    /// `extra` map (`request_rate`, `session_time`); absent or
    /// unparsable values take the defaults 1 and 0.
    pub fn from_honeypot(input: &HoneypotLogInput) -> Self {
        let request_rate = input
            .extra
            .get("request_rate")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(1.0);
        let session_time = input
            .extra
            .get("session_time")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);

        FeatureVector {
            failed_logins: count_failure_tokens(&input.payload) as f64,
            request_rate,
            commands_count: if input.activity == "command_exec" {
                1.0
            } else {
                0.0
            },
            sql_payload: if contains_sql_sentinels(&input.payload) {
                1.0
            } else {
                0.0
            },
            honeytoken_access: 0.0,
            session_time,
        }
    }

    /// Fixed indicator vector for agent honeytoken-access events.
    ///
    /// Honeytoken access has a near-tautological ground truth, so the
    /// remaining features are pinned to values squarely inside the
    /// classifier's high-risk region.
    pub fn honeytoken_indicator() -> Self {
        FeatureVector {
            failed_logins: 90.0,
            request_rate: 550.0,
            commands_count: 8.0,
            sql_payload: 0.0,
            honeytoken_access: 1.0,
            session_time: 300.0,
        }
    }

    /// Clamp every feature into its documented range.
    pub fn clamped(self) -> Self {
        FeatureVector {
            failed_logins: self.failed_logins.clamp(0.0, FAILED_LOGINS_MAX),
            request_rate: self.request_rate.clamp(REQUEST_RATE_MIN, REQUEST_RATE_MAX),
            commands_count: self.commands_count.clamp(0.0, COMMANDS_MAX),
            sql_payload: self.sql_payload.clamp(0.0, 1.0),
            honeytoken_access: self.honeytoken_access.clamp(0.0, 1.0),
            session_time: self.session_time.clamp(SESSION_TIME_MIN, SESSION_TIME_MAX),
        }
    }
}

/// Count "fail"/"invalid" occurrences in a payload, capped at 150.
pub fn count_failure_tokens(payload: &str) -> u32 {
    let haystack = payload.to_lowercase();
    let count = haystack.matches("fail").count() + haystack.matches("invalid").count();
    count.min(FAILED_LOGINS_MAX as usize) as u32
}

/// SQL-injection sentinels: a single quote, a comment dash pair,
/// `union`, or `select … from`, all case-insensitive.
pub fn contains_sql_sentinels(payload: &str) -> bool {
    let haystack = payload.to_lowercase();
    if haystack.contains('\'') || haystack.contains("--") || haystack.contains("union") {
        return true;
    }
    match haystack.find("select") {
        Some(pos) => haystack[pos..].contains("from"),
        None => false,
    }
}

//! Raw ingestion records: honeypot logs and agent events.
//!
//! Two concrete variants share a common envelope (node id, timestamp,
//! receipt instant, classification). Records are immutable once
//! appended.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{MirageError, MirageResult};

// -----------------------------------------------------------------------
// Field limits (enforced before the pipeline begins)
// -----------------------------------------------------------------------

pub const MAX_SERVICE_LEN: usize = 50;
pub const MAX_SOURCE_LEN: usize = 64;
pub const MAX_ACTIVITY_LEN: usize = 100;
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024;
pub const MAX_EXTRA_BYTES: usize = 4 * 1024;
pub const MAX_HOSTNAME_LEN: usize = 255;
pub const MAX_USERNAME_LEN: usize = 100;
pub const MAX_FILE_NAME_LEN: usize = 255;
pub const MAX_FILE_PATH_LEN: usize = 1024;
pub const MAX_ACTION_LEN: usize = 50;
pub const MAX_ALERT_KIND_LEN: usize = 100;

fn check_len(field: &'static str, value: &str, max: usize) -> MirageResult<()> {
    if value.len() > max {
        return Err(MirageError::invalid_input(format!(
            "{field} exceeds {max} bytes"
        )));
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Classification
// -----------------------------------------------------------------------

/// The enumerated attack-kind universe. Labels the classifier emits
/// outside this set collapse to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttackKind {
    Normal,
    BruteForce,
    Injection,
    DataExfil,
    Recon,
    #[serde(rename = "unknown")]
    Unknown,
}

impl AttackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackKind::Normal => "Normal",
            AttackKind::BruteForce => "BruteForce",
            AttackKind::Injection => "Injection",
            AttackKind::DataExfil => "DataExfil",
            AttackKind::Recon => "Recon",
            AttackKind::Unknown => "unknown",
        }
    }

    pub fn parse(label: &str) -> Self {
        match label {
            "Normal" => AttackKind::Normal,
            "BruteForce" => AttackKind::BruteForce,
            "Injection" => AttackKind::Injection,
            "DataExfil" => AttackKind::DataExfil,
            "Recon" => AttackKind::Recon,
            _ => AttackKind::Unknown,
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output attached to every raw event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub attack_kind: AttackKind,
    /// 0..10.
    pub risk: f64,
    /// 0..1.
    pub confidence: f64,
    pub anomaly: bool,
}

impl Classification {
    /// Deterministic stand-in when the classifier is unreachable.
    /// Risk 0 never crosses the alert threshold, so degraded
    /// classification never manufactures incidents.
    pub fn fallback() -> Self {
        Classification {
            attack_kind: AttackKind::Unknown,
            risk: 0.0,
            confidence: 0.0,
            anomaly: false,
        }
    }
}

// -----------------------------------------------------------------------
// Severity
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Case-insensitive parse; agents historically send upper-case
    /// labels.
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Severity band for a classified risk score: critical >= 9,
    /// high >= 7, medium >= 4, else low.
    pub fn from_risk(risk: f64) -> Self {
        if risk >= 9.0 {
            Severity::Critical
        } else if risk >= 7.0 {
            Severity::High
        } else if risk >= 4.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Severity::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown severity: {raw}")))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------
// Persisted records
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoneypotLogRecord {
    pub id: Uuid,
    pub node_id: String,
    pub service: String,
    pub source_ip: String,
    pub activity: String,
    pub payload: String,
    pub extra: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEventRecord {
    pub id: Uuid,
    pub node_id: String,
    pub hostname: String,
    pub username: String,
    pub file_accessed: String,
    pub file_path: String,
    pub action: String,
    pub severity: Severity,
    pub alert_kind: String,
    pub timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub classification: Classification,
}

/// Merged view returned by the event query layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Honeypot(HoneypotLogRecord),
    Agent(AgentEventRecord),
}

impl Event {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Honeypot(r) => r.timestamp,
            Event::Agent(r) => r.timestamp,
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            Event::Honeypot(r) => &r.node_id,
            Event::Agent(r) => &r.node_id,
        }
    }

    /// Agent events carry an explicit severity; honeypot logs derive
    /// theirs from the classified risk.
    pub fn severity(&self) -> Severity {
        match self {
            Event::Honeypot(r) => Severity::from_risk(r.classification.risk),
            Event::Agent(r) => r.severity,
        }
    }

    /// Opaque attacker-side identifier: source IP for honeypot logs,
    /// host name for agent events.
    pub fn source_identifier(&self) -> &str {
        match self {
            Event::Honeypot(r) => &r.source_ip,
            Event::Agent(r) => &r.hostname,
        }
    }

    /// Case-insensitive substring match over the searchable fields.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let mut haystacks: Vec<&str> = Vec::new();
        match self {
            Event::Honeypot(r) => {
                haystacks.push(&r.source_ip);
                haystacks.push(&r.activity);
                haystacks.push(&r.service);
            }
            Event::Agent(r) => {
                haystacks.push(&r.hostname);
                haystacks.push(&r.action);
                haystacks.push(&r.alert_kind);
                haystacks.push(&r.file_accessed);
            }
        }
        haystacks
            .iter()
            .any(|h| h.to_lowercase().contains(&needle))
    }
}

// -----------------------------------------------------------------------
// Wire inputs
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct HoneypotLogInput {
    pub service: String,
    pub source_ip: String,
    pub activity: String,
    #[serde(default)]
    pub payload: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl HoneypotLogInput {
    pub fn validate(&self) -> MirageResult<()> {
        check_len("service", &self.service, MAX_SERVICE_LEN)?;
        check_len("source_ip", &self.source_ip, MAX_SOURCE_LEN)?;
        check_len("activity", &self.activity, MAX_ACTIVITY_LEN)?;
        check_len("payload", &self.payload, MAX_PAYLOAD_BYTES)?;
        let extra_bytes: usize = self.extra.iter().map(|(k, v)| k.len() + v.len()).sum();
        if extra_bytes > MAX_EXTRA_BYTES {
            return Err(MirageError::invalid_input(format!(
                "extra exceeds {MAX_EXTRA_BYTES} bytes"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentEventInput {
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub username: String,
    pub file_accessed: String,
    pub file_path: String,
    pub action: String,
    pub severity: Severity,
    #[serde(rename = "alert_type")]
    pub alert_kind: String,
}

impl AgentEventInput {
    pub fn validate(&self) -> MirageResult<()> {
        check_len("hostname", &self.hostname, MAX_HOSTNAME_LEN)?;
        check_len("username", &self.username, MAX_USERNAME_LEN)?;
        check_len("file_accessed", &self.file_accessed, MAX_FILE_NAME_LEN)?;
        check_len("file_path", &self.file_path, MAX_FILE_PATH_LEN)?;
        check_len("action", &self.action, MAX_ACTION_LEN)?;
        check_len("alert_type", &self.alert_kind, MAX_ALERT_KIND_LEN)?;
        Ok(())
    }
}

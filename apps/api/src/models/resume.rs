use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Key prefix for every résumé record in the record store.
pub const RECORD_PREFIX: &str = "resume:";
/// Pattern matching every résumé record.
pub const RECORD_PATTERN: &str = "resume:*";

/// Returns the record-store key for a résumé id: `resume:<uuid>`.
pub fn record_key(id: &Uuid) -> String {
    format!("{RECORD_PREFIX}{id}")
}

/// Feedback attached to a résumé record.
///
/// On the wire a pending record carries the empty string; a completed record
/// carries the structured feedback object returned by the analysis service.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeedbackState {
    #[default]
    Pending,
    Ready(Value),
}

impl FeedbackState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FeedbackState::Pending)
    }

    pub fn as_ready(&self) -> Option<&Value> {
        match self {
            FeedbackState::Ready(value) => Some(value),
            FeedbackState::Pending => None,
        }
    }
}

impl Serialize for FeedbackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeedbackState::Pending => serializer.serialize_str(""),
            FeedbackState::Ready(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FeedbackState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => FeedbackState::Pending,
            Value::String(s) if s.is_empty() => FeedbackState::Pending,
            other => FeedbackState::Ready(other),
        })
    }
}

/// The persisted metadata for one résumé submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub feedback: FeedbackState,
}

impl ResumeRecord {
    pub fn key(&self) -> String {
        record_key(&self.id)
    }

    /// `feedback.overallScore`, once analysis has completed.
    pub fn overall_score(&self) -> Option<f64> {
        self.feedback
            .as_ready()
            .and_then(|f| f.get("overallScore"))
            .and_then(Value::as_f64)
    }
}

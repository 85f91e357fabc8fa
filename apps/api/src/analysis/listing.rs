//! Read path over stored résumé records.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::resume::{record_key, ResumeRecord, RECORD_PATTERN};
use crate::storage::RecordStore;

#[derive(Debug, Default, Serialize)]
pub struct ResumeListing {
    pub resumes: Vec<ResumeRecord>,
    /// Keys whose stored value could not be read as a record.
    pub skipped: Vec<String>,
}

/// Lists every stored résumé in store order.
///
/// Entries are parsed independently: a malformed value is logged and
/// skipped rather than failing the whole listing.
pub async fn list_resumes(records: &dyn RecordStore) -> Result<ResumeListing> {
    let entries = records
        .list(RECORD_PATTERN, true)
        .await
        .context("Failed to list resume records")?;

    let mut listing = ResumeListing::default();
    for entry in entries {
        let Some(value) = entry.value else {
            warn!("Record {} has no value; skipping", entry.key);
            listing.skipped.push(entry.key);
            continue;
        };
        match serde_json::from_str::<ResumeRecord>(&value) {
            Ok(record) => listing.resumes.push(record),
            Err(e) => {
                warn!("Record {} is malformed; skipping: {e}", entry.key);
                listing.skipped.push(entry.key);
            }
        }
    }

    let pending = listing
        .resumes
        .iter()
        .filter(|r| r.feedback.is_pending())
        .count();
    debug!(
        "Listed {} resumes ({} pending, {} skipped)",
        listing.resumes.len(),
        pending,
        listing.skipped.len()
    );
    Ok(listing)
}

/// Loads one résumé by id. A stored value that is not a record is an error.
pub async fn get_resume(records: &dyn RecordStore, id: Uuid) -> Result<Option<ResumeRecord>> {
    let key = record_key(&id);
    let Some(value) = records.get(&key).await? else {
        return Ok(None);
    };
    let record = serde_json::from_str(&value).with_context(|| format!("Record {key} is malformed"))?;
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::FakeRecordStore;
    use crate::models::resume::FeedbackState;
    use serde_json::json;

    fn record_json(id: Uuid, feedback: serde_json::Value) -> String {
        json!({
            "id": id,
            "resumePath": format!("uploads/{id}/resume.pdf"),
            "imagePath": format!("uploads/{id}/resume.png"),
            "companyName": "Acme",
            "jobTitle": "SRE",
            "jobDescription": "",
            "feedback": feedback
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let store = FakeRecordStore::new();
        let listing = list_resumes(&store).await.unwrap();
        assert!(listing.resumes.is_empty());
        assert!(listing.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_lists_pending_and_completed_records_in_store_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let store = FakeRecordStore::with_entries([
            (record_key(&a), record_json(a, json!(""))),
            (record_key(&b), record_json(b, json!({"overallScore": 55}))),
        ]);

        let listing = list_resumes(&store).await.unwrap();
        let ids: Vec<Uuid> = listing.resumes.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(listing.resumes[0].feedback.is_pending());
        assert_eq!(listing.resumes[1].overall_score(), Some(55.0));
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped_not_fatal() {
        let good = Uuid::new_v4();
        let store = FakeRecordStore::with_entries([
            ("resume:broken".to_string(), "{not json".to_string()),
            (record_key(&good), record_json(good, json!(""))),
        ]);

        let listing = list_resumes(&store).await.unwrap();
        assert_eq!(listing.resumes.len(), 1);
        assert_eq!(listing.resumes[0].id, good);
        assert_eq!(listing.skipped, vec!["resume:broken".to_string()]);
    }

    #[tokio::test]
    async fn test_only_resume_keys_are_listed() {
        let id = Uuid::new_v4();
        let store = FakeRecordStore::with_entries([
            ("session:abc".to_string(), "{}".to_string()),
            (record_key(&id), record_json(id, json!(""))),
        ]);
        let listing = list_resumes(&store).await.unwrap();
        assert_eq!(listing.resumes.len(), 1);
        assert!(listing.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let store = FakeRecordStore::new();
        store.fail_listing();
        assert!(list_resumes(&store).await.is_err());
    }

    #[tokio::test]
    async fn test_get_resume_by_id() {
        let id = Uuid::new_v4();
        let store = FakeRecordStore::with_entries([(
            record_key(&id),
            record_json(id, json!({"overallScore": 90})),
        )]);

        let record = get_resume(&store, id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert!(matches!(record.feedback, FeedbackState::Ready(_)));
        assert!(get_resume(&store, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_malformed_resume_is_an_error() {
        let id = Uuid::new_v4();
        let store = FakeRecordStore::with_entries([(record_key(&id), "[]".to_string())]);
        assert!(get_resume(&store, id).await.is_err());
    }
}

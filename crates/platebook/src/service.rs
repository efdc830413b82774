//! The record API.
//!
//! [`RecordService`] implements List, Create, Update and Delete over the
//! record store, independent of any transport. The HTTP layer and the
//! in-process client both call into it.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::record::{present, NewRecord, PlatePolicy, Record};
use crate::storage::{Connector, Storage};

/// Reported when Create or Update is missing a field.
pub const INCOMPLETE_DATA: &str = "incomplete data";
/// Reported when Delete has no plate.
pub const PLATE_MISSING: &str = "plate not provided";
/// Success message for Create.
pub const CREATED: &str = "plate registered successfully";
/// Success message for Update.
pub const UPDATED: &str = "details updated successfully";
/// Success message for Delete.
pub const REMOVED: &str = "plate removed successfully";

/// Body accepted by Create, Update and Delete.
///
/// Fields are optional so that a missing field is reported as a validation
/// error rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    /// The plate the request targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    /// New details, for Create and Update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RecordRequest {
    /// Request carrying both fields.
    #[must_use]
    pub fn new(plate: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            plate: Some(plate.into()),
            details: Some(details.into()),
        }
    }

    /// Request carrying only a plate, as Delete expects.
    #[must_use]
    pub fn plate(plate: impl Into<String>) -> Self {
        Self {
            plate: Some(plate.into()),
            details: None,
        }
    }
}

/// Result of a successful Create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    /// Human-readable outcome.
    pub message: String,
    /// Store-assigned identifier.
    pub id: i64,
}

/// Result of a successful Update or Delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Human-readable outcome.
    pub message: String,
}

impl Ack {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// List/Create/Update/Delete over the record collection.
#[derive(Debug, Clone)]
pub struct RecordService {
    connector: Connector,
    policy: PlatePolicy,
}

impl RecordService {
    /// Create a service over an open connector.
    #[must_use]
    pub fn new(connector: Connector, policy: PlatePolicy) -> Self {
        Self { connector, policy }
    }

    /// The plate policy in effect.
    #[must_use]
    pub fn policy(&self) -> PlatePolicy {
        self.policy
    }

    /// The underlying connector.
    #[must_use]
    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Return every stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Record>> {
        let records = self
            .connector
            .run(Storage::list)
            .await
            .inspect_err(|e| error!("Failed to list records: {e}"))?;
        debug!("Listed {} records", records.len());
        Ok(records)
    }

    /// Register a new plate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either field is missing,
    /// [`Error::Conflict`] if the plate is already registered, or a storage
    /// error.
    pub async fn create(&self, request: &RecordRequest) -> Result<Created> {
        let (Some(plate), Some(details)) = (
            present(request.plate.as_deref()),
            present(request.details.as_deref()),
        ) else {
            return Err(Error::validation(INCOMPLETE_DATA));
        };

        let record = NewRecord::new(self.policy.apply(plate), details);
        let plate = record.plate.clone();

        match self.connector.run(move |s| s.insert(&record)).await {
            Ok(id) => {
                info!("Registered plate {plate} (id {id})");
                Ok(Created {
                    message: CREATED.to_string(),
                    id,
                })
            }
            Err(e) if e.is_conflict() => {
                debug!("Rejected duplicate plate {plate}");
                Err(e)
            }
            Err(e) => {
                error!("Failed to insert plate {plate}: {e}");
                Err(e)
            }
        }
    }

    /// Replace the details of an existing plate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either field is missing,
    /// [`Error::NotFound`] if no record matches, or a storage error.
    pub async fn update(&self, request: &RecordRequest) -> Result<Ack> {
        let (Some(plate), Some(details)) = (
            present(request.plate.as_deref()),
            present(request.details.as_deref()),
        ) else {
            return Err(Error::validation(INCOMPLETE_DATA));
        };

        let plate = self.policy.apply(plate);
        let details = details.to_string();
        let key = plate.clone();

        let matched = self
            .connector
            .run(move |s| s.update_details(&key, &details))
            .await
            .inspect_err(|e| error!("Failed to update plate {plate}: {e}"))?;

        if !matched {
            debug!("Update for unknown plate {plate}");
            return Err(Error::not_found(plate));
        }

        info!("Updated details for plate {plate}");
        Ok(Ack::new(UPDATED))
    }

    /// Remove a plate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the plate is missing,
    /// [`Error::NotFound`] if no record matches, or a storage error.
    pub async fn delete(&self, request: &RecordRequest) -> Result<Ack> {
        let Some(plate) = present(request.plate.as_deref()) else {
            return Err(Error::validation(PLATE_MISSING));
        };

        let plate = self.policy.apply(plate);
        let key = plate.clone();

        let removed = self
            .connector
            .run(move |s| s.delete(&key))
            .await
            .inspect_err(|e| error!("Failed to delete plate {plate}: {e}"))?;

        if !removed {
            debug!("Delete for unknown plate {plate}");
            return Err(Error::not_found(plate));
        }

        info!("Removed plate {plate}");
        Ok(Ack::new(REMOVED))
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn count(&self) -> Result<i64> {
        self.connector.run(Storage::count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(policy: PlatePolicy) -> RecordService {
        RecordService::new(Connector::in_memory().unwrap(), policy)
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let svc = service(PlatePolicy::Normalize);

        let created = svc
            .create(&RecordRequest::new("ABC1234", "Red sedan"))
            .await
            .unwrap();
        assert_eq!(created.message, CREATED);
        assert!(created.id > 0);

        let records = svc.list().await.unwrap();
        let matching: Vec<_> = records.iter().filter(|r| r.plate == "ABC1234").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].details, "Red sedan");
    }

    #[tokio::test]
    async fn test_create_missing_fields() {
        let svc = service(PlatePolicy::Normalize);

        for request in [
            RecordRequest::default(),
            RecordRequest::plate("ABC1234"),
            RecordRequest::new("", "details"),
            RecordRequest::new("ABC1234", "   "),
        ] {
            let err = svc.create(&request).await.unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert_eq!(err.to_string(), INCOMPLETE_DATA);
        }
        assert_eq!(svc.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_duplicate_keeps_original() {
        let svc = service(PlatePolicy::Normalize);
        svc.create(&RecordRequest::new("ABC1234", "Red sedan"))
            .await
            .unwrap();

        let err = svc
            .create(&RecordRequest::new("ABC1234", "other"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);

        let err = svc
            .create(&RecordRequest::new("ABC1234", "other"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let records = svc.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].details, "Red sedan");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_creates_have_one_winner() {
        let svc = service(PlatePolicy::Normalize);
        let other = svc.clone();
        let first = RecordRequest::new("ABC1234", "Red sedan");
        let second = RecordRequest::new("abc1234", "Blue sedan");

        let (a, b) = tokio::join!(svc.create(&first), other.create(&second));

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| r.as_ref().is_err_and(Error::is_conflict))
                .count(),
            1
        );
        assert_eq!(svc.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_normalize_policy_blocks_case_variants() {
        let svc = service(PlatePolicy::Normalize);
        svc.create(&RecordRequest::new("abc1234", "lower"))
            .await
            .unwrap();

        let err = svc
            .create(&RecordRequest::new(" ABC1234 ", "upper"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let records = svc.list().await.unwrap();
        assert_eq!(records[0].plate, "ABC1234");
    }

    #[tokio::test]
    async fn test_exact_policy_allows_case_variants() {
        let svc = service(PlatePolicy::Exact);
        svc.create(&RecordRequest::new("abc1234", "lower"))
            .await
            .unwrap();
        svc.create(&RecordRequest::new("ABC1234", "upper"))
            .await
            .unwrap();

        assert_eq!(svc.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_changes_only_details() {
        let svc = service(PlatePolicy::Normalize);
        svc.create(&RecordRequest::new("ABC1234", "Red sedan"))
            .await
            .unwrap();

        let ack = svc
            .update(&RecordRequest::new("abc1234", "Blue sedan"))
            .await
            .unwrap();
        assert_eq!(ack.message, UPDATED);

        let records = svc.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].plate, "ABC1234");
        assert_eq!(records[0].details, "Blue sedan");
    }

    #[tokio::test]
    async fn test_update_missing_plate_is_not_found() {
        let svc = service(PlatePolicy::Normalize);

        let err = svc
            .update(&RecordRequest::new("NOPE000", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(svc.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_fields() {
        let svc = service(PlatePolicy::Normalize);
        let err = svc
            .update(&RecordRequest::plate("ABC1234"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let svc = service(PlatePolicy::Normalize);
        svc.create(&RecordRequest::new("ABC1234", "Red sedan"))
            .await
            .unwrap();
        svc.create(&RecordRequest::new("XYZ9876", "Truck"))
            .await
            .unwrap();

        let ack = svc.delete(&RecordRequest::plate("ABC1234")).await.unwrap();
        assert_eq!(ack.message, REMOVED);

        let records = svc.list().await.unwrap();
        assert!(records.iter().all(|r| r.plate != "ABC1234"));
        assert_eq!(records.len(), 1);

        let err = svc
            .delete(&RecordRequest::plate("ABC1234"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_plate_field() {
        let svc = service(PlatePolicy::Normalize);
        let err = svc.delete(&RecordRequest::default()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), PLATE_MISSING);
    }

    #[test]
    fn test_request_deserialize_missing_fields() {
        let request: RecordRequest = serde_json::from_str(r#"{"plate": "ABC1234"}"#).unwrap();
        assert_eq!(request.plate.as_deref(), Some("ABC1234"));
        assert!(request.details.is_none());
    }
}

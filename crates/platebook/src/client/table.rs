//! Table and search state for browsing plates.
//!
//! [`RecordTable`] owns a [`RecordCache`] filled once by [`RecordTable::load`]
//! and kept in step with the server by optimistic updates. Each mutating flow
//! applies its change to the cache, sends exactly one request, and rolls the
//! change back if the request fails, so a failed action never leaves the
//! table partially updated. A success status with an unreadable body counts
//! as committed and the list is reloaded instead.

use tracing::{debug, warn};

use super::{ClientError, RecordApi, RecordCache, Result};
use crate::record::{NewRecord, Record};
use crate::service::{CREATED, INCOMPLETE_DATA, REMOVED, UPDATED};

/// Banner shown when the initial listing fails.
pub const LOAD_FAILED: &str = "failed to load plates";
/// Fallback banner for a failed registration.
pub const ADD_FAILED: &str = "failed to register plate";
/// Fallback banner for a failed edit.
pub const EDIT_FAILED: &str = "failed to update details";
/// Fallback banner for a failed removal.
pub const REMOVE_FAILED: &str = "failed to remove plate";
/// Banner for a registration that never reached the server.
pub const ADD_NETWORK: &str = "network error while registering plate";
/// Banner for an edit that never reached the server.
pub const EDIT_NETWORK: &str = "network error while updating details";
/// Banner for a removal that never reached the server.
pub const REMOVE_NETWORK: &str = "network error while removing plate";

const ALREADY_LISTED: &str = "plate already registered";
const NO_EDIT: &str = "no edit in progress";

/// Banner severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The action completed.
    Success,
    /// The action failed and nothing changed.
    Error,
}

/// Outcome banner of the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    /// Whether the action succeeded.
    pub severity: Severity,
    /// Text shown to the user.
    pub message: String,
}

impl Feedback {
    fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Check if this banner reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// An open edit of one plate's details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    /// Plate being edited. Fixed for the life of the session.
    pub plate: String,
    /// Details as currently typed.
    pub details: String,
}

/// Pick the banner text for a failed request.
fn failure_message(err: &ClientError, fallback: &str, network: &str) -> String {
    match err {
        ClientError::Network(_) => network.to_string(),
        _ => err.server_message().unwrap_or(fallback).to_string(),
    }
}

/// Searchable, editable view over the record list.
#[derive(Debug)]
pub struct RecordTable<A: RecordApi> {
    api: A,
    cache: RecordCache,
    search: String,
    draft: String,
    editing: Option<EditSession>,
    feedback: Option<Feedback>,
}

impl<A: RecordApi> RecordTable<A> {
    /// Create an empty table over `api`. Call [`load`](Self::load) to fill it.
    pub fn new(api: A) -> Self {
        Self {
            api,
            cache: RecordCache::new(),
            search: String::new(),
            draft: String::new(),
            editing: None,
            feedback: None,
        }
    }

    /// Fetch the full list and replace the cache with it.
    ///
    /// On failure the cache is left as it was and an error banner is set.
    ///
    /// # Errors
    ///
    /// Returns the client error if the listing fails.
    pub async fn load(&mut self) -> Result<()> {
        match self.api.list().await {
            Ok(records) => {
                debug!("Loaded {} records", records.len());
                self.cache.replace_all(records);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load records: {e}");
                self.feedback = Some(Feedback::error(LOAD_FAILED));
                Err(e)
            }
        }
    }

    /// Discard the cache and fetch it again.
    ///
    /// # Errors
    ///
    /// Returns the client error if the listing fails.
    pub async fn refresh(&mut self) -> Result<()> {
        self.load().await
    }

    /// The API this table talks to.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Every cached record, unfiltered.
    pub fn records(&self) -> &[Record] {
        self.cache.records()
    }

    /// Set the search text. Input is uppercased as typed.
    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_uppercase();
    }

    /// Current search text.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Set the details draft for a new plate.
    pub fn set_draft(&mut self, details: impl Into<String>) {
        self.draft = details.into();
    }

    /// Current details draft.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Records whose plate contains the trimmed search text, ignoring case.
    pub fn filtered(&self) -> Vec<&Record> {
        let needle = self.search.trim().to_lowercase();
        self.cache
            .records()
            .iter()
            .filter(|r| r.plate.to_lowercase().contains(&needle))
            .collect()
    }

    /// Check if a cached plate equals the search text, ignoring case.
    pub fn exists(&self) -> bool {
        let needle = self.search.trim().to_lowercase();
        self.cache
            .records()
            .iter()
            .any(|r| r.plate.to_lowercase() == needle)
    }

    /// Check if the "register this plate" prompt replaces the empty table.
    pub fn shows_register_prompt(&self) -> bool {
        !self.search.trim().is_empty() && !self.exists() && self.filtered().is_empty()
    }

    /// Check if [`add`](Self::add) would send a request.
    pub fn can_add(&self) -> bool {
        !self.exists() && !self.search.trim().is_empty() && !self.draft.trim().is_empty()
    }

    /// Register the search text as a new plate with the draft details.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Refused`] without sending anything when
    /// [`can_add`](Self::can_add) is false, otherwise the request error.
    pub async fn add(&mut self) -> Result<()> {
        if self.exists() {
            return Err(ClientError::Refused(ALREADY_LISTED));
        }
        if !self.can_add() {
            return Err(ClientError::Refused(INCOMPLETE_DATA));
        }

        let record = NewRecord::new(self.search.trim().to_uppercase(), self.draft.clone());
        let plate = record.plate.clone();
        let undo = self.cache.insert(record.clone().into_record(None));

        match self.api.create(&record).await {
            Ok(created) => {
                self.cache.set_id(&plate, created.id);
                self.search.clear();
                self.draft.clear();
                self.feedback = Some(Feedback::success(created.message));
                Ok(())
            }
            Err(e @ ClientError::InvalidResponse(_)) => {
                warn!("Registration of {plate} accepted with an unreadable reply: {e}");
                self.search.clear();
                self.draft.clear();
                self.resync(CREATED).await;
                Ok(())
            }
            Err(e) => {
                debug!("Registration of {plate} failed: {e}");
                if let Some(undo) = undo {
                    self.cache.rollback(undo);
                }
                self.feedback = Some(Feedback::error(failure_message(
                    &e,
                    ADD_FAILED,
                    ADD_NETWORK,
                )));
                Err(e)
            }
        }
    }

    /// The cached spelling of `plate` if one matches, otherwise the input.
    fn plate_key(&self, plate: &str) -> String {
        self.cache
            .resolve(plate)
            .map_or_else(|| plate.to_string(), str::to_string)
    }

    /// Treat a change the server accepted as committed and reload the list,
    /// since the reply carried nothing usable.
    async fn resync(&mut self, message: &str) {
        self.feedback = Some(Feedback::success(message));
        // A failed reload replaces the banner with its own.
        let _ = self.load().await;
    }

    /// Open an edit of `plate`, pre-filled with its cached details.
    ///
    /// `plate` is matched against the cache ignoring case and surrounding
    /// whitespace.
    pub fn open_edit(&mut self, plate: &str) {
        let plate = self.plate_key(plate);
        let details = self
            .cache
            .get(&plate)
            .map(|r| r.details.clone())
            .unwrap_or_default();
        self.editing = Some(EditSession { plate, details });
    }

    /// The open edit, if any.
    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    /// Change the details of the open edit. No-op without one.
    pub fn set_edit_details(&mut self, details: impl Into<String>) {
        if let Some(session) = self.editing.as_mut() {
            session.details = details.into();
        }
    }

    /// Close the open edit without sending it.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Send the open edit.
    ///
    /// On success only that record's details change and the session closes.
    /// On failure the cache is rolled back and the session stays open.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Refused`] without sending anything if no edit
    /// is open or its details are blank, otherwise the request error.
    pub async fn save_edit(&mut self) -> Result<()> {
        let Some(session) = self.editing.clone() else {
            return Err(ClientError::Refused(NO_EDIT));
        };
        if session.details.trim().is_empty() {
            return Err(ClientError::Refused(INCOMPLETE_DATA));
        }

        let undo = self
            .cache
            .set_details(&session.plate, session.details.clone());

        match self.api.update(&session.plate, &session.details).await {
            Ok(ack) => {
                self.editing = None;
                self.feedback = Some(Feedback::success(ack.message));
                Ok(())
            }
            Err(e @ ClientError::InvalidResponse(_)) => {
                warn!(
                    "Edit of {} accepted with an unreadable reply: {e}",
                    session.plate
                );
                self.editing = None;
                self.resync(UPDATED).await;
                Ok(())
            }
            Err(e) => {
                debug!("Edit of {} failed: {e}", session.plate);
                if let Some(undo) = undo {
                    self.cache.rollback(undo);
                }
                self.feedback = Some(Feedback::error(failure_message(
                    &e,
                    EDIT_FAILED,
                    EDIT_NETWORK,
                )));
                Err(e)
            }
        }
    }

    /// Remove `plate`, matched against the cache like
    /// [`open_edit`](Self::open_edit).
    ///
    /// # Errors
    ///
    /// Returns the request error; the cache is rolled back first.
    pub async fn remove(&mut self, plate: &str) -> Result<()> {
        let plate = self.plate_key(plate);
        let undo = self.cache.remove(&plate);

        match self.api.delete(&plate).await {
            Ok(ack) => {
                self.feedback = Some(Feedback::success(ack.message));
                Ok(())
            }
            Err(e @ ClientError::InvalidResponse(_)) => {
                warn!("Removal of {plate} accepted with an unreadable reply: {e}");
                self.resync(REMOVED).await;
                Ok(())
            }
            Err(e) => {
                debug!("Removal of {plate} failed: {e}");
                if let Some(undo) = undo {
                    self.cache.rollback(undo);
                }
                self.feedback = Some(Feedback::error(failure_message(
                    &e,
                    REMOVE_FAILED,
                    REMOVE_NETWORK,
                )));
                Err(e)
            }
        }
    }

    /// Banner from the last action, if any.
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Clear the banner.
    pub fn dismiss_feedback(&mut self) {
        self.feedback = None;
    }
}

//! Mutation dispatcher
//!
//! Turns one edit intent into one remote write, then reloads the view
//! from the store. Local edit state goes `Pending` before the write and
//! `Confirmed` or `Failed` after it; a failed write leaves the view as it
//! was and re-enables editing on the record.

use crate::database::{
    title_key, validate_title, EditPhase, MangaDocument, MangaDraft, MangaField, Status,
};
use crate::error::{AppError, Result};
use crate::remote::{CollectionClient, RetryPolicy};
use crate::services::view::{compute_hot, recompute_hot, ReloadOutcome, ViewEngine};
use serde_json::Value;
use std::sync::Arc;

/// Yes/no gate consulted before a deletion
pub trait ConfirmationGate {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Which edit state of a record a write settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditAspect {
    Field,
    Status,
}

pub struct MutationDispatcher {
    client: Arc<dyn CollectionClient>,
    engine: ViewEngine,
    retry: RetryPolicy,
}

impl MutationDispatcher {
    pub fn new(client: Arc<dyn CollectionClient>, engine: ViewEngine, retry: RetryPolicy) -> Self {
        Self {
            client,
            engine,
            retry,
        }
    }

    pub fn engine(&self) -> &ViewEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ViewEngine {
        &mut self.engine
    }

    /// Refetch the collection into the view engine. `focus` is recorded,
    /// not used to filter; see `ViewEngine::reload`.
    pub async fn reload(&mut self, focus: Option<Status>) -> Result<ReloadOutcome> {
        let ticket = self.engine.begin_reload(focus);
        let client = self.client.as_ref();
        let fetched = self.retry.run("fetch all", move || client.fetch_all()).await;
        self.engine.complete_reload(ticket, fetched)
    }

    /// Save an inline edit. `field` is the remote field name and `input`
    /// the raw text typed by the user.
    pub async fn update_field(&mut self, id: &str, field: &str, input: &str) -> Result<()> {
        let field: MangaField = field.parse()?;
        if field == MangaField::Hot {
            return Err(AppError::Validation(
                "hot is derived from status and chapter counts and cannot be set".to_string(),
            ));
        }
        let value = field.parse_input(input)?;

        if field == MangaField::Status {
            let status: Status = input.parse()?;
            return self.update_status(id, status).await;
        }

        let record = self
            .engine
            .get(id)
            .ok_or_else(|| AppError::MangaNotFound(id.to_string()))?;
        let focus = record.status.clone();

        let mut writes = vec![(field, value.clone())];
        if field.affects_hot() {
            let mut doc = record.to_document();
            doc.set(field, &value);
            let hot = recompute_hot(record, doc.last_chapter_read, doc.released_chapters);
            writes.push((MangaField::Hot, Value::Bool(hot)));
        }

        self.commit(id, EditAspect::Field, writes, Some(focus)).await
    }

    /// Save a status change from the status picker
    pub async fn update_status(&mut self, id: &str, status: Status) -> Result<()> {
        let record = self
            .engine
            .get(id)
            .ok_or_else(|| AppError::MangaNotFound(id.to_string()))?;
        let focus = record.status.clone();
        let hot = compute_hot(&status, record.last_chapter_read, record.released_chapters);

        let writes = vec![
            (MangaField::Status, Value::String(status.into())),
            (MangaField::Hot, Value::Bool(hot)),
        ];
        self.commit(id, EditAspect::Status, writes, Some(focus)).await
    }

    /// Persist the `hot` flag for the given chapter counts
    pub async fn update_hot_flag(
        &mut self,
        id: &str,
        last_chapter_read: Option<u32>,
        released_chapters: Option<u32>,
    ) -> Result<()> {
        let record = self
            .engine
            .get(id)
            .ok_or_else(|| AppError::MangaNotFound(id.to_string()))?;
        let focus = record.status.clone();
        let hot = recompute_hot(record, last_chapter_read, released_chapters);

        self.commit(id, EditAspect::Field, vec![(MangaField::Hot, Value::Bool(hot))], Some(focus))
            .await
    }

    /// Flip "publication stopped" locally, then persist it
    pub async fn toggle_publication_stopped(&mut self, id: &str) -> Result<()> {
        let record = self
            .engine
            .get_mut(id)
            .ok_or_else(|| AppError::MangaNotFound(id.to_string()))?;
        record.is_publication_stopped = !record.is_publication_stopped;
        let stopped = record.is_publication_stopped;
        let focus = record.status.clone();

        let writes = vec![(MangaField::IsPublicationStopped, Value::Bool(stopped))];
        let result = self.commit(id, EditAspect::Field, writes, Some(focus)).await;

        // Only a rejected write is rolled back; a failed reload after a
        // confirmed write keeps the new value
        if let Some(record) = self.engine.get_mut(id) {
            if matches!(record.edit.field, EditPhase::Failed(_)) {
                record.is_publication_stopped = !stopped;
                self.engine.publish();
            }
        }
        result
    }

    /// Delete a record after confirmation. Returns whether it was deleted.
    pub async fn remove(&mut self, id: &str, gate: &dyn ConfirmationGate) -> Result<bool> {
        let record = self
            .engine
            .get(id)
            .ok_or_else(|| AppError::MangaNotFound(id.to_string()))?;

        let prompt = format!("Are you sure you want to delete '{}'?", record.title);
        if !gate.confirm(&prompt) {
            tracing::info!("Deletion of {} declined", id);
            return Ok(false);
        }

        tracing::info!("Deleting manga: {}", id);

        let client = self.client.as_ref();
        if let Err(e) = self
            .retry
            .run("delete", move || client.delete_record(id))
            .await
        {
            tracing::error!("Failed to delete {}: {}", id, e);
            self.engine.record_failure(&e);
            return Err(e);
        }

        tracing::info!("Manga deleted successfully: {}", id);

        self.reload(None).await?;
        Ok(true)
    }

    /// Add a new manga. Status is always `to_read`; titles must be unique
    /// ignoring case and surrounding whitespace.
    pub async fn create(&mut self, draft: MangaDraft) -> Result<String> {
        validate_title(&draft.title)?;
        let title = draft.title.trim().to_string();
        let key = title_key(&title);

        if self.engine.records().iter().any(|m| title_key(&m.title) == key) {
            tracing::warn!("Rejected duplicate title: {}", title);
            return Err(AppError::DuplicateTitle(title));
        }

        // Records added elsewhere since the last reload
        let client = self.client.as_ref();
        let lookup = Value::String(title.clone());
        let lookup = &lookup;
        let existing = self
            .retry
            .run("title lookup", move || {
                client.query_by_field(MangaField::Title, lookup)
            })
            .await?;
        if existing
            .values()
            .any(|doc| doc.title.as_deref().map(title_key).as_deref() == Some(key.as_str()))
        {
            tracing::warn!("Rejected duplicate title: {}", title);
            return Err(AppError::DuplicateTitle(title));
        }

        let status = Status::ToRead;
        let doc = MangaDocument {
            hot: compute_hot(&status, draft.last_chapter_read, draft.released_chapters),
            title: Some(title.clone()),
            status: Some(status),
            priority: draft.priority,
            last_chapter_read: draft.last_chapter_read,
            released_chapters: draft.released_chapters,
            is_publication_stopped: false,
        };

        tracing::info!("Creating new manga: {}", title);

        // A push is not idempotent, so it is never retried
        let id = match self.client.write_record(&doc).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Failed to create {}: {}", title, e);
                self.engine.record_failure(&e);
                return Err(e);
            }
        };

        tracing::info!("Manga created successfully: {}", id);

        self.reload(None).await?;
        Ok(id)
    }

    /// Persist the derived `hot` value wherever the stored one is stale.
    /// Returns the number of records fixed.
    pub async fn repair_hot_flags(&mut self) -> Result<usize> {
        let stale = self.engine.stale_hot_records();
        if stale.is_empty() {
            return Ok(0);
        }

        tracing::info!("Repairing {} stale hot flags", stale.len());

        let client = self.client.as_ref();
        for (id, hot) in &stale {
            let id = id.as_str();
            let hot = *hot;
            self.retry
                .run("hot repair", move || {
                    client.write_field(id, MangaField::Hot, Value::Bool(hot))
                })
                .await?;
        }

        self.reload(None).await?;
        Ok(stale.len())
    }

    /// Send `writes` in order, settle the edit phase, reload on success.
    /// When a later write fails after earlier ones landed, the view is
    /// reloaded anyway so it shows what the store now holds; the record
    /// still ends up `Failed`.
    async fn commit(
        &mut self,
        id: &str,
        aspect: EditAspect,
        writes: Vec<(MangaField, Value)>,
        focus: Option<Status>,
    ) -> Result<()> {
        self.set_phase(id, aspect, EditPhase::Pending)?;

        let client = Arc::clone(&self.client);
        let client = client.as_ref();
        for (written, (field, value)) in writes.into_iter().enumerate() {
            tracing::debug!("Writing {} on manga: {}", field, id);
            let result = self
                .retry
                .run("field write", move || {
                    client.write_field(id, field, value.clone())
                })
                .await;

            if let Err(e) = result {
                tracing::error!("Failed to write {} on {}: {}", field, id, e);
                if written > 0 {
                    if let Err(reload_error) = self.reload(focus.clone()).await {
                        tracing::warn!("Reload after partial write on {} failed: {}", id, reload_error);
                    }
                }
                if self.engine.get(id).is_some() {
                    self.set_phase(id, aspect, EditPhase::Failed(e.to_string()))?;
                }
                self.engine.record_failure(&e);
                return Err(e);
            }
        }

        self.set_phase(id, aspect, EditPhase::Confirmed)?;
        self.reload(focus).await?;
        Ok(())
    }

    fn set_phase(&mut self, id: &str, aspect: EditAspect, phase: EditPhase) -> Result<()> {
        match aspect {
            EditAspect::Field => self.engine.set_field_phase(id, phase),
            EditAspect::Status => self.engine.set_status_phase(id, phase),
        }
    }
}

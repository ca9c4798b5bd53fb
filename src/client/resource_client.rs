use crate::domain::record::{Completable, Labels, NewRecord, RecordId, Resource};

use super::api::{ClientError, ResourceApi};
use super::state::{NoticeLevel, ResourceList};

/// User-facing strings for one resource family.
pub struct Messages;

impl Messages {
    pub fn load_failed(l: &Labels) -> String { format!("Failed to load {}", l.plural) }
    pub fn added(l: &Labels) -> String { format!("{} added!", l.item_display) }
    pub fn add_failed(l: &Labels) -> String { format!("Error adding {}", l.item) }
    pub fn updated(l: &Labels) -> String { format!("{} updated!", l.item_display) }
    pub fn update_failed(l: &Labels) -> String { format!("Error updating {}", l.item) }
    pub fn deleted(l: &Labels) -> String { format!("{} deleted!", l.item_display) }
    pub fn delete_failed(l: &Labels) -> String { format!("Error deleting {}", l.item) }
    pub fn confirm_delete(l: &Labels) -> String { format!("Are you sure you want to delete this {}?", l.item) }
}

/// List state for one resource family plus the calls that keep it in step
/// with the backend. Local state is only ever rewritten from the backend's
/// answers, never from a locally computed guess.
pub struct ResourceClient<R: Resource, A> {
    api: A,
    state: ResourceList<R>,
}

impl<R: Resource, A: ResourceApi<R>> ResourceClient<R, A> {
    pub fn new(api: A) -> Self { Self { api, state: ResourceList::new() } }

    pub fn state(&self) -> &ResourceList<R> { &self.state }

    pub fn state_mut(&mut self) -> &mut ResourceList<R> { &mut self.state }

    /// Fetches the whole collection. On failure the list keeps what it had,
    /// which is nothing before the first successful load.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        match self.api.list().await {
            Ok(records) => {
                tracing::debug!(count = records.len(), kind = R::LABELS.plural, "loaded");
                self.state.replace_all(records);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = R::LABELS.plural, "load failed");
                self.state.notify(NoticeLevel::Failure, Messages::load_failed(&R::LABELS));
                Err(err)
            }
        }
    }

    /// Sends the input buffer as a new record and puts the answer first.
    pub async fn add(&mut self) -> Result<(), ClientError> {
        if self.state.input.trim().is_empty() {
            return Err(ClientError::Validation);
        }
        let input = NewRecord::new(self.state.input.clone());
        match self.api.create(&input).await {
            Ok(record) => {
                self.state.prepend(record);
                self.state.input.clear();
                self.state.notify(NoticeLevel::Success, Messages::added(&R::LABELS));
                Ok(())
            }
            Err(err) => {
                self.state.notify(NoticeLevel::Failure, Messages::add_failed(&R::LABELS));
                Err(err)
            }
        }
    }

    pub fn start_edit(&mut self, id: &RecordId) -> bool { self.state.begin_edit(id) }

    pub fn cancel_edit(&mut self) { self.state.end_edit(); }

    /// Sends the edit buffer. Edit mode ends on success or when the record
    /// turns out to be gone; on other failures it stays open.
    pub async fn commit_edit(&mut self) -> Result<(), ClientError> {
        let Some(edit) = self.state.editing().cloned() else { return Ok(()) };
        let patch = R::text_patch(edit.buffer);
        self.send_update(&edit.id, &patch).await?;
        self.state.end_edit();
        self.state.notify(NoticeLevel::Success, Messages::updated(&R::LABELS));
        Ok(())
    }

    /// Arms the delete confirmation and returns the prompt to show.
    pub fn request_delete(&mut self, id: &RecordId) -> Option<String> {
        self.state.arm_delete(id).then(|| Messages::confirm_delete(&R::LABELS))
    }

    pub fn cancel_delete(&mut self) { self.state.disarm_delete(); }

    /// Deletes the record awaiting confirmation, if any.
    pub async fn confirm_delete(&mut self) -> Result<(), ClientError> {
        let Some(id) = self.state.disarm_delete() else { return Ok(()) };
        match self.api.delete(&id).await {
            Ok(()) => {
                self.state.remove(&id);
                self.state.notify(NoticeLevel::Success, Messages::deleted(&R::LABELS));
                Ok(())
            }
            Err(err) => {
                self.state.notify(NoticeLevel::Failure, Messages::delete_failed(&R::LABELS));
                Err(err)
            }
        }
    }

    async fn send_update(&mut self, id: &RecordId, patch: &R::Patch) -> Result<(), ClientError> {
        match self.api.update(id, patch).await {
            Ok(Some(record)) => {
                self.state.apply(record);
                Ok(())
            }
            Ok(None) => {
                self.state.remove(id);
                self.state.notify(NoticeLevel::Failure, Messages::update_failed(&R::LABELS));
                Err(ClientError::Gone(id.clone()))
            }
            Err(err) => {
                self.state.notify(NoticeLevel::Failure, Messages::update_failed(&R::LABELS));
                Err(err)
            }
        }
    }
}

impl<R: Completable, A: ResourceApi<R>> ResourceClient<R, A> {
    /// Sends the record with `completed` inverted and keeps whatever the
    /// backend answers.
    pub async fn toggle(&mut self, id: &RecordId) -> Result<(), ClientError> {
        let Some(patch) = self.state.get(id).map(R::toggled) else { return Ok(()) };
        self.send_update(id, &patch).await
    }
}

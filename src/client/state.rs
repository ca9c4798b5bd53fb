//! Client-side mirror of one collection.
//!
//! Entries are kept newest first and keyed by id. Every applied server
//! response bumps the list revision and stamps the entry it wrote, so the
//! last applied response wins. Two clients editing the same collection are
//! not reconciled with each other.

use std::collections::VecDeque;

use crate::domain::record::{RecordId, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel { Success, Failure }

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry<R> {
    pub record: R,
    /// Revision of the response that last wrote this entry.
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub id: RecordId,
    pub buffer: String,
}

#[derive(Debug)]
pub struct ResourceList<R: Resource> {
    entries: Vec<Entry<R>>,
    revision: u64,
    /// Text being typed for a new record.
    pub input: String,
    editing: Option<EditState>,
    pending_delete: Option<RecordId>,
    notices: VecDeque<Notice>,
}

impl<R: Resource> Default for ResourceList<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            revision: 0,
            input: String::new(),
            editing: None,
            pending_delete: None,
            notices: VecDeque::new(),
        }
    }
}

impl<R: Resource> ResourceList<R> {
    pub fn new() -> Self { Self::default() }

    pub fn records(&self) -> impl Iterator<Item = &R> + '_ { self.entries.iter().map(|e| &e.record) }

    pub fn entries(&self) -> &[Entry<R>] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn revision(&self) -> u64 { self.revision }

    pub fn get(&self, id: &RecordId) -> Option<&R> { self.position(id).map(|i| &self.entries[i].record) }

    pub fn nth(&self, index: usize) -> Option<&R> { self.entries.get(index).map(|e| &e.record) }

    fn position(&self, id: &RecordId) -> Option<usize> { self.entries.iter().position(|e| e.record.id() == id) }

    fn stamp(&mut self, record: R) -> Entry<R> {
        self.revision += 1;
        Entry { record, revision: self.revision }
    }

    /// Replaces everything with a freshly fetched list. Duplicate ids keep
    /// their first occurrence.
    pub fn replace_all(&mut self, records: Vec<R>) {
        self.revision += 1;
        let revision = self.revision;
        self.entries.clear();
        for record in records {
            if self.position(record.id()).is_none() {
                self.entries.push(Entry { record, revision });
            }
        }
    }

    /// Puts a newly created record first. A record already present is
    /// rewritten in place instead of duplicated.
    pub fn prepend(&mut self, record: R) {
        let entry = self.stamp(record);
        match self.position(entry.record.id()) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.insert(0, entry),
        }
    }

    /// Rewrites a record in place. Returns `false`, leaving the list
    /// untouched, when the id is no longer present: a response that
    /// arrives after a delete must not bring the record back.
    pub fn apply(&mut self, record: R) -> bool {
        let Some(i) = self.position(record.id()) else { return false };
        let entry = self.stamp(record);
        self.entries[i] = entry;
        true
    }

    pub fn remove(&mut self, id: &RecordId) -> bool {
        let Some(i) = self.position(id) else { return false };
        self.entries.remove(i);
        self.revision += 1;
        if self.editing.as_ref().is_some_and(|e| &e.id == id) { self.editing = None; }
        if self.pending_delete.as_ref() == Some(id) { self.pending_delete = None; }
        true
    }

    pub fn begin_edit(&mut self, id: &RecordId) -> bool {
        let Some(buffer) = self.get(id).map(|r| r.text().to_string()) else { return false };
        self.editing = Some(EditState { id: id.clone(), buffer });
        true
    }

    pub fn editing(&self) -> Option<&EditState> { self.editing.as_ref() }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> { self.editing.as_mut().map(|e| &mut e.buffer) }

    pub fn end_edit(&mut self) -> Option<EditState> { self.editing.take() }

    pub fn arm_delete(&mut self, id: &RecordId) -> bool {
        if self.position(id).is_none() { return false; }
        self.pending_delete = Some(id.clone());
        true
    }

    pub fn pending_delete(&self) -> Option<&RecordId> { self.pending_delete.as_ref() }

    pub fn disarm_delete(&mut self) -> Option<RecordId> { self.pending_delete.take() }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push_back(Notice { level, message: message.into() });
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> { self.notices.drain(..).collect() }

    pub fn last_notice(&self) -> Option<&Notice> { self.notices.back() }
}

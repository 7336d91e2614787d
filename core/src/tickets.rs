//! Upload ticket tracking.
//!
//! An asynchronous upload yields a ticket id. Each later `check_tickets`
//! call reports a `TicketStatus`, and `UploadState::advance` folds it into
//! the ticket's state: `Uploaded` -> `Pending` -> `Complete` or `Invalid`.
//! The tracker never polls; scheduling and backoff belong to the caller.

use serde::{Deserialize, Serialize};

use crate::types::TicketStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadState {
    /// Ticket received, not yet checked.
    Uploaded,
    /// Checked at least once; still processing.
    Pending,
    Complete { photo_id: String },
    Invalid,
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Complete { .. } | UploadState::Invalid)
    }

    /// Next state given a status report for this ticket.
    ///
    /// Terminal states are sticky. `invalid` wins over `complete` if a server
    /// ever reports both, and a completion without a photo id stays pending.
    pub fn advance(self, status: &TicketStatus) -> UploadState {
        if self.is_terminal() {
            return self;
        }
        if status.invalid {
            return UploadState::Invalid;
        }
        match (status.complete, &status.photo_id) {
            (true, Some(photo_id)) => UploadState::Complete {
                photo_id: photo_id.clone(),
            },
            _ => UploadState::Pending,
        }
    }
}

/// Per-ticket state for a batch of uploads, in submission order.
#[derive(Debug, Clone, Default)]
pub struct TicketTracker {
    entries: Vec<(String, UploadState)>,
}

impl TicketTracker {
    pub fn new<I, S>(ticket_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tracker = Self::default();
        for id in ticket_ids {
            tracker.track(id);
        }
        tracker
    }

    /// Start tracking a freshly uploaded ticket. Already-tracked ids are ignored.
    pub fn track(&mut self, ticket_id: impl Into<String>) {
        let id = ticket_id.into();
        if self.state(&id).is_none() {
            self.entries.push((id, UploadState::Uploaded));
        }
    }

    pub fn state(&self, ticket_id: &str) -> Option<&UploadState> {
        self.entries
            .iter()
            .find(|(id, _)| id == ticket_id)
            .map(|(_, state)| state)
    }

    /// Ids that still need checking, in submission order.
    pub fn unsettled(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, state)| !state.is_terminal())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn is_settled(&self) -> bool {
        self.entries.iter().all(|(_, state)| state.is_terminal())
    }

    /// Fold a batch of statuses into the tracked states. Statuses for
    /// untracked ids are ignored.
    pub fn apply(&mut self, statuses: &[TicketStatus]) {
        for status in statuses {
            if let Some((_, state)) = self.entries.iter_mut().find(|(id, _)| *id == status.id) {
                let current = std::mem::replace(state, UploadState::Uploaded);
                *state = current.advance(status);
            }
        }
    }

    /// `(ticket id, photo id)` for every completed upload.
    pub fn completed(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(id, state)| match state {
                UploadState::Complete { photo_id } => Some((id.as_str(), photo_id.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! The note entity.
//!
//! Notes are serialized with camelCase field names and millisecond
//! timestamps so stored blobs stay readable across app versions.
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::{NoteColor, NoteDraft, NoteUpdate};

/// Length of the random suffix appended to the creation timestamp in ids.
const ID_SUFFIX_LEN: usize = 9;

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title, may be empty
    pub title: String,
    /// Note body, may be empty
    pub content: String,
    #[serde(default)]
    pub color: NoteColor,
    /// Tags for organization
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_favorite: bool,
    /// When the note was created (ms since epoch)
    pub created_at: i64,
    /// Last modification time (ms since epoch)
    pub updated_at: i64,
}

impl Note {
    /// Creates a new note from a draft, assigning id and timestamps
    pub fn new(draft: NoteDraft) -> Self {
        let now = now_millis();

        Note {
            id: generate_note_id(now),
            title: draft.title,
            content: draft.content,
            color: draft.color,
            tags: draft.tags,
            is_pinned: draft.is_pinned,
            is_favorite: draft.is_favorite,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges a partial update onto this note and stamps `updated_at`.
    pub fn apply(&mut self, update: NoteUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(is_pinned) = update.is_pinned {
            self.is_pinned = is_pinned;
        }
        if let Some(is_favorite) = update.is_favorite {
            self.is_favorite = is_favorite;
        }
        self.touch();
    }

    /// Sets `updated_at` to now, never earlier than `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.created_at);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// True when both title and content are blank.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Builds an id from the creation timestamp and a random lowercase suffix.
///
/// Unique within one device's collection with very high probability; not
/// globally unique.
pub fn generate_note_id(timestamp_millis: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();

    format!("{}{}", timestamp_millis, suffix)
}

//! Save logic of the note editor.
//!
//! The editor keeps the text being typed and hands it to the repository on
//! save: blank notes are never created, `#hashtags` in the content become the
//! note's tags, and the first save of a new note creates it while later saves
//! update the same note.
use log::{debug, trace};

use crate::{extract_tags, Note, NoteColor, NoteDraft, NoteUpdate, NotesRepository};

#[derive(Debug, Clone)]
pub struct EditorSession {
    /// Id of the note being edited, once it exists
    note_id: Option<String>,
    title: String,
    content: String,
    color: NoteColor,
    /// Flags for a note created by the first save
    is_pinned: bool,
    is_favorite: bool,
    /// Title, content and color as last saved or loaded
    baseline: Option<(String, String, NoteColor)>,
}

impl EditorSession {
    /// Starts editing a note that does not exist yet.
    pub fn new_note(color: NoteColor) -> Self {
        Self {
            note_id: None,
            title: String::new(),
            content: String::new(),
            color,
            is_pinned: false,
            is_favorite: false,
            baseline: None,
        }
    }

    /// Starts editing an existing note.
    pub fn open(note: &Note) -> Self {
        Self {
            note_id: Some(note.id.clone()),
            title: note.title.clone(),
            content: note.content.clone(),
            color: note.color,
            is_pinned: note.is_pinned,
            is_favorite: note.is_favorite,
            baseline: Some((note.title.clone(), note.content.clone(), note.color)),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_color(&mut self, color: NoteColor) {
        self.color = color;
    }

    /// Pins the note when the first save creates it.
    pub fn set_pinned(&mut self, is_pinned: bool) {
        self.is_pinned = is_pinned;
    }

    /// Marks the note as a favorite when the first save creates it.
    pub fn set_favorite(&mut self, is_favorite: bool) {
        self.is_favorite = is_favorite;
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        match &self.baseline {
            Some((title, content, color)) => {
                &self.title != title || &self.content != content || self.color != *color
            }
            None => !self.title.is_empty() || !self.content.is_empty(),
        }
    }

    /// Writes the current text to the repository.
    ///
    /// Returns the note id, or `None` when both title and content are blank
    /// and nothing was saved.
    pub fn save(&mut self, repo: &mut NotesRepository) -> Option<String> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();

        if title.is_empty() && content.is_empty() {
            trace!("Skipping save of a blank note");
            return None;
        }

        let tags = extract_tags(&content);

        let id = match &self.note_id {
            Some(id) => {
                debug!("Saving edits to note {}", id);
                repo.update_note(
                    id,
                    NoteUpdate {
                        title: Some(title),
                        content: Some(content),
                        color: Some(self.color),
                        tags: Some(tags),
                        ..Default::default()
                    },
                );
                id.clone()
            }
            None => {
                let id = repo.add_note(NoteDraft {
                    title,
                    content,
                    color: self.color,
                    tags,
                    is_pinned: self.is_pinned,
                    is_favorite: self.is_favorite,
                });
                debug!("Created note {} from editor", id);
                self.note_id = Some(id.clone());
                id
            }
        };

        self.baseline = Some((self.title.clone(), self.content.clone(), self.color));
        Some(id)
    }
}

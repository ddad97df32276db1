//! The notes repository: single owner of the note collection, derived tag
//! index, settings, search/filter state and selection state.
//!
//! Every mutation updates the in-memory state synchronously and then queues a
//! best-effort write on the [`PersistenceWriter`]. Reads never touch storage.
//! None of the note operations return errors; storage failures are logged by
//! the writer and unknown ids are silently ignored.
use std::{collections::HashSet, sync::Arc};

use log::{debug, error, info, trace, warn};

use crate::{
    collect_tags, matches_query, sort_notes, AppSettings, Config, KeyValueStore, Note,
    NoteColor, NoteDraft, NoteFilter, NoteUpdate, NotesError, PersistenceWriter, Result,
    RetryPolicy, SettingsUpdate, TagStat, WriterStatus, NOTES_KEY, SETTINGS_KEY,
};

pub struct NotesRepository {
    /// Backing store, read on load
    store: Arc<dyn KeyValueStore>,

    /// Serialized background writer
    writer: PersistenceWriter,

    /// Notes, newest first by convention
    notes: Vec<Note>,

    /// Distinct tags referenced by at least one note
    tags: Vec<String>,

    settings: AppSettings,
    search_query: String,
    active_filter: NoteFilter,

    selection_mode: bool,
    /// Ordered set of selected note ids
    selected_note_ids: Vec<String>,

    is_loading: bool,
}

impl NotesRepository {
    /// Creates an empty repository over `store`, spawning its writer task.
    ///
    /// Must be called from within a Tokio runtime. Call [`load`](Self::load)
    /// before accepting mutations.
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        let writer = PersistenceWriter::spawn(Arc::clone(&store), RetryPolicy::from_config(config));

        Self {
            store,
            writer,
            notes: Vec::new(),
            tags: Vec::new(),
            settings: AppSettings::default(),
            search_query: String::new(),
            active_filter: NoteFilter::All,
            selection_mode: false,
            selected_note_ids: Vec::new(),
            is_loading: false,
        }
    }

    /// Loads notes and settings from storage, replacing in-memory state.
    ///
    /// Missing or malformed blobs fall back to an empty collection and default
    /// settings; this never fails. Returns the number of notes loaded.
    pub async fn load(&mut self) -> usize {
        info!("Loading notes and settings from storage");
        self.is_loading = true;

        let (notes_blob, settings_blob) =
            tokio::join!(self.store.get(NOTES_KEY), self.store.get(SETTINGS_KEY));

        let notes = match notes_blob {
            Ok(Some(raw)) => parse_notes(&raw),
            Ok(None) => {
                debug!("No stored notes found");
                Vec::new()
            }
            Err(e) => {
                error!("Failed to read stored notes: {}", e);
                Vec::new()
            }
        };

        let settings = match settings_blob {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Stored settings are malformed, using defaults: {}", e);
                AppSettings::default()
            }),
            Ok(None) => AppSettings::default(),
            Err(e) => {
                error!("Failed to read stored settings: {}", e);
                AppSettings::default()
            }
        };

        self.tags = collect_tags(&notes);
        self.notes = notes;
        self.settings = settings;
        self.is_loading = false;

        info!(
            "Loaded {} notes with {} distinct tags",
            self.notes.len(),
            self.tags.len()
        );
        self.notes.len()
    }

    /// Creates a note from `draft`, prepends it and returns its id.
    pub fn add_note(&mut self, draft: NoteDraft) -> String {
        let note = Note::new(draft);
        let id = note.id.clone();
        info!("Adding note: {}", id);

        for tag in &note.tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }

        self.notes.insert(0, note);
        self.persist_notes();
        id
    }

    /// Merges `update` onto the note with `id`. Returns false if no such note.
    pub fn update_note(&mut self, id: &str, update: NoteUpdate) -> bool {
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            debug!("Ignoring update for unknown note: {}", id);
            return false;
        };

        let tags_changed = update.tags.is_some();
        note.apply(update);
        debug!("Updated note: {}", id);

        if tags_changed {
            self.rebuild_tags();
        }
        self.persist_notes();
        true
    }

    /// Removes the note with `id`. Returns false if no such note.
    pub fn delete_note(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);

        if self.notes.len() == before {
            debug!("Ignoring delete for unknown note: {}", id);
            return false;
        }

        info!("Deleted note: {}", id);
        self.rebuild_tags();
        self.persist_notes();
        true
    }

    pub fn toggle_pin(&mut self, id: &str) -> bool {
        let Some(is_pinned) = self.note(id).map(|note| note.is_pinned) else {
            return false;
        };
        self.update_note(
            id,
            NoteUpdate {
                is_pinned: Some(!is_pinned),
                ..Default::default()
            },
        )
    }

    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let Some(is_favorite) = self.note(id).map(|note| note.is_favorite) else {
            return false;
        };
        self.update_note(
            id,
            NoteUpdate {
                is_favorite: Some(!is_favorite),
                ..Default::default()
            },
        )
    }

    /// Appends `tag` to a note unless the note is missing or already has it.
    pub fn add_tag_to_note(&mut self, id: &str, tag: &str) -> bool {
        let Some(note) = self.note(id) else {
            return false;
        };
        if note.has_tag(tag) {
            return false;
        }

        let mut tags = note.tags.clone();
        tags.push(tag.to_string());
        self.update_note(
            id,
            NoteUpdate {
                tags: Some(tags),
                ..Default::default()
            },
        )
    }

    pub fn remove_tag_from_note(&mut self, id: &str, tag: &str) -> bool {
        let Some(note) = self.note(id) else {
            return false;
        };

        let tags: Vec<String> = note.tags.iter().filter(|t| *t != tag).cloned().collect();
        self.update_note(
            id,
            NoteUpdate {
                tags: Some(tags),
                ..Default::default()
            },
        )
    }

    /// Strips `tag` from every note carrying it, in a single write.
    ///
    /// Returns the number of notes changed.
    pub fn remove_tag(&mut self, tag: &str) -> usize {
        let mut changed = 0;
        for note in self.notes.iter_mut().filter(|note| note.has_tag(tag)) {
            note.tags.retain(|t| t != tag);
            note.touch();
            changed += 1;
        }

        self.tags.retain(|t| t != tag);
        if changed > 0 {
            info!("Removed tag '{}' from {} notes", tag, changed);
            self.persist_notes();
        }
        changed
    }

    pub fn toggle_selection_mode(&mut self) {
        self.selection_mode = !self.selection_mode;
        if !self.selection_mode {
            self.selected_note_ids.clear();
        }
        debug!("Selection mode: {}", self.selection_mode);
    }

    /// Adds `id` to the selection if absent, removes it if present.
    pub fn toggle_note_selection(&mut self, id: &str) {
        if let Some(pos) = self.selected_note_ids.iter().position(|s| s == id) {
            self.selected_note_ids.remove(pos);
        } else {
            self.selected_note_ids.push(id.to_string());
        }
        trace!("{} notes selected", self.selected_note_ids.len());
    }

    /// Selects every note in the collection, regardless of the active filter.
    pub fn select_all_notes(&mut self) {
        self.selected_note_ids = self.notes.iter().map(|note| note.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected_note_ids.clear();
        self.selection_mode = false;
    }

    /// Deletes every selected note. Returns the number removed.
    pub fn delete_selected(&mut self) -> usize {
        if self.selected_note_ids.is_empty() {
            return 0;
        }

        let selected: HashSet<&str> = self.selected_note_ids.iter().map(String::as_str).collect();
        let before = self.notes.len();
        self.notes.retain(|note| !selected.contains(note.id.as_str()));
        let removed = before - self.notes.len();

        info!("Deleted {} selected notes", removed);
        self.rebuild_tags();
        self.persist_notes();
        self.clear_selection();
        removed
    }

    pub fn pin_selected(&mut self) -> usize {
        self.update_selected(|note| note.is_pinned = true)
    }

    pub fn unpin_selected(&mut self) -> usize {
        self.update_selected(|note| note.is_pinned = false)
    }

    pub fn favorite_selected(&mut self) -> usize {
        self.update_selected(|note| note.is_favorite = true)
    }

    pub fn unfavorite_selected(&mut self) -> usize {
        self.update_selected(|note| note.is_favorite = false)
    }

    pub fn change_selected_color(&mut self, color: NoteColor) -> usize {
        self.update_selected(|note| note.color = color)
    }

    // Applies `change` to every selected note, persists once, then leaves selection mode
    fn update_selected(&mut self, change: impl Fn(&mut Note)) -> usize {
        if self.selected_note_ids.is_empty() {
            return 0;
        }

        let selected: HashSet<&str> = self.selected_note_ids.iter().map(String::as_str).collect();
        let mut changed = 0;
        for note in self
            .notes
            .iter_mut()
            .filter(|note| selected.contains(note.id.as_str()))
        {
            note.touch();
            change(note);
            changed += 1;
        }

        info!("Updated {} selected notes", changed);
        self.persist_notes();
        self.clear_selection();
        changed
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_active_filter(&mut self, filter: NoteFilter) {
        self.active_filter = filter;
    }

    /// The notes to display: filtered, searched, pinned first, then sorted.
    pub fn get_filtered_notes(&self) -> Vec<Note> {
        let searching = !self.search_query.trim().is_empty();
        let query = self.search_query.to_lowercase();

        let filtered: Vec<Note> = self
            .notes
            .iter()
            .filter(|note| match self.active_filter {
                NoteFilter::All => true,
                NoteFilter::Pinned => note.is_pinned,
                NoteFilter::Favorites => note.is_favorite,
            })
            .filter(|note| !searching || matches_query(note, &query))
            .cloned()
            .collect();

        trace!(
            "{} of {} notes match filter {:?} and query '{}'",
            filtered.len(),
            self.notes.len(),
            self.active_filter,
            query
        );
        sort_notes(filtered, self.settings.sort_option)
    }

    /// Notes carrying exactly `tag`, pinned first, then sorted.
    pub fn get_notes_by_tag(&self, tag: &str) -> Vec<Note> {
        let tagged = self
            .notes
            .iter()
            .filter(|note| note.has_tag(tag))
            .cloned()
            .collect();

        sort_notes(tagged, self.settings.sort_option)
    }

    /// How many notes reference each tag, most used first.
    pub fn tag_stats(&self) -> Vec<TagStat> {
        let mut stats: Vec<TagStat> = self
            .tags
            .iter()
            .map(|tag| TagStat {
                tag: tag.clone(),
                count: self.notes.iter().filter(|note| note.has_tag(tag)).count(),
            })
            .collect();

        stats.sort_by(|a, b| b.count.cmp(&a.count));
        stats
    }

    /// Removes every note and deletes the persisted notes key.
    pub fn clear_all_notes(&mut self) {
        info!("Clearing all {} notes", self.notes.len());
        self.notes.clear();
        self.tags.clear();
        self.writer.remove(NOTES_KEY);
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) {
        self.settings.merge(update);
        debug!("Settings updated: {:?}", self.settings);

        match serde_json::to_string(&self.settings) {
            Ok(json) => self.writer.set(SETTINGS_KEY, json),
            Err(e) => error!("Failed to serialize settings: {}", e),
        }
    }

    /// Waits for every queued write to reach storage.
    pub async fn flush(&self) -> Result<()> {
        self.writer.flush().await
    }

    /// Drains pending writes and stops the writer.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down notes repository");
        self.writer.shutdown().await
    }

    pub fn writer_status(&self) -> WriterStatus {
        self.writer.status()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn active_filter(&self) -> NoteFilter {
        self.active_filter
    }

    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    pub fn selected_note_ids(&self) -> &[String] {
        &self.selected_note_ids
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_note_ids.iter().any(|s| s == id)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn rebuild_tags(&mut self) {
        self.tags = collect_tags(&self.notes);
        trace!("Tag index rebuilt: {} tags", self.tags.len());
    }

    fn persist_notes(&self) {
        match serde_json::to_string(&self.notes) {
            Ok(json) => self.writer.set(NOTES_KEY, json),
            Err(e) => error!("Failed to serialize notes: {}", e),
        }
    }
}

// Decodes the stored notes array, skipping entries that cannot be read
fn parse_notes(raw: &str) -> Vec<Note> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Stored notes are malformed, starting empty: {}", e);
            return Vec::new();
        }
    };

    let mut notes = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for entry in entries {
        match serde_json::from_value::<Note>(entry) {
            Ok(mut note) if !note.id.is_empty() => {
                note.updated_at = note.updated_at.max(note.created_at);
                notes.push(note);
            }
            Ok(_) => {
                skipped += 1;
                warn!("Skipping stored note with an empty id");
            }
            Err(e) => {
                skipped += 1;
                warn!("Skipping unreadable stored note: {}", NotesError::from(e));
            }
        }
    }

    if skipped > 0 {
        error!("Encountered {} unreadable notes while loading", skipped);
    }
    notes
}

//! Core data structures for the pocketnotes application.
//!
//! This module contains the closed enumerations used for colors, sorting,
//! filtering and display settings, the request types accepted by the
//! repository, and the CLI command definitions.
use std::fmt;

use clap::{Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::NotesError;

/// A specialized Result type for pocketnotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// The fixed palette a note can be painted with.
///
/// Serialized as the lowercase key (`"default"`, `"red"`, ...). Keys that are
/// not part of the palette deserialize to [`NoteColor::Default`] so a single
/// unknown color never makes a stored note unreadable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum NoteColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Indigo,
    Purple,
    Pink,
    Gray,
}

impl NoteColor {
    /// Every palette entry, in picker order.
    pub const ALL: [NoteColor; 11] = [
        NoteColor::Default,
        NoteColor::Red,
        NoteColor::Orange,
        NoteColor::Yellow,
        NoteColor::Green,
        NoteColor::Teal,
        NoteColor::Blue,
        NoteColor::Indigo,
        NoteColor::Purple,
        NoteColor::Pink,
        NoteColor::Gray,
    ];

    /// The stable storage key for this color.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteColor::Default => "default",
            NoteColor::Red => "red",
            NoteColor::Orange => "orange",
            NoteColor::Yellow => "yellow",
            NoteColor::Green => "green",
            NoteColor::Teal => "teal",
            NoteColor::Blue => "blue",
            NoteColor::Indigo => "indigo",
            NoteColor::Purple => "purple",
            NoteColor::Pink => "pink",
            NoteColor::Gray => "gray",
        }
    }

    /// Looks up a color by its storage key (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(key))
    }
}

impl From<String> for NoteColor {
    fn from(key: String) -> Self {
        Self::from_key(&key).unwrap_or_default()
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering applied within the pinned and unpinned groups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    /// Most recently updated first
    #[default]
    Date,
    /// Ascending, locale-aware title order
    Title,
    /// Ascending color key order
    Color,
    /// Reserved; keeps collection order
    Custom,
}

/// How the note list is laid out by the UI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    Auto,
}

/// The quick filter chip currently applied to the note list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum NoteFilter {
    #[default]
    All,
    Pinned,
    Favorites,
}

/// Fields supplied by the caller when creating a note.
///
/// Id and timestamps are assigned by the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_favorite: bool,
}

/// A partial note update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<NoteColor>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_favorite: Option<bool>,
}

/// A partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub view_mode: Option<ViewMode>,
    pub sort_option: Option<SortOption>,
    pub default_note_color: Option<NoteColor>,
    pub haptics_enabled: Option<bool>,
    pub theme: Option<ThemeMode>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.view_mode.is_none()
            && self.sort_option.is_none()
            && self.default_note_color.is_none()
            && self.haptics_enabled.is_none()
            && self.theme.is_none()
    }
}

/// Usage count of a single tag across the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagStat {
    pub tag: String,
    pub count: usize,
}

/// Operations that can be applied to every selected note at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BulkAction {
    Delete,
    Pin,
    Unpin,
    Favorite,
    Unfavorite,
    Color,
}

/// Available subcommands for the pocketnotes application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    Add {
        /// Title of the note
        #[clap(short = 'T', long, default_value = "")]
        title: String,

        /// Content of the note; #hashtags become tags
        #[clap(short, long, default_value = "")]
        content: String,

        /// Note color (defaults to the configured default color)
        #[clap(long, value_enum)]
        color: Option<NoteColor>,

        /// Pin the note
        #[clap(short, long)]
        pin: bool,

        /// Mark the note as favorite
        #[clap(short, long)]
        favorite: bool,
    },

    /// List notes, pinned first, in the configured sort order
    List {
        /// Quick filter to apply
        #[clap(short, long, value_enum, default_value_t = NoteFilter::All)]
        filter: NoteFilter,

        /// Case-insensitive text to look for in title, content and tags
        #[clap(short, long)]
        search: Option<String>,

        /// Only show notes carrying this tag
        #[clap(short, long)]
        tag: Option<String>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// View a note by ID
    Show {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// New color for the note
        #[clap(long, value_enum)]
        color: Option<NoteColor>,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,
    },

    /// Toggle the pinned flag of a note
    Pin {
        /// ID of the note
        id: String,
    },

    /// Toggle the favorite flag of a note
    Favorite {
        /// ID of the note
        id: String,
    },

    /// Tag operations (statistics, add, remove)
    Tags {
        /// ID of the note to modify
        #[clap(long)]
        note: Option<String>,

        /// Tag to add to the note
        #[clap(short, long, requires = "note")]
        add: Option<String>,

        /// Tag to remove (from the note, or from every note without --note)
        #[clap(short, long)]
        remove: Option<String>,
    },

    /// Apply one action to several notes at once
    Bulk {
        /// Action to apply
        #[clap(value_enum)]
        action: BulkAction,

        /// IDs of the notes to select (comma-separated)
        #[clap(short, long)]
        ids: Option<String>,

        /// Select every note instead of listing IDs
        #[clap(long)]
        all: bool,

        /// Color for the `color` action
        #[clap(long, value_enum)]
        color: Option<NoteColor>,
    },

    /// Show or change application settings
    Settings {
        #[clap(long, value_enum)]
        view: Option<ViewMode>,

        #[clap(long, value_enum)]
        sort: Option<SortOption>,

        #[clap(long, value_enum)]
        default_color: Option<NoteColor>,

        #[clap(long)]
        haptics: Option<bool>,

        #[clap(long, value_enum)]
        theme: Option<ThemeMode>,
    },

    /// Delete every note
    Clear {
        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

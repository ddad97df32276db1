//! CLI application handler
//!
//! Translates parsed commands into repository operations and renders the
//! results on the terminal.
use std::io::{stdin, stdout, Write};

use chrono::{DateTime, Local, Utc};
use console::{style, Color, Style};
use log::{debug, info};

use crate::{
    normalize_tag, parse_list, BulkAction, Commands, EditorSession, Note, NoteColor, NoteFilter,
    NotesError, NotesRepository, Result, SettingsUpdate,
};

/// CLI Application handler - processes CLI commands against a NotesRepository
pub struct App {
    /// The loaded notes repository
    repository: NotesRepository,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application around an already loaded repository
    pub fn new(repository: NotesRepository, verbose: bool) -> Self {
        Self {
            repository,
            verbose,
        }
    }

    pub fn repository(&self) -> &NotesRepository {
        &self.repository
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Add {
                title,
                content,
                color,
                pin,
                favorite,
            } => self.create_note(title, content, color, pin, favorite),

            Commands::List {
                filter,
                search,
                tag,
                json,
            } => self.list_notes(filter, search, tag, json),

            Commands::Show { id, json } => self.show_note(&id, json),

            Commands::Edit {
                id,
                title,
                content,
                color,
            } => self.edit_note(&id, title, content, color),

            Commands::Delete { id } => {
                self.require_note(&id)?;
                self.repository.delete_note(&id);
                println!("Deleted note {}", id);
                Ok(())
            }

            Commands::Pin { id } => {
                if !self.repository.toggle_pin(&id) {
                    return Err(NotesError::NoteNotFound { id });
                }
                let pinned = self.require_note(&id)?.is_pinned;
                println!("{} note {}", if pinned { "Pinned" } else { "Unpinned" }, id);
                Ok(())
            }

            Commands::Favorite { id } => {
                if !self.repository.toggle_favorite(&id) {
                    return Err(NotesError::NoteNotFound { id });
                }
                let favorite = self.require_note(&id)?.is_favorite;
                println!(
                    "{} note {}",
                    if favorite { "Favorited" } else { "Unfavorited" },
                    id
                );
                Ok(())
            }

            Commands::Tags { note, add, remove } => self.handle_tags(note, add, remove),

            Commands::Bulk {
                action,
                ids,
                all,
                color,
            } => self.handle_bulk(action, ids, all, color),

            Commands::Settings {
                view,
                sort,
                default_color,
                haptics,
                theme,
            } => {
                let update = SettingsUpdate {
                    view_mode: view,
                    sort_option: sort,
                    default_note_color: default_color,
                    haptics_enabled: haptics,
                    theme,
                };
                if !update.is_empty() {
                    self.repository.update_settings(update);
                }
                println!("{}", serde_json::to_string_pretty(self.repository.settings())?);
                Ok(())
            }

            Commands::Clear { force } => self.handle_clear(force),
        }
    }

    /// Waits for pending writes and stops the repository writer
    pub async fn shutdown(&mut self) -> Result<()> {
        self.repository.flush().await?;
        let status = self.repository.writer_status();
        if status.writes_failed > 0 {
            eprintln!(
                "Warning: {} change(s) could not be saved: {}",
                status.writes_failed,
                status.last_error.unwrap_or_default()
            );
        }
        self.repository.shutdown().await
    }

    fn require_note(&self, id: &str) -> Result<&Note> {
        self.repository
            .note(id)
            .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })
    }

    fn create_note(
        &mut self,
        title: String,
        content: String,
        color: Option<NoteColor>,
        pin: bool,
        favorite: bool,
    ) -> Result<()> {
        let color = color.unwrap_or(self.repository.settings().default_note_color);
        let mut session = EditorSession::new_note(color);
        session.set_title(title);
        session.set_content(content);
        session.set_pinned(pin);
        session.set_favorite(favorite);

        let id = session
            .save(&mut self.repository)
            .ok_or_else(|| NotesError::ApplicationError {
                message: "Nothing to save: title and content are both empty".to_string(),
            })?;

        println!("Note created with ID: {}", id);
        Ok(())
    }

    fn edit_note(
        &mut self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
        color: Option<NoteColor>,
    ) -> Result<()> {
        let mut session = EditorSession::open(self.require_note(id)?);

        if let Some(title) = title {
            session.set_title(title);
        }
        if let Some(content) = content {
            session.set_content(content);
        }
        if let Some(color) = color {
            session.set_color(color);
        }

        if !session.has_unsaved_changes() {
            println!("No changes to note {}", id);
            return Ok(());
        }

        match session.save(&mut self.repository) {
            Some(_) => println!("Updated note {}", id),
            None => println!("Note {} left unchanged: title and content would both be empty", id),
        }
        Ok(())
    }

    /// List notes according to provided filters and options
    fn list_notes(
        &mut self,
        filter: NoteFilter,
        search: Option<String>,
        tag: Option<String>,
        json: bool,
    ) -> Result<()> {
        let notes = match tag.as_deref().and_then(normalize_tag) {
            Some(tag) => {
                debug!("Listing notes tagged '{}'", tag);
                self.repository.get_notes_by_tag(&tag)
            }
            None => {
                self.repository.set_active_filter(filter);
                self.repository.set_search_query(search.unwrap_or_default());
                self.repository.get_filtered_notes()
            }
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        if notes.is_empty() {
            println!("No notes found");
            return Ok(());
        }

        for note in &notes {
            self.display_summary(note);
        }
        if self.verbose {
            println!(
                "\n{} of {} notes shown",
                notes.len(),
                self.repository.notes().len()
            );
        }
        Ok(())
    }

    fn show_note(&self, id: &str, json: bool) -> Result<()> {
        let note = self.require_note(id)?;

        if json {
            println!("{}", serde_json::to_string_pretty(note)?);
            return Ok(());
        }

        self.display_summary(note);
        println!("  color:   {}", note.color);
        println!("  created: {}", format_timestamp(note.created_at));
        println!("  updated: {}", format_timestamp(note.updated_at));
        if !note.content.is_empty() {
            println!();
            println!("{}", note.content);
        }
        Ok(())
    }

    fn handle_tags(
        &mut self,
        note: Option<String>,
        add: Option<String>,
        remove: Option<String>,
    ) -> Result<()> {
        let add = add.as_deref().and_then(normalize_tag);
        let remove = remove.as_deref().and_then(normalize_tag);

        match (note, add, remove) {
            (Some(id), add, remove) if add.is_some() || remove.is_some() => {
                self.require_note(&id)?;
                if let Some(tag) = add {
                    if self.repository.add_tag_to_note(&id, &tag) {
                        println!("Added #{} to {}", tag, id);
                    }
                }
                if let Some(tag) = remove {
                    self.repository.remove_tag_from_note(&id, &tag);
                    println!("Removed #{} from {}", tag, id);
                }
            }
            (None, _, Some(tag)) => {
                let changed = self.repository.remove_tag(&tag);
                println!("Removed #{} from {} notes", tag, changed);
            }
            (Some(id), _, _) => {
                let note = self.require_note(&id)?;
                for tag in &note.tags {
                    println!("#{}", tag);
                }
            }
            (None, _, None) => {
                let stats = self.repository.tag_stats();
                if stats.is_empty() {
                    println!("No tags yet");
                }
                for stat in stats {
                    println!(
                        "{:<24} {} {}",
                        style(format!("#{}", stat.tag)).bold(),
                        stat.count,
                        if stat.count == 1 { "note" } else { "notes" }
                    );
                }
            }
        }
        Ok(())
    }

    fn handle_bulk(
        &mut self,
        action: BulkAction,
        ids: Option<String>,
        all: bool,
        color: Option<NoteColor>,
    ) -> Result<()> {
        if action == BulkAction::Color && color.is_none() {
            return Err(NotesError::ApplicationError {
                message: "--color is required for the color action".to_string(),
            });
        }

        self.repository.toggle_selection_mode();
        if all {
            self.repository.select_all_notes();
        } else {
            for id in parse_list(ids) {
                if !self.repository.is_selected(&id) {
                    self.repository.toggle_note_selection(&id);
                }
            }
        }

        if self.repository.selected_note_ids().is_empty() {
            self.repository.clear_selection();
            return Err(NotesError::ApplicationError {
                message: "No notes selected: pass --ids or --all".to_string(),
            });
        }

        info!(
            "Applying {:?} to {} selected notes",
            action,
            self.repository.selected_note_ids().len()
        );
        let changed = match action {
            BulkAction::Delete => self.repository.delete_selected(),
            BulkAction::Pin => self.repository.pin_selected(),
            BulkAction::Unpin => self.repository.unpin_selected(),
            BulkAction::Favorite => self.repository.favorite_selected(),
            BulkAction::Unfavorite => self.repository.unfavorite_selected(),
            BulkAction::Color => self
                .repository
                .change_selected_color(color.unwrap_or_default()),
        };

        println!("{:?}: {} note(s) affected", action, changed);
        Ok(())
    }

    fn handle_clear(&mut self, force: bool) -> Result<()> {
        let count = self.repository.notes().len();

        if !force {
            print!(
                "Are you sure you want to delete all {} notes? This cannot be undone. [y/N] ",
                count
            );
            stdout().flush()?;

            let mut answer = String::new();
            stdin().read_line(&mut answer)?;
            if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                println!("Aborted");
                return Ok(());
            }
        }

        self.repository.clear_all_notes();
        println!("Deleted {} notes", count);
        Ok(())
    }

    fn display_summary(&self, note: &Note) {
        let title = if note.title.is_empty() {
            "(untitled)"
        } else {
            note.title.as_str()
        };

        let mut markers = String::new();
        if note.is_pinned {
            markers.push_str("[pinned] ");
        }
        if note.is_favorite {
            markers.push_str("[fav] ");
        }

        println!(
            "{} {}{}",
            style(&note.id).dim(),
            style(markers).yellow(),
            color_style(note.color).apply_to(title).bold()
        );

        if !note.tags.is_empty() {
            let tags: Vec<String> = note.tags.iter().map(|t| format!("#{}", t)).collect();
            println!("    {}", style(tags.join(" ")).cyan());
        }
    }
}

fn color_style(color: NoteColor) -> Style {
    let fg = match color {
        NoteColor::Default => return Style::new(),
        NoteColor::Red => Color::Red,
        NoteColor::Orange => Color::Color256(208),
        NoteColor::Yellow => Color::Yellow,
        NoteColor::Green => Color::Green,
        NoteColor::Teal => Color::Cyan,
        NoteColor::Blue => Color::Blue,
        NoteColor::Indigo => Color::Color256(63),
        NoteColor::Purple => Color::Magenta,
        NoteColor::Pink => Color::Color256(205),
        NoteColor::Gray => Color::Color256(245),
    };
    Style::new().fg(fg)
}

fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%b %-d, %Y at %-I:%M %p")
                .to_string()
        })
        .unwrap_or_else(|| "unknown time".to_string())
}

//! Integration tests for the notes repository
//!
//! These tests drive the public API end to end:
//! - creation, filtering and ordering scenarios
//! - bulk selection operations
//! - persistence round-trips through memory and file stores

use std::sync::Arc;

use pocketnotes::{
    collect_tags, AppSettings, Config, EditorSession, FileStore, KeyValueStore, MemoryStore,
    Note, NoteColor, NoteDraft, NoteFilter, NoteUpdate, NotesRepository, SettingsUpdate,
    SortOption, ThemeMode, NOTES_KEY, SETTINGS_KEY,
};
use tempfile::TempDir;

/// Helper to create a repository over a fresh in-memory store
fn memory_repository() -> (NotesRepository, MemoryStore) {
    let store = MemoryStore::new();
    let repo = NotesRepository::new(Arc::new(store.clone()), &Config::default());
    (repo, store)
}

/// Helper to seed a store with a notes array and load it
async fn seeded_repository(notes: serde_json::Value) -> NotesRepository {
    let store = MemoryStore::new();
    store.set(NOTES_KEY, &notes.to_string()).await.unwrap();

    let mut repo = NotesRepository::new(Arc::new(store), &Config::default());
    repo.load().await;
    repo
}

fn stored_note(id: &str, title: &str, updated_at: i64, is_pinned: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "content": "",
        "color": "default",
        "tags": [],
        "isPinned": is_pinned,
        "isFavorite": false,
        "createdAt": 1,
        "updatedAt": updated_at,
    })
}

fn ids(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|n| n.id.as_str()).collect()
}

#[tokio::test]
async fn test_scenario_add_note_to_empty_collection() {
    let (mut repo, _store) = memory_repository();
    repo.load().await;

    let id = repo.add_note(NoteDraft {
        title: "Groceries".to_string(),
        content: "Buy milk #shopping".to_string(),
        tags: vec![],
        is_pinned: false,
        is_favorite: false,
        color: NoteColor::Default,
    });

    let filtered = repo.get_filtered_notes();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, id);
    assert_eq!(filtered[0].title, "Groceries");
    // The repository stores the tags it is given; extraction is the editor's job
    assert!(repo.tags().is_empty());
}

#[tokio::test]
async fn test_scenario_editor_extracts_tags_before_adding() {
    let (mut repo, _store) = memory_repository();

    let mut session = EditorSession::new_note(repo.settings().default_note_color);
    session.set_title("Groceries");
    session.set_content("Buy milk #shopping");
    session.save(&mut repo).unwrap();

    assert_eq!(repo.tags(), &["shopping".to_string()]);
}

#[tokio::test]
async fn test_scenario_pinned_first_regardless_of_date() {
    let repo = seeded_repository(serde_json::json!([
        stored_note("A", "A", 100, false),
        stored_note("B", "B", 200, true),
    ]))
    .await;

    assert_eq!(repo.settings().sort_option, SortOption::Date);
    assert_eq!(ids(&repo.get_filtered_notes()), vec!["B", "A"]);

    let repo = seeded_repository(serde_json::json!([
        stored_note("A", "A", 300, false),
        stored_note("B", "B", 200, true),
    ]))
    .await;
    assert_eq!(ids(&repo.get_filtered_notes()), vec!["B", "A"]);
}

#[tokio::test]
async fn test_scenario_title_sort_is_locale_aware() {
    let mut repo = seeded_repository(serde_json::json!([
        stored_note("1", "Banana", 1, false),
        stored_note("2", "apple", 2, false),
    ]))
    .await;

    repo.update_settings(SettingsUpdate {
        sort_option: Some(SortOption::Title),
        ..Default::default()
    });

    let titles: Vec<String> = repo
        .get_filtered_notes()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["apple", "Banana"]);
}

#[tokio::test]
async fn test_scenario_delete_selected_with_missing_id() {
    let (mut repo, _store) = memory_repository();
    let other = repo.add_note(NoteDraft {
        title: "other".to_string(),
        ..Default::default()
    });
    let id1 = repo.add_note(NoteDraft {
        title: "one".to_string(),
        ..Default::default()
    });

    repo.toggle_selection_mode();
    repo.toggle_note_selection(&id1);
    repo.toggle_note_selection("id2-does-not-exist");
    repo.delete_selected();

    assert_eq!(ids(repo.notes()), vec![other.as_str()]);
    assert!(repo.selected_note_ids().is_empty());
    assert!(!repo.selection_mode());
}

#[tokio::test]
async fn test_scenario_search_matches_content_only() {
    let (mut repo, _store) = memory_repository();
    repo.add_note(NoteDraft {
        title: "Shopping list".to_string(),
        content: "Eggs and MILK".to_string(),
        tags: vec!["errands".to_string()],
        ..Default::default()
    });
    repo.add_note(NoteDraft {
        title: "Work".to_string(),
        content: "Quarterly report".to_string(),
        ..Default::default()
    });

    repo.set_search_query("milk");
    let found = repo.get_filtered_notes();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Shopping list");
}

#[tokio::test]
async fn test_filtered_view_groups_pinned_and_sorts_each_group() {
    let repo = seeded_repository(serde_json::json!([
        stored_note("u1", "u1", 10, false),
        stored_note("p1", "p1", 20, true),
        stored_note("u2", "u2", 30, false),
        stored_note("p2", "p2", 5, true),
    ]))
    .await;

    assert_eq!(repo.active_filter(), NoteFilter::All);
    assert_eq!(ids(&repo.get_filtered_notes()), vec!["p1", "p2", "u2", "u1"]);
}

#[tokio::test]
async fn test_tag_index_matches_notes_after_every_mutation() {
    let (mut repo, _store) = memory_repository();
    let check = |repo: &NotesRepository| {
        let mut expected = collect_tags(repo.notes());
        let mut actual = repo.tags().to_vec();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);
    };

    let mut created = Vec::new();
    for (i, tags) in [vec!["a"], vec!["a", "b"], vec!["c"], vec![]].iter().enumerate() {
        created.push(repo.add_note(NoteDraft {
            title: format!("note {}", i),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }));
        check(&repo);
    }

    repo.update_note(
        &created[1],
        NoteUpdate {
            tags: Some(vec!["d".to_string()]),
            ..Default::default()
        },
    );
    check(&repo);
    repo.update_note(
        &created[2],
        NoteUpdate {
            title: Some("retitled".to_string()),
            ..Default::default()
        },
    );
    check(&repo);
    repo.delete_note(&created[0]);
    check(&repo);
    repo.delete_note("unknown");
    check(&repo);

    assert!(!repo.tags().contains(&"a".to_string()));
    assert!(!repo.tags().contains(&"b".to_string()));
}

#[tokio::test]
async fn test_pin_selected_twice_matches_once() {
    let (mut repo, _store) = memory_repository();
    let a = repo.add_note(NoteDraft {
        title: "a".to_string(),
        ..Default::default()
    });
    let b = repo.add_note(NoteDraft {
        title: "b".to_string(),
        ..Default::default()
    });

    let select = |repo: &mut NotesRepository| {
        repo.toggle_selection_mode();
        repo.toggle_note_selection(&a);
        repo.toggle_note_selection(&b);
    };

    select(&mut repo);
    repo.pin_selected();
    let once: Vec<(String, bool)> = repo
        .notes()
        .iter()
        .map(|n| (n.id.clone(), n.is_pinned))
        .collect();

    select(&mut repo);
    repo.pin_selected();
    let twice: Vec<(String, bool)> = repo
        .notes()
        .iter()
        .map(|n| (n.id.clone(), n.is_pinned))
        .collect();

    assert_eq!(once, twice);
    assert!(once.iter().all(|(_, pinned)| *pinned));
}

#[tokio::test]
async fn test_add_then_load_round_trips_all_fields() {
    let (mut repo, _store) = memory_repository();
    let id = repo.add_note(NoteDraft {
        title: "Trip".to_string(),
        content: "Pack #travel".to_string(),
        color: NoteColor::Teal,
        tags: vec!["travel".to_string()],
        is_pinned: true,
        is_favorite: true,
    });
    let before = repo.note(&id).unwrap().clone();

    repo.flush().await.unwrap();
    assert_eq!(repo.load().await, 1);

    assert_eq!(repo.note(&id).unwrap(), &before);
    assert_eq!(repo.tags(), &["travel".to_string()]);
}

#[tokio::test]
async fn test_file_store_persists_across_repositories() {
    let temp = TempDir::new().unwrap();
    let config = Config {
        data_dir: temp.path().join("data"),
        ..Default::default()
    };

    let note_id = {
        let store = FileStore::open(&config.data_dir).unwrap();
        let mut repo = NotesRepository::new(Arc::new(store), &config);
        repo.load().await;

        let id = repo.add_note(NoteDraft {
            title: "Persistent".to_string(),
            tags: vec!["keep".to_string()],
            ..Default::default()
        });
        repo.toggle_favorite(&id);
        repo.update_settings(SettingsUpdate {
            theme: Some(ThemeMode::Dark),
            ..Default::default()
        });
        repo.shutdown().await.unwrap();
        id
    };

    let store = FileStore::open(&config.data_dir).unwrap();
    let mut reopened = NotesRepository::new(Arc::new(store), &config);
    assert_eq!(reopened.load().await, 1);

    let note = reopened.note(&note_id).unwrap();
    assert_eq!(note.title, "Persistent");
    assert!(note.is_favorite);
    assert_eq!(reopened.tags(), &["keep".to_string()]);
    assert_eq!(reopened.settings().theme, ThemeMode::Dark);
}

#[tokio::test]
async fn test_stored_json_uses_stable_field_names() {
    let (mut repo, store) = memory_repository();
    repo.add_note(NoteDraft {
        title: "json".to_string(),
        color: NoteColor::Pink,
        ..Default::default()
    });
    repo.update_settings(SettingsUpdate::default());
    repo.flush().await.unwrap();

    let notes: serde_json::Value =
        serde_json::from_str(&store.get(NOTES_KEY).await.unwrap().unwrap()).unwrap();
    let first = &notes[0];
    for field in [
        "id",
        "title",
        "content",
        "color",
        "tags",
        "isPinned",
        "isFavorite",
        "createdAt",
        "updatedAt",
    ] {
        assert!(first.get(field).is_some(), "missing field {}", field);
    }
    assert_eq!(first["color"], "pink");

    let settings: AppSettings =
        serde_json::from_str(&store.get(SETTINGS_KEY).await.unwrap().unwrap()).unwrap();
    assert_eq!(settings, AppSettings::default());
}

#[tokio::test]
async fn test_load_with_empty_storage_uses_defaults() {
    let (mut repo, _store) = memory_repository();

    assert_eq!(repo.load().await, 0);
    assert!(repo.notes().is_empty());
    assert!(repo.tags().is_empty());
    assert_eq!(repo.settings(), &AppSettings::default());
    assert!(!repo.is_loading());
}

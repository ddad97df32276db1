//! Pure helpers shared by the repository, the editor session and the CLI:
//! hashtag extraction, search matching and the pinned-first note ordering.
use std::{cmp::Ordering, collections::HashSet, sync::OnceLock};

use log::trace;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{Note, SortOption};

fn hashtag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#[\w-]+").expect("hashtag pattern is valid"))
}

/// Extracts `#hashtags` from free-form content.
///
/// Tags are returned lowercased without the leading `#`, deduplicated
/// case-insensitively, in order of first appearance.
pub fn extract_tags(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let tags: Vec<String> = hashtag_pattern()
        .find_iter(content)
        .map(|m| m.as_str()[1..].to_lowercase())
        .filter(|tag| seen.insert(tag.clone()))
        .collect();

    trace!("Extracted {} tags from content", tags.len());
    tags
}

/// Normalizes a user-typed tag: trimmed, `#` stripped, lowercased.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

// Helper method for parsing comma-separated CLI lists
pub fn parse_list(values: Option<String>) -> Vec<String> {
    values
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Locale-style string comparison.
///
/// Strings are compared in three passes, like a root-locale collator:
/// base letters with accents and case removed, then accents, then case with
/// lowercase first. `"apple"` precedes `"Banana"`, `"école"` precedes
/// `"fish"`, and `"a"` precedes `"A"`.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| accented_letters(a).cmp(accented_letters(b)))
        .then_with(|| compare_case(a, b))
        .then_with(|| a.cmp(b))
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn accented_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

fn compare_case(a: &str, b: &str) -> Ordering {
    for (x, y) in a.nfd().zip(b.nfd()) {
        if x != y {
            match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
        }
    }
    Ordering::Equal
}

/// Compares two notes under a sort option. Pinned state is not considered.
pub fn compare_notes(a: &Note, b: &Note, sort_option: SortOption) -> Ordering {
    match sort_option {
        SortOption::Date => b.updated_at.cmp(&a.updated_at),
        SortOption::Title => locale_compare(&a.title, &b.title),
        SortOption::Color => a.color.as_str().cmp(b.color.as_str()),
        SortOption::Custom => Ordering::Equal,
    }
}

/// Orders notes pinned-first, each group sorted by `sort_option`.
///
/// Both sorts are stable, so the incoming order breaks ties.
pub fn sort_notes(notes: Vec<Note>, sort_option: SortOption) -> Vec<Note> {
    let (mut pinned, mut unpinned): (Vec<Note>, Vec<Note>) =
        notes.into_iter().partition(|note| note.is_pinned);

    pinned.sort_by(|a, b| compare_notes(a, b, sort_option));
    unpinned.sort_by(|a, b| compare_notes(a, b, sort_option));

    pinned.extend(unpinned);
    pinned
}

/// True if title, content or any tag contains the already-lowercased query.
pub fn matches_query(note: &Note, query_lower: &str) -> bool {
    note.title.to_lowercase().contains(query_lower)
        || note.content.to_lowercase().contains(query_lower)
        || note
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(query_lower))
}

/// Every distinct tag referenced by `notes`, in order of first appearance.
pub fn collect_tags<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<String> {
    let mut seen = HashSet::new();
    notes
        .into_iter()
        .flat_map(|note| note.tags.iter())
        .filter(|tag| seen.insert(tag.to_string()))
        .cloned()
        .collect()
}

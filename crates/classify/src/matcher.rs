use std::collections::BTreeSet;

use erafix_engine::{Field, RecordStore, RowIndex, StatusCode};
use serde::Serialize;

/// How a search term must sit inside a field value to count as a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// `;`-separated author list; the term must equal whole name tokens.
    AuthorList,
    /// Venue names are one segment; any substring counts.
    Venue,
    /// Plain substring over the displayed cell text.
    Raw,
}

impl MatchStrategy {
    /// Whether a field value that already contains `term` really matches it.
    /// Both arguments are case-folded.
    fn confirms(self, value: &str, term: &str) -> bool {
        match self {
            Self::AuthorList => matched_segment(value, term).is_some_and(|segment| segment_has_name(segment, term)),
            Self::Venue | Self::Raw => true,
        }
    }
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorList => write!(f, "author_list"),
            Self::Venue => write!(f, "venue"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

/// A searchable column together with its strategy, fixed at declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchField {
    pub field: Field,
    pub strategy: MatchStrategy,
}

impl SearchField {
    pub fn new(field: Field) -> Self {
        let strategy = match field {
            Field::Authors => MatchStrategy::AuthorList,
            Field::Venue => MatchStrategy::Venue,
            _ => MatchStrategy::Raw,
        };
        Self { field, strategy }
    }

    pub fn authors() -> Self {
        Self::new(Field::Authors)
    }

    pub fn venue() -> Self {
        Self::new(Field::Venue)
    }
}

/// Rows whose `search.field` contains `term` as a genuine name or word.
///
/// Empty or null cells never match. A blank term matches nothing.
pub fn find(
    store: &RecordStore,
    term: &str,
    search: &SearchField,
    require_blank_discipline: bool,
    require_unhandled: bool,
) -> BTreeSet<RowIndex> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return BTreeSet::new();
    }

    let naive = store.filter(|row, s| {
        s.text(row, search.field)
            .map(|value| value.to_lowercase().contains(&term))
            .unwrap_or(false)
    });

    let matched: BTreeSet<RowIndex> = naive
        .into_iter()
        .filter(|&row| {
            store
                .text(row, search.field)
                .map(|value| search.strategy.confirms(&value.to_lowercase(), &term))
                .unwrap_or(false)
        })
        .filter(|&row| !require_unhandled || store.status(row) == StatusCode::Unhandled)
        .filter(|&row| !require_blank_discipline || store.discipline(row).is_none())
        .collect();

    log::debug!(
        "find '{term}' in {} ({}): {} row(s)",
        store.names().name(search.field),
        search.strategy,
        matched.len()
    );
    matched
}

/// Every row still waiting for classification.
pub fn unhandled_rows(store: &RecordStore) -> BTreeSet<RowIndex> {
    store.filter(|row, s| s.status(row) == StatusCode::Unhandled)
}

/// The author in `author_list` matched by `term`, title-cased.
pub fn full_name(author_list: &str, term: &str) -> Option<String> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return None;
    }
    let folded = author_list.to_lowercase();
    matched_segment(&folded, &term)
        .filter(|segment| segment_has_name(segment, &term))
        .map(title_case)
}

/// The `;`-delimited author entry holding the first occurrence of `term`.
///
/// Later entries are never consulted, so `term` must be a whole name in the
/// entry where it first appears.
fn matched_segment<'v>(value: &'v str, term: &str) -> Option<&'v str> {
    let start = value.find(term)?;
    let from = value[..start].rfind(';').map_or(0, |i| i + 1);
    let to = value[start..].find(';').map_or(value.len(), |i| start + i);
    Some(value[from..to].trim())
}

/// `term` equals a run of whole tokens in one author segment.
fn segment_has_name(segment: &str, term: &str) -> bool {
    let words = tokens(segment);
    let wanted = tokens(term);
    if wanted.is_empty() || wanted.len() > words.len() {
        return false;
    }
    words.windows(wanted.len()).any(|window| window == wanted.as_slice())
}

fn tokens(s: &str) -> Vec<&str> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for c in s.chars() {
        if prev_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_letter = c.is_alphabetic();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use erafix_engine::{CellValue, ColumnNames};

    fn store(rows: &[[&str; 4]]) -> RecordStore {
        RecordStore::new(
            "Sheet1",
            ["AUTHORS", "PARENT_DOC", "HANDLED", "DISCIPLINE"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| CellValue::from_input(c)).collect())
                .collect(),
            ColumnNames::default(),
        )
        .unwrap()
    }

    fn rows(ids: &[usize]) -> BTreeSet<RowIndex> {
        ids.iter().map(|&i| RowIndex(i)).collect()
    }

    #[test]
    fn strategy_follows_field() {
        assert_eq!(SearchField::authors().strategy, MatchStrategy::AuthorList);
        assert_eq!(SearchField::venue().strategy, MatchStrategy::Venue);
        assert_eq!(SearchField::new(Field::Status).strategy, MatchStrategy::Raw);
    }

    #[test]
    fn author_needs_whole_token() {
        let s = store(&[
            ["McGee, J.", "", "0", ""],
            ["Gee, A.; Smith, B.", "", "0", ""],
            ["Smith, B.; GEE, A.", "", "0", ""],
            ["Smith, B.; Gee, L.; McGee, J.", "", "0", ""],
        ]);
        assert_eq!(find(&s, "gee", &SearchField::authors(), false, false), rows(&[1, 2, 3]));
        assert_eq!(find(&s, "  Gee ", &SearchField::authors(), false, false), rows(&[1, 2, 3]));
    }

    #[test]
    fn author_is_judged_at_first_occurrence() {
        // "gee" first appears inside "Magee", so the later "Gee, L." is not consulted.
        let s = store(&[
            ["Magee, K.; Gee, L.", "", "0", ""],
            ["Gee, L.; Magee, K.", "", "0", ""],
        ]);
        assert_eq!(find(&s, "gee", &SearchField::authors(), false, false), rows(&[1]));
    }

    #[test]
    fn multi_word_author_term() {
        let s = store(&[["Anna Lee; Bob Stone", "", "0", ""], ["Lee Anna", "", "0", ""]]);
        assert_eq!(find(&s, "anna lee", &SearchField::authors(), false, false), rows(&[0]));
    }

    #[test]
    fn venue_is_plain_substring() {
        let s = store(&[
            ["", "Physical Review Letters", "0", ""],
            ["", "Physics Today", "0", ""],
            ["", "", "0", ""],
        ]);
        assert_eq!(find(&s, "review", &SearchField::venue(), false, false), rows(&[0]));
        assert_eq!(find(&s, "phys", &SearchField::venue(), false, false), rows(&[0, 1]));
    }

    #[test]
    fn blank_term_and_null_cells_never_match() {
        let s = store(&[["nan", "None", "0", ""], ["Gee, A.", "", "0", ""]]);
        assert!(find(&s, "", &SearchField::authors(), false, false).is_empty());
        assert!(find(&s, "  ", &SearchField::venue(), false, false).is_empty());
        assert!(find(&s, "nan", &SearchField::authors(), false, false).is_empty());
    }

    #[test]
    fn guards_narrow_the_result() {
        let s = store(&[
            ["Gee, A.", "", "0", ""],
            ["Gee, A.", "", "1", ""],
            ["Gee, A.", "", "0", "astro"],
        ]);
        let authors = SearchField::authors();
        assert_eq!(find(&s, "gee", &authors, false, false), rows(&[0, 1, 2]));
        assert_eq!(find(&s, "gee", &authors, false, true), rows(&[0, 2]));
        assert_eq!(find(&s, "gee", &authors, true, false), rows(&[0, 1]));
        assert_eq!(find(&s, "gee", &authors, true, true), rows(&[0]));
    }

    #[test]
    fn raw_field_and_unhandled_rows() {
        let s = store(&[["a", "", "0", ""], ["b", "", "1", ""], ["c", "", "confused", ""]]);
        assert_eq!(find(&s, "0", &SearchField::new(Field::Status), false, false), rows(&[0]));
        assert_eq!(unhandled_rows(&s), rows(&[0]));
    }

    #[test]
    fn full_name_picks_matching_author() {
        assert_eq!(
            full_name("smith, b.; GEE, ANNE-MARIE; mcgee, john", "Gee").as_deref(),
            Some("Gee, Anne-Marie")
        );
        assert_eq!(full_name("o'brien, pat", "o'brien").as_deref(), Some("O'Brien, Pat"));
        assert_eq!(full_name("McGee, J.", "gee"), None);
        assert_eq!(full_name("Magee, K.; Gee, L.", "gee"), None);
        assert_eq!(full_name("  lee, ann ;magee, k.", "LEE").as_deref(), Some("Lee, Ann"));
        assert_eq!(full_name("Gee, A.", ""), None);
    }
}

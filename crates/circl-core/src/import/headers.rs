use std::collections::BTreeMap;

use serde::Serialize;

use super::fields::{field_by_label, FieldDef, FIELDS};
use crate::error::{CirclError, Result};

/// Which uploaded column feeds each schema field. Fields absent from the map
/// are unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMapping {
    columns: BTreeMap<&'static str, String>,
}

impl HeaderMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column mapped to the field with this key.
    pub fn column_for(&self, key: &str) -> Option<&str> {
        self.columns.get(key).map(String::as_str)
    }

    /// Point `label` (display label or key) at `column`. An empty column
    /// unmaps the field.
    pub fn set(&mut self, label: &str, column: &str) -> Result<()> {
        let field = field_by_label(label)
            .ok_or_else(|| CirclError::InvalidInput(format!("unknown field: '{label}'")))?;
        let column = column.trim();
        if column.is_empty() {
            self.columns.remove(field.key);
        } else {
            self.columns.insert(field.key, column.to_string());
        }
        Ok(())
    }

    /// Mapped `(field, column)` pairs in schema order.
    pub fn mapped(&self) -> impl Iterator<Item = (&'static FieldDef, &str)> + '_ {
        FIELDS
            .iter()
            .filter_map(|f| self.columns.get(f.key).map(|c| (f, c.as_str())))
    }

    pub fn unmapped_fields(&self) -> impl Iterator<Item = &'static FieldDef> + '_ {
        FIELDS
            .iter()
            .filter(|f| !self.columns.contains_key(f.key))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Drop mappings that name a column not present in `headers`.
    pub fn retain_columns(&mut self, headers: &[String]) {
        self.columns.retain(|_, c| headers.iter().any(|h| h == c));
    }
}

impl Serialize for HeaderMapping {
    /// Serialized as `{ "Label": "Column" }` in schema order.
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = s.serialize_map(Some(self.columns.len()))?;
        for (field, column) in self.mapped() {
            map.serialize_entry(field.label, column)?;
        }
        map.end()
    }
}

/// Minimum length of the shorter string for a substring match to count.
const MIN_CONTAINMENT_LEN: usize = 3;

/// Build an initial mapping from uploaded headers.
///
/// Each field independently takes the first column that matches it, trying
/// three tiers in order: exact label (case-insensitive), substring
/// containment in either direction, then the alias table. A column may feed
/// more than one field. For containment, a column only counts for the field
/// whose label overlaps it the most, so "Company Name" goes to Company rather
/// than Name. Pure and deterministic.
pub fn detect_headers(headers: &[String]) -> HeaderMapping {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    let mut mapping = HeaderMapping::new();

    for field in FIELDS {
        let hit = first_hit(&normalized, |h| exact_match(field, h))
            .or_else(|| first_hit(&normalized, |h| best_containment(h) == Some(field.key)))
            .or_else(|| first_hit(&normalized, |h| alias_match(field, h)));
        if let Some(i) = hit {
            mapping.columns.insert(field.key, headers[i].clone());
        }
    }

    tracing::debug!(
        mapped = mapping.len(),
        columns = headers.len(),
        "detected header mapping"
    );
    mapping
}

fn first_hit(normalized: &[String], matches: impl Fn(&str) -> bool) -> Option<usize> {
    normalized
        .iter()
        .position(|h| !h.is_empty() && matches(h))
}

fn normalize(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn exact_match(field: &FieldDef, header: &str) -> bool {
    header == field.label.to_lowercase() || header == field.key.replace('_', " ")
}

/// Length of the overlap when `header` and the field label contain one
/// another on word boundaries.
fn containment_len(field: &FieldDef, header: &str) -> Option<usize> {
    let label = field.label.to_lowercase();
    let (short, long) = if header.len() <= label.len() {
        (header, label.as_str())
    } else {
        (label.as_str(), header)
    };
    (short.len() >= MIN_CONTAINMENT_LEN && contains_words(long, short)).then_some(short.len())
}

/// Field with the longest containment overlap; earlier fields win ties.
fn best_containment(header: &str) -> Option<&'static str> {
    let mut best: Option<(usize, &'static str)> = None;
    for field in FIELDS {
        if let Some(len) = containment_len(field, header) {
            if !best.is_some_and(|(b, _)| len <= b) {
                best = Some((len, field.key));
            }
        }
    }
    best.map(|(_, key)| key)
}

/// `needle` appears in `haystack` on word boundaries.
fn contains_words(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = start == 0 || haystack.as_bytes()[start - 1] == b' ';
        let after_ok = end == haystack.len() || haystack.as_bytes()[end] == b' ';
        before_ok && after_ok
    })
}

fn alias_match(field: &FieldDef, header: &str) -> bool {
    field.aliases.iter().any(|a| normalize(a) == header)
}

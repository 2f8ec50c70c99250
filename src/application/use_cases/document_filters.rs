//! Pure filter/sort/search helpers over in-memory document arrays.
//!
//! No I/O and no caching here: callers re-run these on every input change
//! and memoize upstream if they need to.

use crate::domain::entities::Document;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Fields to search, with one level of dot-notation nesting
    /// ("source.name", "metadata.topic"). String-valued metadata entries are
    /// always searched in addition to these.
    pub fields: Vec<String>,
    /// Treat the query as a single phrase instead of whitespace-split terms.
    pub exact: bool,
    pub case_sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fields: vec![
                "title".to_string(),
                "content".to_string(),
                "source.name".to_string(),
            ],
            exact: false,
            case_sensitive: false,
        }
    }
}

/// Keeps documents whose searchable text contains every query term. An empty
/// or whitespace-only query returns the input unchanged.
pub fn search_documents(docs: &[Document], query: &str, options: &SearchOptions) -> Vec<Document> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return docs.to_vec();
    }

    let terms: Vec<String> = if options.exact {
        vec![fold_case(trimmed, options.case_sensitive)]
    } else {
        trimmed
            .split_whitespace()
            .map(|term| fold_case(term, options.case_sensitive))
            .collect()
    };

    docs.iter()
        .filter(|doc| {
            let haystack = fold_case(&searchable_text(doc, &options.fields), options.case_sensitive);
            terms.iter().all(|term| haystack.contains(term.as_str()))
        })
        .cloned()
        .collect()
}

/// Keeps documents whose metadata satisfies every filter entry. A `Null`
/// filter value means "no constraint" for that key; an array value matches
/// when the stored value equals any element; a string value matches exactly
/// or as a case-insensitive substring of a string target.
pub fn filter_by_metadata(docs: &[Document], filters: &Map<String, Value>) -> Vec<Document> {
    docs.iter()
        .filter(|doc| {
            filters
                .iter()
                .all(|(key, wanted)| metadata_matches(doc.metadata.get(key), wanted))
        })
        .cloned()
        .collect()
}

fn metadata_matches(actual: Option<&Value>, wanted: &Value) -> bool {
    if wanted.is_null() {
        return true;
    }
    let actual = match actual {
        Some(value) => value,
        None => return false,
    };
    match wanted {
        Value::Array(options) => options.iter().any(|option| actual == option),
        Value::String(wanted_text) => match actual {
            Value::String(actual_text) => {
                actual_text == wanted_text
                    || actual_text
                        .to_lowercase()
                        .contains(&wanted_text.to_lowercase())
            }
            _ => actual == wanted,
        },
        _ => actual == wanted,
    }
}

/// Returns a new vector ordered by the given field. Numbers compare
/// numerically (a missing `relevance_score` counts as 0), fields whose name
/// contains "date" compare chronologically, everything else compares as
/// case-insensitive text. `Desc` is the exact reverse of the `Asc` order.
pub fn sort_documents(docs: &[Document], field: &str, direction: SortDirection) -> Vec<Document> {
    let mut sorted = docs.to_vec();
    sorted.sort_by(|a, b| compare_by_field(a, b, field));
    if direction == SortDirection::Desc {
        sorted.reverse();
    }
    sorted
}

/// Sort with a caller-supplied comparator, for orderings the field rules
/// cannot express.
pub fn sort_documents_by<F>(docs: &[Document], compare: F) -> Vec<Document>
where
    F: Fn(&Document, &Document) -> Ordering,
{
    let mut sorted = docs.to_vec();
    sorted.sort_by(|a, b| compare(a, b));
    sorted
}

/// Sorted unique string values of one metadata field, for filter dropdowns.
pub fn unique_metadata_values(docs: &[Document], field: &str) -> Vec<String> {
    let mut values = BTreeSet::new();
    for doc in docs {
        if let Some(Value::String(value)) = doc.metadata.get(field) {
            values.insert(value.clone());
        }
    }
    values.into_iter().collect()
}

/// Sorted set of metadata keys that hold a string value in any document.
pub fn string_metadata_fields(docs: &[Document]) -> Vec<String> {
    let mut fields = BTreeSet::new();
    for doc in docs {
        for (key, value) in &doc.metadata {
            if value.is_string() {
                fields.insert(key.clone());
            }
        }
    }
    fields.into_iter().collect()
}

fn compare_by_field(a: &Document, b: &Document, field: &str) -> Ordering {
    if field == "relevance_score" {
        let left = a.relevance_score.unwrap_or(0.0);
        let right = b.relevance_score.unwrap_or(0.0);
        return left.partial_cmp(&right).unwrap_or(Ordering::Equal);
    }

    let left = field_value(a, field);
    let right = field_value(b, field);

    if let (Some(Value::Number(left)), Some(Value::Number(right))) = (&left, &right) {
        let left = left.as_f64().unwrap_or(0.0);
        let right = right.as_f64().unwrap_or(0.0);
        return left.partial_cmp(&right).unwrap_or(Ordering::Equal);
    }

    let left_text = left.as_ref().map(value_text).unwrap_or_default();
    let right_text = right.as_ref().map(value_text).unwrap_or_default();

    if field.contains("date") {
        if let (Some(left), Some(right)) = (parse_date(&left_text), parse_date(&right_text)) {
            return left.cmp(&right);
        }
    }

    left_text.to_lowercase().cmp(&right_text.to_lowercase())
}

/// Resolves a field path on a document, with one level of dot-notation
/// nesting. Bare names that are not document fields fall through to the
/// metadata map.
fn field_value(doc: &Document, path: &str) -> Option<Value> {
    match path.split_once('.') {
        Some(("source", sub)) => match sub {
            "id" => Some(Value::String(doc.source.id.clone())),
            "name" => Some(Value::String(doc.source.name.clone())),
            "type" => Some(Value::String(doc.source.source_type.clone())),
            _ => None,
        },
        Some(("metadata", key)) => doc.metadata.get(key).cloned(),
        Some(_) => None,
        None => match path {
            "id" => Some(Value::String(doc.id.clone())),
            "title" => Some(Value::String(doc.title.clone())),
            "content" => Some(Value::String(doc.content.clone())),
            "url" => doc.url.clone().map(Value::String),
            "relevance_score" => doc
                .relevance_score
                .and_then(|score| serde_json::Number::from_f64(score).map(Value::Number)),
            _ => doc.metadata.get(path).cloned(),
        },
    }
}

fn searchable_text(doc: &Document, fields: &[String]) -> String {
    let mut parts = Vec::new();
    for field in fields {
        if let Some(value) = field_value(doc, field) {
            let text = value_text(&value);
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }
    for value in doc.metadata.values() {
        if let Value::String(text) = value {
            parts.push(text.clone());
        }
    }
    parts.join("\n")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

fn fold_case(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

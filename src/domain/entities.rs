use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use validator::Validate;

/// Review state of a QA pair. Transitions are driven by the review screens;
/// the backend stays authoritative and the client never rejects a transition.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QaStatus {
    Draft,
    ReadyForReview,
    Approved,
    Rejected,
    RevisionRequested,
}

impl QaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QaStatus::Draft => "draft",
            QaStatus::ReadyForReview => "ready_for_review",
            QaStatus::Approved => "approved",
            QaStatus::Rejected => "rejected",
            QaStatus::RevisionRequested => "revision_requested",
        }
    }
}

impl std::fmt::Display for QaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub document_count: i64,
    #[serde(default)]
    pub status_counts: HashMap<String, i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CollectionInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CollectionInput {
    pub fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            tags: Vec::new(),
            metadata: Map::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QaPair {
    pub id: String,
    pub collection_id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    pub status: QaStatus,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub reviewed_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct QaPairDraft {
    #[validate(length(min = 1, message = "Question is required"))]
    pub question: String,
    #[validate(length(min = 1, message = "Answer is required"))]
    pub answer: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default = "default_draft_status")]
    pub status: QaStatus,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_draft_status() -> QaStatus {
    QaStatus::ReadyForReview
}

impl QaPairDraft {
    pub fn new(question: &str, answer: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: answer.to_string(),
            documents: Vec::new(),
            status: QaStatus::ReadyForReview,
            metadata: Map::new(),
        }
    }
}

/// Partial update sent as a PATCH body. Absent fields are left untouched by
/// the backend; `metadata` is merged into the stored map, not replaced.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct QaPairUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QaStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl QaPairUpdate {
    pub fn status(status: QaStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentSource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub source_type: String,
}

/// A retrieved, read-only text unit used as supporting material when
/// drafting an answer. Never persisted beyond the in-memory result set.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: DocumentSource,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub max_results: usize,
}

impl SearchRequest {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            sources: Vec::new(),
            max_results: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchResult {
    pub documents: Vec<Document>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    pub page: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourcePage {
    pub data: Vec<SourceInfo>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationRequest {
    pub question: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub custom_rules: Vec<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(question: &str, documents: Vec<Document>) -> Self {
        Self {
            question: question.to_string(),
            documents,
            custom_rules: Vec::new(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationResponse {
    pub answer: String,
    pub model_used: String,
    #[serde(default)]
    pub token_usage: HashMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qa_status_wire_format() {
        let json = serde_json::to_string(&QaStatus::ReadyForReview).unwrap();
        assert_eq!(json, "\"ready_for_review\"");

        let parsed: QaStatus = serde_json::from_str("\"revision_requested\"").unwrap();
        assert_eq!(parsed, QaStatus::RevisionRequested);
    }

    #[test]
    fn test_qa_pair_update_skips_absent_fields() {
        let update = QaPairUpdate::status(QaStatus::Approved);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "approved" }));
    }

    #[test]
    fn test_document_source_type_field_name() {
        let source = DocumentSource {
            id: "memory".to_string(),
            name: "Sample Library".to_string(),
            source_type: "memory".to_string(),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "memory");
    }
}

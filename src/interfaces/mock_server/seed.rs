//! Demo accounts and sample documents served by the mock API.

use super::DemoUser;
use crate::domain::auth::User;
use crate::domain::entities::{Document, DocumentSource, SourceInfo};
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

pub fn demo_users() -> Vec<DemoUser> {
    vec![
        DemoUser {
            username: "demo".to_string(),
            password: "password".to_string(),
            user: User {
                id: "user1".to_string(),
                username: "demo".to_string(),
                email: "demo@example.com".to_string(),
                full_name: Some("Demo User".to_string()),
            },
        },
        DemoUser {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            user: User {
                id: "user2".to_string(),
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                full_name: Some("Admin User".to_string()),
            },
        },
    ]
}

pub fn sample_sources() -> Vec<SourceInfo> {
    vec![SourceInfo {
        id: "memory".to_string(),
        name: "Sample Library".to_string(),
        description: "In-memory sample documents for development".to_string(),
    }]
}

static SAMPLE_DOCUMENTS: Lazy<Vec<Document>> = Lazy::new(|| {
    vec![
        document(
            "doc1",
            "Equipment Maintenance Manual",
            "Regular maintenance of equipment is essential for optimal performance. \
             This document outlines maintenance procedures for various equipment types.",
            "https://example.com/docs/equipment-manual.pdf",
            json!({
                "type": "manual",
                "topic": "maintenance",
                "equipment_type": "general",
                "created_date": "2023-01-15",
            }),
        ),
        document(
            "doc2",
            "Troubleshooting Guide: Air Filters",
            "Common issues with air filters include clogging, improper installation, \
             and insufficient airflow. This guide provides step-by-step troubleshooting \
             procedures for identifying and resolving air filter problems.",
            "https://example.com/docs/airfilter-guide.pdf",
            json!({
                "type": "guide",
                "topic": "troubleshooting",
                "component": "air filter",
                "created_date": "2023-03-22",
            }),
        ),
        document(
            "doc3",
            "Safety Protocols for Equipment Operation",
            "Safety is paramount when operating industrial equipment. This document \
             covers essential safety protocols, including personal protective equipment, \
             pre-operation checks, and emergency procedures.",
            "https://example.com/docs/safety-protocols.pdf",
            json!({
                "type": "protocol",
                "topic": "safety",
                "importance": "critical",
                "created_date": "2023-05-10",
            }),
        ),
        document(
            "doc4",
            "Technical Specifications: Model X Series",
            "Technical specifications for the Model X series include power requirements, \
             dimensional constraints, operating conditions, and performance metrics. \
             Reference this document when planning installations or upgrades.",
            "https://example.com/docs/model-x-specs.pdf",
            json!({
                "type": "specifications",
                "topic": "technical",
                "product": "Model X",
                "created_date": "2023-02-18",
            }),
        ),
        document(
            "doc5",
            "AI Ground Truth Generation Best Practices",
            "Creating high-quality ground truth data is essential for training effective \
             AI models. This document covers best practices for data annotation, quality \
             control, and dataset management to ensure optimal model performance.",
            "https://example.com/docs/ai-ground-truth-best-practices.pdf",
            json!({
                "type": "guide",
                "topic": "best practices",
                "domain": "machine learning",
                "created_date": "2023-06-01",
            }),
        ),
    ]
});

pub fn sample_documents() -> Vec<Document> {
    SAMPLE_DOCUMENTS.clone()
}

fn document(id: &str, title: &str, content: &str, url: &str, metadata: Value) -> Document {
    let metadata = match metadata {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Document {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        source: DocumentSource {
            id: "memory".to_string(),
            name: "Sample Library".to_string(),
            source_type: "memory".to_string(),
        },
        url: Some(url.to_string()),
        metadata,
        relevance_score: None,
    }
}

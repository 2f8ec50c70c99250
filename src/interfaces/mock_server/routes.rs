use super::MockApiState;
use crate::domain::auth::{LoginResponse, User};
use crate::domain::entities::{
    Collection, CollectionInput, Document, GenerationRequest, GenerationResponse, Pagination,
    QaPair, QaPairDraft, QaPairUpdate, QaStatus, SearchRequest, SearchResult, SourcePage,
};
use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim().to_string())
}

fn authenticate(req: &HttpRequest, state: &MockApiState) -> Option<User> {
    let token = bearer_token(req)?;
    state.db.lock().unwrap().tokens.get(&token).cloned()
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "detail": "Not authenticated" }))
}

fn not_found(message: String) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "detail": message }))
}

/// Recomputes the live QA statistics the real backend derives on every read.
fn with_counts(collection: &Collection, qa_pairs: &[QaPair]) -> Collection {
    let mut updated = collection.clone();
    updated.document_count = 0;
    let mut counts: HashMap<String, i64> = HashMap::new();
    for pair in qa_pairs.iter().filter(|p| p.collection_id == collection.id) {
        updated.document_count += 1;
        *counts.entry(pair.status.as_str().to_string()).or_insert(0) += 1;
    }
    updated.status_counts = counts;
    updated
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok", "message": "API is operational" }))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[post("/api/auth/login")]
pub async fn login(state: web::Data<MockApiState>, body: web::Json<LoginBody>) -> HttpResponse {
    let account = state
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password);

    match account {
        Some(account) => {
            let token = Uuid::new_v4().to_string();
            state
                .db
                .lock()
                .unwrap()
                .tokens
                .insert(token.clone(), account.user.clone());
            HttpResponse::Ok().json(LoginResponse {
                access_token: token,
                token_type: "bearer".to_string(),
                user: account.user.clone(),
            })
        }
        None => HttpResponse::Unauthorized().json(json!({ "detail": "Invalid credentials" })),
    }
}

#[get("/api/auth/me")]
pub async fn current_user(req: HttpRequest, state: web::Data<MockApiState>) -> HttpResponse {
    match authenticate(&req, &state) {
        Some(user) => HttpResponse::Ok().json(user),
        None => unauthorized(),
    }
}

#[post("/api/auth/logout")]
pub async fn logout(req: HttpRequest, state: web::Data<MockApiState>) -> HttpResponse {
    if let Some(token) = bearer_token(&req) {
        state.db.lock().unwrap().tokens.remove(&token);
    }
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[get("/api/collections")]
pub async fn list_collections(req: HttpRequest, state: web::Data<MockApiState>) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }
    let db = state.db.lock().unwrap();
    let collections: Vec<Collection> = db
        .collections
        .iter()
        .map(|c| with_counts(c, &db.qa_pairs))
        .collect();
    HttpResponse::Ok().json(collections)
}

#[post("/api/collections")]
pub async fn create_collection(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    body: web::Json<CollectionInput>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }
    let now = Utc::now();
    let collection = Collection {
        id: Uuid::new_v4().to_string(),
        name: body.name.clone(),
        description: body.description.clone(),
        tags: body.tags.clone(),
        metadata: body.metadata.clone(),
        document_count: 0,
        status_counts: HashMap::new(),
        created_at: now,
        updated_at: now,
    };
    state
        .db
        .lock()
        .unwrap()
        .collections
        .push(collection.clone());
    HttpResponse::Created().json(collection)
}

#[get("/api/collections/{id}")]
pub async fn get_collection(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    path: web::Path<String>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }
    let id = path.into_inner();
    let db = state.db.lock().unwrap();
    match db.collections.iter().find(|c| c.id == id) {
        Some(collection) => HttpResponse::Ok().json(with_counts(collection, &db.qa_pairs)),
        None => not_found(format!("Collection with ID {} not found", id)),
    }
}

#[put("/api/collections/{id}")]
pub async fn update_collection(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    path: web::Path<String>,
    body: web::Json<CollectionInput>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }
    let id = path.into_inner();
    let mut db = state.db.lock().unwrap();
    let qa_pairs = db.qa_pairs.clone();
    match db.collections.iter_mut().find(|c| c.id == id) {
        Some(collection) => {
            collection.name = body.name.clone();
            collection.description = body.description.clone();
            collection.tags = body.tags.clone();
            collection.metadata = body.metadata.clone();
            collection.updated_at = Utc::now();
            HttpResponse::Ok().json(with_counts(collection, &qa_pairs))
        }
        None => not_found(format!("Collection with ID {} not found", id)),
    }
}

#[delete("/api/collections/{id}")]
pub async fn delete_collection(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    path: web::Path<String>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }
    let id = path.into_inner();
    let mut db = state.db.lock().unwrap();
    if !db.collections.iter().any(|c| c.id == id) {
        return not_found(format!("Collection with ID {} not found", id));
    }
    db.collections.retain(|c| c.id != id);
    // Deleting a collection removes its QA pairs as well.
    db.qa_pairs.retain(|p| p.collection_id != id);
    HttpResponse::NoContent().finish()
}

#[get("/api/collections/{id}/qa-pairs")]
pub async fn list_qa_pairs(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    path: web::Path<String>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }
    let id = path.into_inner();
    let db = state.db.lock().unwrap();
    if !db.collections.iter().any(|c| c.id == id) {
        return not_found(format!("Collection with ID {} not found", id));
    }
    let pairs: Vec<&QaPair> = db.qa_pairs.iter().filter(|p| p.collection_id == id).collect();
    HttpResponse::Ok().json(pairs)
}

#[post("/api/collections/{id}/qa-pairs")]
pub async fn create_qa_pair(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    path: web::Path<String>,
    body: web::Json<QaPairDraft>,
) -> HttpResponse {
    let user = match authenticate(&req, &state) {
        Some(user) => user,
        None => return unauthorized(),
    };
    let collection_id = path.into_inner();
    let mut db = state.db.lock().unwrap();
    if !db.collections.iter().any(|c| c.id == collection_id) {
        return not_found(format!("Collection with ID {} not found", collection_id));
    }
    let now = Utc::now();
    let pair = QaPair {
        id: Uuid::new_v4().to_string(),
        collection_id,
        question: body.question.clone(),
        answer: body.answer.clone(),
        documents: body.documents.clone(),
        status: body.status,
        metadata: body.metadata.clone(),
        created_at: now,
        updated_at: now,
        created_by: user.username,
        reviewed_by: None,
    };
    db.qa_pairs.push(pair.clone());
    HttpResponse::Created().json(pair)
}

#[get("/api/collections/qa-pairs/{id}")]
pub async fn get_qa_pair(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    path: web::Path<String>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }
    let id = path.into_inner();
    let db = state.db.lock().unwrap();
    match db.qa_pairs.iter().find(|p| p.id == id) {
        Some(pair) => HttpResponse::Ok().json(pair),
        None => not_found(format!("QA pair with ID {} not found", id)),
    }
}

#[patch("/api/collections/qa-pairs/{id}")]
pub async fn update_qa_pair(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    path: web::Path<String>,
    body: web::Json<QaPairUpdate>,
) -> HttpResponse {
    let user = match authenticate(&req, &state) {
        Some(user) => user,
        None => return unauthorized(),
    };
    let id = path.into_inner();
    let mut db = state.db.lock().unwrap();
    let pair = match db.qa_pairs.iter_mut().find(|p| p.id == id) {
        Some(pair) => pair,
        None => return not_found(format!("QA pair with ID {} not found", id)),
    };

    let had_feedback = pair.metadata.contains_key("revision_feedback")
        || pair.metadata.contains_key("revision_comments");

    if let Some(question) = &body.question {
        pair.question = question.clone();
    }
    if let Some(answer) = &body.answer {
        pair.answer = answer.clone();
    }
    if let Some(documents) = &body.documents {
        pair.documents = documents.clone();
    }
    // Metadata updates merge into the stored map instead of replacing it.
    if let Some(extra) = &body.metadata {
        for (key, value) in extra {
            pair.metadata.insert(key.clone(), value.clone());
        }
    }

    // Approval archives any pending revision feedback for later mining and
    // strips the active keys from the visible metadata.
    if body.status == Some(QaStatus::Approved) && had_feedback {
        let feedback = pair
            .metadata
            .get("revision_feedback")
            .or_else(|| pair.metadata.get("revision_comments"))
            .cloned()
            .unwrap_or(Value::Null);
        let archived = json!({
            "revision_feedback": feedback,
            "revision_requested_by": pair.metadata.get("revision_requested_by").cloned().unwrap_or(Value::Null),
            "revision_requested_at": pair.metadata.get("revision_requested_at").cloned().unwrap_or(Value::Null),
            "archive_reason": "moved_to_history_on_approval",
        });
        let history = pair
            .metadata
            .entry("revision_history".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(entries) = history {
            entries.push(archived);
        }
        pair.metadata.remove("revision_feedback");
        pair.metadata.remove("revision_comments");
        pair.metadata.remove("revision_requested_by");
        pair.metadata.remove("revision_requested_at");
    }

    if let Some(status) = body.status {
        pair.status = status;
        pair.reviewed_by = Some(user.username);
    }
    pair.updated_at = Utc::now();

    HttpResponse::Ok().json(pair.clone())
}

#[delete("/api/collections/qa-pairs/{id}")]
pub async fn delete_qa_pair(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    path: web::Path<String>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }
    let id = path.into_inner();
    let mut db = state.db.lock().unwrap();
    if !db.qa_pairs.iter().any(|p| p.id == id) {
        return not_found(format!("QA pair with ID {} not found", id));
    }
    db.qa_pairs.retain(|p| p.id != id);
    HttpResponse::NoContent().finish()
}

#[post("/api/retrieval/search")]
pub async fn search_documents(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    body: web::Json<SearchRequest>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }

    let tokens: Vec<String> = body
        .query
        .split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect();

    let mut scored: Vec<(f64, &Document)> = state
        .documents
        .iter()
        .filter(|doc| {
            body.sources.is_empty() || body.sources.iter().any(|s| *s == doc.source.id)
        })
        .map(|doc| {
            let haystack = format!(
                "{}\n{}\n{}",
                doc.title.to_lowercase(),
                doc.content.to_lowercase(),
                doc.metadata
                    .values()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
                    .to_lowercase()
            );
            let score = if tokens.is_empty() {
                0.0
            } else {
                let matched = tokens
                    .iter()
                    .filter(|token| haystack.contains(token.as_str()))
                    .count();
                matched as f64 / tokens.len() as f64
            };
            (score, doc)
        })
        .filter(|(score, _)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(body.max_results);

    let documents: Vec<_> = scored
        .into_iter()
        .map(|(score, doc)| {
            let mut doc = doc.clone();
            doc.relevance_score = Some(score);
            doc
        })
        .collect();

    let total_count = documents.len();
    HttpResponse::Ok().json(SearchResult {
        documents,
        total_count,
        page: 1,
        total_pages: if total_count > 0 { 1 } else { 0 },
    })
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

#[get("/api/retrieval/data_sources")]
pub async fn list_sources(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    params: web::Query<PageParams>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }

    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let total_count = state.sources.len();
    let total_pages = total_count.div_ceil(limit);

    let start = (page - 1) * limit;
    let data: Vec<_> = state
        .sources
        .iter()
        .skip(start)
        .take(limit)
        .cloned()
        .collect();

    HttpResponse::Ok().json(SourcePage {
        data,
        pagination: Pagination {
            page,
            limit,
            total_count,
            total_pages,
        },
    })
}

#[post("/api/generation/generate")]
pub async fn generate_answer(
    req: HttpRequest,
    state: web::Data<MockApiState>,
    body: web::Json<GenerationRequest>,
) -> HttpResponse {
    if authenticate(&req, &state).is_none() {
        return unauthorized();
    }

    let answer = if body.documents.is_empty() {
        format!(
            "I don't have enough information to answer '{}'. Please provide relevant documents.",
            body.question
        )
    } else {
        let titles: Vec<&str> = body.documents.iter().map(|d| d.title.as_str()).collect();
        format!(
            "Based on {}, here's a draft answer to '{}'.",
            titles.join(", "),
            body.question
        )
    };

    let mut token_usage = HashMap::new();
    token_usage.insert("prompt_tokens".to_string(), 350);
    token_usage.insert("completion_tokens".to_string(), 200);
    token_usage.insert("total_tokens".to_string(), 550);

    HttpResponse::Ok().json(GenerationResponse {
        answer,
        model_used: body.model.clone(),
        token_usage,
    })
}

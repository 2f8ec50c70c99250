//! In-process stand-in for the backend REST API.
//!
//! Holds collections, QA pairs, and issued tokens in memory and serves the
//! same routes and JSON shapes as the real service, so integration tests and
//! local development run against an actual HTTP boundary.

pub mod routes;
pub mod seed;

use crate::domain::auth::User;
use crate::domain::entities::{Collection, Document, QaPair, SourceInfo};
use crate::domain::error::{AppError, Result};
use actix_cors::Cors;
use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpServer};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

pub struct DemoUser {
    pub username: String,
    pub password: String,
    pub user: User,
}

#[derive(Default)]
pub struct MockDb {
    pub tokens: HashMap<String, User>,
    pub collections: Vec<Collection>,
    pub qa_pairs: Vec<QaPair>,
}

pub struct MockApiState {
    pub db: Mutex<MockDb>,
    pub users: Vec<DemoUser>,
    pub documents: Vec<Document>,
    pub sources: Vec<SourceInfo>,
}

impl MockApiState {
    pub fn new() -> Self {
        Self {
            db: Mutex::new(MockDb::default()),
            users: seed::demo_users(),
            documents: seed::sample_documents(),
            sources: seed::sample_sources(),
        }
    }
}

impl Default for MockApiState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MockApiServer {
    pub base_url: String,
    handle: ServerHandle,
}

impl MockApiServer {
    pub async fn stop(&self) {
        self.handle.stop(true).await;
    }
}

/// Starts the mock API on an ephemeral localhost port and detaches it.
pub async fn start_mock_api() -> Result<MockApiServer> {
    let state = web::Data::new(MockApiState::new());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .service(routes::health)
            .service(routes::login)
            .service(routes::current_user)
            .service(routes::logout)
            .service(routes::list_collections)
            .service(routes::create_collection)
            .service(routes::get_qa_pair)
            .service(routes::update_qa_pair)
            .service(routes::delete_qa_pair)
            .service(routes::get_collection)
            .service(routes::update_collection)
            .service(routes::delete_collection)
            .service(routes::list_qa_pairs)
            .service(routes::create_qa_pair)
            .service(routes::search_documents)
            .service(routes::list_sources)
            .service(routes::generate_answer)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .map_err(|e| AppError::Internal(format!("Failed to bind mock API server: {}", e)))?;

    let addr = server
        .addrs()
        .first()
        .copied()
        .ok_or_else(|| AppError::Internal("Mock API server has no bound address".to_string()))?;

    let server = server.run();
    let handle = server.handle();
    tokio::spawn(server);

    info!("Mock API server started on http://{}", addr);

    Ok(MockApiServer {
        base_url: format!("http://{}", addr),
        handle,
    })
}

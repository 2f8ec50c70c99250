pub mod auth_service;
pub mod collection_service;
pub mod document_filters;
pub mod ui_state;
pub mod validation;

// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod file_history_store;
pub mod firestore_repository;
pub mod http_response;
pub mod identity_toolkit;
pub mod json_mapper;

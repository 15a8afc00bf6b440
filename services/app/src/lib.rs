pub mod adapters;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod render;
pub mod state;

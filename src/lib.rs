pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod flags;
pub mod metrics;
pub mod models;
pub mod store;
pub mod tracker;

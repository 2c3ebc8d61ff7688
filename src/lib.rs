pub mod api;
pub mod auth;
pub mod config;
pub mod dataset;
pub mod models;
pub mod pipeline;

pub mod app_state;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod graphql;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

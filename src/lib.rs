pub mod auth;
pub mod config;
pub mod error;
pub mod fixture;
pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod routes;
pub mod state;
pub mod store;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod responder;
pub mod routes;

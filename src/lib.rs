//! JSON gateway for the Rick and Morty API with an admin-managed user store.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod models;
pub mod proxy;
pub mod resource;
pub mod routes;
pub mod store;
pub mod users;

pub use client::RickMortyClient;
pub use config::Config;
pub use error::{ProxyError, ProxyResult};
pub use routes::{router, AppState};

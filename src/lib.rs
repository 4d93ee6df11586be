pub mod api;
pub mod client;
pub mod domain;
pub mod dto;
pub mod infra;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

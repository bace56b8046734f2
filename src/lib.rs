pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod git;
pub mod model;
pub mod publish;
pub mod version;

mod api;
mod flock;

pub use api::{CatalogPublisher, CatalogPublisherBuilder};

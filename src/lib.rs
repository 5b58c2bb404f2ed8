pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use crate::{config::Config, service::MovieService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub movies: Arc<dyn MovieService>,
}

pub mod config;
pub mod config_store;
pub mod db;
pub mod error;
pub mod files;
pub mod history;
pub mod logging;
pub mod routes;
pub mod sheet;
pub mod state;
pub mod translate;

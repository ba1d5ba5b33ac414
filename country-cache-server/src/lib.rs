// Library interface for country-cache-server
// Exposes modules for integration testing

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;

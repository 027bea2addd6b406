pub mod api_client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod logger;
pub mod request;
pub mod session;
pub mod transport;

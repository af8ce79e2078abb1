pub mod app;
pub mod cors;
pub mod envelope;
pub mod extract;
pub mod observability;
pub mod routes;
pub mod shutdown;
pub mod state;

pub mod configuration;
pub mod dispatch;
pub mod domain;
pub mod ingest;
pub mod routes;
pub mod session;
pub mod startup;
pub mod telemetry;

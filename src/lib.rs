pub mod authorization;
pub mod cms_client;
pub mod config;
pub mod domain;
pub mod email_client;
pub mod notifications;
pub mod routes;
pub mod startup;
pub mod stats;
pub mod store;
pub mod telemetry;

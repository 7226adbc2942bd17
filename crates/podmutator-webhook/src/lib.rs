//! podmutator admission webhook
//!
//! A mutating admission webhook that injects configured labels, node selector
//! entries and topology spread constraints into Pods at creation time. The
//! patch itself is computed by [`podmutator_patch`]; this crate loads the
//! config, speaks the AdmissionReview protocol and serves it over TLS.
//!
//! # Endpoints
//!
//! - `POST /mutate` - AdmissionReview in, AdmissionReview with JSON patch out
//! - `GET /health` - Liveness check

#![deny(missing_docs)]

pub mod config;
pub mod server;
pub mod telemetry;
pub mod webhook;

pub use config::{load_mutation_config, ConfigError, ConfigPaths, ConfigSource, FsConfigSource};
pub use server::{start_server, ServerConfig, ServerError};
pub use telemetry::{init_tracing, LogFormat};
pub use webhook::{webhook_router, WebhookError, WebhookState};

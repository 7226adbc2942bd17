//! Patch generation for the podmutator admission webhook
//!
//! Turns a Pod and a [`MutationConfig`] into an ordered list of JSON Patch
//! operations. Nothing in this crate performs I/O: every function is a pure
//! computation over borrowed data, so it can run on any request task without
//! coordination.
//!
//! # Pipeline
//!
//! ```text
//! Pod ──► PodSnapshot ──► selector gate ──► labels ──► nodeSelector ──► topologySpreadConstraints
//!                              │                                                   │
//!                              └── no match: empty plan           ordered Vec<PatchOperation>
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod labels;
pub mod mutator;
pub mod node_selector;
pub mod pointer;
pub mod selector;
pub mod topology;

pub use config::{Labels, MutationConfig, DEFAULT_LABEL_KEY, DEFAULT_LABEL_VALUE};
pub use error::{PatchError, Result};
pub use mutator::{plan_mutation, MutationPlan, PodSnapshot};
pub use pointer::escape_token;
pub use selector::matches;
pub use topology::SpreadConstraint;

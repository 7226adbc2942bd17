//! Mutation configuration
//!
//! Built once at process start and shared read-only between requests.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::topology::SpreadConstraint;

/// String-to-string map used for labels and node selectors
pub type Labels = BTreeMap<String, String>;

/// Label key injected when no labels are configured
pub const DEFAULT_LABEL_KEY: &str = "mutated";

/// Label value injected when no labels are configured
pub const DEFAULT_LABEL_VALUE: &str = "true";

/// What the webhook injects into Pods, and which Pods it targets
#[derive(Clone, Debug, PartialEq)]
pub struct MutationConfig {
    /// Labels added to `metadata.labels` when missing
    pub labels: Labels,
    /// Entries added to or replaced in `spec.nodeSelector`
    pub node_selector: Labels,
    /// Constraints merged into `spec.topologySpreadConstraints` by topologyKey
    pub topology_spread_constraints: Vec<SpreadConstraint>,
    /// Labels a Pod must carry to be mutated; `None` disables the gate
    pub pod_selector: Option<Labels>,
}

impl MutationConfig {
    /// Build a config, substituting the default label when `labels` is empty
    pub fn new(
        labels: Labels,
        node_selector: Labels,
        topology_spread_constraints: Vec<SpreadConstraint>,
        pod_selector: Option<Labels>,
    ) -> Self {
        let labels = if labels.is_empty() {
            default_labels()
        } else {
            labels
        };

        Self {
            labels,
            node_selector,
            topology_spread_constraints,
            pod_selector,
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self::new(Labels::new(), Labels::new(), Vec::new(), None)
    }
}

/// `{"mutated": "true"}`
pub fn default_labels() -> Labels {
    Labels::from([(DEFAULT_LABEL_KEY.to_string(), DEFAULT_LABEL_VALUE.to_string())])
}

/// Render a label map as a JSON object
pub(crate) fn labels_value(labels: &Labels) -> Value {
    Value::Object(
        labels
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

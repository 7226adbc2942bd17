//! Patch assembly
//!
//! Runs the selector gate and then each field builder in a fixed order:
//! labels, node selector, topology spread constraints. Operations keep the
//! order their builder produced them in.

use json_patch::{Patch, PatchOperation};
use k8s_openapi::api::core::v1::{Pod, TopologySpreadConstraint};
use tracing::debug;

use crate::config::{Labels, MutationConfig};
use crate::error::Result;
use crate::labels::build_label_patch;
use crate::node_selector::build_node_selector_patch;
use crate::selector;
use crate::topology::build_topology_patch;

/// The parts of a Pod the builders look at
#[derive(Clone, Copy, Debug, Default)]
pub struct PodSnapshot<'a> {
    /// `metadata.labels`
    pub labels: Option<&'a Labels>,
    /// `spec.nodeSelector`
    pub node_selector: Option<&'a Labels>,
    /// `spec.topologySpreadConstraints`
    pub topology_spread_constraints: Option<&'a [TopologySpreadConstraint]>,
}

impl<'a> From<&'a Pod> for PodSnapshot<'a> {
    fn from(pod: &'a Pod) -> Self {
        let spec = pod.spec.as_ref();
        Self {
            labels: pod.metadata.labels.as_ref(),
            node_selector: spec.and_then(|s| s.node_selector.as_ref()),
            topology_spread_constraints: spec
                .and_then(|s| s.topology_spread_constraints.as_deref()),
        }
    }
}

/// Outcome of planning a mutation for one Pod
#[derive(Clone, Debug, Default)]
pub struct MutationPlan {
    /// Whether the Pod passed the selector gate
    pub selected: bool,
    /// Fields that received at least one operation
    pub fields: Vec<&'static str>,
    /// Operations in application order
    pub operations: Vec<PatchOperation>,
}

impl MutationPlan {
    /// True when there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Convert into a patch document
    pub fn into_patch(self) -> Patch {
        Patch(self.operations)
    }

    fn extend(&mut self, field: &'static str, ops: Vec<PatchOperation>) {
        if !ops.is_empty() {
            self.fields.push(field);
            self.operations.extend(ops);
        }
    }
}

/// Plan the patch that applies `config` to `pod`.
///
/// Returns an empty, unselected plan when the selector gate is configured and
/// the Pod does not match it. The node-selector and topology builders only
/// run when the config asks for those fields.
pub fn plan_mutation(config: &MutationConfig, pod: PodSnapshot<'_>) -> Result<MutationPlan> {
    if let Some(required) = &config.pod_selector {
        if !selector::matches(required, pod.labels) {
            debug!(selector = ?required, "pod does not match selector");
            return Ok(MutationPlan::default());
        }
    }

    let mut plan = MutationPlan {
        selected: true,
        ..Default::default()
    };

    plan.extend("labels", build_label_patch(pod.labels, &config.labels)?);

    if !config.node_selector.is_empty() {
        plan.extend(
            "nodeSelector",
            build_node_selector_patch(pod.node_selector, &config.node_selector)?,
        );
    }

    if !config.topology_spread_constraints.is_empty() {
        plan.extend(
            "topologySpreadConstraints",
            build_topology_patch(
                pod.topology_spread_constraints,
                &config.topology_spread_constraints,
            )?,
        );
    }

    Ok(plan)
}

//! `spec.nodeSelector` patch builder
//!
//! Unlike labels, configured node-selector entries override what the Pod
//! already asks for.

use json_patch::{AddOperation, PatchOperation, ReplaceOperation};

use crate::config::{labels_value, Labels};
use crate::error::Result;
use crate::pointer;

/// Path of the Pod node selector
pub const NODE_SELECTOR_PATH: &str = "/spec/nodeSelector";

/// Build the operations that merge `desired` into a Pod's node selector.
///
/// When the Pod has no node selector the whole map is added first and every
/// entry is then added again under its own key. The per-key adds are
/// redundant once the map exists but harmless, since operations apply in
/// order; callers rely on this exact sequence.
///
/// When a node selector exists, known keys are replaced and new keys added.
pub fn build_node_selector_patch(
    existing: Option<&Labels>,
    desired: &Labels,
) -> Result<Vec<PatchOperation>> {
    let mut ops = Vec::with_capacity(desired.len() + 1);

    if existing.is_none() {
        ops.push(PatchOperation::Add(AddOperation {
            path: pointer::parse(NODE_SELECTOR_PATH.to_string())?,
            value: labels_value(desired),
        }));
    }

    for (key, value) in desired {
        let path = pointer::map_entry(NODE_SELECTOR_PATH, key)?;
        let value = serde_json::Value::String(value.clone());
        let present = existing.is_some_and(|selector| selector.contains_key(key));

        ops.push(if present {
            PatchOperation::Replace(ReplaceOperation { path, value })
        } else {
            PatchOperation::Add(AddOperation { path, value })
        });
    }

    Ok(ops)
}

//! `metadata.labels` patch builder
//!
//! Labels already on the Pod always win: configured labels are only added
//! when their key is missing.

use json_patch::{AddOperation, PatchOperation};
use tracing::debug;

use crate::config::{labels_value, Labels};
use crate::error::Result;
use crate::pointer;

/// Path of the Pod label map
pub const LABELS_PATH: &str = "/metadata/labels";

/// Build the operations that add missing `desired` labels to a Pod.
///
/// A Pod without labels gets the whole map in one `add`. Otherwise each
/// missing key gets its own `add` and present keys are left untouched.
pub fn build_label_patch(existing: Option<&Labels>, desired: &Labels) -> Result<Vec<PatchOperation>> {
    let existing = match existing {
        Some(labels) if !labels.is_empty() => labels,
        _ => {
            return Ok(vec![PatchOperation::Add(AddOperation {
                path: pointer::parse(LABELS_PATH.to_string())?,
                value: labels_value(desired),
            })]);
        }
    };

    let mut ops = Vec::new();
    for (key, value) in desired {
        if existing.contains_key(key) {
            debug!(label = %key, "label already present on pod, skipping");
            continue;
        }
        ops.push(PatchOperation::Add(AddOperation {
            path: pointer::map_entry(LABELS_PATH, key)?,
            value: value.clone().into(),
        }));
    }

    Ok(ops)
}

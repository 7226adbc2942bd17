//! `spec.topologySpreadConstraints` patch builder
//!
//! Constraints are merged by `topologyKey`: a configured constraint replaces
//! the Pod's constraint with the same key in place and is appended otherwise.
//! Constraints on other keys are left alone.

use std::collections::HashMap;

use json_patch::{AddOperation, PatchOperation, ReplaceOperation};
use k8s_openapi::api::core::v1::TopologySpreadConstraint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PatchError, Result};
use crate::pointer;

/// Path of the Pod topology spread constraint list
pub const TOPOLOGY_PATH: &str = "/spec/topologySpreadConstraints";

/// A configured topology spread constraint
///
/// Only `topologyKey` is interpreted; every other field (`maxSkew`,
/// `whenUnsatisfiable`, `labelSelector`, ...) is carried through verbatim so
/// new Kubernetes fields need no code change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadConstraint {
    /// Node label the constraint spreads across
    pub topology_key: String,
    /// Remaining fields, untouched
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SpreadConstraint {
    /// The constraint as it appears in a Pod spec
    pub fn to_value(&self) -> Value {
        let mut fields = self.rest.clone();
        fields.insert(
            "topologyKey".to_string(),
            Value::String(self.topology_key.clone()),
        );
        Value::Object(fields)
    }
}

/// Build the operations that merge `desired` into a Pod's constraints.
///
/// - nothing desired: no operations
/// - Pod has no constraints: one `add` of the whole list
/// - otherwise `replace` at the index of the constraint sharing the
///   `topologyKey`, or an append (`/-`) when no constraint shares it
///
/// Two desired constraints with the same new key are both appended. If the
/// Pod lists a key more than once the last occurrence is replaced.
pub fn build_topology_patch(
    existing: Option<&[TopologySpreadConstraint]>,
    desired: &[SpreadConstraint],
) -> Result<Vec<PatchOperation>> {
    if desired.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(index) = desired.iter().position(|c| c.topology_key.is_empty()) {
        return Err(PatchError::MissingTopologyKey { index });
    }

    let existing = match existing {
        Some(constraints) if !constraints.is_empty() => constraints,
        _ => {
            return Ok(vec![PatchOperation::Add(AddOperation {
                path: pointer::parse(TOPOLOGY_PATH.to_string())?,
                value: Value::Array(desired.iter().map(SpreadConstraint::to_value).collect()),
            })]);
        }
    };

    let by_key: HashMap<&str, usize> = existing
        .iter()
        .enumerate()
        .map(|(index, c)| (c.topology_key.as_str(), index))
        .collect();

    desired
        .iter()
        .map(|constraint| {
            let value = constraint.to_value();
            Ok(match by_key.get(constraint.topology_key.as_str()) {
                Some(index) => PatchOperation::Replace(ReplaceOperation {
                    path: pointer::parse(format!("{TOPOLOGY_PATH}/{index}"))?,
                    value,
                }),
                None => PatchOperation::Add(AddOperation {
                    path: pointer::parse(format!("{TOPOLOGY_PATH}/-"))?,
                    value,
                }),
            })
        })
        .collect()
}

//! Pod selector gate
//!
//! Decides whether a Pod is in scope for mutation by checking that its labels
//! contain every configured selector label.

use crate::config::Labels;

/// Check whether `existing` carries every pair in `required`.
///
/// A Pod without labels never matches, even when `required` is empty. With at
/// least one label present an empty `required` set matches.
pub fn matches(required: &Labels, existing: Option<&Labels>) -> bool {
    let Some(existing) = existing.filter(|l| !l.is_empty()) else {
        return false;
    };

    required
        .iter()
        .all(|(key, value)| existing.get(key) == Some(value))
}

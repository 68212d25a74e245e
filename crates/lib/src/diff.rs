//! Grant set diffing.

use crate::types::Grant;

/// The two halves of a grant-set difference: what to revoke, what to add.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantDiff {
    /// Present on the backend but not desired.
    pub revoke: Vec<Grant>,

    /// Desired but not present on the backend.
    pub add: Vec<Grant>,
}

impl GrantDiff {
    /// True when current and desired grants already agree.
    pub fn is_empty(&self) -> bool {
        self.revoke.is_empty() && self.add.is_empty()
    }
}

/// Compute the exact set difference between current and desired grants.
///
/// Equality is structural on the whole (database, privilege) pair: the same
/// database with a different privilege counts as one revoke plus one add.
/// Pure and deterministic; both output lists come back sorted and deduped
/// so repeated runs produce identical logs.
pub fn diff_grants(current: &[Grant], desired: &[Grant]) -> GrantDiff {
    let mut revoke: Vec<Grant> = current
        .iter()
        .filter(|grant| !desired.contains(grant))
        .cloned()
        .collect();
    let mut add: Vec<Grant> = desired
        .iter()
        .filter(|grant| !current.contains(grant))
        .cloned()
        .collect();

    revoke.sort();
    revoke.dedup();
    add.sort();
    add.dedup();

    GrantDiff { revoke, add }
}

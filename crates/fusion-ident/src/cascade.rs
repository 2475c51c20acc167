//! Cascade resolution
//!
//! Removing a variant leaves a gap in its sibling group. Every sibling ranked
//! above the removed one must shift down by exactly one rank.

use crate::error::CascadeError;
use crate::identifier::FusionId;
use std::collections::BTreeMap;

/// Siblings of a deletion target split by rank
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Lower ranks, unaffected by the deletion (ascending)
    pub lower: Vec<FusionId>,
    /// Higher ranks, each shifted down by one (ascending)
    pub higher: Vec<FusionId>,
}

impl Partition {
    /// Whether the deletion requires any renumbering
    #[inline]
    #[must_use]
    pub fn needs_cascade(&self) -> bool {
        !self.higher.is_empty()
    }

    /// `(old, new)` identifier pairs the cascade applies
    ///
    /// Every member of `higher` ranks above the target, so none is a base.
    #[must_use]
    pub fn shifted(&self) -> Vec<(FusionId, FusionId)> {
        self.higher
            .iter()
            .filter_map(|id| id.bump_down().ok().map(|new| (id.clone(), new)))
            .collect()
    }
}

/// Split the target's siblings into lower and higher ranks
///
/// Members outside the target's group are ignored. The target may appear
/// in `members` at most once.
///
/// # Errors
/// Returns [`CascadeError::DuplicateRank`] when two members of the group hold
/// the same rank, i.e. the same variant is listed more than once.
pub fn partition(target: &FusionId, members: &[FusionId]) -> Result<Partition, CascadeError> {
    let mut by_rank: BTreeMap<u32, &FusionId> = BTreeMap::new();
    by_rank.insert(target.rank(), target);
    let mut target_seen = false;

    for member in members.iter().filter(|m| m.is_sibling_of(target)) {
        if member == target && !target_seen {
            target_seen = true;
            continue;
        }
        if let Some(existing) = by_rank.insert(member.rank(), member) {
            return Err(CascadeError::DuplicateRank {
                group: target.group_key().to_string(),
                rank: member.rank(),
                first: existing.to_string(),
                second: member.to_string(),
            });
        }
    }

    let mut split = Partition::default();
    for (rank, id) in by_rank {
        match rank.cmp(&target.rank()) {
            std::cmp::Ordering::Less => split.lower.push(id.clone()),
            std::cmp::Ordering::Greater => split.higher.push(id.clone()),
            std::cmp::Ordering::Equal => {}
        }
    }
    Ok(split)
}

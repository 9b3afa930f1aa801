use std::collections::HashSet;

use itertools::Itertools;
use log::{debug, trace};

use crate::provider::{RemoteRewrite, Rewrite};

/// The changes needed to turn the current rewrites into the target rewrites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub create_actions: Vec<Rewrite>,
    pub delete_actions: Vec<RemoteRewrite>,
}

impl Plan {
    /// Compare the current rewrites of a provider against a target set.
    ///
    /// Rewrites are matched on their `(name, content)` pair only.
    /// Anything only present in `current` is deleted, anything only present in `target` is created,
    /// rewrites present in both are left alone. Duplicates in `target` result in a single create action.
    pub fn generate(current: &[RemoteRewrite], target: &[Rewrite]) -> Plan {
        let wanted: HashSet<&Rewrite> = target.iter().collect();
        let existing: HashSet<&Rewrite> = current.iter().map(|r| &r.rewrite).collect();
        debug!(
            "Comparing {} current against {} target rewrites",
            existing.len(),
            wanted.len()
        );

        let delete_actions = current
            .iter()
            .filter(|r| !wanted.contains(&r.rewrite))
            .inspect(|r| trace!("Removing stale rewrite {}", r))
            .cloned()
            .collect();

        let create_actions = target
            .iter()
            .unique()
            .filter(|r| !existing.contains(r))
            .inspect(|r| trace!("New rewrite: {}", r))
            .cloned()
            .collect();

        Plan {
            create_actions,
            delete_actions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.create_actions.is_empty() && self.delete_actions.is_empty()
    }
}

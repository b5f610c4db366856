use std::collections::HashMap;

use crate::catalog::ApprovalPolicy;
use crate::event::Actor;

/// Wildcard area granting approval everywhere.
const ANY_AREA: &str = "*";

/// Fixed actor-to-areas table, usually read from the `[approvals]` config section.
#[derive(Debug, Clone, Default)]
pub struct StaticApprovals {
    areas: HashMap<String, Vec<String>>,
}

impl StaticApprovals {
    pub fn new(areas: HashMap<String, Vec<String>>) -> Self {
        StaticApprovals { areas }
    }

    pub fn grant(mut self, actor: &str, area: &str) -> Self {
        self.areas
            .entry(actor.to_string())
            .or_default()
            .push(area.to_string());
        self
    }
}

impl ApprovalPolicy for StaticApprovals {
    fn can_approve(&self, actor: &Actor, area: &str) -> bool {
        self.areas
            .get(&actor.0)
            .is_some_and(|areas| areas.iter().any(|a| a == area || a == ANY_AREA))
    }
}

//! Playbook identity targets for the outlier detector.
//!
//! Unlike the compliance identity ranges these are `{center, range}` pairs:
//! a table is flagged when it sits more than `range` from `center`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::guardrails::normalize_playbook_key;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityTarget {
    pub center: f64,
    pub range: f64,
}

impl IdentityTarget {
    const fn new(center: f64, range: f64) -> Self {
        Self { center, range }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybookTargets {
    pub playbook: &'static str,
    pub avg_yards: IdentityTarget,
    pub explosive_rate: IdentityTarget,
    pub turnover_rate: IdentityTarget,
}

pub static PLAYBOOK_TARGETS: [PlaybookTargets; 5] = [
    PlaybookTargets {
        playbook: "West Coast",
        avg_yards: IdentityTarget::new(7.0, 1.5),
        explosive_rate: IdentityTarget::new(18.0, 4.0),
        turnover_rate: IdentityTarget::new(12.0, 3.0),
    },
    PlaybookTargets {
        playbook: "Spread",
        avg_yards: IdentityTarget::new(7.5, 2.0),
        explosive_rate: IdentityTarget::new(20.0, 5.0),
        turnover_rate: IdentityTarget::new(13.0, 3.0),
    },
    PlaybookTargets {
        playbook: "Air Raid",
        avg_yards: IdentityTarget::new(10.0, 2.0),
        explosive_rate: IdentityTarget::new(25.0, 5.0),
        turnover_rate: IdentityTarget::new(15.0, 3.0),
    },
    PlaybookTargets {
        playbook: "Smashmouth",
        avg_yards: IdentityTarget::new(6.0, 1.5),
        explosive_rate: IdentityTarget::new(12.0, 4.0),
        turnover_rate: IdentityTarget::new(10.0, 3.0),
    },
    PlaybookTargets {
        playbook: "Wide Zone",
        avg_yards: IdentityTarget::new(6.5, 1.5),
        explosive_rate: IdentityTarget::new(15.0, 4.0),
        turnover_rate: IdentityTarget::new(11.0, 3.0),
    },
];

static TARGETS_BY_KEY: Lazy<HashMap<String, &'static PlaybookTargets>> = Lazy::new(|| {
    PLAYBOOK_TARGETS
        .iter()
        .map(|t| (normalize_playbook_key(t.playbook), t))
        .collect()
});

/// Case-insensitive lookup.
pub fn playbook_targets(playbook: &str) -> Option<&'static PlaybookTargets> {
    TARGETS_BY_KEY.get(&normalize_playbook_key(playbook)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case_and_spacing() {
        let air_raid = playbook_targets("AIR RAID").unwrap();
        assert_eq!(air_raid.avg_yards, IdentityTarget::new(10.0, 2.0));
        assert_eq!(playbook_targets("air_raid"), Some(air_raid));
        assert!(playbook_targets("Pistol").is_none());
    }
}

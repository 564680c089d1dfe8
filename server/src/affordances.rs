use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::league::JoinAffordance;

/// Join controls the dispatcher currently answers for, keyed by league id.
#[derive(Default)]
pub struct AffordanceRegistry {
    by_league: RwLock<HashMap<String, JoinAffordance>>,
}

impl AffordanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an identical affordance was already registered.
    pub fn register(&self, affordance: JoinAffordance) -> bool {
        let mut map = self.by_league.write().unwrap_or_else(|p| p.into_inner());
        match map.get(&affordance.league_id) {
            Some(existing) if *existing == affordance => false,
            _ => {
                map.insert(affordance.league_id.clone(), affordance);
                true
            }
        }
    }

    pub fn get(&self, league_id: &str) -> Option<JoinAffordance> {
        let map = self.by_league.read().unwrap_or_else(|p| p.into_inner());
        map.get(league_id).cloned()
    }

    pub fn remove(&self, league_id: &str) -> Option<JoinAffordance> {
        let mut map = self.by_league.write().unwrap_or_else(|p| p.into_inner());
        map.remove(league_id)
    }

    pub fn len(&self) -> usize {
        self.by_league.read().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::league::RankRequirement;

    #[test]
    fn registering_twice_is_a_no_op() {
        let registry = AffordanceRegistry::new();
        let affordance = JoinAffordance {
            league_id: "1".into(),
            rank_required: RankRequirement::Open,
        };
        assert!(registry.register(affordance.clone()));
        assert!(!registry.register(affordance));
        assert_eq!(registry.len(), 1);

        let regated = JoinAffordance {
            league_id: "1".into(),
            rank_required: RankRequirement::Role("gold".into()),
        };
        assert!(registry.register(regated.clone()));
        assert_eq!(registry.get("1"), Some(regated));
        assert!(registry.remove("1").is_some());
        assert!(registry.get("1").is_none());
    }
}

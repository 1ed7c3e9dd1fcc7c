use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use blackjack_engine::errors::RoundError;
use blackjack_engine::round::{Round, RoundConfig, RoundSnapshot};
use thiserror::Error;
use uuid::Uuid;

pub type RoundId = String;

/// A player decision addressed to a round.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Surrender,
    Split,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::Double => "double",
            Action::Surrender => "surrender",
            Action::Split => "split",
        }
    }
}

/// Process-wide store of live rounds.
///
/// Each round sits behind its own mutex, so actions on one round are
/// serialized while distinct rounds proceed independently. Rounds are
/// memory-resident and kept until the process exits; there is no expiry
/// or deletion.
#[derive(Debug, Default)]
pub struct RoundRegistry {
    rounds: RwLock<HashMap<RoundId, Arc<Mutex<Round>>>>,
}

impl RoundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deals a fresh round under a new id and returns its opening
    /// snapshot.
    pub fn create_round(&self, config: RoundConfig) -> Result<RoundSnapshot, TableError> {
        let id = Uuid::new_v4().to_string();
        let round = Round::new(id.clone(), config)?;
        let snapshot = round.snapshot();

        {
            let mut guard = self
                .rounds
                .write()
                .map_err(|_| TableError::StoragePoisoned)?;
            guard.insert(id.clone(), Arc::new(Mutex::new(round)));
        }

        tracing::info!(
            round_id = %id,
            status = ?snapshot.status,
            "dealt new round"
        );

        Ok(snapshot)
    }

    /// Current snapshot of a round, masked per its status.
    pub fn snapshot(&self, id: &RoundId) -> Result<RoundSnapshot, TableError> {
        let round = self.get(id)?;
        let guard = round.lock().map_err(|_| TableError::StoragePoisoned)?;
        Ok(guard.snapshot())
    }

    /// Applies one player action to a round and returns the resulting
    /// snapshot. The engine validates before mutating, so a rejected
    /// action leaves the round untouched.
    pub fn apply(&self, id: &RoundId, action: Action) -> Result<RoundSnapshot, TableError> {
        let round = self.get(id)?;
        let mut guard = round.lock().map_err(|_| TableError::StoragePoisoned)?;

        let result = match action {
            Action::Hit => guard.hit(),
            Action::Stand => guard.stand(),
            Action::Double => guard.double(),
            Action::Surrender => guard.surrender(),
            Action::Split => guard.split(),
        };

        match result {
            Ok(()) => {
                tracing::debug!(
                    round_id = %id,
                    action = action.name(),
                    status = ?guard.status(),
                    "action applied"
                );
                Ok(guard.snapshot())
            }
            Err(err) => {
                tracing::debug!(
                    round_id = %id,
                    action = action.name(),
                    error = %err,
                    "action rejected"
                );
                Err(TableError::Round(err))
            }
        }
    }

    pub fn active_rounds(&self) -> Vec<RoundId> {
        match self.rounds.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn get(&self, id: &RoundId) -> Result<Arc<Mutex<Round>>, TableError> {
        let guard = self
            .rounds
            .read()
            .map_err(|_| TableError::StoragePoisoned)?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| TableError::NotFound(id.clone()))
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Round not found: {0}")]
    NotFound(RoundId),
    #[error(transparent)]
    Round(#[from] RoundError),
    #[error("Round storage poisoned")]
    StoragePoisoned,
}

impl crate::errors::IntoErrorResponse for TableError {
    fn status_code(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;
        match self {
            TableError::NotFound(_) => StatusCode::NOT_FOUND,
            TableError::Round(RoundError::ShoeExhausted) => StatusCode::INTERNAL_SERVER_ERROR,
            TableError::Round(_) => StatusCode::BAD_REQUEST,
            TableError::StoragePoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            TableError::NotFound(_) => "invalid_round",
            TableError::Round(RoundError::NotPlayerTurn) => "invalid_round",
            TableError::Round(RoundError::ShoeExhausted) => "engine_error",
            TableError::Round(_) => "illegal_action",
            TableError::StoragePoisoned => "round_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            TableError::NotFound(id) => Some(serde_json::json!({
                "round_id": id
            })),
            _ => None,
        }
    }

    fn severity(&self) -> crate::errors::ErrorSeverity {
        use crate::errors::ErrorSeverity;
        match self {
            TableError::StoragePoisoned => ErrorSeverity::Critical,
            TableError::Round(RoundError::ShoeExhausted) => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_engine::round::RoundStatus;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn creates_a_round_and_serves_its_snapshot() {
        let registry = RoundRegistry::new();
        let created = registry
            .create_round(RoundConfig::default())
            .expect("create round");

        let snapshot = registry.snapshot(&created.round_id).expect("snapshot");
        assert_eq!(snapshot.round_id, created.round_id);
        assert_eq!(snapshot.hands.len(), 1);
        assert_eq!(snapshot.hands[0].cards.len(), 2);

        if snapshot.status == RoundStatus::PlayerTurn {
            assert_eq!(snapshot.dealer.cards[1], None);
            assert_eq!(snapshot.dealer.total, None);
        }
    }

    #[test]
    fn unknown_round_id_is_not_found() {
        let registry = RoundRegistry::new();
        match registry.snapshot(&"missing".to_string()) {
            Err(TableError::NotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("expected not found, got {:?}", other),
        }
        match registry.apply(&"missing".to_string(), Action::Hit) {
            Err(TableError::NotFound(_)) => {}
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn actions_after_a_terminal_status_are_invalid() {
        let registry = RoundRegistry::new();
        let created = registry
            .create_round(RoundConfig::default())
            .expect("create round");
        let id = created.round_id.clone();

        // drive the round to a terminal status if it is not there already
        let snapshot = if created.status == RoundStatus::PlayerTurn {
            registry.apply(&id, Action::Stand).expect("stand")
        } else {
            created
        };
        assert!(snapshot.status.is_terminal());

        match registry.apply(&id, Action::Hit) {
            Err(TableError::Round(RoundError::NotPlayerTurn)) => {}
            other => panic!("expected not player turn, got {:?}", other),
        }
    }

    #[test]
    fn standing_every_hand_finishes_with_results() {
        let registry = RoundRegistry::new();
        // seeds are deterministic, so scan a few for a non-blackjack deal
        let snapshot = (0..64u64)
            .map(|seed| {
                registry
                    .create_round(RoundConfig {
                        seed: Some(seed),
                        ..RoundConfig::default()
                    })
                    .expect("create round")
            })
            .find(|s| s.status == RoundStatus::PlayerTurn)
            .expect("a playable deal within 64 seeds");

        let finished = registry
            .apply(&snapshot.round_id, Action::Stand)
            .expect("stand");
        assert_eq!(finished.status, RoundStatus::Finished);
        let results = finished.results.expect("results");
        assert_eq!(results.len(), finished.hands.len());
        let dealer_total = finished.dealer.total.expect("revealed dealer total");
        assert!(dealer_total >= 17);
    }

    #[test]
    fn concurrent_round_creation_is_safe() {
        let registry = Arc::new(RoundRegistry::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                let mut ids = Vec::new();
                for _ in 0..32 {
                    let snapshot = registry
                        .create_round(RoundConfig::default())
                        .expect("create round");
                    ids.push(snapshot.round_id);
                }
                ids
            }));
        }

        let mut unique = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("join thread") {
                assert!(unique.insert(id));
            }
        }

        assert_eq!(registry.active_rounds().len(), unique.len());
    }
}

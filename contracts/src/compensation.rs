//! # Compensation Tracker
//!
//! One small state machine per dispatched leg:
//!
//! ```text
//!            ┌──▶ DeliveredOk
//! Pending ───┼──▶ RevertedPreCustody
//!            └──▶ AbortedPostCustody
//! ```
//!
//! The three outcomes are terminal. Only pending legs are kept in full; a
//! settled leg leaves a per-state counter and a slot in a bounded window of
//! recent outcomes. A second notification for a dispatch still in that
//! window is refused, which is what stops a duplicated transport callback
//! from crediting the same principal twice.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

use nexus_protocol::types::{AssetId, DispatchId};
use nexus_protocol::wire::CompensationPayload;

/// How many settled dispatches are remembered for duplicate refusal.
pub const SETTLED_WINDOW: usize = 1_024;

#[derive(Debug, Error)]
pub enum CompensationError {
    /// Neither pending nor recently settled.
    #[error("dispatch {0} is unknown")]
    UnknownDispatch(DispatchId),

    /// A terminal outcome was already recorded for this dispatch.
    #[error("dispatch {dispatch} already settled as {state}")]
    AlreadySettled {
        dispatch: DispatchId,
        state: CompensationState,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationState {
    Pending,
    DeliveredOk,
    RevertedPreCustody,
    AbortedPostCustody,
}

impl CompensationState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CompensationState::Pending)
    }
}

impl std::fmt::Display for CompensationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompensationState::Pending => write!(f, "pending"),
            CompensationState::DeliveredOk => write!(f, "delivered"),
            CompensationState::RevertedPreCustody => write!(f, "reverted"),
            CompensationState::AbortedPostCustody => write!(f, "aborted"),
        }
    }
}

/// What the tracker knows about one leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationRecord {
    pub payload: CompensationPayload,
    pub asset: AssetId,
    pub amount: u64,
    pub state: CompensationState,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
struct SettledTotals {
    delivered: usize,
    reverted: usize,
    aborted: usize,
}

impl SettledTotals {
    fn slot(&mut self, state: CompensationState) -> Option<&mut usize> {
        match state {
            CompensationState::Pending => None,
            CompensationState::DeliveredOk => Some(&mut self.delivered),
            CompensationState::RevertedPreCustody => Some(&mut self.reverted),
            CompensationState::AbortedPostCustody => Some(&mut self.aborted),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompensationTracker {
    pending: BTreeMap<DispatchId, CompensationRecord>,
    recent: VecDeque<(DispatchId, CompensationState)>,
    totals: SettledTotals,
}

impl CompensationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly dispatched leg as pending.
    pub fn open(&mut self, dispatch: DispatchId, payload: CompensationPayload, asset: AssetId, amount: u64) {
        self.pending.insert(
            dispatch,
            CompensationRecord {
                payload,
                asset,
                amount,
                state: CompensationState::Pending,
            },
        );
    }

    /// Moves a pending leg to a terminal state and drops it from the
    /// pending set. Returns the settled record.
    pub fn settle(
        &mut self,
        dispatch: DispatchId,
        outcome: CompensationState,
    ) -> Result<CompensationRecord, CompensationError> {
        let Some(mut record) = self.pending.remove(&dispatch) else {
            return Err(match self.settled_state(&dispatch) {
                Some(state) => CompensationError::AlreadySettled { dispatch, state },
                None => CompensationError::UnknownDispatch(dispatch),
            });
        };
        if !outcome.is_terminal() {
            self.pending.insert(dispatch, record);
            return Err(CompensationError::AlreadySettled {
                dispatch,
                state: CompensationState::Pending,
            });
        }
        record.state = outcome;
        self.remember(dispatch, outcome);
        Ok(record)
    }

    /// Records the outcome of a leg this tracker never dispatched (an
    /// Entry-originated leg aborting at the hub). Refuses a dispatch it has
    /// already seen.
    pub fn record_foreign(
        &mut self,
        dispatch: DispatchId,
        payload: CompensationPayload,
        asset: AssetId,
        amount: u64,
        outcome: CompensationState,
    ) -> Result<CompensationRecord, CompensationError> {
        if let Some(state) = self.state(&dispatch) {
            return Err(CompensationError::AlreadySettled { dispatch, state });
        }
        self.remember(dispatch, outcome);
        Ok(CompensationRecord {
            payload,
            asset,
            amount,
            state: outcome,
        })
    }

    /// A leg still waiting for its outcome.
    pub fn get(&self, dispatch: &DispatchId) -> Option<&CompensationRecord> {
        self.pending.get(dispatch)
    }

    /// `None` once a settled dispatch has left the recent window.
    pub fn state(&self, dispatch: &DispatchId) -> Option<CompensationState> {
        self.pending
            .get(dispatch)
            .map(|r| r.state)
            .or_else(|| self.settled_state(dispatch))
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Legs ever settled as `state` (or currently pending).
    pub fn count(&self, state: CompensationState) -> usize {
        match state {
            CompensationState::Pending => self.pending.len(),
            CompensationState::DeliveredOk => self.totals.delivered,
            CompensationState::RevertedPreCustody => self.totals.reverted,
            CompensationState::AbortedPostCustody => self.totals.aborted,
        }
    }

    /// Settled dispatches currently remembered.
    pub fn recent(&self) -> usize {
        self.recent.len()
    }

    fn settled_state(&self, dispatch: &DispatchId) -> Option<CompensationState> {
        self.recent
            .iter()
            .rev()
            .find(|(id, _)| id == dispatch)
            .map(|(_, state)| *state)
    }

    fn remember(&mut self, dispatch: DispatchId, outcome: CompensationState) {
        if let Some(total) = self.totals.slot(outcome) {
            *total += 1;
        }
        if self.recent.len() == SETTLED_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back((dispatch, outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_protocol::types::{Address, ChainId};
    use nexus_protocol::wire::Operation;

    fn payload() -> CompensationPayload {
        CompensationPayload::Hub {
            refund_to: Address::derive("alice"),
            origin_chain: ChainId(1),
            operation: Operation::Deposit,
        }
    }

    #[test]
    fn pending_settles_exactly_once() {
        let mut tracker = CompensationTracker::new();
        let id = DispatchId::new();
        tracker.open(id, payload(), Address::derive("usdc"), 100);
        assert_eq!(tracker.pending(), 1);

        tracker.settle(id, CompensationState::AbortedPostCustody).unwrap();
        assert_eq!(tracker.state(&id), Some(CompensationState::AbortedPostCustody));

        assert!(matches!(
            tracker.settle(id, CompensationState::RevertedPreCustody),
            Err(CompensationError::AlreadySettled {
                state: CompensationState::AbortedPostCustody,
                ..
            })
        ));
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn unknown_dispatch_refused() {
        let mut tracker = CompensationTracker::new();
        assert!(matches!(
            tracker.settle(DispatchId::new(), CompensationState::DeliveredOk),
            Err(CompensationError::UnknownDispatch(_))
        ));
    }

    #[test]
    fn foreign_leg_recorded_once() {
        let mut tracker = CompensationTracker::new();
        let id = DispatchId::new();
        let usdc = Address::derive("usdc");
        tracker
            .record_foreign(id, payload(), usdc, 5, CompensationState::AbortedPostCustody)
            .unwrap();
        assert!(tracker
            .record_foreign(id, payload(), usdc, 5, CompensationState::AbortedPostCustody)
            .is_err());
        assert_eq!(tracker.count(CompensationState::AbortedPostCustody), 1);
    }

    #[test]
    fn settled_legs_leave_the_pending_set() {
        let mut tracker = CompensationTracker::new();
        let usdc = Address::derive("usdc");
        let ids: Vec<DispatchId> = (0..3).map(|_| DispatchId::new()).collect();
        for id in &ids {
            tracker.open(*id, payload(), usdc, 10);
        }
        assert_eq!(tracker.pending(), 3);

        let record = tracker.settle(ids[0], CompensationState::DeliveredOk).unwrap();
        assert_eq!(record.state, CompensationState::DeliveredOk);
        assert_eq!(record.amount, 10);
        tracker.settle(ids[1], CompensationState::RevertedPreCustody).unwrap();

        assert_eq!(tracker.pending(), 1);
        assert!(tracker.get(&ids[0]).is_none());
        assert!(tracker.get(&ids[2]).is_some());
        assert_eq!(tracker.count(CompensationState::DeliveredOk), 1);
        assert_eq!(tracker.count(CompensationState::RevertedPreCustody), 1);
    }

    #[test]
    fn history_is_bounded_but_counts_are_not() {
        let mut tracker = CompensationTracker::new();
        let usdc = Address::derive("usdc");
        let first = DispatchId::new();
        tracker.open(first, payload(), usdc, 1);
        tracker.settle(first, CompensationState::DeliveredOk).unwrap();

        for _ in 0..SETTLED_WINDOW {
            let id = DispatchId::new();
            tracker.open(id, payload(), usdc, 1);
            tracker.settle(id, CompensationState::DeliveredOk).unwrap();
        }

        assert_eq!(tracker.pending(), 0);
        assert_eq!(tracker.recent(), SETTLED_WINDOW);
        assert_eq!(tracker.count(CompensationState::DeliveredOk), SETTLED_WINDOW + 1);
        assert_eq!(tracker.state(&first), None);
        assert!(matches!(
            tracker.settle(first, CompensationState::AbortedPostCustody),
            Err(CompensationError::UnknownDispatch(_))
        ));
    }

    #[test]
    fn settling_to_pending_is_refused() {
        let mut tracker = CompensationTracker::new();
        let id = DispatchId::new();
        tracker.open(id, payload(), Address::derive("usdc"), 1);
        assert!(tracker.settle(id, CompensationState::Pending).is_err());
        assert_eq!(tracker.state(&id), Some(CompensationState::Pending));
    }
}

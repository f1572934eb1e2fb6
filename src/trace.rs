use crate::game::{BotId, Move, Position};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReturnReason {
    InventoryFull,
    TimeShort,
}

/// Which rule of the turn policy produced the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Tackle { target: BotId, at: Position },
    Retreat { threats: usize },
    ReturnToBase { reason: ReturnReason },
    Collect { diamond: Position, points: u32 },
    Explore { tile: Position },
    /// No safe exploration tile, so head home.
    FallBackToBase,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionEvent {
    pub bot: BotId,
    pub position: Position,
    pub diamonds: u32,
    pub aggressive: bool,
    pub decision: Decision,
    pub mv: Move,
}

/// Receives one event per decision the policy engine makes.
pub trait DecisionObserver: Send {
    fn on_decision(&mut self, event: &DecisionEvent);
}

/// Emits decisions as `tracing` events at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DecisionObserver for TracingObserver {
    fn on_decision(&mut self, event: &DecisionEvent) {
        tracing::debug!(
            bot = event.bot,
            position = %event.position,
            diamonds = event.diamonds,
            aggressive = event.aggressive,
            decision = ?event.decision,
            mv = %event.mv,
            "decision"
        );
    }
}

/// Keeps every event; clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<DecisionEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<DecisionEvent> {
        self.events
            .lock()
            .ok()
            .and_then(|events| events.last().cloned())
    }
}

impl DecisionObserver for RecordingObserver {
    fn on_decision(&mut self, event: &DecisionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

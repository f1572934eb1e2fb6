use crate::config::PolicyConfig;
use crate::game::{Board, BotAgent, Move};
use crate::policy::PolicyEngine;
use crate::trace::DecisionObserver;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Trait that all bots must implement
pub trait Bot: Send {
    /// Get the name of the bot
    fn name(&self) -> &str;

    /// Choose this turn's step. `me` is this bot's entry in `board.bots`.
    fn next_move(&mut self, me: &BotAgent, board: &Board) -> Move;

    /// Notified when the game starts
    fn game_start(&mut self) {}

    /// Notified when the game ends
    fn game_end(&mut self) {}
}

/// A bot driven by `PolicyEngine`.
pub struct PolicyBot {
    name: String,
    engine: PolicyEngine,
}

impl PolicyBot {
    pub fn new(name: String, config: PolicyConfig) -> Self {
        PolicyBot {
            name,
            engine: PolicyEngine::new(config),
        }
    }

    pub fn with_observer(
        name: String,
        config: PolicyConfig,
        observer: Box<dyn DecisionObserver>,
    ) -> Self {
        PolicyBot {
            name,
            engine: PolicyEngine::with_observer(config, observer),
        }
    }

    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }
}

impl Bot for PolicyBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_move(&mut self, me: &BotAgent, board: &Board) -> Move {
        self.engine.next_move(me, board)
    }

    fn game_start(&mut self) {
        self.engine.reset();
    }
}

/// Wanders to a random open neighbour each turn. Seeded, so matches replay.
pub struct RandomBot {
    name: String,
    rng: StdRng,
}

impl RandomBot {
    pub fn new(name: String, seed: u64) -> Self {
        RandomBot {
            name,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_move(&mut self, me: &BotAgent, board: &Board) -> Move {
        let moves: Vec<Move> = Move::DIRECTIONS
            .into_iter()
            .filter(|mv| board.is_valid_move(me.position, *mv))
            .collect();
        moves.choose(&mut self.rng).copied().unwrap_or(Move::STAY)
    }
}

//! Example of how to write your own bot against the arena

use diamond_arena::*;

/// Walks to the nearest diamond that fits, then goes home when full.
pub struct NearestDiamondBot {
    name: String,
}

impl NearestDiamondBot {
    pub fn new(name: String) -> Self {
        NearestDiamondBot { name }
    }

    fn target(&self, me: &BotAgent, board: &Board, router: &Router) -> Position {
        if me.capacity_left() == 0 {
            return me.base();
        }
        board
            .diamonds
            .iter()
            .filter(|d| !d.is_paired() && d.points() <= me.capacity_left())
            .min_by_key(|d| router.distance(me.position, d.position))
            .map_or(me.base(), |d| d.position)
    }
}

impl Bot for NearestDiamondBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_move(&mut self, me: &BotAgent, board: &Board) -> Move {
        let router = Router::new(board);
        let gate = BoardGate::new(board, me.position);
        let target = self.target(me, board, &router);
        StepPlanner::new(router, &gate).plan(me.position, target)
    }

    fn game_start(&mut self) {
        println!("{} is ready", self.name);
    }
}

fn main() {
    println!("Custom Bot Example\n");

    let setup = BoardSetup {
        bots: 2,
        ..BoardSetup::default()
    };
    let board = match setup.generate(11) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("Failed to generate board: {}", e);
            return;
        }
    };

    let mut arena = match Match::new(board, MatchConfig::default()) {
        Ok(arena) => arena,
        Err(e) => {
            eprintln!("Invalid board: {}", e);
            return;
        }
    };
    let seated = arena
        .seat(1, Box::new(NearestDiamondBot::new("Nearest".to_string())))
        .and_then(|_| {
            arena.seat(
                2,
                Box::new(PolicyBot::new("Adaptive".to_string(), PolicyConfig::adaptive())),
            )
        });
    if let Err(e) = seated {
        eprintln!("Failed to seat bots: {}", e);
        return;
    }

    let result = arena.play();

    println!("\nMatch completed!");
    for standing in &result.standings {
        println!("  {}: {} points", standing.name, standing.score);
    }
    if let Some(winner) = result.winner() {
        println!("Winner: {}", winner.name);
    } else {
        println!("Draw!");
    }
}

use crate::distance::Router;
use crate::game::{Board, BotAgent, Move, Position};

/// Nearest-enemy distance reported when the board has no enemies at all.
pub const NO_ENEMY_DISTANCE: u32 = 100;

/// Decides whether a bot may step onto a tile this turn.
pub trait MoveGate {
    fn is_legal_and_safe(&self, pos: Position) -> bool;
}

/// Occupancy and enemy-proximity checks for one bot on one snapshot.
pub struct Safety<'a> {
    board: &'a Board,
    me: &'a BotAgent,
    router: Router,
    contact: Option<Position>,
}

impl<'a> Safety<'a> {
    pub fn new(board: &'a Board, me: &'a BotAgent, router: Router) -> Self {
        Safety {
            board,
            me,
            router,
            contact: None,
        }
    }

    /// Same checks, except `target` counts as free so a tackle can land on it.
    pub fn with_contact(&self, target: Position) -> Safety<'a> {
        Safety {
            board: self.board,
            me: self.me,
            router: self.router,
            contact: Some(target),
        }
    }

    pub fn board(&self) -> &'a Board {
        self.board
    }

    pub fn me(&self) -> &'a BotAgent {
        self.me
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn enemies(&self) -> impl Iterator<Item = &'a BotAgent> + 'a {
        self.board.enemies(self.me.id)
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        self.board.contains(pos)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        if self.contact == Some(pos) {
            return false;
        }
        self.enemies().any(|e| e.position == pos)
    }

    pub fn is_safe(&self, pos: Position, min_enemy_distance: u32) -> bool {
        self.is_legal_and_safe(pos) && self.nearest_enemy_distance(pos) > min_enemy_distance
    }

    /// Teleporter-aware distance from `pos` to the closest enemy.
    pub fn nearest_enemy_distance(&self, pos: Position) -> u32 {
        self.enemies()
            .map(|e| self.router.distance(pos, e.position))
            .min()
            .unwrap_or(NO_ENEMY_DISTANCE)
    }

    pub fn enemies_within(&self, distance: u32) -> Vec<&'a BotAgent> {
        let origin = self.me.position;
        self.enemies()
            .filter(|e| self.router.distance(origin, e.position) <= distance)
            .collect()
    }
}

impl MoveGate for Safety<'_> {
    fn is_legal_and_safe(&self, pos: Position) -> bool {
        self.in_bounds(pos) && !self.is_occupied(pos)
    }
}

/// Adapter over the engine's own `Board::is_valid_move` for a bot at `from`.
pub struct BoardGate<'a> {
    board: &'a Board,
    from: Position,
}

impl<'a> BoardGate<'a> {
    pub fn new(board: &'a Board, from: Position) -> Self {
        BoardGate { board, from }
    }
}

impl MoveGate for BoardGate<'_> {
    fn is_legal_and_safe(&self, pos: Position) -> bool {
        let mv = Move::between(self.from, pos);
        mv.is_legal_shape() && self.board.is_valid_move(self.from, mv)
    }
}

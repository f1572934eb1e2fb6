use crate::distance::{Route, Router};
use crate::game::{Move, Position};
use crate::safety::MoveGate;

/// Turns a destination into a single legal step.
///
/// The planner looks one tile ahead only. It follows the teleporter when
/// that is strictly shorter, prefers the axis with the larger remaining
/// delta, and otherwise sidesteps in the fixed `Move::DIRECTIONS` order.
pub struct StepPlanner<'g> {
    router: Router,
    gate: &'g dyn MoveGate,
    last_move: Option<Move>,
    avoid_reversal: bool,
}

impl<'g> StepPlanner<'g> {
    pub fn new(router: Router, gate: &'g dyn MoveGate) -> Self {
        StepPlanner {
            router,
            gate,
            last_move: None,
            avoid_reversal: false,
        }
    }

    pub fn with_last_move(mut self, last_move: Option<Move>) -> Self {
        self.last_move = last_move;
        self
    }

    pub fn avoid_reversal(mut self, enabled: bool) -> Self {
        self.avoid_reversal = enabled;
        self
    }

    /// Always returns `Move::STAY` or one of `Move::DIRECTIONS`; `STAY` only
    /// when every neighbour fails the gate.
    pub fn plan(&self, from: Position, to: Position) -> Move {
        let waypoint = match self.router.route(from, to).0 {
            Route::Teleport { entry, .. } => entry,
            Route::Direct => to,
        };
        self.step_toward(from, waypoint)
    }

    /// Greedy step toward `to` ignoring teleporters.
    pub fn step_toward(&self, from: Position, to: Position) -> Move {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let along_x = (dx != 0).then(|| Move::new(dx.signum(), 0));
        let along_y = (dy != 0).then(|| Move::new(0, dy.signum()));

        // Ties go to x.
        let (primary, secondary) = if dy.abs() > dx.abs() {
            (along_y, along_x)
        } else {
            (along_x, along_y)
        };

        for mv in [primary, secondary].into_iter().flatten() {
            if self.gate.is_legal_and_safe(from.offset(mv)) {
                return mv;
            }
        }
        self.sidestep(from)
    }

    fn sidestep(&self, from: Position) -> Move {
        let forbidden = self
            .last_move
            .filter(|_| self.avoid_reversal)
            .map(|mv| mv.reverse());

        let legal: Vec<Move> = Move::DIRECTIONS
            .into_iter()
            .filter(|mv| self.gate.is_legal_and_safe(from.offset(*mv)))
            .collect();

        legal
            .iter()
            .find(|mv| Some(**mv) != forbidden)
            .or(legal.first())
            .copied()
            .unwrap_or(Move::STAY)
    }
}

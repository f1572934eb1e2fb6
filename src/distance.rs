use crate::game::{Board, Position};

/// How to get from one tile to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    /// Walk to `entry`; the engine drops the bot on `exit`.
    Teleport { entry: Position, exit: Position },
}

/// Distance oracle that knows about the board's teleporter pair.
///
/// The pair is treated as a two-way edge of cost zero. With anything other
/// than exactly two teleporters on the board the router measures plain
/// Manhattan distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Router {
    teleporters: Option<(Position, Position)>,
}

impl Router {
    pub fn new(board: &Board) -> Self {
        Router {
            teleporters: board.teleporter_pair(),
        }
    }

    pub fn direct() -> Self {
        Router { teleporters: None }
    }

    pub fn with_teleporters(a: Position, b: Position) -> Self {
        Router {
            teleporters: Some((a, b)),
        }
    }

    pub fn teleporters(&self) -> Option<(Position, Position)> {
        self.teleporters
    }

    pub fn distance(&self, a: Position, b: Position) -> u32 {
        let direct = a.distance(b);
        match self.teleporters {
            Some((t1, t2)) => {
                let via_t1 = a.distance(t1) + t2.distance(b);
                let via_t2 = a.distance(t2) + t1.distance(b);
                direct.min(via_t1).min(via_t2)
            }
            None => direct,
        }
    }

    /// Pick the route the step planner should follow and its length.
    ///
    /// A teleporter route is only chosen when strictly shorter than walking.
    /// Standing on a teleporter does not fire it, so an entry equal to `from`
    /// is skipped.
    pub fn route(&self, from: Position, to: Position) -> (Route, u32) {
        let direct = from.distance(to);
        let Some((t1, t2)) = self.teleporters else {
            return (Route::Direct, direct);
        };

        let mut best = (Route::Direct, direct);
        for (entry, exit) in [(t1, t2), (t2, t1)] {
            if entry == from {
                continue;
            }
            let length = from.distance(entry) + exit.distance(to);
            if length < best.1 {
                best = (Route::Teleport { entry, exit }, length);
            }
        }
        best
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub type BotId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Manhattan distance. All movement planning uses this metric.
    pub fn distance(&self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Straight-line distance, only used as a scoring input.
    pub fn euclidean_distance(&self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_adjacent(&self, other: Position) -> bool {
        self.distance(other) == 1
    }

    pub fn offset(&self, mv: Move) -> Position {
        Position::new(self.x + mv.dx, self.y + mv.dy)
    }

    /// Orthogonal neighbours in the fixed scan order of `Move::DIRECTIONS`.
    pub fn neighbors(&self) -> [Position; 4] {
        Move::DIRECTIONS.map(|mv| self.offset(mv))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A step vector. Bots answer every turn with one of `Move::STAY` or
/// `Move::DIRECTIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Move {
    pub dx: i32,
    pub dy: i32,
}

impl Move {
    pub const STAY: Move = Move { dx: 0, dy: 0 };

    /// Neighbour scan order: +x, -x, +y, -y.
    pub const DIRECTIONS: [Move; 4] = [
        Move { dx: 1, dy: 0 },
        Move { dx: -1, dy: 0 },
        Move { dx: 0, dy: 1 },
        Move { dx: 0, dy: -1 },
    ];

    pub fn new(dx: i32, dy: i32) -> Self {
        Move { dx, dy }
    }

    /// The step from `from` to an adjacent `to`.
    pub fn between(from: Position, to: Position) -> Self {
        Move::new(to.x - from.x, to.y - from.y)
    }

    pub fn reverse(&self) -> Move {
        Move::new(-self.dx, -self.dy)
    }

    pub fn is_stay(&self) -> bool {
        *self == Move::STAY
    }

    /// True for the zero vector and the four unit steps.
    pub fn is_legal_shape(&self) -> bool {
        self.dx.abs() + self.dy.abs() <= 1
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.dx, self.dy)
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid board dimensions {height}x{width}")]
    InvalidDimensions { height: i32, width: i32 },
    #[error("{what} at {position} lies outside the board")]
    OutOfBounds { what: String, position: Position },
    #[error("Bot id {0} appears more than once")]
    DuplicateBot(BotId),
    #[error("Unknown bot id {0}")]
    UnknownBot(BotId),
    #[error("Malformed board snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotProperties {
    #[serde(default)]
    pub name: String,
    pub diamonds: u32,
    pub inventory_size: u32,
    #[serde(default)]
    pub score: u32,
    pub milliseconds_left: u64,
    pub base: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotAgent {
    pub id: BotId,
    pub position: Position,
    pub properties: BotProperties,
}

impl BotAgent {
    pub fn capacity_left(&self) -> u32 {
        self.properties
            .inventory_size
            .saturating_sub(self.properties.diamonds)
    }

    pub fn seconds_left(&self) -> u64 {
        self.properties.milliseconds_left / 1000
    }

    pub fn base(&self) -> Position {
        self.properties.base
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiamondProperties {
    pub points: u32,
    #[serde(default)]
    pub pair_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diamond {
    pub id: u32,
    pub position: Position,
    pub properties: DiamondProperties,
}

impl Diamond {
    pub fn points(&self) -> u32 {
        self.properties.points
    }

    /// Paired diamonds are already linked to something else and are not ours to take.
    pub fn is_paired(&self) -> bool {
        self.properties.pair_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    #[serde(rename = "TeleportGameObject")]
    Teleporter,
    #[serde(rename = "BaseGameObject")]
    Base,
    #[serde(rename = "DiamondButtonGameObject")]
    DiamondButton,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameObject {
    pub id: u32,
    pub position: Position,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
}

/// One turn's view of the world, produced by the game engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub height: i32,
    pub width: i32,
    #[serde(default)]
    pub bots: Vec<BotAgent>,
    #[serde(default)]
    pub diamonds: Vec<Diamond>,
    #[serde(default)]
    pub game_objects: Vec<GameObject>,
}

impl Board {
    pub fn new(height: i32, width: i32) -> Self {
        Board {
            height,
            width,
            bots: Vec::new(),
            diamonds: Vec::new(),
            game_objects: Vec::new(),
        }
    }

    /// Parse and validate a snapshot.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let board: Board = serde_json::from_str(json)?;
        board.validate()?;
        Ok(board)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.height <= 0 || self.width <= 0 {
            return Err(GameError::InvalidDimensions {
                height: self.height,
                width: self.width,
            });
        }

        let mut seen = HashSet::new();
        for bot in &self.bots {
            if !seen.insert(bot.id) {
                return Err(GameError::DuplicateBot(bot.id));
            }
            self.check_on_board(&format!("Bot {}", bot.id), bot.position)?;
            self.check_on_board(&format!("Base of bot {}", bot.id), bot.base())?;
        }
        for diamond in &self.diamonds {
            self.check_on_board(&format!("Diamond {}", diamond.id), diamond.position)?;
        }
        for object in &self.game_objects {
            self.check_on_board(&format!("Object {}", object.id), object.position)?;
        }
        Ok(())
    }

    fn check_on_board(&self, what: &str, position: Position) -> Result<(), GameError> {
        if self.contains(position) {
            Ok(())
        } else {
            Err(GameError::OutOfBounds {
                what: what.to_string(),
                position,
            })
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.height && pos.y >= 0 && pos.y < self.width
    }

    pub fn center(&self) -> Position {
        Position::new(self.height / 2, self.width / 2)
    }

    pub fn bot(&self, id: BotId) -> Option<&BotAgent> {
        self.bots.iter().find(|b| b.id == id)
    }

    pub fn bot_at(&self, pos: Position) -> Option<&BotAgent> {
        self.bots.iter().find(|b| b.position == pos)
    }

    /// Every bot other than `me`.
    pub fn enemies(&self, me: BotId) -> impl Iterator<Item = &BotAgent> + '_ {
        self.bots.iter().filter(move |b| b.id != me)
    }

    /// The two teleporter tiles, or `None` unless exactly two teleporters exist.
    pub fn teleporter_pair(&self) -> Option<(Position, Position)> {
        let mut teleporters = self
            .game_objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Teleporter);
        let first = teleporters.next()?;
        let second = teleporters.next()?;
        if teleporters.next().is_some() {
            return None;
        }
        Some((first.position, second.position))
    }

    /// The engine's move validity check: the step must be a unit (or zero)
    /// vector that lands on the board, on a tile no other bot occupies.
    pub fn is_valid_move(&self, from: Position, mv: Move) -> bool {
        if !mv.is_legal_shape() {
            return false;
        }
        let to = from.offset(mv);
        if !self.contains(to) {
            return false;
        }
        mv.is_stay() || self.bot_at(to).is_none()
    }
}

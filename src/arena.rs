use crate::bot::Bot;
use crate::game::{
    Board, BotAgent, BotId, BotProperties, Diamond, DiamondProperties, GameError, GameObject, Move,
    ObjectKind, Position,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

pub struct MatchConfig {
    pub max_ticks: usize,
    /// Clock time every bot loses per tick.
    pub millis_per_tick: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            max_ticks: 60,
            millis_per_tick: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub id: BotId,
    pub name: String,
    pub score: u32,
    pub illegal_moves: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub ticks: usize,
    /// Highest score first, lower id first on equal scores.
    pub standings: Vec<Standing>,
}

impl MatchResult {
    /// The sole leader, or `None` when the top score is shared.
    pub fn winner(&self) -> Option<&Standing> {
        let first = self.standings.first()?;
        match self.standings.get(1) {
            Some(second) if second.score == first.score => None,
            _ => Some(first),
        }
    }
}

/// Runs bots against each other on one board.
///
/// Every tick each seated bot with time left sees a fresh copy of the board
/// and answers with a move, which is applied before the next bot is asked.
/// Stepping onto another bot tackles it; stepping onto a teleporter jumps
/// to its twin; diamonds are picked up on arrival and scored at the base.
pub struct Match {
    config: MatchConfig,
    board: Board,
    seats: Vec<(BotId, Box<dyn Bot>)>,
    illegal_moves: HashMap<BotId, u32>,
    ticks: usize,
}

impl Match {
    pub fn new(board: Board, config: MatchConfig) -> Result<Self, GameError> {
        board.validate()?;
        Ok(Match {
            config,
            board,
            seats: Vec::new(),
            illegal_moves: HashMap::new(),
            ticks: 0,
        })
    }

    /// Hand control of the agent `id` to `bot`.
    pub fn seat(&mut self, id: BotId, bot: Box<dyn Bot>) -> Result<(), GameError> {
        if self.board.bot(id).is_none() {
            return Err(GameError::UnknownBot(id));
        }
        if self.seats.iter().any(|(seated, _)| *seated == id) {
            return Err(GameError::DuplicateBot(id));
        }
        self.seats.push((id, bot));
        Ok(())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn play(&mut self) -> MatchResult {
        info!(
            bots = self.seats.len(),
            height = self.board.height,
            width = self.board.width,
            diamonds = self.board.diamonds.len(),
            "match starting"
        );
        for (_, bot) in &mut self.seats {
            bot.game_start();
        }

        while self.ticks < self.config.max_ticks && !self.is_finished() {
            self.play_tick();
        }

        for (_, bot) in &mut self.seats {
            bot.game_end();
        }

        let result = self.result();
        match result.winner() {
            Some(winner) => info!(
                ticks = result.ticks,
                winner = %winner.name,
                score = winner.score,
                "match finished"
            ),
            None => info!(ticks = result.ticks, "match finished in a tie"),
        }
        result
    }

    /// One round of moves followed by the clock tick.
    pub fn play_tick(&mut self) {
        for index in 0..self.seats.len() {
            let id = self.seats[index].0;
            let snapshot = self.board.clone();
            let Some(me) = snapshot.bot(id) else {
                continue;
            };
            if me.properties.milliseconds_left == 0 {
                continue;
            }
            let mv = self.seats[index].1.next_move(me, &snapshot);
            self.apply_move(id, mv);
        }

        for bot in &mut self.board.bots {
            bot.properties.milliseconds_left = bot
                .properties
                .milliseconds_left
                .saturating_sub(self.config.millis_per_tick);
        }
        self.ticks += 1;
    }

    /// Out of time everywhere, or nothing left to collect or deliver.
    pub fn is_finished(&self) -> bool {
        let out_of_time = self
            .board
            .bots
            .iter()
            .all(|b| b.properties.milliseconds_left == 0);
        let nothing_left = self.board.diamonds.iter().all(|d| d.is_paired())
            && self.board.bots.iter().all(|b| b.properties.diamonds == 0);
        out_of_time || nothing_left
    }

    pub fn result(&self) -> MatchResult {
        let mut standings: Vec<Standing> = self
            .board
            .bots
            .iter()
            .map(|agent| Standing {
                id: agent.id,
                name: self
                    .seats
                    .iter()
                    .find(|(id, _)| *id == agent.id)
                    .map_or_else(|| agent.properties.name.clone(), |(_, bot)| bot.name().to_string()),
                score: agent.properties.score,
                illegal_moves: self.illegal_moves.get(&agent.id).copied().unwrap_or(0),
            })
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        MatchResult {
            ticks: self.ticks,
            standings,
        }
    }

    fn apply_move(&mut self, id: BotId, mv: Move) {
        let Some(mover) = self.board.bots.iter().position(|b| b.id == id) else {
            return;
        };
        if mv.is_stay() {
            return;
        }

        let from = self.board.bots[mover].position;
        let to = from.offset(mv);
        if !mv.is_legal_shape() || !self.board.contains(to) {
            warn!(bot = id, position = %from, mv = %mv, "illegal move");
            *self.illegal_moves.entry(id).or_default() += 1;
            return;
        }

        if let Some(victim) = self.board.bots.iter().position(|b| b.position == to) {
            if !self.tackle(mover, victim) {
                debug!(bot = id, position = %to, "tackle blocked");
                return;
            }
        }

        self.board.bots[mover].position = to;
        let landing = self.teleport(mover, to);
        self.pick_up(mover, landing);
        self.deposit(mover, landing);
    }

    /// Steal what fits and send the victim home. Fails when the victim's
    /// base is occupied.
    fn tackle(&mut self, mover: usize, victim: usize) -> bool {
        let home = self.board.bots[victim].base();
        if self.board.bot_at(home).is_some() {
            return false;
        }

        let stolen = self.board.bots[victim]
            .properties
            .diamonds
            .min(self.board.bots[mover].capacity_left());
        self.board.bots[victim].properties.diamonds -= stolen;
        self.board.bots[victim].position = home;
        self.board.bots[mover].properties.diamonds += stolen;

        info!(
            bot = self.board.bots[mover].id,
            victim = self.board.bots[victim].id,
            stolen,
            "tackle"
        );
        true
    }

    fn teleport(&mut self, mover: usize, at: Position) -> Position {
        let Some((a, b)) = self.board.teleporter_pair() else {
            return at;
        };
        let exit = if at == a {
            b
        } else if at == b {
            a
        } else {
            return at;
        };
        if self.board.bot_at(exit).is_some() {
            return at;
        }
        self.board.bots[mover].position = exit;
        exit
    }

    fn pick_up(&mut self, mover: usize, at: Position) {
        let capacity = self.board.bots[mover].capacity_left();
        let found = self
            .board
            .diamonds
            .iter()
            .position(|d| d.position == at && !d.is_paired() && d.points() <= capacity);
        if let Some(index) = found {
            let diamond = self.board.diamonds.remove(index);
            self.board.bots[mover].properties.diamonds += diamond.points();
            debug!(
                bot = self.board.bots[mover].id,
                points = diamond.points(),
                position = %at,
                "picked up diamond"
            );
        }
    }

    fn deposit(&mut self, mover: usize, at: Position) {
        let agent = &mut self.board.bots[mover];
        if at == agent.base() && agent.properties.diamonds > 0 {
            let delivered = agent.properties.diamonds;
            agent.properties.score += delivered;
            agent.properties.diamonds = 0;
            info!(
                bot = agent.id,
                delivered,
                score = agent.properties.score,
                "deposited"
            );
        }
    }
}

/// Parameters for generating a random starting board.
#[derive(Debug, Clone)]
pub struct BoardSetup {
    pub height: i32,
    pub width: i32,
    pub bots: u32,
    pub diamonds: usize,
    /// Chance that a diamond is worth two points instead of one.
    pub red_chance: f64,
    pub teleporters: bool,
    pub inventory_size: u32,
    pub milliseconds: u64,
}

impl Default for BoardSetup {
    fn default() -> Self {
        BoardSetup {
            height: 15,
            width: 15,
            bots: 3,
            diamonds: 20,
            red_chance: 0.2,
            teleporters: true,
            inventory_size: 5,
            milliseconds: 60_000,
        }
    }
}

impl BoardSetup {
    /// Bots get ids `1..=bots` and start on their own bases. The same seed
    /// always yields the same board.
    pub fn generate(&self, seed: u64) -> Result<Board, GameError> {
        let teleporters = if self.teleporters { 2 } else { 0 };
        let needed = self.bots as usize + self.diamonds + teleporters;
        let area = usize::try_from(i64::from(self.height) * i64::from(self.width)).unwrap_or(0);
        if self.height <= 0 || self.width <= 0 || needed > area {
            return Err(GameError::InvalidDimensions {
                height: self.height,
                width: self.width,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut taken = HashSet::new();
        let mut board = Board::new(self.height, self.width);

        for id in 1..=self.bots {
            let base = self.free_tile(&mut rng, &mut taken);
            board.bots.push(BotAgent {
                id,
                position: base,
                properties: BotProperties {
                    name: format!("bot-{}", id),
                    diamonds: 0,
                    inventory_size: self.inventory_size,
                    score: 0,
                    milliseconds_left: self.milliseconds,
                    base,
                },
            });
        }

        let mut next_id = 100;
        for _ in 0..teleporters {
            board.game_objects.push(GameObject {
                id: next_id,
                position: self.free_tile(&mut rng, &mut taken),
                kind: ObjectKind::Teleporter,
            });
            next_id += 1;
        }

        for _ in 0..self.diamonds {
            let points = if rng.gen_bool(self.red_chance.clamp(0.0, 1.0)) {
                2
            } else {
                1
            };
            board.diamonds.push(Diamond {
                id: next_id,
                position: self.free_tile(&mut rng, &mut taken),
                properties: DiamondProperties {
                    points,
                    pair_id: None,
                },
            });
            next_id += 1;
        }

        Ok(board)
    }

    fn free_tile(&self, rng: &mut StdRng, taken: &mut HashSet<Position>) -> Position {
        loop {
            let pos = Position::new(rng.gen_range(0..self.height), rng.gen_range(0..self.width));
            if taken.insert(pos) {
                return pos;
            }
        }
    }
}

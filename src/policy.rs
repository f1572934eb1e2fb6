use crate::config::{PolicyConfig, RetreatMode};
use crate::distance::Router;
use crate::game::{Board, BotAgent, Move, Position};
use crate::safety::{MoveGate, Safety};
use crate::select::{select_diamond, select_exploration_tile, select_tackle_target};
use crate::step::StepPlanner;
use crate::trace::{Decision, DecisionEvent, DecisionObserver, ReturnReason, TracingObserver};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Memory carried between turns of one match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyState {
    visited: HashSet<Position>,
    last_move: Option<Move>,
}

impl PolicyState {
    pub fn visited(&self) -> &HashSet<Position> {
        &self.visited
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn reset(&mut self) {
        self.visited.clear();
        self.last_move = None;
    }
}

/// The decision function shared by every policy-driven bot.
///
/// Each call re-derives what to do from the snapshot in priority order:
/// tackle, retreat, return to base, collect, explore, idle. Only the
/// visited tiles and the last step survive between calls.
pub struct PolicyEngine {
    config: PolicyConfig,
    state: PolicyState,
    observer: Box<dyn DecisionObserver>,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self::with_observer(config, Box::new(TracingObserver))
    }

    pub fn with_observer(config: PolicyConfig, observer: Box<dyn DecisionObserver>) -> Self {
        PolicyEngine {
            config,
            state: PolicyState::default(),
            observer,
        }
    }

    pub fn state(&self) -> &PolicyState {
        &self.state
    }

    /// Forget everything learned this match.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn next_move(&mut self, me: &BotAgent, board: &Board) -> Move {
        let (decision, mv) = self.decide(me, board);
        if !mv.is_stay() {
            self.state.last_move = Some(mv);
        }

        self.observer.on_decision(&DecisionEvent {
            bot: me.id,
            position: me.position,
            diamonds: me.properties.diamonds,
            aggressive: self.config.is_aggressive(me.properties.diamonds),
            decision,
            mv,
        });
        mv
    }

    fn decide(&mut self, me: &BotAgent, board: &Board) -> (Decision, Move) {
        let router = Router::new(board);
        let safety = Safety::new(board, me, router);
        let params = self.config.for_turn(me.properties.diamonds);
        let here = me.position;
        let base = me.base();
        let distance_to_base = router.distance(here, base);
        let away_from_base = here != base;

        if let Some(target) = select_tackle_target(&safety, &self.config.tackle, &params) {
            let contact = safety.with_contact(target.position);
            let mv = self.planner(router, &contact).plan(here, target.position);
            let decision = Decision::Tackle {
                target: target.id,
                at: target.position,
            };
            return (decision, mv);
        }

        let threats = safety.enemies_within(params.safe_enemy_distance);
        if params.retreat && !threats.is_empty() && away_from_base {
            let mv = match self.config.retreat {
                RetreatMode::TowardBase => self.planner(router, &safety).plan(here, base),
                RetreatMode::MaximizeEnemyDistance => flee(&safety, self.reversal()),
            };
            let decision = Decision::Retreat {
                threats: threats.len(),
            };
            return (decision, mv);
        }

        let held = me.properties.diamonds;
        if held > 0 {
            let nearly_full = held
                >= me
                    .properties
                    .inventory_size
                    .saturating_sub(self.config.base_return_threshold);
            let time_short = me.seconds_left()
                <= u64::from(distance_to_base) + u64::from(self.config.safe_return_margin);
            if nearly_full || time_short {
                let reason = if nearly_full {
                    ReturnReason::InventoryFull
                } else {
                    ReturnReason::TimeShort
                };
                let mv = self.planner(router, &safety).plan(here, base);
                return (Decision::ReturnToBase { reason }, mv);
            }
        }

        if let Some(diamond) = select_diamond(&safety, &params, self.config.scoring) {
            let mv = self.planner(router, &safety).plan(here, diamond.position);
            let decision = Decision::Collect {
                diamond: diamond.position,
                points: diamond.points(),
            };
            return (decision, mv);
        }

        let tile = select_exploration_tile(
            &safety,
            self.config.exploration,
            &self.config.exploration_weights,
            params.safe_enemy_distance,
            &mut self.state.visited,
        );
        if let Some(tile) = tile {
            let mv = self.planner(router, &safety).plan(here, tile);
            return (Decision::Explore { tile }, mv);
        }

        if away_from_base {
            let mv = self.planner(router, &safety).plan(here, base);
            return (Decision::FallBackToBase, mv);
        }

        (Decision::Idle, Move::STAY)
    }

    /// The step that would undo the last one, when reversals are avoided.
    fn reversal(&self) -> Option<Move> {
        self.state
            .last_move
            .filter(|_| self.config.avoid_reversal)
            .map(|mv| mv.reverse())
    }

    fn planner<'g>(&self, router: Router, gate: &'g dyn MoveGate) -> StepPlanner<'g> {
        StepPlanner::new(router, gate)
            .with_last_move(self.state.last_move)
            .avoid_reversal(self.config.avoid_reversal)
    }
}

/// Step onto the open neighbour farthest from every enemy. Ties avoid
/// `reversal`, then go to the tile nearer to base, then scan order.
fn flee(safety: &Safety<'_>, reversal: Option<Move>) -> Move {
    let me = safety.me();
    let router = safety.router();
    let mut best: Option<(Move, (u32, bool, Reverse<u32>))> = None;

    for mv in Move::DIRECTIONS {
        let tile = me.position.offset(mv);
        if !safety.is_legal_and_safe(tile) {
            continue;
        }
        let key = (
            safety.nearest_enemy_distance(tile),
            Some(mv) != reversal,
            Reverse(router.distance(tile, me.base())),
        );
        if best.is_none_or(|(_, best_key)| key > best_key) {
            best = Some((mv, key));
        }
    }

    best.map_or(Move::STAY, |(mv, _)| mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExplorationMode, PolicyConfig};
    use crate::game::tests::{agent, diamond, teleporter};
    use crate::trace::RecordingObserver;

    fn recorded(config: PolicyConfig) -> (PolicyEngine, RecordingObserver) {
        let recorder = RecordingObserver::new();
        let engine = PolicyEngine::with_observer(config, Box::new(recorder.clone()));
        (engine, recorder)
    }

    fn decide(engine: &mut PolicyEngine, board: &Board) -> Move {
        let me = board.bot(1).unwrap().clone();
        engine.next_move(&me, board)
    }

    fn lone_bot(pos: Position, base: Position) -> Board {
        let mut board = Board::new(10, 10);
        board.bots.push(agent(1, pos, base));
        board
    }

    #[test]
    fn test_collects_lone_diamond() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(0, 0));
        board.diamonds.push(diamond(1, Position::new(5, 8), 3));

        for config in [PolicyConfig::adaptive(), PolicyConfig::cautious()] {
            let (mut engine, recorder) = recorded(config);
            assert_eq!(decide(&mut engine, &board), Move::new(0, 1));
            assert_eq!(
                recorder.last().unwrap().decision,
                Decision::Collect {
                    diamond: Position::new(5, 8),
                    points: 3
                }
            );
        }
    }

    #[test]
    fn test_full_inventory_steps_onto_adjacent_base() {
        let mut board = lone_bot(Position::new(1, 0), Position::new(0, 0));
        board.bots[0].properties.diamonds = 5;
        board.diamonds.push(diamond(1, Position::new(9, 9), 1));

        let (mut engine, recorder) = recorded(PolicyConfig::adaptive());
        assert_eq!(decide(&mut engine, &board), Move::new(-1, 0));
        assert_eq!(
            recorder.last().unwrap().decision,
            Decision::ReturnToBase {
                reason: ReturnReason::InventoryFull
            }
        );
    }

    #[test]
    fn test_short_clock_sends_bot_home() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(0, 5));
        board.bots[0].properties.diamonds = 1;
        board.bots[0].properties.milliseconds_left = 7_999;
        board.diamonds.push(diamond(1, Position::new(9, 5), 1));

        let (mut engine, recorder) = recorded(PolicyConfig::adaptive());
        assert_eq!(decide(&mut engine, &board), Move::new(-1, 0));
        assert_eq!(
            recorder.last().unwrap().decision,
            Decision::ReturnToBase {
                reason: ReturnReason::TimeShort
            }
        );

        // Nothing carried: keep collecting.
        board.bots[0].properties.diamonds = 0;
        assert_eq!(decide(&mut engine, &board), Move::new(1, 0));
    }

    #[test]
    fn test_adjacent_enemy_without_tackle_rights_triggers_retreat() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(0, 5));
        let mut enemy = agent(2, Position::new(5, 6), Position::new(9, 9));
        enemy.properties.diamonds = 5;
        board.bots.push(enemy);

        let (mut engine, recorder) = recorded(PolicyConfig::adaptive());
        let mv = decide(&mut engine, &board);
        assert_ne!(mv, Move::new(0, 1));
        assert_eq!(mv, Move::new(-1, 0));
        assert_eq!(
            recorder.last().unwrap().decision,
            Decision::Retreat { threats: 1 }
        );
    }

    #[test]
    fn test_tackles_loaded_enemy() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(0, 5));
        board.bots[0].properties.diamonds = 2;
        let mut enemy = agent(2, Position::new(5, 6), Position::new(9, 9));
        enemy.properties.diamonds = 5;
        board.bots.push(enemy);

        let (mut engine, recorder) = recorded(PolicyConfig::adaptive());
        assert_eq!(decide(&mut engine, &board), Move::new(0, 1));
        assert_eq!(
            recorder.last().unwrap().decision,
            Decision::Tackle {
                target: 2,
                at: Position::new(5, 6)
            }
        );

        let (mut cautious, _) = recorded(PolicyConfig::cautious());
        assert_ne!(decide(&mut cautious, &board), Move::new(0, 1));
    }

    #[test]
    fn test_aggressive_mode_does_not_retreat() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(5, 0));
        board.bots[0].properties.diamonds = 5;
        board.bots[0].properties.inventory_size = 10;
        board.bots.push(agent(2, Position::new(3, 5), Position::new(9, 9)));
        board.diamonds.push(diamond(1, Position::new(5, 9), 1));

        let (mut engine, recorder) = recorded(PolicyConfig::adaptive());
        assert_eq!(decide(&mut engine, &board), Move::new(0, 1));
        let event = recorder.last().unwrap();
        assert!(event.aggressive);
        assert!(matches!(event.decision, Decision::Collect { .. }));
    }

    #[test]
    fn test_flee_retreat_maximizes_enemy_distance() {
        // Base lies behind the enemy.
        let mut board = lone_bot(Position::new(5, 5), Position::new(5, 9));
        board.bots.push(agent(2, Position::new(5, 7), Position::new(9, 9)));

        let (mut toward_base, _) = recorded(PolicyConfig::adaptive());
        assert_eq!(decide(&mut toward_base, &board), Move::new(0, 1));

        let mut config = PolicyConfig::adaptive();
        config.retreat = RetreatMode::MaximizeEnemyDistance;
        let (mut fleeing, _) = recorded(config);
        let mv = decide(&mut fleeing, &board);
        assert_eq!(mv, Move::new(1, 0));
        let me = board.bot(1).unwrap();
        let enemy = board.bot(2).unwrap();
        assert!(me.position.offset(mv).distance(enemy.position) > me.position.distance(enemy.position));
    }

    #[test]
    fn test_flee_breaks_ties_against_reversing() {
        // Three tiles tie on enemy distance; two of them tie on base distance.
        let mut board = lone_bot(Position::new(5, 5), Position::new(0, 0));
        board.bots.push(agent(2, Position::new(5, 8), Position::new(9, 9)));
        let me = board.bot(1).unwrap();
        let safety = Safety::new(&board, me, Router::new(&board));

        assert_eq!(flee(&safety, None), Move::new(-1, 0));
        assert_eq!(flee(&safety, Some(Move::new(-1, 0))), Move::new(0, -1));
    }

    #[test]
    fn test_flee_retreat_honours_avoid_reversal() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(0, 0));
        board.bots.push(agent(2, Position::new(5, 8), Position::new(9, 9)));

        let mut config = PolicyConfig::adaptive();
        config.retreat = RetreatMode::MaximizeEnemyDistance;
        let (mut engine, _) = recorded(config.clone());
        engine.state.last_move = Some(Move::new(1, 0));
        assert_eq!(decide(&mut engine, &board), Move::new(0, -1));

        config.avoid_reversal = false;
        let (mut engine, _) = recorded(config);
        engine.state.last_move = Some(Move::new(1, 0));
        assert_eq!(decide(&mut engine, &board), Move::new(-1, 0));
    }

    #[test]
    fn test_huge_return_margin_sends_bot_home_without_overflow() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(0, 5));
        board.bots[0].properties.diamonds = 1;
        board.diamonds.push(diamond(1, Position::new(9, 5), 1));

        let config = PolicyConfig::from_json_str(r#"{"safe_return_margin": 4294967295}"#).unwrap();
        let (mut engine, recorder) = recorded(config);
        assert_eq!(decide(&mut engine, &board), Move::new(-1, 0));
        assert_eq!(
            recorder.last().unwrap().decision,
            Decision::ReturnToBase {
                reason: ReturnReason::TimeShort
            }
        );
    }

    #[test]
    fn test_huge_ring_radius_still_explores() {
        let board = lone_bot(Position::new(5, 5), Position::new(5, 5));
        let config =
            PolicyConfig::from_json_str(r#"{"exploration": {"rings": {"max_radius": 4294967295}}}"#)
                .unwrap();
        let (mut engine, recorder) = recorded(config);
        assert!(!decide(&mut engine, &board).is_stay());
        assert!(matches!(
            recorder.last().unwrap().decision,
            Decision::Explore { .. }
        ));
    }

    #[test]
    fn test_explores_when_nothing_to_collect() {
        let board = lone_bot(Position::new(5, 5), Position::new(0, 0));
        let mut config = PolicyConfig::adaptive();
        config.exploration = ExplorationMode::Neighborhood;
        let (mut engine, recorder) = recorded(config);

        let mut tiles = HashSet::new();
        for _ in 0..4 {
            let mv = decide(&mut engine, &board);
            assert!(!mv.is_stay());
            match recorder.last().unwrap().decision {
                Decision::Explore { tile } => assert!(tiles.insert(tile)),
                other => panic!("expected exploration, got {:?}", other),
            }
        }
        assert_eq!(engine.state().visited().len(), 4);

        engine.reset();
        assert!(engine.state().visited().is_empty());
        assert_eq!(engine.state().last_move(), None);
    }

    #[test]
    fn test_falls_back_to_base_without_safe_tiles() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(5, 0));
        // Enemies beyond retreat range but close to every exploration tile.
        let mut config = PolicyConfig::cautious();
        config.safe_enemy_distance = 3;
        board.bots.push(agent(2, Position::new(1, 5), Position::new(9, 9)));
        board.bots.push(agent(3, Position::new(9, 5), Position::new(9, 9)));
        board.bots.push(agent(4, Position::new(5, 9), Position::new(9, 9)));
        board.bots.push(agent(5, Position::new(5, 1), Position::new(9, 9)));

        let (mut engine, recorder) = recorded(config);
        assert_eq!(decide(&mut engine, &board), Move::new(0, -1));
        assert_eq!(recorder.last().unwrap().decision, Decision::FallBackToBase);
    }

    #[test]
    fn test_idles_on_base_without_options() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(5, 5));
        board.bots.push(agent(2, Position::new(1, 5), Position::new(9, 9)));
        board.bots.push(agent(3, Position::new(9, 5), Position::new(9, 9)));
        board.bots.push(agent(4, Position::new(5, 9), Position::new(9, 9)));
        board.bots.push(agent(5, Position::new(5, 1), Position::new(9, 9)));
        let mut config = PolicyConfig::cautious();
        config.safe_enemy_distance = 3;

        let (mut engine, recorder) = recorded(config);
        assert_eq!(decide(&mut engine, &board), Move::STAY);
        assert_eq!(recorder.last().unwrap().decision, Decision::Idle);
    }

    #[test]
    fn test_uses_teleporter_to_reach_far_diamond() {
        let mut board = lone_bot(Position::new(0, 0), Position::new(0, 0));
        board.diamonds.push(diamond(1, Position::new(9, 9), 1));
        board.game_objects.push(teleporter(10, Position::new(0, 1)));
        board.game_objects.push(teleporter(11, Position::new(9, 8)));

        let (mut engine, _) = recorded(PolicyConfig::adaptive());
        assert_eq!(decide(&mut engine, &board), Move::new(0, 1));
    }

    #[test]
    fn test_remembers_last_move() {
        let mut board = lone_bot(Position::new(5, 5), Position::new(0, 0));
        board.diamonds.push(diamond(1, Position::new(5, 8), 1));

        let (mut engine, _) = recorded(PolicyConfig::adaptive());
        let mv = decide(&mut engine, &board);
        assert_eq!(engine.state().last_move(), Some(mv));
    }
}

use diamond_arena::select::select_diamond;
use diamond_arena::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

fn random_position(rng: &mut StdRng, height: i32, width: i32) -> Position {
    Position::new(rng.gen_range(0..height), rng.gen_range(0..width))
}

fn agent(id: BotId, position: Position, base: Position) -> BotAgent {
    BotAgent {
        id,
        position,
        properties: BotProperties {
            name: format!("bot-{}", id),
            diamonds: 0,
            inventory_size: 5,
            score: 0,
            milliseconds_left: 60_000,
            base,
        },
    }
}

/// A crowded random board with up to four bots and sometimes a teleporter
/// pair. Bot 1 is always present.
fn random_board(rng: &mut StdRng) -> Board {
    let height = rng.gen_range(3..12);
    let width = rng.gen_range(3..12);
    let mut board = Board::new(height, width);

    for id in 1..=rng.gen_range(1..5u32) {
        let position = random_position(rng, height, width);
        if board.bot_at(position).is_some() {
            continue;
        }
        let mut bot = agent(id, position, random_position(rng, height, width));
        bot.properties.diamonds = rng.gen_range(0..=5);
        board.bots.push(bot);
    }

    for id in 0..rng.gen_range(0..15u32) {
        let mut diamond = Diamond {
            id,
            position: random_position(rng, height, width),
            properties: DiamondProperties {
                points: rng.gen_range(1..=3),
                pair_id: None,
            },
        };
        if rng.gen_bool(0.2) {
            diamond.properties.pair_id = Some(id);
        }
        board.diamonds.push(diamond);
    }

    if rng.gen_bool(0.5) {
        for id in [100, 101] {
            board.game_objects.push(GameObject {
                id,
                position: random_position(rng, height, width),
                kind: ObjectKind::Teleporter,
            });
        }
    }
    board
}

#[test]
fn test_distance_symmetry_and_router_bound() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..500 {
        let a = random_position(&mut rng, 20, 20);
        let b = random_position(&mut rng, 20, 20);
        assert_eq!(a.distance(b), b.distance(a));
        assert_eq!(a.distance(a), 0);

        let router = Router::with_teleporters(
            random_position(&mut rng, 20, 20),
            random_position(&mut rng, 20, 20),
        );
        assert!(router.distance(a, b) <= a.distance(b));
        assert_eq!(Router::direct().distance(a, b), a.distance(b));
    }
}

#[test]
fn test_policy_moves_are_legal_and_never_idle_needlessly() {
    let mut rng = StdRng::seed_from_u64(2);
    for round in 0..300 {
        let board = random_board(&mut rng);
        let me = board.bot(1).unwrap().clone();
        let config = if round % 2 == 0 {
            PolicyConfig::adaptive()
        } else {
            PolicyConfig::cautious()
        };
        let mut engine = PolicyEngine::new(config);
        let mv = engine.next_move(&me, &board);

        assert!(mv.is_legal_shape(), "round {}: {}", round, mv);
        let to = me.position.offset(mv);
        assert!(board.contains(to), "round {}: stepped off the board", round);

        if mv.is_stay() {
            // Nothing open, or already home with nowhere worth going.
            let open = me
                .position
                .neighbors()
                .iter()
                .any(|p| board.contains(*p) && board.bot_at(*p).is_none());
            assert!(!open || me.position == me.base(), "round {}: idled", round);
        } else if let Some(other) = board.bot_at(to) {
            // Only tackles land on another bot.
            assert_ne!(other.id, me.id);
        }
    }
}

#[test]
fn test_selected_diamond_is_never_paired_or_oversized() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..300 {
        let board = random_board(&mut rng);
        let me = board.bot(1).unwrap();
        let safety = Safety::new(&board, me, Router::new(&board));
        for config in [PolicyConfig::adaptive(), PolicyConfig::cautious()] {
            let params = config.for_turn(me.properties.diamonds);
            if let Some(diamond) = select_diamond(&safety, &params, config.scoring) {
                assert!(!diamond.is_paired());
                assert!(diamond.points() <= me.capacity_left());
            }
        }
    }
}

#[test]
fn test_planner_never_stays_beside_an_open_tile() {
    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..300 {
        let board = random_board(&mut rng);
        let me = board.bot(1).unwrap();
        let router = Router::new(&board);
        let gate = BoardGate::new(&board, me.position);
        let target = random_position(&mut rng, board.height, board.width);

        let mv = StepPlanner::new(router, &gate)
            .with_last_move(Some(Move::DIRECTIONS[rng.gen_range(0..4)]))
            .avoid_reversal(rng.gen_bool(0.5))
            .plan(me.position, target);

        let open = Move::DIRECTIONS
            .iter()
            .any(|step| board.is_valid_move(me.position, *step));
        assert!(mv.is_legal_shape());
        assert_eq!(mv.is_stay(), !open);
        assert!(board.is_valid_move(me.position, mv));
    }
}

#[test]
fn test_lone_diamond_scenario_from_json() {
    let json = r#"{
        "height": 10,
        "width": 10,
        "bots": [{
            "id": 1,
            "position": {"x": 5, "y": 5},
            "properties": {"diamonds": 0, "inventorySize": 5, "millisecondsLeft": 60000, "base": {"x": 0, "y": 0}}
        }],
        "diamonds": [{"id": 9, "position": {"x": 5, "y": 8}, "properties": {"points": 3}}]
    }"#;
    let board = Board::from_json(json).unwrap();
    let me = board.bot(1).unwrap().clone();

    let recorder = RecordingObserver::new();
    let mut bot = PolicyBot::with_observer(
        "adaptive".to_string(),
        PolicyConfig::adaptive(),
        Box::new(recorder.clone()),
    );
    assert_eq!(bot.next_move(&me, &board), Move::new(0, 1));
    assert_eq!(
        recorder.last().unwrap().decision,
        Decision::Collect {
            diamond: Position::new(5, 8),
            points: 3
        }
    );
}

#[test]
fn test_config_file_drives_a_match() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"search_radius": 20, "avoid_reversal": false}}"#).unwrap();
    let config = PolicyConfig::from_file(file.path()).unwrap();
    assert_eq!(config.search_radius, 20);
    assert!(!config.avoid_reversal);

    let board = BoardSetup {
        bots: 2,
        ..BoardSetup::default()
    }
    .generate(5)
    .unwrap();
    let mut arena = Match::new(board, MatchConfig::default()).unwrap();
    arena
        .seat(1, Box::new(PolicyBot::new("file".to_string(), config)))
        .unwrap();
    arena
        .seat(2, Box::new(RandomBot::new("random".to_string(), 5)))
        .unwrap();

    let result = arena.play();
    assert!(result.ticks <= MatchConfig::default().max_ticks);
    let policy = result.standings.iter().find(|s| s.id == 1).unwrap();
    assert_eq!(policy.illegal_moves, 0);
}

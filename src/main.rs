use diamond_arena::*;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Usage: diamond-arena [policy.json] [seed]
    let mut args = std::env::args().skip(1);
    let adaptive = match args.next() {
        Some(path) => match PolicyConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load policy config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => PolicyConfig::adaptive(),
    };
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            eprintln!("Invalid seed: {}", e);
            return ExitCode::FAILURE;
        }
        None => 2024,
    };

    println!("Diamond Arena - Bot Policy Sandbox");
    println!("==================================\n");

    let board = match BoardSetup::default().generate(seed) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("Failed to generate board: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut arena = match Match::new(board, MatchConfig::default()) {
        Ok(arena) => arena,
        Err(e) => {
            eprintln!("Invalid board: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let bots: [(BotId, Box<dyn Bot>); 3] = [
        (1, Box::new(PolicyBot::new("Adaptive".to_string(), adaptive)) as Box<dyn Bot>),
        (
            2,
            Box::new(PolicyBot::new("Cautious".to_string(), PolicyConfig::cautious())),
        ),
        (3, Box::new(RandomBot::new("Random".to_string(), seed))),
    ];
    for (id, bot) in bots {
        if let Err(e) = arena.seat(id, bot) {
            eprintln!("Failed to seat bot {}: {}", id, e);
            return ExitCode::FAILURE;
        }
    }

    let result = arena.play();

    println!("\n==================================");
    println!("Match Result after {} ticks (seed {}):", result.ticks, seed);
    for (rank, standing) in result.standings.iter().enumerate() {
        println!(
            "  {}. {:<10} {:>3} points  ({} illegal moves)",
            rank + 1,
            standing.name,
            standing.score,
            standing.illegal_moves
        );
    }
    match result.winner() {
        Some(winner) => println!("  {} wins!", winner.name),
        None => println!("  Tie at the top"),
    }
    println!("==================================");
    ExitCode::SUCCESS
}

use crate::config::{DiamondScoring, ExplorationMode, ExplorationWeights, TackleConfig, TurnParams};
use crate::game::{Board, BotAgent, Diamond, Position};
use crate::safety::Safety;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Diamonds we are allowed to pick up and can reach within `radius`.
pub fn collectable_diamonds<'a>(safety: &Safety<'a>, radius: u32) -> Vec<&'a Diamond> {
    let me = safety.me();
    let capacity_left = me.capacity_left();
    safety
        .board()
        .diamonds
        .iter()
        .filter(|d| !d.is_paired())
        .filter(|d| d.points() <= capacity_left)
        .filter(|d| safety.router().distance(me.position, d.position) <= radius)
        .collect()
}

/// Best diamond to go for this turn, or `None` when nothing is collectable.
///
/// Equal scores go to the nearer diamond (teleporter-aware, then
/// straight-line), then to the one listed first.
pub fn select_diamond<'a>(
    safety: &Safety<'a>,
    params: &TurnParams,
    scoring: DiamondScoring,
) -> Option<&'a Diamond> {
    let origin = safety.me().position;
    let router = safety.router();
    let mut best: Option<(&'a Diamond, f64, u32, f64)> = None;

    for diamond in collectable_diamonds(safety, params.search_radius) {
        let distance = router.distance(origin, diamond.position);
        let euclidean = origin.euclidean_distance(diamond.position);
        let score = match scoring {
            DiamondScoring::ValueThenDistance => f64::from(diamond.points()),
            DiamondScoring::Efficiency => efficiency_score(safety, params, diamond, distance),
        };

        let better = match best {
            None => true,
            Some((_, best_score, best_distance, best_euclidean)) => {
                score
                    .total_cmp(&best_score)
                    .then(best_distance.cmp(&distance))
                    .then(best_euclidean.total_cmp(&euclidean))
                    == Ordering::Greater
            }
        };
        if better {
            best = Some((diamond, score, distance, euclidean));
        }
    }

    best.map(|(diamond, ..)| diamond)
}

fn efficiency_score(safety: &Safety<'_>, params: &TurnParams, diamond: &Diamond, distance: u32) -> f64 {
    let points = diamond.points();
    let efficiency = f64::from(points) / f64::from(distance.max(1));
    let value_bonus = if points >= 3 { 0.5 } else { 0.0 };

    let enemy_distance = safety.nearest_enemy_distance(diamond.position);
    let risk_penalty = if enemy_distance >= params.risk.radius {
        0.0
    } else {
        (f64::from(params.risk.radius - enemy_distance) + 1.0) * params.risk.weight
    };

    efficiency + value_bonus - risk_penalty
}

/// An enemy worth running into, if any.
///
/// Targets are scored `diamonds - 0.1 * distance to our base`; the first
/// maximum above `min_score` wins.
pub fn select_tackle_target<'a>(
    safety: &Safety<'a>,
    tackle: &TackleConfig,
    params: &TurnParams,
) -> Option<&'a BotAgent> {
    let me = safety.me();
    let router = safety.router();
    if !tackle.enabled || me.properties.diamonds < tackle.min_diamonds_to_tackle {
        return None;
    }
    if let Some(max) = tackle.max_base_distance {
        if router.distance(me.position, me.base()) > max {
            return None;
        }
    }

    let mut best: Option<&'a BotAgent> = None;
    let mut best_score = tackle.min_score;
    for enemy in safety.enemies() {
        if router.distance(me.position, enemy.position) > tackle.tackle_distance {
            continue;
        }
        let enemy_diamonds = enemy.properties.diamonds;
        if enemy_diamonds < params.min_enemy_diamonds {
            continue;
        }
        let score =
            f64::from(enemy_diamonds) - 0.1 * f64::from(router.distance(enemy.position, me.base()));
        if score > best_score {
            best_score = score;
            best = Some(enemy);
        }
    }
    best
}

/// Candidate exploration tiles around `origin`, in generation order.
pub fn exploration_candidates(board: &Board, origin: Position, mode: ExplorationMode) -> Vec<Position> {
    match mode {
        ExplorationMode::Neighborhood => origin
            .neighbors()
            .into_iter()
            .filter(|p| board.contains(*p))
            .collect(),
        ExplorationMode::Rings { max_radius } => {
            // Rings wider than the board hold no tiles.
            let reach = board.height.max(board.width);
            let max_radius = i32::try_from(max_radius).map_or(reach, |r| r.min(reach));
            let mut tiles = Vec::new();
            for radius in 1..=max_radius {
                for dx in -radius..=radius {
                    for dy in -radius..=radius {
                        if dx.abs() != radius && dy.abs() != radius {
                            continue;
                        }
                        let tile = Position::new(origin.x + dx, origin.y + dy);
                        if board.contains(tile) {
                            tiles.push(tile);
                        }
                    }
                }
            }
            tiles
        }
    }
}

/// Pick the next tile to wander toward and remember it in `visited`.
///
/// Only tiles farther than `safe_distance` from every enemy qualify.
/// Previously visited tiles are used only when no fresh tile qualifies.
pub fn select_exploration_tile(
    safety: &Safety<'_>,
    mode: ExplorationMode,
    weights: &ExplorationWeights,
    safe_distance: u32,
    visited: &mut HashSet<Position>,
) -> Option<Position> {
    let board = safety.board();
    let center = board.center();
    let mut best_fresh: Option<(Position, f64)> = None;
    let mut best_visited: Option<(Position, f64)> = None;

    for tile in exploration_candidates(board, safety.me().position, mode) {
        let enemy_distance = safety.nearest_enemy_distance(tile);
        if enemy_distance <= safe_distance {
            continue;
        }

        let center_distance = f64::from(safety.router().distance(tile, center));
        let mut score = f64::from(enemy_distance)
            + weights.center_weight * (weights.center_reference - center_distance);
        if is_near_edge(board, tile, weights.edge_margin) {
            score += weights.edge_bonus;
        }

        let slot = if visited.contains(&tile) {
            &mut best_visited
        } else {
            &mut best_fresh
        };
        if slot.is_none_or(|(_, best)| score > best) {
            *slot = Some((tile, score));
        }
    }

    let (tile, _) = best_fresh.or(best_visited)?;
    visited.insert(tile);
    Some(tile)
}

fn is_near_edge(board: &Board, tile: Position, margin: i32) -> bool {
    tile.x < margin
        || tile.x >= board.height.saturating_sub(margin)
        || tile.y < margin
        || tile.y >= board.width.saturating_sub(margin)
}

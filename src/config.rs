use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read policy config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse policy config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid policy config: {0}")]
    Invalid(String),
}

/// How eligible diamonds are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiamondScoring {
    /// Most points first, nearest first among equals.
    ValueThenDistance,
    /// Points per step, plus a bonus for big diamonds, minus an enemy-risk penalty.
    Efficiency,
}

/// Which tiles are considered as exploration targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationMode {
    Neighborhood,
    Rings { max_radius: u32 },
}

/// What "retreat" means when an enemy comes too close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetreatMode {
    TowardBase,
    MaximizeEnemyDistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TackleConfig {
    pub enabled: bool,
    /// Enemies within this (teleporter-aware) distance can be tackled.
    pub tackle_distance: u32,
    /// We only pick fights while carrying at least this many diamonds.
    pub min_diamonds_to_tackle: u32,
    /// Targets must carry at least this many diamonds.
    pub min_enemy_diamonds: u32,
    /// Only tackle while this close to our own base, when set.
    pub max_base_distance: Option<u32>,
    /// A target's score must exceed this to be worth it.
    pub min_score: f64,
}

impl Default for TackleConfig {
    fn default() -> Self {
        TackleConfig {
            enabled: true,
            tackle_distance: 2,
            min_diamonds_to_tackle: 2,
            min_enemy_diamonds: 4,
            max_base_distance: None,
            min_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    /// Diamonds whose nearest enemy is closer than this are penalised.
    pub radius: u32,
    pub weight: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            radius: 4,
            weight: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorationWeights {
    pub center_weight: f64,
    /// Baseline the centre distance is subtracted from.
    pub center_reference: f64,
    pub edge_bonus: f64,
    /// Tiles this close to any border get the edge bonus.
    pub edge_margin: i32,
}

impl Default for ExplorationWeights {
    fn default() -> Self {
        ExplorationWeights {
            center_weight: 1.0,
            center_reference: 10.0,
            edge_bonus: 2.0,
            edge_margin: 3,
        }
    }
}

/// Values that replace the normal ones while the bot carries a big haul.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggressiveOverride {
    pub safe_enemy_distance: u32,
    pub search_radius_bonus: u32,
    pub min_enemy_diamonds: u32,
    pub risk: RiskConfig,
    pub retreat: bool,
}

impl Default for AggressiveOverride {
    fn default() -> Self {
        AggressiveOverride {
            safe_enemy_distance: 3,
            search_radius_bonus: 3,
            min_enemy_diamonds: 2,
            risk: RiskConfig {
                radius: 2,
                weight: 0.3,
            },
            retreat: false,
        }
    }
}

/// Tunables for `PolicyEngine`.
///
/// Partial JSON is accepted; missing keys take the `adaptive()` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub search_radius: u32,
    /// Radius used while carrying fewer than `wide_search_below` diamonds.
    pub wide_search_radius: u32,
    pub wide_search_below: u32,
    pub safe_enemy_distance: u32,
    /// Extra seconds kept in hand when racing the clock home.
    pub safe_return_margin: u32,
    /// Head home once `diamonds >= inventory_size - base_return_threshold`.
    pub base_return_threshold: u32,
    pub aggressive_mode_threshold: Option<u32>,
    pub aggressive: AggressiveOverride,
    pub tackle: TackleConfig,
    pub scoring: DiamondScoring,
    pub risk: RiskConfig,
    pub exploration: ExplorationMode,
    pub exploration_weights: ExplorationWeights,
    pub retreat: RetreatMode,
    /// Avoid immediately undoing the previous step when detouring.
    pub avoid_reversal: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::adaptive()
    }
}

impl PolicyConfig {
    /// Tackles loaded enemies, widens its search while empty-handed and
    /// switches to aggressive mode on a big haul.
    pub fn adaptive() -> Self {
        PolicyConfig {
            search_radius: 12,
            wide_search_radius: 18,
            wide_search_below: 2,
            safe_enemy_distance: 5,
            safe_return_margin: 3,
            base_return_threshold: 2,
            aggressive_mode_threshold: Some(5),
            aggressive: AggressiveOverride::default(),
            tackle: TackleConfig::default(),
            scoring: DiamondScoring::Efficiency,
            risk: RiskConfig::default(),
            exploration: ExplorationMode::Rings { max_radius: 3 },
            exploration_weights: ExplorationWeights::default(),
            retreat: RetreatMode::TowardBase,
            avoid_reversal: true,
        }
    }

    /// Never tackles, runs home early, grabs the biggest diamond in reach.
    ///
    /// Exploration ranks tiles by enemy distance and breaks ties toward the
    /// centre. The small `center_weight` keeps that order exact while centre
    /// distances stay below 100, which covers boards up to 100x100.
    pub fn cautious() -> Self {
        PolicyConfig {
            search_radius: 12,
            wide_search_radius: 12,
            wide_search_below: 0,
            safe_enemy_distance: 3,
            safe_return_margin: 2,
            base_return_threshold: 1,
            aggressive_mode_threshold: None,
            aggressive: AggressiveOverride::default(),
            tackle: TackleConfig {
                enabled: false,
                ..TackleConfig::default()
            },
            scoring: DiamondScoring::ValueThenDistance,
            risk: RiskConfig::default(),
            exploration: ExplorationMode::Neighborhood,
            exploration_weights: ExplorationWeights {
                center_weight: 0.01,
                center_reference: 0.0,
                edge_bonus: 0.0,
                edge_margin: 0,
            },
            retreat: RetreatMode::TowardBase,
            avoid_reversal: true,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PolicyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let ExplorationMode::Rings { max_radius: 0 } = self.exploration {
            return Err(ConfigError::Invalid(
                "exploration rings need a max_radius of at least 1".to_string(),
            ));
        }
        let weights = [
            self.risk.weight,
            self.aggressive.risk.weight,
            self.tackle.min_score,
            self.exploration_weights.center_weight,
            self.exploration_weights.center_reference,
            self.exploration_weights.edge_bonus,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(ConfigError::Invalid(
                "weights must be finite numbers".to_string(),
            ));
        }
        if self.tackle.enabled && self.tackle.tackle_distance == 0 {
            return Err(ConfigError::Invalid(
                "tackle_distance must be positive when tackling is enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_aggressive(&self, diamonds_held: u32) -> bool {
        self.aggressive_mode_threshold
            .is_some_and(|threshold| diamonds_held >= threshold)
    }

    /// Resolve the values in force for a bot holding `diamonds_held`.
    pub fn for_turn(&self, diamonds_held: u32) -> TurnParams {
        let aggressive = self.is_aggressive(diamonds_held);
        let base_radius = if diamonds_held < self.wide_search_below {
            self.wide_search_radius
        } else {
            self.search_radius
        };

        if aggressive {
            TurnParams {
                aggressive,
                safe_enemy_distance: self.aggressive.safe_enemy_distance,
                search_radius: base_radius.saturating_add(self.aggressive.search_radius_bonus),
                min_enemy_diamonds: self.aggressive.min_enemy_diamonds,
                risk: self.aggressive.risk,
                retreat: self.aggressive.retreat,
            }
        } else {
            TurnParams {
                aggressive,
                safe_enemy_distance: self.safe_enemy_distance,
                search_radius: base_radius,
                min_enemy_diamonds: self.tackle.min_enemy_diamonds,
                risk: self.risk,
                retreat: true,
            }
        }
    }
}

/// Mode-dependent values for a single decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnParams {
    pub aggressive: bool,
    pub safe_enemy_distance: u32,
    pub search_radius: u32,
    pub min_enemy_diamonds: u32,
    pub risk: RiskConfig,
    pub retreat: bool,
}

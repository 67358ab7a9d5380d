//! Simulation configuration
//!
//! Every tunable the combat core reads lives here. A `SimConfig` is built once
//! per mission (defaults, or a TOML file) and handed to the simulation; nothing
//! reads configuration from global state, so tests can run with isolated values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::constants::*;
use crate::battle::grid_map::CoverTier;
use crate::core::error::{Result, SimError};

/// Complete configuration for one mission instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub timing: TimingConfig,
    pub combat: CombatConfig,
    pub interaction: InteractionConfig,
    pub ai: AiConfig,
    pub mission: MissionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Ticks per simulated second
    ///
    /// Movement speeds are authored in tiles per second, so this only changes
    /// the granularity of interpolation, not how far a unit walks per second.
    pub tick_rate: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

impl TimingConfig {
    /// Simulated seconds covered by one tick
    pub fn seconds_per_tick(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Fraction of accuracy lost at the weapon's maximum range
    pub range_penalty_factor: f32,
    /// Lower clamp applied before cover
    pub min_hit_chance: f32,
    /// Upper clamp applied before cover
    pub max_hit_chance: f32,
    pub low_cover_reduction: f32,
    pub half_cover_reduction: f32,
    pub high_cover_reduction: f32,
    /// Tier projected by walls toward adjacent floor
    pub wall_cover_tier: CoverTier,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            range_penalty_factor: RANGE_PENALTY_FACTOR,
            min_hit_chance: MIN_HIT_CHANCE,
            max_hit_chance: MAX_HIT_CHANCE,
            low_cover_reduction: LOW_COVER_REDUCTION,
            half_cover_reduction: HALF_COVER_REDUCTION,
            high_cover_reduction: HIGH_COVER_REDUCTION,
            wall_cover_tier: CoverTier::Half,
        }
    }
}

impl CombatConfig {
    /// Fraction of hit chance removed by a cover tier
    pub fn cover_reduction(&self, tier: CoverTier) -> f32 {
        match tier {
            CoverTier::None => 0.0,
            CoverTier::Low => self.low_cover_reduction,
            CoverTier::Half => self.half_cover_reduction,
            CoverTier::High => self.high_cover_reduction,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub unlock_ticks: u32,
    pub hack_ticks: u32,
    pub disable_ticks: u32,
    pub hazard_radius: f32,
    pub hazard_damage: u32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            unlock_ticks: UNLOCK_TICKS,
            hack_ticks: HACK_TICKS,
            disable_ticks: DISABLE_TICKS,
            hazard_radius: HAZARD_RADIUS,
            hazard_damage: HAZARD_DAMAGE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Chebyshev radius searched for flanking positions
    pub flank_search_radius: i32,
    /// Chebyshev radius searched by guards looking for better cover
    pub cover_search_radius: i32,
    /// Enemies a hazard must catch before support units set it off
    pub support_cluster_min: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            flank_search_radius: FLANK_SEARCH_RADIUS,
            cover_search_radius: COVER_SEARCH_RADIUS,
            support_cluster_min: SUPPORT_CLUSTER_MIN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Euclidean distance from an extraction point that counts as "at" it
    pub extraction_radius: f32,
    pub xp_per_kill: u32,
    pub xp_per_hit: u32,
    pub xp_per_objective: u32,
    pub xp_survival: u32,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            extraction_radius: EXTRACTION_RADIUS,
            xp_per_kill: XP_PER_KILL,
            xp_per_hit: XP_PER_HIT,
            xp_per_objective: XP_PER_OBJECTIVE,
            xp_survival: XP_SURVIVAL,
        }
    }
}

impl SimConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.timing.tick_rate == 0 {
            return Err(SimError::InvalidConfig("tick_rate must be positive".into()));
        }

        let c = &self.combat;
        if !(0.0..=1.0).contains(&c.min_hit_chance) || !(0.0..=1.0).contains(&c.max_hit_chance) {
            return Err(SimError::InvalidConfig(
                "hit chance clamps must lie in [0, 1]".into(),
            ));
        }
        if c.min_hit_chance >= c.max_hit_chance {
            return Err(SimError::InvalidConfig(format!(
                "min_hit_chance ({}) should be < max_hit_chance ({})",
                c.min_hit_chance, c.max_hit_chance
            )));
        }
        if c.min_hit_chance <= 0.0 {
            // Cover must always lower the odds, which needs a non-zero floor
            return Err(SimError::InvalidConfig("min_hit_chance must be positive".into()));
        }

        let reductions = [
            0.0,
            c.low_cover_reduction,
            c.half_cover_reduction,
            c.high_cover_reduction,
        ];
        if reductions.windows(2).any(|w| w[1] <= w[0]) || c.high_cover_reduction >= 1.0 {
            return Err(SimError::InvalidConfig(
                "cover reductions must increase strictly by tier and stay below 1".into(),
            ));
        }

        let i = &self.interaction;
        for (name, ticks) in [
            ("unlock_ticks", i.unlock_ticks),
            ("hack_ticks", i.hack_ticks),
            ("disable_ticks", i.disable_ticks),
        ] {
            if ticks == 0 {
                return Err(SimError::InvalidConfig(format!(
                    "{} must be at least one tick",
                    name
                )));
            }
        }
        if i.hazard_radius < 0.0 {
            return Err(SimError::InvalidConfig("hazard_radius must not be negative".into()));
        }
        if self.mission.extraction_radius < 0.0 {
            return Err(SimError::InvalidConfig(
                "extraction_radius must not be negative".into(),
            ));
        }

        Ok(())
    }
}

//! Combat core constants - default tunables in one place
//!
//! `SimConfig` starts from these values; missions and data files may override them.

// Time
pub const DEFAULT_TICK_RATE: u32 = 20; // ticks per simulated second

// Hit chance
pub const RANGE_PENALTY_FACTOR: f32 = 0.30;
pub const MIN_HIT_CHANCE: f32 = 0.05;
pub const MAX_HIT_CHANCE: f32 = 0.95;

// Cover reductions (fraction of hit chance removed)
pub const LOW_COVER_REDUCTION: f32 = 0.15;
pub const HALF_COVER_REDUCTION: f32 = 0.30;
pub const HIGH_COVER_REDUCTION: f32 = 0.45;

// Channel durations (ticks)
pub const UNLOCK_TICKS: u32 = 60;
pub const HACK_TICKS: u32 = 100;
pub const DISABLE_TICKS: u32 = 40;

// Hazards
pub const HAZARD_RADIUS: f32 = 1.25;
pub const HAZARD_DAMAGE: u32 = 30;

// AI
pub const FLANK_SEARCH_RADIUS: i32 = 4;
pub const COVER_SEARCH_RADIUS: i32 = 2;
pub const SUPPORT_CLUSTER_MIN: usize = 2;

// Mission resolution
pub const EXTRACTION_RADIUS: f32 = 1.5;
pub const XP_PER_KILL: u32 = 10;
pub const XP_PER_HIT: u32 = 1;
pub const XP_PER_OBJECTIVE: u32 = 15;
pub const XP_SURVIVAL: u32 = 5;

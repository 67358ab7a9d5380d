//! Squad Tactics - deterministic tick-based squad combat with fog of war

pub mod battle;
pub mod core;

use thiserror::Error;

use crate::battle::coords::TilePos;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Unknown weapon id: {0}")]
    UnknownWeapon(String),

    #[error("Invalid map symbol {symbol:?} at row {row}, column {col}")]
    InvalidSymbol { symbol: char, row: usize, col: usize },

    #[error("Map template has no rows")]
    EmptyMap,

    #[error("Spawn for {name} at {pos:?} is not occupiable")]
    BlockedSpawn { name: String, pos: TilePos },

    #[error("Hostile {0} has no position and no spawn marker is left")]
    MissingSpawnMarker(String),

    #[error("Objective {name} references {pos:?}, which holds no terminal")]
    UnknownObjectiveTarget { name: String, pos: TilePos },

    #[error("Terminal link references {0:?}, which holds no matching interactable")]
    InvalidTerminalLink(TilePos),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

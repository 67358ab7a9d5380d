//! Map template parsing
//!
//! Templates are row-based text. Symbols:
//!
//! | symbol | meaning                     |
//! |--------|-----------------------------|
//! | `#`    | wall                        |
//! | `.`    | floor                       |
//! | `-`    | low freestanding cover      |
//! | `=`    | half freestanding cover     |
//! | `+`    | high freestanding cover     |
//! | `D`    | closed door                 |
//! | `L`    | locked door                 |
//! | `T`    | terminal                    |
//! | `X`    | hazard                      |
//! | `E`    | hostile spawn (floor)       |
//! | ` `    | void                        |
//!
//! Short rows are padded with void.

use crate::battle::coords::TilePos;
use crate::battle::grid_map::{CoverTier, GridMap, TileKind};
use crate::core::error::{Result, SimError};

/// What an interactable symbol placed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractableSpawnKind {
    Door { locked: bool },
    Terminal,
    Hazard,
}

/// An interactable placement read from the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractableSpawn {
    pub kind: InteractableSpawnKind,
    pub position: TilePos,
}

/// Everything a template describes
#[derive(Debug, Clone)]
pub struct MapLayout {
    pub map: GridMap,
    pub interactables: Vec<InteractableSpawn>,
    /// `E` markers in row-major order
    pub hostile_spawns: Vec<TilePos>,
}

/// Parse a template into a grid with derived cover
pub fn parse_template<S: AsRef<str>>(rows: &[S], wall_tier: CoverTier) -> Result<MapLayout> {
    let height = rows.len();
    let width = rows
        .iter()
        .map(|row| row.as_ref().chars().count())
        .max()
        .unwrap_or(0);
    if height == 0 || width == 0 {
        return Err(SimError::EmptyMap);
    }

    let mut map = GridMap::new(width as u32, height as u32);
    let mut interactables = Vec::new();
    let mut hostile_spawns = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        let mut chars = row.as_ref().chars();
        for x in 0..width {
            let pos = TilePos::new(x as i32, y as i32);
            let symbol = chars.next().unwrap_or(' ');
            match symbol {
                '.' => {}
                '#' => map.set_kind(pos, TileKind::Blocked),
                ' ' => map.set_kind(pos, TileKind::Void),
                '-' => map.set_obstacle(pos, CoverTier::Low),
                '=' => map.set_obstacle(pos, CoverTier::Half),
                '+' => map.set_obstacle(pos, CoverTier::High),
                'D' | 'L' => {
                    map.set_door_open(pos, false);
                    interactables.push(InteractableSpawn {
                        kind: InteractableSpawnKind::Door {
                            locked: symbol == 'L',
                        },
                        position: pos,
                    });
                }
                'T' => {
                    map.set_fixture(pos, true);
                    interactables.push(InteractableSpawn {
                        kind: InteractableSpawnKind::Terminal,
                        position: pos,
                    });
                }
                'X' => {
                    map.set_fixture(pos, true);
                    interactables.push(InteractableSpawn {
                        kind: InteractableSpawnKind::Hazard,
                        position: pos,
                    });
                }
                'E' => hostile_spawns.push(pos),
                other => {
                    return Err(SimError::InvalidSymbol {
                        symbol: other,
                        row: y,
                        col: x,
                    })
                }
            }
        }
    }

    map.derive_cover(wall_tier);

    Ok(MapLayout {
        map,
        interactables,
        hostile_spawns,
    })
}

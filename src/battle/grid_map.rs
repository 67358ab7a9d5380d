//! Mission grid with tile types, directional cover, and line of sight
//!
//! Terrain and cover are fixed for the whole mission. The only dynamic layer is
//! the door overlay, which the interaction registry toggles as doors open and
//! close.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::coords::{CompassDirection, TilePos};

/// Base tile type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TileKind {
    #[default]
    Open, // Floor
    Blocked, // Wall, occludes sight, never occupiable
    Void,    // Outside the playable area, see-through but never occupiable
}

/// Height-based cover tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CoverTier {
    #[default]
    None,
    Low,
    Half,
    High,
}

impl CoverTier {
    /// Nominal height as a fraction of a standing unit
    pub fn height(&self) -> f32 {
        match self {
            CoverTier::None => 0.0,
            CoverTier::Low => 0.25,
            CoverTier::Half => 0.50,
            CoverTier::High => 0.75,
        }
    }

    pub fn is_cover(&self) -> bool {
        !matches!(self, CoverTier::None)
    }
}

/// A single tile on the grid
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Tile {
    pub kind: TileKind,
    /// Freestanding cover object sitting on this tile
    pub obstacle: Option<CoverTier>,
    /// Console, barrel and similar fixtures that take up the tile
    pub fixture: bool,
    /// Cover this tile projects toward each compass direction, indexed by
    /// `CompassDirection::index`. A tile projects toward `d` when it shields the
    /// tile on its far side (`pos - d`) from fire arriving out of `d`.
    pub cover_toward: [CoverTier; 8],
}

impl Tile {
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Tier this tile contributes as a cover source, ignoring direction
    fn source_tier(&self, wall_tier: CoverTier) -> CoverTier {
        match self.kind {
            TileKind::Blocked => wall_tier,
            TileKind::Open => self.obstacle.unwrap_or(CoverTier::None),
            TileKind::Void => CoverTier::None,
        }
    }

    /// Can a unit stand here (door overlay not considered)
    fn is_floor(&self) -> bool {
        self.kind == TileKind::Open && self.obstacle.is_none() && !self.fixture
    }
}

/// The full mission grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMap {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    /// Door tiles currently closed or locked
    closed_doors: AHashSet<TilePos>,
}

impl GridMap {
    /// Create an all-floor map without cover
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::new(TileKind::Open); (width * height) as usize],
            closed_doors: AHashSet::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check if coordinate is within map bounds
    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width as i32 && pos.y < self.height as i32
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.index(pos).map(move |i| &mut self.tiles[i])
    }

    /// Iterate every coordinate in row-major order
    pub fn positions(&self) -> impl Iterator<Item = TilePos> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |y| (0..width).map(move |x| TilePos::new(x, y)))
    }

    pub fn set_kind(&mut self, pos: TilePos, kind: TileKind) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.kind = kind;
        }
    }

    pub fn set_obstacle(&mut self, pos: TilePos, tier: CoverTier) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.obstacle = tier.is_cover().then_some(tier);
        }
    }

    pub fn set_fixture(&mut self, pos: TilePos, fixture: bool) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.fixture = fixture;
        }
    }

    /// Mark a door tile open or shut. Shut doors block movement and sight.
    pub fn set_door_open(&mut self, pos: TilePos, open: bool) {
        if !self.in_bounds(pos) {
            return;
        }
        if open {
            self.closed_doors.remove(&pos);
        } else {
            self.closed_doors.insert(pos);
        }
    }

    /// Can a unit end its movement on this tile? Out of bounds is never occupiable.
    pub fn is_occupiable(&self, pos: TilePos) -> bool {
        match self.tile(pos) {
            Some(tile) => tile.is_floor() && !self.closed_doors.contains(&pos),
            None => false,
        }
    }

    /// Does this tile stop line of sight? Off-map tiles do.
    pub fn blocks_sight(&self, pos: TilePos) -> bool {
        match self.tile(pos) {
            Some(tile) => tile.kind == TileKind::Blocked || self.closed_doors.contains(&pos),
            None => true,
        }
    }

    /// Check line of sight between two tiles
    ///
    /// The viewer sees up to and including the first blocking tile, so only the
    /// tiles strictly between the endpoints are tested.
    pub fn has_line_of_sight(&self, from: TilePos, to: TilePos) -> bool {
        if !self.in_bounds(from) || !self.in_bounds(to) {
            return false;
        }
        let line = from.line_to(&to);
        line.iter()
            .skip(1)
            .take(line.len().saturating_sub(2))
            .all(|pos| !self.blocks_sight(*pos))
    }

    /// Rebuild every tile's directional cover from walls and obstacles
    ///
    /// Called once at mission build. A source tile projects toward `d` whenever
    /// the tile at `source - d` is floor.
    pub fn derive_cover(&mut self, wall_tier: CoverTier) {
        let positions: Vec<TilePos> = self.positions().collect();
        for pos in positions {
            let Some(tier) = self.tile(pos).map(|t| t.source_tier(wall_tier)) else {
                continue;
            };
            let mut projections = [CoverTier::None; 8];
            if tier.is_cover() {
                for direction in CompassDirection::all() {
                    let sheltered = pos.step(direction.opposite());
                    if self.tile(sheltered).map(|t| t.kind == TileKind::Open).unwrap_or(false) {
                        projections[direction.index()] = tier;
                    }
                }
            }
            if let Some(tile) = self.tile_mut(pos) {
                tile.cover_toward = projections;
            }
        }
    }

    /// Cover the target enjoys against an attack from `attacker`
    ///
    /// The bearing from the target back to the attacker is the side cover must
    /// face (the opposite of the attack direction). Each of the target's 8
    /// neighbors that lies on that side and projects cover toward it qualifies;
    /// the highest tier wins.
    pub fn cover_against(&self, target: TilePos, attacker: TilePos) -> CoverTier {
        if !self.in_bounds(target) {
            return CoverTier::None;
        }
        let Some(needed) = target.direction_to(&attacker) else {
            return CoverTier::None;
        };

        target
            .neighbors()
            .iter()
            .filter(|(direction, _)| *direction == needed)
            .filter_map(|(_, neighbor)| self.tile(*neighbor))
            .map(|tile| tile.cover_toward[needed.index()])
            .max()
            .unwrap_or(CoverTier::None)
    }

    /// Highest cover available on any side of a tile
    pub fn best_cover_at(&self, pos: TilePos) -> CoverTier {
        pos.neighbors()
            .iter()
            .filter_map(|(direction, neighbor)| {
                self.tile(*neighbor).map(|t| t.cover_toward[direction.index()])
            })
            .max()
            .unwrap_or(CoverTier::None)
    }
}

//! Square grid coordinates and 8-way compass directions
//!
//! `x` grows east, `y` grows south (row index of the map template).

use serde::{Deserialize, Serialize};

/// Tile coordinate on the mission grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance in tiles
    pub fn distance(&self, other: &Self) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }

    /// Squared straight-line distance (exact, for radius tests)
    pub fn distance_sq(&self, other: &Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// King-move distance; adjacency is `chebyshev == 1`
    pub fn chebyshev(&self, other: &Self) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    /// Neighbor one step in the given direction
    pub fn step(&self, direction: CompassDirection) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// All 8 neighbors paired with the direction they lie in
    pub fn neighbors(&self) -> [(CompassDirection, TilePos); 8] {
        CompassDirection::all().map(|d| (d, self.step(d)))
    }

    /// Compass bearing from self toward other, None if they coincide
    pub fn direction_to(&self, other: &Self) -> Option<CompassDirection> {
        CompassDirection::from_delta(other.x - self.x, other.y - self.y)
    }

    /// Tiles on a Bresenham line from self to other (inclusive)
    pub fn line_to(&self, other: &Self) -> Vec<TilePos> {
        let dx = (other.x - self.x).abs();
        let dy = -(other.y - self.y).abs();
        let sx = if self.x < other.x { 1 } else { -1 };
        let sy = if self.y < other.y { 1 } else { -1 };

        let mut results = Vec::with_capacity((dx.max(-dy) + 1) as usize);
        let mut err = dx + dy;
        let (mut x, mut y) = (self.x, self.y);

        loop {
            results.push(TilePos::new(x, y));
            if x == other.x && y == other.y {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
        results
    }
}

/// 8-way compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CompassDirection {
    /// Grid offset for this direction
    pub fn offset(&self) -> (i32, i32) {
        match self {
            CompassDirection::North => (0, -1),
            CompassDirection::NorthEast => (1, -1),
            CompassDirection::East => (1, 0),
            CompassDirection::SouthEast => (1, 1),
            CompassDirection::South => (0, 1),
            CompassDirection::SouthWest => (-1, 1),
            CompassDirection::West => (-1, 0),
            CompassDirection::NorthWest => (-1, -1),
        }
    }

    /// Get opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            CompassDirection::North => CompassDirection::South,
            CompassDirection::NorthEast => CompassDirection::SouthWest,
            CompassDirection::East => CompassDirection::West,
            CompassDirection::SouthEast => CompassDirection::NorthWest,
            CompassDirection::South => CompassDirection::North,
            CompassDirection::SouthWest => CompassDirection::NorthEast,
            CompassDirection::West => CompassDirection::East,
            CompassDirection::NorthWest => CompassDirection::SouthEast,
        }
    }

    /// Position in `all()`, usable as an array index
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_diagonal(&self) -> bool {
        let (dx, dy) = self.offset();
        dx != 0 && dy != 0
    }

    /// All directions, clockwise from north
    pub fn all() -> [CompassDirection; 8] {
        [
            CompassDirection::North,
            CompassDirection::NorthEast,
            CompassDirection::East,
            CompassDirection::SouthEast,
            CompassDirection::South,
            CompassDirection::SouthWest,
            CompassDirection::West,
            CompassDirection::NorthWest,
        ]
    }

    /// Quantize an arbitrary grid delta to the nearest of the 8 bearings
    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        if dx == 0 && dy == 0 {
            return None;
        }
        // Clockwise angle from north with y pointing south
        let angle = (dx as f64).atan2(-(dy as f64)).to_degrees();
        let sector = ((angle / 45.0).round() as i32).rem_euclid(8) as usize;
        Some(Self::all()[sector])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_distance() {
        let a = TilePos::new(0, 2);
        let b = TilePos::new(4, 2);
        assert_eq!(a.distance(&b), 4.0);
        assert_eq!(a.chebyshev(&b), 4);
        assert_eq!(TilePos::new(0, 0).chebyshev(&TilePos::new(1, 1)), 1);
    }

    #[test]
    fn test_line_includes_endpoints() {
        let a = TilePos::new(0, 0);
        let b = TilePos::new(5, 2);
        let line = a.line_to(&b);
        assert_eq!(line.first(), Some(&a));
        assert_eq!(line.last(), Some(&b));
        assert_eq!(line.len(), 6);
    }

    #[test]
    fn test_line_single_tile() {
        let a = TilePos::new(3, 3);
        assert_eq!(a.line_to(&a), vec![a]);
    }

    #[test]
    fn test_line_steps_are_adjacent() {
        let a = TilePos::new(7, 1);
        let b = TilePos::new(-2, 5);
        let line = a.line_to(&b);
        for pair in line.windows(2) {
            assert_eq!(pair[0].chebyshev(&pair[1]), 1);
        }
    }

    #[test]
    fn test_direction_quantization() {
        assert_eq!(CompassDirection::from_delta(4, 0), Some(CompassDirection::East));
        assert_eq!(CompassDirection::from_delta(0, -3), Some(CompassDirection::North));
        assert_eq!(CompassDirection::from_delta(-2, 2), Some(CompassDirection::SouthWest));
        assert_eq!(CompassDirection::from_delta(4, 1), Some(CompassDirection::East));
        assert_eq!(CompassDirection::from_delta(3, 2), Some(CompassDirection::SouthEast));
        assert_eq!(CompassDirection::from_delta(0, 0), None);
    }

    #[test]
    fn test_direction_opposite() {
        for d in CompassDirection::all() {
            assert_eq!(d.opposite().opposite(), d);
            let (dx, dy) = d.offset();
            assert_eq!(d.opposite().offset(), (-dx, -dy));
        }
    }

    #[test]
    fn test_index_matches_all() {
        for (i, d) in CompassDirection::all().iter().enumerate() {
            assert_eq!(d.index(), i);
        }
    }
}

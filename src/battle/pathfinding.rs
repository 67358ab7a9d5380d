//! A* pathfinding on the mission grid
//!
//! 8-way movement, diagonal steps cost sqrt(2) and may not cut past a corner
//! that is not itself walkable.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use ahash::AHashSet;
use ordered_float::OrderedFloat;

use crate::battle::coords::TilePos;
use crate::battle::grid_map::GridMap;

const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    pos: TilePos,
    f_cost: OrderedFloat<f32>, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap, ties broken by coordinate so the search
        // never depends on insertion luck
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| (other.pos.y, other.pos.x).cmp(&(self.pos.y, self.pos.x)))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Octile distance, admissible for 8-way movement with sqrt(2) diagonals
fn heuristic(a: TilePos, b: TilePos) -> f32 {
    let dx = (a.x - b.x).abs() as f32;
    let dy = (a.y - b.y).abs() as f32;
    dx.max(dy) + (DIAGONAL_COST - 1.0) * dx.min(dy)
}

/// Can a unit walk directly from `from` onto its neighbour `to`?
pub fn can_step(map: &GridMap, from: TilePos, to: TilePos) -> bool {
    if !map.is_occupiable(to) || from.chebyshev(&to) != 1 {
        return false;
    }
    if from.x != to.x && from.y != to.y {
        // No corner cutting
        let side_a = TilePos::new(to.x, from.y);
        let side_b = TilePos::new(from.x, to.y);
        return map.is_occupiable(side_a) && map.is_occupiable(side_b);
    }
    true
}

/// Find path using A*
///
/// Returns the tiles from `start` to `goal` inclusive, or None when the goal
/// is not occupiable or cannot be reached.
pub fn find_path(map: &GridMap, start: TilePos, goal: TilePos) -> Option<Vec<TilePos>> {
    find_path_avoiding(map, start, goal, &AHashSet::new())
}

/// Find path treating `avoid` tiles as impassable (the goal excepted)
pub fn find_path_avoiding(
    map: &GridMap,
    start: TilePos,
    goal: TilePos,
    avoid: &AHashSet<TilePos>,
) -> Option<Vec<TilePos>> {
    if start == goal {
        return Some(vec![start]);
    }
    if !map.is_occupiable(goal) {
        return None;
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<TilePos, TilePos> = HashMap::new();
    let mut g_scores: HashMap<TilePos, f32> = HashMap::new();

    g_scores.insert(start, 0.0);
    open_set.push(PathNode {
        pos: start,
        f_cost: OrderedFloat(heuristic(start, goal)),
    });

    while let Some(current) = open_set.pop() {
        if current.pos == goal {
            return Some(reconstruct_path(&came_from, current.pos));
        }

        let current_g = *g_scores.get(&current.pos).unwrap_or(&f32::INFINITY);

        for (direction, neighbor) in current.pos.neighbors() {
            if neighbor != goal && avoid.contains(&neighbor) {
                continue;
            }
            if !can_step(map, current.pos, neighbor) {
                continue;
            }

            let step_cost = if direction.is_diagonal() {
                DIAGONAL_COST
            } else {
                1.0
            };
            let tentative_g = current_g + step_cost;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.pos);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    pos: neighbor,
                    f_cost: OrderedFloat(tentative_g + heuristic(neighbor, goal)),
                });
            }
        }
    }

    None // No path found
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &HashMap<TilePos, TilePos>, mut current: TilePos) -> Vec<TilePos> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Walking cost of a path (1 per straight step, sqrt(2) per diagonal)
pub fn path_cost(path: &[TilePos]) -> f32 {
    path.windows(2)
        .map(|w| {
            if w[0].x != w[1].x && w[0].y != w[1].y {
                DIAGONAL_COST
            } else {
                1.0
            }
        })
        .sum()
}

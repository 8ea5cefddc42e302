//! A* search over an occupancy grid.

use crate::error::PlanningError;
use crate::grid::OccupancyGrid;
use crate::models::GridCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// One grid move: (delta north, delta east, cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::North,
        Action::South,
        Action::East,
        Action::West,
        Action::NorthEast,
        Action::NorthWest,
        Action::SouthEast,
        Action::SouthWest,
    ];

    pub fn delta(self) -> (i64, i64) {
        match self {
            Action::North => (1, 0),
            Action::South => (-1, 0),
            Action::East => (0, 1),
            Action::West => (0, -1),
            Action::NorthEast => (1, 1),
            Action::NorthWest => (1, -1),
            Action::SouthEast => (-1, 1),
            Action::SouthWest => (-1, -1),
        }
    }

    pub fn cost(self) -> f64 {
        match self {
            Action::North | Action::South | Action::East | Action::West => 1.0,
            _ => std::f64::consts::SQRT_2,
        }
    }

    fn apply(self, cell: GridCell) -> Option<GridCell> {
        let (dn, de) = self.delta();
        let row = cell.0 as i64 + dn;
        let col = cell.1 as i64 + de;
        (row >= 0 && col >= 0).then_some((row as usize, col as usize))
    }
}

/// Straight-line distance between two cells.
pub fn heuristic(a: GridCell, b: GridCell) -> f64 {
    let dn = a.0 as f64 - b.0 as f64;
    let de = a.1 as f64 - b.1 as f64;
    dn.hypot(de)
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Cells from start to goal, both inclusive.
    pub path: Vec<GridCell>,
    pub cost: f64,
    pub expanded: usize,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    cell: GridCell,
    g_score: FloatOrd,
    f_score: FloatOrd,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the BinaryHeap pops the lowest f-score first.
impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.g_score.cmp(&self.g_score))
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

/// Find the cheapest 8-connected path from `start` to `goal`, expanding at
/// most `max_expansions` cells.
pub fn a_star(
    grid: &OccupancyGrid,
    start: GridCell,
    goal: GridCell,
    max_expansions: usize,
) -> Result<SearchResult, PlanningError> {
    if grid.is_blocked(start) || grid.is_blocked(goal) {
        return Err(PlanningError::NoPath { start, goal });
    }

    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<GridCell, f64> = HashMap::new();
    let mut came_from: HashMap<GridCell, GridCell> = HashMap::new();
    let mut expanded = 0usize;

    best_g.insert(start, 0.0);
    open.push(OpenNode {
        cell: start,
        g_score: FloatOrd(0.0),
        f_score: FloatOrd(heuristic(start, goal)),
    });

    while let Some(node) = open.pop() {
        let g = node.g_score.0;
        if best_g.get(&node.cell).is_some_and(|best| g > *best) {
            continue;
        }

        if node.cell == goal {
            let mut path = vec![goal];
            let mut current = goal;
            while let Some(prev) = came_from.get(&current) {
                path.push(*prev);
                current = *prev;
            }
            path.reverse();
            tracing::debug!(expanded, cost = g, cells = path.len(), "found a path");
            return Ok(SearchResult {
                path,
                cost: g,
                expanded,
            });
        }

        expanded += 1;
        if expanded > max_expansions {
            return Err(PlanningError::SearchBudgetExhausted { expanded });
        }

        for action in Action::ALL {
            let Some(next) = action.apply(node.cell) else {
                continue;
            };
            if grid.is_blocked(next) {
                continue;
            }
            let tentative = g + action.cost();
            if best_g.get(&next).is_some_and(|best| tentative >= *best) {
                continue;
            }
            best_g.insert(next, tentative);
            came_from.insert(next, node.cell);
            open.push(OpenNode {
                cell: next,
                g_score: FloatOrd(tentative),
                f_score: FloatOrd(tentative + heuristic(next, goal)),
            });
        }
    }

    Err(PlanningError::NoPath { start, goal })
}

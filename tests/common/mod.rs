#![allow(dead_code)]

use astar_visualizer::{search_markers, CellState, Coord, Grid, SearchOutcome};
use std::collections::VecDeque;
use std::ops::ControlFlow;

/// Parse a layout, panicking with the layout text on error
pub fn parse_layout(layout: &str) -> Grid {
    Grid::from_layout(layout).unwrap_or_else(|e| panic!("bad layout {:?}: {}", layout, e))
}

/// Run a search between the grid's markers, recording every progress notification
pub fn run_search(grid: &mut Grid) -> (SearchOutcome, Vec<(Coord, CellState)>) {
    let mut events = Vec::new();
    let outcome = search_markers(grid, |coord, state| {
        events.push((coord, state));
        ControlFlow::Continue(())
    })
    .expect("search input should be valid");
    (outcome, events)
}

/// Breadth-first shortest distance in steps, used as the reference answer
pub fn bfs_distance(grid: &Grid, start: Coord, end: Coord) -> Option<usize> {
    let size = grid.size();
    let mut dist = vec![None; size * size];
    let mut queue = VecDeque::new();
    dist[start.row * size + start.col] = Some(0);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let d = dist[current.row * size + current.col].unwrap();
        if current == end {
            return Some(d);
        }
        for neighbor in grid.neighbors(current).unwrap() {
            let index = neighbor.row * size + neighbor.col;
            if dist[index].is_none() {
                dist[index] = Some(d + 1);
                queue.push_back(neighbor.coord());
            }
        }
    }
    None
}

/// Check that `path` is a simple 4-connected walk from `start` to `end` over passable cells
pub fn assert_valid_path(grid: &Grid, path: &[Coord], start: Coord, end: Coord) {
    assert_eq!(path.first(), Some(&start), "path must begin at start");
    assert_eq!(path.last(), Some(&end), "path must finish at end");

    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan(&pair[1]), 1, "{} and {} are not adjacent", pair[0], pair[1]);
    }

    let mut seen = std::collections::HashSet::new();
    for coord in path {
        assert!(seen.insert(*coord), "cell {} visited twice", coord);
        assert_ne!(grid.state(*coord).unwrap(), CellState::Barrier, "path crosses barrier {}", coord);
    }
}

/// Mirror a layout left-right
pub fn flip_horizontal(layout: &str) -> String {
    rows(layout)
        .map(|row| row.chars().rev().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Mirror a layout top-bottom
pub fn flip_vertical(layout: &str) -> String {
    let mut lines: Vec<&str> = rows(layout).collect();
    lines.reverse();
    lines.join("\n")
}

/// Mirror a layout both ways
pub fn flip_both(layout: &str) -> String {
    flip_vertical(&flip_horizontal(layout))
}

/// The layout plus its three mirror images
pub fn variants(layout: &str) -> Vec<(&'static str, String)> {
    vec![
        ("original", rows(layout).collect::<Vec<_>>().join("\n")),
        ("h_flip", flip_horizontal(layout)),
        ("v_flip", flip_vertical(layout)),
        ("hv_flip", flip_both(layout)),
    ]
}

/// Deterministic barrier scatter with Start in the top-left and End in the bottom-right
pub fn scattered_layout(size: usize, seed: u64, density_percent: u64) -> String {
    let mut state = seed;
    let mut layout = String::new();
    for row in 0..size {
        for col in 0..size {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let symbol = if row == 0 && col == 0 {
                'S'
            } else if row == size - 1 && col == size - 1 {
                'E'
            } else if (state >> 33) % 100 < density_percent {
                '#'
            } else {
                '.'
            };
            layout.push(symbol);
        }
        layout.push('\n');
    }
    layout
}

fn rows(layout: &str) -> impl Iterator<Item = &str> {
    layout.lines().map(str::trim).filter(|line| !line.is_empty())
}

//! Tile-grid variant of the game: the player lays road pieces on a grid,
//! vehicles route across it with A* and queue at red intersection tiles.

use crate::config::GridSize;
use crate::simulation::LightState;
use pathfinding::directed::astar::astar;
use thiserror::Error;

pub mod road;
pub mod vehicle;
pub mod manager;
pub mod level;

pub use road::*;
pub use vehicle::*;
pub use manager::*;
pub use level::*;

/// Column and row of a tile.
pub type TilePos = (usize, usize);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("tile ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: usize, y: usize, width: usize, height: usize },
    #[error("no road at tile ({x}, {y})")]
    NoRoad { x: usize, y: usize },
    #[error("road at tile ({x}, {y}) has no traffic light")]
    NotAnIntersection { x: usize, y: usize },
    #[error("no route from {from:?} to {to:?}")]
    NoPath { from: TilePos, to: TilePos },
}

#[derive(Debug, Clone, Default)]
pub struct Tile {
    pub road: Option<Road>,
    /// Set while a vehicle waits on this tile. Cleared every tick.
    pub congested: bool,
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::default(); width * height],
        }
    }

    /// Clears every tile and resizes.
    pub fn reset(&mut self, size: GridSize) {
        log::debug!("Resetting grid to {}x{}", size.width, size.height);
        *self = Self::new(size.width, size.height);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn index(&self, x: usize, y: usize) -> Result<usize, GridError> {
        if x < self.width && y < self.height {
            Ok(y * self.width + x)
        } else {
            Err(GridError::OutOfBounds { x, y, width: self.width, height: self.height })
        }
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        self.index(x, y).ok().map(|i| &self.tiles[i])
    }

    pub fn road(&self, x: usize, y: usize) -> Option<&Road> {
        self.tile(x, y).and_then(|tile| tile.road.as_ref())
    }

    /// Places a road, replacing whatever was on the tile.
    pub fn place_road(&mut self, x: usize, y: usize, kind: RoadKind) -> Result<(), GridError> {
        let index = self.index(x, y)?;
        self.tiles[index].road = Some(Road::new(kind));
        Ok(())
    }

    pub fn remove_road(&mut self, x: usize, y: usize) -> Result<Road, GridError> {
        let index = self.index(x, y)?;
        self.tiles[index].road.take().ok_or(GridError::NoRoad { x, y })
    }

    pub fn toggle_light(&mut self, x: usize, y: usize) -> Result<LightState, GridError> {
        let index = self.index(x, y)?;
        let road = self.tiles[index].road.as_mut().ok_or(GridError::NoRoad { x, y })?;
        let state = road.toggle_light().ok_or(GridError::NotAnIntersection { x, y })?;
        log::info!("Intersection light at ({}, {}) changed to {:?}", x, y, state);
        Ok(state)
    }

    pub fn light_at(&self, x: usize, y: usize) -> Option<LightState> {
        self.road(x, y).and_then(Road::light)
    }

    /// Positions of every road carrying a light.
    pub fn intersections(&self) -> Vec<TilePos> {
        self.positions().filter(|(x, y)| self.light_at(*x, *y).is_some()).collect()
    }

    fn positions(&self) -> impl Iterator<Item = TilePos> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y)))
    }

    pub fn count_roads(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.road.is_some()).count()
    }

    pub fn count_congested(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.road.is_some() && tile.congested).count()
    }

    pub fn mark_congested(&mut self, x: usize, y: usize) {
        if let Ok(index) = self.index(x, y) {
            self.tiles[index].congested = true;
        }
    }

    pub fn clear_congestion(&mut self) {
        for tile in &mut self.tiles {
            tile.congested = false;
        }
    }

    /// The tile beyond `side` of `pos`, if inside the grid.
    pub fn step(&self, (x, y): TilePos, side: Side) -> Option<TilePos> {
        let (dx, dy) = side.offset();
        let (nx, ny) = (x as i64 + dx, y as i64 + dy);
        self.contains(nx, ny).then(|| (nx as usize, ny as usize))
    }

    /// Road tiles reachable in one move: both pieces must open onto the
    /// shared edge.
    pub fn neighbors(&self, pos: TilePos) -> Vec<TilePos> {
        let Some(road) = self.road(pos.0, pos.1) else {
            return Vec::new();
        };

        road.connections()
            .sides()
            .filter_map(|side| {
                let next = self.step(pos, side)?;
                let other = self.road(next.0, next.1)?;
                other.connects(side.opposite()).then_some(next)
            })
            .collect()
    }

    /// Shortest tile route from `from` to `to`, both ends included.
    pub fn find_route(&self, from: TilePos, to: TilePos) -> Result<Vec<TilePos>, GridError> {
        for (x, y) in [from, to] {
            self.index(x, y)?;
            if self.road(x, y).is_none() {
                return Err(GridError::NoRoad { x, y });
            }
        }

        astar(
            &from,
            |pos| self.neighbors(*pos).into_iter().map(|next| (next, 1usize)),
            |pos| pos.0.abs_diff(to.0) + pos.1.abs_diff(to.1),
            |pos| *pos == to,
        )
        .map(|(route, _)| route)
        .ok_or(GridError::NoPath { from, to })
    }
}

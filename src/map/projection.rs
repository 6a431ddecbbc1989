//! Web Mercator Projection
//! Conversions between geographic coordinates, world pixels and screen
//! positions for a 256 px slippy-map tile pyramid.

use crate::api::Coordinate;
use crate::config::{MAX_ZOOM, MIN_ZOOM};
use crate::map::TileId;
use egui::{Pos2, Rect, Vec2};
use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;
/// Latitude where the square Mercator world ends.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// A position in world pixels at a given zoom; (0, 0) is the north-west corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

/// Side length of the world in pixels at `zoom`.
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * f64::from(1u32 << zoom)
}

pub fn project(coord: Coordinate, zoom: u8) -> WorldPoint {
    let size = world_size(zoom);
    let lat = coord.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (coord.longitude + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    WorldPoint { x, y }
}

pub fn unproject(point: WorldPoint, zoom: u8) -> Coordinate {
    let size = world_size(zoom);
    let longitude = wrap_longitude(point.x / size * 360.0 - 180.0);
    let n = PI * (1.0 - 2.0 * point.y / size);
    let latitude = n.sinh().atan().to_degrees();
    Coordinate::new(latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE), longitude)
}

/// Bring a longitude into [-180, 180).
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// What part of the world is on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    fn center_world(&self) -> WorldPoint {
        project(self.center, self.zoom)
    }

    pub fn screen_to_world(&self, pos: Pos2, rect: Rect) -> WorldPoint {
        let c = self.center_world();
        let offset = pos - rect.center();
        WorldPoint {
            x: c.x + f64::from(offset.x),
            y: c.y + f64::from(offset.y),
        }
    }

    pub fn world_to_screen(&self, point: WorldPoint, rect: Rect) -> Pos2 {
        let c = self.center_world();
        rect.center() + Vec2::new((point.x - c.x) as f32, (point.y - c.y) as f32)
    }

    pub fn screen_to_coord(&self, pos: Pos2, rect: Rect) -> Coordinate {
        unproject(self.screen_to_world(pos, rect), self.zoom)
    }

    /// Screen position of `coord`, taking the copy of the world nearest the center.
    pub fn coord_to_screen(&self, coord: Coordinate, rect: Rect) -> Pos2 {
        let size = world_size(self.zoom);
        let c = self.center_world();
        let mut p = project(coord, self.zoom);
        let dx = p.x - c.x;
        if dx > size / 2.0 {
            p.x -= size;
        } else if dx < -size / 2.0 {
            p.x += size;
        }
        self.world_to_screen(p, rect)
    }

    /// Move the map so content follows a drag of `delta` screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        let c = self.center_world();
        let size = world_size(self.zoom);
        let moved = WorldPoint {
            x: c.x - f64::from(delta.x),
            y: (c.y - f64::from(delta.y)).clamp(0.0, size),
        };
        self.center = unproject(moved, self.zoom);
    }

    /// Change zoom by `steps` levels keeping the point under `anchor` fixed.
    pub fn zoom_around(&mut self, steps: i32, anchor: Pos2, rect: Rect) {
        let new_zoom = (i32::from(self.zoom) + steps).clamp(i32::from(MIN_ZOOM), i32::from(MAX_ZOOM));
        let new_zoom = new_zoom as u8;
        if new_zoom == self.zoom {
            return;
        }

        let anchor_coord = self.screen_to_coord(anchor, rect);
        let anchor_world = project(anchor_coord, new_zoom);
        let offset = anchor - rect.center();
        let center_world = WorldPoint {
            x: anchor_world.x - f64::from(offset.x),
            y: (anchor_world.y - f64::from(offset.y)).clamp(0.0, world_size(new_zoom)),
        };

        self.zoom = new_zoom;
        self.center = unproject(center_world, new_zoom);
    }

    /// Tiles covering `rect`, each with its screen rectangle.
    ///
    /// Columns wrap around the antimeridian; rows outside the world are skipped.
    pub fn visible_tiles(&self, rect: Rect) -> Vec<(TileId, Rect)> {
        let tiles_per_side = i64::from(1u32 << self.zoom);
        let top_left = self.screen_to_world(rect.min, rect);
        let bottom_right = self.screen_to_world(rect.max, rect);

        let x0 = (top_left.x / TILE_SIZE).floor() as i64;
        let x1 = (bottom_right.x / TILE_SIZE).floor() as i64;
        let y0 = ((top_left.y / TILE_SIZE).floor() as i64).max(0);
        let y1 = ((bottom_right.y / TILE_SIZE).floor() as i64).min(tiles_per_side - 1);

        let mut tiles = Vec::new();
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                let min = self.world_to_screen(
                    WorldPoint {
                        x: tx as f64 * TILE_SIZE,
                        y: ty as f64 * TILE_SIZE,
                    },
                    rect,
                );
                let tile_rect = Rect::from_min_size(min, Vec2::splat(TILE_SIZE as f32));
                let id = TileId {
                    zoom: self.zoom,
                    x: tx.rem_euclid(tiles_per_side) as u32,
                    y: ty as u32,
                };
                tiles.push((id, tile_rect));
            }
        }
        tiles
    }
}

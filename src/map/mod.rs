//! Map module - Projection, tiles and the marker contract

mod projection;
mod tiles;

pub use projection::Viewport;
pub use tiles::{TileId, TileLayer};

use crate::api::Coordinate;

/// Marker primitives a map surface offers to the controller.
///
/// Implementations hold at most one marker.
pub trait MapSurface {
    fn place_marker(&mut self, at: Coordinate);
    fn remove_marker(&mut self);
    fn marker(&self) -> Option<Coordinate>;
}

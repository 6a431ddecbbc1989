//! Map View Widget
//! Slippy map with drag-to-pan, wheel zoom, a tile layer and one marker.

use crate::api::Coordinate;
use crate::config::MapConfig;
use crate::map::{MapSurface, TileLayer, Viewport};
use egui::{pos2, vec2, Align2, Color32, FontId, Painter, Rect, Sense, Stroke};

/// Wheel distance (points) that counts as one zoom level.
const SCROLL_PER_ZOOM: f32 = 40.0;

const BACKGROUND: Color32 = Color32::from_rgb(170, 211, 223);
const GRATICULE: Color32 = Color32::from_rgb(120, 150, 165);
const MARKER_FILL: Color32 = Color32::from_rgb(41, 128, 185);

pub struct MapView {
    viewport: Viewport,
    marker: Option<Coordinate>,
    tiles: Option<TileLayer>,
    attribution: String,
    scroll_accum: f32,
}

impl MapView {
    pub fn new(config: &MapConfig) -> Self {
        let tiles = config.tiles_enabled.then(|| TileLayer::new(config));
        Self {
            viewport: Viewport::new(
                Coordinate::new(config.center_lat, config.center_lon),
                config.zoom,
            ),
            marker: None,
            tiles,
            attribution: config.attribution.clone(),
            scroll_accum: 0.0,
        }
    }

    /// Draw the map. Returns the clicked coordinate, if any.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<Coordinate> {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        if response.dragged() {
            self.viewport.pan(response.drag_delta());
        }

        if response.hovered() {
            self.scroll_accum += ui.input(|i| i.raw_scroll_delta.y);
            if self.scroll_accum.abs() >= SCROLL_PER_ZOOM {
                let steps = if self.scroll_accum > 0.0 { 1 } else { -1 };
                let anchor = response.hover_pos().unwrap_or(rect.center());
                self.viewport.zoom_around(steps, anchor, rect);
                self.scroll_accum = 0.0;
            }
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);
        self.draw_graticule(&painter, rect);
        self.draw_tiles(ui.ctx(), &painter, rect);
        self.draw_marker(&painter, rect);
        self.draw_attribution(&painter, rect);

        if response.clicked() {
            let pos = response.interact_pointer_pos()?;
            return Some(self.viewport.screen_to_coord(pos, rect));
        }
        None
    }

    fn draw_tiles(&mut self, ctx: &egui::Context, painter: &Painter, rect: Rect) {
        let Some(tiles) = self.tiles.as_mut() else {
            return;
        };

        tiles.poll(ctx);
        let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
        for (id, tile_rect) in self.viewport.visible_tiles(rect) {
            if let Some(texture) = tiles.texture(id, ctx) {
                painter.image(texture.id(), tile_rect, uv, Color32::WHITE);
            }
        }
        tiles.evict();
    }

    /// Lat/lon grid, visible wherever tiles are missing.
    fn draw_graticule(&self, painter: &Painter, rect: Rect) {
        let step = match self.viewport.zoom {
            0..=4 => 10.0,
            5..=7 => 5.0,
            8..=10 => 1.0,
            _ => return,
        };
        let stroke = Stroke::new(0.5, GRATICULE);
        let top_left = self.viewport.screen_to_coord(rect.min, rect);
        let bottom_right = self.viewport.screen_to_coord(rect.max, rect);

        // Skip meridians when the view straddles the antimeridian.
        if bottom_right.longitude > top_left.longitude {
            let mut lon = (top_left.longitude / step).ceil() * step;
            while lon <= bottom_right.longitude {
                let x = self
                    .viewport
                    .coord_to_screen(Coordinate::new(self.viewport.center.latitude, lon), rect)
                    .x;
                painter.vline(x, rect.y_range(), stroke);
                lon += step;
            }
        }

        let mut lat = (bottom_right.latitude / step).ceil() * step;
        while lat <= top_left.latitude {
            let y = self
                .viewport
                .coord_to_screen(Coordinate::new(lat, self.viewport.center.longitude), rect)
                .y;
            painter.hline(rect.x_range(), y, stroke);
            lat += step;
        }
    }

    fn draw_marker(&self, painter: &Painter, rect: Rect) {
        let Some(marker) = self.marker else {
            return;
        };
        let tip = self.viewport.coord_to_screen(marker, rect);
        if !rect.contains(tip) {
            return;
        }

        let head = tip - vec2(0.0, 18.0);
        painter.line_segment([tip, head], Stroke::new(2.0, MARKER_FILL));
        painter.circle(head, 7.0, MARKER_FILL, Stroke::new(1.5, Color32::WHITE));
        painter.circle_filled(tip, 2.0, Color32::BLACK);
    }

    fn draw_attribution(&self, painter: &Painter, rect: Rect) {
        let Some(tiles) = &self.tiles else {
            return;
        };
        if tiles.is_loading() {
            painter.text(
                rect.left_top() + vec2(8.0, 8.0),
                Align2::LEFT_TOP,
                "Carregando mapa...",
                FontId::proportional(12.0),
                Color32::from_gray(40),
            );
        }
        if self.attribution.is_empty() {
            return;
        }
        let galley = painter.layout_no_wrap(
            self.attribution.clone(),
            FontId::proportional(11.0),
            Color32::from_gray(40),
        );
        let text_rect = Align2::RIGHT_BOTTOM
            .anchor_size(rect.right_bottom() - vec2(4.0, 2.0), galley.size());
        painter.rect_filled(
            text_rect.expand(2.0),
            2.0,
            Color32::from_white_alpha(200),
        );
        painter.galley(text_rect.min, galley, Color32::from_gray(40));
    }
}

impl MapSurface for MapView {
    fn place_marker(&mut self, at: Coordinate) {
        self.marker = Some(at);
    }

    fn remove_marker(&mut self) {
        self.marker = None;
    }

    fn marker(&self) -> Option<Coordinate> {
        self.marker
    }
}

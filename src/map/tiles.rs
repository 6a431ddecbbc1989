//! Tile Layer
//! Fetches raster map tiles on background threads and keeps them as egui
//! textures.

use crate::config::MapConfig;
use egui::{ColorImage, TextureHandle, TextureOptions};
use std::collections::HashMap;
use std::io::Read;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;
use thiserror::Error;

const MAX_TILE_BYTES: usize = 2 * 1024 * 1024;
const MAX_CACHED_TILES: usize = 512;
const TILE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum TileError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Tile exceeded the size limit")]
    TooLarge,
    #[error("Failed to read tile: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode tile: {0}")]
    Decode(#[from] image::ImageError),
}

/// Address of one tile in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Fill `{z}`, `{x}` and `{y}` in a URL template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

enum TileSlot<T> {
    Pending,
    Ready(T),
    /// Not retried while it stays cached.
    Failed,
}

struct CachedTile<T> {
    slot: TileSlot<T>,
    last_used: u64,
}

/// Tile bookkeeping with least-recently-used eviction.
///
/// Generic over the stored image so it runs without a GPU context.
struct TileCache<T> {
    entries: HashMap<TileId, CachedTile<T>>,
    capacity: usize,
    frame: u64,
}

impl<T> TileCache<T> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            frame: 0,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn next_frame(&mut self) {
        self.frame += 1;
    }

    fn contains(&self, id: TileId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Slot for `id`, marked as used this frame.
    fn touch(&mut self, id: TileId) -> Option<&TileSlot<T>> {
        let frame = self.frame;
        self.entries.get_mut(&id).map(|entry| {
            entry.last_used = frame;
            &entry.slot
        })
    }

    fn mark_pending(&mut self, id: TileId) {
        self.set(id, TileSlot::Pending);
    }

    fn set(&mut self, id: TileId, slot: TileSlot<T>) {
        match self.entries.get_mut(&id) {
            Some(entry) => entry.slot = slot,
            None => {
                let last_used = self.frame;
                self.entries.insert(id, CachedTile { slot, last_used });
            }
        }
    }

    /// Drop the least recently used tiles until the cache fits. Downloads in
    /// flight and tiles used this frame stay. Returns how many were dropped.
    fn evict(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.capacity);
        if excess == 0 {
            return 0;
        }

        let frame = self.frame;
        let mut stale: Vec<(u64, TileId)> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.last_used < frame && !matches!(entry.slot, TileSlot::Pending)
            })
            .map(|(id, entry)| (entry.last_used, *id))
            .collect();
        stale.sort_unstable_by_key(|(last_used, _)| *last_used);

        let dropped = excess.min(stale.len());
        for (_, id) in &stale[..dropped] {
            self.entries.remove(id);
        }
        dropped
    }
}

/// Tile fetch result from a background thread
struct TileResult {
    id: TileId,
    image: Result<ColorImage, TileError>,
}

pub struct TileLayer {
    url_template: String,
    agent: ureq::Agent,
    max_in_flight: usize,
    in_flight: usize,
    cache: TileCache<TextureHandle>,
    tx: Sender<TileResult>,
    rx: Receiver<TileResult>,
}

impl TileLayer {
    pub fn new(config: &MapConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(TILE_TIMEOUT)
            .user_agent(&config.user_agent)
            .build();
        let (tx, rx) = channel();

        Self {
            url_template: config.tile_url.clone(),
            agent,
            max_in_flight: config.max_tile_fetches.max(1),
            in_flight: 0,
            cache: TileCache::new(MAX_CACHED_TILES),
            tx,
            rx,
        }
    }

    /// True while any tile is still downloading.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Start a frame: upload finished downloads as textures.
    pub fn poll(&mut self, ctx: &egui::Context) {
        self.cache.next_frame();
        while let Ok(TileResult { id, image }) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            let slot = match image {
                Ok(image) => {
                    let name = format!("tile_{}_{}_{}", id.zoom, id.x, id.y);
                    TileSlot::Ready(ctx.load_texture(name, image, TextureOptions::LINEAR))
                }
                Err(e) => {
                    tracing::warn!(zoom = id.zoom, x = id.x, y = id.y, "Tile failed: {}", e);
                    TileSlot::Failed
                }
            };
            self.cache.set(id, slot);
        }
    }

    /// Texture for `id`, starting a download if it is not cached.
    pub fn texture(&mut self, id: TileId, ctx: &egui::Context) -> Option<&TextureHandle> {
        if !self.cache.contains(id) {
            if self.in_flight < self.max_in_flight {
                self.spawn_fetch(id, ctx.clone());
            }
            return None;
        }

        match self.cache.touch(id) {
            Some(TileSlot::Ready(texture)) => Some(texture),
            _ => None,
        }
    }

    /// Drop least recently drawn tiles once the cache grows too large.
    pub fn evict(&mut self) {
        let before = self.cache.len();
        let dropped = self.cache.evict();
        if dropped > 0 {
            tracing::debug!(before, after = self.cache.len(), "Evicted map tiles");
        }
    }

    fn spawn_fetch(&mut self, id: TileId, ctx: egui::Context) {
        self.cache.mark_pending(id);
        self.in_flight += 1;

        let url = id.url(&self.url_template);
        let agent = self.agent.clone();
        let tx = self.tx.clone();

        thread::spawn(move || {
            let image = fetch_tile(&agent, &url);
            let _ = tx.send(TileResult { id, image });
            ctx.request_repaint();
        });
    }
}

fn fetch_tile(agent: &ureq::Agent, url: &str) -> Result<ColorImage, TileError> {
    let response = agent
        .get(url)
        .call()
        .map_err(|e| TileError::Http(e.to_string()))?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_TILE_BYTES as u64 + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() > MAX_TILE_BYTES {
        return Err(TileError::TooLarge);
    }

    decode_tile(&bytes)
}

/// Decode PNG/JPEG bytes into an egui image.
pub fn decode_tile(bytes: &[u8]) -> Result<ColorImage, TileError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn url_template_is_filled() {
        let id = TileId { zoom: 5, x: 10, y: 16 };
        assert_eq!(
            id.url("https://tile.openstreetmap.org/{z}/{x}/{y}.png"),
            "https://tile.openstreetmap.org/5/10/16.png"
        );
    }

    fn tile(x: u32) -> TileId {
        TileId { zoom: 12, x, y: 0 }
    }

    #[test]
    fn panning_at_one_zoom_stays_bounded() {
        let mut cache: TileCache<u32> = TileCache::new(MAX_CACHED_TILES);

        // One new column of tiles per frame, all at the same zoom.
        for x in 0..(MAX_CACHED_TILES as u32 + 300) {
            cache.next_frame();
            assert!(!cache.contains(tile(x)));
            cache.mark_pending(tile(x));
            cache.set(tile(x), TileSlot::Ready(x));
            assert!(matches!(cache.touch(tile(x)), Some(TileSlot::Ready(_))));
            cache.evict();
            assert!(cache.len() <= MAX_CACHED_TILES);
        }

        assert_eq!(cache.len(), MAX_CACHED_TILES);
        assert!(!cache.contains(tile(0)));
        assert!(cache.contains(tile(MAX_CACHED_TILES as u32 + 299)));
    }

    #[test]
    fn eviction_drops_least_recently_used_first() {
        let mut cache: TileCache<u32> = TileCache::new(2);
        for x in 0..3 {
            cache.next_frame();
            cache.set(tile(x), TileSlot::Ready(x));
        }

        // Tile 0 is drawn again, so tile 1 is now the oldest.
        cache.next_frame();
        cache.touch(tile(0));
        assert_eq!(cache.evict(), 1);

        assert!(cache.contains(tile(0)));
        assert!(!cache.contains(tile(1)));
        assert!(cache.contains(tile(2)));
    }

    #[test]
    fn failed_tiles_are_evicted_but_pending_and_visible_stay() {
        let mut cache: TileCache<u32> = TileCache::new(1);
        cache.set(tile(0), TileSlot::Failed);
        cache.mark_pending(tile(1));
        cache.next_frame();
        cache.set(tile(2), TileSlot::Ready(2));

        assert_eq!(cache.evict(), 1);
        assert!(!cache.contains(tile(0)));
        assert!(cache.contains(tile(1)));
        assert!(cache.contains(tile(2)));
    }

    #[test]
    fn decodes_png_tile() {
        let img = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode_tile(&bytes).unwrap();
        assert_eq!(decoded.size, [4, 2]);
        assert_eq!(decoded.pixels[0], egui::Color32::from_rgb(10, 20, 30));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_tile(b"not an image"),
            Err(TileError::Decode(_))
        ));
    }
}

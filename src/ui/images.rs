//! Image fetching and texture caching for the canvas painter and exporter.
//!
//! The render function only ever names images by URL; actually fetching and
//! decoding them is a side effect that lives here, on background tasks, with
//! results drained into the cache once per frame. The painter falls back to
//! a placeholder box until an image is ready, so an in-flight fetch never
//! blocks a gesture.

use eframe::egui;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// A fetched, decoded image ready for painting and export.
pub struct ReadyImage {
    /// GPU texture for the egui painter.
    pub texture: egui::TextureHandle,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// The original encoded bytes, kept for data-URI embedding in SVG export.
    pub bytes: Arc<Vec<u8>>,
}

/// Cache entry lifecycle for one URL.
pub enum CachedImage {
    /// Fetch in flight.
    Loading,
    /// Fetch or decode failed with this message.
    Failed(String),
    /// Decoded and uploaded as a texture.
    Ready(ReadyImage),
}

struct FetchResult {
    url: String,
    outcome: Result<(egui::ColorImage, Arc<Vec<u8>>, u32, u32), String>,
}

/// URL-keyed image cache fed by background fetch tasks.
pub struct ImageCache {
    entries: HashMap<String, CachedImage>,
    sender: Sender<FetchResult>,
    receiver: Receiver<FetchResult>,
}

impl Default for ImageCache {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            entries: HashMap::new(),
            sender,
            receiver,
        }
    }
}

impl ImageCache {
    /// Looks up the cache entry for a URL.
    pub fn get(&self, url: &str) -> Option<&CachedImage> {
        self.entries.get(url)
    }

    /// The decoded image for a URL, when it has arrived.
    pub fn ready(&self, url: &str) -> Option<&ReadyImage> {
        match self.entries.get(url) {
            Some(CachedImage::Ready(image)) => Some(image),
            _ => None,
        }
    }

    /// Ensures a fetch is in flight (or done) for the URL.
    ///
    /// Safe to call every frame; only the first call per URL spawns work.
    pub fn ensure(&mut self, url: &str, ctx: &egui::Context) {
        if url.is_empty() || self.entries.contains_key(url) {
            return;
        }
        self.entries.insert(url.to_string(), CachedImage::Loading);

        let sender = self.sender.clone();
        let ctx = ctx.clone();
        let url = url.to_string();
        spawn_fetch(async move {
            let outcome = fetch_and_decode(&url).await;
            let _ = sender.send(FetchResult { url, outcome });
            ctx.request_repaint();
        });
    }

    /// Drains completed fetches into the cache, uploading textures.
    ///
    /// Called once per frame from the update loop.
    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.receiver.try_recv() {
            let entry = match result.outcome {
                Ok((color_image, bytes, width, height)) => {
                    let texture = ctx.load_texture(
                        &result.url,
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    CachedImage::Ready(ReadyImage {
                        texture,
                        width,
                        height,
                        bytes,
                    })
                }
                Err(message) => {
                    log::warn!("image fetch failed for {}: {}", result.url, message);
                    CachedImage::Failed(message)
                }
            };
            self.entries.insert(result.url, entry);
        }
    }

    /// Drops every entry so the next frame re-fetches. Called when the
    /// editing session resets, so a newly loaded template pulls fresh
    /// copies of its images instead of reusing stale textures.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Seeds an entry without spawning a fetch, so tests can observe the
    /// cache lifecycle.
    #[cfg(test)]
    pub(crate) fn seed_failed(&mut self, url: &str, message: &str) {
        self.entries
            .insert(url.to_string(), CachedImage::Failed(message.to_string()));
    }
}

async fn fetch_and_decode(
    url: &str,
) -> Result<(egui::ColorImage, Arc<Vec<u8>>, u32, u32), String> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    if !response.status().is_success() {
        return Err(format!("service returned {}", response.status()));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("read failed: {e}"))?
        .to_vec();

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| format!("decode failed: {e}"))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        decoded.as_raw(),
    );

    Ok((color_image, Arc::new(bytes), width, height))
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_fetch(future: impl std::future::Future<Output = ()> + Send + 'static) {
    tokio::spawn(future);
}

#[cfg(target_arch = "wasm32")]
fn spawn_fetch(future: impl std::future::Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(future);
}

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::GalleryError;
use crate::gallery::{Gallery, TileId};
use crate::manifest::{self, Manifest};
use crate::source::{self, CacheBuster};
use crate::viewer::{PreloadOutcome, ViewerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// Everything that can happen to the dashboard: user input from the frame
/// loop and results reported back by the background worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ReloadRequested,
    ManifestLoaded {
        result: Result<Manifest, GalleryError>,
        today: NaiveDate,
    },
    /// The gallery has been drawn at least once since the manifest arrived.
    GalleryRendered,
    FolderToggled(usize),
    TileClicked(TileId),
    PreloadFinished {
        token: u64,
        result: Result<(), GalleryError>,
    },
    MainImageClicked,
    Wheel {
        delta_y: f32,
    },
    PointerDown {
        pos: egui::Pos2,
        on_image: bool,
    },
    PointerMove {
        pos: egui::Pos2,
    },
    PointerUp,
    KeyDown(Key),
    CloseRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbRequest {
    /// Stable key, without the cache parameter.
    pub path: String,
    pub url: String,
}

/// Work the dashboard asks its host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchManifest { url: String },
    LoadThumbnails(Vec<ThumbRequest>),
    Preload { token: u64, url: String },
    /// Swap the main panel to the image decoded for `token`.
    CommitMainImage { token: u64 },
}

/// Owns gallery and viewer state; every mutation goes through `handle`.
pub struct Dashboard {
    root: String,
    retention_days: i64,
    cache: CacheBuster,
    pub gallery: Gallery,
    pub viewer: ViewerState,
}

impl Dashboard {
    pub fn new(root: impl Into<String>, retention_days: i64, zoom_step: f32) -> Self {
        Self {
            root: root.into(),
            retention_days,
            cache: CacheBuster::default(),
            gallery: Gallery::new(),
            viewer: ViewerState::new(zoom_step),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn start(&mut self) -> Vec<Effect> {
        self.handle(Event::ReloadRequested)
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::ReloadRequested => {
                self.gallery.begin_load();
                let url = self.cache.bust(&source::manifest_location(&self.root));
                info!(%url, "fetching manifest");
                vec![Effect::FetchManifest { url }]
            }
            Event::ManifestLoaded { result, today } => {
                self.on_manifest_loaded(result, today);
                Vec::new()
            }
            Event::GalleryRendered => {
                let Some((folder, tile)) = self.gallery.take_auto_select() else {
                    return Vec::new();
                };
                let mut effects = Vec::new();
                if self.gallery.expanded() != Some(folder) {
                    effects.extend(self.handle(Event::FolderToggled(folder)));
                }
                if let Some(tile) = tile {
                    effects.extend(self.handle(Event::TileClicked(tile)));
                }
                effects
            }
            Event::FolderToggled(folder) => {
                let paths = self.gallery.toggle_folder(folder);
                if paths.is_empty() {
                    return Vec::new();
                }
                let requests = paths
                    .into_iter()
                    .map(|path| ThumbRequest {
                        url: self.cache.bust(&path),
                        path,
                    })
                    .collect();
                vec![Effect::LoadThumbnails(requests)]
            }
            Event::TileClicked(id) => {
                if !self.gallery.select(id) {
                    return Vec::new();
                }
                let Some(file) = self.gallery.tile(id) else {
                    return Vec::new();
                };
                let (path, label, category) =
                    (file.path.clone(), file.short_date(), file.category);
                let token = self.viewer.display(&path, &label, category);
                let url = self.cache.bust(&path);
                vec![Effect::Preload { token, url }]
            }
            Event::PreloadFinished { token, result } => {
                match self.viewer.finish_preload(token, result) {
                    PreloadOutcome::Committed => vec![Effect::CommitMainImage { token }],
                    PreloadOutcome::Failed | PreloadOutcome::Stale => Vec::new(),
                }
            }
            Event::MainImageClicked => {
                if self.viewer.open_lightbox() {
                    debug!("lightbox opened");
                }
                Vec::new()
            }
            Event::Wheel { delta_y } => {
                self.viewer.lightbox.wheel(delta_y);
                Vec::new()
            }
            Event::PointerDown { pos, on_image } => {
                self.viewer.lightbox.pointer_down(pos, on_image);
                Vec::new()
            }
            Event::PointerMove { pos } => {
                self.viewer.lightbox.pointer_move(pos);
                Vec::new()
            }
            Event::PointerUp => {
                self.viewer.lightbox.pointer_up();
                Vec::new()
            }
            Event::KeyDown(Key::Escape) | Event::CloseRequested => {
                if self.viewer.lightbox.close() {
                    debug!("lightbox closed");
                }
                Vec::new()
            }
            Event::KeyDown(Key::Other) => Vec::new(),
        }
    }

    fn on_manifest_loaded(&mut self, result: Result<Manifest, GalleryError>, today: NaiveDate) {
        match result {
            Ok(parsed) => {
                if parsed.is_empty() {
                    warn!("manifest lists no folders");
                }
                let folders =
                    manifest::build_folders(&parsed, &self.root, today, self.retention_days);
                let skipped = parsed.len() - folders.len();
                info!(
                    folders = folders.len(),
                    skipped,
                    %today,
                    "manifest loaded"
                );
                self.gallery.apply(folders, skipped);
            }
            Err(err) => {
                warn!(error = %err, "manifest load failed");
                self.gallery.fail(err.to_string());
            }
        }
    }
}

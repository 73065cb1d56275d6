use std::sync::mpsc;

use tracing::debug;

use crate::dashboard::{Effect, ThumbRequest};
use crate::error::GalleryError;
use crate::manifest::Manifest;

/// Results reported by background jobs, drained once per frame.
pub enum WorkerMsg {
    Manifest(Result<Manifest, GalleryError>),
    Chart {
        token: u64,
        result: Result<egui::ColorImage, GalleryError>,
    },
    Thumb {
        path: String,
        image: Option<egui::ColorImage>,
    },
}

/// Runs dashboard effects off the UI thread. Manifest and chart fetches get a
/// dedicated thread each; thumbnails share the rayon pool.
pub struct Worker {
    tx: mpsc::SyncSender<WorkerMsg>,
    rx: mpsc::Receiver<WorkerMsg>,
}

impl Worker {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(64);
        Self { tx, rx }
    }

    /// Starts the job for `effect`. `CommitMainImage` needs the decoded image
    /// the host is holding, so it is handed back instead.
    pub fn run(&self, effect: Effect, ctx: &egui::Context) -> Option<Effect> {
        match effect {
            Effect::FetchManifest { url } => {
                let tx = self.tx.clone();
                let ctx2 = ctx.clone();
                std::thread::spawn(move || {
                    let result = load_manifest(&url);
                    let _ = tx.send(WorkerMsg::Manifest(result));
                    ctx2.request_repaint();
                });
                None
            }
            Effect::Preload { token, url } => {
                let tx = self.tx.clone();
                let ctx2 = ctx.clone();
                std::thread::spawn(move || {
                    let result = load_chart(&url);
                    let _ = tx.send(WorkerMsg::Chart { token, result });
                    ctx2.request_repaint();
                });
                None
            }
            Effect::LoadThumbnails(requests) => {
                for ThumbRequest { path, url } in requests {
                    let tx = self.tx.clone();
                    let ctx2 = ctx.clone();
                    rayon::spawn(move || {
                        let image = crate::source::fetch_bytes(&url)
                            .and_then(|bytes| crate::thumbnail::decode_thumbnail(&bytes))
                            .inspect_err(|err| debug!(%url, error = %err, "thumbnail failed"))
                            .ok();
                        let _ = tx.send(WorkerMsg::Thumb { path, image });
                        ctx2.request_repaint();
                    });
                }
                None
            }
            commit @ Effect::CommitMainImage { .. } => Some(commit),
        }
    }

    pub fn drain(&self) -> Vec<WorkerMsg> {
        self.rx.try_iter().collect()
    }
}

fn load_manifest(url: &str) -> Result<Manifest, GalleryError> {
    crate::source::fetch_bytes(url)
        .and_then(|bytes| Manifest::from_json(&bytes))
        .map_err(|err| GalleryError::manifest(&err))
}

fn load_chart(url: &str) -> Result<egui::ColorImage, GalleryError> {
    crate::source::fetch_bytes(url)
        .and_then(|bytes| crate::thumbnail::decode_chart(&bytes))
        .map_err(|err| GalleryError::image(url, &err))
}

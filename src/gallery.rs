use std::collections::HashSet;

use crate::manifest::{FileView, FolderView};

/// File the auto-selection prefers when the newest folder carries it.
const LATEST_FILE: &str = "latest.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub folder: usize,
    pub file: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryStatus {
    Loading,
    Failed(String),
    Ready,
}

/// Folder/tile view model. At most one folder is expanded and at most one
/// tile selected; only the methods below change either.
#[derive(Debug)]
pub struct Gallery {
    status: GalleryStatus,
    folders: Vec<FolderView>,
    skipped: usize,
    expanded: Option<usize>,
    selected: Option<TileId>,
    thumbs_requested: HashSet<String>,
    auto_select_pending: bool,
}

impl Gallery {
    pub fn new() -> Self {
        Self {
            status: GalleryStatus::Loading,
            folders: Vec::new(),
            skipped: 0,
            expanded: None,
            selected: None,
            thumbs_requested: HashSet::new(),
            auto_select_pending: false,
        }
    }

    /// Drops everything built from the previous manifest.
    pub fn begin_load(&mut self) {
        self.status = GalleryStatus::Loading;
        self.folders.clear();
        self.skipped = 0;
        self.expanded = None;
        self.selected = None;
        self.thumbs_requested.clear();
        self.auto_select_pending = false;
    }

    pub fn apply(&mut self, folders: Vec<FolderView>, skipped: usize) {
        self.auto_select_pending = !folders.is_empty();
        self.folders = folders;
        self.skipped = skipped;
        self.status = GalleryStatus::Ready;
    }

    pub fn fail(&mut self, message: String) {
        self.status = GalleryStatus::Failed(message);
    }

    pub fn status(&self) -> &GalleryStatus {
        &self.status
    }

    pub fn folders(&self) -> &[FolderView] {
        &self.folders
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn selected(&self) -> Option<TileId> {
        self.selected
    }

    pub fn auto_select_pending(&self) -> bool {
        self.auto_select_pending
    }

    /// Collapses every other folder and flips this one. Returns the paths of
    /// tiles that became visible and still need a thumbnail.
    pub fn toggle_folder(&mut self, folder: usize) -> Vec<String> {
        let Some(view) = self.folders.get(folder) else {
            return Vec::new();
        };
        if self.expanded == Some(folder) {
            self.expanded = None;
            return Vec::new();
        }
        self.expanded = Some(folder);
        view.children
            .iter()
            .filter(|f| self.thumbs_requested.insert(f.path.clone()))
            .map(|f| f.path.clone())
            .collect()
    }

    /// Makes `id` the only selected tile. Unknown ids change nothing.
    pub fn select(&mut self, id: TileId) -> bool {
        if self.tile(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn tile(&self, id: TileId) -> Option<&FileView> {
        self.folders.get(id.folder)?.children.get(id.file)
    }

    /// Consumes the one-shot auto-selection: the first folder, and within it
    /// `latest.png` when present, otherwise the newest tile.
    pub fn take_auto_select(&mut self) -> Option<(usize, Option<TileId>)> {
        if !std::mem::take(&mut self.auto_select_pending) {
            return None;
        }
        let first = self.folders.first()?;
        if first.children.is_empty() {
            return Some((0, None));
        }
        let file = first
            .children
            .iter()
            .position(|f| f.file_name == LATEST_FILE)
            .unwrap_or(0);
        Some((0, Some(TileId { folder: 0, file })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{FolderRecord, FolderView};

    fn folder(name: &str, files: &[&str]) -> FolderView {
        let record = FolderRecord {
            files: files.iter().map(|f| f.to_string()).collect(),
            last_update: String::new(),
        };
        FolderView::new("", name, &record)
    }

    fn ready(folders: Vec<FolderView>) -> Gallery {
        let mut g = Gallery::new();
        g.apply(folders, 0);
        g
    }

    #[test]
    fn only_one_folder_is_expanded_at_a_time() {
        let mut g = ready(vec![
            folder("202601", &["a_20260101.png"]),
            folder("202602", &["b_20260201.png"]),
        ]);
        g.toggle_folder(0);
        assert_eq!(g.expanded(), Some(0));
        g.toggle_folder(1);
        assert_eq!(g.expanded(), Some(1));
        g.toggle_folder(1);
        assert_eq!(g.expanded(), None);
        g.toggle_folder(7);
        assert_eq!(g.expanded(), None);
    }

    #[test]
    fn thumbnails_are_requested_once_per_path() {
        let mut g = ready(vec![folder("202601", &["a.png", "b.png"])]);
        let first = g.toggle_folder(0);
        assert_eq!(first, ["contracts/202601/b.png", "contracts/202601/a.png"]);
        g.toggle_folder(0);
        assert!(g.toggle_folder(0).is_empty());
    }

    #[test]
    fn unknown_tiles_are_not_selected() {
        let mut g = ready(vec![folder("202601", &["a.png"])]);
        assert!(!g.select(TileId { folder: 0, file: 3 }));
        assert_eq!(g.selected(), None);
        assert!(g.select(TileId { folder: 0, file: 0 }));
    }

    #[test]
    fn auto_select_prefers_latest_then_newest() {
        let mut g = ready(vec![folder("202601", &["latest.png", "a_20260101.png"])]);
        assert_eq!(
            g.take_auto_select(),
            Some((0, Some(TileId { folder: 0, file: 1 })))
        );
        assert_eq!(g.take_auto_select(), None);

        let mut g = ready(vec![folder("202601", &["a_20260101.png", "a_20260102.png"])]);
        assert_eq!(
            g.take_auto_select(),
            Some((0, Some(TileId { folder: 0, file: 0 })))
        );
    }

    #[test]
    fn auto_select_on_empty_folder_only_opens_it() {
        let mut g = ready(vec![folder("202601", &[])]);
        assert_eq!(g.take_auto_select(), Some((0, None)));
    }

    #[test]
    fn empty_gallery_has_nothing_to_auto_select() {
        let mut g = ready(Vec::new());
        assert!(!g.auto_select_pending());
        assert_eq!(g.take_auto_select(), None);
    }

    #[test]
    fn reload_clears_selection_and_expansion() {
        let mut g = ready(vec![folder("202601", &["a.png"])]);
        g.toggle_folder(0);
        g.select(TileId { folder: 0, file: 0 });
        g.begin_load();
        assert_eq!(g.status(), &GalleryStatus::Loading);
        assert_eq!(g.expanded(), None);
        assert_eq!(g.selected(), None);
        assert!(g.folders().is_empty());
    }
}

use std::collections::HashMap;

use crate::dashboard::Event;
use crate::gallery::{Gallery, GalleryStatus, TileId};
use crate::manifest::FileView;
use crate::viewer::category_color;

const CELL: f32 = 150.0;
const LABEL_H: f32 = 34.0;

enum ThumbState {
    Ready(egui::TextureHandle),
    Failed,
}

/// Tile textures keyed by the chart path (without cache parameter).
#[derive(Default)]
pub struct Thumbnails {
    textures: HashMap<String, ThumbState>,
}

impl Thumbnails {
    pub fn insert(&mut self, ctx: &egui::Context, path: String, image: Option<egui::ColorImage>) {
        let state = match image {
            Some(img) => {
                ThumbState::Ready(ctx.load_texture(&path, img, egui::TextureOptions::LINEAR))
            }
            None => ThumbState::Failed,
        };
        self.textures.insert(path, state);
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }

    fn get(&self, path: &str) -> Option<&ThumbState> {
        self.textures.get(path)
    }
}

/// Draws the folder list. Clicks come back as dashboard events; the widget
/// itself holds no selection or expansion state.
pub fn show_gallery(ui: &mut egui::Ui, gallery: &Gallery, thumbs: &Thumbnails) -> Vec<Event> {
    let mut events = Vec::new();

    match gallery.status() {
        GalleryStatus::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading chart list…");
            });
            return events;
        }
        GalleryStatus::Failed(message) => {
            ui.colored_label(ui.visuals().error_fg_color, "⚠ Chart list unavailable");
            ui.label(egui::RichText::new(message).weak().small());
            ui.label(egui::RichText::new("Press Reload to try again.").weak());
            return events;
        }
        GalleryStatus::Ready => {}
    }

    if gallery.folders().is_empty() {
        ui.label(egui::RichText::new("No recent contract months").weak());
        return events;
    }

    egui::ScrollArea::vertical()
        .id_salt("gallery_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (fi, folder) in gallery.folders().iter().enumerate() {
                let expanded = gallery.expanded() == Some(fi);
                let arrow = if expanded { "▼" } else { "▶" };
                let header = format!(
                    "{} 📁 {}  ({})",
                    arrow,
                    folder.name,
                    folder.children.len()
                );
                let resp = ui.add_sized(
                    [ui.available_width(), 28.0],
                    egui::Button::new(egui::RichText::new(header).strong())
                        .selected(expanded),
                );
                if resp.clicked() {
                    events.push(Event::FolderToggled(fi));
                }
                if !folder.last_update.is_empty() {
                    ui.label(
                        egui::RichText::new(format!("updated {}", folder.last_update))
                            .weak()
                            .small(),
                    );
                }

                if expanded {
                    let cols = ((ui.available_width() / (CELL + 8.0)) as usize).max(1);
                    egui::Grid::new(("tile_grid", fi))
                        .num_columns(cols)
                        .spacing([8.0, 8.0])
                        .show(ui, |ui| {
                            for (i, file) in folder.children.iter().enumerate() {
                                let id = TileId { folder: fi, file: i };
                                let selected = gallery.selected() == Some(id);
                                if draw_tile(ui, file, thumbs.get(&file.path), selected) {
                                    events.push(Event::TileClicked(id));
                                }
                                if (i + 1) % cols == 0 {
                                    ui.end_row();
                                }
                            }
                        });
                }
                ui.add_space(6.0);
            }
        });

    events
}

fn draw_tile(ui: &mut egui::Ui, file: &FileView, thumb: Option<&ThumbState>, selected: bool) -> bool {
    let (resp, painter) =
        ui.allocate_painter(egui::vec2(CELL, CELL + LABEL_H), egui::Sense::click());
    let rect = resp.rect;

    if selected {
        painter.rect_filled(rect, 4.0, ui.visuals().selection.bg_fill);
    } else if resp.hovered() {
        painter.rect_filled(rect, 4.0, ui.visuals().widgets.hovered.bg_fill);
    }

    let img_rect = egui::Rect::from_min_size(rect.min, egui::vec2(CELL, CELL));
    match thumb {
        Some(ThumbState::Ready(tex)) => {
            let tex_size = tex.size_vec2();
            let scale = (CELL / tex_size.x).min(CELL / tex_size.y);
            let display = tex_size * scale;
            let offset = (egui::vec2(CELL, CELL) - display) * 0.5;
            painter.image(
                tex.id(),
                egui::Rect::from_min_size(img_rect.min + offset, display),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        Some(ThumbState::Failed) => {
            painter.rect_filled(img_rect, 4.0, egui::Color32::from_gray(40));
            painter.text(
                img_rect.center(),
                egui::Align2::CENTER_CENTER,
                "⚠",
                egui::FontId::proportional(22.0),
                ui.visuals().warn_fg_color,
            );
        }
        None => {
            painter.rect_filled(img_rect, 4.0, egui::Color32::from_gray(40));
            painter.text(
                img_rect.center(),
                egui::Align2::CENTER_CENTER,
                "…",
                egui::FontId::proportional(22.0),
                egui::Color32::GRAY,
            );
        }
    }

    let date = file.short_date();
    let date_pos = egui::pos2(rect.center().x, img_rect.max.y + 9.0);
    painter.text(
        date_pos,
        egui::Align2::CENTER_CENTER,
        if date.is_empty() { file.file_name.as_str() } else { date.as_str() },
        egui::FontId::proportional(12.0),
        ui.visuals().text_color(),
    );
    painter.text(
        egui::pos2(rect.center().x, img_rect.max.y + 25.0),
        egui::Align2::CENTER_CENTER,
        format!("{} {}", file.category.icon(), file.category.label()),
        egui::FontId::proportional(11.0),
        category_color(file.category),
    );

    let full_date = file.full_date();
    let resp = if full_date.is_empty() {
        resp.on_hover_text(&file.file_name)
    } else {
        resp.on_hover_text(format!("{}\n{}", full_date, file.file_name))
    };
    resp.clicked()
}

use egui::{Pos2, Rect, Vec2};
use tracing::{debug, info, warn};

use crate::dashboard::Event;
use crate::error::GalleryError;
use crate::manifest::Category;

pub const MIN_SCALE: f32 = 1.0;
pub const MAX_SCALE: f32 = 5.0;
pub const DEFAULT_ZOOM_STEP: f32 = 0.25;

/// Easing applied to programmatic zoom changes; drags bypass it.
const TRANSITION_SECS: f32 = 0.15;
const FADE_SECS: f32 = 0.2;
const LIGHTBOX_MARGIN: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opacity {
    Full,
    /// A new chart is being fetched.
    Faded,
    /// The last fetch failed; the previous chart (if any) stays up.
    Degraded,
}

impl Opacity {
    pub fn alpha(self) -> f32 {
        match self {
            Opacity::Full => 1.0,
            Opacity::Faded => 0.3,
            Opacity::Degraded => 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    token: u64,
    path: String,
    label: String,
    category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The chart currently committed to the main panel.
pub struct MainImage {
    pub path: String,
    pub label: String,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadOutcome {
    Committed,
    Failed,
    /// A newer selection superseded this preload.
    Stale,
}

/// Main panel state plus the lightbox.
#[derive(Debug)]
pub struct ViewerState {
    shown: Option<MainImage>,
    pending: Option<Pending>,
    alt: Option<String>,
    opacity: Opacity,
    next_token: u64,
    pub lightbox: Lightbox,
}

impl ViewerState {
    pub fn new(zoom_step: f32) -> Self {
        Self {
            shown: None,
            pending: None,
            alt: None,
            opacity: Opacity::Full,
            next_token: 0,
            lightbox: Lightbox::new(zoom_step),
        }
    }

    /// Starts showing `path`: fades the panel and returns the token the
    /// preload result must carry to be accepted.
    pub fn display(&mut self, path: &str, label: &str, category: Category) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        self.opacity = Opacity::Faded;
        self.pending = Some(Pending {
            token,
            path: path.to_string(),
            label: label.to_string(),
            category,
        });
        debug!(token, path, "preload started");
        token
    }

    pub fn finish_preload(
        &mut self,
        token: u64,
        result: Result<(), GalleryError>,
    ) -> PreloadOutcome {
        let Some(pending) = self.pending.take_if(|p| p.token == token) else {
            debug!(token, "stale preload dropped");
            return PreloadOutcome::Stale;
        };
        match result {
            Ok(()) => {
                info!(token, path = %pending.path, "chart committed");
                self.shown = Some(MainImage {
                    path: pending.path,
                    label: pending.label,
                    category: pending.category,
                });
                self.alt = None;
                self.opacity = Opacity::Full;
                PreloadOutcome::Committed
            }
            Err(err) => {
                warn!(token, error = %err, "chart preload failed");
                self.alt = Some(format!(
                    "Chart not yet synced or path is wrong: {}",
                    pending.path
                ));
                self.opacity = Opacity::Degraded;
                PreloadOutcome::Failed
            }
        }
    }

    pub fn shown(&self) -> Option<&MainImage> {
        self.shown.as_ref()
    }

    pub fn alt(&self) -> Option<&str> {
        self.alt.as_deref()
    }

    pub fn opacity(&self) -> Opacity {
        self.opacity
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Opens the lightbox on the committed chart. Without one there is
    /// nothing to enlarge and the click is ignored.
    pub fn open_lightbox(&mut self) -> bool {
        if self.shown.is_none() {
            return false;
        }
        self.lightbox.open();
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxPhase {
    Closed,
    OpenUnzoomed,
    OpenZoomed,
    Dragging,
}

/// Zoom/pan state of the full-screen viewer. The mutating methods keep
/// `scale` within `[MIN_SCALE, MAX_SCALE]`, zero the translation whenever
/// scale is back at 1 and only allow dragging while zoomed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Lightbox {
    open: bool,
    scale: f32,
    translate: Vec2,
    dragging: bool,
    anchor: Option<Vec2>,
    zoom_step: f32,
}

impl Lightbox {
    pub fn new(zoom_step: f32) -> Self {
        Self {
            open: false,
            scale: MIN_SCALE,
            translate: Vec2::ZERO,
            dragging: false,
            anchor: None,
            zoom_step,
        }
    }

    pub fn phase(&self) -> LightboxPhase {
        if !self.open {
            LightboxPhase::Closed
        } else if self.dragging {
            LightboxPhase::Dragging
        } else if self.scale > MIN_SCALE {
            LightboxPhase::OpenZoomed
        } else {
            LightboxPhase::OpenUnzoomed
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    /// Easing is suspended while a drag tracks the pointer.
    pub fn transitions_enabled(&self) -> bool {
        !self.dragging
    }

    /// Opening always starts from the identity transform.
    pub fn open(&mut self) {
        self.open = true;
        self.scale = MIN_SCALE;
        self.translate = Vec2::ZERO;
        self.dragging = false;
        self.anchor = None;
    }

    /// Returns `false` when already closed. Zoom is left as-is.
    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        self.end_drag();
        true
    }

    /// One wheel step: positive `delta_y` (scroll up) zooms in.
    pub fn wheel(&mut self, delta_y: f32) -> bool {
        if !self.open || delta_y == 0.0 || !delta_y.is_finite() {
            return false;
        }
        let step = if delta_y > 0.0 {
            self.zoom_step
        } else {
            -self.zoom_step
        };
        self.scale = (self.scale + step).clamp(MIN_SCALE, MAX_SCALE);
        if self.scale - MIN_SCALE < 1e-4 {
            self.scale = MIN_SCALE;
            self.translate = Vec2::ZERO;
            self.end_drag();
        }
        true
    }

    pub fn pointer_down(&mut self, pos: Pos2, on_image: bool) -> bool {
        if !self.open || !on_image || self.scale <= MIN_SCALE {
            return false;
        }
        self.dragging = true;
        self.anchor = Some(pos.to_vec2() - self.translate);
        true
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        if let (true, Some(anchor)) = (self.dragging, self.anchor) {
            self.translate = pos.to_vec2() - anchor;
        }
    }

    /// Releases end any drag, wherever the pointer is.
    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    fn end_drag(&mut self) {
        self.dragging = false;
        self.anchor = None;
    }
}

/// Translate, then scale about the translated centre. The translation itself
/// is never scaled.
fn transform_rect(base: Rect, translate: Vec2, scale: f32) -> Rect {
    Rect::from_center_size(base.center() + translate, base.size() * scale)
}

fn fit_rect(container: Rect, image_size: Vec2) -> Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return Rect::from_center_size(container.center(), Vec2::ZERO);
    }
    let scale = (container.width() / image_size.x).min(container.height() / image_size.y);
    Rect::from_center_size(container.center(), image_size * scale)
}

fn full_uv() -> Rect {
    Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0))
}

/// Draws the main chart. Returns `true` when the chart was clicked.
pub fn show_main_chart(
    ui: &mut egui::Ui,
    viewer: &ViewerState,
    texture: Option<&egui::TextureHandle>,
) -> bool {
    let alpha = ui.ctx().animate_value_with_time(
        egui::Id::new("main_chart_opacity"),
        viewer.opacity().alpha(),
        FADE_SECS,
    );

    ui.horizontal(|ui| {
        match viewer.shown() {
            Some(shown) => {
                ui.label(egui::RichText::new(&shown.label).strong().size(16.0));
                ui.label(
                    egui::RichText::new(format!(
                        "{} {}",
                        shown.category.icon(),
                        shown.category.label()
                    ))
                    .color(category_color(shown.category)),
                );
            }
            None => {
                ui.label(egui::RichText::new("No chart selected").weak());
            }
        }
        if viewer.is_loading() {
            ui.spinner();
        }
    });
    if let Some(alt) = viewer.alt() {
        ui.colored_label(ui.visuals().warn_fg_color, format!("⚠ {}", alt));
    }
    ui.separator();

    let Some(tex) = texture else {
        ui.centered_and_justified(|ui| {
            ui.label(egui::RichText::new("Select a chart").weak());
        });
        return false;
    };

    let avail = ui.available_rect_before_wrap();
    let img_rect = fit_rect(avail, tex.size_vec2());
    let resp = ui.allocate_rect(avail, egui::Sense::click());
    ui.painter().image(
        tex.id(),
        img_rect,
        full_uv(),
        egui::Color32::WHITE.gamma_multiply(alpha),
    );
    let resp = resp.on_hover_cursor(egui::CursorIcon::ZoomIn);
    match viewer.shown() {
        Some(shown) => resp.on_hover_text(&shown.path).clicked(),
        None => resp.clicked(),
    }
}

/// Draws the full-screen lightbox and translates raw pointer input into
/// dashboard events. Release and Escape are read globally by the caller.
pub fn show_lightbox(
    ctx: &egui::Context,
    lightbox: &Lightbox,
    texture: &egui::TextureHandle,
) -> Vec<Event> {
    let mut events = Vec::new();
    let screen = ctx.screen_rect();

    let secs = if lightbox.transitions_enabled() {
        TRANSITION_SECS
    } else {
        0.0
    };
    let animate = |name: &str, target: f32| {
        ctx.animate_value_with_time(egui::Id::new(name), target, secs)
    };
    let scale = animate("lightbox_scale", lightbox.scale());
    let offset = egui::vec2(
        animate("lightbox_tx", lightbox.translate().x),
        animate("lightbox_ty", lightbox.translate().y),
    );

    let base = fit_rect(screen.shrink(LIGHTBOX_MARGIN), texture.size_vec2());
    let img_rect = transform_rect(base, offset, scale);

    egui::Area::new(egui::Id::new("lightbox"))
        .order(egui::Order::Foreground)
        .fixed_pos(screen.min)
        .show(ctx, |ui| {
            let backdrop = ui.allocate_rect(screen, egui::Sense::click_and_drag());
            let painter = ui.painter_at(screen);
            painter.rect_filled(screen, 0.0, egui::Color32::from_black_alpha(230));
            painter.image(texture.id(), img_rect, full_uv(), egui::Color32::WHITE);

            let cursor = match lightbox.phase() {
                LightboxPhase::Dragging => egui::CursorIcon::Grabbing,
                LightboxPhase::OpenZoomed => egui::CursorIcon::Grab,
                LightboxPhase::OpenUnzoomed | LightboxPhase::Closed => egui::CursorIcon::Default,
            };
            backdrop.on_hover_cursor(cursor);

            painter.text(
                screen.left_bottom() + egui::vec2(12.0, -12.0),
                egui::Align2::LEFT_BOTTOM,
                format!(
                    "{:.0}%  ·  scroll to zoom, drag to pan, Esc to close",
                    lightbox.scale() * 100.0
                ),
                egui::FontId::proportional(12.0),
                egui::Color32::from_gray(180),
            );

            let close_rect = egui::Rect::from_min_size(
                screen.right_top() + egui::vec2(-44.0, 12.0),
                egui::vec2(32.0, 32.0),
            );
            if ui
                .put(close_rect, egui::Button::new(egui::RichText::new("✕").size(18.0)))
                .clicked()
            {
                events.push(Event::CloseRequested);
            }
        });

    ctx.input(|i| {
        if i.pointer.primary_pressed() {
            if let Some(pos) = i.pointer.interact_pos() {
                events.push(Event::PointerDown {
                    pos,
                    on_image: img_rect.contains(pos),
                });
            }
        }
        if lightbox.is_dragging() {
            if let Some(pos) = i.pointer.latest_pos() {
                events.push(Event::PointerMove { pos });
            }
        }
    });

    events
}

pub fn category_color(category: Category) -> egui::Color32 {
    match category {
        Category::Regular => egui::Color32::from_rgb(0x4f, 0xa3, 0xe0),
        Category::Night => egui::Color32::from_rgb(0xb3, 0x8c, 0xf2),
    }
}

use crate::{
    browser::{self, Thumbnails},
    config::AppConfig,
    dashboard::{Dashboard, Effect, Event, Key},
    gallery::GalleryStatus,
    loader::{Worker, WorkerMsg},
    viewer,
};

pub struct ChartboardApp {
    dashboard: Dashboard,
    worker: Worker,
    thumbs: Thumbnails,
    main_texture: Option<egui::TextureHandle>,
    /// Local `HH:MM` at which the current manifest arrived.
    loaded_at: Option<String>,
    config: AppConfig,
}

impl ChartboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig, root: String) -> Self {
        let mut app = Self {
            dashboard: Dashboard::new(root, config.retention_days(), config.zoom_step()),
            worker: Worker::new(),
            thumbs: Thumbnails::default(),
            main_texture: None,
            loaded_at: None,
            config,
        };
        let effects = app.dashboard.start();
        app.run_effects(effects, &cc.egui_ctx);
        app
    }

    fn dispatch(&mut self, event: Event, ctx: &egui::Context) {
        if matches!(event, Event::ReloadRequested) {
            self.thumbs.clear();
            self.loaded_at = None;
        }
        let effects = self.dashboard.handle(event);
        self.run_effects(effects, ctx);
    }

    fn run_effects(&mut self, effects: Vec<Effect>, ctx: &egui::Context) {
        for effect in effects {
            if let Some(leftover) = self.worker.run(effect, ctx) {
                tracing::debug!(?leftover, "effect without pending image ignored");
            }
        }
    }

    fn poll_worker(&mut self, ctx: &egui::Context) {
        for msg in self.worker.drain() {
            match msg {
                WorkerMsg::Manifest(result) => {
                    let now = chrono::Local::now();
                    if result.is_ok() {
                        self.loaded_at = Some(now.format("%H:%M").to_string());
                    }
                    self.dispatch(
                        Event::ManifestLoaded {
                            result,
                            today: now.date_naive(),
                        },
                        ctx,
                    );
                }
                WorkerMsg::Chart { token, result } => {
                    let (outcome, image) = match result {
                        Ok(img) => (Ok(()), Some(img)),
                        Err(err) => (Err(err), None),
                    };
                    let effects = self.dashboard.handle(Event::PreloadFinished {
                        token,
                        result: outcome,
                    });
                    let mut image = image;
                    for effect in effects {
                        match effect {
                            Effect::CommitMainImage { token: t } if t == token => {
                                if let Some(img) = image.take() {
                                    self.main_texture = Some(ctx.load_texture(
                                        "main_chart",
                                        img,
                                        egui::TextureOptions::LINEAR,
                                    ));
                                }
                            }
                            other => self.run_effects(vec![other], ctx),
                        }
                    }
                }
                WorkerMsg::Thumb { path, image } => {
                    self.thumbs.insert(ctx, path, image);
                }
            }
        }
    }
}

/// Keyboard, wheel and release handling that applies regardless of which
/// widget has the pointer. Each wheel event is one zoom step.
fn global_input(ctx: &egui::Context, lightbox_open: bool, dragging: bool) -> Vec<Event> {
    let mut events = Vec::new();

    ctx.input_mut(|i| {
        if i.key_pressed(egui::Key::Escape) {
            events.push(Event::KeyDown(Key::Escape));
        }
        if !lightbox_open && i.key_pressed(egui::Key::F5) {
            events.push(Event::ReloadRequested);
        }
        if lightbox_open {
            events.extend(i.events.iter().filter_map(|ev| match ev {
                egui::Event::MouseWheel { delta, .. } if delta.y != 0.0 => {
                    Some(Event::Wheel { delta_y: delta.y })
                }
                _ => None,
            }));
            // keep the gallery underneath from scrolling
            i.raw_scroll_delta = egui::Vec2::ZERO;
            i.smooth_scroll_delta = egui::Vec2::ZERO;
        }
        if dragging && (i.pointer.any_released() || !i.pointer.primary_down()) {
            events.push(Event::PointerUp);
        }
    });
    events
}

impl eframe::App for ChartboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        self.poll_worker(ctx);

        let lightbox = &self.dashboard.viewer.lightbox;
        let mut events = global_input(ctx, lightbox.is_open(), lightbox.is_dragging());

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Contract charts");
                ui.separator();
                ui.monospace(self.dashboard.root());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let loading = *self.dashboard.gallery.status() == GalleryStatus::Loading;
                    if ui
                        .add_enabled(!loading, egui::Button::new("⟳ Reload"))
                        .on_hover_text("F5")
                        .clicked()
                    {
                        events.push(Event::ReloadRequested);
                    }
                    if let Some(at) = &self.loaded_at {
                        ui.label(format!("Updated {}", at));
                    }
                    let skipped = self.dashboard.gallery.skipped();
                    if skipped > 0 {
                        ui.label(
                            egui::RichText::new(format!("{} expired month(s) hidden", skipped))
                                .weak(),
                        );
                    }
                });
            });
        });

        egui::SidePanel::left("gallery")
            .resizable(true)
            .default_width(360.0)
            .min_width(200.0)
            .show(ctx, |ui| {
                events.extend(browser::show_gallery(ui, &self.dashboard.gallery, &self.thumbs));
            });

        // The gallery has now been laid out at least once for this manifest.
        if self.dashboard.gallery.auto_select_pending() {
            events.push(Event::GalleryRendered);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if viewer::show_main_chart(ui, &self.dashboard.viewer, self.main_texture.as_ref()) {
                events.push(Event::MainImageClicked);
            }
        });

        if self.dashboard.viewer.lightbox.is_open() {
            if let Some(tex) = &self.main_texture {
                events.extend(viewer::show_lightbox(ctx, &self.dashboard.viewer.lightbox, tex));
            }
        }

        for event in events {
            self.dispatch(event, ctx);
        }

        if self.dashboard.viewer.lightbox.is_open() || self.dashboard.viewer.is_loading() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Category;
    use crate::viewer::DEFAULT_ZOOM_STEP;

    struct Frame {
        events: Vec<Event>,
        raw_scroll: egui::Vec2,
        smooth_scroll: egui::Vec2,
    }

    fn run_frame(
        ctx: &egui::Context,
        input: Vec<egui::Event>,
        lightbox_open: bool,
        dragging: bool,
    ) -> Frame {
        let raw = egui::RawInput {
            events: input,
            ..Default::default()
        };
        let mut frame = Frame {
            events: Vec::new(),
            raw_scroll: egui::Vec2::ZERO,
            smooth_scroll: egui::Vec2::ZERO,
        };
        let _ = ctx.run(raw, |ctx| {
            frame.events = global_input(ctx, lightbox_open, dragging);
            (frame.raw_scroll, frame.smooth_scroll) =
                ctx.input(|i| (i.raw_scroll_delta, i.smooth_scroll_delta));
        });
        frame
    }

    fn wheel_notch(y: f32) -> egui::Event {
        egui::Event::MouseWheel {
            unit: egui::MouseWheelUnit::Line,
            delta: egui::vec2(0.0, y),
            modifiers: egui::Modifiers::default(),
        }
    }

    fn key(key: egui::Key) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::default(),
        }
    }

    fn primary(pos: egui::Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::default(),
        }
    }

    fn dashboard_with_open_lightbox() -> Dashboard {
        let mut dashboard = Dashboard::new("", 15, DEFAULT_ZOOM_STEP);
        let token = dashboard
            .viewer
            .display("contracts/202602/latest.png", "02/06", Category::Regular);
        dashboard.viewer.finish_preload(token, Ok(()));
        dashboard.handle(Event::MainImageClicked);
        assert!(dashboard.viewer.lightbox.is_open());
        dashboard
    }

    #[test]
    fn every_wheel_notch_in_a_frame_is_one_zoom_step() {
        let ctx = egui::Context::default();
        let mut dashboard = dashboard_with_open_lightbox();

        let frame = run_frame(&ctx, vec![wheel_notch(1.0); 3], true, false);
        assert_eq!(frame.events, vec![Event::Wheel { delta_y: 1.0 }; 3]);
        for event in frame.events {
            dashboard.handle(event);
        }
        assert!((dashboard.viewer.lightbox.scale() - 1.75).abs() < 1e-6);
    }

    #[test]
    fn open_lightbox_swallows_scrolling() {
        let ctx = egui::Context::default();

        let frame = run_frame(&ctx, vec![wheel_notch(1.0), wheel_notch(-1.0)], true, false);
        assert_eq!(frame.events.len(), 2);
        assert_eq!(frame.raw_scroll, egui::Vec2::ZERO);
        assert_eq!(frame.smooth_scroll, egui::Vec2::ZERO);
    }

    #[test]
    fn closed_lightbox_leaves_scrolling_to_the_gallery() {
        let ctx = egui::Context::default();

        let frame = run_frame(&ctx, vec![wheel_notch(1.0)], false, false);
        assert!(frame.events.is_empty());
        assert_ne!(frame.raw_scroll, egui::Vec2::ZERO);
    }

    #[test]
    fn release_anywhere_ends_a_drag() {
        let ctx = egui::Context::default();

        let held = run_frame(&ctx, vec![primary(egui::pos2(100.0, 100.0), true)], true, true);
        assert!(!held.events.contains(&Event::PointerUp));

        let far_away = egui::pos2(5000.0, -300.0);
        let released = run_frame(&ctx, vec![primary(far_away, false)], true, true);
        assert_eq!(released.events, vec![Event::PointerUp]);
    }

    #[test]
    fn release_without_a_drag_is_ignored() {
        let ctx = egui::Context::default();

        let frame = run_frame(&ctx, vec![primary(egui::pos2(10.0, 10.0), false)], true, false);
        assert!(frame.events.is_empty());
    }

    #[test]
    fn escape_is_read_at_window_level() {
        let ctx = egui::Context::default();

        let frame = run_frame(&ctx, vec![key(egui::Key::Escape)], true, false);
        assert_eq!(frame.events, vec![Event::KeyDown(Key::Escape)]);
    }

    #[test]
    fn f5_reloads_only_while_the_lightbox_is_closed() {
        let ctx = egui::Context::default();

        let closed = run_frame(&ctx, vec![key(egui::Key::F5)], false, false);
        assert_eq!(closed.events, vec![Event::ReloadRequested]);

        let open = run_frame(&ctx, vec![key(egui::Key::F5)], true, false);
        assert!(open.events.is_empty());
    }
}

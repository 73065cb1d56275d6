mod app;
mod browser;
mod config;
mod dashboard;
mod error;
mod gallery;
mod loader;
mod manifest;
mod source;
mod thumbnail;
mod viewer;

use app::ChartboardApp;
use config::AppConfig;

const ROOT_ENV: &str = "CHARTBOARD_ROOT";
const DEFAULT_ROOT: &str = ".";

fn resolve_root(env_value: Option<String>, config: &AppConfig) -> String {
    let pick = |raw: &str| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };
    env_value
        .as_deref()
        .and_then(pick)
        .or_else(|| config.root.as_deref().and_then(pick))
        .unwrap_or_else(|| DEFAULT_ROOT.to_string())
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let root = resolve_root(std::env::var(ROOT_ENV).ok(), &config);
    tracing::info!(
        %root,
        retention_days = config.retention_days(),
        zoom_step = config.zoom_step(),
        "chartboard starting"
    );

    let width = config.window_width.unwrap_or(1280.0);
    let height = config.window_height.unwrap_or(820.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Chartboard")
            .with_app_id("chartboard")
            .with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "chartboard",
        native_options,
        Box::new(|cc| Ok(Box::new(ChartboardApp::new(cc, config, root)))),
    )
}

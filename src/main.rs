mod api;
mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;

use iced::window;
use image::{Rgba, RgbaImage};

/// Red rounded badge with a white play triangle.
fn app_icon() -> Option<window::Icon> {
    const SIZE: u32 = 64;
    let img = RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let (fx, fy) = (x as f32 - 31.5, y as f32 - 31.5);
        let in_badge = fx.abs() < 30.0 && fy.abs() < 22.0;
        // Triangle pointing right, centred on the badge
        let in_play = fx > -8.0 && fx < 12.0 && fy.abs() < (12.0 - fx) * 0.6;

        match (in_badge, in_play) {
            (true, true) => Rgba([255, 255, 255, 255]),
            (true, false) => Rgba([220, 30, 30, 255]),
            _ => Rgba([0, 0, 0, 0]),
        }
    });

    let (width, height) = img.dimensions();
    window::icon::from_rgba(img.into_raw(), width, height).ok()
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tube_grab=info".into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn main() -> iced::Result {
    init_tracing();

    let (config, config_path) = config::load_or_default();

    iced::application(
        move || app::DownloadApp::new(config.clone(), config_path.clone()),
        app::update,
        app::view,
    )
    .title("YouTube Downloader")
    .window(window::Settings {
        size: iced::Size::new(480.0, 360.0),
        icon: app_icon(),
        ..Default::default()
    })
    .run()
}

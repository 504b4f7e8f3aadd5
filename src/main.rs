use aspect_shell::app::AspectShellApp;
use aspect_shell::config::Config;
use aspect_shell::constant;
use aspect_shell::geometry::view_key;
use aspect_shell::resize::{stored_geometry, stored_min_size};
use aspect_shell::settings::SettingsStore;
use aspect_shell::ui;
use std::sync::Arc;

fn main() -> eframe::Result {
    let config = Config::default();
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();

    let node = &config.settings.settings_node;
    let settings = match SettingsStore::open(node) {
        Ok(settings) => settings,
        Err(e) => {
            // Keep running; preferences just won't outlive this session
            tracing::error!("Failed to open settings '{}': {}", node, e);
            SettingsStore::in_memory(node)
        }
    };
    let settings = Arc::new(settings);

    // Geometry has to be known before the native window is created
    let key = view_key(&config.settings.view_name);
    let options = ui::viewport::build_viewport(
        stored_geometry(&settings, &key),
        config.settings.default_window_size,
        stored_min_size(&settings, &key),
    );

    eframe::run_native(
        constant::DEFAULT_WINDOW_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(AspectShellApp::new(cc, &config, settings)))),
    )
}

use crate::constant::DEFAULT_WINDOW_TITLE;
use crate::geometry::WindowGeometry;

/// Native options for the main view: stored geometry when there is one,
/// `default_size` otherwise.
pub fn build_viewport(
    stored: Option<WindowGeometry>,
    default_size: [f32; 2],
    min_size: (f64, f64),
) -> eframe::NativeOptions {
    let mut viewport = egui::ViewportBuilder::default()
        .with_title(DEFAULT_WINDOW_TITLE)
        .with_min_inner_size([min_size.0 as f32, min_size.1 as f32])
        .with_resizable(true);

    viewport = match stored {
        Some(geometry) => viewport
            .with_position([geometry.x as f32, geometry.y as f32])
            .with_inner_size([geometry.width as f32, geometry.height as f32]),
        None => viewport.with_inner_size(default_size),
    };

    eframe::NativeOptions {
        viewport,
        ..Default::default()
    }
}

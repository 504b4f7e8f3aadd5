use egui::{Color32, Context, Style, Visuals};

pub fn configure_style(ctx: &Context) {
    let mut style = Style::default();

    // The background image fills the window; panels add nothing on top.
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    ctx.set_style(style);

    let mut visuals = Visuals::dark();
    visuals.window_shadow = egui::epaint::Shadow::NONE;
    visuals.popup_shadow = egui::epaint::Shadow::NONE;
    visuals.panel_fill = Color32::from_rgb(0, 100, 100);
    visuals.extreme_bg_color = Color32::BLACK;

    ctx.set_visuals(visuals);
}

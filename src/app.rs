use crate::background::BackgroundImages;
use crate::config::Config;
use crate::constant::{KEY_BG_IMAGE_IDX, KEY_BG_IMAGE_PATH};
use crate::geometry::{AspectRatio, Dimension, WindowGeometry};
use crate::labels::{LabelColor, LabelPos};
use crate::resize::{AspectLockedWindow, TimerThread, WindowHandle};
use crate::settings::SettingsStore;
use crate::style::configure_style;
use crate::ui::font::{LabelFonts, setup_fonts};
use egui::{Align2, Color32, Pos2, Rect, Vec2};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{info, warn};

/// The eframe viewport seen through [`WindowHandle`].
pub struct EguiWindow {
    ctx: egui::Context,
}

impl EguiWindow {
    fn inner_size(&self) -> Vec2 {
        self.ctx
            .input(|i| i.viewport().inner_rect.map(|r| r.size()))
            .unwrap_or(Vec2::ZERO)
    }
}

impl WindowHandle for EguiWindow {
    fn extent(&self, dimension: Dimension) -> f64 {
        let size = self.inner_size();
        match dimension {
            Dimension::Width => size.x as f64,
            Dimension::Height => size.y as f64,
        }
    }

    fn apply_corrected_size(&mut self, dimension: Dimension, value: f64) {
        let current = self.inner_size();
        let size = match dimension {
            Dimension::Width => egui::vec2(value as f32, current.y),
            Dimension::Height => egui::vec2(current.x, value as f32),
        };
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::InnerSize(size));
    }
}

/// Messages from background threads
pub enum AppMessage {
    BackgroundDirChosen(PathBuf),
}

/// A background switch waiting for the current resize cycle to finish
#[derive(Debug, PartialEq)]
enum PendingBackground {
    Index(usize),
    Dir(PathBuf),
}

impl PendingBackground {
    /// Queue `next` behind `queued`. A folder switch picks its own image, so
    /// a later image switch never replaces it.
    fn queue(queued: Option<Self>, next: Self) -> Self {
        match (queued, next) {
            (Some(dir @ PendingBackground::Dir(_)), PendingBackground::Index(_)) => dir,
            (_, next) => next,
        }
    }
}

enum ViewAction {
    NextBackground,
    ChooseBackgroundDir,
}

pub struct AspectShellApp {
    window: AspectLockedWindow<EguiWindow>,
    fonts: LabelFonts,
    background: BackgroundImages,
    background_dir: PathBuf,
    texture: Option<egui::TextureHandle>,
    pending_background: Option<PendingBackground>,
    last_size: Vec2,
    geometry: Option<WindowGeometry>,
    /// Stored geometry was applied at start-up; otherwise the first frame
    /// centers the window on the monitor.
    restored: bool,
    placed_on_monitor: bool,
    message_sender: Sender<AppMessage>,
    message_receiver: Receiver<AppMessage>,
}

impl AspectShellApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &Config, settings: Arc<SettingsStore>) -> Self {
        configure_style(&cc.egui_ctx);

        let waker_ctx = cc.egui_ctx.clone();
        let timers = TimerThread::with_waker(move || waker_ctx.request_repaint());
        let mut window = AspectLockedWindow::new(
            &config.settings.view_name,
            EguiWindow {
                ctx: cc.egui_ctx.clone(),
            },
            AspectRatio::default(),
            settings,
            timers,
            config.resize_delays(),
        );
        window.load_labels();

        let fonts = setup_fonts(&window.labels().fonts());
        cc.egui_ctx.set_fonts(fonts.definitions.clone());

        let restored = window.restore_geometry().is_some();
        let stored_dir = window.settings().get_string(KEY_BG_IMAGE_PATH, "");
        let background_dir = if stored_dir.is_empty() {
            config.default_background_dir()
        } else {
            PathBuf::from(stored_dir)
        };

        let (message_sender, message_receiver) = mpsc::channel();
        let mut app = Self {
            window,
            fonts,
            background: BackgroundImages::default(),
            background_dir: background_dir.clone(),
            texture: None,
            pending_background: None,
            last_size: Vec2::ZERO,
            geometry: None,
            restored,
            placed_on_monitor: false,
            message_sender,
            message_receiver,
        };
        app.open_background_dir(&cc.egui_ctx, &background_dir);
        app
    }

    /// Switch to the images of `dir`. Deferred as a whole while a correction
    /// is in flight, so the list and the texture on screen stay in step.
    fn open_background_dir(&mut self, ctx: &egui::Context, dir: &Path) {
        if !self.window.resize().is_idle() {
            self.pending_background = Some(PendingBackground::queue(
                self.pending_background.take(),
                PendingBackground::Dir(dir.to_path_buf()),
            ));
            return;
        }
        self.background_dir = dir.to_path_buf();
        self.background = match BackgroundImages::scan(dir) {
            Ok(images) => images,
            Err(e) => {
                warn!("Failed to read background folder {:?}: {}", dir, e);
                BackgroundImages::default()
            }
        };
        let index = self.window.settings().get_int(KEY_BG_IMAGE_IDX, 0).max(0) as usize;
        self.show_background(ctx, index);
    }

    /// Show image `index` and bind the window to its ratio. Deferred while a
    /// correction is in flight, since the ratio may not change mid-resize.
    fn show_background(&mut self, ctx: &egui::Context, index: usize) {
        if !self.window.resize().is_idle() {
            self.pending_background = Some(PendingBackground::queue(
                self.pending_background.take(),
                PendingBackground::Index(index),
            ));
            return;
        }

        let index = self.background.select(index);
        self.window.settings().set_int(KEY_BG_IMAGE_IDX, index as i32);

        let ratio = match self.background.load_current() {
            Ok(image) => {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [image.width as usize, image.height as usize],
                    &image.rgba,
                );
                self.texture =
                    Some(ctx.load_texture("background", color_image, egui::TextureOptions::LINEAR));
                info!("Background {:?} ({}x{})", image.path, image.width, image.height);
                image.aspect_ratio()
            }
            Err(e) => {
                warn!("No background image: {}", e);
                self.texture = None;
                AspectRatio::default()
            }
        };
        self.window.set_aspect_ratio(ratio);
    }

    fn choose_background_dir(&self, ctx: &egui::Context) {
        let sender = self.message_sender.clone();
        let start_dir = self.background_dir.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            if let Some(dir) = rfd::FileDialog::new().set_directory(&start_dir).pick_folder() {
                if let Err(e) = sender.send(AppMessage::BackgroundDirChosen(dir)) {
                    warn!("Failed to send chosen folder: {}", e);
                }
                ctx.request_repaint();
            }
        });
    }

    /// Forward viewport size changes to the synchronizer and remember the
    /// geometry to save on exit.
    fn track_viewport(&mut self, ctx: &egui::Context) {
        let (inner, outer, monitor) = ctx.input(|i| {
            let viewport = i.viewport();
            (viewport.inner_rect, viewport.outer_rect, viewport.monitor_size)
        });
        let Some(inner) = inner else {
            return;
        };

        let size = inner.size();
        let old = self.last_size;
        self.last_size = size;
        if size.x != old.x {
            self.window.on_width_changed(old.x as f64, size.x as f64);
        }
        if size.y != old.y {
            self.window.on_height_changed(old.y as f64, size.y as f64);
        }

        let origin = outer.map(|r| r.min).unwrap_or(inner.min);
        let geometry = WindowGeometry::new(
            origin.x as f64,
            origin.y as f64,
            size.x as f64,
            size.y as f64,
        );
        self.geometry = Some(geometry);

        if !self.placed_on_monitor
            && let Some(monitor) = monitor
        {
            self.placed_on_monitor = true;
            let screen = WindowGeometry::new(0.0, 0.0, monitor.x as f64, monitor.y as f64);
            let placed = if self.restored {
                geometry
            } else {
                geometry.centered_on(&screen)
            };
            let clamped = placed.clamp_to(&screen);
            if clamped != geometry {
                info!("Place window at {:?}", clamped);
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(egui::pos2(
                    clamped.x as f32,
                    clamped.y as f32,
                )));
                ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
                    clamped.width as f32,
                    clamped.height as f32,
                )));
            }
        }
    }

    fn paint(&self, ui: &egui::Ui, rect: Rect) {
        let painter = ui.painter();
        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0));
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }

        let cell = egui::vec2(rect.width() / 3.0, rect.height() / 3.0);
        for (pos, slot) in self.window.labels().iter() {
            if slot.text.is_empty() {
                continue;
            }
            let min = rect.min + egui::vec2(pos.col() as f32 * cell.x, pos.row() as f32 * cell.y);
            let cell_rect = Rect::from_min_size(min, cell);
            let anchor = anchor_for(pos);
            painter.text(
                anchor.pos_in_rect(&cell_rect),
                anchor,
                &slot.text,
                self.fonts.font_id(&slot.font),
                color32(slot.color),
            );
        }
    }
}

fn anchor_for(pos: LabelPos) -> Align2 {
    match (pos.row(), pos.col()) {
        (0, 0) => Align2::LEFT_TOP,
        (0, 1) => Align2::CENTER_TOP,
        (0, _) => Align2::RIGHT_TOP,
        (1, 0) => Align2::LEFT_CENTER,
        (1, 1) => Align2::CENTER_CENTER,
        (1, _) => Align2::RIGHT_CENTER,
        (_, 0) => Align2::LEFT_BOTTOM,
        (_, 1) => Align2::CENTER_BOTTOM,
        _ => Align2::RIGHT_BOTTOM,
    }
}

fn color32(color: LabelColor) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

impl eframe::App for AspectShellApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Folder picked on the dialog thread
        if let Ok(AppMessage::BackgroundDirChosen(dir)) = self.message_receiver.try_recv() {
            let settings = self.window.settings();
            settings.set_string(KEY_BG_IMAGE_PATH, &dir.to_string_lossy());
            settings.set_int(KEY_BG_IMAGE_IDX, 0);
            self.open_background_dir(ctx, &dir);
        }

        self.track_viewport(ctx);
        self.window.pump();

        if self.window.resize().is_idle() {
            match self.pending_background.take() {
                Some(PendingBackground::Dir(dir)) => self.open_background_dir(ctx, &dir),
                Some(PendingBackground::Index(index)) => self.show_background(ctx, index),
                None => {}
            }
        }

        let mut action = None;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.paint(ui, rect);

                let response = ui.interact(rect, ui.id().with("background"), egui::Sense::click());
                if response.double_clicked() {
                    action = Some(ViewAction::NextBackground);
                }
                response.context_menu(|ui| {
                    if ui.button("Choose background folder…").clicked() {
                        action = Some(ViewAction::ChooseBackgroundDir);
                        ui.close();
                    }
                });
            });

        match action {
            Some(ViewAction::NextBackground) => {
                let next = self.background.advance();
                self.show_background(ctx, next);
            }
            Some(ViewAction::ChooseBackgroundDir) => self.choose_background_dir(ctx),
            None => {}
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(geometry) = self.geometry {
            self.window.save_geometry(&geometry);
        }
        self.window.close();
    }
}

use super::debouncer::{ResizeCoordinator, ResizeDelays, SizeChange, TimerOutcome};
use super::timer::{TimerId, TimerScheduler, TimerThread};
use crate::constant::LABEL_COUNT;
use crate::geometry::{AspectRatio, Dimension, WindowGeometry, view_key};
use crate::labels::{LabelGrid, LabelPos};
use crate::settings::SettingsStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The platform window a synchronizer drives.
pub trait WindowHandle {
    /// Current extent of `dimension`, in logical points.
    fn extent(&self, dimension: Dimension) -> f64;
    /// Resize `dimension` to `value`, leaving the other one untouched.
    fn apply_corrected_size(&mut self, dimension: Dimension, value: f64);
}

/// A window whose width and height stay bound to an aspect ratio.
///
/// All methods run on the UI thread. Timers only hand back ids, which
/// [`AspectLockedWindow::pump`] feeds to the state machine.
pub struct AspectLockedWindow<H: WindowHandle, T: TimerScheduler = TimerThread> {
    view_key: String,
    handle: Option<H>,
    timers: T,
    resize: ResizeCoordinator,
    labels: LabelGrid,
    settings: Arc<SettingsStore>,
}

impl<H: WindowHandle, T: TimerScheduler> AspectLockedWindow<H, T> {
    pub fn new(
        view_name: &str,
        handle: H,
        ratio: AspectRatio,
        settings: Arc<SettingsStore>,
        timers: T,
        delays: ResizeDelays,
    ) -> Self {
        let view_key = view_key(view_name);
        info!(
            "Open view {} with aspect ratio {:.4} (settings node '{}')",
            view_key,
            ratio.value(),
            settings.node_name()
        );
        Self {
            view_key,
            handle: Some(handle),
            timers,
            resize: ResizeCoordinator::new(ratio, delays),
            labels: LabelGrid::new(),
            settings,
        }
    }

    pub fn view_key(&self) -> &str {
        &self.view_key
    }

    pub fn resize(&self) -> &ResizeCoordinator {
        &self.resize
    }

    pub fn labels(&self) -> &LabelGrid {
        &self.labels
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    pub fn on_width_changed(&mut self, old: f64, new: f64) -> SizeChange {
        self.on_size_changed(Dimension::Width, old, new)
    }

    pub fn on_height_changed(&mut self, old: f64, new: f64) -> SizeChange {
        self.on_size_changed(Dimension::Height, old, new)
    }

    fn on_size_changed(&mut self, axis: Dimension, old: f64, new: f64) -> SizeChange {
        if self.is_closed() {
            return SizeChange::LayoutNoise;
        }
        let change = self.resize.on_size_changed(axis, old, new, &mut self.timers);
        if change.rescales_labels() {
            self.rescale_labels();
        }
        change
    }

    fn rescale_labels(&mut self) {
        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        if let Some(factor) = self.resize.scale_factor(handle.extent(Dimension::Width)) {
            self.labels.rescale(factor);
        }
    }

    /// Run every timer that fired since the last call. Returns how many ids
    /// were processed.
    pub fn pump(&mut self) -> usize {
        let fired = self.timers.fired();
        let count = fired.len();
        for id in fired {
            self.on_timer_fired(id);
        }
        count
    }

    /// Apply the effect of one expired timer. A no-op once the window closed.
    pub fn on_timer_fired(&mut self, id: TimerId) {
        let Some(handle) = self.handle.as_mut() else {
            debug!("Timer {:?} fired after {} closed", id, self.view_key);
            return;
        };
        match self.resize.on_timer_fired(id, &mut self.timers) {
            TimerOutcome::Apply(correction) => {
                debug!(
                    "Correct {} of {} to {:.1}",
                    correction.dimension, self.view_key, correction.value
                );
                handle.apply_corrected_size(correction.dimension, correction.value);
            }
            TimerOutcome::Unlocked | TimerOutcome::Stale => {}
        }
    }

    /// Switch to a new reference image ratio. Refused mid-resize.
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) -> bool {
        self.resize.set_ratio(ratio)
    }

    /// Set the label with settings index `n`, taking position, font and
    /// color from the settings store. `rescale` applies the current width
    /// scale to the fresh font right away.
    pub fn set_label(&mut self, n: usize, text: &str, rescale: bool) -> LabelPos {
        let pos = self.labels.set_message(&self.settings, n, text);
        if rescale {
            self.rescale_labels();
        }
        pos
    }

    /// Fill the labels from `BG_MSG{n}_TEXT` for every message present.
    pub fn load_labels(&mut self) {
        for n in 1..=LABEL_COUNT {
            let key = format!("BG_MSG{}_TEXT", n);
            if self.settings.contains(&key) {
                let text = self.settings.get_string(&key, "");
                self.set_label(n, &text, false);
            }
        }
        self.rescale_labels();
    }

    /// Stored geometry of this view, if a usable one was saved.
    pub fn restore_geometry(&self) -> Option<WindowGeometry> {
        stored_geometry(&self.settings, &self.view_key)
    }

    pub fn save_geometry(&self, geometry: &WindowGeometry) {
        if !geometry.has_size() {
            warn!("Not saving empty geometry for {}", self.view_key);
            return;
        }
        // A window closed mid-drag is stored at the size it was heading to
        let geometry = match self.resize.pending_correction() {
            Some(correction) => geometry.with_extent(correction.dimension, correction.value),
            None => *geometry,
        };
        self.settings.set_rectangle(&self.view_key, &geometry);
    }

    pub fn min_size(&self) -> (f64, f64) {
        stored_min_size(&self.settings, &self.view_key)
    }

    /// Cancel all timers, stop the timer service, release the window handle
    /// and flush the settings store. Safe to call more than once.
    pub fn close(&mut self) {
        if self.handle.take().is_none() {
            return;
        }
        self.resize.cancel_all(&mut self.timers);
        self.timers.shutdown();
        if let Err(e) = self.settings.flush() {
            warn!("Failed to save settings for {}: {}", self.view_key, e);
        }
        info!("Closed view {}", self.view_key);
    }

    #[cfg(test)]
    pub(crate) fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }
}

impl<H: WindowHandle, T: TimerScheduler> Drop for AspectLockedWindow<H, T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Geometry saved under `view_key`, if it has a usable size. Needed before
/// the native window exists, so it only takes the store.
pub fn stored_geometry(settings: &SettingsStore, view_key: &str) -> Option<WindowGeometry> {
    Some(settings.get_rectangle(view_key)).filter(WindowGeometry::has_size)
}

/// Minimum size from `<VIEW>_MIN_WIDTH` / `<VIEW>_MIN_HEIGHT`, 0 if unset.
pub fn stored_min_size(settings: &SettingsStore, view_key: &str) -> (f64, f64) {
    (
        settings.get_double(&format!("{}_MIN_WIDTH", view_key), 0.0),
        settings.get_double(&format!("{}_MIN_HEIGHT", view_key), 0.0),
    )
}

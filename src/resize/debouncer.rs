use super::timer::{TimerId, TimerScheduler};
use crate::geometry::{AspectRatio, Dimension};
use std::time::Duration;
use tracing::{debug, warn};

/// Where an axis is in its correction cycle. An axis is locked whenever it
/// is not `Idle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisPhase {
    Idle,
    /// A correction of the other axis to `corrected` is waiting for `timer`.
    Pending { timer: TimerId, corrected: f64 },
    /// The correction was applied; both locks clear when `timer` fires.
    Unlocking { timer: TimerId },
}

/// Debounce state for one axis.
#[derive(Debug)]
pub struct ResizeDebouncer {
    axis: Dimension,
    phase: AxisPhase,
}

impl ResizeDebouncer {
    pub fn new(axis: Dimension) -> Self {
        Self {
            axis,
            phase: AxisPhase::Idle,
        }
    }

    pub fn axis(&self) -> Dimension {
        self.axis
    }

    pub fn phase(&self) -> AxisPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.phase != AxisPhase::Idle
    }

    /// Number of armed delay timers; never more than one.
    pub fn pending_timers(&self) -> usize {
        match self.phase {
            AxisPhase::Pending { .. } => 1,
            _ => 0,
        }
    }

    /// The correction this axis is waiting to apply, if any.
    pub fn pending_correction(&self) -> Option<Correction> {
        match self.phase {
            AxisPhase::Pending { corrected, .. } => Some(Correction {
                dimension: self.axis.other(),
                value: corrected,
            }),
            _ => None,
        }
    }

    fn timer(&self) -> Option<TimerId> {
        match self.phase {
            AxisPhase::Idle => None,
            AxisPhase::Pending { timer, .. } | AxisPhase::Unlocking { timer } => Some(timer),
        }
    }

    /// Value of the other axis that matches `extent` on this one.
    fn correction_for(&self, extent: f64, ratio: AspectRatio) -> f64 {
        match self.axis {
            Dimension::Width => ratio.height_for(extent),
            Dimension::Height => ratio.width_for(extent),
        }
    }

    fn reset(&mut self, timers: &mut dyn TimerScheduler) {
        if let Some(timer) = self.timer() {
            timers.cancel(timer);
        }
        self.phase = AxisPhase::Idle;
    }
}

/// What a size-change notification led to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeChange {
    /// First nonzero width: recorded as the font-scaling baseline.
    BaselineCaptured(f64),
    /// Initial layout pass (`old <= 0`); nothing to correct.
    LayoutNoise,
    /// The other axis is correcting this one right now.
    Suppressed,
    /// A correction of the other axis to `corrected` is armed.
    Armed { corrected: f64 },
}

impl SizeChange {
    /// Label fonts follow every change that got past the layout guards.
    pub fn rescales_labels(&self) -> bool {
        matches!(self, SizeChange::Suppressed | SizeChange::Armed { .. })
    }
}

/// A corrected extent to apply to the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub dimension: Dimension,
    pub value: f64,
}

/// What a fired timer led to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerOutcome {
    /// Delay elapsed: apply this correction. The unlock timer is armed.
    Apply(Correction),
    /// Unlock elapsed: both axes are idle again.
    Unlocked,
    /// Cancelled or superseded timer; ignore.
    Stale,
}

/// Delays of one correction cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDelays {
    /// Quiet time after the last size change before correcting.
    pub settle: Duration,
    /// Time the locks stay held after the correction was applied.
    pub unlock: Duration,
}

impl Default for ResizeDelays {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(crate::constant::DEFAULT_SETTLE_DELAY_MS),
            unlock: Duration::from_millis(crate::constant::DEFAULT_UNLOCK_DELAY_MS),
        }
    }
}

/// Both axes of one window, the aspect ratio they are bound to and the width
/// baseline used for font scaling.
///
/// The coordinator is not thread-safe by itself; it is owned by the UI thread
/// and timers reach it only through [`TimerScheduler::fired`].
#[derive(Debug)]
pub struct ResizeCoordinator {
    ratio: AspectRatio,
    width: ResizeDebouncer,
    height: ResizeDebouncer,
    baseline: Option<f64>,
    delays: ResizeDelays,
    next_timer: u64,
}

impl ResizeCoordinator {
    pub fn new(ratio: AspectRatio, delays: ResizeDelays) -> Self {
        Self {
            ratio,
            width: ResizeDebouncer::new(Dimension::Width),
            height: ResizeDebouncer::new(Dimension::Height),
            baseline: None,
            delays,
            next_timer: 0,
        }
    }

    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn debouncer(&self, axis: Dimension) -> &ResizeDebouncer {
        match axis {
            Dimension::Width => &self.width,
            Dimension::Height => &self.height,
        }
    }

    fn debouncer_mut(&mut self, axis: Dimension) -> &mut ResizeDebouncer {
        match axis {
            Dimension::Width => &mut self.width,
            Dimension::Height => &mut self.height,
        }
    }

    pub fn is_locked(&self, axis: Dimension) -> bool {
        self.debouncer(axis).is_locked()
    }

    /// The correction still waiting for its settle timer. At most one axis
    /// can be pending at a time.
    pub fn pending_correction(&self) -> Option<Correction> {
        self.width
            .pending_correction()
            .or_else(|| self.height.pending_correction())
    }

    pub fn is_idle(&self) -> bool {
        !self.width.is_locked() && !self.height.is_locked()
    }

    /// Font scale for the current window width, once a baseline exists.
    pub fn scale_factor(&self, current_width: f64) -> Option<f64> {
        self.baseline
            .filter(|baseline| *baseline > 0.0)
            .map(|baseline| current_width / baseline)
    }

    /// Replace the ratio after the reference image changed. Refused while a
    /// correction is in flight so that a cycle never mixes two ratios.
    pub fn set_ratio(&mut self, ratio: AspectRatio) -> bool {
        if !self.is_idle() {
            warn!("Aspect ratio change to {} refused during a resize", ratio.value());
            return false;
        }
        self.ratio = ratio;
        true
    }

    fn next_timer_id(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }

    /// Feed one raw size-change notification of `axis`.
    pub fn on_size_changed(
        &mut self,
        axis: Dimension,
        old: f64,
        new: f64,
        timers: &mut dyn TimerScheduler,
    ) -> SizeChange {
        if axis == Dimension::Width && self.baseline.is_none() && new > 0.0 {
            self.baseline = Some(new);
            debug!("Width baseline captured at {}", new);
            return SizeChange::BaselineCaptured(new);
        }

        if old <= 0.0 {
            return SizeChange::LayoutNoise;
        }

        if self.is_locked(axis.other()) {
            debug!("{} change to {} suppressed by {} correction", axis, new, axis.other());
            return SizeChange::Suppressed;
        }

        let ratio = self.ratio;
        let delay = self.delays.settle;
        let timer = self.next_timer_id();
        let debouncer = self.debouncer_mut(axis);
        let corrected = debouncer.correction_for(new, ratio);

        // Supersede whatever this axis had armed, delay or unlock.
        debouncer.reset(timers);
        debouncer.phase = AxisPhase::Pending { timer, corrected };
        timers.schedule(timer, delay);

        debug!("{} changed to {}, {} correction to {} armed", axis, new, axis.other(), corrected);
        SizeChange::Armed { corrected }
    }

    /// Drive the state machine with an expired timer.
    pub fn on_timer_fired(&mut self, id: TimerId, timers: &mut dyn TimerScheduler) -> TimerOutcome {
        let owner = [Dimension::Width, Dimension::Height]
            .into_iter()
            .find(|axis| self.debouncer(*axis).timer() == Some(id));
        let Some(axis) = owner else {
            return TimerOutcome::Stale;
        };

        match self.debouncer(axis).phase {
            AxisPhase::Pending { corrected, .. } => {
                let unlock_timer = self.next_timer_id();
                let delay = self.delays.unlock;
                self.debouncer_mut(axis).phase = AxisPhase::Unlocking {
                    timer: unlock_timer,
                };
                timers.schedule(unlock_timer, delay);
                TimerOutcome::Apply(Correction {
                    dimension: axis.other(),
                    value: corrected,
                })
            }
            AxisPhase::Unlocking { .. } => {
                self.width.reset(timers);
                self.height.reset(timers);
                debug!("Resize locks released");
                TimerOutcome::Unlocked
            }
            AxisPhase::Idle => TimerOutcome::Stale,
        }
    }

    /// Cancel every outstanding timer on both axes.
    pub fn cancel_all(&mut self, timers: &mut dyn TimerScheduler) {
        self.width.reset(timers);
        self.height.reset(timers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resize::timer::ManualTimers;

    const SETTLE: Duration = Duration::from_millis(500);

    fn setup(ratio: f64) -> (ResizeCoordinator, ManualTimers) {
        let mut resize = ResizeCoordinator::new(AspectRatio::new(ratio), ResizeDelays::default());
        let mut timers = ManualTimers::default();
        // Initial layout: baseline 800 wide, height appears from zero.
        resize.on_size_changed(Dimension::Width, 0.0, 800.0, &mut timers);
        resize.on_size_changed(Dimension::Height, 0.0, 400.0, &mut timers);
        (resize, timers)
    }

    fn drain(resize: &mut ResizeCoordinator, timers: &mut ManualTimers) -> Vec<TimerOutcome> {
        let fired = timers.fired();
        fired
            .into_iter()
            .map(|id| resize.on_timer_fired(id, timers))
            .collect()
    }

    #[test]
    fn test_initial_layout_arms_nothing() {
        let (resize, timers) = setup(2.0);
        assert_eq!(resize.baseline(), Some(800.0));
        assert!(resize.is_idle());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_zero_width_does_not_capture_baseline() {
        let mut resize = ResizeCoordinator::new(AspectRatio::new(2.0), ResizeDelays::default());
        let mut timers = ManualTimers::default();
        assert_eq!(
            resize.on_size_changed(Dimension::Width, 0.0, 0.0, &mut timers),
            SizeChange::LayoutNoise
        );
        assert_eq!(resize.baseline(), None);
        assert_eq!(
            resize.on_size_changed(Dimension::Width, 0.0, 640.0, &mut timers),
            SizeChange::BaselineCaptured(640.0)
        );
    }

    #[test]
    fn test_width_change_corrects_height() {
        let (mut resize, mut timers) = setup(2.0);
        let change = resize.on_size_changed(Dimension::Width, 800.0, 1000.0, &mut timers);
        assert_eq!(change, SizeChange::Armed { corrected: 500.0 });
        assert!(resize.is_locked(Dimension::Width));

        timers.advance(SETTLE);
        let outcomes = drain(&mut resize, &mut timers);
        assert_eq!(
            outcomes,
            vec![TimerOutcome::Apply(Correction {
                dimension: Dimension::Height,
                value: 500.0,
            })]
        );
    }

    #[test]
    fn test_height_change_corrects_width() {
        let (mut resize, mut timers) = setup(2.0);
        let change = resize.on_size_changed(Dimension::Height, 400.0, 300.0, &mut timers);
        assert_eq!(change, SizeChange::Armed { corrected: 600.0 });
    }

    #[test]
    fn test_mutual_exclusion_while_other_axis_locked() {
        let (mut resize, mut timers) = setup(2.0);
        resize.on_size_changed(Dimension::Width, 800.0, 900.0, &mut timers);

        // The programmatic height change must not arm a reciprocal correction.
        for height in [420.0, 440.0, 450.0] {
            let change = resize.on_size_changed(Dimension::Height, 400.0, height, &mut timers);
            assert_eq!(change, SizeChange::Suppressed);
            assert_eq!(resize.debouncer(Dimension::Height).pending_timers(), 0);
        }

        // Still suppressed during the unlock window.
        timers.advance(SETTLE);
        drain(&mut resize, &mut timers);
        let change = resize.on_size_changed(Dimension::Height, 400.0, 450.0, &mut timers);
        assert_eq!(change, SizeChange::Suppressed);
        assert_eq!(resize.debouncer(Dimension::Height).pending_timers(), 0);
    }

    #[test]
    fn test_burst_collapses_to_last_value() {
        let (mut resize, mut timers) = setup(2.0);
        for step in 1..=10 {
            let width = 800.0 + step as f64 * 10.0;
            resize.on_size_changed(Dimension::Width, width - 10.0, width, &mut timers);
            timers.advance(Duration::from_millis(10));
        }
        assert_eq!(timers.pending(), 1);

        timers.advance(SETTLE);
        let outcomes = drain(&mut resize, &mut timers);
        assert_eq!(
            outcomes,
            vec![TimerOutcome::Apply(Correction {
                dimension: Dimension::Height,
                value: 450.0,
            })]
        );
    }

    #[test]
    fn test_unlock_completes_cycle() {
        let (mut resize, mut timers) = setup(2.0);
        resize.on_size_changed(Dimension::Width, 800.0, 1000.0, &mut timers);

        timers.advance(SETTLE);
        drain(&mut resize, &mut timers);
        assert!(matches!(
            resize.debouncer(Dimension::Width).phase(),
            AxisPhase::Unlocking { .. }
        ));

        timers.advance(Duration::from_millis(500));
        assert_eq!(drain(&mut resize, &mut timers), vec![TimerOutcome::Unlocked]);
        assert!(!resize.is_locked(Dimension::Width));
        assert!(!resize.is_locked(Dimension::Height));

        // Either axis may start a new cycle.
        let change = resize.on_size_changed(Dimension::Height, 500.0, 600.0, &mut timers);
        assert_eq!(change, SizeChange::Armed { corrected: 1200.0 });
    }

    #[test]
    fn test_exactly_one_unlock_per_completed_cycle() {
        let (mut resize, mut timers) = setup(2.0);
        resize.on_size_changed(Dimension::Width, 800.0, 900.0, &mut timers);
        timers.advance(SETTLE);
        drain(&mut resize, &mut timers);

        // The user drags again while the first cycle is unlocking: the old
        // unlock is superseded by the new cycle.
        timers.advance(Duration::from_millis(200));
        resize.on_size_changed(Dimension::Width, 900.0, 1000.0, &mut timers);
        assert_eq!(timers.pending(), 1);

        let mut outcomes = Vec::new();
        for _ in 0..6 {
            timers.advance(Duration::from_millis(250));
            outcomes.extend(drain(&mut resize, &mut timers));
        }
        let unlocks = outcomes
            .iter()
            .filter(|o| **o == TimerOutcome::Unlocked)
            .count();
        assert_eq!(unlocks, 1);
        assert!(resize.is_idle());
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let (mut resize, mut timers) = setup(2.0);
        resize.on_size_changed(Dimension::Width, 800.0, 900.0, &mut timers);
        let first = match resize.debouncer(Dimension::Width).phase() {
            AxisPhase::Pending { timer, .. } => timer,
            phase => panic!("unexpected phase {:?}", phase),
        };
        resize.on_size_changed(Dimension::Width, 900.0, 950.0, &mut timers);
        assert_eq!(resize.on_timer_fired(first, &mut timers), TimerOutcome::Stale);
        assert_eq!(resize.on_timer_fired(TimerId(999), &mut timers), TimerOutcome::Stale);
    }

    #[test]
    fn test_cancel_all() {
        let (mut resize, mut timers) = setup(2.0);
        resize.on_size_changed(Dimension::Width, 800.0, 900.0, &mut timers);
        resize.cancel_all(&mut timers);
        assert!(resize.is_idle());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_scale_factor_from_baseline() {
        let (resize, _timers) = setup(2.0);
        assert_eq!(resize.scale_factor(1600.0), Some(2.0));
        assert_eq!(resize.scale_factor(400.0), Some(0.5));

        let fresh = ResizeCoordinator::new(AspectRatio::default(), ResizeDelays::default());
        assert_eq!(fresh.scale_factor(1600.0), None);
    }

    #[test]
    fn test_baseline_is_captured_once() {
        let (mut resize, mut timers) = setup(2.0);
        resize.on_size_changed(Dimension::Width, 800.0, 1200.0, &mut timers);
        resize.cancel_all(&mut timers);
        resize.on_size_changed(Dimension::Width, 0.0, 300.0, &mut timers);
        assert_eq!(resize.baseline(), Some(800.0));
    }

    #[test]
    fn test_ratio_change_refused_mid_resize() {
        let (mut resize, mut timers) = setup(2.0);
        resize.on_size_changed(Dimension::Width, 800.0, 900.0, &mut timers);
        assert!(!resize.set_ratio(AspectRatio::new(1.5)));
        assert_eq!(resize.ratio().value(), 2.0);

        resize.cancel_all(&mut timers);
        assert!(resize.set_ratio(AspectRatio::new(1.5)));
        assert_eq!(resize.ratio().value(), 1.5);
    }
}

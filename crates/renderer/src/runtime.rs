use std::time::{Duration, Instant};

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed time in seconds after wrapping.
    pub seconds: f32,
    /// Frames ticked since the loop last (re)started.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Elapsed-time source with optional wrap-around.
///
/// The origin is taken from the first sample after a reset, so a restarted
/// loop always begins at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopClock {
    origin: Option<Instant>,
    period: Option<f32>,
}

impl LoopClock {
    pub fn new(period: Option<f32>) -> Self {
        Self {
            origin: None,
            period: sanitize_period(period),
        }
    }

    pub fn period(&self) -> Option<f32> {
        self.period
    }

    /// `None` runs unbounded, `Some(0.0)` freezes time at zero, a positive
    /// period wraps. Negative or non-finite periods are treated as `None`.
    pub fn set_period(&mut self, period: Option<f32>) {
        self.period = sanitize_period(period);
    }

    pub fn reset(&mut self) {
        self.origin = None;
    }

    pub fn origin(&self) -> Option<Instant> {
        self.origin
    }

    pub fn sample(&mut self, now: Instant) -> f32 {
        let origin = *self.origin.get_or_insert(now);
        let elapsed = now.saturating_duration_since(origin).as_secs_f64();
        let wrapped = match self.period {
            None => elapsed,
            Some(period) if period == 0.0 => 0.0,
            Some(period) => elapsed.rem_euclid(f64::from(period)),
        };
        let seconds = wrapped as f32;
        match self.period {
            // f32 rounding can land exactly on the period.
            Some(period) if seconds >= period => 0.0,
            _ => seconds,
        }
    }
}

fn sanitize_period(period: Option<f32>) -> Option<f32> {
    period.filter(|value| value.is_finite() && *value >= 0.0)
}

/// Lifecycle of the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Frame-driven loop controller.
///
/// The host calls [`RenderLoop::tick`] once per display refresh. A stopped
/// loop returns `None` so the host skips drawing; only
/// [`RenderLoop::restart`] brings it back.
#[derive(Debug, Clone)]
pub struct RenderLoop {
    state: LoopState,
    clock: LoopClock,
    frames: u64,
    last_time: f32,
}

impl RenderLoop {
    pub fn new(period: Option<f32>) -> Self {
        Self {
            state: LoopState::Idle,
            clock: LoopClock::new(period),
            frames: 0,
            last_time: 0.0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Idle to running. Has no effect once the loop has been stopped.
    pub fn start(&mut self) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        self.state = LoopState::Running;
        true
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            self.state = LoopState::Stopped;
        }
    }

    /// Resumes from any state with the time origin cleared.
    pub fn restart(&mut self) {
        self.clock.reset();
        self.frames = 0;
        self.state = LoopState::Running;
    }

    /// Stops the loop and forgets the time origin.
    pub fn teardown(&mut self) {
        self.clock.reset();
        if self.state == LoopState::Running {
            self.state = LoopState::Stopped;
        }
    }

    pub fn tick(&mut self, now: Instant) -> Option<TimeSample> {
        if !self.is_running() {
            return None;
        }
        let seconds = self.clock.sample(now);
        let sample = TimeSample::new(seconds, self.frames);
        self.frames = self.frames.saturating_add(1);
        self.last_time = seconds;
        Some(sample)
    }

    /// Time published by the most recent tick.
    pub fn time(&self) -> f32 {
        self.last_time
    }

    pub fn clock(&self) -> &LoopClock {
        &self.clock
    }

    pub fn period(&self) -> Option<f32> {
        self.clock.period()
    }

    pub fn set_period(&mut self, period: Option<f32>) {
        self.clock.set_period(period);
    }
}

/// Averages frame time over fixed-size batches.
#[derive(Debug, Clone)]
pub struct PerfSampler {
    cycle: u32,
    count: u32,
    batch_start: Option<Instant>,
}

impl PerfSampler {
    /// `cycle == 0` disables sampling.
    pub fn new(cycle: u32) -> Self {
        Self {
            cycle,
            count: 0,
            batch_start: None,
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.batch_start = None;
    }

    /// Records a frame; returns the mean seconds per frame when a batch of
    /// `cycle` frames completes.
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        if self.cycle == 0 {
            return None;
        }
        let Some(start) = self.batch_start else {
            self.batch_start = Some(now);
            return None;
        };
        self.count += 1;
        if self.count < self.cycle {
            return None;
        }
        let elapsed: Duration = now.saturating_duration_since(start);
        let average = elapsed.as_secs_f64() / f64::from(self.cycle);
        self.count = 0;
        self.batch_start = Some(now);
        tracing::debug!(frames = self.cycle, seconds_per_frame = average, "frame timing");
        Some(average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(origin: Instant, seconds: f32) -> Instant {
        origin + Duration::from_secs_f32(seconds)
    }

    #[test]
    fn wraps_with_positive_period() {
        let origin = Instant::now();
        let mut clock = LoopClock::new(Some(5.0));
        assert_eq!(clock.sample(origin), 0.0);
        for seconds in [0.5_f32, 4.9, 5.0, 7.25, 12.5, 100.0] {
            let value = clock.sample(at(origin, seconds));
            assert!((0.0..5.0).contains(&value), "{seconds} -> {value}");
        }
        let value = clock.sample(at(origin, 7.25));
        assert!((value - 2.25).abs() < 1e-3);
    }

    #[test]
    fn wrapped_time_keeps_precision_in_long_sessions() {
        let origin = Instant::now();
        let mut clock = LoopClock::new(Some(5.0));
        clock.sample(origin);
        let late = origin + Duration::from_millis(100_000_300);
        let value = clock.sample(late);
        assert!((value - 0.3).abs() < 1e-4, "{value}");
        let next = clock.sample(late + Duration::from_millis(16));
        assert!((next - value - 0.016).abs() < 1e-4, "{next}");
    }

    #[test]
    fn zero_period_freezes_time() {
        let origin = Instant::now();
        let mut clock = LoopClock::new(Some(0.0));
        clock.sample(origin);
        assert_eq!(clock.sample(at(origin, 3.0)), 0.0);
        assert_eq!(clock.sample(at(origin, 300.0)), 0.0);
    }

    #[test]
    fn no_period_is_monotonic() {
        let origin = Instant::now();
        let mut clock = LoopClock::new(None);
        let mut previous = clock.sample(origin);
        for seconds in [1.0, 2.5, 60.0, 3600.0] {
            let value = clock.sample(at(origin, seconds));
            assert!(value >= previous);
            previous = value;
        }
        assert!((previous - 3600.0).abs() < 1e-1);
    }

    #[test]
    fn negative_period_means_unbounded() {
        let clock = LoopClock::new(Some(-2.0));
        assert_eq!(clock.period(), None);
    }

    #[test]
    fn stop_suppresses_ticks_until_restart() {
        let origin = Instant::now();
        let mut render_loop = RenderLoop::new(None);
        assert!(render_loop.tick(origin).is_none());
        assert!(render_loop.start());
        assert!(render_loop.tick(origin).is_some());
        render_loop.stop();
        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert!(render_loop.tick(at(origin, 1.0)).is_none());
        assert!(!render_loop.start());

        render_loop.restart();
        let sample = render_loop.tick(at(origin, 10.0)).expect("running");
        assert_eq!(sample.seconds, 0.0);
        assert_eq!(sample.frame_index, 0);
        let sample = render_loop.tick(at(origin, 11.0)).expect("running");
        assert!((sample.seconds - 1.0).abs() < 1e-3);
        assert_eq!(render_loop.time(), sample.seconds);
    }

    #[test]
    fn teardown_clears_origin() {
        let origin = Instant::now();
        let mut render_loop = RenderLoop::new(None);
        render_loop.start();
        render_loop.tick(origin);
        assert!(render_loop.clock().origin().is_some());
        render_loop.teardown();
        assert!(render_loop.clock().origin().is_none());
        assert!(!render_loop.is_running());
    }

    #[test]
    fn perf_sampler_reports_each_batch() {
        let origin = Instant::now();
        let mut sampler = PerfSampler::new(4);
        let mut reports = Vec::new();
        for frame in 0..=8 {
            if let Some(average) = sampler.record(at(origin, frame as f32 * 0.5)) {
                reports.push(average);
            }
        }
        assert_eq!(reports.len(), 2);
        assert!((reports[0] - 0.5).abs() < 1e-6);
        assert!(PerfSampler::new(0).record(origin).is_none());
    }
}

//! The per-frame loop, written against two small seams so it can run without
//! a window: [`EventPump`] feeds the dispatcher, [`FrameTarget`] receives
//! uniforms and draws.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::dispatch::{Dispatcher, Viewport};
use crate::error::RenderError;
use crate::runtime::{TimeSample, TimeSource};

/// Source of pending window events.
pub trait EventPump {
    /// Feeds every pending event to `dispatcher` without blocking.
    fn drain(&mut self, dispatcher: &mut Dispatcher);
}

/// Graphics context as seen by the frame loop.
pub trait FrameTarget {
    /// Remaps the drawable region to `(0, 0, width, height)`.
    fn resize(&mut self, viewport: Viewport);
    /// Uploads the `iTime` uniform.
    fn set_time(&mut self, seconds: f32);
    /// Uploads the `iResolution` uniform.
    fn set_resolution(&mut self, resolution: [f32; 3]);
    /// Issues the fullscreen draw.
    fn draw(&mut self) -> Result<(), RenderError>;
    /// Swaps the finished frame onto the display.
    fn present(&mut self) -> Result<(), RenderError>;
}

/// Summary returned once the loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopReport {
    pub frames: u64,
}

/// Runs frames until the dispatcher reaches `Quitting` or the target fails.
pub fn run_frames<P, T, S>(
    pump: &mut P,
    target: &mut T,
    clock: &mut S,
    dispatcher: &mut Dispatcher,
) -> Result<LoopReport, RenderError>
where
    P: EventPump + ?Sized,
    T: FrameTarget + ?Sized,
    S: TimeSource + ?Sized,
{
    let mut report = LoopReport::default();
    let mut stats = FrameStats::new(Instant::now());

    loop {
        pump.drain(dispatcher);
        if !dispatcher.is_running() {
            break;
        }
        if let Some(viewport) = dispatcher.take_resize() {
            debug!(
                width = viewport.width(),
                height = viewport.height(),
                "viewport resized"
            );
            target.resize(viewport);
        }

        let sample = clock.sample();
        target.set_time(sample.seconds);
        target.set_resolution(dispatcher.viewport().resolution());
        target.draw()?;
        target.present()?;

        report.frames += 1;
        stats.record(Instant::now(), sample);
    }

    debug!(frames = report.frames, "frame loop finished");
    Ok(report)
}

struct FrameStats {
    window_start: Instant,
    frames: u32,
}

impl FrameStats {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    fn record(&mut self, now: Instant, sample: TimeSample) {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames as f32 / elapsed.as_secs_f32();
            debug!(
                fps = fps.round(),
                frame = sample.frame_index,
                time = sample.seconds,
                "render stats"
            );
            self.frames = 0;
            self.window_start = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::dispatch::AppEvent;
    use crate::runtime::{FixedTimeSource, SystemTimeSource};

    /// Plays back one batch of events per frame, then closes the window.
    struct ScriptedPump {
        batches: VecDeque<Vec<AppEvent>>,
    }

    impl ScriptedPump {
        fn new(batches: Vec<Vec<AppEvent>>) -> Self {
            Self {
                batches: batches.into(),
            }
        }
    }

    impl EventPump for ScriptedPump {
        fn drain(&mut self, dispatcher: &mut Dispatcher) {
            let batch = self
                .batches
                .pop_front()
                .unwrap_or_else(|| vec![AppEvent::CloseRequested]);
            for event in batch {
                dispatcher.handle(event);
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Resize(Viewport),
        Time(f32),
        Resolution([f32; 3]),
        Draw,
        Present,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        fail_present_at: Option<usize>,
    }

    impl Recorder {
        fn draws(&self) -> usize {
            self.calls.iter().filter(|call| **call == Call::Draw).count()
        }

        fn times(&self) -> Vec<f32> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Time(t) => Some(*t),
                    _ => None,
                })
                .collect()
        }

        fn resolutions(&self) -> Vec<[f32; 3]> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Resolution(r) => Some(*r),
                    _ => None,
                })
                .collect()
        }
    }

    impl FrameTarget for Recorder {
        fn resize(&mut self, viewport: Viewport) {
            self.calls.push(Call::Resize(viewport));
        }

        fn set_time(&mut self, seconds: f32) {
            self.calls.push(Call::Time(seconds));
        }

        fn set_resolution(&mut self, resolution: [f32; 3]) {
            self.calls.push(Call::Resolution(resolution));
        }

        fn draw(&mut self) -> Result<(), RenderError> {
            self.calls.push(Call::Draw);
            Ok(())
        }

        fn present(&mut self) -> Result<(), RenderError> {
            let presents = self
                .calls
                .iter()
                .filter(|call| **call == Call::Present)
                .count();
            if self.fail_present_at == Some(presents) {
                return Err(wgpu::SurfaceError::OutOfMemory.into());
            }
            self.calls.push(Call::Present);
            Ok(())
        }
    }

    fn start() -> Dispatcher {
        Dispatcher::new(Viewport::new(1600, 1080).unwrap())
    }

    #[test]
    fn close_before_first_frame_draws_nothing() {
        let mut pump = ScriptedPump::new(vec![vec![AppEvent::CloseRequested]]);
        let mut target = Recorder::default();
        let mut clock = SystemTimeSource::new();
        let mut dispatcher = start();

        let report = run_frames(&mut pump, &mut target, &mut clock, &mut dispatcher).unwrap();

        assert_eq!(report.frames, 0);
        assert!(target.calls.is_empty());
    }

    #[test]
    fn each_frame_uploads_then_draws_then_presents() {
        let mut pump = ScriptedPump::new(vec![vec![], vec![]]);
        let mut target = Recorder::default();
        let mut clock = FixedTimeSource::new(2.0);
        let mut dispatcher = start();

        let report = run_frames(&mut pump, &mut target, &mut clock, &mut dispatcher).unwrap();

        assert_eq!(report.frames, 2);
        let frame = vec![
            Call::Time(2.0),
            Call::Resolution([1600.0, 1080.0, 1.0]),
            Call::Draw,
            Call::Present,
        ];
        assert_eq!(target.calls, [frame.clone(), frame].concat());
    }

    #[test]
    fn resize_reaches_target_before_next_draw() {
        let mut pump = ScriptedPump::new(vec![
            vec![],
            vec![AppEvent::Resized {
                width: 800,
                height: 600,
            }],
            vec![AppEvent::Suspend],
        ]);
        let mut target = Recorder::default();
        let mut clock = FixedTimeSource::new(0.0);
        let mut dispatcher = start();

        run_frames(&mut pump, &mut target, &mut clock, &mut dispatcher).unwrap();

        assert_eq!(
            target.resolutions(),
            vec![
                [1600.0, 1080.0, 1.0],
                [800.0, 600.0, 1.0],
                [800.0, 600.0, 1.0]
            ]
        );
        let resize_at = target
            .calls
            .iter()
            .position(|call| *call == Call::Resize(Viewport::new(800, 600).unwrap()))
            .unwrap();
        let second_draw = target
            .calls
            .iter()
            .enumerate()
            .filter(|(_, call)| **call == Call::Draw)
            .nth(1)
            .map(|(index, _)| index)
            .unwrap();
        assert!(resize_at < second_draw);
    }

    #[test]
    fn elapsed_time_starts_at_zero_and_never_decreases() {
        struct SteppedClock(u64);
        impl TimeSource for SteppedClock {
            fn sample(&mut self) -> TimeSample {
                let sample = TimeSample::new(self.0 as f32 * 0.016, self.0);
                self.0 += 1;
                sample
            }
        }

        let mut pump = ScriptedPump::new(vec![vec![]; 10]);
        let mut target = Recorder::default();
        let mut dispatcher = start();
        run_frames(&mut pump, &mut target, &mut SteppedClock(0), &mut dispatcher).unwrap();

        let times = target.times();
        assert_eq!(times.len(), 10);
        assert_eq!(times[0], 0.0);
        assert!(times.windows(2).all(|pair| pair[1] >= pair[0]));

        let mut target = Recorder::default();
        let mut pump = ScriptedPump::new(vec![vec![]; 3]);
        let mut dispatcher = start();
        run_frames(
            &mut pump,
            &mut target,
            &mut SystemTimeSource::new(),
            &mut dispatcher,
        )
        .unwrap();
        let times = target.times();
        assert_eq!(times[0], 0.0);
        assert!(times.windows(2).all(|pair| pair[1] >= pair[0]));
    }

    #[test]
    fn present_failure_stops_the_loop() {
        let mut pump = ScriptedPump::new(vec![vec![]; 5]);
        let mut target = Recorder {
            fail_present_at: Some(1),
            ..Recorder::default()
        };
        let mut clock = FixedTimeSource::new(0.0);
        let mut dispatcher = start();

        let err = run_frames(&mut pump, &mut target, &mut clock, &mut dispatcher).unwrap_err();

        assert!(matches!(err, RenderError::Present(_)));
        assert_eq!(target.draws(), 2);
    }

    #[test]
    fn escape_mid_run_stops_before_drawing() {
        let mut pump = ScriptedPump::new(vec![vec![], vec![AppEvent::Other, AppEvent::CancelKey]]);
        let mut target = Recorder::default();
        let mut clock = FixedTimeSource::new(0.0);
        let mut dispatcher = start();

        let report = run_frames(&mut pump, &mut target, &mut clock, &mut dispatcher).unwrap();

        assert_eq!(report.frames, 1);
        assert_eq!(target.draws(), 1);
    }
}

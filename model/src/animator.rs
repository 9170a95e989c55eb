use std::time::Duration;

use crate::{
    CameraOptions, Coordinate, FrameQueue, FrameRequest, FrameScheduler, MapView, MarkerHandle,
    Polyline,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationPhase {
    Idle,
    /// Between point `segment` and `segment + 1`
    Running { segment: usize },
    /// The marker sits on the last point
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatorConfig {
    /// Camera tilt in degrees
    pub pitch: f64,
    /// When a frame overshoots a point, keep going along the next segment with the leftover
    /// distance, instead of stopping exactly on the point.
    pub carry_remainder: bool,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            pitch: 60.0,
            carry_remainder: false,
        }
    }
}

/// Moves one marker along a polyline at a constant speed, one frame at a time, with the camera
/// chasing it. Frames come from the host through `on_frame`; only the most recently requested
/// frame of the current run does anything.
pub struct NavigationAnimator<S: FrameScheduler> {
    scheduler: S,
    config: AnimatorConfig,
    run: Option<Run>,
}

struct Run {
    polyline: Polyline,
    speed_mps: f64,
    segment: usize,
    position: Coordinate,
    bearing: f64,
    last_frame: Option<Duration>,
    pending: Option<FrameRequest>,
    marker: MarkerHandle,
    complete: bool,
}

enum Step {
    Moved(Coordinate),
    Invalid,
}

impl<S: FrameScheduler> NavigationAnimator<S> {
    pub fn new(scheduler: S, config: AnimatorConfig) -> Self {
        Self {
            scheduler,
            config,
            run: None,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn phase(&self) -> AnimationPhase {
        match self.run {
            None => AnimationPhase::Idle,
            Some(ref run) if run.complete => AnimationPhase::Complete,
            Some(ref run) => AnimationPhase::Running {
                segment: run.segment,
            },
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase(), AnimationPhase::Running { .. })
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.run.as_ref().map(|run| run.position)
    }

    pub fn marker(&self) -> Option<MarkerHandle> {
        self.run.as_ref().map(|run| run.marker)
    }

    /// Abandons any run in progress, then puts a marker on the first point and asks for a frame.
    /// Does nothing else if there's no segment to travel.
    pub fn start<M: MapView>(&mut self, polyline: Polyline, speed_kmh: f64, map: &mut M) {
        self.stop(map);

        if polyline.len() < 2 {
            debug!(
                "Nothing to animate along a polyline with {} points",
                polyline.len()
            );
            return;
        }
        if !(speed_kmh.is_finite() && speed_kmh > 0.0) {
            warn!("Not animating at {speed_kmh} km/h");
            return;
        }
        let pts = polyline.points();
        let start = pts[0];
        if !start.is_finite() {
            warn!("Not animating from invalid start {:?}", start);
            return;
        }

        info!(
            "Animating along {} points ({:.0}m) at {speed_kmh} km/h",
            polyline.len(),
            polyline.length_meters()
        );
        let bearing = start.bearing_to(pts[1]);
        let marker = map.place_marker(start);
        let pending = Some(self.scheduler.request_frame());
        self.run = Some(Run {
            polyline,
            speed_mps: speed_kmh * 1000.0 / 3600.0,
            segment: 0,
            position: start,
            bearing,
            last_frame: None,
            pending,
            marker,
            complete: false,
        });
    }

    /// Cancels the outstanding frame and removes the marker
    pub fn stop<M: MapView>(&mut self, map: &mut M) {
        if let Some(run) = self.run.take() {
            if let Some(request) = run.pending {
                self.scheduler.cancel_frame(request);
            }
            map.remove_marker(run.marker);
            debug!("Stopped animation at segment {}", run.segment);
        }
    }

    /// The host calls this when a requested frame comes due, with a monotonic timestamp.
    pub fn on_frame<M: MapView>(&mut self, request: FrameRequest, now: Duration, map: &mut M) {
        let carry = self.config.carry_remainder;
        let pitch = self.config.pitch;
        let run = match self.run {
            Some(ref mut run) => run,
            None => {
                return;
            }
        };
        if run.pending != Some(request) {
            trace!("Ignoring stale {:?}", request);
            return;
        }
        run.pending = None;

        let dt = match run.last_frame {
            Some(prev) => now.saturating_sub(prev),
            None => Duration::ZERO,
        };
        run.last_frame = Some(now);

        let step = run.speed_mps * dt.as_secs_f64();
        if step > 0.0 {
            let old = run.position;
            match run.advance(step, carry) {
                Step::Moved(pos) => {
                    if pos != old {
                        run.bearing = old.bearing_to(pos);
                    }
                    run.position = pos;
                    map.move_marker(run.marker, pos);
                    map.ease_camera(CameraOptions {
                        center: pos,
                        bearing: run.bearing,
                        pitch,
                        duration_ms: 0,
                    });
                }
                Step::Invalid => {}
            }
        }

        if run.complete {
            info!("Animation reached the end of the route");
        } else {
            run.pending = Some(self.scheduler.request_frame());
        }
    }
}

impl NavigationAnimator<FrameQueue> {
    /// Delivers every frame requested before this tick. Returns how many there were.
    pub fn tick<M: MapView>(&mut self, now: Duration, map: &mut M) -> usize {
        let requests = self.scheduler.drain();
        for request in &requests {
            self.on_frame(*request, now, map);
        }
        requests.len()
    }
}

impl Run {
    // Updates the segment (and completion) as a side effect, but leaves `position` to the caller
    fn advance(&mut self, mut step: f64, carry: bool) -> Step {
        let pts = self.polyline.points();
        let num_pts = pts.len();
        let mut pos = self.position;
        let mut segment = self.segment;
        loop {
            let target = pts[segment + 1];
            if !target.is_finite() {
                // Stay on the last good point and aim past the bad one next time
                warn!(
                    "Skipping invalid point {:?} at the end of segment {segment}",
                    target
                );
                self.set_segment(segment + 1, num_pts);
                return Step::Moved(pos);
            }

            let remaining = pos.distance_to(target);
            if remaining < step {
                pos = target;
                segment += 1;
                if segment + 1 == num_pts || !carry {
                    break;
                }
                step -= remaining;
            } else {
                pos = pos.destination(pos.bearing_to(target), step);
                break;
            }
        }

        if !pos.is_finite() {
            warn!(
                "Skipping a frame with invalid position {:?} on segment {segment}",
                pos
            );
            self.set_segment(segment + 1, num_pts);
            return Step::Invalid;
        }
        self.set_segment(segment, num_pts);
        Step::Moved(pos)
    }

    fn set_segment(&mut self, segment: usize, num_pts: usize) {
        if segment != self.segment {
            debug!("Finished segment {}", self.segment);
            self.segment = segment.min(num_pts - 1);
        }
        if self.segment + 1 >= num_pts {
            self.complete = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapState;
    use approx::assert_relative_eq;

    const FRAME: Duration = Duration::from_millis(16);

    fn north() -> Polyline {
        Polyline::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)])
    }

    fn east() -> Polyline {
        Polyline::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.01, 0.0)])
    }

    fn setup() -> (NavigationAnimator<FrameQueue>, MapState) {
        (
            NavigationAnimator::new(FrameQueue::new(), AnimatorConfig::default()),
            MapState::new(Coordinate::new(0.0, 0.0), 12.0),
        )
    }

    // Ticks until the animation ends or `limit` frames pass, returning the frame count
    fn run_to_end(
        animator: &mut NavigationAnimator<FrameQueue>,
        map: &mut MapState,
        frame: Duration,
        limit: usize,
    ) -> usize {
        let mut now = Duration::ZERO;
        let mut frames = 0;
        while animator.is_running() && frames < limit {
            animator.tick(now, map);
            now += frame;
            frames += 1;
        }
        frames
    }

    #[test]
    fn test_one_second_due_north() {
        let (mut animator, mut map) = setup();
        animator.start(north(), 36.0, &mut map);

        let mut now = Duration::ZERO;
        while now <= Duration::from_secs(1) {
            animator.tick(now, &mut map);
            now += Duration::from_millis(10);
        }

        let pos = animator.position().unwrap();
        assert_relative_eq!(Coordinate::new(0.0, 0.0).distance_to(pos), 10.0, epsilon = 1e-6);
        assert_eq!(map.marker(animator.marker().unwrap()), Some(pos));
        assert_relative_eq!(map.camera.bearing, 0.0, epsilon = 1e-6);
        assert_relative_eq!(map.camera.pitch, 60.0);
        assert_eq!(map.camera.center, pos);
        assert_eq!(animator.phase(), AnimationPhase::Running { segment: 0 });
    }

    #[test]
    fn test_camera_faces_direction_of_travel() {
        let (mut animator, mut map) = setup();
        animator.start(east(), 50.0, &mut map);
        animator.tick(Duration::ZERO, &mut map);
        animator.tick(FRAME, &mut map);
        assert_relative_eq!(map.camera.bearing, 90.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_polyline_is_a_noop() {
        for pts in [vec![], vec![Coordinate::new(1.0, 1.0)]] {
            let (mut animator, mut map) = setup();
            animator.start(Polyline::new(pts), 30.0, &mut map);
            assert_eq!(animator.phase(), AnimationPhase::Idle);
            assert!(animator.scheduler().is_empty());
            assert_eq!(map.num_markers(), 0);
        }
    }

    #[test]
    fn test_bad_speed_is_a_noop() {
        for speed in [0.0, -10.0, f64::NAN] {
            let (mut animator, mut map) = setup();
            animator.start(north(), speed, &mut map);
            assert_eq!(animator.phase(), AnimationPhase::Idle);
            assert_eq!(map.num_markers(), 0);
        }
    }

    #[test]
    fn test_finishes_exactly_on_last_point() {
        let (mut animator, mut map) = setup();
        let route = Polyline::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0001),
            Coordinate::new(0.0001, 0.0001),
        ]);
        animator.start(route.clone(), 30.0, &mut map);
        let frames = run_to_end(&mut animator, &mut map, FRAME, 10_000);
        assert!(frames < 10_000);

        assert_eq!(animator.phase(), AnimationPhase::Complete);
        assert_eq!(animator.position(), route.last());
        assert_eq!(map.marker(animator.marker().unwrap()), route.last());
        assert!(animator.scheduler().is_empty());
        // Nothing more happens
        assert_eq!(animator.tick(Duration::from_secs(3600), &mut map), 0);
    }

    #[test]
    fn test_restart_cancels_previous_run() {
        let (mut animator, mut map) = setup();
        animator.start(north(), 36.0, &mut map);
        animator.tick(Duration::ZERO, &mut map);
        animator.tick(FRAME, &mut map);
        let first_marker = animator.marker().unwrap();

        // The first run's next frame was already handed to the host when the second run begins
        let stale = animator.scheduler_mut().drain();
        assert_eq!(stale.len(), 1);
        animator.start(east(), 36.0, &mut map);
        for request in stale {
            animator.on_frame(request, FRAME * 2, &mut map);
        }

        assert_eq!(map.num_markers(), 1);
        assert_eq!(map.marker(first_marker), None);
        assert_eq!(animator.position(), Some(Coordinate::new(0.0, 0.0)));

        let mut now = FRAME * 3;
        for _ in 0..100 {
            animator.tick(now, &mut map);
            now += FRAME;
            // Only ever heading east now
            let pos = map.marker(animator.marker().unwrap()).unwrap();
            assert_relative_eq!(pos.lat, 0.0, epsilon = 1e-12);
            assert_eq!(animator.scheduler().len(), 1);
        }
    }

    #[test]
    fn test_stop_removes_marker() {
        let (mut animator, mut map) = setup();
        animator.start(north(), 36.0, &mut map);
        animator.tick(Duration::ZERO, &mut map);
        animator.stop(&mut map);
        assert_eq!(animator.phase(), AnimationPhase::Idle);
        assert_eq!(map.num_markers(), 0);
        assert!(animator.scheduler().is_empty());
    }

    #[test]
    fn test_snap_discards_leftover_distance() {
        // Points 5m apart, moving 7m per frame
        let route = densify_north(5.0, 3);
        let (mut animator, mut map) = setup();
        animator.start(route.clone(), 7.0 * 3.6, &mut map);
        animator.tick(Duration::ZERO, &mut map);
        animator.tick(Duration::from_secs(1), &mut map);
        assert_eq!(animator.position(), Some(route.points()[1]));
        assert_eq!(animator.phase(), AnimationPhase::Running { segment: 1 });
        animator.tick(Duration::from_secs(2), &mut map);
        assert_eq!(animator.position(), Some(route.points()[2]));
        assert_eq!(animator.phase(), AnimationPhase::Complete);
    }

    #[test]
    fn test_carry_keeps_exact_speed() {
        let route = densify_north(5.0, 5);
        let mut animator = NavigationAnimator::new(
            FrameQueue::new(),
            AnimatorConfig {
                carry_remainder: true,
                ..Default::default()
            },
        );
        let mut map = MapState::new(Coordinate::new(0.0, 0.0), 12.0);
        animator.start(route.clone(), 7.0 * 3.6, &mut map);
        animator.tick(Duration::ZERO, &mut map);
        animator.tick(Duration::from_secs(1), &mut map);
        assert_eq!(animator.phase(), AnimationPhase::Running { segment: 1 });
        assert_relative_eq!(
            route.points()[0].distance_to(animator.position().unwrap()),
            7.0,
            epsilon = 1e-6
        );
        animator.tick(Duration::from_secs(2), &mut map);
        assert_eq!(animator.phase(), AnimationPhase::Running { segment: 2 });
        assert_relative_eq!(
            route.points()[0].distance_to(animator.position().unwrap()),
            14.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_never_moves_backwards() {
        let route = crate::densify(
            &Polyline::new(vec![
                Coordinate::new(8.27, 49.98),
                Coordinate::new(8.2712, 49.9841),
                Coordinate::new(8.2655, 49.9903),
            ]),
            10.0,
        );
        let (mut animator, mut map) = setup();
        animator.start(route.clone(), 45.0, &mut map);

        let mut now = Duration::ZERO;
        let mut last_progress = 0.0;
        while animator.is_running() {
            animator.tick(now, &mut map);
            now += FRAME;

            // Distance travelled so far: whole segments, plus the way into the current one
            let pos = animator.position().unwrap();
            let segment = match animator.phase() {
                AnimationPhase::Running { segment } => segment,
                _ => route.len() - 1,
            };
            let done = Polyline::new(route.points()[..=segment].to_vec()).length_meters();
            let progress = done + route.points()[segment].distance_to(pos);
            assert!(progress + 1e-6 >= last_progress);
            last_progress = progress;
        }
        assert_relative_eq!(last_progress, route.length_meters(), epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_point_is_skipped() {
        let route = Polyline::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0001),
            Coordinate::new(f64::NAN, 0.0002),
            Coordinate::new(0.0, 0.0003),
        ]);
        let (mut animator, mut map) = setup();
        animator.start(route.clone(), 30.0, &mut map);
        let marker = animator.marker().unwrap();

        let mut now = Duration::ZERO;
        let mut frames = 0;
        while animator.is_running() && frames < 10_000 {
            animator.tick(now, &mut map);
            now += FRAME;
            frames += 1;
            assert!(map.marker(marker).unwrap().is_finite());
            assert!(map.camera.center.is_finite());
        }
        assert_eq!(animator.phase(), AnimationPhase::Complete);
        assert_eq!(animator.position(), route.last());
    }

    #[test]
    fn test_carry_stops_before_invalid_point() {
        let start = Coordinate::new(0.0, 0.0);
        let p1 = start.destination(0.0, 5.0);
        let p3 = start.destination(0.0, 15.0);
        let route = Polyline::new(vec![start, p1, Coordinate::new(f64::NAN, 0.0), p3]);
        let mut animator = NavigationAnimator::new(
            FrameQueue::new(),
            AnimatorConfig {
                carry_remainder: true,
                ..Default::default()
            },
        );
        let mut map = MapState::new(start, 12.0);
        animator.start(route, 7.0 * 3.6, &mut map);
        let marker = animator.marker().unwrap();

        animator.tick(Duration::ZERO, &mut map);
        animator.tick(Duration::from_secs(1), &mut map);
        // Reached p1, then the leftover 2m had nowhere valid to go
        assert_eq!(animator.position(), Some(p1));
        assert_eq!(map.marker(marker), Some(p1));
        assert_eq!(animator.phase(), AnimationPhase::Running { segment: 2 });

        animator.tick(Duration::from_secs(2), &mut map);
        assert_relative_eq!(
            start.distance_to(animator.position().unwrap()),
            12.0,
            epsilon = 1e-6
        );
        animator.tick(Duration::from_secs(3), &mut map);
        assert_eq!(animator.phase(), AnimationPhase::Complete);
        assert_eq!(animator.position(), Some(p3));
    }

    fn densify_north(spacing: f64, num_pts: usize) -> Polyline {
        let start = Coordinate::new(0.0, 0.0);
        (0..num_pts)
            .map(|i| start.destination(0.0, spacing * i as f64))
            .collect()
    }
}

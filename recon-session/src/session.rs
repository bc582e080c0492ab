use log::{debug, info};

use recon_core::{
    Candidate, Color, CoordinateMapper, Extent, LocalPoint, MarkPlacement, ParamValue,
    PointerSample, ResponseRecord, ResponseRecordBuilder, ResponseSurface,
};
use recon_timing::Clock;

use crate::config::{ConfigError, SessionConfig};

const SEARCH_MARK: Color = [0, 0, 0, 255];
const COMMIT_MARK: Color = [200, 30, 30, 255];
const RANGE_FILL: Color = [211, 211, 211, 255];
const RANGE_ARC: Color = [200, 30, 30, 255];
/// Commit dot radius when the variant shows no search indicator.
const COMMIT_DOT_RADIUS: f64 = 2.0;
const RANGE_ARC_WIDTH: f64 = 5.0;
/// The range arc sits just inside the indicator ring.
const RANGE_ARC_INSET: f64 = 4.0;

/// Phase of the two-stage confirm protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Searching,
    Committed,
    Ranging,
    RangeCommitted,
    Done,
}

/// Input events delivered by the host event loop, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    PointerMoved { x: f64, y: f64 },
    Confirm { x: f64, y: f64 },
}

/// Owns the search/confirm/range protocol for one response collection.
///
/// The host delivers events serially through [`handle_event`]; the session is
/// a reactive automaton keyed on its state and holds no work across events.
/// Dropping the session tears down everything it owns, so a new session must
/// only be created after the previous one was dropped or finished.
///
/// [`handle_event`]: InteractionSession::handle_event
pub struct InteractionSession<M, S, C>
where
    M: CoordinateMapper,
    S: ResponseSurface,
    C: Clock,
{
    config: SessionConfig,
    mapper: M,
    surface: S,
    clock: C,
    state: SessionState,
    candidate: Option<Candidate>,
    committed_value: Option<ParamValue>,
    commit_point: Option<LocalPoint>,
    committed_at: Option<C::Timestamp>,
    pending_extent: Option<Extent>,
    record: ResponseRecordBuilder,
    started_at: C::Timestamp,
}

impl<M, S, C> InteractionSession<M, S, C>
where
    M: CoordinateMapper,
    S: ResponseSurface,
    C: Clock,
{
    pub fn new(config: SessionConfig, mapper: M, surface: S, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let started_at = clock.now();
        let mut session = Self {
            config,
            mapper,
            surface,
            clock,
            state: SessionState::Idle,
            candidate: None,
            committed_value: None,
            commit_point: None,
            committed_at: None,
            pending_extent: None,
            record: ResponseRecordBuilder::new(),
            started_at,
        };
        if let Some(offset) = session.mapper.rotation_offset() {
            session.record.set_rotation_offset(offset);
        }
        session.begin_search();
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Feed one host event through the state machine.
    ///
    /// Returns the finalized record exactly once, at the `Done` transition.
    /// Events that are illegal for the current state (including anything
    /// after `Done`) are dropped.
    pub fn handle_event(&mut self, event: SessionEvent) -> Option<ResponseRecord> {
        match (self.state, event) {
            (SessionState::Searching, SessionEvent::PointerMoved { x, y }) => {
                self.preview_candidate(PointerSample::new(x, y));
                None
            }
            (SessionState::Searching, SessionEvent::Confirm { x, y }) => self.commit_search(x, y),
            (SessionState::Ranging, SessionEvent::PointerMoved { x, y }) => {
                self.preview_range(PointerSample::new(x, y));
                None
            }
            (SessionState::Ranging, SessionEvent::Confirm { .. }) => self.commit_range(),
            // Idle is left inside the constructor and Committed/RangeCommitted
            // advance before control returns to the host, so the remaining
            // combinations are stale input.
            _ => None,
        }
    }

    /// Initial display: the configured starting value, indicator parked at
    /// the hub when visible.
    fn begin_search(&mut self) {
        let value = ParamValue::from_raw(self.config.starting_value);
        self.surface.clear();
        self.surface.show_stimulus(&self.config.assets.asset_for(value));
        if self.config.indicator.show {
            let center = self.surface.frame().local_ring_center();
            self.draw_mark(center, f64::from(self.config.indicator.pointer_radius), SEARCH_MARK);
        }
        self.state = SessionState::Searching;
        info!("session searching, starting value {}", value.identifier());
    }

    fn preview_candidate(&mut self, sample: PointerSample) {
        let frame = self.surface.frame();
        let candidate = self.mapper.map(sample, &frame);
        debug!("candidate {}", candidate.value.identifier());
        self.surface.clear();
        self.surface.show_stimulus(&self.config.assets.asset_for(candidate.value));
        if self.config.indicator.show
            && let MarkPlacement::At(point) = candidate.mark
        {
            self.draw_mark(point, f64::from(self.config.indicator.pointer_radius), SEARCH_MARK);
        }
        self.candidate = Some(candidate);
    }

    fn commit_search(&mut self, x: f64, y: f64) -> Option<ResponseRecord> {
        let frame = self.surface.frame();
        // The last delivered move wins; the confirm position only anchors the
        // commit mark and any ranging that follows.
        let value = self
            .candidate
            .map(|c| c.value)
            .unwrap_or(ParamValue::from_raw(self.config.starting_value));
        let commit_point = frame.to_local(x, y);
        let search_rt_ms = self.clock.elapsed_ms(self.started_at);

        self.surface.clear();
        self.surface.show_stimulus(&self.config.assets.asset_for(value));
        match self.candidate.map(|c| c.mark) {
            Some(MarkPlacement::At(point)) => {
                self.draw_mark(point, f64::from(self.config.indicator.pointer_radius), COMMIT_MARK);
            }
            _ => self.draw_mark(commit_point, COMMIT_DOT_RADIUS, SEARCH_MARK),
        }

        self.record.commit(value.identifier(), search_rt_ms, commit_point);
        self.committed_value = Some(value);
        self.commit_point = Some(commit_point);
        self.committed_at = Some(self.clock.now());
        self.state = SessionState::Committed;
        info!("response committed: {} after {:.1} ms", value.identifier(), search_rt_ms);

        if self.config.uncertainty_range {
            self.state = SessionState::Ranging;
            None
        } else {
            self.finish()
        }
    }

    fn preview_range(&mut self, sample: PointerSample) {
        let Some(anchor) = self.commit_point else {
            return;
        };
        let frame = self.surface.frame();
        let extent = self.mapper.range_extent(sample, anchor, &frame);
        self.surface.clear();
        // The frozen response stays visible behind the range preview, even
        // when the commit landed without any prior move.
        if let Some(value) = self.committed_value {
            self.surface.show_stimulus(&self.config.assets.asset_for(value));
        }
        match extent {
            Extent::Radius(radius) => {
                self.surface.fill_circle(anchor.x, anchor.y, radius, RANGE_FILL);
            }
            Extent::HalfAngle(half) => {
                let center = frame.local_ring_center();
                let mid = (anchor.y - center.y).atan2(anchor.x - center.x);
                let radius = frame.width / 2.0 - RANGE_ARC_INSET;
                self.surface
                    .stroke_arc(center.x, center.y, radius, mid, half, RANGE_ARC_WIDTH, RANGE_ARC);
            }
        }
        self.pending_extent = Some(extent);
    }

    fn commit_range(&mut self) -> Option<ResponseRecord> {
        // Ignore a confirm before any range preview exists; a rapid
        // double-click would otherwise freeze an extent that was never shown.
        let (Some(extent), Some(committed_at)) = (self.pending_extent, self.committed_at) else {
            return None;
        };
        let rt_ms = self.clock.elapsed_ms(committed_at);
        self.record.range(extent, rt_ms);
        self.state = SessionState::RangeCommitted;
        info!("uncertainty committed after {:.1} ms", rt_ms);
        self.finish()
    }

    /// Terminal transition: consume the builder and hand the record back to
    /// the host. Runs at most once per session.
    fn finish(&mut self) -> Option<ResponseRecord> {
        self.state = SessionState::Done;
        self.surface.clear();
        let record = std::mem::take(&mut self.record).finalize();
        info!("session done");
        record
    }

    fn draw_mark(&mut self, point: LocalPoint, radius: f64, color: Color) {
        self.surface.fill_circle(point.x, point.y, radius, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndicatorSpec, SessionConfig, SpaceSpec, SurfaceSpec};
    use recon_core::{AngularMapper, GridMapper, SurfaceFrame, SurfaceShape};
    use recon_timing::ManualClock;
    use std::f64::consts::PI;
    use std::path::{Path, PathBuf};

    /// In-memory surface double recording the draw calls it receives.
    struct TestSurface {
        frame: SurfaceFrame,
        shown: Vec<PathBuf>,
        circles: Vec<(f64, f64, f64, Color)>,
        arcs: Vec<(f64, f64)>,
        clears: usize,
    }

    impl TestSurface {
        fn new(shape: SurfaceShape, width: f64, height: f64, inset: f64) -> Self {
            Self {
                frame: SurfaceFrame { shape, left: 0.0, top: 0.0, width, height, inset },
                shown: Vec::new(),
                circles: Vec::new(),
                arcs: Vec::new(),
                clears: 0,
            }
        }
    }

    impl ResponseSurface for TestSurface {
        fn frame(&self) -> SurfaceFrame {
            self.frame
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
            self.circles.push((cx, cy, radius, color));
        }

        fn stroke_arc(
            &mut self,
            _cx: f64,
            _cy: f64,
            _radius: f64,
            mid: f64,
            half: f64,
            _stroke_width: f64,
            _color: Color,
        ) {
            self.arcs.push((mid, half));
        }

        fn show_stimulus(&mut self, asset: &Path) {
            self.shown.push(asset.to_path_buf());
        }
    }

    fn grid_config(uncertainty_range: bool) -> SessionConfig {
        SessionConfig { uncertainty_range, ..SessionConfig::default() }
    }

    fn grid_session(
        uncertainty_range: bool,
    ) -> (InteractionSession<GridMapper, TestSurface, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let surface = TestSurface::new(SurfaceShape::Rectangle, 300.0, 300.0, 0.0);
        let session = InteractionSession::new(
            grid_config(uncertainty_range),
            GridMapper::new(10, 10),
            surface,
            clock.clone(),
        )
        .unwrap();
        (session, clock)
    }

    fn wheel_session(
        rotation_offset: f64,
        uncertainty_range: bool,
    ) -> (InteractionSession<AngularMapper, TestSurface, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let surface = TestSurface::new(SurfaceShape::Circle, 400.0, 400.0, 2.0);
        let config = SessionConfig {
            surface: SurfaceSpec::circle(400, 2),
            space: SpaceSpec::Angular { step_size: 1, random_rotation: false },
            indicator: IndicatorSpec::default(),
            uncertainty_range,
            ..SessionConfig::default()
        };
        let session = InteractionSession::new(
            config,
            AngularMapper::new(1, rotation_offset, 4.0),
            surface,
            clock.clone(),
        )
        .unwrap();
        (session, clock)
    }

    #[test]
    fn construction_enters_searching_with_starting_stimulus() {
        let (session, _clock) = grid_session(false);
        assert_eq!(session.state(), SessionState::Searching);
        assert_eq!(session.surface().shown, vec![PathBuf::from("stimuli/999999.jpg")]);
    }

    #[test]
    fn invalid_config_never_starts_a_session() {
        let clock = ManualClock::new();
        let surface = TestSurface::new(SurfaceShape::Rectangle, 300.0, 300.0, 0.0);
        let mut config = grid_config(false);
        config.space = SpaceSpec::Grid { horizontal_step_size: 0, vertical_step_size: 10 };
        let result = InteractionSession::new(config, GridMapper::new(10, 10), surface, clock);
        assert!(matches!(result, Err(ConfigError::ZeroGridStep)));
    }

    #[test]
    fn search_previews_track_the_latest_sample() {
        let (mut session, _clock) = grid_session(false);
        session.handle_event(SessionEvent::PointerMoved { x: 15.0, y: 15.0 });
        session.handle_event(SessionEvent::PointerMoved { x: 299.0, y: 15.0 });
        // Cell (0,0) first, then cell (9,0).
        let shown = &session.surface().shown;
        assert_eq!(shown[shown.len() - 2], PathBuf::from("stimuli/000000.jpg"));
        assert_eq!(shown[shown.len() - 1], PathBuf::from("stimuli/000009.jpg"));
    }

    #[test]
    fn session_without_ranging_finalizes_on_first_confirm() {
        let (mut session, clock) = grid_session(false);
        session.handle_event(SessionEvent::PointerMoved { x: 299.0, y: 15.0 });
        clock.advance_ms(850);
        let record = session
            .handle_event(SessionEvent::Confirm { x: 299.0, y: 15.0 })
            .expect("first confirm must finalize");
        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(record.response, "000009");
        assert_eq!(record.search_rt_ms, 850.0);
        assert_eq!(record.commit_point, LocalPoint::new(299.0, 15.0));
        assert!(record.uncertainty_extent.is_none());
        assert!(record.uncertainty_rt_ms.is_none());
    }

    #[test]
    fn last_move_before_confirm_wins() {
        let (mut session, _clock) = grid_session(false);
        session.handle_event(SessionEvent::PointerMoved { x: 15.0, y: 15.0 });
        session.handle_event(SessionEvent::PointerMoved { x: 75.0, y: 95.0 });
        let record = session.handle_event(SessionEvent::Confirm { x: 80.0, y: 90.0 }).unwrap();
        assert_eq!(record.response, "000032");
    }

    #[test]
    fn confirm_without_any_move_freezes_the_starting_value() {
        let (mut session, _clock) = grid_session(false);
        let record = session.handle_event(SessionEvent::Confirm { x: 10.0, y: 10.0 }).unwrap();
        assert_eq!(record.response, "999999");
    }

    #[test]
    fn ranging_session_needs_a_second_confirm() {
        let (mut session, clock) = grid_session(true);
        session.handle_event(SessionEvent::PointerMoved { x: 50.0, y: 50.0 });
        clock.advance_ms(400);
        assert!(session.handle_event(SessionEvent::Confirm { x: 50.0, y: 50.0 }).is_none());
        assert_eq!(session.state(), SessionState::Ranging);

        session.handle_event(SessionEvent::PointerMoved { x: 53.0, y: 54.0 });
        clock.advance_ms(150);
        let record = session
            .handle_event(SessionEvent::Confirm { x: 53.0, y: 54.0 })
            .expect("second confirm must finalize");
        assert_eq!(session.state(), SessionState::Done);
        assert_eq!(record.uncertainty_extent, Some(Extent::Radius(5.0)));
        assert_eq!(record.uncertainty_rt_ms, Some(150.0));
        // Uncertainty timing strictly follows search timing.
        assert_eq!(record.search_rt_ms, 400.0);
    }

    #[test]
    fn range_preview_keeps_the_committed_stimulus() {
        let (mut session, _clock) = grid_session(true);
        // Commit with no prior move: the starting value is the response.
        assert!(session.handle_event(SessionEvent::Confirm { x: 50.0, y: 50.0 }).is_none());
        session.handle_event(SessionEvent::PointerMoved { x: 60.0, y: 60.0 });
        let shown = &session.surface().shown;
        assert_eq!(shown.last(), Some(&PathBuf::from("stimuli/999999.jpg")));
    }

    #[test]
    fn range_confirm_before_any_range_preview_is_dropped() {
        let (mut session, _clock) = grid_session(true);
        session.handle_event(SessionEvent::PointerMoved { x: 50.0, y: 50.0 });
        assert!(session.handle_event(SessionEvent::Confirm { x: 50.0, y: 50.0 }).is_none());
        // Double-click: the second confirm arrives with no intervening move.
        assert!(session.handle_event(SessionEvent::Confirm { x: 50.0, y: 50.0 }).is_none());
        assert_eq!(session.state(), SessionState::Ranging);
    }

    #[test]
    fn events_after_done_are_ignored() {
        let (mut session, _clock) = grid_session(false);
        session.handle_event(SessionEvent::PointerMoved { x: 50.0, y: 50.0 });
        assert!(session.handle_event(SessionEvent::Confirm { x: 50.0, y: 50.0 }).is_some());
        // Exactly-once finalize: nothing ever comes out again.
        assert!(session.handle_event(SessionEvent::PointerMoved { x: 10.0, y: 10.0 }).is_none());
        assert!(session.handle_event(SessionEvent::Confirm { x: 10.0, y: 10.0 }).is_none());
        assert_eq!(session.state(), SessionState::Done);
    }

    #[test]
    fn wheel_session_records_rotation_offset() {
        let (mut session, _clock) = wheel_session(PI / 4.0, false);
        session.handle_event(SessionEvent::PointerMoved { x: 198.0 + 100.0, y: 198.0 });
        let record = session.handle_event(SessionEvent::Confirm { x: 298.0, y: 198.0 }).unwrap();
        // Raw angle 0 minus π/4 wraps to 315°.
        assert_eq!(record.response, "000315");
        assert_eq!(record.rotation_offset, Some(PI / 4.0));
    }

    #[test]
    fn wheel_ranging_previews_an_arc() {
        let (mut session, _clock) = wheel_session(0.0, true);
        // Ring center is at (198, 198) for a 400px wheel with 2px stroke.
        session.handle_event(SessionEvent::PointerMoved { x: 298.0, y: 198.0 });
        session.handle_event(SessionEvent::Confirm { x: 298.0, y: 198.0 });
        session.handle_event(SessionEvent::PointerMoved { x: 198.0, y: 298.0 });
        let record = session.handle_event(SessionEvent::Confirm { x: 198.0, y: 298.0 }).unwrap();
        let Some(Extent::HalfAngle(half)) = record.uncertainty_extent else {
            panic!("wheel extent must be angular");
        };
        assert!((half - PI / 2.0).abs() < 1e-9);
        assert_eq!(session.surface().arcs.len(), 1);
    }

    #[test]
    fn every_preview_is_a_full_redraw() {
        let (mut session, _clock) = grid_session(false);
        let before = session.surface().clears;
        session.handle_event(SessionEvent::PointerMoved { x: 10.0, y: 10.0 });
        session.handle_event(SessionEvent::PointerMoved { x: 20.0, y: 20.0 });
        assert_eq!(session.surface().clears, before + 2);
    }
}

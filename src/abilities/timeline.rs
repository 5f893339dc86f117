//! Cast timeline
//!
//! Drives one cast through Channeling, OverChanneling, Casting, Concentrating
//! and CastRecovery. Each phase fires its "finished" event exactly once per run
//! and phases shorter than [`ZERO_PHASE`] are passed through in the same update,
//! so an ability with no channeling or cast time resolves in a single frame.
//!
//! Time left over when a timed phase ends is carried into the next phase, so a
//! long frame can finish several phases at once and the run never drifts from
//! its declared durations.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::casting::{AbilityCastType, CastingState};

/// Phases shorter than this are skipped without waiting for another update.
pub const ZERO_PHASE: f32 = 0.0001;

/// Phase durations of an ability, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineData {
    #[serde(default)]
    pub channeling_time: f32,
    #[serde(default)]
    pub overchanneling_time: f32,
    #[serde(default)]
    pub cast_time: f32,
    #[serde(default)]
    pub recovery_time: f32,
    /// Offset into the casting phase at which the effect is released.
    #[serde(default)]
    pub unleash_at: f32,
    #[serde(default)]
    pub cast_type: AbilityCastType,
}

impl TimelineData {
    pub fn new(
        channeling_time: f32,
        overchanneling_time: f32,
        cast_time: f32,
        recovery_time: f32,
        unleash_at: f32,
        cast_type: AbilityCastType,
    ) -> Self {
        Self {
            channeling_time,
            overchanneling_time,
            cast_time,
            recovery_time,
            unleash_at,
            cast_type,
        }
        .clamped()
    }

    /// A plain cast: no channeling, unleashed at the end of `cast_time`.
    pub fn cast(cast_time: f32) -> Self {
        Self::new(0.0, 0.0, cast_time, 0.0, cast_time, AbilityCastType::FireAndForget)
    }

    /// Negative durations become zero and `unleash_at` is kept inside the casting phase.
    pub fn clamped(mut self) -> Self {
        self.channeling_time = self.channeling_time.max(0.0);
        self.overchanneling_time = self.overchanneling_time.max(0.0);
        self.cast_time = self.cast_time.max(0.0);
        self.recovery_time = self.recovery_time.max(0.0);
        self.unleash_at = self.unleash_at.clamp(0.0, self.cast_time);
        self
    }

    pub fn is_concentration(&self) -> bool {
        self.cast_type == AbilityCastType::Concentration
    }

    fn phase_duration(&self, phase: CastingState) -> f32 {
        match phase {
            CastingState::Idle => 0.0,
            CastingState::Channeling => self.channeling_time,
            CastingState::OverChanneling => self.overchanneling_time,
            CastingState::Casting => self.cast_time,
            CastingState::Concentrating => 0.0,
            CastingState::CastRecovery => self.recovery_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelineState {
    #[default]
    Pending,
    Running,
    Paused,
    Finished,
}

/// Things that happen on a timeline, in the order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineEvent {
    ChannelingFinished,
    OverchannelingFinished,
    Unleashed,
    CastFinished,
    ConcentrationFinished,
    RecoveryFinished,
}

impl TimelineEvent {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    fn finishing(phase: CastingState) -> Option<TimelineEvent> {
        match phase {
            CastingState::Idle => None,
            CastingState::Channeling => Some(TimelineEvent::ChannelingFinished),
            CastingState::OverChanneling => Some(TimelineEvent::OverchannelingFinished),
            CastingState::Casting => Some(TimelineEvent::CastFinished),
            CastingState::Concentrating => Some(TimelineEvent::ConcentrationFinished),
            CastingState::CastRecovery => Some(TimelineEvent::RecoveryFinished),
        }
    }
}

pub type TimelineEvents = SmallVec<[TimelineEvent; 6]>;

#[derive(Debug, Clone)]
pub struct CastTimeline {
    data: TimelineData,
    state: TimelineState,
    phase: CastingState,
    total_elapsed: f32,
    phase_elapsed: f32,
    skip_overchanneling: bool,
    fired: u8,
}

impl CastTimeline {
    pub fn new(data: TimelineData) -> Self {
        Self {
            data: data.clamped(),
            state: TimelineState::Pending,
            phase: CastingState::Idle,
            total_elapsed: 0.0,
            phase_elapsed: 0.0,
            skip_overchanneling: false,
            fired: 0,
        }
    }

    pub fn data(&self) -> &TimelineData {
        &self.data
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    /// Current phase, `Idle` before start and after the run finished.
    pub fn phase(&self) -> CastingState {
        self.phase
    }

    pub fn total_elapsed(&self) -> f32 {
        self.total_elapsed
    }

    pub fn phase_elapsed(&self) -> f32 {
        self.phase_elapsed
    }

    pub fn has_fired(&self, event: TimelineEvent) -> bool {
        self.fired & event.bit() != 0
    }

    /// Begin (or resume) the run. Starting a finished timeline restarts it.
    pub fn start(&mut self) {
        if self.state == TimelineState::Finished {
            self.reset();
        }
        self.state = TimelineState::Running;
        if self.phase == CastingState::Idle {
            self.phase = CastingState::Channeling;
        }
    }

    pub fn pause(&mut self) {
        if self.state == TimelineState::Running {
            self.state = TimelineState::Paused;
        }
    }

    pub fn reset(&mut self) {
        self.state = TimelineState::Pending;
        self.phase = CastingState::Idle;
        self.total_elapsed = 0.0;
        self.phase_elapsed = 0.0;
        self.fired = 0;
    }

    /// Advance by `delta_time` seconds and report what happened.
    pub fn update(&mut self, delta_time: f32) -> TimelineEvents {
        let mut events = TimelineEvents::new();
        if self.state != TimelineState::Running {
            return events;
        }

        self.total_elapsed += delta_time;
        self.phase_elapsed += delta_time;

        // Each pass ends at least one phase, so this stops once the carried
        // time no longer covers the current phase.
        while self.state == TimelineState::Running
            && self.phase != CastingState::Idle
            && !self.holds_concentration()
        {
            if self.phase == CastingState::Casting && self.phase_elapsed >= self.data.unleash_at {
                self.fire(TimelineEvent::Unleashed, &mut events);
            }
            if self.phase_elapsed < self.data.phase_duration(self.phase) {
                break;
            }
            self.go_to_next_phase(&mut events);
        }
        events
    }

    /// End the concentration phase of a concentration ability.
    pub fn finish_concentration(&mut self) -> TimelineEvents {
        let mut events = TimelineEvents::new();
        if self.state == TimelineState::Running && self.phase == CastingState::Concentrating {
            self.go_to_next_phase(&mut events);
        }
        events
    }

    /// Skip overchanneling for this run. Takes effect immediately if overchanneling.
    pub fn skip_overchanneling(&mut self, skip: bool) -> TimelineEvents {
        self.skip_overchanneling = skip;
        let mut events = TimelineEvents::new();
        if skip
            && self.state == TimelineState::Running
            && self.phase == CastingState::OverChanneling
        {
            self.go_to_next_phase(&mut events);
        }
        events
    }

    /// Walk forward to the start of recovery, firing every event on the way.
    pub fn jump_to_recovery(&mut self) -> TimelineEvents {
        let mut events = TimelineEvents::new();
        while self.state == TimelineState::Running && self.phase != CastingState::CastRecovery {
            self.advance(&mut events);
        }
        events
    }

    fn holds_concentration(&self) -> bool {
        self.phase == CastingState::Concentrating && self.data.is_concentration()
    }

    fn go_to_next_phase(&mut self, events: &mut TimelineEvents) {
        self.advance(events);

        if self.phase == CastingState::OverChanneling && self.skip_overchanneling {
            self.advance(events);
        }
        if self.phase == CastingState::Concentrating && !self.data.is_concentration() {
            self.advance(events);
        }

        while self.state == TimelineState::Running
            && self.data.phase_duration(self.phase) < ZERO_PHASE
            && !self.holds_concentration()
        {
            self.advance(events);
        }
    }

    fn advance(&mut self, events: &mut TimelineEvents) {
        if self.state == TimelineState::Finished {
            return;
        }
        // Leaving the casting phase always releases the effect.
        if self.phase == CastingState::Casting {
            self.fire(TimelineEvent::Unleashed, events);
        }
        if let Some(event) = TimelineEvent::finishing(self.phase) {
            self.fire(event, events);
        }

        // Concentration has no length of its own; time spent holding it is not carried.
        if self.holds_concentration() {
            self.phase_elapsed = 0.0;
        } else {
            let duration = self.data.phase_duration(self.phase);
            self.phase_elapsed = (self.phase_elapsed - duration).max(0.0);
        }

        match self.phase.next_phase() {
            Some(next) if self.phase != CastingState::Idle => {
                self.phase = next;
            }
            Some(_) => {}
            None => {
                self.phase = CastingState::Idle;
                self.phase_elapsed = 0.0;
                self.state = TimelineState::Finished;
            }
        }
    }

    fn fire(&mut self, event: TimelineEvent, events: &mut TimelineEvents) {
        if !self.has_fired(event) {
            self.fired |= event.bit();
            events.push(event);
        }
    }
}

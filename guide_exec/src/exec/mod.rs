//! # Guidance executive
//!
//! The executive is the single threaded cyclic driver around [`DiffGuidance`]. It owns the
//! guidance instance and the three collaborators guidance needs from the outside world:
//!
//! - a [`StateProvider`], giving whatever upstream samples arrived since the last cycle,
//! - a [`ParamsProvider`], giving the parameter snapshot for the cycle,
//! - a [`StatusPublisher`], taking the status record produced by the cycle.
//!
//! One call to [`GuidanceExec::cycle`] takes the parameter snapshot, takes in the samples,
//! updates the waypoints, computes the command and publishes the status. Nothing inside a cycle
//! blocks.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod providers;
mod publish;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    nav::{LocalPosition, NavState},
    tm::{DiffSetpoint, GuidanceStatus}
};
use log::trace;

use crate::{
    guidance::{DiffGuidance, GuidanceParams, UpstreamSamples},
    pursuit::{PathTracker, PurePursuit}
};

pub use providers::{FileParams, SampleBuffer, StaticParams};
pub use publish::{JsonLinesPublisher, LogPublisher, StatusLog};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of upstream samples.
pub trait StateProvider {
    /// The samples which arrived since the last call. Fields with nothing new are `None`.
    fn latest(&mut self) -> UpstreamSamples;
}

/// Source of guidance parameters.
pub trait ParamsProvider {
    /// The parameter snapshot to use for the next cycle.
    fn snapshot(&mut self) -> GuidanceParams;
}

/// Sink for the per-cycle status record.
pub trait StatusPublisher {
    fn publish(&mut self, status: &GuidanceStatus);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Cyclic executive driving guidance.
pub struct GuidanceExec<S, P, O, T = PurePursuit>
where
    S: StateProvider,
    P: ParamsProvider,
    O: StatusPublisher,
    T: PathTracker
{
    guidance: DiffGuidance<T>,

    state_provider: S,
    params_provider: P,
    publisher: O,

    /// Latest navigation state, kept as samples only arrive on change
    nav_state: NavState,

    /// Latest local position, source of the heading and speed
    local_pos: Option<LocalPosition>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S, P, O, T> GuidanceExec<S, P, O, T>
where
    S: StateProvider,
    P: ParamsProvider,
    O: StatusPublisher,
    T: PathTracker
{
    pub fn new(
        tracker: T,
        state_provider: S,
        mut params_provider: P,
        publisher: O
    ) -> Self {
        let params = params_provider.snapshot();

        Self {
            guidance: DiffGuidance::new(tracker, &params),
            state_provider,
            params_provider,
            publisher,
            nav_state: NavState::default(),
            local_pos: None,
        }
    }

    /// Run one guidance cycle of `dt_s` seconds, returning the command.
    pub fn cycle(&mut self, dt_s: f32) -> DiffSetpoint {
        let params = self.params_provider.snapshot();
        let samples = self.state_provider.latest();

        if let Some(nav_state) = samples.nav_state {
            self.nav_state = nav_state;
        }
        if let Some(lpos) = samples.local_pos {
            self.local_pos = Some(lpos);
        }

        self.guidance.update_waypoints(&samples, &params);

        // Without a local position there's no heading or speed, which guidance rejects
        let (yaw_rad, speed_ms) = match self.local_pos {
            Some(ref lpos) => (lpos.heading_rad, lpos.forward_speed_ms()),
            None => (std::f32::NAN, std::f32::NAN)
        };

        let (setpoint, status) = self.guidance.compute_guidance(
            yaw_rad,
            speed_ms,
            self.nav_state,
            dt_s,
            &params
        );

        trace!("Cycle command: {:?}", setpoint);

        self.publisher.publish(&status);

        setpoint
    }

    pub fn guidance(&self) -> &DiffGuidance<T> {
        &self.guidance
    }

    pub fn state_provider(&self) -> &S {
        &self.state_provider
    }

    pub fn state_provider_mut(&mut self) -> &mut S {
        &mut self.state_provider
    }

    pub fn params_provider_mut(&mut self) -> &mut P {
        &mut self.params_provider
    }

    pub fn publisher(&self) -> &O {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut O {
        &mut self.publisher
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

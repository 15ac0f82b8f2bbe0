//! Car-following models and the synthetic single-leader situations built on them.

pub use self::idm::Idm;
use crate::error::ParameterError;
use crate::params::Parameters;
use crate::speed_limit::SpeedLimitInfo;
use crate::{MAX_DECELERATION, STANDSTILL_SPEED};

mod idm;

/// A real or virtual vehicle ahead, as seen by a car-following model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Headway {
    /// The net distance to the leader in m.
    pub distance: f64,
    /// The speed of the leader in m/s.
    pub speed: f64,
}

impl Headway {
    pub const fn new(distance: f64, speed: f64) -> Self {
        Self { distance, speed }
    }
}

/// A model mapping own speed, parameters and leaders to a longitudinal acceleration.
pub trait CarFollowingModel {
    /// The desired net distance to a leader when driving at `speed`, in m.
    fn desired_headway(&self, params: &Parameters, speed: f64) -> Result<f64, ParameterError>;

    /// The desired speed under the given speed limits, in m/s.
    fn desired_speed(&self, params: &Parameters, limits: &SpeedLimitInfo) -> Result<f64, ParameterError>;

    /// The acceleration when following `leaders`, sorted by ascending distance.
    /// With no leaders, this is the free acceleration.
    fn following_acceleration(
        &self,
        params: &Parameters,
        speed: f64,
        limits: &SpeedLimitInfo,
        leaders: &[Headway],
    ) -> Result<f64, ParameterError>;
}

/// A driver's car-following model together with its current state.
///
/// Synthesizes situations with a single real or virtual leader, so that
/// hazard responders need no model specific code.
#[derive(Clone, Copy)]
pub struct Driver<'a> {
    /// The car-following model.
    pub model: &'a dyn CarFollowingModel,
    /// The driver's parameters.
    pub params: &'a Parameters,
    /// The current speed in m/s.
    pub speed: f64,
    /// The speed limits that currently apply.
    pub limits: &'a SpeedLimitInfo,
}

impl<'a> Driver<'a> {
    pub fn new(
        model: &'a dyn CarFollowingModel,
        params: &'a Parameters,
        speed: f64,
        limits: &'a SpeedLimitInfo,
    ) -> Self {
        Self {
            model,
            params,
            speed,
            limits,
        }
    }

    /// The same driver under other speed limits.
    pub fn with_limits<'b>(&self, limits: &'b SpeedLimitInfo) -> Driver<'b>
    where
        'a: 'b,
    {
        Driver {
            model: self.model,
            params: self.params,
            speed: self.speed,
            limits,
        }
    }

    /// The desired net distance to a leader when driving at `speed`, in m.
    pub fn desired_headway(&self, speed: f64) -> Result<f64, ParameterError> {
        self.model.desired_headway(self.params, speed)
    }

    /// The desired speed under the current speed limits, in m/s.
    pub fn desired_speed(&self) -> Result<f64, ParameterError> {
        self.model.desired_speed(self.params, self.limits)
    }

    /// The acceleration when following the given leaders.
    pub fn following_acceleration(&self, leaders: &[Headway]) -> Result<f64, ParameterError> {
        self.model
            .following_acceleration(self.params, self.speed, self.limits, leaders)
    }

    /// The acceleration with no leader.
    pub fn free_acceleration(&self) -> Result<f64, ParameterError> {
        self.free_acceleration_at(self.speed)
    }

    /// The acceleration with no leader, if driving at `speed`.
    pub(crate) fn free_acceleration_at(&self, speed: f64) -> Result<f64, ParameterError> {
        self.model
            .following_acceleration(self.params, speed, self.limits, &[])
    }

    /// The acceleration needed to stop at `distance`, as if for a stationary leader.
    pub fn stop(&self, distance: f64) -> Result<f64, ParameterError> {
        self.follow_leader(distance, 0.0)
    }

    /// The acceleration to follow a single leader at `distance` driving at `leader_speed`.
    pub fn follow_leader(&self, distance: f64, leader_speed: f64) -> Result<f64, ParameterError> {
        self.following_acceleration(&[Headway::new(distance, leader_speed)])
    }

    /// The acceleration to arrive at `distance` with `target_speed`.
    ///
    /// A virtual leader driving at `target_speed` would leave too little
    /// deceleration early on and require abrupt braking later. Instead the
    /// virtual leader drives at `target_speed^2 / speed`, placed a desired
    /// headway beyond `distance`. This gives no incentive when the speed equals
    /// the target, full stopping behaviour as the target goes to zero, and a
    /// growing correction as the target drops below the speed. Below the
    /// target the virtual leader is faster, resulting in acceleration.
    pub fn approach_target_speed(&self, distance: f64, target_speed: f64) -> Result<f64, ParameterError> {
        if self.speed < STANDSTILL_SPEED {
            // virtual leader infinitely far away
            return self.free_acceleration();
        }
        let virtual_speed = target_speed.powi(2) / self.speed;
        let headway = self.desired_headway(virtual_speed)?;
        self.follow_leader(distance + headway, virtual_speed)
    }

    /// The constant deceleration that stops the vehicle a stopping distance before `distance`.
    pub fn constant_deceleration_to_stop(&self, distance: f64) -> Result<f64, ParameterError> {
        if self.speed < STANDSTILL_SPEED {
            return Ok(0.0);
        }
        let room = distance - self.desired_headway(0.0)?;
        if room <= 0.0 {
            Ok(MAX_DECELERATION)
        } else {
            Ok(-0.5 * self.speed.powi(2) / room)
        }
    }
}

use crate::acceleration::Acceleration;
use crate::conflict::{Conflict, ConflictApproach, YieldPlans};
use crate::error::{Error, ParameterError};
use crate::following::{CarFollowingModel, Driver, Headway, Idm};
use crate::headway::Leader;
use crate::light::{respond_to_lights, TrafficLightHeadway};
use crate::params::{Parameters, A, B};
use crate::speed_limit::{respond_to_speed_limits, SpeedLimitProspect};
use crate::{VehicleId, MAX_DECELERATION};
use rand::Rng;
use smallvec::SmallVec;

/// A simulated vehicle, deciding on its acceleration from what it perceives.
#[derive(Clone, Debug)]
pub struct Vehicle<M = Idm> {
    /// The vehicle's ID.
    id: VehicleId,
    /// The vehicle's length in m.
    length: f64,
    /// The driver's behavioural parameters.
    params: Parameters,
    /// The car-following model.
    model: M,
    /// The plans to yield at priority conflicts, kept between steps.
    yield_plans: YieldPlans,
    /// The longitudinal position of the front of the vehicle in m.
    pos: f64,
    /// The velocity in m/s.
    vel: f64,
    /// The acceleration of the last plan in m/s^2.
    acc: f64,
}

/// The attributes of a simulated vehicle.
#[derive(Clone, Copy, Debug)]
pub struct VehicleAttributes {
    /// The vehicle length in m.
    pub length: f64,
    /// The maximum acceleration of the vehicle, in m/s^2.
    pub max_acc: f64,
    /// The comfortable deceleration of the vehicle, a negative number in m/s^2.
    pub comf_dec: f64,
}

/// Everything a vehicle perceives of its surroundings in one step.
/// Every list is sorted by ascending distance.
#[derive(Clone, Copy, Debug)]
pub struct Perception<'a> {
    /// The vehicles ahead in the own lane.
    pub leaders: &'a [Leader],
    /// The intersection conflicts ahead.
    pub conflicts: &'a [Conflict],
    /// The traffic lights ahead.
    pub lights: &'a [TrafficLightHeadway],
    /// The speed limits at and ahead of the vehicle.
    pub speed_limits: &'a SpeedLimitProspect,
}

impl Vehicle<Idm> {
    /// Creates a new vehicle driven by the intelligent driver model,
    /// with default parameters apart from its attributes.
    pub fn new(id: VehicleId, attributes: &VehicleAttributes) -> Result<Self, ParameterError> {
        let mut params = Parameters::with_defaults();
        params.set(&A, attributes.max_acc)?;
        params.set(&B, -attributes.comf_dec)?;
        Ok(Self::with_model(id, attributes.length, params, Idm))
    }
}

impl<M: CarFollowingModel> Vehicle<M> {
    /// Creates a new vehicle with the given car-following model and parameters.
    pub fn with_model(id: VehicleId, length: f64, params: Parameters, model: M) -> Self {
        Self {
            id,
            length,
            params,
            model,
            yield_plans: YieldPlans::new(),
            pos: 0.0,
            vel: 0.0,
            acc: 0.0,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The vehicle's length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The longitudinal position of the front of the vehicle in m.
    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// The vehicle's velocity in m/s.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The vehicle's acceleration in m/s^2, as of the last plan.
    pub fn acc(&self) -> f64 {
        self.acc
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    /// The plans to yield at priority conflicts.
    pub fn yield_plans(&self) -> &YieldPlans {
        &self.yield_plans
    }

    /// Places the vehicle at `pos` with velocity `vel`.
    pub fn set_state(&mut self, pos: f64, vel: f64) {
        self.pos = pos;
        self.vel = vel;
    }

    /// Randomly adjusts the driver's desired speed, see [Parameters::sample_speed_factor].
    pub fn randomise_speed_factor<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        stddev: f64,
    ) -> Result<f64, ParameterError> {
        self.params.sample_speed_factor(rng, stddev)
    }

    /// Decides on the acceleration for the next step, as the most restrictive
    /// response to the leaders, traffic lights, speed limits and conflicts ahead.
    pub fn plan(&mut self, perception: &Perception) -> Result<f64, Error> {
        let driver = Driver::new(
            &self.model,
            &self.params,
            self.vel,
            perception.speed_limits.current(),
        );

        let headways: SmallVec<[Headway; 4]> =
            perception.leaders.iter().map(Leader::headway).collect();
        let following = driver.following_acceleration(&headways)?;

        let acc = Acceleration::bounded(following)
            .min(respond_to_lights(&driver, perception.lights)?)
            .min(respond_to_speed_limits(&driver, perception.speed_limits)?)
            .min(ConflictApproach::new(driver, self.length).approach_conflicts(
                perception.conflicts,
                perception.leaders,
                &mut self.yield_plans,
            )?);

        self.acc = f64::max(acc.or_free(following), MAX_DECELERATION);
        Ok(self.acc)
    }

    /// Integrates the vehicle's position and velocity over `dt` seconds,
    /// using the acceleration of the last plan.
    ///
    /// Meant for driving a vehicle through scenarios; inside a simulator the
    /// scheduler owns the kinematic update and only [Vehicle::plan] is needed.
    pub fn integrate(&mut self, dt: f64) {
        let vel = f64::max(self.vel + dt * self.acc, 0.0);
        let pos = self.pos + 0.5 * (self.vel + vel) * dt;
        self.vel = vel;
        self.pos = pos;
    }
}

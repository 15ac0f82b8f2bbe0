//! Approaching intersection conflicts.
//!
//! For every conflict ahead, in order of distance, the vehicle bounds its
//! acceleration to avoid colliding with vehicles on the conflict, and decides
//! whether to pass or stop according to the conflict's control. When it has
//! to stop, it stops before an upstream conflict instead if there is not enough
//! room in between, so it never queues on a conflict it has passed.

pub use self::yield_plans::YieldPlans;
use crate::acceleration::Acceleration;
use crate::anticipation::{anticipate, anticipate_free_acceleration, Anticipation};
use crate::error::Error;
use crate::following::Driver;
use crate::headway::{ConflictingVehicle, Leader};
use crate::params::{B, MIN_GAP, S0, TIME_FACTOR};
use crate::{ConflictId, MAX_DECELERATION, STANDSTILL_SPEED};
use itertools::Itertools;
use smallvec::SmallVec;

mod yield_plans;

/// The time step of free acceleration anticipation, in s.
const ANTICIPATION_TIME_STEP: f64 = 0.5; // s

/// The geometric relation between the own lane and the conflicting lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictKind {
    /// Both streams continue on the same lane beyond the conflict.
    Merge,
    /// The streams cross at an angle.
    Crossing,
    /// Both streams come from the same lane and diverge.
    Split,
}

/// The rule by which the vehicle may enter a conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictControl {
    /// The vehicle has priority.
    Priority,
    /// The vehicle has to give way.
    GiveWay,
    /// The vehicle has to stop and give way.
    Stop,
    /// All vehicles have to stop, and pass in order of arrival.
    /// Approaching such a conflict is not supported.
    AllStop,
}

/// An intersection conflict ahead of the vehicle.
#[derive(Clone, Debug)]
pub struct Conflict {
    /// The conflict's ID, stable between evaluations.
    pub id: ConflictId,
    /// The distance to the start of the conflict in m.
    /// Negative if the vehicle is on the conflict.
    pub distance: f64,
    /// The length of the conflict along the own lane in m.
    pub length: f64,
    pub kind: ConflictKind,
    pub control: ConflictControl,
    /// Conflicting vehicles approaching the conflict, nearest to the conflict first.
    pub upstream: SmallVec<[ConflictingVehicle; 4]>,
    /// Conflicting vehicles on or past the conflict, nearest to the conflict first.
    pub downstream: SmallVec<[ConflictingVehicle; 4]>,
    /// How far upstream along the conflicting lane can be seen, in m.
    pub conflicting_visibility: f64,
    /// The speed limit on the conflicting lane in m/s.
    pub conflicting_speed_limit: f64,
}

impl Conflict {
    /// Creates a conflict without conflicting vehicles and with unlimited visibility.
    pub fn new(
        id: ConflictId,
        distance: f64,
        length: f64,
        kind: ConflictKind,
        control: ConflictControl,
    ) -> Self {
        Self {
            id,
            distance,
            length,
            kind,
            control,
            upstream: SmallVec::new(),
            downstream: SmallVec::new(),
            conflicting_visibility: f64::INFINITY,
            conflicting_speed_limit: 0.0,
        }
    }

    /// Sets the conflicting vehicles approaching the conflict.
    pub fn with_upstream(mut self, vehicles: impl IntoIterator<Item = ConflictingVehicle>) -> Self {
        self.upstream = vehicles.into_iter().collect();
        self
    }

    /// Sets the conflicting vehicles on or past the conflict.
    pub fn with_downstream(mut self, vehicles: impl IntoIterator<Item = ConflictingVehicle>) -> Self {
        self.downstream = vehicles.into_iter().collect();
        self
    }

    /// Sets the visibility and speed limit of the conflicting lane.
    pub fn with_visibility(mut self, distance: f64, speed_limit: f64) -> Self {
        self.conflicting_visibility = distance;
        self.conflicting_speed_limit = speed_limit;
        self
    }

    pub fn is_merge(&self) -> bool {
        self.kind == ConflictKind::Merge
    }

    pub fn is_crossing(&self) -> bool {
        self.kind == ConflictKind::Crossing
    }

    /// The extra distance to clear the conflict: a merge is cleared at its start, a crossing at its end.
    fn clearing_length(&self) -> f64 {
        if self.is_crossing() {
            self.length
        } else {
            0.0
        }
    }
}

/// The expected arrival of a (possibly virtual) conflicting vehicle.
#[derive(Clone, Copy, Debug)]
struct Arrival {
    distance: f64,
    speed: f64,
    acceleration: f64,
}

impl From<&ConflictingVehicle> for Arrival {
    fn from(vehicle: &ConflictingVehicle) -> Self {
        Self {
            distance: vehicle.distance(),
            speed: vehicle.speed,
            acceleration: vehicle.acceleration,
        }
    }
}

/// Decides on the acceleration of a vehicle approaching conflicts.
#[derive(Clone, Copy)]
pub struct ConflictApproach<'a> {
    driver: Driver<'a>,
    vehicle_length: f64,
}

impl<'a> ConflictApproach<'a> {
    /// Creates a conflict approach for the given driver and vehicle length in m.
    pub fn new(driver: Driver<'a>, vehicle_length: f64) -> Self {
        Self {
            driver,
            vehicle_length,
        }
    }

    /// Determines the acceleration for approaching the `conflicts`, sorted by
    /// ascending distance, given the own `leaders`, sorted by ascending distance.
    ///
    /// The vehicle may yield at a conflict where it has priority, a plan which
    /// is remembered in `plans`. Passing the same plans on every call provides
    /// consistency of such decisions. One call is one cycle of the plans.
    pub fn approach_conflicts(
        &self,
        conflicts: &[Conflict],
        leaders: &[Leader],
        plans: &mut YieldPlans,
    ) -> Result<Acceleration, Error> {
        debug_assert!(
            conflicts
                .iter()
                .tuple_windows()
                .all(|(a, b)| a.distance <= b.distance),
            "conflicts must be sorted by distance"
        );

        plans.begin_cycle();
        let a = self.evaluate(conflicts, leaders, plans);
        plans.end_cycle();

        let a = a?;
        if a.lt(MAX_DECELERATION) {
            log::warn!("deceleration for conflicts stronger than {} m/s^2: {}", -MAX_DECELERATION, a);
        }
        Ok(a)
    }

    fn evaluate(
        &self,
        conflicts: &[Conflict],
        leaders: &[Leader],
        plans: &mut YieldPlans,
    ) -> Result<Acceleration, Error> {
        let stop_length = self.driver.params.get(&S0)? + self.vehicle_length;
        let mut prev_starts = SmallVec::<[f64; 8]>::new();
        let mut prev_ends = SmallVec::<[f64; 8]>::new();
        let mut a = Acceleration::Unconstrained;

        for conflict in conflicts {
            // adjust acceleration for situations where stopping might not be required
            a = a.min(match conflict.kind {
                ConflictKind::Crossing => self.avoid_crossing_collision(conflict)?,
                ConflictKind::Merge | ConflictKind::Split => self.follow_conflicting_leader(conflict)?,
            });

            let stop = self.must_stop(conflict, leaders, stop_length, plans)?;
            if conflict.distance < 0.0 || conflict.kind == ConflictKind::Split {
                // on the conflict already, or a split which has nothing to keep clear
                continue;
            }
            log::trace!(
                "{:?} {:?} conflict {:?} at {:.1} m: {}",
                conflict.control,
                conflict.kind,
                conflict.id,
                conflict.distance,
                if stop { "stop" } else { "pass" }
            );

            prev_starts.push(conflict.distance);
            if stop {
                let j = keep_clear_index(&prev_starts, &prev_ends, stop_length);
                // further conflicts are irrelevant
                return Ok(a.min(self.driver.stop(prev_starts[j])?.into()));
            }
            prev_ends.push(conflict.distance + conflict.length);
        }

        Ok(a)
    }

    /// Determines whether the vehicle should stop for the conflict.
    fn must_stop(
        &self,
        conflict: &Conflict,
        leaders: &[Leader],
        stop_length: f64,
        plans: &mut YieldPlans,
    ) -> Result<bool, Error> {
        match conflict.control {
            ConflictControl::AllStop => Err(Error::UnsupportedControl {
                conflict: conflict.id,
                control: conflict.control,
            }),
            _ if conflict.distance < 0.0 || conflict.kind == ConflictKind::Split => Ok(false),
            ConflictControl::Priority => {
                self.stop_for_priority_conflict(conflict, leaders, stop_length, plans)
            }
            ConflictControl::GiveWay | ConflictControl::Stop => {
                self.stop_for_give_way_conflict(conflict, leaders, stop_length)
            }
        }
    }

    /// Determines the acceleration for following a conflicting vehicle
    /// <i>on</i> a merge or split conflict.
    fn follow_conflicting_leader(&self, conflict: &Conflict) -> Result<Acceleration, Error> {
        // the most upstream vehicle, if it is (partially) on the conflict
        let Some(vehicle) = conflict.downstream.first() else {
            return Ok(Acceleration::Unconstrained);
        };
        let Some(overlap) = vehicle.overlap() else {
            // completely downstream is regular car-following
            return Ok(Acceleration::Unconstrained);
        };

        let virtual_headway = conflict.distance + overlap.rear;
        if virtual_headway <= 0.0 && conflict.distance <= 0.0 {
            // downstream of the start of the conflict, but upstream of us
            return Ok(Acceleration::Unconstrained);
        }

        let mut a = self.driver.follow_leader(virtual_headway, vehicle.speed)?;
        if conflict.is_merge() && virtual_headway < conflict.distance {
            // partially upstream of the conflict, rather stop for the conflict than follow its tail
            let a_stop = self.driver.stop(conflict.distance)?;
            a = if vehicle.is_stationary() {
                a_stop
            } else {
                f64::max(a, a_stop)
            };
        }
        Ok(a.into())
    }

    /// Determines the acceleration required to avoid a collision with a
    /// vehicle <i>on</i> a crossing conflict.
    fn avoid_crossing_collision(&self, conflict: &Conflict) -> Result<Acceleration, Error> {
        if conflict.distance <= 0.0 {
            return Ok(Acceleration::Unconstrained);
        }
        let Some(vehicle) = conflict.downstream.first() else {
            return Ok(Acceleration::Unconstrained);
        };
        let Some(overlap) = vehicle.overlap() else {
            return Ok(Acceleration::Unconstrained);
        };

        // time until cleared, assuming the conflicting vehicle holds its speed
        let ttc = anticipate(overlap.clearing_distance(), vehicle.speed, 0.0);
        // time until we enter
        let tte = anticipate_free_acceleration(conflict.distance, &self.driver, ANTICIPATION_TIME_STEP)?;
        if tte.duration >= ttc.duration {
            return Ok(Acceleration::Unconstrained);
        }

        if !vehicle.is_stationary() {
            // parabolic speed profile s = v*t + .5*a*t*t that enters as the conflict is cleared
            let speed = self.driver.speed;
            let t = ttc.duration;
            let acc = 2.0 * (conflict.distance - speed * t) / t.powi(2);
            // does not reach a stand-still before that time
            if acc >= 0.0 || speed / -acc > t {
                return Ok(acc.into());
            }
        }
        Ok(self.driver.stop(conflict.distance)?.into())
    }

    /// Decides whether to yield at a conflict where the vehicle has priority.
    ///
    /// When the own leader will not leave enough room beyond the conflict in
    /// time, the vehicle would block the conflict, and yields to a waiting
    /// conflicting vehicle.
    fn stop_for_priority_conflict(
        &self,
        conflict: &Conflict,
        leaders: &[Leader],
        stop_length: f64,
        plans: &mut YieldPlans,
    ) -> Result<bool, Error> {
        let (Some(leader), Some(vehicle)) = (leaders.first(), conflict.upstream.first()) else {
            // no leader, or no conflicting vehicle
            return Ok(false);
        };
        if !vehicle.is_stationary() {
            return Ok(false);
        }

        let speed = self.driver.speed;
        // time until we clear the conflict
        let distance = conflict.distance + self.vehicle_length + conflict.clearing_length();
        let ttc = anticipate(distance, speed, 0.0);
        // time until the leader leaves sufficient room beyond the conflict
        let passable = distance - leader.distance - self.vehicle_length + stop_length;
        let ttp = anticipate(passable, leader.speed, 0.0);
        if ttp.duration < ttc.duration {
            return Ok(false);
        }

        // the vehicle yielded to has merged and is now the leader
        if plans.is_yielding_to(conflict.id, leader.id) {
            return Ok(false);
        }

        if !plans.is_yielding_to(conflict.id, vehicle.id) {
            let b = self.driver.params.get(&B)?;
            let b_req = if speed < STANDSTILL_SPEED {
                0.0
            } else if conflict.distance > 0.0 {
                0.5 * speed.powi(2) / conflict.distance
            } else {
                f64::INFINITY
            };
            if b_req > b {
                // can not stop safely, do not initiate a plan
                return Ok(false);
            }
        }

        plans.affirm(conflict.id, vehicle.id);
        Ok(true)
    }

    /// Decides whether to give way at a give-way or stop conflict.
    fn stop_for_give_way_conflict(
        &self,
        conflict: &Conflict,
        leaders: &[Leader],
        stop_length: f64,
    ) -> Result<bool, Error> {
        let params = self.driver.params;
        let b = -params.get(&B)?;
        let f = params.get(&TIME_FACTOR)?;
        let gap = params.get(&MIN_GAP)?;

        // time until we clear the conflict
        let distance = conflict.distance + self.vehicle_length + conflict.clearing_length();
        let ttc = anticipate_free_acceleration(distance, &self.driver, ANTICIPATION_TIME_STEP)?;

        // time until the leader leaves sufficient room beyond a crossing,
        // at constant speed and when braking
        let (ttp_z, ttp_s) = match leaders.first() {
            Some(leader) if conflict.is_crossing() => {
                let distance = conflict.distance - leader.distance + conflict.length + stop_length;
                (
                    anticipate(distance, leader.speed, 0.0),
                    anticipate(distance, leader.speed, b),
                )
            }
            _ => (Anticipation::reached(0.0), Anticipation::reached(0.0)),
        };

        let arrivals: SmallVec<[Arrival; 4]> = if conflict.upstream.is_empty() {
            // none within visibility, assume a vehicle just outside of it driving at the speed limit
            smallvec::smallvec![Arrival {
                distance: conflict.conflicting_visibility,
                speed: conflict.conflicting_speed_limit,
                acceleration: 0.0,
            }]
        } else {
            conflict.upstream.iter().map(Arrival::from).collect()
        };

        let late = |t: f64, arrival: Anticipation| t * f + gap > arrival.duration;
        for arrival in arrivals {
            // time until the conflicting vehicle enters, under its acceleration and when braking
            let tte_c = anticipate(arrival.distance, arrival.speed, arrival.acceleration);
            let tte_s = anticipate(arrival.distance, arrival.speed, b);

            let stop = match conflict.kind {
                ConflictKind::Merge => {
                    // we will be each others leader and follower, add time to overcome a speed difference
                    let v_conflicting = arrival.speed + b * ttc.duration;
                    let speed_diff = f64::max(v_conflicting - ttc.end_speed, 0.0);
                    let catch_up = speed_diff / -b;
                    late(ttc.duration, tte_c) || late(ttc.duration + catch_up, tte_s)
                }
                ConflictKind::Crossing => {
                    late(ttp_z.duration, tte_c) || late(ttc.duration, tte_c) || late(ttp_s.duration, tte_s)
                }
                ConflictKind::Split => false,
            };
            if stop {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Finds the conflict to stop for, looking upstream from the last of `starts`,
/// which is to be kept clear. This is the first conflict with sufficient room
/// before the next one, or the most upstream one.
fn keep_clear_index(starts: &[f64], ends: &[f64], stop_length: f64) -> usize {
    // `starts` contains one more conflict than `ends`
    (0..ends.len())
        .rev()
        .find(|&i| starts[i + 1] - ends[i] > stop_length)
        .map_or(0, |i| i + 1)
}

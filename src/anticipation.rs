//! Anticipation of movement: how long, and at what end speed, it takes to
//! cover a distance under a given acceleration policy.

use crate::error::Error;
use crate::following::Driver;
use crate::ACCELERATION_EPSILON;

/// The maximum number of integration steps in [anticipate_free_acceleration].
const MAX_ANTICIPATION_STEPS: usize = 1000;

/// The duration and end speed of an anticipated movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anticipation {
    /// The duration in s, infinite if the distance is never covered.
    pub duration: f64,
    /// The speed at the end of the movement in m/s.
    pub end_speed: f64,
}

impl Anticipation {
    pub const fn new(duration: f64, end_speed: f64) -> Self {
        Self {
            duration,
            end_speed,
        }
    }

    /// A distance that is already reached.
    pub const fn reached(speed: f64) -> Self {
        Self::new(0.0, speed)
    }

    /// A distance that is never reached.
    pub const fn never() -> Self {
        Self::new(f64::INFINITY, 0.0)
    }

    /// Whether the distance is reached in finite time.
    pub fn is_reached(&self) -> bool {
        self.duration.is_finite()
    }
}

/// Anticipates covering `distance` from `initial_speed` under a constant `acceleration`.
pub fn anticipate(distance: f64, initial_speed: f64, acceleration: f64) -> Anticipation {
    anticipate_with_max_speed(distance, initial_speed, acceleration, f64::INFINITY)
}

/// Anticipates covering `distance` from `initial_speed` under a constant `acceleration`,
/// where the speed does not increase beyond `max_speed`.
pub fn anticipate_with_max_speed(
    distance: f64,
    initial_speed: f64,
    acceleration: f64,
    max_speed: f64,
) -> Anticipation {
    if distance <= 0.0 {
        return Anticipation::reached(initial_speed);
    }

    if acceleration.abs() < ACCELERATION_EPSILON || (acceleration > 0.0 && initial_speed >= max_speed) {
        return if initial_speed > 0.0 {
            Anticipation::new(distance / initial_speed, initial_speed)
        } else {
            Anticipation::never()
        };
    }

    let discr = initial_speed.powi(2) + 2.0 * acceleration * distance;
    if discr < 0.0 {
        // decelerates to a stand-still before the distance is covered
        return Anticipation::never();
    }

    let end_speed = discr.sqrt();
    if end_speed <= max_speed {
        Anticipation::new((end_speed - initial_speed) / acceleration, end_speed)
    } else {
        let t = (max_speed - initial_speed) / acceleration;
        let d = (max_speed.powi(2) - initial_speed.powi(2)) / (2.0 * acceleration);
        Anticipation::new(t + (distance - d) / max_speed, max_speed)
    }
}

/// The state of the free acceleration integration.
#[derive(Clone, Copy, Debug)]
enum Integration {
    /// Advancing by whole time steps.
    Stepping { time: f64, covered: f64, speed: f64 },
    /// The next step covers the remaining distance.
    FinalStep {
        time: f64,
        covered: f64,
        speed: f64,
        acc: f64,
    },
    /// The distance is covered.
    Done(Anticipation),
}

/// Anticipates covering `distance` when the driver applies the free acceleration
/// of its car-following model, integrated with steps of `time_step` seconds.
pub fn anticipate_free_acceleration(
    distance: f64,
    driver: &Driver,
    time_step: f64,
) -> Result<Anticipation, Error> {
    if distance <= 0.0 {
        return Ok(Anticipation::reached(driver.speed));
    }

    let unreachable = |covered: f64| Error::UnreachableDistance { distance, covered };
    let mut state = Integration::Stepping {
        time: 0.0,
        covered: 0.0,
        speed: driver.speed,
    };

    for _ in 0..=MAX_ANTICIPATION_STEPS {
        state = match state {
            Integration::Stepping {
                time,
                covered,
                speed,
            } => {
                let acc = driver.free_acceleration_at(speed)?;
                if speed <= 0.0 && acc <= 0.0 {
                    return Err(unreachable(covered));
                }
                let (step_time, step, next_speed) = if speed + acc * time_step < 0.0 {
                    // comes to a stand-still within the step
                    (speed / -acc, -0.5 * speed.powi(2) / acc, 0.0)
                } else {
                    let next_speed = speed + acc * time_step;
                    (time_step, 0.5 * (speed + next_speed) * time_step, next_speed)
                };
                if covered + step >= distance {
                    Integration::FinalStep {
                        time,
                        covered,
                        speed,
                        acc,
                    }
                } else {
                    Integration::Stepping {
                        time: time + step_time,
                        covered: covered + step,
                        speed: next_speed,
                    }
                }
            }
            Integration::FinalStep {
                time,
                covered,
                speed,
                acc,
            } => {
                let mut last = anticipate(distance - covered, speed, acc);
                if !last.is_reached() {
                    if acc >= 0.0 {
                        return Err(unreachable(covered));
                    }
                    // the point is where the vehicle stands still, lost to rounding
                    last = Anticipation::new(speed / -acc, 0.0);
                }
                Integration::Done(Anticipation::new(time + last.duration, last.end_speed))
            }
            Integration::Done(result) => return Ok(result),
        };
    }

    match state {
        Integration::Done(result) => Ok(result),
        Integration::Stepping { covered, .. } | Integration::FinalStep { covered, .. } => {
            Err(unreachable(covered))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::following::Idm;
    use crate::params::Parameters;
    use crate::speed_limit::SpeedLimitInfo;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn already_passed() {
        for distance in [-0.1, -5.0, -1000.0] {
            let a = anticipate(distance, 12.0, 1.0);
            assert_eq!(a, Anticipation::new(0.0, 12.0));
        }
        assert_eq!(anticipate(0.0, 20.0, -2.0), Anticipation::new(0.0, 20.0));
    }

    #[test]
    fn constant_speed() {
        let a = anticipate(100.0, 10.0, 0.0);
        assert_approx_eq!(a.duration, 10.0);
        assert_approx_eq!(a.end_speed, 10.0);

        let a = anticipate(100.0, 0.0, 0.0);
        assert_eq!(a.duration, f64::INFINITY);
        assert_eq!(a.end_speed, 0.0);
    }

    #[test]
    fn deceleration_never_reaches() {
        let a = anticipate(1000.0, 5.0, -1.0);
        assert_eq!(a.duration, f64::INFINITY);
        assert_eq!(a.end_speed, 0.0);
    }

    #[test]
    fn deceleration_reaches() {
        // 10 m/s braking at 2 m/s^2 over 16 m ends at 6 m/s after 2 s
        let a = anticipate(16.0, 10.0, -2.0);
        assert_approx_eq!(a.duration, 2.0);
        assert_approx_eq!(a.end_speed, 6.0);
    }

    #[test]
    fn reach_time_with_max_speed() {
        let t = |v: f64, d: f64, max_v: f64| anticipate_with_max_speed(d, v, 2.0, max_v).duration;

        assert_approx_eq!(t(0.0, 25.0, 50.0), 5.0);
        assert_approx_eq!(t(0.0, 25.0, 10.0), 5.0);
        assert_approx_eq!(t(0.0, 25.0, 9.0), 5.027777777777);

        assert_approx_eq!(t(5.0, 50.0, 50.0), 5.0);
        assert_approx_eq!(t(5.0, 50.0, 15.0), 5.0);
        assert_approx_eq!(t(5.0, 50.0, 14.0), 5.01785714285);

        assert_approx_eq!(anticipate_with_max_speed(50.0, 5.0, 2.0, 14.0).end_speed, 14.0);
        assert_approx_eq!(anticipate_with_max_speed(50.0, 20.0, 2.0, 14.0).duration, 2.5);
    }

    #[test]
    fn free_acceleration_from_standstill() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(30.0).with_legal_limit(13.9);
        let driver = Driver::new(&Idm, &params, 0.0, &limits);

        let a = anticipate_free_acceleration(50.0, &driver, 0.5).unwrap();
        // slower than full acceleration at 1.25 m/s^2, and below the desired speed
        assert!(a.duration > anticipate(50.0, 0.0, 1.25).duration);
        assert!(a.duration.is_finite());
        assert!(a.end_speed > 0.0 && a.end_speed < 13.9);
    }

    #[test]
    fn free_acceleration_at_desired_speed() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(30.0).with_legal_limit(10.0);
        let driver = Driver::new(&Idm, &params, 10.0, &limits);

        let a = anticipate_free_acceleration(25.0, &driver, 0.5).unwrap();
        assert_approx_eq!(a.duration, 2.5);
        assert_approx_eq!(a.end_speed, 10.0);

        let a = anticipate_free_acceleration(-1.0, &driver, 0.5).unwrap();
        assert_eq!(a, Anticipation::reached(10.0));
    }

    #[test]
    fn free_acceleration_above_desired_speed() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(30.0).with_legal_limit(5.0);
        let driver = Driver::new(&Idm, &params, 14.0, &limits);
        let acc = driver.free_acceleration().unwrap();
        let stopping = -0.5 * 14.0_f64.powi(2) / acc;
        assert!(stopping < 3.0);

        // reached while braking within the first step
        let a = anticipate_free_acceleration(1.0, &driver, 0.5).unwrap();
        assert_eq!(a, anticipate(1.0, 14.0, acc));
        assert!(a.duration < 14.0 / -acc);

        // exactly at the stand-still point
        let a = anticipate_free_acceleration(stopping, &driver, 0.5).unwrap();
        assert_approx_eq!(a.duration, 14.0 / -acc);
        assert_approx_eq!(a.end_speed, 0.0);

        // beyond it, the vehicle sets off again
        let a = anticipate_free_acceleration(3.0, &driver, 0.5).unwrap();
        assert!(a.duration.is_finite());
        assert!(a.duration > 14.0 / -acc);
        assert!(a.end_speed > 0.0 && a.end_speed < 5.0);
    }

    #[test]
    fn free_acceleration_unreachable() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(30.0).with_legal_limit(0.0);
        let driver = Driver::new(&Idm, &params, 0.0, &limits);

        let err = anticipate_free_acceleration(10.0, &driver, 0.5).unwrap_err();
        assert!(matches!(err, Error::UnreachableDistance { .. }));
    }
}

//! The response to traffic lights ahead.

use crate::acceleration::Acceleration;
use crate::error::ParameterError;
use crate::following::Driver;
use crate::params::B_YELLOW;

/// The state of a traffic light.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightState {
    Red,
    Yellow,
    Green,
}

impl LightState {
    pub fn is_red_or_yellow(self) -> bool {
        self != LightState::Green
    }
}

/// A traffic light ahead of the vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficLightHeadway {
    /// The distance to the stop line in m.
    pub distance: f64,
    /// The current state of the light.
    pub state: LightState,
}

/// Determines the acceleration to stop for red and yellow lights.
///
/// A light is run if stopping for it requires a deceleration beyond [B_YELLOW],
/// as happens when a light turns yellow too late to stop.
pub fn respond_to_lights(
    driver: &Driver,
    lights: &[TrafficLightHeadway],
) -> Result<Acceleration, ParameterError> {
    let b_yellow = driver.params.get(&B_YELLOW)?;
    let mut a = Acceleration::Unconstrained;
    for light in lights {
        if !light.state.is_red_or_yellow() || light.distance < 0.0 {
            continue;
        }
        let a_stop = f64::max(
            driver.stop(light.distance)?,
            driver.constant_deceleration_to_stop(light.distance)?,
        );
        if a_stop >= -b_yellow {
            a = a.min(Acceleration::Bounded(a_stop));
        } else {
            log::trace!(
                "running {:?} light at {:.1} m, stopping requires {:.2} m/s^2",
                light.state,
                light.distance,
                a_stop
            );
        }
    }
    Ok(a)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::following::Idm;
    use crate::params::Parameters;
    use crate::speed_limit::SpeedLimitInfo;
    use assert_approx_eq::assert_approx_eq;

    fn light(distance: f64, state: LightState) -> TrafficLightHeadway {
        TrafficLightHeadway { distance, state }
    }

    #[test]
    fn green_is_ignored() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(40.0).with_legal_limit(14.0);
        let driver = Driver::new(&Idm, &params, 14.0, &limits);
        let a = respond_to_lights(&driver, &[light(40.0, LightState::Green)]).unwrap();
        assert!(a.is_unconstrained());
    }

    #[test]
    fn stops_for_red_light() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(40.0).with_legal_limit(14.0);
        let driver = Driver::new(&Idm, &params, 10.0, &limits);
        let a = respond_to_lights(&driver, &[light(40.0, LightState::Red)]).unwrap();
        let expected = f64::max(
            driver.stop(40.0).unwrap(),
            driver.constant_deceleration_to_stop(40.0).unwrap(),
        );
        assert_approx_eq!(a.value().unwrap(), expected);
        assert!(a.lt(0.0));
    }

    #[test]
    fn runs_late_yellow_light() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(40.0).with_legal_limit(14.0);
        let driver = Driver::new(&Idm, &params, 14.0, &limits);
        // 14 m/s needs well over 3.5 m/s^2 to stop within 10 m
        let a = respond_to_lights(&driver, &[light(10.0, LightState::Yellow)]).unwrap();
        assert!(a.is_unconstrained());
    }

    #[test]
    fn passed_light_is_ignored() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(40.0).with_legal_limit(14.0);
        let driver = Driver::new(&Idm, &params, 5.0, &limits);
        let a = respond_to_lights(&driver, &[light(-2.0, LightState::Red)]).unwrap();
        assert!(a.is_unconstrained());
    }

    #[test]
    fn nearest_light_dominates() {
        let params = Parameters::with_defaults();
        let limits = SpeedLimitInfo::new(40.0).with_legal_limit(14.0);
        let driver = Driver::new(&Idm, &params, 8.0, &limits);
        let lights = [light(50.0, LightState::Red), light(150.0, LightState::Red)];
        let a = respond_to_lights(&driver, &lights).unwrap();
        let near = respond_to_lights(&driver, &lights[..1]).unwrap();
        assert_eq!(a, near);
    }

    #[test]
    fn missing_yellow_deceleration() {
        let mut params = Parameters::new();
        params.set(&crate::params::A, 1.0).unwrap();
        let limits = SpeedLimitInfo::new(40.0);
        let driver = Driver::new(&Idm, &params, 8.0, &limits);
        let err = respond_to_lights(&driver, &[]).unwrap_err();
        assert_eq!(err, ParameterError::Missing { id: "bYellow" });
    }
}

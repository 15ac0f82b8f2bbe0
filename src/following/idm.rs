use super::{CarFollowingModel, Headway};
use crate::error::ParameterError;
use crate::params::{Parameters, A, B, FSPEED, S0, T};
use crate::speed_limit::SpeedLimitInfo;
use crate::MAX_DECELERATION;

/// The acceleration exponent of the free road term.
const DELTA: i32 = 4;

/// The intelligent driver model.
///
/// Reads the parameters [A], [B], [S0], [T] and [FSPEED].
#[derive(Clone, Copy, Debug, Default)]
pub struct Idm;

impl Idm {
    /// The free road term, which is 1 at the desired speed.
    fn free_term(speed: f64, desired_speed: f64) -> f64 {
        if desired_speed > 0.0 {
            (speed / desired_speed).powi(DELTA)
        } else if speed > 0.0 {
            2.0
        } else {
            1.0
        }
    }

    /// The interaction term for a single leader, which is 1 at the desired gap.
    fn interaction_term(
        params: &Parameters,
        speed: f64,
        leader: &Headway,
    ) -> Result<Option<f64>, ParameterError> {
        if leader.distance <= 0.0 {
            return Ok(None);
        }
        let max_acc = params.get(&A)?;
        let comf_dec = params.get(&B)?;
        let appr = speed - leader.speed;
        let factor = 1. / (2. * (max_acc * comf_dec).sqrt());
        let dynamic = speed * params.get(&T)? + speed * appr * factor;
        let ss = params.get(&S0)? + f64::max(dynamic, 0.0);
        Ok(Some((ss / leader.distance).powi(2)))
    }
}

impl CarFollowingModel for Idm {
    fn desired_headway(&self, params: &Parameters, speed: f64) -> Result<f64, ParameterError> {
        Ok(params.get(&S0)? + speed * params.get(&T)?)
    }

    fn desired_speed(&self, params: &Parameters, limits: &SpeedLimitInfo) -> Result<f64, ParameterError> {
        Ok(limits.desired_speed(params.get(&FSPEED)?))
    }

    fn following_acceleration(
        &self,
        params: &Parameters,
        speed: f64,
        limits: &SpeedLimitInfo,
        leaders: &[Headway],
    ) -> Result<f64, ParameterError> {
        let max_acc = params.get(&A)?;
        let free = Self::free_term(speed, self.desired_speed(params, limits)?);

        let mut acc = max_acc * (1. - free);
        for leader in leaders {
            match Self::interaction_term(params, speed, leader)? {
                Some(term) => acc = f64::min(acc, max_acc * (1. - free - term)),
                // collided or overlapping
                None => return Ok(MAX_DECELERATION),
            }
        }
        Ok(acc)
    }
}

//! Typed, bounded behavioural parameters.
//!
//! Every value is stored in SI units. A value can only enter a [Parameters]
//! store through a check against the domain of its [ParameterType], so reading
//! a value can only fail if it was never set.

use crate::error::ParameterError;
use rand::Rng;
use rand_distr::Distribution;
use std::collections::BTreeMap;
use std::fmt;

/// The domain a parameter value must lie in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// Strictly greater than zero.
    Positive,
    /// Greater than or equal to one.
    AtLeastOne,
    /// Greater than or equal to zero.
    NonNegative,
}

impl Constraint {
    /// Returns true if the value lies in the domain.
    pub fn accepts(self, value: f64) -> bool {
        value.is_finite()
            && match self {
                Constraint::Positive => value > 0.0,
                Constraint::AtLeastOne => value >= 1.0,
                Constraint::NonNegative => value >= 0.0,
            }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Constraint::Positive => "positive",
            Constraint::AtLeastOne => "at least one",
            Constraint::NonNegative => "non-negative",
        })
    }
}

/// A named parameter with a default value and a domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterType {
    id: &'static str,
    description: &'static str,
    default: f64,
    constraint: Constraint,
}

/// Maximum acceleration in m/s<sup>2</sup>.
pub const A: ParameterType = ParameterType::new("a", "Maximum acceleration.", 1.25, Constraint::Positive);

/// Comfortable deceleration in m/s<sup>2</sup>, a positive number.
pub const B: ParameterType = ParameterType::new("b", "Comfortable deceleration.", 2.09, Constraint::Positive);

/// Stopping distance in m.
pub const S0: ParameterType = ParameterType::new("s0", "Stopping distance.", 3.0, Constraint::Positive);

/// Desired time headway in s.
pub const T: ParameterType = ParameterType::new("t", "Desired time headway.", 1.2, Constraint::Positive);

/// Factor on the speed limit to obtain the desired speed.
pub const FSPEED: ParameterType = ParameterType::new(
    "fSpeed",
    "Factor on speed limit to determine desired speed.",
    1.0,
    Constraint::Positive,
);

/// Minimum time gap between events at a conflict, in s.
pub const MIN_GAP: ParameterType =
    ParameterType::new("minGap", "Minimum gap for conflicts.", 1.0, Constraint::Positive);

/// Multiplication factor on time for conservative assessment.
pub const TIME_FACTOR: ParameterType = ParameterType::new(
    "timeFactor",
    "Safety factor on estimated time.",
    1.25,
    Constraint::AtLeastOne,
);

/// Maximum deceleration to stop for a yellow light, in m/s<sup>2</sup>.
pub const B_YELLOW: ParameterType = ParameterType::new(
    "bYellow",
    "Maximum deceleration for stopping for yellow traffic light.",
    3.5,
    Constraint::Positive,
);

/// All parameter types known to this crate.
pub static ALL: [&ParameterType; 8] = [&A, &B, &S0, &T, &FSPEED, &MIN_GAP, &TIME_FACTOR, &B_YELLOW];

impl ParameterType {
    /// Creates a new parameter type.
    pub const fn new(
        id: &'static str,
        description: &'static str,
        default: f64,
        constraint: Constraint,
    ) -> Self {
        Self {
            id,
            description,
            default,
            constraint,
        }
    }

    /// Looks up one of the known parameter types by its ID.
    pub fn by_id(id: &str) -> Option<&'static ParameterType> {
        ALL.iter().copied().find(|ty| ty.id == id)
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn default_value(&self) -> f64 {
        self.default
    }

    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    /// Checks the value against the domain of the parameter.
    pub fn check(&self, value: f64) -> Result<f64, ParameterError> {
        if self.constraint.accepts(value) {
            Ok(value)
        } else {
            Err(ParameterError::OutOfDomain {
                id: self.id,
                value,
                constraint: self.constraint,
            })
        }
    }
}

/// A set of behavioural parameters of one driver.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    values: BTreeMap<&'static str, f64>,
}

impl Parameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a parameter set with every known parameter at its default value.
    pub fn with_defaults() -> Self {
        Self {
            values: ALL.iter().map(|ty| (ty.id, ty.default)).collect(),
        }
    }

    /// Gets the value of a parameter.
    pub fn get(&self, ty: &ParameterType) -> Result<f64, ParameterError> {
        self.values
            .get(ty.id)
            .copied()
            .ok_or(ParameterError::Missing { id: ty.id })
    }

    /// Sets the value of a parameter, if it lies in the parameter's domain.
    pub fn set(&mut self, ty: &ParameterType, value: f64) -> Result<(), ParameterError> {
        let value = ty.check(value)?;
        self.values.insert(ty.id, value);
        Ok(())
    }

    /// Sets a parameter back to its default value.
    pub fn reset(&mut self, ty: &ParameterType) {
        self.values.insert(ty.id, ty.default);
    }

    /// Whether the parameter is defined.
    pub fn contains(&self, ty: &ParameterType) -> bool {
        self.values.contains_key(ty.id)
    }

    /// Draws the desired speed factor from a normal distribution with a mean of 1
    /// (no adjustment) and standard deviation of `stddev`.
    pub fn sample_speed_factor<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        stddev: f64,
    ) -> Result<f64, ParameterError> {
        let distr =
            rand_distr::Normal::new(1.0, stddev).map_err(|_| ParameterError::InvalidSpread(stddev))?;
        let factor = distr.sample(rng).clamp(0.75, 1.25);
        self.set(&FSPEED, factor)?;
        Ok(factor)
    }

    /// Parses a parameter set from a JSON object of parameter IDs to values.
    /// Parameters absent from the object remain undefined.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ParameterError> {
        let mut params = Self::new();
        params.apply_json(json)?;
        Ok(params)
    }

    /// Overrides parameters with the values in a JSON object of parameter IDs to values.
    #[cfg(feature = "serde")]
    pub fn apply_json(&mut self, json: &str) -> Result<(), ParameterError> {
        let raw: BTreeMap<String, f64> =
            serde_json::from_str(json).map_err(|err| ParameterError::Json(err.to_string()))?;
        for (id, value) in raw {
            let ty = ParameterType::by_id(&id).ok_or(ParameterError::Unknown(id))?;
            self.set(ty, value)?;
        }
        Ok(())
    }

    /// Serializes the parameter set into a JSON object.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> String {
        serde_json::Value::from_iter(
            self.values
                .iter()
                .map(|(id, value)| (id.to_string(), serde_json::Value::from(*value))),
        )
        .to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;

    #[test]
    fn defaults() {
        let params = Parameters::with_defaults();
        assert_approx_eq!(params.get(&MIN_GAP).unwrap(), 1.0);
        assert_approx_eq!(params.get(&TIME_FACTOR).unwrap(), 1.25);
        assert_approx_eq!(params.get(&B_YELLOW).unwrap(), 3.5);
    }

    #[test]
    fn missing_is_an_error() {
        let params = Parameters::new();
        assert_eq!(params.get(&S0), Err(ParameterError::Missing { id: "s0" }));
    }

    #[test]
    fn out_of_domain_is_rejected() {
        let mut params = Parameters::with_defaults();
        assert!(params.set(&TIME_FACTOR, 0.9).is_err());
        assert!(params.set(&MIN_GAP, 0.0).is_err());
        assert!(params.set(&B, f64::NAN).is_err());
        assert_approx_eq!(params.get(&TIME_FACTOR).unwrap(), 1.25);

        params.set(&TIME_FACTOR, 1.0).unwrap();
        assert_approx_eq!(params.get(&TIME_FACTOR).unwrap(), 1.0);
        params.reset(&TIME_FACTOR);
        assert_approx_eq!(params.get(&TIME_FACTOR).unwrap(), 1.25);
    }

    #[test]
    fn speed_factor_is_clamped() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut params = Parameters::with_defaults();
        for _ in 0..100 {
            let factor = params.sample_speed_factor(&mut rng, 0.5).unwrap();
            assert!((0.75..=1.25).contains(&factor));
        }
        assert_eq!(
            params.sample_speed_factor(&mut rng, -1.0),
            Err(ParameterError::InvalidSpread(-1.0))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_config() {
        let params = Parameters::from_json(r#"{ "minGap": 1.5, "timeFactor": 2.0 }"#).unwrap();
        assert_approx_eq!(params.get(&MIN_GAP).unwrap(), 1.5);
        assert!(!params.contains(&B_YELLOW));

        let err = Parameters::from_json(r#"{ "timeFactor": 0.5 }"#).unwrap_err();
        assert!(matches!(err, ParameterError::OutOfDomain { id: "timeFactor", .. }));

        let err = Parameters::from_json(r#"{ "vMax": 30.0 }"#).unwrap_err();
        assert_eq!(err, ParameterError::Unknown("vMax".into()));

        let defaults = Parameters::with_defaults();
        assert_eq!(Parameters::from_json(&defaults.to_json()).unwrap(), defaults);
    }
}

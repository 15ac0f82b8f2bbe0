use crate::MAX_DECELERATION;
use std::fmt;

/// An acceleration bound imposed by a single hazard.
///
/// Bounds from independent hazards are combined with [Acceleration::min].
/// [Acceleration::Unconstrained] is the identity of that composition, and must
/// be read by the caller as "fall back to free acceleration", never as a command.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Acceleration {
    /// A finite acceleration in m/s<sup>2</sup>.
    Bounded(f64),
    /// The hazard does not constrain the vehicle.
    Unconstrained,
}

impl Acceleration {
    /// Wraps a computed acceleration.
    /// Positive infinity is mapped to [Acceleration::Unconstrained], NaN to
    /// [MAX_DECELERATION].
    pub fn bounded(value: f64) -> Self {
        if value.is_nan() {
            log::warn!("acceleration is NaN, braking at {} m/s^2", MAX_DECELERATION);
            Self::Bounded(MAX_DECELERATION)
        } else if value == f64::INFINITY {
            Self::Unconstrained
        } else {
            Self::Bounded(value)
        }
    }

    /// The more restrictive of the two bounds.
    pub fn min(self, other: Self) -> Self {
        match (self, other) {
            (Self::Bounded(a), Self::Bounded(b)) => Self::Bounded(f64::min(a, b)),
            (Self::Bounded(a), Self::Unconstrained) | (Self::Unconstrained, Self::Bounded(a)) => {
                Self::Bounded(a)
            }
            (Self::Unconstrained, Self::Unconstrained) => Self::Unconstrained,
        }
    }

    /// The more permissive of the two bounds.
    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (Self::Bounded(a), Self::Bounded(b)) => Self::Bounded(f64::max(a, b)),
            _ => Self::Unconstrained,
        }
    }

    /// The bound as a number, if there is one.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Bounded(a) => Some(a),
            Self::Unconstrained => None,
        }
    }

    /// Whether the hazard imposes no constraint.
    pub fn is_unconstrained(self) -> bool {
        self == Self::Unconstrained
    }

    /// Resolves the bound into a command, using `free` when unconstrained.
    pub fn or_free(self, free: f64) -> f64 {
        self.value().unwrap_or(free)
    }

    /// Whether the bound is strictly lower than `value`.
    pub fn lt(self, value: f64) -> bool {
        matches!(self, Self::Bounded(a) if a < value)
    }
}

impl Default for Acceleration {
    fn default() -> Self {
        Self::Unconstrained
    }
}

impl From<f64> for Acceleration {
    fn from(value: f64) -> Self {
        Self::bounded(value)
    }
}

impl FromIterator<Acceleration> for Acceleration {
    fn from_iter<I: IntoIterator<Item = Acceleration>>(iter: I) -> Self {
        iter.into_iter().fold(Self::Unconstrained, Self::min)
    }
}

impl fmt::Display for Acceleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(a) => write!(f, "{:.3} m/s^2", a),
            Self::Unconstrained => write!(f, "unconstrained"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unconstrained_is_identity_of_min() {
        let a = Acceleration::Bounded(-1.5);
        assert_eq!(a.min(Acceleration::Unconstrained), a);
        assert_eq!(Acceleration::Unconstrained.min(a), a);
        assert_eq!(
            Acceleration::Unconstrained.min(Acceleration::Unconstrained),
            Acceleration::Unconstrained
        );
    }

    #[test]
    fn max_is_absorbed_by_unconstrained() {
        let a = Acceleration::Bounded(0.5);
        assert_eq!(a.max(Acceleration::Bounded(-2.0)), a);
        assert_eq!(a.max(Acceleration::Unconstrained), Acceleration::Unconstrained);
    }

    #[test]
    fn infinity_maps_to_unconstrained() {
        assert!(Acceleration::bounded(f64::INFINITY).is_unconstrained());
        assert_eq!(Acceleration::from(-3.0), Acceleration::Bounded(-3.0));
    }

    #[test]
    fn nan_brakes_fully() {
        assert_eq!(Acceleration::bounded(f64::NAN), Acceleration::Bounded(MAX_DECELERATION));
        let a = Acceleration::Bounded(0.5).min(f64::NAN.into());
        assert_eq!(a, Acceleration::Bounded(MAX_DECELERATION));
    }

    #[test]
    fn collect_takes_minimum() {
        let a: Acceleration = [1.0, -2.0, 0.5].into_iter().map(Acceleration::from).collect();
        assert_eq!(a, Acceleration::Bounded(-2.0));
        let none: Acceleration = std::iter::empty().collect();
        assert!(none.is_unconstrained());
        assert_eq!(none.or_free(1.2), 1.2);
    }
}

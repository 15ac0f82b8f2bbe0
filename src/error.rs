//! Error types of the decision engine.

use crate::conflict::ConflictControl;
use crate::params::Constraint;
use crate::ConflictId;
use thiserror::Error;

/// Errors raised when reading or writing behavioural parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("parameter {id} is not defined")]
    Missing { id: &'static str },
    #[error("parameter {id} must be {constraint} (got {value})")]
    OutOfDomain {
        id: &'static str,
        value: f64,
        constraint: Constraint,
    },
    #[error("unknown parameter {0}")]
    Unknown(String),
    #[error("invalid spread {0} for parameter sampling")]
    InvalidSpread(f64),
    #[error("parameter configuration could not be parsed: {0}")]
    Json(String),
}

/// Errors raised while deciding on an acceleration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error("conflict control {control:?} at conflict {conflict:?} is not supported")]
    UnsupportedControl {
        conflict: ConflictId,
        control: ConflictControl,
    },
    #[error("distance {distance:.2} m can not be reached under free acceleration (covered {covered:.2} m)")]
    UnreachableDistance { distance: f64, covered: f64 },
}

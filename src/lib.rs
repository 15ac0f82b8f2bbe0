pub use acceleration::Acceleration;
pub use anticipation::Anticipation;
pub use conflict::{
    Conflict, ConflictApproach, ConflictControl, ConflictKind, YieldPlans,
};
pub use error::{Error, ParameterError};
pub use following::{CarFollowingModel, Driver, Headway, Idm};
pub use headway::{ConflictPosition, ConflictingVehicle, Leader, Overlap};
pub use light::{LightState, TrafficLightHeadway};
pub use params::{Constraint, ParameterType, Parameters};
pub use slotmap::{Key, KeyData};
pub use speed_limit::{SpeedLimitChange, SpeedLimitInfo, SpeedLimitKind, SpeedLimitProspect};
pub use vehicle::{Perception, Vehicle, VehicleAttributes};
use slotmap::new_key_type;

mod acceleration;
pub mod anticipation;
pub mod conflict;
mod error;
pub mod following;
mod headway;
pub mod light;
pub mod params;
pub mod speed_limit;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Conflict].
    pub struct ConflictId;
    /// Unique ID of a vehicle, own or conflicting.
    pub struct VehicleId;
}

/// The maximum deceleration of all vehicles in ms<sup>-2</sup>.
pub const MAX_DECELERATION: f64 = -6.0; // m/s^2

/// Speeds below this are treated as standing still, in m/s.
pub const STANDSTILL_SPEED: f64 = 1e-3; // m/s

/// Accelerations with a magnitude below this are treated as zero, in m/s<sup>2</sup>.
pub const ACCELERATION_EPSILON: f64 = 1e-9; // m/s^2

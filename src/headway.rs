use crate::following::Headway;
use crate::{VehicleId, STANDSTILL_SPEED};

/// A vehicle ahead in the own lane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leader {
    /// The leader's ID.
    pub id: VehicleId,
    /// The net distance to the leader's rear in m.
    pub distance: f64,
    /// The leader's speed in m/s.
    pub speed: f64,
}

impl Leader {
    /// The leader as seen by a car-following model.
    pub fn headway(&self) -> Headway {
        Headway::new(self.distance, self.speed)
    }
}

/// How much of a conflicting vehicle lies within the conflict zone,
/// measured along the conflicting vehicle's path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    /// The signed distance from the vehicle's front to the end of the zone,
    /// negative if the front has passed the end.
    pub front: f64,
    /// The signed distance from the start of the zone to the vehicle's rear,
    /// negative if the rear has not yet entered the zone.
    pub rear: f64,
    /// The length of the vehicle inside the zone in m.
    pub total: f64,
}

impl Overlap {
    /// The distance the vehicle needs to travel for its rear to leave the zone.
    pub fn clearing_distance(&self) -> f64 {
        self.total + f64::max(-self.rear, 0.0) + f64::max(self.front, 0.0)
    }
}

/// The position of a conflicting vehicle relative to a conflict zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConflictPosition {
    /// Fully downstream of the zone, `distance` from its end to the vehicle's rear.
    Ahead { distance: f64 },
    /// (Partially) on the zone.
    Parallel(Overlap),
    /// Fully upstream of the zone, `distance` from the vehicle's front to its start.
    Behind { distance: f64 },
}

/// A vehicle on a lane that crosses or merges with the own lane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConflictingVehicle {
    /// The vehicle's ID.
    pub id: VehicleId,
    /// The vehicle's position relative to the conflict.
    pub position: ConflictPosition,
    /// The vehicle's length in m.
    pub length: f64,
    /// The vehicle's speed in m/s.
    pub speed: f64,
    /// The vehicle's acceleration in m/s<sup>2</sup>.
    pub acceleration: f64,
}

impl ConflictingVehicle {
    /// The distance the vehicle has to travel before it enters the conflict.
    /// Zero if on or beyond the conflict.
    pub fn distance(&self) -> f64 {
        match self.position {
            ConflictPosition::Behind { distance } => distance,
            _ => 0.0,
        }
    }

    /// The overlap with the conflict, if the vehicle is on it.
    pub fn overlap(&self) -> Option<Overlap> {
        match self.position {
            ConflictPosition::Parallel(overlap) => Some(overlap),
            _ => None,
        }
    }

    pub fn is_ahead(&self) -> bool {
        matches!(self.position, ConflictPosition::Ahead { .. })
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self.position, ConflictPosition::Parallel(_))
    }

    /// Whether the vehicle is standing still.
    pub fn is_stationary(&self) -> bool {
        self.speed < STANDSTILL_SPEED
    }
}

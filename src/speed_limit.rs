//! Speed limits at and ahead of the vehicle, and the response to upcoming
//! curvature and speed bump zones.

use crate::acceleration::Acceleration;
use crate::error::ParameterError;
use crate::following::Driver;
use smallvec::SmallVec;

/// The source of a speed limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpeedLimitKind {
    /// The maximum speed of the vehicle.
    MaxVehicleSpeed,
    /// The legal speed limit, from signage or road class.
    Legal,
    /// The advisory speed of a curve.
    Curvature,
    /// The advisory speed of a speed bump.
    SpeedBump,
}

impl SpeedLimitKind {
    /// Whether drivers decelerate in advance of a zone of this kind.
    /// Legal limits are only followed once entered.
    pub fn is_anticipated(self) -> bool {
        matches!(self, SpeedLimitKind::Curvature | SpeedLimitKind::SpeedBump)
    }
}

/// The speed limits that apply at one location.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedLimitInfo {
    limits: SmallVec<[(SpeedLimitKind, f64); 4]>,
}

impl SpeedLimitInfo {
    /// Creates speed limit info with only the maximum vehicle speed, in m/s.
    pub fn new(max_vehicle_speed: f64) -> Self {
        let mut info = Self {
            limits: SmallVec::new(),
        };
        info.set(SpeedLimitKind::MaxVehicleSpeed, max_vehicle_speed);
        info
    }

    /// Adds a legal speed limit in m/s.
    pub fn with_legal_limit(self, speed: f64) -> Self {
        self.with_limit(SpeedLimitKind::Legal, speed)
    }

    /// Adds a speed limit of the given kind in m/s.
    pub fn with_limit(mut self, kind: SpeedLimitKind, speed: f64) -> Self {
        self.set(kind, speed);
        self
    }

    /// Sets the speed limit of the given kind in m/s.
    pub fn set(&mut self, kind: SpeedLimitKind, speed: f64) {
        match self.limits.iter_mut().find(|(k, _)| *k == kind) {
            Some(limit) => limit.1 = speed,
            None => self.limits.push((kind, speed)),
        }
    }

    /// Removes the speed limit of the given kind.
    pub fn clear(&mut self, kind: SpeedLimitKind) {
        self.limits.retain(|(k, _)| *k != kind);
    }

    /// Gets the speed limit of the given kind in m/s.
    pub fn get(&self, kind: SpeedLimitKind) -> Option<f64> {
        self.limits.iter().find(|(k, _)| *k == kind).map(|(_, v)| *v)
    }

    /// The desired speed, where `speed_factor` applies to the legal speed limit only.
    pub fn desired_speed(&self, speed_factor: f64) -> f64 {
        self.limits
            .iter()
            .map(|(kind, speed)| match kind {
                SpeedLimitKind::Legal => speed_factor * speed,
                _ => *speed,
            })
            .fold(f64::INFINITY, f64::min)
    }
}

/// A change of speed limit downstream of the vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedLimitChange {
    /// The distance to the change in m.
    pub distance: f64,
    /// The kind of speed limit that changes.
    pub kind: SpeedLimitKind,
    /// The new speed limit in m/s, or `None` if the limit ends.
    pub speed: Option<f64>,
}

/// The speed limits at the vehicle and the changes ahead.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedLimitProspect {
    current: SpeedLimitInfo,
    changes: Vec<SpeedLimitChange>,
}

impl SpeedLimitProspect {
    /// Creates a prospect with no changes ahead.
    pub fn new(current: SpeedLimitInfo) -> Self {
        Self {
            current,
            changes: vec![],
        }
    }

    /// Adds a change, keeping the changes sorted by distance.
    pub fn add_change(&mut self, change: SpeedLimitChange) {
        let idx = self
            .changes
            .iter()
            .position(|c| c.distance > change.distance)
            .unwrap_or(self.changes.len());
        self.changes.insert(idx, change);
    }

    /// The speed limits at the vehicle.
    pub fn current(&self) -> &SpeedLimitInfo {
        &self.current
    }

    /// The changes ahead, sorted by ascending distance.
    pub fn changes(&self) -> &[SpeedLimitChange] {
        &self.changes
    }

    /// The speed limits that apply at `distance` ahead.
    pub fn info_at(&self, distance: f64) -> SpeedLimitInfo {
        let mut info = self.current.clone();
        for change in self.changes.iter().take_while(|c| c.distance <= distance) {
            match change.speed {
                Some(speed) => info.set(change.kind, speed),
                None => info.clear(change.kind),
            }
        }
        info
    }
}

/// Determines the acceleration to comfortably reach the desired speed of
/// each upcoming curvature or speed bump zone.
pub fn respond_to_speed_limits(
    driver: &Driver,
    prospect: &SpeedLimitProspect,
) -> Result<Acceleration, ParameterError> {
    let mut a = Acceleration::Unconstrained;
    for change in prospect.changes() {
        if change.distance <= 0.0 || change.speed.is_none() || !change.kind.is_anticipated() {
            continue;
        }
        let info = prospect.info_at(change.distance);
        let target = driver.with_limits(&info).desired_speed()?;
        a = a.min(driver.approach_target_speed(change.distance, target)?.into());
    }
    Ok(a)
}

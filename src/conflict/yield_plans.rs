use crate::{ConflictId, VehicleId};
use slotmap::SecondaryMap;

/// The plans of a driver to yield at conflicts where it has priority.
///
/// Plans are remembered between evaluations for consistency. A driver that
/// decided to yield while the required deceleration was acceptable sticks to
/// that plan, even if the deceleration later slightly exceeds what is
/// acceptable due to numerical overshoot.
///
/// Each evaluation is a cycle: [YieldPlans::begin_cycle], any number of
/// [YieldPlans::affirm] calls, then [YieldPlans::end_cycle], which drops
/// every plan that was not affirmed within the cycle.
#[derive(Clone, Debug, Default)]
pub struct YieldPlans {
    plans: SecondaryMap<ConflictId, YieldPlan>,
}

#[derive(Clone, Copy, Debug)]
struct YieldPlan {
    /// The conflicting vehicle being yielded to.
    vehicle: VehicleId,
    /// Whether the plan was affirmed in the current cycle.
    affirmed: bool,
}

impl YieldPlans {
    pub fn new() -> Self {
        Default::default()
    }

    /// Starts an evaluation cycle.
    pub fn begin_cycle(&mut self) {
        for plan in self.plans.values_mut() {
            plan.affirmed = false;
        }
    }

    /// Sets or keeps the plan to yield to `vehicle` at `conflict`.
    pub fn affirm(&mut self, conflict: ConflictId, vehicle: VehicleId) {
        let previous = self.plans.insert(
            conflict,
            YieldPlan {
                vehicle,
                affirmed: true,
            },
        );
        if previous.map(|plan| plan.vehicle) != Some(vehicle) {
            log::debug!("yield plan at {:?} for {:?}", conflict, vehicle);
        }
    }

    /// Whether there is a plan to yield to `vehicle` at `conflict`.
    pub fn is_yielding_to(&self, conflict: ConflictId, vehicle: VehicleId) -> bool {
        self.plan_for(conflict) == Some(vehicle)
    }

    /// The vehicle being yielded to at `conflict`, if any.
    pub fn plan_for(&self, conflict: ConflictId) -> Option<VehicleId> {
        self.plans.get(conflict).map(|plan| plan.vehicle)
    }

    /// Ends an evaluation cycle, dropping the plans that were not affirmed.
    pub fn end_cycle(&mut self) {
        self.plans.retain(|conflict, plan| {
            if !plan.affirmed {
                log::debug!("yield plan at {:?} for {:?} abandoned", conflict, plan.vehicle);
            }
            plan.affirmed
        });
    }

    /// The number of plans.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

//! Tests that drive a single vehicle towards hazards.

use slotmap::SlotMap;
use traffic_conflicts::{
    Conflict, ConflictControl, ConflictId, ConflictKind, ConflictPosition, ConflictingVehicle,
    LightState, Perception, SpeedLimitInfo, SpeedLimitProspect, TrafficLightHeadway, Vehicle,
    VehicleAttributes, VehicleId,
};

const DT: f64 = 0.1;

fn attributes() -> VehicleAttributes {
    VehicleAttributes {
        length: 5.0,
        max_acc: 2.0,
        comf_dec: -2.0,
    }
}

fn prospect() -> SpeedLimitProspect {
    SpeedLimitProspect::new(SpeedLimitInfo::new(50.0).with_legal_limit(16.66))
}

/// Test that a vehicle's position increases monotonically.
#[test]
fn vehicle_drives_forward() {
    let mut vehicles = SlotMap::<VehicleId, ()>::with_key();
    let mut veh = Vehicle::new(vehicles.insert(()), &attributes()).unwrap();
    let prospect = prospect();
    let perception = Perception {
        leaders: &[],
        conflicts: &[],
        lights: &[],
        speed_limits: &prospect,
    };

    let mut pos = veh.pos();
    for _ in 0..100 {
        veh.plan(&perception).unwrap();
        veh.integrate(DT);
        assert!(veh.pos() > pos);
        pos = veh.pos();
    }
}

/// Test that a vehicle stops before a red light, and departs once it turns green.
#[test]
fn vehicle_stops_for_red_light() {
    let mut vehicles = SlotMap::<VehicleId, ()>::with_key();
    let mut veh = Vehicle::new(vehicles.insert(()), &attributes()).unwrap();
    veh.set_state(0.0, 10.0);
    let prospect = prospect();
    let stop_line = 100.0;

    let step = |veh: &mut Vehicle, state: LightState| {
        let lights = [TrafficLightHeadway {
            distance: stop_line - veh.pos(),
            state,
        }];
        let perception = Perception {
            leaders: &[],
            conflicts: &[],
            lights: &lights,
            speed_limits: &prospect,
        };
        veh.plan(&perception).unwrap();
        veh.integrate(DT);
    };

    for _ in 0..600 {
        step(&mut veh, LightState::Red);
        assert!(veh.pos() < stop_line);
    }
    assert!(veh.vel() < 0.5);
    assert!(veh.pos() > stop_line - 20.0);

    for _ in 0..200 {
        step(&mut veh, LightState::Green);
    }
    assert!(veh.pos() > stop_line);
}

/// Test that a vehicle gives way to a continuous stream of conflicting traffic.
#[test]
fn vehicle_gives_way_to_conflicting_stream() {
    let mut vehicles = SlotMap::<VehicleId, ()>::with_key();
    let mut conflicts = SlotMap::<ConflictId, ()>::with_key();
    let mut veh = Vehicle::new(vehicles.insert(()), &attributes()).unwrap();
    veh.set_state(0.0, 10.0);
    let prospect = prospect();
    let conflict_id = conflicts.insert(());
    let conflict_start = 60.0;
    let stream = ConflictingVehicle {
        id: vehicles.insert(()),
        position: ConflictPosition::Behind { distance: 10.0 },
        length: 4.0,
        speed: 10.0,
        acceleration: 0.0,
    };

    for _ in 0..600 {
        let conflicts = [Conflict::new(
            conflict_id,
            conflict_start - veh.pos(),
            5.0,
            ConflictKind::Crossing,
            ConflictControl::GiveWay,
        )
        .with_upstream([stream])];
        let perception = Perception {
            leaders: &[],
            conflicts: &conflicts,
            lights: &[],
            speed_limits: &prospect,
        };
        veh.plan(&perception).unwrap();
        veh.integrate(DT);
        assert!(veh.pos() < conflict_start);
    }
    assert!(veh.vel() < 0.5);
}

/// Test that a vehicle passes a conflict where it has priority without slowing down.
#[test]
fn vehicle_passes_priority_conflict() {
    let mut vehicles = SlotMap::<VehicleId, ()>::with_key();
    let mut conflicts = SlotMap::<ConflictId, ()>::with_key();
    let mut veh = Vehicle::new(vehicles.insert(()), &attributes()).unwrap();
    veh.set_state(0.0, 10.0);
    let prospect = prospect();
    let conflict_id = conflicts.insert(());
    let waiting = ConflictingVehicle {
        id: vehicles.insert(()),
        position: ConflictPosition::Behind { distance: 2.0 },
        length: 4.0,
        speed: 0.0,
        acceleration: 0.0,
    };

    let mut vel = veh.vel();
    while veh.pos() < 40.0 {
        let conflicts = [Conflict::new(
            conflict_id,
            40.0 - veh.pos(),
            5.0,
            ConflictKind::Crossing,
            ConflictControl::Priority,
        )
        .with_upstream([waiting])];
        let perception = Perception {
            leaders: &[],
            conflicts: &conflicts,
            lights: &[],
            speed_limits: &prospect,
        };
        veh.plan(&perception).unwrap();
        veh.integrate(DT);
        assert!(veh.vel() >= vel);
        vel = veh.vel();
    }
    assert!(veh.yield_plans().is_empty());
}

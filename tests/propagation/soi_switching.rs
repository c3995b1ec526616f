/*
    orrery, satellite trajectory propagation
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::earth_moon_registry;
use orrery::cosmic::SatelliteState;
use orrery::dynamics::Perturbations;
use orrery::linalg::Vector3;
use orrery::propagators::*;
use orrery::time::Unit;
use rstest::*;
use std::sync::Arc;

/// Leaves the Moon on an escape trajectory, away from the Earth.
fn lunar_escape(registry: &orrery::BodyRegistry) -> SatelliteState {
    SatelliteState::new(
        registry.epoch(),
        Vector3::new(20_000.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        301,
    )
}

#[test]
fn moon_to_earth_transition() {
    let _ = pretty_env_logger::try_init();
    let registry = Arc::new(earth_moon_registry());
    let request = PropagationRequest::builder()
        .initial_state(lunar_escape(&registry))
        .registry(registry.clone())
        .duration(Unit::Day * 1)
        .integrator(IntegratorKind::Verner56)
        .build();
    let outcome = propagate(&request).unwrap();
    assert!(!outcome.cancelled);

    // Exactly one change of central body
    assert_eq!(outcome.transitions.len(), 1, "{:?}", outcome.transitions);
    let transition = outcome.transitions[0];
    assert_eq!((transition.from, transition.to), (301, 399));
    assert_eq!(outcome.final_state.central, 399);
    assert_eq!(outcome.trajectory.transitions(), outcome.transitions);
    let segments = outcome.trajectory.segments();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].central, 301);
    assert_eq!(segments[1].central, 399);

    // The switch happens past the Moon SOI, with the hysteresis margin
    let last_lunar = segments[0].samples.last().unwrap();
    let first_terrestrial = segments[1].samples.first().unwrap();
    assert!(last_lunar.rmag_km() <= 66_100.0 * 1.01);
    let (moon_r, moon_v) = registry.relative_state(301, 399, transition.epoch).unwrap();
    let from_moon = first_terrestrial.position_km - moon_r;
    assert!(from_moon.norm() > 66_100.0 * 1.01);

    // The switch is an exact translation: integrating the last step around the Moon and translating the result
    // gives the first sample around the Earth
    let dt = (first_terrestrial.epoch - last_lunar.epoch).to_seconds();
    let v_after = first_terrestrial.velocity_km_s - moon_v;
    let predicted = last_lunar.position_km + 0.5 * dt * (last_lunar.velocity_km_s + v_after);
    let jump = (predicted - (first_terrestrial.position_km - moon_r)).norm();
    assert!(jump < 0.01, "jump of {jump} km");

    // The whole trajectory can be re-expressed around the Earth
    let around_earth = outcome.trajectory.rebased(&registry, 399).unwrap();
    assert_eq!(around_earth.segments().len(), 1);
    let jumps = around_earth
        .samples
        .windows(2)
        .map(|pair| (pair[1].position_km - pair[0].position_km).norm())
        .fold(0.0_f64, f64::max);
    // One minute steps at about 1.3 km/s at most
    assert!(jumps < 90.0, "{jumps}");
}

#[rstest]
fn escape_from_ten_thousand_km_altitude(
    #[values(
        IntegratorKind::Rk4,
        IntegratorKind::Verner56,
        IntegratorKind::Leapfrog,
        IntegratorKind::Hermite
    )]
    kind: IntegratorKind,
    #[values(Vector3::x(), Vector3::y(), -Vector3::z())] direction: Vector3<f64>,
) {
    let registry = Arc::new(earth_moon_registry());
    let r_km = registry.get(301).unwrap().equatorial_radius_km + 10_000.0;
    let start = SatelliteState::new(registry.epoch(), r_km * direction, 1.2 * direction, 301);
    let request = PropagationRequest::builder()
        .initial_state(start)
        .registry(registry.clone())
        .duration(Unit::Hour * 36)
        .integrator(kind)
        .perturbations(Perturbations::builder().third_body(true).build())
        .build();
    let outcome = propagate(&request).unwrap();

    assert_eq!(outcome.transitions.len(), 1, "{kind}: {:?}", outcome.transitions);
    let transition = outcome.transitions[0];
    assert_eq!((transition.from, transition.to), (301, 399), "{kind}");
    assert_eq!(outcome.final_state.central, 399);

    // No jump across the switch once both sides are expressed around the Moon
    let segments = outcome.trajectory.segments();
    let last_lunar = segments[0].samples.last().unwrap();
    let first_terrestrial = segments[1].samples.first().unwrap();
    let (moon_r, _) = registry.relative_state(301, 399, first_terrestrial.epoch).unwrap();
    let step = (first_terrestrial.position_km - moon_r - last_lunar.position_km).norm();
    let dt = (first_terrestrial.epoch - last_lunar.epoch).to_seconds();
    assert!(step < 1.5 * last_lunar.velocity_km_s.norm() * dt, "{kind}: step of {step} km");
}

#[test]
fn switching_can_be_disabled() {
    let registry = Arc::new(earth_moon_registry());
    let request = PropagationRequest::builder()
        .initial_state(lunar_escape(&registry))
        .registry(registry)
        .duration(Unit::Day * 1)
        .soi_switching(false)
        .build();
    let outcome = propagate(&request).unwrap();
    assert!(outcome.transitions.is_empty());
    assert_eq!(outcome.final_state.central, 301);
    assert_eq!(outcome.trajectory.segments().len(), 1);
}

#[test]
fn third_bodies_bend_the_escape() {
    let registry = Arc::new(earth_moon_registry());
    let ballistic = |perturbations: Perturbations| {
        let request = PropagationRequest::builder()
            .initial_state(lunar_escape(&registry))
            .registry(registry.clone())
            .duration(Unit::Hour * 6)
            .perturbations(perturbations)
            .build();
        propagate(&request).unwrap().final_state
    };
    let alone = ballistic(Perturbations::none());
    let perturbed = ballistic(Perturbations::builder().third_body(true).build());
    assert_eq!(alone.central, perturbed.central);
    let difference = (alone.position_km - perturbed.position_km).norm();
    // The Earth tide over six hours is tens of kilometers
    assert!(difference > 0.1 && difference < 1_000.0, "{difference}");
}

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
use orrery::cosmic::{assert_state_eq_or_abs, state_to_elements, SatelliteState};
use orrery::dynamics::{DynamicsError, OrbitalDynamics};
use orrery::linalg::Vector3;
use orrery::propagators::*;
use orrery::time::{Duration, Unit};
use rstest::*;

use super::EARTH_GM;

/// Near circular LEO: r = 6771 km, v = 7.67 km/s
fn leo(registry: &orrery::BodyRegistry) -> SatelliteState {
    SatelliteState::new(
        registry.epoch(),
        Vector3::new(6_771.0, 0.0, 0.0),
        Vector3::new(0.0, 7.67, 0.0),
        399,
    )
}

fn period(state: &SatelliteState, gm: f64) -> Duration {
    let elements =
        state_to_elements(&state.position_km, &state.velocity_km_s, gm, 399, state.epoch).unwrap();
    elements.period().unwrap()
}

#[rstest]
#[case(IntegratorKind::Rk4, 60.0, 1.0)]
#[case(IntegratorKind::Verner56, 60.0, 0.01)]
#[case(IntegratorKind::Hermite, 60.0, 1.0)]
#[case(IntegratorKind::Leapfrog, 5.0, 1.0)]
fn leo_closes_after_one_period(
    #[case] kind: IntegratorKind,
    #[case] step_s: f64,
    #[case] tolerance_km: f64,
) {
    let _ = pretty_env_logger::try_init();
    let registry = earth_moon_registry();
    let start = leo(&registry);
    let orbit_period = period(&start, registry.gm(399).unwrap());
    assert!((orbit_period.to_seconds() - 5_539.2).abs() < 1.0);

    let prop = Propagator::new(
        OrbitalDynamics::two_body(),
        kind,
        PropOpts::with_fixed_step_s(step_s),
    );
    let mut instance = prop.with(start, &registry);
    let end = instance.for_duration(orbit_period).unwrap();

    assert_eq!(end.epoch, start.epoch + orbit_period);
    assert_eq!(end.central, 399);
    let error = (end.position_km - start.position_km).norm();
    println!("{kind} with {step_s} s: {error:.3e} km after one orbit");
    assert!(error < tolerance_km, "{kind}: {error} km");
    assert!(instance.transitions.is_empty());
}

#[rstest]
#[case(IntegratorKind::Rk4)]
#[case(IntegratorKind::Verner56)]
#[case(IntegratorKind::Hermite)]
fn convergence_order(#[case] kind: IntegratorKind) {
    let registry = earth_moon_registry();
    let start = leo(&registry);
    let orbit_period = period(&start, registry.gm(399).unwrap());

    // Reference from the highest order scheme with a tiny step
    let reference = Propagator::verner56(OrbitalDynamics::two_body(), PropOpts::with_fixed_step_s(5.0))
        .with(start, &registry)
        .for_duration(orbit_period)
        .unwrap();

    let error_with = |step_s: f64| {
        let prop = Propagator::new(
            OrbitalDynamics::two_body(),
            kind,
            PropOpts::with_fixed_step_s(step_s),
        );
        let end = prop.with(start, &registry).for_duration(orbit_period).unwrap();
        (end.position_km - reference.position_km).norm()
    };
    let coarse = error_with(120.0);
    let fine = error_with(60.0);
    let observed_order = (coarse / fine).log2();
    let expected_order = f64::from(Stepper::new(kind).order());
    assert!(
        observed_order > expected_order - 1.0,
        "{kind}: order {observed_order:.2} (coarse {coarse:e}, fine {fine:e})"
    );
}

#[test]
fn leapfrog_energy_is_bounded_over_a_thousand_orbits() {
    let _ = pretty_env_logger::try_init();
    let registry = earth_moon_registry();
    let mut state = leo(&registry);
    let energy = |s: &SatelliteState| s.specific_energy(EARTH_GM);
    let initial_energy = energy(&state);
    let orbit_period = period(&state, EARTH_GM).to_seconds();

    let point_mass = |s: &SatelliteState| -> Result<Vector3<f64>, DynamicsError> {
        Ok(-EARTH_GM * s.position_km / s.rmag_km().powi(3))
    };

    let step_s = 30.0;
    let steps = (1000.0 * orbit_period / step_s) as usize;
    let window = (10.0 * orbit_period / step_s) as usize;
    let mut stepper = Stepper::new(IntegratorKind::Leapfrog);
    let (mut early, mut late, mut worst) = (0.0_f64, 0.0_f64, 0.0_f64);
    for i in 0..steps {
        state = stepper.step(&state, step_s, &point_mass).unwrap();
        let drift = ((energy(&state) - initial_energy) / initial_energy).abs();
        worst = worst.max(drift);
        if i < window {
            early = early.max(drift);
        } else if i >= steps - window {
            late = late.max(drift);
        }
    }
    println!("leapfrog relative energy error: {early:e} early, {late:e} late, {worst:e} worst");
    assert!(worst < 1e-6, "worst relative energy error {worst:e}");
    // Oscillating but not drifting
    assert!(late < 1.01 * early + 1e-12);
}

#[test]
fn backward_propagation_returns_to_the_start() {
    let registry = earth_moon_registry();
    let start = leo(&registry);
    let prop = Propagator::verner56(OrbitalDynamics::two_body(), PropOpts::with_fixed_step_s(30.0));
    let forward = prop.with(start, &registry).for_duration(Unit::Hour * 3).unwrap();
    let (back, traj) = prop
        .with(forward, &registry)
        .for_duration_with_traj(-(Unit::Hour * 3))
        .unwrap();
    assert_state_eq_or_abs(&back, &start, 1e-6, "backward propagation");
    // The trajectory is chronological even when propagating backward
    assert_eq!(traj.first().unwrap().epoch, start.epoch);
    assert_eq!(traj.last().unwrap().epoch, forward.epoch);
    assert_eq!(traj.len(), 3 * 120 + 1);
}

#[test]
fn dynamics_errors_carry_the_last_sample() {
    let registry = earth_moon_registry();
    // The midpoint stage of the first step lands exactly on the center of the Earth
    let start = SatelliteState::new(
        registry.epoch(),
        Vector3::new(6_000.0, 0.0, 0.0),
        Vector3::new(-20.0, 0.0, 0.0),
        399,
    );
    let prop = Propagator::rk4(OrbitalDynamics::two_body(), PropOpts::with_fixed_step_s(600.0));
    let mut instance = prop.with(start, &registry);
    let err = instance.for_duration(Unit::Hour * 1).unwrap_err();
    assert!(matches!(err, PropagationError::Dynamics { .. }), "{err}");
    assert_eq!(err.last_sample(), Some(&start.sample()));
    // The instance stays at the last valid state
    assert_eq!(instance.state, start);
}

#[test]
fn configuration_errors_before_stepping() {
    let registry = earth_moon_registry();
    let prop = Propagator::default(OrbitalDynamics::two_body());

    let mut lost = leo(&registry);
    lost.central = 12345;
    let mut instance = prop.with(lost, &registry);
    assert!(matches!(
        instance.for_duration(Unit::Minute * 10),
        Err(PropagationError::PropConfig { .. })
    ));
    assert_eq!(instance.steps_taken(), 0);

    let mut nan = leo(&registry);
    nan.velocity_km_s[1] = f64::NAN;
    assert!(matches!(
        prop.with(nan, &registry).for_duration(Unit::Minute * 10),
        Err(PropagationError::PropConfig { .. })
    ));

    let mut zero_step = prop.with(leo(&registry), &registry);
    zero_step.set_step(Duration::ZERO);
    assert!(matches!(
        zero_step.for_duration(Unit::Minute * 10),
        Err(PropagationError::PropConfig { .. })
    ));
}

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
use orrery::cosmic::{elements_to_state, OrbitalElements, SatelliteState};
use orrery::dynamics::OrbitalDynamics;
use orrery::md::{ApsisKind, ApsisSearch};
use orrery::propagators::*;
use orrery::time::Unit;
use orrery::utils::rss_state_errors;

/// Ellipse of periapsis 7000 km and apoapsis 13000 km, shortly after periapsis.
fn ellipse(registry: &orrery::BodyRegistry) -> OrbitalElements {
    OrbitalElements::new(
        10_000.0,
        0.3,
        0.5,
        0.2,
        1.0,
        0.5,
        registry.gm(399).unwrap(),
        399,
        registry.epoch(),
    )
}

fn start_state(elements: &OrbitalElements) -> SatelliteState {
    let (position_km, velocity_km_s) = elements_to_state(elements).unwrap();
    SatelliteState::new(elements.epoch, position_km, velocity_km_s, 399)
}

#[test]
fn apsides_of_a_propagated_ellipse() {
    let _ = pretty_env_logger::try_init();
    let registry = earth_moon_registry();
    let elements = ellipse(&registry);
    let period = elements.period().unwrap();

    let prop = Propagator::verner56(OrbitalDynamics::two_body(), PropOpts::with_fixed_step_s(30.0));
    let (_, traj) = prop
        .with(start_state(&elements), &registry)
        .for_duration_with_traj(period * 3)
        .unwrap();

    let apsides = traj.apsides().unwrap();
    assert_eq!(apsides.len(), 6, "{apsides:?}");
    assert_eq!(apsides[0].kind, ApsisKind::Apoapsis);
    for pair in apsides.windows(2) {
        assert_ne!(pair[0].kind, pair[1].kind);
        assert!(pair[0].epoch < pair[1].epoch);
    }

    // Time of the first periapsis from the mean anomaly at the start
    let to_periapsis = (std::f64::consts::TAU - elements.ma_rad().unwrap())
        / elements.mean_motion_rad_s();
    let expected = elements.epoch + Unit::Second * to_periapsis;
    let periapsis = traj
        .next_apsis(elements.epoch, Some(ApsisKind::Periapsis))
        .unwrap()
        .unwrap();
    assert!(
        (periapsis.epoch - expected).abs() < Unit::Second * 2,
        "{} vs {expected}",
        periapsis.epoch
    );

    for event in &apsides {
        let expected_km = match event.kind {
            ApsisKind::Periapsis => elements.periapsis_km(),
            ApsisKind::Apoapsis => elements.apoapsis_km(),
        };
        assert!(
            (event.distance_km - expected_km).abs() < 0.5,
            "{event}: expected {expected_km} km"
        );
        // The velocity is perpendicular to the radius at an apsis
        let cos_angle = event.position_km.dot(&event.velocity_km_s)
            / (event.position_km.norm() * event.velocity_km_s.norm());
        assert!(cos_angle.abs() < 1e-3, "{event}: {cos_angle}");
    }

    // Nothing is found past the last sample
    let last = traj.last().unwrap().epoch;
    assert!(traj.next_apsis(last, None).unwrap().is_none());
}

#[test]
fn interpolation_matches_propagation() {
    let registry = earth_moon_registry();
    let elements = ellipse(&registry);
    let prop = Propagator::verner56(OrbitalDynamics::two_body(), PropOpts::with_fixed_step_s(30.0));
    let (end, traj) = prop
        .with(start_state(&elements), &registry)
        .until_epoch_with_traj(elements.epoch + Unit::Hour * 2)
        .unwrap();
    let traj = traj.with_name("ellipse");
    assert_eq!(traj.last().unwrap().epoch, end.epoch);
    assert!(format!("{traj}").starts_with("Trajectory of ellipse from"));

    for offset_s in [0.0, 1_234.5, 4_000.25, 7_199.0] {
        let epoch = elements.epoch + Unit::Second * offset_s;
        let interpolated = traj.at(epoch).unwrap();
        let direct = prop
            .with(start_state(&elements), &registry)
            .until_epoch(epoch)
            .unwrap();
        let (error_km, error_km_s) = rss_state_errors(
            (&interpolated.position_km, &interpolated.velocity_km_s),
            (&direct.position_km, &direct.velocity_km_s),
        );
        assert!(error_km < 1e-3, "{offset_s} s: {error_km} km");
        assert!(error_km_s < 1e-4, "{offset_s} s: {error_km_s} km/s");
        assert_eq!(interpolated.central, 399);
    }

    assert!(traj.at(elements.epoch - Unit::Second * 1).is_err());
    assert!(traj.at(elements.epoch + Unit::Hour * 3).is_err());
}

#[test]
fn search_extends_past_the_trajectory() {
    let registry = earth_moon_registry();
    let elements = ellipse(&registry);
    let period = elements.period().unwrap();
    let prop = Propagator::verner56(OrbitalDynamics::two_body(), PropOpts::with_fixed_step_s(30.0));
    let start = start_state(&elements);
    let (_, traj) = prop
        .with(start, &registry)
        .for_duration_with_traj(period)
        .unwrap();
    let end = traj.last().unwrap().epoch;
    let known = traj.apsides().unwrap();
    assert_eq!(known.len(), 2);

    let mut search = ApsisSearch::extending(traj, &prop, &registry, &start);
    let apoapsis = search
        .find_next_apsis(end, Some(ApsisKind::Apoapsis))
        .unwrap()
        .unwrap();
    // One period after the first apoapsis
    let first_apoapsis = known
        .iter()
        .find(|event| event.kind == ApsisKind::Apoapsis)
        .unwrap();
    let lag = (apoapsis.epoch - first_apoapsis.epoch - period).abs();
    assert!(lag < Unit::Second * 2, "{lag}");
    assert!((apoapsis.distance_km - elements.apoapsis_km()).abs() < 0.5);
    assert!(search.trajectory().last().unwrap().epoch > apoapsis.epoch);

    // The extended trajectory is a continuation of the original one
    let extended = search.into_trajectory();
    assert_eq!(extended.segments().len(), 1);
    assert_eq!(extended.first().unwrap().epoch, start.epoch);
    let lengths: Vec<_> = extended
        .samples
        .windows(2)
        .map(|pair| (pair[1].epoch - pair[0].epoch).to_seconds())
        .collect();
    // Fixed steps, except for the shorter last step of the original propagation
    assert!(lengths.iter().all(|dt| *dt > 0.0 && *dt < 30.0 + 1e-6), "{lengths:?}");
    assert!(lengths.iter().filter(|dt| (*dt - 30.0).abs() > 1e-6).count() <= 1);
}

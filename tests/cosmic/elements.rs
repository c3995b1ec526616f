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

use orrery::cosmic::{elements_to_state, state_to_elements, OrbitalElements, ECC_EPSILON};
use orrery::linalg::Vector3;
use orrery::time::Epoch;
use orrery::DomainError;
use rstest::*;
use std::f64::consts::PI;

const EARTH_GM: f64 = 398_600.435_507;

#[fixture]
fn epoch() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2024, 3, 20)
}

#[rstest]
fn geo_elements(epoch: Epoch) {
    let _ = pretty_env_logger::try_init();
    let sma = 42_164.0;
    let speed = (EARTH_GM / sma).sqrt();
    let r = Vector3::new(sma * 0.6, sma * 0.8, 0.0);
    let v = Vector3::new(-speed * 0.8, speed * 0.6, 0.0);
    let elements = state_to_elements(&r, &v, EARTH_GM, 399, epoch).unwrap();
    assert!((elements.sma_km - sma).abs() < 1.0, "{elements}");
    assert!(elements.ecc < 1e-3);
    assert!(elements.circular && elements.equatorial);
    // About a sidereal day
    let period = elements.period().unwrap();
    assert!((period.to_seconds() - 86_164.0).abs() < 1.0, "{period}");
}

#[rstest]
#[case(7_000.0, 0.001, 28.5, 45.0, 30.0, 10.0)]
#[case(26_600.0, 0.74, 63.4, 200.0, 270.0, 180.0)]
#[case(12_000.0, 0.3, 98.0, 300.0, 90.0, 350.0)]
#[case(-20_000.0, 1.5, 10.0, 0.5, 60.0, 30.0)]
fn circular_round_trip(
    epoch: Epoch,
    #[case] sma_km: f64,
    #[case] ecc: f64,
    #[case] inc_deg: f64,
    #[case] raan_deg: f64,
    #[case] aop_deg: f64,
    #[case] ta_deg: f64,
) {
    let elements = OrbitalElements::new(
        sma_km,
        ecc,
        inc_deg.to_radians(),
        raan_deg.to_radians(),
        aop_deg.to_radians(),
        ta_deg.to_radians(),
        EARTH_GM,
        399,
        epoch,
    );
    let (r, v) = elements_to_state(&elements).unwrap();
    let back = state_to_elements(&r, &v, EARTH_GM, 399, epoch).unwrap();
    assert!((back.sma_km - sma_km).abs() < 1e-6 * sma_km.abs(), "{back}");
    assert!((back.ecc - ecc).abs() < 1e-9);
    assert!((back.inc_deg() - inc_deg).abs() < 1e-9);
    assert!((back.raan_deg() - raan_deg).abs() < 1e-5);
    assert!((back.aop_deg() - aop_deg).abs() < 1e-5);
    assert!((back.ta_deg() - ta_deg).abs() < 1e-5);

    // And the state itself survives the round trip
    let (r2, v2) = elements_to_state(&back).unwrap();
    assert!((r2 - r).norm() < 1e-6);
    assert!((v2 - v).norm() < 1e-9);
}

#[rstest]
fn near_circular_is_flagged(epoch: Epoch) {
    let radius = 6_771.0;
    let speed = (EARTH_GM / radius).sqrt();
    let (s, c) = (0.4_f64).sin_cos();
    let r = Vector3::new(radius, 0.0, 0.0);
    let v = Vector3::new(0.0, speed * c, speed * s);
    let elements = state_to_elements(&r, &v, EARTH_GM, 399, epoch).unwrap();
    assert!(elements.ecc < ECC_EPSILON);
    assert!(elements.circular);
    assert!(!elements.equatorial);
    assert_eq!(elements.aop_rad, 0.0);
    // On the ascending node, the argument of latitude is zero
    assert!(elements.ta_rad.abs() < 1e-9 || (elements.ta_rad - 2.0 * PI).abs() < 1e-9);
    assert!((elements.inc_rad - 0.4).abs() < 1e-12);
}

#[rstest]
fn degenerate_geometry_is_an_error(epoch: Epoch) {
    assert!(matches!(
        state_to_elements(&Vector3::zeros(), &Vector3::new(0.0, 7.5, 0.0), EARTH_GM, 399, epoch),
        Err(DomainError::ZeroRadius { .. })
    ));
    assert!(matches!(
        state_to_elements(
            &Vector3::new(7000.0, 0.0, 0.0),
            &Vector3::new(3.0, 0.0, 0.0),
            EARTH_GM,
            399,
            epoch
        ),
        Err(DomainError::Rectilinear { .. })
    ));
    assert!(matches!(
        state_to_elements(
            &Vector3::new(7000.0, 0.0, 0.0),
            &Vector3::new(0.0, 7.5, 0.0),
            0.0,
            399,
            epoch
        ),
        Err(DomainError::InvalidGm { .. })
    ));
    let escape = (2.0 * EARTH_GM / 7000.0).sqrt();
    assert!(matches!(
        state_to_elements(
            &Vector3::new(7000.0, 0.0, 0.0),
            &Vector3::new(0.0, escape, 0.0),
            EARTH_GM,
            399,
            epoch
        ),
        Err(DomainError::Parabolic { .. })
    ));
}

#[rstest]
#[case(10_000.0, 0.3, 1.0)]
#[case(-12_000.0, 1.4, 0.6)]
fn invariants_match_the_state(
    epoch: Epoch,
    #[case] sma: f64,
    #[case] ecc: f64,
    #[case] ta_rad: f64,
) {
    let elements = OrbitalElements::new(sma, ecc, 0.4, 1.2, 2.1, ta_rad, EARTH_GM, 399, epoch);
    assert_eq!(elements.is_hyperbolic(), ecc > 1.0);
    let (r, v) = elements_to_state(&elements).unwrap();

    let energy = v.norm_squared() / 2.0 - EARTH_GM / r.norm();
    assert!((elements.energy_km2_s2() - energy).abs() < 1e-10 * energy.abs());
    let hmag = r.cross(&v).norm();
    assert!((elements.hmag_km2_s() - hmag).abs() < 1e-10 * hmag);

    // Kepler's equation links the eccentric (or hyperbolic) anomaly to the mean anomaly
    let anomaly = elements.ea_rad().unwrap();
    let ma = elements.ma_rad().unwrap();
    let kepler = if ecc < 1.0 {
        anomaly - ecc * anomaly.sin()
    } else {
        ecc * anomaly.sinh() - anomaly
    };
    assert!((kepler - ma).abs() < 1e-12, "{kepler} vs {ma}");
}

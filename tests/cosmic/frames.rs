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

use crate::solar_system;
use orrery::cosmic::{BodyId, Frame, FrameError, FrameKind, FrameTransform, SatelliteState};
use orrery::linalg::Vector3;
use orrery::time::Unit;
use rstest::*;

#[rstest]
#[case(399)]
#[case(499)]
#[case(301)]
#[case(599)]
fn planet_fixed_round_trip(#[case] body: BodyId) {
    let _ = pretty_env_logger::try_init();
    let registry = solar_system();
    let epoch = registry.epoch() + Unit::Day * 12.5;
    let transform = FrameTransform::new(&registry);

    let r = Vector3::new(6_500.0, -1_200.0, 3_300.0);
    let v = Vector3::new(0.5, 7.1, -1.2);
    let (r_i, v_i) = transform
        .change_frame(&r, &v, Frame::fixed(body), Frame::inertial(body), epoch)
        .unwrap();
    // The rotation preserves the distance to the center
    assert!((r_i.norm() - r.norm()).abs() < 1e-9 * r.norm());
    let (r_f, v_f) = transform
        .change_frame(&r_i, &v_i, Frame::inertial(body), Frame::fixed(body), epoch)
        .unwrap();
    assert!((r_f - r).norm() < 1e-9 * r.norm(), "{}", (r_f - r).norm());
    assert!((v_f - v).norm() < 1e-9 * v.norm());
}

#[test]
fn transforms_compose() {
    let registry = solar_system();
    let epoch = registry.epoch() + Unit::Hour * 30;
    let transform = FrameTransform::new(&registry);
    let r = Vector3::new(7_000.0, 10.0, -25.0);
    let v = Vector3::new(-0.1, 0.2, 7.5);

    // Planet fixed to barycentric, directly and through the inertial frame
    let (r_direct, v_direct) = transform
        .transform(&r, &v, FrameKind::PlanetFixed, FrameKind::Barycentric, 399, epoch)
        .unwrap();
    let (r_pi, v_pi) = transform
        .transform(&r, &v, FrameKind::PlanetFixed, FrameKind::PlanetInertial, 399, epoch)
        .unwrap();
    let (r_two, v_two) = transform
        .transform(&r_pi, &v_pi, FrameKind::PlanetInertial, FrameKind::Barycentric, 399, epoch)
        .unwrap();
    // Barycentric positions are around 1.5e8 km
    assert!((r_direct - r_two).norm() < 1e-6, "{}", (r_direct - r_two).norm());
    assert!((v_direct - v_two).norm() < 1e-9);

    // Moon inertial to Earth inertial, directly and through the barycentric frame
    let (r_direct, v_direct) = transform
        .change_frame(&r, &v, Frame::inertial(301), Frame::inertial(399), epoch)
        .unwrap();
    let (r_bary, v_bary) = transform
        .change_frame(&r, &v, Frame::inertial(301), Frame::barycentric(0), epoch)
        .unwrap();
    let (r_two, v_two) = transform
        .change_frame(&r_bary, &v_bary, Frame::barycentric(0), Frame::inertial(399), epoch)
        .unwrap();
    assert!((r_direct - r_two).norm() < 1e-6);
    assert!((v_direct - v_two).norm() < 1e-9);
    // The Moon is about 384,000 km away from the Earth
    let moon_distance = (r_direct - r).norm();
    assert!(moon_distance > 350_000.0 && moon_distance < 410_000.0, "{moon_distance}");
}

#[rstest]
#[case(0.0, 0.0, 0.0)]
#[case(45.5, 120.0, 0.4)]
#[case(-33.9, 18.4, 1.2)]
#[case(89.9, 300.0, 550.0)]
fn geodetic_round_trip(#[case] lat: f64, #[case] long: f64, #[case] height: f64) {
    let registry = solar_system();
    let transform = FrameTransform::new(&registry);
    let fixed = transform.geodetic_to_body_fixed(lat, long, height, 399).unwrap();
    let (lat2, long2, height2) = transform.body_fixed_to_geodetic(&fixed, 399).unwrap();
    assert!((lat2 - lat).abs() < 1e-8, "{lat2}");
    assert!((long2 - long).abs() < 1e-8, "{long2}");
    assert!((height2 - height).abs() < 1e-5, "{height2}");
}

#[test]
fn launch_site_moves_with_the_earth() {
    let registry = solar_system();
    let epoch = registry.epoch();
    let transform = FrameTransform::new(&registry);
    // Kourou
    let state = transform.launch_state(5.16, 307.2, 0.0, 399, epoch).unwrap();
    assert_eq!(state.central, 399);
    assert_eq!(state.epoch, epoch);
    let omega = registry.angular_velocity(399, epoch).unwrap();
    assert!((omega.norm() - 7.292_115e-5).abs() < 1e-9);
    let expected = omega.cross(&state.position_km);
    assert!((state.velocity_km_s - expected).norm() < 1e-12);
    // About 463 m/s near the equator
    assert!((state.vmag_km_s() - 0.463).abs() < 0.005, "{}", state.vmag_km_s());
    assert!(state.position_km.dot(&state.velocity_km_s).abs() < 1e-6);
}

#[test]
fn unknown_body() {
    let registry = solar_system();
    let transform = FrameTransform::new(&registry);
    let r = Vector3::new(7_000.0, 0.0, 0.0);
    assert!(matches!(
        transform.change_frame(&r, &r, Frame::inertial(399), Frame::inertial(12345), registry.epoch()),
        Err(FrameError::FrameConfig { .. })
    ));
    let nan = Vector3::new(f64::NAN, 0.0, 0.0);
    assert!(matches!(
        transform.transform(&nan, &r, FrameKind::PlanetFixed, FrameKind::PlanetInertial, 399, registry.epoch()),
        Err(FrameError::FrameDomain { .. })
    ));
}

#[test]
fn satellite_state_in_another_frame() {
    let registry = solar_system();
    let transform = FrameTransform::new(&registry);
    let state = SatelliteState::new(
        registry.epoch() + Unit::Day * 2,
        Vector3::new(2_500.0, -300.0, 100.0),
        Vector3::new(0.1, 1.6, -0.2),
        301,
    );
    let around_earth = transform.state_in(&state, Frame::inertial(399)).unwrap();
    let (moon_r, moon_v) = registry.relative_state(301, 399, state.epoch).unwrap();
    assert!((around_earth.0 - (state.position_km + moon_r)).norm() < 1e-6);
    assert!((around_earth.1 - (state.velocity_km_s + moon_v)).norm() < 1e-9);
    // Its own inertial frame is the identity
    let same = transform.state_in(&state, Frame::inertial(301)).unwrap();
    assert_eq!(same, (state.position_km, state.velocity_km_s));
}

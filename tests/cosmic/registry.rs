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

use crate::{earth_moon_registry, solar_system};
use orrery::cosmic::{BodyKind, EphemerisCache, EphemerisMode, SolarSystemCatalog};
use orrery::io::ConfigError;
use orrery::time::Unit;

#[test]
fn embedded_hierarchy() {
    let _ = pretty_env_logger::try_init();
    let registry = solar_system();
    assert_eq!(registry.mode(), EphemerisMode::Keplerian);
    assert_eq!(registry.root(), 0);
    assert_eq!(registry.id_by_name("moon").unwrap(), 301);
    assert_eq!(registry.kind(301).unwrap(), BodyKind::Moon);
    // Barycenters are transparent: the Moon orbits the Earth, the Earth orbits the Sun
    assert_eq!(registry.dynamical_parent(301).unwrap(), Some(399));
    assert_eq!(registry.dynamical_parent(399).unwrap(), Some(10));
    assert_eq!(registry.soi_primary(3), Some(399));
    assert_eq!(registry.soi_primary(399), None);
    assert!(registry.soi_radius(0).unwrap().is_infinite());
    let moon_soi = registry.soi_radius(301).unwrap();
    assert!((moon_soi - 66_000.0).abs() < 3_000.0, "{moon_soi}");
    // Galilean moons carry their own gravity
    let io_gm = registry.gm(501).unwrap();
    assert!((io_gm - 5_959.9).abs() < 1.0, "{io_gm}");
    assert!(matches!(registry.gm(12345), Err(ConfigError::MissingBody { id: 12345 })));
}

#[test]
fn relative_states_are_antisymmetric() {
    let registry = solar_system();
    let epoch = registry.epoch() + Unit::Day * 100;
    for (a, b) in [(301, 399), (499, 399), (501, 599), (10, 801)] {
        let (r_ab, v_ab) = registry.relative_state(a, b, epoch).unwrap();
        let (r_ba, v_ba) = registry.relative_state(b, a, epoch).unwrap();
        assert!((r_ab + r_ba).norm() < 1e-6 * r_ab.norm(), "{a} vs {b}");
        assert!((v_ab + v_ba).norm() < 1e-9 * v_ab.norm().max(1.0));
    }
}

#[test]
fn frozen_registry_ignores_time() {
    let registry = earth_moon_registry();
    let later = registry.epoch() + Unit::Day * 3;
    assert_eq!(
        registry.relative_state(301, 399, registry.epoch()).unwrap(),
        registry.relative_state(301, 399, later).unwrap()
    );
}

#[test]
fn snapshots_through_a_bounded_cache() {
    let catalog = SolarSystemCatalog::embedded().unwrap();
    let mut cache = EphemerisCache::new(catalog.bodies.len());
    for day in 0..3 {
        let epoch = catalog.epoch + Unit::Day * day;
        let snap = catalog.snapshot(epoch, &mut cache).unwrap();
        assert_eq!(snap.mode(), EphemerisMode::Frozen);
        assert!(cache.len() <= cache.capacity());
    }
    // Only the last snapshot still fits in the cache
    let (hits, _) = cache.stats();
    assert_eq!(hits, 0);
    catalog.snapshot(catalog.epoch + Unit::Day * 2, &mut cache).unwrap();
    let (hits, _) = cache.stats();
    assert_eq!(hits, catalog.bodies.len());
}

#[test]
fn cached_barycentric_states() {
    let registry = solar_system();
    let mut cache = EphemerisCache::new(16);
    let epoch = registry.epoch() + Unit::Day * 40;
    for id in [301, 399, 501] {
        let direct = registry.barycentric_state(id, epoch).unwrap();
        let first = registry
            .barycentric_state_cached(id, epoch, &mut cache)
            .unwrap();
        let second = registry
            .barycentric_state_cached(id, epoch, &mut cache)
            .unwrap();
        assert_eq!(first, direct);
        assert_eq!(second, direct);
    }
    let (hits, _) = cache.stats();
    assert!(hits > 0);
    assert!(cache.len() <= cache.capacity());
    cache.clear();
    assert_eq!(cache.len(), 0);

    assert!(registry.is_descendant(301, 3));
    assert!(registry.is_descendant(301, 0));
    assert!(!registry.is_descendant(399, 301));
    assert!(!registry.is_descendant(0, 0));
}

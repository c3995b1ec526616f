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
use orrery::cosmic::{SatelliteState, TrajectorySample};
use orrery::dynamics::{OrbitalDynamics, Perturbations};
use orrery::linalg::Vector3;
use orrery::propagators::*;
use orrery::time::Unit;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;

fn leo(registry: &orrery::BodyRegistry) -> SatelliteState {
    SatelliteState::new(
        registry.epoch(),
        Vector3::new(6_771.0, 0.0, 0.0),
        Vector3::new(0.0, 5.2, 5.6),
        399,
    )
    .with_drag(500.0, 5.0, 2.2)
}

#[test]
fn parallel_requests_match_sequential_ones() {
    let _ = pretty_env_logger::try_init();
    let registry = Arc::new(earth_moon_registry());
    let requests: Vec<_> = enum_iterator::all::<IntegratorKind>()
        .map(|kind| {
            PropagationRequest::builder()
                .initial_state(leo(&registry))
                .registry(registry.clone())
                .duration(Unit::Hour * 2)
                .step(Unit::Second * 20)
                .integrator(kind)
                .build()
        })
        .collect();
    assert_eq!(requests.len(), 4);

    let parallel = propagate_many(&requests);
    for (request, outcome) in requests.iter().zip(parallel) {
        let outcome = outcome.unwrap();
        let sequential = propagate(request).unwrap();
        // Deterministic: the same request always gives the same trajectory
        assert_eq!(outcome.final_state, sequential.final_state);
        assert_eq!(outcome.trajectory, sequential.trajectory);
        assert_eq!(outcome.trajectory.len(), 2 * 180 + 1);
    }
}

#[test]
fn one_failure_does_not_stop_the_others() {
    let registry = Arc::new(earth_moon_registry());
    let good = PropagationRequest::builder()
        .initial_state(leo(&registry))
        .registry(registry.clone())
        .duration(Unit::Minute * 30)
        .build();
    let mut lost_state = leo(&registry);
    lost_state.central = 42;
    let bad = PropagationRequest::builder()
        .initial_state(lost_state)
        .registry(registry)
        .duration(Unit::Minute * 30)
        .build();
    let results = propagate_many(&[good.clone(), bad, good]);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(PropagationError::PropConfig { .. })));
    assert!(results[2].is_ok());
}

#[test]
fn cancelled_before_starting() {
    let registry = Arc::new(earth_moon_registry());
    let token = CancelToken::new();
    token.cancel();
    let request = PropagationRequest::builder()
        .initial_state(leo(&registry))
        .registry(registry)
        .duration(Unit::Day * 10)
        .cancel(token)
        .build();
    let outcome = propagate(&request).unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.trajectory.len(), 1);
    assert_eq!(outcome.final_state, request.initial_state);
}

/// Cancels the propagation as soon as it receives its first batch.
struct CancelOnFirstBatch {
    token: CancelToken,
    received: Vec<TrajectorySample>,
}

impl TrajectorySink for CancelOnFirstBatch {
    fn accept(&mut self, batch: &[TrajectorySample]) {
        self.received.extend_from_slice(batch);
        self.token.cancel();
    }
}

#[test]
fn cancelled_mid_flight() {
    let registry = earth_moon_registry();
    let token = CancelToken::new();
    let opts = PropOpts::builder()
        .step(Unit::Minute * 1)
        .batch_size(10)
        .cancel_check_interval(5)
        .cancel(token.clone())
        .build();
    let prop = Propagator::rk4(OrbitalDynamics::two_body(), opts);
    let start = leo(&registry);
    let mut sink = CancelOnFirstBatch {
        token,
        received: Vec::new(),
    };
    let mut instance = prop.with(start, &registry);
    let end = instance
        .propagate_incremental(Unit::Day * 1, &mut sink)
        .unwrap();

    assert!(instance.cancelled);
    // The first batch holds the initial state and nine steps, the token is seen at the next check
    assert_eq!(instance.steps_taken(), 10);
    assert_eq!(end.epoch, start.epoch + Unit::Minute * 10);
    assert_eq!(sink.received.len(), 11);
    assert_eq!(sink.received.last().unwrap().epoch, end.epoch);
}

#[test]
fn samples_stream_through_a_channel() {
    let registry = earth_moon_registry();
    let (tx, rx) = channel::<Vec<TrajectorySample>>();
    let consumer = thread::spawn(move || {
        let mut count = 0;
        let mut batches = 0;
        while let Ok(batch) = rx.recv() {
            count += batch.len();
            batches += 1;
        }
        (count, batches)
    });

    let opts = PropOpts::builder().step(Unit::Second * 30).batch_size(100).build();
    let prop = Propagator::hermite(OrbitalDynamics::two_body(), opts);
    let mut sender = tx;
    prop.with(leo(&registry), &registry)
        .propagate_incremental(Unit::Hour * 5, &mut sender)
        .unwrap();
    drop(sender);

    let (count, batches) = consumer.join().unwrap();
    assert_eq!(count, 5 * 120 + 1);
    assert_eq!(batches, 7);
}

#[test]
fn drag_and_oblateness_in_low_orbit() {
    let registry = Arc::new(solar_system());
    // Circular at 250 km, with a ballistic coefficient of about 45 kg/m^2 it stays in orbit for days
    let r_km = 6_628.0;
    let gm = registry.gm(399).unwrap();
    let v_km_s = (gm / r_km).sqrt() / 2.0_f64.sqrt();
    let start = SatelliteState::new(
        registry.epoch(),
        Vector3::new(r_km, 0.0, 0.0),
        Vector3::new(0.0, v_km_s, v_km_s),
        399,
    )
    .with_drag(1_000.0, 10.0, 2.2);

    let run = |perturbations: Perturbations| {
        let request = PropagationRequest::builder()
            .initial_state(start)
            .registry(registry.clone())
            .duration(Unit::Hour * 6)
            .step(Unit::Second * 30)
            .integrator(IntegratorKind::Verner56)
            .perturbations(perturbations)
            .build();
        propagate(&request).unwrap()
    };

    let two_body = run(Perturbations::none()).final_state;
    let drag_run = run(Perturbations::builder().drag(true).build());
    let with_drag = drag_run.final_state;
    let with_j2 = run(Perturbations::builder().j2(true).build()).final_state;

    // Drag removes orbital energy without bringing the satellite down
    let e0 = start.specific_energy(gm);
    assert!((two_body.specific_energy(gm) - e0).abs() < 1e-8);
    let e_drag = with_drag.specific_energy(gm);
    assert!(e_drag < e0 - 1e-6, "{e_drag} vs {e0}");
    assert!(e_drag > e0 - 1e-2, "{e_drag} vs {e0}");
    let r_eq = registry.get(399).unwrap().equatorial_radius_km;
    let lowest = drag_run
        .trajectory
        .samples
        .iter()
        .map(|s| s.rmag_km())
        .fold(f64::INFINITY, f64::min);
    assert!(lowest > r_eq + 200.0, "dipped to {lowest} km");

    // J2 makes the node regress about the pole of the Earth on a prograde orbit
    let pole = registry.orientation(399, registry.epoch()).unwrap() * Vector3::z();
    assert!(start.hvec().dot(&pole) > 0.0);
    let n_two_body = pole.cross(&two_body.hvec());
    let n_j2 = pole.cross(&with_j2.hvec());
    let regression = pole.dot(&n_two_body.cross(&n_j2)).atan2(n_two_body.dot(&n_j2));
    assert!(regression < -1e-4, "{regression}");
}

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

use orrery::cosmic::{assert_state_eq_or_rel, elements_to_state, OrbitalElements, SatelliteState};
use orrery::io::scenario::ScenarioConfig;
use orrery::io::{ConfigError, ConfigRepr};
use orrery::propagators::{propagate, propagate_many, IntegratorKind};
use orrery::time::Unit;
use std::path::PathBuf;

fn scenario_path(name: &str) -> PathBuf {
    let manifest_dir =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or(".".to_string()));
    manifest_dir.join("data").join("tests").join(name)
}

#[test]
fn lunar_escape_scenario() {
    let _ = pretty_env_logger::try_init();
    let scenario = ScenarioConfig::load(scenario_path("lunar_escape.yaml")).unwrap();
    assert_eq!(scenario.name.as_deref(), Some("lunar escape"));
    assert!(scenario.perturbations.third_body);
    assert_eq!(scenario.cancel_check_interval, 50);

    let request = scenario.to_request().unwrap();
    assert_eq!(request.integrator, IntegratorKind::Verner56);
    assert_eq!(request.initial_state.central, 301);
    assert_eq!(request.initial_state.mass_kg, 850.0);

    let outcome = propagate(&request).unwrap();
    assert_eq!(outcome.transitions.len(), 1);
    assert_eq!(outcome.final_state.central, 399);
    assert_eq!(
        outcome.trajectory.last().unwrap().epoch,
        scenario.epoch + Unit::Day * 1
    );
}

#[test]
fn molniya_scenario() {
    let scenario = ScenarioConfig::load(scenario_path("molniya.yaml")).unwrap();
    let request = scenario.to_request().unwrap();
    assert_eq!(request.integrator, IntegratorKind::Hermite);
    assert_eq!(request.step, Unit::Minute * 2);

    let registry = scenario.registry().unwrap();
    let elements = OrbitalElements::new(
        26_600.0,
        0.74,
        63.4_f64.to_radians(),
        40.0_f64.to_radians(),
        270.0_f64.to_radians(),
        10.0_f64.to_radians(),
        registry.gm(399).unwrap(),
        399,
        scenario.epoch,
    );
    let (r, v) = elements_to_state(&elements).unwrap();
    assert_state_eq_or_rel(
        &request.initial_state,
        &SatelliteState::new(scenario.epoch, r, v, 399),
        1e-12,
        "molniya initial state",
    );
    let outcome = propagate(&request).unwrap();
    assert!(outcome.transitions.is_empty());

    // Four orbits per two days, starting just after periapsis
    let apsides = outcome.trajectory.apsides().unwrap();
    assert!(apsides.len() >= 7, "{}", apsides.len());
    for event in &apsides {
        assert_eq!(event.central, 399);
    }
}

#[test]
fn many_scenarios_at_once() {
    let requests: Vec<_> = ["lunar_escape.yaml", "molniya.yaml"]
        .iter()
        .map(|name| {
            ScenarioConfig::load(scenario_path(name))
                .unwrap()
                .to_request()
                .unwrap()
        })
        .collect();
    let outcomes = propagate_many(&requests);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].as_ref().unwrap().final_state.central, 399);
    assert_eq!(outcomes[1].as_ref().unwrap().final_state.central, 399);
}

#[test]
fn missing_scenario_file() {
    assert!(matches!(
        ScenarioConfig::load(scenario_path("does_not_exist.yaml")),
        Err(ConfigError::ReadFile { .. })
    ));
    assert!(matches!(
        ScenarioConfig::loads("epoch: not an epoch"),
        Err(ConfigError::ParseYaml { .. })
    ));
}

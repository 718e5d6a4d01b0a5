//! Conservation tests for the carbon cycle.
//!
//! These tests verify that carbon is only created or destroyed at boundary
//! endpoints (rock, mantle, industry):
//! - every year, for every combination of scenario choices
//! - over a whole run
//! - at the fossil reserve floor

use approx::assert_relative_eq;
use ccycle_core::{
    Buffering, Era, Flux, Reservoir, ResponseStyle, Scenario, ScenarioConfig, Simulation,
};

fn all_configs(run_length: usize) -> Vec<ScenarioConfig> {
    let mut configs = Vec::new();
    for era in [Era::PreIndustrial, Era::Modern] {
        for response in [ResponseStyle::Constant, ResponseStyle::Variable] {
            for flags in 0..16u8 {
                let buffering = Buffering {
                    ocean_up: flags & 1 != 0,
                    ocean_down: flags & 2 != 0,
                    vegetation_up: flags & 4 != 0,
                    vegetation_down: flags & 8 != 0,
                };
                configs.push(
                    ScenarioConfig::new(era, run_length)
                        .with_response(response)
                        .with_buffering(buffering),
                );
            }
        }
    }
    configs
}

mod yearly_balance {
    use super::*;

    /// The sum of reservoir net changes equals the boundary balance every
    /// year.
    #[test]
    fn test_every_year_balances() {
        for config in all_configs(60) {
            let scenario = Scenario::new(config.clone()).unwrap();
            let mut simulation = Simulation::new(&scenario);

            while let Some(report) = simulation.step() {
                let net = report.net_changes;
                assert_relative_eq!(
                    net.total(),
                    net.boundary_net - net.river_residual,
                    epsilon = 1e-9
                );
                assert!(
                    net.river_residual.abs() < 1e-9,
                    "river not emptied in year {} of {:?}",
                    report.year,
                    config
                );
            }
        }
    }

    /// Reservoirs without fluxes never change.
    #[test]
    fn test_permafrost_is_inert() {
        for config in all_configs(20) {
            let results = Scenario::new(config).unwrap().run();
            let permafrost = results.trajectory(Reservoir::Permafrost);

            assert!(permafrost.values().iter().all(|&v| v == 1700.0));
        }
    }

    /// Resolved fluxes are non-negative for the reference calibration.
    #[test]
    fn test_fluxes_non_negative() {
        for config in all_configs(100) {
            let scenario = Scenario::new(config).unwrap();
            let mut simulation = scenario.simulation();

            while let Some(report) = simulation.step() {
                for (flux, value) in report.fluxes.iter() {
                    assert!(
                        value >= -1e-9,
                        "{flux} negative in year {}: {value}",
                        report.year
                    );
                }
            }
        }
    }
}

mod run_balance {
    use super::*;

    /// Change in total carbon over a run equals the cumulative boundary flux.
    #[test]
    fn test_total_carbon_matches_boundary_flux() {
        for config in all_configs(200) {
            let scenario = Scenario::new(config).unwrap();
            let mut simulation = scenario.simulation();
            let total_initial = scenario.initial_levels().total();

            let mut cumulative_boundary = 0.0;
            while let Some(report) = simulation.step() {
                cumulative_boundary += report.net_changes.boundary_net;
            }

            let total_final = simulation.state().current().total();
            assert_relative_eq!(
                total_final - total_initial,
                cumulative_boundary,
                epsilon = 1e-6
            );
        }
    }

    /// Pre-industrial boundary fluxes cancel: weathering and volcanism in,
    /// burial and sedimentation out.
    #[test]
    fn test_pre_industrial_boundaries_cancel() {
        let scenario = Scenario::new(ScenarioConfig::new(Era::PreIndustrial, 2)).unwrap();
        let report = scenario.simulation().step().unwrap();

        // 0.1 + 0.3 - 0.2 - 0.2
        assert_relative_eq!(report.net_changes.boundary_net, 0.0, epsilon = 1e-12);
    }
}

mod depletion_floor {
    use super::*;

    /// Fossil reserves never go negative, and once empty nothing is burnt.
    #[test]
    fn test_reserves_never_negative() {
        let config = ScenarioConfig::new(Era::Modern, 10)
            .with_initial_level(Reservoir::FossilReserves, 10.0);
        let scenario = Scenario::new(config).unwrap();
        let mut simulation = scenario.simulation();
        let mut exhausted = false;

        while let Some(report) = simulation.step() {
            let combustion = report.flux(Flux::FossilCombustion);
            let reserves = simulation.state().current()[Reservoir::FossilReserves];

            assert!(reserves >= 0.0, "reserves negative: {reserves}");
            assert!(combustion <= 4.8);
            if exhausted {
                assert_eq!(combustion, 0.0);
            }
            exhausted = reserves <= 0.0;
        }
        assert!(exhausted);
    }

    /// The full modern reserve outlasts a 200 year run.
    #[test]
    fn test_modern_reserves_last() {
        let results = Scenario::new(ScenarioConfig::new(Era::Modern, 200))
            .unwrap()
            .run();
        let reserves = results.trajectory(Reservoir::FossilReserves);

        assert_relative_eq!(
            reserves.latest().unwrap(),
            1875.0 - 199.0 * 4.8,
            epsilon = 1e-6
        );
        assert_eq!(results.final_fluxes()[Flux::FossilCombustion], 4.8);
    }
}

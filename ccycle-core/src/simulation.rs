//! The yearly simulation loop
//!
//! A [`Simulation`] owns the reservoir state of one run and advances it a year
//! at a time: resolve the fluxes from last year's levels, integrate them, and
//! record the new levels. [`Simulation::run`] folds over every year and
//! returns the [`SimulationResults`] handed to the caller.

use crate::flux::{Flux, FluxTable};
use crate::integrator::{MassBalance, NetChanges};
use crate::report::FluxReport;
use crate::reservoir::{Reservoir, ReservoirLevels, ReservoirState};
use crate::resolver::{FluxResolver, ResolvedFluxes};
use crate::scenario::{Era, Scenario};
use crate::timeseries::{FloatValue, Trajectory, Year};
use ndarray::Array1;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything that happened in one simulated year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearReport {
    /// The year whose levels these fluxes produced. Year 0 only appears for
    /// single-year runs, where nothing is applied.
    pub year: Year,
    pub fluxes: ResolvedFluxes,
    pub net_changes: NetChanges,
}

impl YearReport {
    pub fn flux(&self, flux: Flux) -> FloatValue {
        self.fluxes[flux]
    }

    pub fn net_change(&self, reservoir: Reservoir) -> FloatValue {
        self.net_changes.get(reservoir)
    }

    /// Sum of the net change over all reservoirs
    pub fn total_change(&self) -> FloatValue {
        self.net_changes.total()
    }
}

/// A single run of a [`Scenario`].
#[derive(Debug, Clone)]
pub struct Simulation<'a> {
    scenario: &'a Scenario,
    resolver: FluxResolver<'a>,
    state: ReservoirState,
    last_report: Option<YearReport>,
    fossil_exhausted: bool,
}

impl<'a> Simulation<'a> {
    pub fn new(scenario: &'a Scenario) -> Self {
        let initial = *scenario.initial_levels();
        Self {
            scenario,
            resolver: FluxResolver::new(scenario),
            state: ReservoirState::new(initial, scenario.run_length()),
            last_report: None,
            fossil_exhausted: initial[Reservoir::FossilReserves] <= 0.0,
        }
    }

    pub fn state(&self) -> &ReservoirState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_full()
    }

    /// Advance the run by one year.
    ///
    /// Returns `None` once the run length has been reached.
    pub fn step(&mut self) -> Option<YearReport> {
        if self.state.is_full() {
            return None;
        }

        let levels = *self.state.current();
        let fluxes = self.resolver.resolve(&levels);
        let net_changes = MassBalance::apply(self.scenario.fluxes(), &fluxes);
        self.state.advance(&net_changes.changes);

        let year = self.state.year();
        self.check_fossil_reserves(year);

        let report = YearReport {
            year,
            fluxes,
            net_changes,
        };
        self.last_report = Some(report.clone());
        Some(report)
    }

    fn check_fossil_reserves(&mut self, year: Year) {
        let reserves = self.state.current()[Reservoir::FossilReserves];
        if !self.fossil_exhausted && reserves <= 0.0 {
            self.fossil_exhausted = true;
            warn!(year, reserves, "fossil reserves exhausted, combustion stops");
        }
    }

    /// Run every remaining year.
    pub fn run(mut self) -> SimulationResults {
        debug!(
            era = %self.scenario.era(),
            run_length = self.scenario.run_length(),
            "starting carbon cycle run"
        );

        while self.step().is_some() {}

        // With a single year nothing is applied, but the fluxes implied by the
        // initial stocks are still reported.
        let final_year = match self.last_report.take() {
            Some(report) => report,
            None => {
                let levels = *self.state.current();
                let fluxes = self.resolver.resolve(&levels);
                YearReport {
                    year: self.state.year(),
                    net_changes: MassBalance::apply(self.scenario.fluxes(), &fluxes),
                    fluxes,
                }
            }
        };

        let results = SimulationResults {
            era: self.scenario.era(),
            trajectories: Reservoir::ALL
                .into_iter()
                .map(|r| self.state.trajectory(r))
                .collect(),
            final_levels: *self.state.current(),
            fluxes: self.scenario.fluxes().clone(),
            final_year,
        };

        info!(
            years = results.len(),
            atmosphere = results.final_levels[Reservoir::Atmosphere],
            total_change = results.total_change(),
            "carbon cycle run complete"
        );
        results
    }
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResults {
    era: Era,
    /// One trajectory per reservoir, in [`Reservoir::ALL`] order
    trajectories: Vec<Trajectory>,
    final_levels: ReservoirLevels,
    fluxes: FluxTable,
    final_year: YearReport,
}

impl SimulationResults {
    pub fn era(&self) -> Era {
        self.era
    }

    /// Number of years in every trajectory (the run length)
    pub fn len(&self) -> usize {
        self.trajectories.first().map_or(0, Trajectory::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn trajectory(&self, reservoir: Reservoir) -> &Trajectory {
        &self.trajectories[reservoir.index()]
    }

    pub fn trajectories(&self) -> impl Iterator<Item = (Reservoir, &Trajectory)> {
        Reservoir::ALL.into_iter().zip(self.trajectories.iter())
    }

    /// Change of a reservoir relative to its initial stock, for every year.
    pub fn anomaly(&self, reservoir: Reservoir) -> Array1<FloatValue> {
        self.trajectory(reservoir).anomaly()
    }

    pub fn final_levels(&self) -> &ReservoirLevels {
        &self.final_levels
    }

    /// The fluxes active in the run
    pub fn flux_table(&self) -> &FluxTable {
        &self.fluxes
    }

    pub fn final_year(&self) -> &YearReport {
        &self.final_year
    }

    /// Resolved value of every flux in the final simulated year.
    pub fn final_fluxes(&self) -> &ResolvedFluxes {
        &self.final_year.fluxes
    }

    /// Sum of the final year's net changes over all reservoirs
    pub fn total_change(&self) -> FloatValue {
        self.final_year.total_change()
    }

    /// Final fluxes and net exchanges, classified against their
    /// pre-industrial references.
    pub fn flux_report(&self) -> FluxReport {
        FluxReport::new(self.era, &self.fluxes, &self.final_year.fluxes)
    }
}

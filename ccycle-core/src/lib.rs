//! Multi-reservoir mass-balance model of the global carbon cycle.
//!
//! Nine carbon reservoirs exchange carbon through named fluxes, one simulated
//! year at a time. A [`ScenarioConfig`] picks the era, which exchange fluxes
//! are buffered and how the weathering and biological fluxes respond; a
//! validated [`Scenario`] can then be run to completion.
//!
//! ```
//! use ccycle_core::{Era, Reservoir, ResponseStyle, Scenario, ScenarioConfig};
//!
//! let config = ScenarioConfig::new(Era::Modern, 50).with_response(ResponseStyle::Variable);
//! let results = Scenario::new(config)?.run();
//!
//! let atmosphere = results.trajectory(Reservoir::Atmosphere);
//! assert_eq!(atmosphere.len(), 50);
//! # Ok::<(), ccycle_core::errors::CarbonCycleError>(())
//! ```

pub mod errors;
pub mod flux;
pub mod integrator;
pub mod parameters;
pub mod report;
pub mod reservoir;
pub mod resolver;
pub mod scenario;
pub mod simulation;
pub mod timeseries;

#[cfg(feature = "python")]
pub mod python;

pub use errors::{CarbonCycleError, CarbonCycleResult};
pub use flux::{Boundary, Driver, Endpoint, Flux, FluxDefinition, FluxRule, FluxTable, ResponseMode};
pub use integrator::{MassBalance, NetChanges};
pub use parameters::{Calibration, FluxRateParameters, ReservoirStockParameters};
pub use report::{ExchangeDirection, ExchangePair, FluxReport, FluxTrend, FluxValue, NetExchange};
pub use reservoir::{Reservoir, ReservoirLevels, ReservoirState};
pub use resolver::{FluxResolver, ResolvedFluxes};
pub use scenario::{
    Buffering, Era, ResponseStyle, Scenario, ScenarioConfig, StockOverride, DEFAULT_RUN_LENGTH,
    MAX_RUN_LENGTH,
};
pub use simulation::{Simulation, SimulationResults, YearReport};
pub use timeseries::{FloatValue, Trajectory, Year};

/// Validate `config` against the reference calibration and run it.
pub fn run(config: ScenarioConfig) -> CarbonCycleResult<SimulationResults> {
    Ok(Scenario::new(config)?.run())
}

//! Calibration parameters
//!
//! Reference stocks and rates for the carbon cycle. These are calibration
//! data rather than scenario choices: a [`ScenarioConfig`](crate::scenario::ScenarioConfig)
//! selects between them, it never changes them. Each struct provides the
//! reference values through `Default`.

mod fluxes;
mod stocks;

pub use fluxes::FluxRateParameters;
pub use stocks::ReservoirStockParameters;

use serde::{Deserialize, Serialize};

/// Full calibration of the model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub stocks: ReservoirStockParameters,
    pub rates: FluxRateParameters,
}

//! Flux summaries for display
//!
//! Nothing here feeds back into the simulation. A [`FluxReport`] compares the
//! final year's fluxes against their pre-industrial references, giving the
//! visualisation layer what it needs to colour and scale flux arrows.

use crate::flux::{Flux, FluxTable};
use crate::resolver::ResolvedFluxes;
use crate::scenario::Era;
use crate::timeseries::FloatValue;
use is_close::is_close;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative tolerance below which a flux counts as unchanged
pub const TREND_REL_TOL: FloatValue = 1e-3;
/// Absolute tolerance (PgC/yr) below which a flux counts as unchanged
pub const TREND_ABS_TOL: FloatValue = 1e-3;

/// How a flux compares with its pre-industrial reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluxTrend {
    Elevated,
    Reduced,
    Unchanged,
}

impl FluxTrend {
    /// Classify `value` against `reference`.
    ///
    /// Values within [`TREND_REL_TOL`] or [`TREND_ABS_TOL`] of the reference,
    /// whichever is looser, are unchanged.
    pub fn classify(value: FloatValue, reference: FloatValue) -> Self {
        if is_close!(
            value,
            reference,
            rel_tol = TREND_REL_TOL,
            abs_tol = TREND_ABS_TOL
        ) {
            FluxTrend::Unchanged
        } else if value > reference {
            FluxTrend::Elevated
        } else {
            FluxTrend::Reduced
        }
    }
}

impl fmt::Display for FluxTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluxTrend::Elevated => f.write_str("elevated"),
            FluxTrend::Reduced => f.write_str("reduced"),
            FluxTrend::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// A resolved flux next to its pre-industrial reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxValue {
    pub flux: Flux,
    /// unit: PgC/yr
    pub value: FloatValue,
    /// unit: PgC/yr
    pub reference: FloatValue,
    pub trend: FluxTrend,
}

impl FluxValue {
    pub fn new(flux: Flux, value: FloatValue, reference: FloatValue) -> Self {
        Self {
            flux,
            value,
            reference,
            trend: FluxTrend::classify(value, reference),
        }
    }

    /// `value / reference`, used to scale arrow widths.
    ///
    /// `None` for fluxes without a pre-industrial counterpart.
    pub fn relative_magnitude(&self) -> Option<FloatValue> {
        if self.reference == 0.0 {
            None
        } else {
            Some(self.value / self.reference)
        }
    }
}

/// Reservoir pairs exchanging carbon with the atmosphere in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangePair {
    OceanAtmosphere,
    VegetationAtmosphere,
}

impl ExchangePair {
    pub const ALL: [ExchangePair; 2] = [
        ExchangePair::OceanAtmosphere,
        ExchangePair::VegetationAtmosphere,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ExchangePair::OceanAtmosphere => "ocean_atmosphere",
            ExchangePair::VegetationAtmosphere => "vegetation_atmosphere",
        }
    }

    /// Flux carrying carbon into the atmosphere
    pub const fn upward(self) -> Flux {
        match self {
            ExchangePair::OceanAtmosphere => Flux::OceanOutgassing,
            ExchangePair::VegetationAtmosphere => Flux::Respiration,
        }
    }

    /// Flux carrying carbon out of the atmosphere
    pub const fn downward(self) -> Flux {
        match self {
            ExchangePair::OceanAtmosphere => Flux::OceanUptake,
            ExchangePair::VegetationAtmosphere => Flux::Photosynthesis,
        }
    }
}

/// Which way a net exchange moves carbon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeDirection {
    ToAtmosphere,
    FromAtmosphere,
    Balanced,
}

impl ExchangeDirection {
    fn of(net: FloatValue) -> Self {
        if net > 0.0 {
            ExchangeDirection::ToAtmosphere
        } else if net < 0.0 {
            ExchangeDirection::FromAtmosphere
        } else {
            ExchangeDirection::Balanced
        }
    }
}

/// Signed net exchange between the atmosphere and the ocean or vegetation.
///
/// Positive values move carbon into the atmosphere. The trend compares
/// magnitudes, so a larger sink is "elevated" too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetExchange {
    pub pair: ExchangePair,
    /// `upward - downward` in the final year
    pub net: FloatValue,
    /// Same difference from the pre-industrial rates
    pub reference: FloatValue,
    pub direction: ExchangeDirection,
    pub trend: FluxTrend,
}

impl NetExchange {
    pub fn new(pair: ExchangePair, net: FloatValue, reference: FloatValue) -> Self {
        Self {
            pair,
            net,
            reference,
            direction: ExchangeDirection::of(net),
            trend: FluxTrend::classify(net.abs(), reference.abs()),
        }
    }

    pub fn magnitude(&self) -> FloatValue {
        self.net.abs()
    }
}

/// Final-year fluxes of a run, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxReport {
    pub era: Era,
    /// Every flux active in the run, in evaluation order
    pub fluxes: Vec<FluxValue>,
    pub exchanges: Vec<NetExchange>,
}

impl FluxReport {
    pub fn new(era: Era, table: &FluxTable, resolved: &ResolvedFluxes) -> Self {
        let fluxes = table
            .iter()
            .map(|d| FluxValue::new(d.flux, resolved[d.flux], d.pre_industrial_rate))
            .collect();

        let reference = |flux: Flux| table.get(flux).map_or(0.0, |d| d.pre_industrial_rate);
        let exchanges = ExchangePair::ALL
            .into_iter()
            .map(|pair| {
                NetExchange::new(
                    pair,
                    resolved.net(pair.upward(), pair.downward()),
                    reference(pair.upward()) - reference(pair.downward()),
                )
            })
            .collect();

        Self {
            era,
            fluxes,
            exchanges,
        }
    }

    pub fn get(&self, flux: Flux) -> Option<&FluxValue> {
        self.fluxes.iter().find(|f| f.flux == flux)
    }

    pub fn exchange(&self, pair: ExchangePair) -> Option<&NetExchange> {
        self.exchanges.iter().find(|e| e.pair == pair)
    }

    /// Fluxes that moved away from their pre-industrial reference
    pub fn changed(&self) -> impl Iterator<Item = &FluxValue> {
        self.fluxes
            .iter()
            .filter(|f| f.trend != FluxTrend::Unchanged)
    }
}

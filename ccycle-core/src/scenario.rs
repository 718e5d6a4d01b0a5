//! Scenario configuration
//!
//! A [`ScenarioConfig`] is the set of choices made before a run: the era, which
//! exchange fluxes are buffered, whether the weathering and biological fluxes
//! respond to their reservoirs, and how many years to simulate.
//!
//! Building a [`Scenario`] from it validates the choices against a
//! [`Calibration`] and derives the two things a run needs: the initial
//! reservoir levels and the [`FluxTable`]. All validation happens here, so a
//! constructed scenario always runs to completion.
//!
//! Configurations can be written in TOML; missing keys take their defaults:
//!
//! ```toml
//! era = "modern"
//! run_length = 200
//! response = "variable"
//!
//! [buffering]
//! ocean_down = true
//! ```

use crate::errors::{CarbonCycleError, CarbonCycleResult};
use crate::flux::{Driver, Flux, FluxDefinition, FluxRule, FluxTable, ResponseMode};
use crate::parameters::Calibration;
use crate::reservoir::{Reservoir, ReservoirLevels};
use crate::simulation::{Simulation, SimulationResults};
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Number of simulated years used when none is given.
pub const DEFAULT_RUN_LENGTH: usize = 200;

/// Longest run accepted. The full history is allocated when a run starts.
pub const MAX_RUN_LENGTH: usize = 100_000;

/// Pre-industrial equilibrium or modern, human-perturbed baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Era {
    #[default]
    #[serde(rename = "pre-industrial")]
    PreIndustrial,
    #[serde(rename = "modern")]
    Modern,
}

impl Era {
    pub fn has_humans(self) -> bool {
        self == Era::Modern
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Era::PreIndustrial => f.write_str("pre-industrial"),
            Era::Modern => f.write_str("modern"),
        }
    }
}

impl FromStr for Era {
    type Err = CarbonCycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "pre-industrial" | "preindustrial" => Ok(Era::PreIndustrial),
            "modern" => Ok(Era::Modern),
            _ => Err(CarbonCycleError::InvalidEra(s.to_string())),
        }
    }
}

/// Response of the weathering and biological fluxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    /// Fixed reference rates
    #[default]
    Constant,
    /// Rates proportional to the driving reservoir
    #[serde(alias = "proportional")]
    Variable,
}

impl fmt::Display for ResponseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStyle::Constant => f.write_str("constant"),
            ResponseStyle::Variable => f.write_str("variable"),
        }
    }
}

impl FromStr for ResponseStyle {
    type Err = CarbonCycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "constant" => Ok(ResponseStyle::Constant),
            "variable" | "proportional" => Ok(ResponseStyle::Variable),
            _ => Err(CarbonCycleError::InvalidResponseStyle(s.to_string())),
        }
    }
}

/// Which of the human-perturbed exchange fluxes respond linearly to their
/// source reservoir instead of staying at the modern reference rate.
///
/// Only used in the modern era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Buffering {
    /// Surface ocean to atmosphere (outgassing)
    pub ocean_up: bool,
    /// Atmosphere to surface ocean (dissolution)
    pub ocean_down: bool,
    /// Vegetation to atmosphere (respiration)
    pub vegetation_up: bool,
    /// Atmosphere to vegetation (photosynthesis)
    pub vegetation_down: bool,
}

impl Buffering {
    pub fn all() -> Self {
        Self {
            ocean_up: true,
            ocean_down: true,
            vegetation_up: true,
            vegetation_down: true,
        }
    }

    pub fn any(&self) -> bool {
        self.ocean_up || self.ocean_down || self.vegetation_up || self.vegetation_down
    }
}

/// Replace the era baseline stock of a single reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockOverride {
    pub reservoir: Reservoir,
    /// unit: PgC
    pub level: FloatValue,
}

/// Choices made before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub era: Era,
    pub buffering: Buffering,
    pub response: ResponseStyle,
    /// Number of simulated years, including the initial year
    pub run_length: usize,
    /// Initial stocks that differ from the era baseline
    pub initial_overrides: Vec<StockOverride>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            era: Era::PreIndustrial,
            buffering: Buffering::default(),
            response: ResponseStyle::Constant,
            run_length: DEFAULT_RUN_LENGTH,
            initial_overrides: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    pub fn new(era: Era, run_length: usize) -> Self {
        Self {
            era,
            run_length,
            ..Default::default()
        }
    }

    pub fn with_buffering(self, buffering: Buffering) -> Self {
        Self { buffering, ..self }
    }

    pub fn with_response(self, response: ResponseStyle) -> Self {
        Self { response, ..self }
    }

    /// Start a reservoir from `level` instead of its era baseline.
    pub fn with_initial_level(mut self, reservoir: Reservoir, level: FloatValue) -> Self {
        self.initial_overrides.retain(|o| o.reservoir != reservoir);
        self.initial_overrides.push(StockOverride { reservoir, level });
        self
    }

    pub fn from_toml_str(s: &str) -> CarbonCycleResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn is_proportional(&self) -> bool {
        self.response == ResponseStyle::Variable
    }
}

/// A validated scenario, ready to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    config: ScenarioConfig,
    calibration: Calibration,
    initial_levels: ReservoirLevels,
    fluxes: FluxTable,
}

impl Scenario {
    /// Build a scenario using the reference calibration.
    pub fn new(config: ScenarioConfig) -> CarbonCycleResult<Self> {
        Self::with_calibration(config, Calibration::default())
    }

    pub fn with_calibration(
        config: ScenarioConfig,
        calibration: Calibration,
    ) -> CarbonCycleResult<Self> {
        if !(1..=MAX_RUN_LENGTH).contains(&config.run_length) {
            return Err(CarbonCycleError::InvalidRunLength(config.run_length));
        }
        validate_calibration(&calibration)?;

        let mut initial_levels = calibration.stocks.initial_levels(config.era);
        for o in &config.initial_overrides {
            ensure_non_negative(&format!("initial level of {}", o.reservoir), o.level)?;
            initial_levels[o.reservoir] = o.level;
        }

        let fluxes = build_flux_table(&config, &calibration, &initial_levels);
        check_degenerate(&fluxes)?;

        if !config.era.has_humans() && config.buffering.any() {
            debug!("buffering flags have no effect in the pre-industrial era");
        }
        debug!(
            era = %config.era,
            response = %config.response,
            run_length = config.run_length,
            fluxes = fluxes.len(),
            "scenario built"
        );

        Ok(Self {
            config,
            calibration,
            initial_levels,
            fluxes,
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn era(&self) -> Era {
        self.config.era
    }

    pub fn run_length(&self) -> usize {
        self.config.run_length
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn initial_levels(&self) -> &ReservoirLevels {
        &self.initial_levels
    }

    pub fn fluxes(&self) -> &FluxTable {
        &self.fluxes
    }

    pub fn simulation(&self) -> Simulation<'_> {
        Simulation::new(self)
    }

    /// Run the scenario to completion.
    pub fn run(&self) -> SimulationResults {
        self.simulation().run()
    }
}

fn ensure_non_negative(field: &str, value: FloatValue) -> CarbonCycleResult<()> {
    if !value.is_finite() {
        return Err(CarbonCycleError::InvalidParameter {
            field: field.to_string(),
            value,
            reason: "must be finite".to_string(),
        });
    }
    if value < 0.0 {
        return Err(CarbonCycleError::InvalidParameter {
            field: field.to_string(),
            value,
            reason: "must not be negative".to_string(),
        });
    }
    Ok(())
}

fn validate_calibration(calibration: &Calibration) -> CarbonCycleResult<()> {
    for (name, value) in calibration.stocks.named_values() {
        ensure_non_negative(&format!("stocks.{name}"), value)?;
    }
    for (name, value) in calibration.rates.named_values() {
        ensure_non_negative(&format!("rates.{name}"), value)?;
    }
    Ok(())
}

/// Reject response modes whose denominators vanish.
fn check_degenerate(fluxes: &FluxTable) -> CarbonCycleResult<()> {
    for definition in fluxes.iter() {
        let FluxRule::Response(mode) = definition.rule else {
            continue;
        };
        match mode {
            ResponseMode::Constant => {}
            ResponseMode::Proportional {
                reference_level, ..
            } => {
                if reference_level == 0.0 {
                    return Err(CarbonCycleError::DegenerateCalibration {
                        flux: definition.flux.to_string(),
                        reason: "proportional response against a zero reference level"
                            .to_string(),
                    });
                }
            }
            ResponseMode::BufferedLinear {
                pre_industrial_level,
                modern_level,
                ..
            } => {
                if pre_industrial_level == modern_level {
                    return Err(CarbonCycleError::DegenerateCalibration {
                        flux: definition.flux.to_string(),
                        reason: format!(
                            "pre-industrial and modern calibration levels are both {modern_level}"
                        ),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Lay out the flux table for a scenario, in evaluation order.
fn build_flux_table(
    config: &ScenarioConfig,
    calibration: &Calibration,
    initial: &ReservoirLevels,
) -> FluxTable {
    let stocks = &calibration.stocks;
    let rates = &calibration.rates;
    let proportional = config.is_proportional();
    let humans = config.era.has_humans();

    // A flux with a fixed rate in constant mode, scaling with `driver` otherwise
    let responsive = |flux: Flux, driver: Driver, reference_level: FloatValue| {
        let rate = rates.pre_industrial(flux);
        let rule = if proportional {
            FluxRule::Response(ResponseMode::Proportional {
                driver,
                reference_level,
            })
        } else {
            FluxRule::Response(ResponseMode::Constant)
        };
        FluxDefinition {
            flux,
            pre_industrial_rate: rate,
            rate,
            rule,
        }
    };

    // Human-perturbed exchange between the atmosphere and the ocean or vegetation
    let exchange = |flux: Flux, driver: Reservoir, buffered: bool| {
        let pre_industrial_rate = rates.pre_industrial(flux);
        if !humans {
            return FluxDefinition::constant(flux, pre_industrial_rate, pre_industrial_rate);
        }
        let modern_rate = rates.modern(flux);
        let rule = if buffered {
            FluxRule::Response(ResponseMode::BufferedLinear {
                driver,
                pre_industrial_level: stocks.pre_industrial(driver),
                modern_level: stocks.modern(driver),
                modern_rate,
            })
        } else {
            FluxRule::Response(ResponseMode::Constant)
        };
        FluxDefinition {
            flux,
            pre_industrial_rate,
            rate: modern_rate,
            rule,
        }
    };

    let constant = |flux: Flux| {
        let rate = rates.pre_industrial(flux);
        FluxDefinition::constant(flux, rate, rate)
    };

    let surface_start = initial[Reservoir::SurfaceOcean];
    let mut definitions = vec![
        // Rivers: fill first, then outgas and bury a share of the total flow,
        // then discharge what is left
        constant(Flux::RockWeathering),
        responsive(
            Flux::AtmosphericWeathering,
            Driver::Reservoir(Reservoir::Atmosphere),
            stocks.pre_industrial(Reservoir::Atmosphere),
        ),
        responsive(
            Flux::SoilExport,
            Driver::Reservoir(Reservoir::Soil),
            stocks.pre_industrial(Reservoir::Soil),
        ),
        responsive(Flux::RiverOutgassing, Driver::RiverFlow, rates.river_inflow()),
        responsive(Flux::RiverBurial, Driver::RiverFlow, rates.river_inflow()),
        FluxDefinition {
            flux: Flux::RiverDischarge,
            pre_industrial_rate: rates.river_discharge,
            rate: rates.river_discharge,
            rule: FluxRule::RiverRemainder,
        },
        FluxDefinition {
            flux: Flux::VegetationToSoil,
            pre_industrial_rate: rates.vegetation_to_soil,
            rate: rates.vegetation_to_soil,
            rule: FluxRule::VegetationExcess {
                initial_level: initial[Reservoir::Vegetation],
            },
        },
        // Ocean biology scales with the surface ocean at the start of the run
        responsive(
            Flux::SurfaceToBiota,
            Driver::Reservoir(Reservoir::SurfaceOcean),
            surface_start,
        ),
        responsive(
            Flux::BiotaToSurface,
            Driver::Flux(Flux::SurfaceToBiota),
            rates.surface_to_biota,
        ),
        responsive(
            Flux::BiotaToDissolvedOrganic,
            Driver::Flux(Flux::SurfaceToBiota),
            rates.surface_to_biota,
        ),
        responsive(
            Flux::BiotaToDeep,
            Driver::Flux(Flux::SurfaceToBiota),
            rates.surface_to_biota,
        ),
        responsive(
            Flux::DissolvedOrganicToDeep,
            Driver::Reservoir(Reservoir::DissolvedOrganicCarbon),
            stocks.pre_industrial(Reservoir::DissolvedOrganicCarbon),
        ),
        responsive(
            Flux::SurfaceToDeep,
            Driver::Reservoir(Reservoir::SurfaceOcean),
            surface_start,
        ),
        responsive(
            Flux::DeepToSurface,
            Driver::Reservoir(Reservoir::DeepOcean),
            stocks.pre_industrial(Reservoir::DeepOcean),
        ),
        responsive(
            Flux::DeepToSediment,
            Driver::Reservoir(Reservoir::DeepOcean),
            stocks.pre_industrial(Reservoir::DeepOcean),
        ),
        constant(Flux::Volcanism),
    ];

    if humans {
        definitions.push(FluxDefinition::constant(
            Flux::LandUse,
            0.0,
            rates.modern(Flux::LandUse),
        ));
        definitions.push(FluxDefinition {
            flux: Flux::FossilCombustion,
            pre_industrial_rate: 0.0,
            rate: rates.combustion_cap,
            rule: FluxRule::Depletion {
                cap: rates.combustion_cap,
            },
        });
        definitions.push(FluxDefinition::constant(
            Flux::Cement,
            0.0,
            rates.modern(Flux::Cement),
        ));
    }

    let buffering = config.buffering;
    definitions.extend([
        exchange(
            Flux::OceanOutgassing,
            Reservoir::SurfaceOcean,
            buffering.ocean_up,
        ),
        exchange(Flux::OceanUptake, Reservoir::Atmosphere, buffering.ocean_down),
        exchange(
            Flux::Respiration,
            Reservoir::Vegetation,
            buffering.vegetation_up,
        ),
        exchange(
            Flux::Photosynthesis,
            Reservoir::Atmosphere,
            buffering.vegetation_down,
        ),
    ]);

    FluxTable::new(definitions)
}

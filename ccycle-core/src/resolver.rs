//! Flux resolution
//!
//! Each year, every flux in the scenario's [`FluxTable`] is evaluated from the
//! reservoir levels at the end of the previous year. Fluxes are resolved in
//! table order so that those driven by the river flow, or by another flux, see
//! this year's values.

use crate::flux::{Driver, Endpoint, Flux, FluxDefinition, FluxRule, FluxTable, ResponseMode};
use crate::reservoir::ReservoirLevels;
use crate::scenario::Scenario;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::ops::Index;
use tracing::trace;

/// Scale a reference rate by the ratio of the current to the reference level.
///
/// The caller guarantees `reference_level != 0`.
pub fn proportional(
    reference_rate: FloatValue,
    reference_level: FloatValue,
    level: FloatValue,
) -> FloatValue {
    let k = reference_rate / reference_level;
    k * level
}

/// Straight line through two calibration points, extrapolated without
/// clamping.
///
/// Algebraically this is `pre_rate + (level - pre_level) * slope` with
/// `slope = (modern_rate - pre_rate) / (modern_level - pre_level)`. It is
/// written as a weighted mean of the two rates so that both calibration points
/// are reproduced exactly. The caller guarantees `pre_level != modern_level`.
pub fn linear_extrapolation(
    level: FloatValue,
    pre_level: FloatValue,
    pre_rate: FloatValue,
    modern_level: FloatValue,
    modern_rate: FloatValue,
) -> FloatValue {
    let weight = (level - pre_level) / (modern_level - pre_level);
    pre_rate * (1.0 - weight) + modern_rate * weight
}

/// Amount extracted from a finite reserve in one year.
///
/// Nothing once the reserve is exhausted, otherwise at most `cap` and never
/// more than what is left.
pub fn depletion_clamped(reserve: FloatValue, cap: FloatValue) -> FloatValue {
    if reserve <= 0.0 {
        0.0
    } else {
        reserve.min(cap)
    }
}

/// The value of every flux for a single year (PgC/yr).
///
/// Fluxes that are not part of the scenario are zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFluxes([FloatValue; Flux::COUNT]);

impl Default for ResolvedFluxes {
    fn default() -> Self {
        Self([0.0; Flux::COUNT])
    }
}

impl ResolvedFluxes {
    pub fn get(&self, flux: Flux) -> FloatValue {
        self.0[flux.index()]
    }

    fn set(&mut self, flux: Flux, value: FloatValue) {
        self.0[flux.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Flux, FloatValue)> + '_ {
        Flux::ALL.into_iter().zip(self.0.iter().copied())
    }

    /// Signed net transfer between two reservoirs connected by a pair of
    /// opposing fluxes: `forward - backward`.
    ///
    /// For display only.
    pub fn net(&self, forward: Flux, backward: Flux) -> FloatValue {
        self.get(forward) - self.get(backward)
    }
}

impl Index<Flux> for ResolvedFluxes {
    type Output = FloatValue;

    fn index(&self, flux: Flux) -> &Self::Output {
        &self.0[flux.index()]
    }
}

/// Evaluates a scenario's flux table against reservoir levels.
#[derive(Debug, Clone, Copy)]
pub struct FluxResolver<'a> {
    table: &'a FluxTable,
}

impl<'a> FluxResolver<'a> {
    pub fn new(scenario: &'a Scenario) -> Self {
        Self::from_table(scenario.fluxes())
    }

    pub fn from_table(table: &'a FluxTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a FluxTable {
        self.table
    }

    /// Resolve every flux from the previous year's levels.
    pub fn resolve(&self, levels: &ReservoirLevels) -> ResolvedFluxes {
        let mut resolved = ResolvedFluxes::default();
        let mut river = RiverPool::default();

        for definition in self.table.iter() {
            let value = match definition.rule {
                FluxRule::Response(mode) => {
                    respond(definition, mode, levels, &resolved, river.inflow)
                }
                FluxRule::VegetationExcess { initial_level } => {
                    source_level(definition, levels).unwrap_or(initial_level) - initial_level
                }
                FluxRule::Depletion { cap } => match source_level(definition, levels) {
                    Some(reserve) => depletion_clamped(reserve, cap),
                    None => cap,
                },
                FluxRule::RiverRemainder => river.remaining(),
            };
            river.record(definition, value);
            resolved.set(definition.flux, value);
        }

        resolved
    }
}

/// Running totals of the transient river pool within one year.
#[derive(Debug, Default)]
struct RiverPool {
    inflow: FloatValue,
    outflow: FloatValue,
}

impl RiverPool {
    fn record(&mut self, definition: &FluxDefinition, value: FloatValue) {
        if definition.destination() == Endpoint::River {
            self.inflow += value;
        }
        if definition.source() == Endpoint::River {
            self.outflow += value;
        }
    }

    fn remaining(&self) -> FloatValue {
        self.inflow - self.outflow
    }
}

fn source_level(definition: &FluxDefinition, levels: &ReservoirLevels) -> Option<FloatValue> {
    match definition.source() {
        Endpoint::Reservoir(reservoir) => Some(levels[reservoir]),
        _ => None,
    }
}

fn respond(
    definition: &FluxDefinition,
    mode: ResponseMode,
    levels: &ReservoirLevels,
    resolved: &ResolvedFluxes,
    river_inflow: FloatValue,
) -> FloatValue {
    match mode {
        ResponseMode::Constant => definition.rate,
        ResponseMode::Proportional {
            driver,
            reference_level,
        } => {
            let level = match driver {
                Driver::Reservoir(reservoir) => levels[reservoir],
                Driver::RiverFlow => river_inflow,
                Driver::Flux(leader) => resolved[leader],
            };
            let value = proportional(definition.rate, reference_level, level);
            trace!(
                flux = %definition.flux,
                level,
                reference_level,
                value,
                "proportional"
            );
            value
        }
        ResponseMode::BufferedLinear {
            driver,
            pre_industrial_level,
            modern_level,
            modern_rate,
        } => {
            let level = levels[driver];
            let value = linear_extrapolation(
                level,
                pre_industrial_level,
                definition.pre_industrial_rate,
                modern_level,
                modern_rate,
            );
            trace!(flux = %definition.flux, level, value, "linear extrapolation");
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservoir::Reservoir;
    use crate::scenario::{Buffering, Era, ResponseStyle, ScenarioConfig};
    use approx::assert_relative_eq;
    use is_close::is_close;

    fn scenario(config: ScenarioConfig) -> Scenario {
        Scenario::new(config).unwrap()
    }

    #[test]
    fn proportional_scales_with_level() {
        assert!(is_close!(proportional(0.3, 589.0, 589.0), 0.3));
        assert!(is_close!(proportional(0.3, 589.0, 1178.0), 0.6));
        assert_eq!(proportional(1.7, 1900.0, 0.0), 0.0);
    }

    #[test]
    fn linear_extrapolation_hits_both_calibration_points() {
        assert_eq!(linear_extrapolation(589.0, 589.0, 60.0, 829.0, 80.0), 60.0);
        assert_eq!(linear_extrapolation(829.0, 589.0, 60.0, 829.0, 80.0), 80.0);
        assert_eq!(
            linear_extrapolation(455.0, 455.0, 107.2, 475.0, 118.8),
            107.2
        );
        assert_eq!(
            linear_extrapolation(475.0, 455.0, 107.2, 475.0, 118.8),
            118.8
        );
    }

    #[test]
    fn linear_extrapolation_is_unclamped() {
        // 120 PgC beyond the modern level adds half the modern excess again
        assert_relative_eq!(linear_extrapolation(949.0, 589.0, 60.0, 829.0, 80.0), 90.0, epsilon = 1e-9);
        // Below pre-industrial the line keeps falling: 60 - 589/12 at zero
        assert_relative_eq!(
            linear_extrapolation(0.0, 589.0, 60.0, 829.0, 80.0),
            60.0 - 589.0 / 12.0,
            epsilon = 1e-9
        );
        // and goes negative below about -131 PgC
        assert!(linear_extrapolation(-200.0, 589.0, 60.0, 829.0, 80.0) < 0.0);
    }

    #[test]
    fn linear_extrapolation_matches_slope_form() {
        let slope = (80.0 - 60.0) / (829.0 - 589.0);
        for level in [-200.0, 0.0, 600.0, 700.0, 1000.0, 5000.0] {
            assert_relative_eq!(
                linear_extrapolation(level, 589.0, 60.0, 829.0, 80.0),
                60.0 + (level - 589.0) * slope,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn depletion() {
        assert_eq!(depletion_clamped(1875.0, 4.8), 4.8);
        assert_eq!(depletion_clamped(2.0, 4.8), 2.0);
        assert_eq!(depletion_clamped(0.0, 4.8), 0.0);
        assert_eq!(depletion_clamped(-1.0, 4.8), 0.0);
    }

    #[test]
    fn constant_pre_industrial_fluxes() {
        let scenario = scenario(ScenarioConfig::default());
        let fluxes = FluxResolver::new(&scenario).resolve(scenario.initial_levels());

        assert_eq!(fluxes[Flux::OceanUptake], 60.0);
        assert_eq!(fluxes[Flux::Photosynthesis], 108.9);
        assert_eq!(fluxes[Flux::SurfaceToDeep], 88.2);
        assert_eq!(fluxes[Flux::Volcanism], 0.3);
        for flux in Flux::HUMAN {
            assert_eq!(fluxes[flux], 0.0);
        }
    }

    #[test]
    fn vegetation_to_soil_is_the_excess_over_the_start() {
        let scenario = scenario(ScenarioConfig::default());
        let resolver = FluxResolver::new(&scenario);
        let mut levels = *scenario.initial_levels();

        assert_eq!(resolver.resolve(&levels)[Flux::VegetationToSoil], 0.0);

        levels[Reservoir::Vegetation] += 1.7;
        assert!(is_close!(resolver.resolve(&levels)[Flux::VegetationToSoil], 1.7));
    }

    #[test]
    fn river_discharges_the_remainder() {
        let scenario = scenario(ScenarioConfig::default());
        let fluxes = FluxResolver::new(&scenario).resolve(scenario.initial_levels());

        let inflow = fluxes[Flux::RockWeathering]
            + fluxes[Flux::AtmosphericWeathering]
            + fluxes[Flux::SoilExport];
        let outflow =
            fluxes[Flux::RiverOutgassing] + fluxes[Flux::RiverBurial] + fluxes[Flux::RiverDischarge];

        assert!(is_close!(fluxes[Flux::RiverDischarge], 0.9));
        assert_relative_eq!(inflow, outflow, epsilon = 1e-9);
    }

    #[test]
    fn river_outflows_follow_river_flow() {
        let config = ScenarioConfig::default().with_response(ResponseStyle::Variable);
        let scenario = scenario(config);
        let resolver = FluxResolver::new(&scenario);
        let mut levels = *scenario.initial_levels();

        // Doubling the soil doubles its export: 0.1 + 0.3 + 3.4 = 3.8
        levels[Reservoir::Soil] *= 2.0;
        let fluxes = resolver.resolve(&levels);

        assert_relative_eq!(fluxes[Flux::SoilExport], 3.4, epsilon = 1e-9);
        assert_relative_eq!(fluxes[Flux::RiverBurial], 0.2 * 3.8 / 2.1, epsilon = 1e-9);
        assert_relative_eq!(fluxes[Flux::RiverOutgassing], 1.0 * 3.8 / 2.1, epsilon = 1e-9);
        assert_relative_eq!(
            fluxes[Flux::RiverDischarge],
            3.8 - fluxes[Flux::RiverBurial] - fluxes[Flux::RiverOutgassing],
            epsilon = 1e-9
        );
    }

    #[test]
    fn biota_fluxes_follow_surface_uptake() {
        let config = ScenarioConfig::new(Era::Modern, 10).with_response(ResponseStyle::Variable);
        let scenario = scenario(config);
        let resolver = FluxResolver::new(&scenario);

        // Reference is the run-start surface ocean, so nothing moves in year one
        let fluxes = resolver.resolve(scenario.initial_levels());
        assert_relative_eq!(fluxes[Flux::SurfaceToBiota], 50.0, epsilon = 1e-9);

        let mut levels = *scenario.initial_levels();
        levels[Reservoir::SurfaceOcean] *= 1.1;
        let fluxes = resolver.resolve(&levels);

        assert_relative_eq!(fluxes[Flux::SurfaceToBiota], 55.0, epsilon = 1e-9);
        assert_relative_eq!(fluxes[Flux::BiotaToSurface], 37.0 * 1.1, epsilon = 1e-9);
        assert_relative_eq!(fluxes[Flux::BiotaToDissolvedOrganic], 2.0 * 1.1, epsilon = 1e-9);
        assert_relative_eq!(fluxes[Flux::BiotaToDeep], 11.0 * 1.1, epsilon = 1e-9);
    }

    #[test]
    fn weathering_references_pre_industrial_atmosphere() {
        let config = ScenarioConfig::new(Era::Modern, 10).with_response(ResponseStyle::Variable);
        let scenario = scenario(config);
        let fluxes = FluxResolver::new(&scenario).resolve(scenario.initial_levels());

        assert_relative_eq!(fluxes[Flux::AtmosphericWeathering], 0.3 * 829.0 / 589.0, epsilon = 1e-9);
        assert_eq!(fluxes[Flux::RockWeathering], 0.1);
    }

    #[test]
    fn buffered_exchange_at_modern_baseline() {
        let config = ScenarioConfig::new(Era::Modern, 10).with_buffering(Buffering::all());
        let scenario = scenario(config);
        let fluxes = FluxResolver::new(&scenario).resolve(scenario.initial_levels());

        assert!(is_close!(fluxes[Flux::OceanOutgassing], 78.4));
        assert!(is_close!(fluxes[Flux::OceanUptake], 80.0));
        assert!(is_close!(fluxes[Flux::Respiration], 118.8));
        assert!(is_close!(fluxes[Flux::Photosynthesis], 123.0));
    }

    #[test]
    fn human_fluxes_in_modern_era() {
        let scenario = scenario(ScenarioConfig::new(Era::Modern, 10));
        let fluxes = FluxResolver::new(&scenario).resolve(scenario.initial_levels());

        assert_eq!(fluxes[Flux::FossilCombustion], 4.8);
        assert_eq!(fluxes[Flux::Cement], 3.0);
        assert_eq!(fluxes[Flux::LandUse], 1.1);
    }

    #[test]
    fn net_exchange_is_signed() {
        let scenario = scenario(ScenarioConfig::default());
        let fluxes = FluxResolver::new(&scenario).resolve(scenario.initial_levels());

        assert!(is_close!(
            fluxes.net(Flux::OceanOutgassing, Flux::OceanUptake),
            0.7
        ));
        assert!(is_close!(
            fluxes.net(Flux::Respiration, Flux::Photosynthesis),
            -1.7
        ));
    }
}

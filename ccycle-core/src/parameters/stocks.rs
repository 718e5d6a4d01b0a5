//! Reservoir stock parameters
//!
//! Initial carbon stocks for the pre-industrial baseline and the anthropogenic
//! excess added on top of it for the modern baseline.

use crate::reservoir::{Reservoir, ReservoirLevels};
use crate::scenario::Era;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Initial stocks of the nine reservoirs.
///
/// Reservoirs without an `_excess` field start from the same stock in both
/// eras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirStockParameters {
    /// Pre-industrial atmospheric carbon
    /// unit: PgC
    /// default: 589
    pub atmosphere: FloatValue,
    /// Anthropogenic excess in the atmosphere for the modern baseline
    /// unit: PgC
    /// default: 240
    pub atmosphere_excess: FloatValue,

    /// Pre-industrial coal, oil and gas reserves
    /// unit: PgC
    /// default: 1500
    pub fossil_reserves: FloatValue,
    /// Extra reserves in the modern baseline
    /// unit: PgC
    /// default: 375
    pub fossil_reserves_excess: FloatValue,

    /// Pre-industrial vegetation carbon
    /// unit: PgC
    /// default: 455
    pub vegetation: FloatValue,
    /// Vegetation excess in the modern baseline
    /// unit: PgC
    /// default: 20
    pub vegetation_excess: FloatValue,

    /// unit: PgC
    /// default: 1900
    pub soil: FloatValue,

    /// unit: PgC
    /// default: 1700
    pub permafrost: FloatValue,

    /// Pre-industrial surface ocean carbon
    /// unit: PgC
    /// default: 900
    pub surface_ocean: FloatValue,
    /// Carbon taken up by the surface ocean since pre-industrial
    /// unit: PgC
    /// default: 155
    pub surface_ocean_excess: FloatValue,

    /// unit: PgC
    /// default: 37100
    pub deep_ocean: FloatValue,

    /// unit: PgC
    /// default: 3
    pub marine_biota: FloatValue,

    /// unit: PgC
    /// default: 700
    pub dissolved_organic_carbon: FloatValue,
}

impl Default for ReservoirStockParameters {
    fn default() -> Self {
        Self {
            atmosphere: 589.0,
            atmosphere_excess: 240.0,
            fossil_reserves: 1500.0,
            fossil_reserves_excess: 375.0,
            vegetation: 455.0,
            vegetation_excess: 20.0,
            soil: 1900.0,
            permafrost: 1700.0,
            surface_ocean: 900.0,
            surface_ocean_excess: 155.0,
            deep_ocean: 37100.0,
            marine_biota: 3.0,
            dissolved_organic_carbon: 700.0,
        }
    }
}

impl ReservoirStockParameters {
    /// Pre-industrial stock of a reservoir.
    pub fn pre_industrial(&self, reservoir: Reservoir) -> FloatValue {
        match reservoir {
            Reservoir::Atmosphere => self.atmosphere,
            Reservoir::FossilReserves => self.fossil_reserves,
            Reservoir::Vegetation => self.vegetation,
            Reservoir::Soil => self.soil,
            Reservoir::Permafrost => self.permafrost,
            Reservoir::SurfaceOcean => self.surface_ocean,
            Reservoir::DeepOcean => self.deep_ocean,
            Reservoir::MarineBiota => self.marine_biota,
            Reservoir::DissolvedOrganicCarbon => self.dissolved_organic_carbon,
        }
    }

    /// Anthropogenic excess of a reservoir in the modern baseline.
    pub fn excess(&self, reservoir: Reservoir) -> FloatValue {
        match reservoir {
            Reservoir::Atmosphere => self.atmosphere_excess,
            Reservoir::FossilReserves => self.fossil_reserves_excess,
            Reservoir::Vegetation => self.vegetation_excess,
            Reservoir::SurfaceOcean => self.surface_ocean_excess,
            _ => 0.0,
        }
    }

    /// Modern ("year 2000") stock of a reservoir.
    pub fn modern(&self, reservoir: Reservoir) -> FloatValue {
        self.pre_industrial(reservoir) + self.excess(reservoir)
    }

    /// Starting stocks for a run in the given era.
    pub fn initial_levels(&self, era: Era) -> ReservoirLevels {
        ReservoirLevels::from_fn(|reservoir| match era {
            Era::PreIndustrial => self.pre_industrial(reservoir),
            Era::Modern => self.modern(reservoir),
        })
    }

    /// Every stock value paired with its field name, for validation.
    pub(crate) fn named_values(&self) -> Vec<(&'static str, FloatValue)> {
        vec![
            ("atmosphere", self.atmosphere),
            ("atmosphere_excess", self.atmosphere_excess),
            ("fossil_reserves", self.fossil_reserves),
            ("fossil_reserves_excess", self.fossil_reserves_excess),
            ("vegetation", self.vegetation),
            ("vegetation_excess", self.vegetation_excess),
            ("soil", self.soil),
            ("permafrost", self.permafrost),
            ("surface_ocean", self.surface_ocean),
            ("surface_ocean_excess", self.surface_ocean_excess),
            ("deep_ocean", self.deep_ocean),
            ("marine_biota", self.marine_biota),
            ("dissolved_organic_carbon", self.dissolved_organic_carbon),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_baseline_adds_excess() {
        let params = ReservoirStockParameters::default();

        assert_eq!(params.modern(Reservoir::Atmosphere), 829.0);
        assert_eq!(params.modern(Reservoir::FossilReserves), 1875.0);
        assert_eq!(params.modern(Reservoir::Vegetation), 475.0);
        assert_eq!(params.modern(Reservoir::SurfaceOcean), 1055.0);
        assert_eq!(params.modern(Reservoir::DeepOcean), 37100.0);
    }

    #[test]
    fn initial_levels_by_era() {
        let params = ReservoirStockParameters::default();
        let pre = params.initial_levels(Era::PreIndustrial);
        let modern = params.initial_levels(Era::Modern);

        assert_eq!(pre[Reservoir::Atmosphere], 589.0);
        assert_eq!(modern[Reservoir::Atmosphere], 829.0);
        assert_eq!(pre[Reservoir::Soil], modern[Reservoir::Soil]);
        assert_eq!(modern.total() - pre.total(), 240.0 + 375.0 + 20.0 + 155.0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let params: ReservoirStockParameters = toml::from_str("soil = 2000.0").unwrap();
        assert_eq!(params.soil, 2000.0);
        assert_eq!(params.atmosphere, 589.0);
    }
}

//! Flux rate parameters
//!
//! Reference annual transfers between reservoirs. The pre-industrial values
//! describe a cycle that is (close to) balanced; the `_excess` values are the
//! additional exchange observed around the year 2000.
//!
//! A few values differ from the published budget so that the pre-industrial
//! cycle closes:
//!
//! - surface to deep ocean is 88.2 rather than 90
//! - volcanism is 0.3 rather than 0.1
//!
//! These are calibration data and should be reproduced as-is.

use crate::flux::Flux;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Reference rates for every flux.
///
/// All values in PgC/yr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluxRateParameters {
    /// Weathering of rock into rivers
    /// default: 0.1
    pub rock_weathering: FloatValue,
    /// Burial of river carbon
    /// default: 0.2
    pub river_burial: FloatValue,
    /// Rock weathering by atmospheric carbon carried in rivers
    /// default: 0.3
    pub atmospheric_weathering: FloatValue,
    /// Export of soil carbon to rivers
    /// default: 1.7
    pub soil_export: FloatValue,
    /// Litter flux from vegetation to soil. Only used as the reporting
    /// reference; the flux itself is the vegetation excess.
    /// default: 1.7
    pub vegetation_to_soil: FloatValue,
    /// default: 50
    pub surface_to_biota: FloatValue,
    /// default: 37
    pub biota_to_surface: FloatValue,
    /// default: 2
    pub biota_to_dissolved_organic: FloatValue,
    /// default: 2
    pub dissolved_organic_to_deep: FloatValue,
    /// default: 11
    pub biota_to_deep: FloatValue,
    /// Freshwater outgassing
    /// default: 1.0
    pub river_outgassing: FloatValue,
    /// default: 88.2
    pub surface_to_deep: FloatValue,
    /// default: 101
    pub deep_to_surface: FloatValue,
    /// Deep ocean to ocean floor sediments
    /// default: 0.2
    pub deep_to_sediment: FloatValue,
    /// River discharge into the ocean. Reporting reference only; the flux
    /// itself is whatever the river still holds.
    /// default: 0.9
    pub river_discharge: FloatValue,

    /// Surface ocean to atmosphere
    /// default: 60.7
    pub ocean_outgassing: FloatValue,
    /// default: 17.7
    pub ocean_outgassing_excess: FloatValue,
    /// Atmosphere to surface ocean (dissolution)
    /// default: 60
    pub ocean_uptake: FloatValue,
    /// default: 20
    pub ocean_uptake_excess: FloatValue,
    /// Vegetation to atmosphere
    /// default: 107.2
    pub respiration: FloatValue,
    /// default: 11.6
    pub respiration_excess: FloatValue,
    /// Atmosphere to vegetation
    /// default: 108.9
    pub photosynthesis: FloatValue,
    /// default: 14.1
    pub photosynthesis_excess: FloatValue,

    /// default: 0.3
    pub volcanism: FloatValue,

    /// Net land use change emissions (modern era only)
    /// default: 1.1
    pub land_use: FloatValue,
    /// Cement production (modern era only)
    /// default: 3
    pub cement: FloatValue,
    /// Maximum fossil fuel burnt per year (modern era only)
    /// default: 4.8
    pub combustion_cap: FloatValue,
}

impl Default for FluxRateParameters {
    fn default() -> Self {
        Self {
            rock_weathering: 0.1,
            river_burial: 0.2,
            atmospheric_weathering: 0.3,
            soil_export: 1.7,
            vegetation_to_soil: 1.7,
            surface_to_biota: 50.0,
            biota_to_surface: 37.0,
            biota_to_dissolved_organic: 2.0,
            dissolved_organic_to_deep: 2.0,
            biota_to_deep: 11.0,
            river_outgassing: 1.0,
            surface_to_deep: 88.2,
            deep_to_surface: 101.0,
            deep_to_sediment: 0.2,
            river_discharge: 0.9,

            ocean_outgassing: 60.7,
            ocean_outgassing_excess: 17.7,
            ocean_uptake: 60.0,
            ocean_uptake_excess: 20.0,
            respiration: 107.2,
            respiration_excess: 11.6,
            photosynthesis: 108.9,
            photosynthesis_excess: 14.1,

            volcanism: 0.3,

            land_use: 1.1,
            cement: 3.0,
            combustion_cap: 4.8,
        }
    }
}

impl FluxRateParameters {
    /// Pre-industrial reference rate of a flux.
    ///
    /// Human-only fluxes have no pre-industrial counterpart and return zero.
    pub fn pre_industrial(&self, flux: Flux) -> FloatValue {
        match flux {
            Flux::RockWeathering => self.rock_weathering,
            Flux::AtmosphericWeathering => self.atmospheric_weathering,
            Flux::SoilExport => self.soil_export,
            Flux::RiverOutgassing => self.river_outgassing,
            Flux::RiverBurial => self.river_burial,
            Flux::RiverDischarge => self.river_discharge,
            Flux::VegetationToSoil => self.vegetation_to_soil,
            Flux::SurfaceToBiota => self.surface_to_biota,
            Flux::BiotaToSurface => self.biota_to_surface,
            Flux::BiotaToDissolvedOrganic => self.biota_to_dissolved_organic,
            Flux::BiotaToDeep => self.biota_to_deep,
            Flux::DissolvedOrganicToDeep => self.dissolved_organic_to_deep,
            Flux::SurfaceToDeep => self.surface_to_deep,
            Flux::DeepToSurface => self.deep_to_surface,
            Flux::DeepToSediment => self.deep_to_sediment,
            Flux::Volcanism => self.volcanism,
            Flux::OceanOutgassing => self.ocean_outgassing,
            Flux::OceanUptake => self.ocean_uptake,
            Flux::Respiration => self.respiration,
            Flux::Photosynthesis => self.photosynthesis,
            Flux::LandUse | Flux::FossilCombustion | Flux::Cement => 0.0,
        }
    }

    /// Rate in the modern (human-perturbed) era.
    ///
    /// For the combustion flux this is the annual extraction cap.
    pub fn modern(&self, flux: Flux) -> FloatValue {
        match flux {
            Flux::OceanOutgassing => self.ocean_outgassing + self.ocean_outgassing_excess,
            Flux::OceanUptake => self.ocean_uptake + self.ocean_uptake_excess,
            Flux::Respiration => self.respiration + self.respiration_excess,
            Flux::Photosynthesis => self.photosynthesis + self.photosynthesis_excess,
            Flux::LandUse => self.land_use,
            Flux::FossilCombustion => self.combustion_cap,
            Flux::Cement => self.cement,
            _ => self.pre_industrial(flux),
        }
    }

    /// Total pre-industrial inflow to rivers.
    pub fn river_inflow(&self) -> FloatValue {
        self.rock_weathering + self.atmospheric_weathering + self.soil_export
    }

    pub(crate) fn named_values(&self) -> Vec<(&'static str, FloatValue)> {
        vec![
            ("rock_weathering", self.rock_weathering),
            ("river_burial", self.river_burial),
            ("atmospheric_weathering", self.atmospheric_weathering),
            ("soil_export", self.soil_export),
            ("vegetation_to_soil", self.vegetation_to_soil),
            ("surface_to_biota", self.surface_to_biota),
            ("biota_to_surface", self.biota_to_surface),
            ("biota_to_dissolved_organic", self.biota_to_dissolved_organic),
            ("dissolved_organic_to_deep", self.dissolved_organic_to_deep),
            ("biota_to_deep", self.biota_to_deep),
            ("river_outgassing", self.river_outgassing),
            ("surface_to_deep", self.surface_to_deep),
            ("deep_to_surface", self.deep_to_surface),
            ("deep_to_sediment", self.deep_to_sediment),
            ("river_discharge", self.river_discharge),
            ("ocean_outgassing", self.ocean_outgassing),
            ("ocean_outgassing_excess", self.ocean_outgassing_excess),
            ("ocean_uptake", self.ocean_uptake),
            ("ocean_uptake_excess", self.ocean_uptake_excess),
            ("respiration", self.respiration),
            ("respiration_excess", self.respiration_excess),
            ("photosynthesis", self.photosynthesis),
            ("photosynthesis_excess", self.photosynthesis_excess),
            ("volcanism", self.volcanism),
            ("land_use", self.land_use),
            ("cement", self.cement),
            ("combustion_cap", self.combustion_cap),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn modern_rates_add_excess() {
        let params = FluxRateParameters::default();

        assert!(is_close!(params.modern(Flux::OceanOutgassing), 78.4));
        assert!(is_close!(params.modern(Flux::OceanUptake), 80.0));
        assert!(is_close!(params.modern(Flux::Respiration), 118.8));
        assert!(is_close!(params.modern(Flux::Photosynthesis), 123.0));
        assert_eq!(params.modern(Flux::SurfaceToDeep), 88.2);
    }

    #[test]
    fn human_fluxes_have_no_pre_industrial_reference() {
        let params = FluxRateParameters::default();
        for flux in Flux::HUMAN {
            assert_eq!(params.pre_industrial(flux), 0.0);
            assert!(params.modern(flux) > 0.0);
        }
    }

    #[test]
    fn pre_industrial_river_budget_closes() {
        let params = FluxRateParameters::default();

        // 0.1 + 0.3 + 1.7 in, 1.0 + 0.2 out, 0.9 discharged
        let discharge = params.river_inflow() - params.river_outgassing - params.river_burial;
        assert!(is_close!(discharge, params.river_discharge));
    }

    #[test]
    fn marine_biota_budget_closes() {
        let params = FluxRateParameters::default();
        let net = params.surface_to_biota
            - params.biota_to_surface
            - params.biota_to_dissolved_organic
            - params.biota_to_deep;
        assert_eq!(net, 0.0);
    }
}

//! Fluxes between carbon reservoirs
//!
//! A flux is a directed annual transfer of carbon (PgC/yr). The topology of
//! every flux (where it takes carbon from and where it puts it) is fixed; what
//! a scenario chooses is how each flux responds to the state of the system.
//!
//! # Topology
//!
//! ```text
//!            volcanism   cement     land use / combustion
//!                |          |         ^
//!                v          v         |
//!  [FOSSIL] --> [ ATMOSPHERE ] <----> [VEGETATION] --> [SOIL]
//!                 ^   |    ^                             |
//!        outgas   |   |    | outgassing/uptake           | export
//!                 |   v    v                             v
//!  (rock) ----> ( RIVER ) -+-> [SURFACE OCEAN] <-> [MARINE BIOTA] -> [DOC]
//!                 |                 ^   |               |             |
//!                 v burial          |   v               v             v
//!              (rock)            [      DEEP OCEAN      ] <-----------+
//!                                           |
//!                                           v sediment
//!                                        (rock)
//! ```
//!
//! The river is a transient pool: it is filled and fully emptied within the
//! same year, so it never appears as a reservoir.

use crate::reservoir::Reservoir;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An implicit source or sink outside the modelled reservoirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Rock: source of weathered carbon, sink for burial and sediments
    Lithosphere,
    /// Volcanic outgassing
    Mantle,
    /// Cement production
    Industry,
}

/// One end of a flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Reservoir(Reservoir),
    /// The transient river pool
    River,
    Boundary(Boundary),
}

/// Every flux in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flux {
    RockWeathering,
    AtmosphericWeathering,
    SoilExport,
    RiverOutgassing,
    RiverBurial,
    RiverDischarge,
    VegetationToSoil,
    SurfaceToBiota,
    BiotaToSurface,
    BiotaToDissolvedOrganic,
    BiotaToDeep,
    DissolvedOrganicToDeep,
    SurfaceToDeep,
    DeepToSurface,
    DeepToSediment,
    Volcanism,
    LandUse,
    FossilCombustion,
    Cement,
    OceanOutgassing,
    OceanUptake,
    Respiration,
    Photosynthesis,
}

impl Flux {
    pub const COUNT: usize = 23;

    pub const ALL: [Flux; Flux::COUNT] = [
        Flux::RockWeathering,
        Flux::AtmosphericWeathering,
        Flux::SoilExport,
        Flux::RiverOutgassing,
        Flux::RiverBurial,
        Flux::RiverDischarge,
        Flux::VegetationToSoil,
        Flux::SurfaceToBiota,
        Flux::BiotaToSurface,
        Flux::BiotaToDissolvedOrganic,
        Flux::BiotaToDeep,
        Flux::DissolvedOrganicToDeep,
        Flux::SurfaceToDeep,
        Flux::DeepToSurface,
        Flux::DeepToSediment,
        Flux::Volcanism,
        Flux::LandUse,
        Flux::FossilCombustion,
        Flux::Cement,
        Flux::OceanOutgassing,
        Flux::OceanUptake,
        Flux::Respiration,
        Flux::Photosynthesis,
    ];

    /// Fluxes that only exist once humans are present.
    pub const HUMAN: [Flux; 3] = [Flux::LandUse, Flux::FossilCombustion, Flux::Cement];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Flux::RockWeathering => "rock_weathering",
            Flux::AtmosphericWeathering => "atmospheric_weathering",
            Flux::SoilExport => "soil_export",
            Flux::RiverOutgassing => "river_outgassing",
            Flux::RiverBurial => "river_burial",
            Flux::RiverDischarge => "river_discharge",
            Flux::VegetationToSoil => "vegetation_to_soil",
            Flux::SurfaceToBiota => "surface_to_biota",
            Flux::BiotaToSurface => "biota_to_surface",
            Flux::BiotaToDissolvedOrganic => "biota_to_dissolved_organic",
            Flux::BiotaToDeep => "biota_to_deep",
            Flux::DissolvedOrganicToDeep => "dissolved_organic_to_deep",
            Flux::SurfaceToDeep => "surface_to_deep",
            Flux::DeepToSurface => "deep_to_surface",
            Flux::DeepToSediment => "deep_to_sediment",
            Flux::Volcanism => "volcanism",
            Flux::LandUse => "land_use",
            Flux::FossilCombustion => "fossil_combustion",
            Flux::Cement => "cement",
            Flux::OceanOutgassing => "ocean_outgassing",
            Flux::OceanUptake => "ocean_uptake",
            Flux::Respiration => "respiration",
            Flux::Photosynthesis => "photosynthesis",
        }
    }

    pub const fn source(self) -> Endpoint {
        use crate::flux::Endpoint::{Boundary as B, Reservoir as R, River};
        match self {
            Flux::RockWeathering => B(Boundary::Lithosphere),
            Flux::AtmosphericWeathering => R(Reservoir::Atmosphere),
            Flux::SoilExport => R(Reservoir::Soil),
            Flux::RiverOutgassing | Flux::RiverBurial | Flux::RiverDischarge => River,
            Flux::VegetationToSoil => R(Reservoir::Vegetation),
            Flux::SurfaceToBiota => R(Reservoir::SurfaceOcean),
            Flux::BiotaToSurface | Flux::BiotaToDissolvedOrganic | Flux::BiotaToDeep => {
                R(Reservoir::MarineBiota)
            }
            Flux::DissolvedOrganicToDeep => R(Reservoir::DissolvedOrganicCarbon),
            Flux::SurfaceToDeep => R(Reservoir::SurfaceOcean),
            Flux::DeepToSurface | Flux::DeepToSediment => R(Reservoir::DeepOcean),
            Flux::Volcanism => B(Boundary::Mantle),
            Flux::LandUse => R(Reservoir::Vegetation),
            Flux::FossilCombustion => R(Reservoir::FossilReserves),
            Flux::Cement => B(Boundary::Industry),
            Flux::OceanOutgassing => R(Reservoir::SurfaceOcean),
            Flux::OceanUptake => R(Reservoir::Atmosphere),
            Flux::Respiration => R(Reservoir::Vegetation),
            Flux::Photosynthesis => R(Reservoir::Atmosphere),
        }
    }

    pub const fn destination(self) -> Endpoint {
        use crate::flux::Endpoint::{Boundary as B, Reservoir as R, River};
        match self {
            Flux::RockWeathering | Flux::AtmosphericWeathering | Flux::SoilExport => River,
            Flux::RiverOutgassing => R(Reservoir::Atmosphere),
            Flux::RiverBurial => B(Boundary::Lithosphere),
            Flux::RiverDischarge => R(Reservoir::SurfaceOcean),
            Flux::VegetationToSoil => R(Reservoir::Soil),
            Flux::SurfaceToBiota => R(Reservoir::MarineBiota),
            Flux::BiotaToSurface => R(Reservoir::SurfaceOcean),
            Flux::BiotaToDissolvedOrganic => R(Reservoir::DissolvedOrganicCarbon),
            Flux::BiotaToDeep | Flux::DissolvedOrganicToDeep | Flux::SurfaceToDeep => {
                R(Reservoir::DeepOcean)
            }
            Flux::DeepToSurface => R(Reservoir::SurfaceOcean),
            Flux::DeepToSediment => B(Boundary::Lithosphere),
            Flux::Volcanism
            | Flux::LandUse
            | Flux::FossilCombustion
            | Flux::Cement
            | Flux::OceanOutgassing
            | Flux::Respiration => R(Reservoir::Atmosphere),
            Flux::OceanUptake => R(Reservoir::SurfaceOcean),
            Flux::Photosynthesis => R(Reservoir::Vegetation),
        }
    }

    pub const fn is_human(self) -> bool {
        matches!(self, Flux::LandUse | Flux::FossilCombustion | Flux::Cement)
    }
}

impl fmt::Display for Flux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The quantity a proportional flux scales with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    /// Previous year's level of a reservoir
    Reservoir(Reservoir),
    /// Total inflow to the river pool this year
    RiverFlow,
    /// This year's resolved value of another flux
    Flux(Flux),
}

/// How a flux responds to the state of the system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResponseMode {
    /// The scenario's reference rate, every year
    Constant,
    /// `rate / reference_level * driver`
    Proportional {
        driver: Driver,
        reference_level: FloatValue,
    },
    /// Straight line through (pre-industrial level, pre-industrial rate) and
    /// (modern level, modern rate), extrapolated without clamping.
    BufferedLinear {
        driver: Reservoir,
        pre_industrial_level: FloatValue,
        modern_level: FloatValue,
        modern_rate: FloatValue,
    },
}

/// The rule used to resolve a flux each year.
///
/// Most fluxes follow a generic [`ResponseMode`]. Each of the remaining
/// variants belongs to a single flux.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FluxRule {
    Response(ResponseMode),
    /// All vegetation above the run-start stock turns into soil litter.
    VegetationExcess { initial_level: FloatValue },
    /// Burn the reserve at `cap` per year until it is exhausted.
    Depletion { cap: FloatValue },
    /// Whatever is left in the river after outgassing and burial.
    RiverRemainder,
}

/// A flux as configured for one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxDefinition {
    pub flux: Flux,
    /// Pre-industrial reference, used for reporting. Zero for human-only
    /// fluxes.
    pub pre_industrial_rate: FloatValue,
    /// Rate in effect for this scenario. Differs from the pre-industrial rate
    /// for the perturbed exchange fluxes in the modern era.
    pub rate: FloatValue,
    pub rule: FluxRule,
}

impl FluxDefinition {
    pub fn constant(flux: Flux, pre_industrial_rate: FloatValue, rate: FloatValue) -> Self {
        Self {
            flux,
            pre_industrial_rate,
            rate,
            rule: FluxRule::Response(ResponseMode::Constant),
        }
    }

    pub fn source(&self) -> Endpoint {
        self.flux.source()
    }

    pub fn destination(&self) -> Endpoint {
        self.flux.destination()
    }
}

/// The ordered set of fluxes active in a scenario.
///
/// Order is evaluation order: a flux driven by the river flow or by another
/// flux appears after everything it depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxTable {
    definitions: Vec<FluxDefinition>,
}

impl FluxTable {
    pub(crate) fn new(definitions: Vec<FluxDefinition>) -> Self {
        Self { definitions }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FluxDefinition> {
        self.definitions.iter()
    }

    pub fn get(&self, flux: Flux) -> Option<&FluxDefinition> {
        self.definitions.iter().find(|d| d.flux == flux)
    }

    pub fn contains(&self, flux: Flux) -> bool {
        self.get(flux).is_some()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all_order() {
        for (i, flux) in Flux::ALL.iter().enumerate() {
            assert_eq!(flux.index(), i);
        }
    }

    #[test]
    fn no_flux_loops_back_on_itself() {
        for flux in Flux::ALL {
            assert_ne!(flux.source(), flux.destination(), "{flux}");
        }
    }

    #[test]
    fn river_is_filled_by_weathering_and_emptied_three_ways() {
        let inflows: Vec<Flux> = Flux::ALL
            .into_iter()
            .filter(|f| f.destination() == Endpoint::River)
            .collect();
        let outflows: Vec<Flux> = Flux::ALL
            .into_iter()
            .filter(|f| f.source() == Endpoint::River)
            .collect();

        assert_eq!(
            inflows,
            vec![
                Flux::RockWeathering,
                Flux::AtmosphericWeathering,
                Flux::SoilExport
            ]
        );
        assert_eq!(
            outflows,
            vec![
                Flux::RiverOutgassing,
                Flux::RiverBurial,
                Flux::RiverDischarge
            ]
        );
    }

    #[test]
    fn permafrost_is_not_connected() {
        let permafrost = Endpoint::Reservoir(Reservoir::Permafrost);
        assert!(Flux::ALL
            .iter()
            .all(|f| f.source() != permafrost && f.destination() != permafrost));
    }

    #[test]
    fn human_fluxes() {
        for flux in Flux::ALL {
            assert_eq!(flux.is_human(), Flux::HUMAN.contains(&flux));
        }
    }

    #[test]
    fn response_mode_serialization() {
        let mode = ResponseMode::Proportional {
            driver: Driver::Reservoir(Reservoir::Soil),
            reference_level: 1900.0,
        };
        let json = serde_json::to_string(&mode).expect("Serialization failed");
        let parsed: ResponseMode = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(mode, parsed);
    }
}

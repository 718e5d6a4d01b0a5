//! Mass-balance integration
//!
//! Turns one year's resolved fluxes into per-reservoir net changes. Every flux
//! is debited from its source and credited to its destination, so carbon is
//! only created or destroyed at [`Boundary`](crate::flux::Boundary) endpoints.

use crate::flux::{Endpoint, FluxTable};
use crate::reservoir::{Reservoir, ReservoirLevels};
use crate::resolver::ResolvedFluxes;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Net result of one year of fluxes (PgC).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetChanges {
    /// Change in every reservoir
    pub changes: ReservoirLevels,
    /// Carbon added by boundary sources minus carbon removed by boundary sinks
    pub boundary_net: FloatValue,
    /// Carbon left in the river pool at the end of the year. Zero up to
    /// rounding, since the discharge empties the pool.
    pub river_residual: FloatValue,
}

impl NetChanges {
    pub fn get(&self, reservoir: Reservoir) -> FloatValue {
        self.changes[reservoir]
    }

    /// Sum of the net change over all reservoirs
    pub fn total(&self) -> FloatValue {
        self.changes.total()
    }

    /// Difference between the total change and what the boundaries account
    /// for. Zero up to rounding in a conserving year.
    pub fn imbalance(&self) -> FloatValue {
        self.total() - (self.boundary_net - self.river_residual)
    }
}

/// Applies resolved fluxes to reservoirs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassBalance;

impl MassBalance {
    /// Accumulate the net change of every reservoir for one year.
    ///
    /// Only fluxes in `table` take part. Reservoirs with no participating flux
    /// have a net change of zero.
    pub fn apply(table: &FluxTable, fluxes: &ResolvedFluxes) -> NetChanges {
        let mut net = NetChanges::default();

        for definition in table.iter() {
            let value = fluxes[definition.flux];

            match definition.source() {
                Endpoint::Reservoir(reservoir) => net.changes[reservoir] -= value,
                Endpoint::River => net.river_residual -= value,
                Endpoint::Boundary(_) => net.boundary_net += value,
            }
            match definition.destination() {
                Endpoint::Reservoir(reservoir) => net.changes[reservoir] += value,
                Endpoint::River => net.river_residual += value,
                Endpoint::Boundary(_) => net.boundary_net -= value,
            }
        }

        net
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux::{Flux, FluxDefinition};
    use crate::resolver::FluxResolver;
    use crate::scenario::{Era, Scenario, ScenarioConfig};
    use approx::assert_relative_eq;

    #[test]
    fn transfer_between_reservoirs_conserves() {
        let table = FluxTable::new(vec![FluxDefinition::constant(
            Flux::Photosynthesis,
            108.9,
            108.9,
        )]);
        let fluxes = FluxResolver::from_table(&table).resolve(&ReservoirLevels::zeros());
        let net = MassBalance::apply(&table, &fluxes);

        assert_eq!(net.get(Reservoir::Atmosphere), -108.9);
        assert_eq!(net.get(Reservoir::Vegetation), 108.9);
        assert_eq!(net.total(), 0.0);
        assert_eq!(net.boundary_net, 0.0);
    }

    #[test]
    fn boundary_endpoints_affect_one_side() {
        let table = FluxTable::new(vec![
            FluxDefinition::constant(Flux::Volcanism, 0.3, 0.3),
            FluxDefinition::constant(Flux::DeepToSediment, 0.2, 0.2),
        ]);
        let fluxes = FluxResolver::from_table(&table).resolve(&ReservoirLevels::zeros());
        let net = MassBalance::apply(&table, &fluxes);

        assert_eq!(net.get(Reservoir::Atmosphere), 0.3);
        assert_eq!(net.get(Reservoir::DeepOcean), -0.2);
        assert_relative_eq!(net.boundary_net, 0.1, epsilon = 1e-12);
        assert_relative_eq!(net.imbalance(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn fluxes_outside_the_table_are_ignored() {
        let table = FluxTable::new(vec![]);
        let fluxes = FluxResolver::from_table(&table).resolve(&ReservoirLevels::zeros());
        let net = MassBalance::apply(&table, &fluxes);

        assert_eq!(net, NetChanges::default());
    }

    #[test]
    fn modern_year_balances_against_boundaries() {
        let scenario = Scenario::new(ScenarioConfig::new(Era::Modern, 2)).unwrap();
        let fluxes = FluxResolver::new(&scenario).resolve(scenario.initial_levels());
        let net = MassBalance::apply(scenario.fluxes(), &fluxes);

        // Rock weathering and volcanism in; burial and sediments out; cement in
        assert_relative_eq!(net.boundary_net, 0.1 + 0.3 + 3.0 - 0.2 - 0.2, epsilon = 1e-9);
        assert_relative_eq!(net.river_residual, 0.0, epsilon = 1e-12);
        assert_relative_eq!(net.imbalance(), 0.0, epsilon = 1e-9);
        // Permafrost has no fluxes
        assert_eq!(net.get(Reservoir::Permafrost), 0.0);
    }
}

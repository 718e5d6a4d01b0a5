//! Carbon reservoirs and the per-run reservoir state.
//!
//! The nine reservoirs are a closed set, so levels are stored in a fixed-size
//! array indexed by [`Reservoir`] rather than in a map keyed by name.

use crate::timeseries::{FloatValue, Trajectory, Year};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// A named carbon stock (PgC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reservoir {
    Atmosphere,
    FossilReserves,
    Vegetation,
    Soil,
    Permafrost,
    SurfaceOcean,
    DeepOcean,
    MarineBiota,
    DissolvedOrganicCarbon,
}

impl Reservoir {
    pub const COUNT: usize = 9;

    pub const ALL: [Reservoir; Reservoir::COUNT] = [
        Reservoir::Atmosphere,
        Reservoir::FossilReserves,
        Reservoir::Vegetation,
        Reservoir::Soil,
        Reservoir::Permafrost,
        Reservoir::SurfaceOcean,
        Reservoir::DeepOcean,
        Reservoir::MarineBiota,
        Reservoir::DissolvedOrganicCarbon,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Reservoir::Atmosphere => "atmosphere",
            Reservoir::FossilReserves => "fossil_reserves",
            Reservoir::Vegetation => "vegetation",
            Reservoir::Soil => "soil",
            Reservoir::Permafrost => "permafrost",
            Reservoir::SurfaceOcean => "surface_ocean",
            Reservoir::DeepOcean => "deep_ocean",
            Reservoir::MarineBiota => "marine_biota",
            Reservoir::DissolvedOrganicCarbon => "dissolved_organic_carbon",
        }
    }

    /// Hierarchical variable name, following the `Carbon Pool|...` convention
    /// used for model output.
    pub const fn variable_name(self) -> &'static str {
        match self {
            Reservoir::Atmosphere => "Carbon Pool|Atmosphere",
            Reservoir::FossilReserves => "Carbon Pool|Fossil Reserves",
            Reservoir::Vegetation => "Carbon Pool|Vegetation",
            Reservoir::Soil => "Carbon Pool|Soil",
            Reservoir::Permafrost => "Carbon Pool|Permafrost",
            Reservoir::SurfaceOcean => "Carbon Pool|Ocean|Surface",
            Reservoir::DeepOcean => "Carbon Pool|Ocean|Deep",
            Reservoir::MarineBiota => "Carbon Pool|Ocean|Marine Biota",
            Reservoir::DissolvedOrganicCarbon => "Carbon Pool|Ocean|Dissolved Organic",
        }
    }
}

impl fmt::Display for Reservoir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reservoir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reservoir::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| format!("unknown reservoir '{s}'"))
    }
}

/// One value per reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReservoirLevels([FloatValue; Reservoir::COUNT]);

impl ReservoirLevels {
    pub fn zeros() -> Self {
        Self([0.0; Reservoir::COUNT])
    }

    pub fn from_fn(f: impl FnMut(Reservoir) -> FloatValue) -> Self {
        Self(Reservoir::ALL.map(f))
    }

    pub fn get(&self, reservoir: Reservoir) -> FloatValue {
        self[reservoir]
    }

    pub fn set(&mut self, reservoir: Reservoir, value: FloatValue) {
        self[reservoir] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Reservoir, FloatValue)> + '_ {
        Reservoir::ALL.into_iter().zip(self.0.iter().copied())
    }

    /// Total carbon across all reservoirs
    pub fn total(&self) -> FloatValue {
        self.0.iter().sum()
    }

    pub fn as_array(&self) -> &[FloatValue; Reservoir::COUNT] {
        &self.0
    }
}

impl Index<Reservoir> for ReservoirLevels {
    type Output = FloatValue;

    fn index(&self, reservoir: Reservoir) -> &Self::Output {
        &self.0[reservoir.index()]
    }
}

impl IndexMut<Reservoir> for ReservoirLevels {
    fn index_mut(&mut self, reservoir: Reservoir) -> &mut Self::Output {
        &mut self.0[reservoir.index()]
    }
}

/// Levels of every reservoir for a single run, plus their history.
///
/// Storage for the full run is allocated up front: one row per reservoir and
/// one column per simulated year. Only the integrator advances the state.
#[derive(Debug, Clone)]
pub struct ReservoirState {
    initial: ReservoirLevels,
    current: ReservoirLevels,
    history: Array2<FloatValue>,
    year: Year,
}

impl ReservoirState {
    /// Create the state for a run of `run_length` years (including year 0).
    pub fn new(initial: ReservoirLevels, run_length: usize) -> Self {
        let mut history = Array2::zeros((Reservoir::COUNT, run_length.max(1)));
        for (reservoir, level) in initial.iter() {
            history[[reservoir.index(), 0]] = level;
        }

        Self {
            initial,
            current: initial,
            history,
            year: 0,
        }
    }

    /// Levels at the start of the run
    pub fn initial(&self) -> &ReservoirLevels {
        &self.initial
    }

    /// Levels at the end of the most recent simulated year
    pub fn current(&self) -> &ReservoirLevels {
        &self.current
    }

    pub fn year(&self) -> Year {
        self.year
    }

    /// Number of years the state has room for
    pub fn capacity(&self) -> usize {
        self.history.ncols()
    }

    pub fn is_full(&self) -> bool {
        self.year + 1 >= self.capacity()
    }

    /// Apply one year's net changes.
    ///
    /// `level[t] = level[t-1] + net_change` for every reservoir. The caller must
    /// check [`is_full`](Self::is_full) first.
    pub(crate) fn advance(&mut self, net_changes: &ReservoirLevels) {
        debug_assert!(!self.is_full(), "reservoir state advanced past run length");

        self.year += 1;
        for reservoir in Reservoir::ALL {
            let level = self.current[reservoir] + net_changes[reservoir];
            self.current[reservoir] = level;
            self.history[[reservoir.index(), self.year]] = level;
        }
    }

    /// Levels of one reservoir from year 0 to the current year.
    pub fn trajectory(&self, reservoir: Reservoir) -> Trajectory {
        Trajectory::from_values(
            self.history
                .slice(s![reservoir.index(), ..=self.year])
                .to_owned(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all_order() {
        for (i, reservoir) in Reservoir::ALL.iter().enumerate() {
            assert_eq!(reservoir.index(), i);
        }
    }

    #[test]
    fn name_round_trip() {
        for reservoir in Reservoir::ALL {
            assert_eq!(reservoir.name().parse::<Reservoir>(), Ok(reservoir));
        }
        assert!("magma".parse::<Reservoir>().is_err());
    }

    #[test]
    fn levels_indexing() {
        let mut levels = ReservoirLevels::zeros();
        levels[Reservoir::Soil] = 1900.0;
        levels.set(Reservoir::Atmosphere, 589.0);

        assert_eq!(levels.get(Reservoir::Soil), 1900.0);
        assert_eq!(levels[Reservoir::Atmosphere], 589.0);
        assert_eq!(levels[Reservoir::Permafrost], 0.0);
        assert_eq!(levels.total(), 2489.0);
    }

    #[test]
    fn advance_records_history() {
        let initial = ReservoirLevels::from_fn(|r| r.index() as FloatValue * 10.0);
        let mut state = ReservoirState::new(initial, 3);

        let mut change = ReservoirLevels::zeros();
        change[Reservoir::Atmosphere] = 2.0;
        change[Reservoir::Vegetation] = -1.0;

        state.advance(&change);
        state.advance(&change);

        assert!(state.is_full());
        assert_eq!(state.year(), 2);
        assert_eq!(
            state.trajectory(Reservoir::Atmosphere).to_vec(),
            vec![0.0, 2.0, 4.0]
        );
        assert_eq!(
            state.trajectory(Reservoir::Vegetation).to_vec(),
            vec![20.0, 19.0, 18.0]
        );
        // Untouched reservoirs keep their level
        assert_eq!(
            state.trajectory(Reservoir::Permafrost).to_vec(),
            vec![40.0, 40.0, 40.0]
        );
        assert_eq!(state.initial()[Reservoir::Atmosphere], 0.0);
    }

    #[test]
    fn single_year_run_is_full_immediately() {
        let state = ReservoirState::new(ReservoirLevels::zeros(), 1);
        assert!(state.is_full());
        assert_eq!(state.trajectory(Reservoir::Soil).len(), 1);
    }
}

//! Annual series of reservoir levels.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;

/// Index of a simulated year. Year 0 holds the initial stocks.
pub type Year = usize;

/// The annual levels of a single reservoir over a completed run.
///
/// Entry `t` is the level at the end of simulated year `t`; entry 0 is the
/// initial stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    values: Array1<FloatValue>,
}

impl Trajectory {
    pub fn from_values(values: Array1<FloatValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> ArrayView1<'_, FloatValue> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn at(&self, year: Year) -> Option<FloatValue> {
        self.values.get(year).copied()
    }

    /// Level at the start of the run
    pub fn initial(&self) -> Option<FloatValue> {
        self.at(0)
    }

    /// Level after the last simulated year
    pub fn latest(&self) -> Option<FloatValue> {
        self.values.iter().last().copied()
    }

    /// Change relative to the initial stock for every year.
    ///
    /// Useful for large reservoirs (the deep ocean) whose absolute level hides
    /// the signal.
    pub fn anomaly(&self) -> Array1<FloatValue> {
        match self.initial() {
            Some(initial) => self.values.mapv(|v| v - initial),
            None => Array1::zeros(0),
        }
    }

    pub fn to_vec(&self) -> Vec<FloatValue> {
        self.values.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn anomaly_is_relative_to_first_year() {
        let trajectory = Trajectory::from_values(array![100.0, 101.5, 99.0]);

        assert_eq!(trajectory.anomaly(), array![0.0, 1.5, -1.0]);
        assert_eq!(trajectory.initial(), Some(100.0));
        assert_eq!(trajectory.latest(), Some(99.0));
        assert_eq!(trajectory.at(3), None);
    }

    #[test]
    fn empty_trajectory() {
        let trajectory = Trajectory::from_values(Array1::zeros(0));
        assert!(trajectory.is_empty());
        assert_eq!(trajectory.latest(), None);
        assert_eq!(trajectory.anomaly().len(), 0);
    }
}

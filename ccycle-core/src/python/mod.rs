//! Python bindings
//!
//! Exposes scenario configuration and a single `run_scenario` entry point.
//! Results come back as plain dictionaries of numpy arrays and floats so the
//! plotting side needs no knowledge of the Rust types.

use crate::errors::CarbonCycleError;
use crate::reservoir::Reservoir;
use crate::scenario::{Buffering, Era, ResponseStyle, Scenario, ScenarioConfig};
use crate::timeseries::FloatValue;
use numpy::ToPyArray;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

impl From<CarbonCycleError> for PyErr {
    fn from(err: CarbonCycleError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Python wrapper for ScenarioConfig
///
/// Example:
///     config = ScenarioConfig(era="modern", run_length=200, response="variable")
#[pyclass]
#[pyo3(name = "ScenarioConfig")]
#[derive(Debug, Clone)]
pub struct PyScenarioConfig(pub ScenarioConfig);

#[pymethods]
impl PyScenarioConfig {
    #[new]
    #[pyo3(signature = (
        era="pre-industrial",
        run_length=crate::scenario::DEFAULT_RUN_LENGTH,
        response="constant",
        ocean_up=false,
        ocean_down=false,
        vegetation_up=false,
        vegetation_down=false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        era: &str,
        run_length: usize,
        response: &str,
        ocean_up: bool,
        ocean_down: bool,
        vegetation_up: bool,
        vegetation_down: bool,
    ) -> PyResult<Self> {
        let era: Era = era.parse()?;
        let response: ResponseStyle = response.parse()?;
        Ok(Self(
            ScenarioConfig::new(era, run_length)
                .with_response(response)
                .with_buffering(Buffering {
                    ocean_up,
                    ocean_down,
                    vegetation_up,
                    vegetation_down,
                }),
        ))
    }

    /// Parse a configuration from a TOML document
    #[staticmethod]
    fn from_toml(source: &str) -> PyResult<Self> {
        Ok(Self(ScenarioConfig::from_toml_str(source)?))
    }

    /// Start `reservoir` from `level` instead of its era baseline
    fn set_initial_level(&mut self, reservoir: &str, level: FloatValue) -> PyResult<()> {
        let reservoir: Reservoir = reservoir.parse().map_err(PyValueError::new_err)?;
        self.0 = self.0.clone().with_initial_level(reservoir, level);
        Ok(())
    }

    #[getter]
    fn era(&self) -> String {
        self.0.era.to_string()
    }

    #[getter]
    fn run_length(&self) -> usize {
        self.0.run_length
    }

    #[getter]
    fn response(&self) -> String {
        self.0.response.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "ScenarioConfig(era='{}', run_length={}, response='{}', buffering={:?})",
            self.0.era, self.0.run_length, self.0.response, self.0.buffering
        )
    }
}

/// Run a scenario and return its trajectories and final-year fluxes.
///
/// The returned dictionary holds:
///   - `trajectories`: reservoir name -> numpy array of annual levels
///   - `anomalies`: reservoir name -> numpy array of change from year 0
///   - `fluxes`: flux name -> final-year value
///   - `trends`: flux name -> "elevated", "reduced" or "unchanged"
///   - `net_exchanges`: exchange pair -> signed final-year net flux
///   - `total_change`: sum of the final-year net changes
#[pyfunction]
fn run_scenario<'py>(
    py: Python<'py>,
    config: PyRef<'_, PyScenarioConfig>,
) -> PyResult<Bound<'py, PyDict>> {
    let scenario = Scenario::new(config.0.clone())?;
    let results = scenario.run();
    let report = results.flux_report();

    let trajectories = PyDict::new_bound(py);
    let anomalies = PyDict::new_bound(py);
    for (reservoir, trajectory) in results.trajectories() {
        trajectories.set_item(reservoir.name(), trajectory.values().to_pyarray_bound(py))?;
        anomalies.set_item(reservoir.name(), trajectory.anomaly().to_pyarray_bound(py))?;
    }

    let fluxes = PyDict::new_bound(py);
    let trends = PyDict::new_bound(py);
    for value in &report.fluxes {
        fluxes.set_item(value.flux.name(), value.value)?;
        trends.set_item(value.flux.name(), value.trend.to_string())?;
    }

    let net_exchanges = PyDict::new_bound(py);
    for exchange in &report.exchanges {
        net_exchanges.set_item(exchange.pair.name(), exchange.net)?;
    }

    let out = PyDict::new_bound(py);
    out.set_item("era", results.era().to_string())?;
    out.set_item("trajectories", trajectories)?;
    out.set_item("anomalies", anomalies)?;
    out.set_item("fluxes", fluxes)?;
    out.set_item("trends", trends)?;
    out.set_item("net_exchanges", net_exchanges)?;
    out.set_item("total_change", results.total_change())?;
    Ok(out)
}

#[pymodule]
pub fn core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyScenarioConfig>()?;
    m.add_function(wrap_pyfunction!(run_scenario, m)?)?;
    Ok(())
}

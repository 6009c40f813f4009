use crate::element::{GeometryTolerance, DEFAULT_AREA_TOLERANCE, DEFAULT_SMALL_AREA_WARNING};
use crate::error::{Error, Result};
use json::JsonValue;

pub const DEFAULT_MAX_CG_ITERATIONS: u64 = 10_000;
pub const DEFAULT_TARGET_CG_COST: f64 = 1e-12;

/// Holds the tunables of an analysis run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Area at or below which an element is rejected as degenerate
    pub area_tolerance: f64,

    /// Area below which a warning is emitted
    pub small_area_warning: f64,

    pub max_cg_iterations: u64,

    /// Conjugate gradient stops when the residual norm falls below this times the load norm
    pub target_cg_cost: f64,

    /// Draws progress bars while looping over elements
    pub show_progress: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            area_tolerance: DEFAULT_AREA_TOLERANCE,
            small_area_warning: DEFAULT_SMALL_AREA_WARNING,
            max_cg_iterations: DEFAULT_MAX_CG_ITERATIONS,
            target_cg_cost: DEFAULT_TARGET_CG_COST,
            show_progress: false,
        }
    }
}

impl AnalysisConfig {
    pub fn geometry_tolerance(&self) -> GeometryTolerance {
        GeometryTolerance {
            area: self.area_tolerance,
            small_area_warning: self.small_area_warning,
        }
    }

    /// Loads overrides from a json file on top of the defaults
    pub fn read(config_file: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(config_file).map_err(|err| {
            Error::Config(format!("Unable to open config file {config_file}: {err}"))
        })?;
        AnalysisConfig::parse(&contents)
    }

    /// Parses json overrides on top of the defaults
    ///
    /// Unknown keys are ignored.
    pub fn parse(contents: &str) -> Result<Self> {
        let config_json = match json::parse(contents) {
            Ok(v) => v,
            Err(err) => return Err(Error::Config(format!("Error in config json: {err}"))),
        };
        if !config_json.is_object() {
            return Err(Error::Config("Config json must be an object".to_owned()));
        }

        let mut config = AnalysisConfig::default();
        if let Some(v) = optional_f64(&config_json, "area_tolerance")? {
            config.area_tolerance = v;
        }
        if let Some(v) = optional_f64(&config_json, "small_area_warning")? {
            config.small_area_warning = v;
        }
        if let Some(v) = optional_f64(&config_json, "target_cg_cost")? {
            config.target_cg_cost = v;
        }
        if config_json.has_key("max_cg_iterations") {
            config.max_cg_iterations = config_json["max_cg_iterations"]
                .as_u64()
                .ok_or_else(|| bad_value("max_cg_iterations"))?;
        }
        if config_json.has_key("show_progress") {
            config.show_progress = config_json["show_progress"]
                .as_bool()
                .ok_or_else(|| bad_value("show_progress"))?;
        }

        if !(config.area_tolerance >= 0.0) {
            return Err(Error::Config("area_tolerance must be non-negative".to_owned()));
        }
        Ok(config)
    }
}

fn optional_f64(config_json: &JsonValue, key: &str) -> Result<Option<f64>> {
    if !config_json.has_key(key) {
        return Ok(None);
    }
    config_json[key].as_f64().map(Some).ok_or_else(|| bad_value(key))
}

fn bad_value(key: &str) -> Error {
    Error::Config(format!("Bad value for {key} in config json"))
}

////////////////////////////////////////////////////////////////////////////////////////////////////

//! TOML-based pipeline configuration.
//!
//! All fields have defaults matching the original study setup (Germany,
//! 2013, hourly target resolution, demandlib industrial defaults). Load
//! from TOML with [`PipelineConfig::from_toml_file`] or use
//! [`PipelineConfig::baseline`].

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::batch::RunMode;
use crate::calendar::Region;
use crate::profile::industrial::{BusinessWindow, ProfileFactors};
use crate::series::Resolution;

/// Top-level pipeline configuration parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Run-wide parameters: year, region, mode, resolution.
    #[serde(default)]
    pub run: RunConfig,
    /// Industrial shaper parameters.
    #[serde(default)]
    pub industrial: IndustrialConfig,
}

/// Run-wide parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Target calendar year.
    pub year: i32,
    /// Holiday region: currently `"germany"`.
    pub region: String,
    /// Batch mode: `"timeseries"` or `"peak_load"`.
    pub mode: String,
    /// Output resolution: `"hour"` or `"quarter_hour"`.
    pub target_resolution: String,
    /// Units per streaming chunk (must be > 0).
    pub chunk_size: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            year: 2013,
            region: "germany".to_string(),
            mode: "timeseries".to_string(),
            target_resolution: "hour".to_string(),
            chunk_size: crate::batch::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Industrial shaper parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndustrialConfig {
    /// Start of the business-hour window (`HH:MM`).
    pub am: String,
    /// End of the business-hour window (`HH:MM`).
    pub pm: String,
    /// Weekday daytime scaling factor.
    pub week_day: f64,
    /// Weekday nighttime scaling factor.
    pub week_night: f64,
    /// Weekend daytime scaling factor.
    pub weekend_day: f64,
    /// Weekend nighttime scaling factor.
    pub weekend_night: f64,
}

impl Default for IndustrialConfig {
    fn default() -> Self {
        let factors = ProfileFactors::default();
        Self {
            am: "06:00".to_string(),
            pm: "22:00".to_string(),
            week_day: factors.week_day,
            week_night: factors.week_night,
            weekend_day: factors.weekend_day,
            weekend_night: factors.weekend_night,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"run.mode"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl PipelineConfig {
    /// Returns the baseline configuration (original study defaults).
    pub fn baseline() -> Self {
        Self {
            run: RunConfig::default(),
            industrial: IndustrialConfig::default(),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let r = &self.run;

        if !(1900..=2200).contains(&r.year) {
            errors.push(ConfigError {
                field: "run.year".into(),
                message: format!("must be within 1900–2200, got {}", r.year),
            });
        }
        if Region::from_str(&r.region).is_err() {
            errors.push(ConfigError {
                field: "run.region".into(),
                message: format!("no holiday rule set for \"{}\"", r.region),
            });
        }
        if RunMode::from_name(&r.mode).is_none() {
            errors.push(ConfigError {
                field: "run.mode".into(),
                message: format!(
                    "must be \"timeseries\" or \"peak_load\", got \"{}\"",
                    r.mode
                ),
            });
        }
        if self.target_resolution().is_none() {
            errors.push(ConfigError {
                field: "run.target_resolution".into(),
                message: format!(
                    "must be \"hour\" or \"quarter_hour\", got \"{}\"",
                    r.target_resolution
                ),
            });
        }
        if r.chunk_size == 0 {
            errors.push(ConfigError {
                field: "run.chunk_size".into(),
                message: "must be > 0".into(),
            });
        }

        let ind = &self.industrial;
        if BusinessWindow::parse(&ind.am, &ind.pm).is_err() {
            errors.push(ConfigError {
                field: "industrial.am".into(),
                message: format!(
                    "\"{}\"–\"{}\" is not a valid HH:MM window",
                    ind.am, ind.pm
                ),
            });
        }
        for (field, value) in [
            ("industrial.week_day", ind.week_day),
            ("industrial.week_night", ind.week_night),
            ("industrial.weekend_day", ind.weekend_day),
            ("industrial.weekend_night", ind.weekend_night),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be a non-negative finite number".into(),
                });
            }
        }

        errors
    }

    /// Parsed target resolution, if valid.
    pub fn target_resolution(&self) -> Option<Resolution> {
        match self.run.target_resolution.as_str() {
            "hour" => Some(Resolution::Hour),
            "quarter_hour" => Some(Resolution::QuarterHour),
            _ => None,
        }
    }

    /// Parsed run mode, if valid.
    pub fn mode(&self) -> Option<RunMode> {
        RunMode::from_name(&self.run.mode)
    }

    /// Industrial profile factors from the config values.
    pub fn profile_factors(&self) -> ProfileFactors {
        ProfileFactors {
            week_day: self.industrial.week_day,
            week_night: self.industrial.week_night,
            weekend_day: self.industrial.weekend_day,
            weekend_night: self.industrial.weekend_night,
        }
    }
}

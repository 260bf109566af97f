//! A JSON configuration file providing defaults for the driver's
//! per-problem knobs, overridable field-by-field by CLI flags — the same
//! precedence rule this crate's existing CLI already applies when a flag
//! and a config file both supply a value.

use serde::Deserialize;

use crate::driver::ProblemConfig;
use crate::error::ProblemError;
use crate::time::Time;

#[derive(Debug, Default, Deserialize)]
pub struct Configuration {
    pub algorithm: Option<String>,
    pub objective: Option<String>,
    pub switch_time: Option<Time>,
    pub initial_step: Option<Time>,
    pub trial_limit: Option<u32>,
    pub margin: Option<f64>,
}

impl Configuration {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ProblemError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| ProblemError::InputError(format!("reading {}: {err}", path.display())))?;

        serde_json::from_str(&raw)
            .map_err(|err| ProblemError::InputError(format!("parsing {}: {err}", path.display())))
    }

    /// CLI-flag overrides, applied field-by-field over this file's
    /// defaults; a `None` override leaves the file's value (or this
    /// struct's own default) in place.
    pub fn resolve(&self, overrides: &CliOverrides) -> ProblemConfig {
        let defaults = ProblemConfig::default();

        ProblemConfig {
            algorithm: overrides.algorithm.clone().or_else(|| self.algorithm.clone())
                .unwrap_or(defaults.algorithm),
            objective: overrides.objective.clone().or_else(|| self.objective.clone())
                .unwrap_or(defaults.objective),
            switch_time: overrides.switch_time.or(self.switch_time).unwrap_or(defaults.switch_time),
            initial_step: overrides.initial_step.or(self.initial_step).unwrap_or(defaults.initial_step),
            margin: overrides.margin.or(self.margin).unwrap_or(defaults.margin),
            rng_seed: overrides.rng_seed.unwrap_or(defaults.rng_seed),
            trial_limit: overrides.trial_limit.or(self.trial_limit).or(defaults.trial_limit),
        }
    }
}

/// CLI-flag values that, when present, take precedence over the
/// configuration file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub algorithm: Option<String>,
    pub objective: Option<String>,
    pub switch_time: Option<Time>,
    pub initial_step: Option<Time>,
    pub margin: Option<f64>,
    pub rng_seed: Option<u64>,
    pub trial_limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_override_wins_over_config_file() {
        let config = Configuration { algorithm: Some("rm".to_string()), ..Default::default() };
        let overrides = CliOverrides { algorithm: Some("edf".to_string()), ..Default::default() };

        let resolved = config.resolve(&overrides);
        assert_eq!(resolved.algorithm, "edf");
    }

    #[test]
    fn config_file_value_used_when_no_override() {
        let config = Configuration { objective: Some("end_to_end_delay".to_string()), ..Default::default() };
        let resolved = config.resolve(&CliOverrides::default());

        assert_eq!(resolved.objective, "end_to_end_delay");
    }

    #[test]
    fn falls_back_to_builtin_defaults() {
        let resolved = Configuration::default().resolve(&CliOverrides::default());
        assert_eq!(resolved.algorithm, ProblemConfig::default().algorithm);
    }

    #[test]
    fn trial_limit_from_config_file_is_kept_when_no_override() {
        let config = Configuration { trial_limit: Some(5), ..Default::default() };
        let resolved = config.resolve(&CliOverrides::default());

        assert_eq!(resolved.trial_limit, Some(5));
    }

    #[test]
    fn trial_limit_override_wins_over_config_file() {
        let config = Configuration { trial_limit: Some(5), ..Default::default() };
        let overrides = CliOverrides { trial_limit: Some(1), ..Default::default() };

        assert_eq!(config.resolve(&overrides).trial_limit, Some(1));
    }
}

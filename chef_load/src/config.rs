//! This module controls configuration parsing from the end user, providing a
//! convenience mechanism for the rest of the program. Crashes are most likely
//! to originate from this code, intentionally.

use std::{fs, path::Path};

use serde::Deserialize;

use chef_load_payload::facts;

/// Token every Automate deployment used to accept out of the box. Replace it
/// in real runs.
const DEFAULT_TOKEN: &str = "93a49a4f2482c64126f7b6015e6b0f30284287ee4054ff8807fb63d9cbd1c506";

/// Errors produced by [`Config`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error for a serde [`serde_yaml`].
    #[error("Failed to deserialize yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Error for IO operations when reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

fn default_data_collector_url() -> String {
    "http://localhost:9611/data-collector/v0/".to_string()
}

fn default_token() -> String {
    DEFAULT_TOKEN.to_string()
}

fn default_num_actions() -> u32 {
    30
}

fn default_random_data() -> bool {
    true
}

fn default_queue_depth() -> usize {
    128
}

/// Main configuration struct for this program
#[derive(Debug, Deserialize, serde::Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// The data-collector endpoint to deliver actions to
    pub data_collector_url: String,
    /// The token the endpoint authenticates collectors with
    pub data_collector_token: String,
    /// How many actions to generate for the run
    pub num_actions: u32,
    /// Whether fields are randomized per event. When false every event is a
    /// defaulted node action.
    pub random_data: bool,
    /// Seed for the run's randomness. Unset seeds from OS entropy; set, the
    /// run is reproducible.
    pub seed: Option<[u8; 32]>,
    /// Capacity of the dispatch channel between generation and transmission
    pub queue_depth: usize,
    /// Candidate fact lists the randomizer draws from
    pub facts: facts::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_collector_url: default_data_collector_url(),
            data_collector_token: default_token(),
            num_actions: default_num_actions(),
            random_data: default_random_data(),
            seed: None,
            queue_depth: default_queue_depth(),
            facts: facts::Config::default(),
        }
    }
}

impl Config {
    /// Read configuration from a yaml file at `path`.
    ///
    /// # Errors
    ///
    /// Function will error if the file cannot be read or does not deserialize
    /// to a valid [`Config`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Render the default configuration as yaml, suitable as a starting
    /// config file.
    ///
    /// # Errors
    ///
    /// Function will error if the default configuration fails to serialize,
    /// which would be a programming error.
    pub fn sample() -> Result<String, Error> {
        Ok(serde_yaml::to_string(&Config::default())?)
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Config = serde_yaml::from_str("{}").expect("empty mapping must parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.num_actions, 30);
        assert!(config.random_data);
        assert!(config.seed.is_none());
    }

    #[test]
    fn sample_round_trips() {
        let sample = Config::sample().expect("sample must render");
        let config: Config = serde_yaml::from_str(&sample).expect("sample must parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("interval: 30\n");
        assert!(result.is_err());
    }

    #[test]
    fn overrides_apply() {
        let config: Config = serde_yaml::from_str(
            "num_actions: 5\nrandom_data: false\ndata_collector_url: http://localhost:9611/\nfacts:\n  organizations: [sole-org]\n",
        )
        .expect("overrides must parse");
        assert_eq!(config.num_actions, 5);
        assert!(!config.random_data);
        assert_eq!(config.data_collector_url, "http://localhost:9611/");
        assert_eq!(config.facts.organizations, vec!["sole-org".to_string()]);
        // Untouched sections keep their defaults.
        assert!(!config.facts.cookbooks.is_empty());
    }
}

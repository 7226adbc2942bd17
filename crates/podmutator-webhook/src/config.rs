//! Mutation config loading
//!
//! Each input lives in its own JSON file whose path can be overridden by flag
//! or environment variable. A file that is missing or malformed is logged and
//! skipped; it never prevents the webhook from starting.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use podmutator_patch::{Labels, MutationConfig, SpreadConstraint};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, warn};

/// Errors reading a single config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("could not read config file {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file is not valid JSON of the expected shape
    #[error("could not parse config file {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },
}

/// Where config file contents come from
///
/// Abstracted so the loader can be tested without touching the filesystem.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigSource: Send + Sync {
    /// Read the whole file at `path`
    fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads config files from the local filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct FsConfigSource;

impl ConfigSource for FsConfigSource {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Locations of the mutation config files
#[derive(clap::Args, Clone, Debug, PartialEq)]
pub struct ConfigPaths {
    /// JSON object of labels to add to Pods
    #[arg(
        long = "labels-config",
        env = "LABELS_CONFIG_FILE",
        default_value = "/etc/webhook/config/labels.json"
    )]
    pub labels: PathBuf,

    /// JSON object of node selector entries to set on Pods
    #[arg(
        long = "node-selector-config",
        env = "NODE_SELECTOR_LABELS_CONFIG_FILE",
        default_value = "/etc/webhook/config/nodeSelectorLabels.json"
    )]
    pub node_selector: PathBuf,

    /// JSON object of labels a Pod must carry to be mutated
    #[arg(
        long = "pod-selector-config",
        env = "POD_SELECTOR_LABELS_CONFIG_FILE",
        default_value = "/etc/webhook/config/podSelectorLabels.json"
    )]
    pub pod_selector: PathBuf,

    /// JSON array of topology spread constraints to merge into Pods
    #[arg(
        long = "topology-config",
        env = "TOPOLOGY_SPREAD_CONSTRAINTS_CONFIG_FILE",
        default_value = "/etc/webhook/config/topologySpreadConstraints.json"
    )]
    pub topology_spread_constraints: PathBuf,
}

/// Load every config file and assemble the mutation config.
///
/// Files are independent: a failure in one leaves only that field empty.
/// The pod selector gate is disabled only when its file does not exist; a
/// file that exists but cannot be used enables an empty gate.
pub fn load_mutation_config(source: &dyn ConfigSource, paths: &ConfigPaths) -> MutationConfig {
    let labels: Labels = load_or_warn(source, &paths.labels).unwrap_or_default();
    if labels.is_empty() {
        info!("no labels configured, using default mutated=true");
    }
    let node_selector: Labels = load_or_warn(source, &paths.node_selector).unwrap_or_default();
    let pod_selector = load_pod_selector(source, &paths.pod_selector);
    let topology: Vec<SpreadConstraint> =
        load_or_warn(source, &paths.topology_spread_constraints).unwrap_or_default();

    MutationConfig::new(labels, node_selector, topology, pod_selector)
}

/// Read and parse one JSON config file
pub fn load_file<T: DeserializeOwned>(
    source: &dyn ConfigSource,
    path: &Path,
) -> Result<T, ConfigError> {
    let raw = source.read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_pod_selector(source: &dyn ConfigSource, path: &Path) -> Option<Labels> {
    match load_file(source, path) {
        Ok(selector) => {
            info!(path = %path.display(), "loaded config file");
            Some(selector)
        }
        Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no pod selector configured, gate disabled");
            None
        }
        Err(e) => {
            warn!(error = %e, "unusable pod selector file, gating with empty selector");
            Some(Labels::new())
        }
    }
}

fn load_or_warn<T: DeserializeOwned>(source: &dyn ConfigSource, path: &Path) -> Option<T> {
    match load_file(source, path) {
        Ok(value) => {
            info!(path = %path.display(), "loaded config file");
            Some(value)
        }
        Err(e) => {
            warn!(error = %e, "skipping config file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    fn paths() -> ConfigPaths {
        ConfigPaths {
            labels: PathBuf::from("/cfg/labels.json"),
            node_selector: PathBuf::from("/cfg/nodeSelectorLabels.json"),
            pod_selector: PathBuf::from("/cfg/podSelectorLabels.json"),
            topology_spread_constraints: PathBuf::from("/cfg/topologySpreadConstraints.json"),
        }
    }

    /// Mock serving `files` and reporting NotFound for everything else
    fn source(files: &[(&str, &str)]) -> MockConfigSource {
        let files: Vec<(PathBuf, String)> = files
            .iter()
            .map(|(p, c)| (PathBuf::from(p), c.to_string()))
            .collect();
        let mut mock = MockConfigSource::new();
        mock.expect_read().returning(move |path| {
            files
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, c)| c.clone())
                .ok_or_else(|| Error::new(ErrorKind::NotFound, "no such file"))
        });
        mock
    }

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn all_files_missing_yields_defaults() {
        let config = load_mutation_config(&source(&[]), &paths());
        assert_eq!(config, MutationConfig::default());
        assert_eq!(config.labels, labels(&[("mutated", "true")]));
        assert!(config.pod_selector.is_none());
    }

    #[test]
    fn every_file_is_loaded() {
        let mock = source(&[
            ("/cfg/labels.json", r#"{"team": "infra"}"#),
            ("/cfg/nodeSelectorLabels.json", r#"{"disktype": "ssd"}"#),
            ("/cfg/podSelectorLabels.json", r#"{"env": "prod"}"#),
            (
                "/cfg/topologySpreadConstraints.json",
                r#"[{"topologyKey": "zone", "maxSkew": 1, "whenUnsatisfiable": "DoNotSchedule"}]"#,
            ),
        ]);
        let config = load_mutation_config(&mock, &paths());

        assert_eq!(config.labels, labels(&[("team", "infra")]));
        assert_eq!(config.node_selector, labels(&[("disktype", "ssd")]));
        assert_eq!(config.pod_selector, Some(labels(&[("env", "prod")])));
        assert_eq!(config.topology_spread_constraints.len(), 1);
        assert_eq!(config.topology_spread_constraints[0].topology_key, "zone");
    }

    #[test]
    fn one_bad_file_does_not_stop_the_others() {
        let mock = source(&[
            ("/cfg/labels.json", "not json"),
            ("/cfg/nodeSelectorLabels.json", r#"{"disktype": "ssd"}"#),
        ]);
        let config = load_mutation_config(&mock, &paths());

        assert_eq!(config.labels, labels(&[("mutated", "true")]));
        assert_eq!(config.node_selector, labels(&[("disktype", "ssd")]));
    }

    #[test]
    fn empty_labels_file_uses_default() {
        let mock = source(&[("/cfg/labels.json", "{}")]);
        let config = load_mutation_config(&mock, &paths());
        assert_eq!(config.labels, labels(&[("mutated", "true")]));
    }

    #[test]
    fn empty_pod_selector_file_enables_gate() {
        let mock = source(&[("/cfg/podSelectorLabels.json", "{}")]);
        let config = load_mutation_config(&mock, &paths());
        assert_eq!(config.pod_selector, Some(Labels::new()));
    }

    #[test]
    fn malformed_pod_selector_file_enables_empty_gate() {
        let mock = source(&[("/cfg/podSelectorLabels.json", r#"{"env": ["prod"]}"#)]);
        let config = load_mutation_config(&mock, &paths());
        assert_eq!(config.pod_selector, Some(Labels::new()));
    }

    #[test]
    fn unreadable_pod_selector_file_enables_empty_gate() {
        let mut mock = MockConfigSource::new();
        mock.expect_read().returning(|path| {
            if path == Path::new("/cfg/podSelectorLabels.json") {
                Err(Error::new(ErrorKind::PermissionDenied, "denied"))
            } else {
                Err(Error::new(ErrorKind::NotFound, "no such file"))
            }
        });
        let config = load_mutation_config(&mock, &paths());
        assert_eq!(config.pod_selector, Some(Labels::new()));
    }

    #[test]
    fn constraint_without_topology_key_rejects_file() {
        let mock = source(&[(
            "/cfg/topologySpreadConstraints.json",
            r#"[{"topologyKey": "zone", "maxSkew": 1}, {"maxSkew": 2}]"#,
        )]);
        let config = load_mutation_config(&mock, &paths());
        assert!(config.topology_spread_constraints.is_empty());
    }

    #[test]
    fn load_file_reports_read_errors() {
        let mut mock = MockConfigSource::new();
        mock.expect_read()
            .withf(|path| path == Path::new("/cfg/labels.json"))
            .returning(|_| Err(Error::new(ErrorKind::PermissionDenied, "denied")));

        let err = load_file::<Labels>(&mock, Path::new("/cfg/labels.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/cfg/labels.json"));
    }

    #[test]
    fn load_file_reports_parse_errors() {
        let mut mock = MockConfigSource::new();
        mock.expect_read()
            .times(1)
            .returning(|_| Ok(r#"{"team": 42}"#.to_string()));

        let err = load_file::<Labels>(&mock, Path::new("/cfg/labels.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn fs_source_reads_real_files() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"team": "infra"}"#).expect("file should be written");

        let loaded: Labels = load_file(&FsConfigSource, &path).expect("file should load");
        assert_eq!(loaded, labels(&[("team", "infra")]));

        let missing = load_file::<Labels>(&FsConfigSource, &dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}

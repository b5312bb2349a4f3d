use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Settings shared by the sample programs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Period between snapshots, in milliseconds.
    pub interval_ms: u64,
    /// Run time for telemetry, flight time for the drone. `0` means until
    /// interrupted (telemetry) or the default mission length (drone).
    pub duration_secs: u64,
    /// Fixed seed for reproducible producer output.
    pub seed: Option<u64>,
    /// Pretty-print JSON snapshots.
    pub pretty: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            duration_secs: 10,
            seed: None,
            pretty: false,
        }
    }
}

impl SimulationConfig {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid simulation config")
    }

    /// Read settings from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// `None` when the run is unbounded.
    pub fn duration(&self) -> Option<Duration> {
        (self.duration_secs > 0).then(|| Duration::from_secs(self.duration_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = SimulationConfig::default();
        assert_eq!(c.interval(), Duration::from_millis(1000));
        assert_eq!(c.duration(), Some(Duration::from_secs(10)));
        assert!(c.seed.is_none());
        assert!(!c.pretty);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = SimulationConfig::from_toml("interval_ms = 250\nseed = 42\n").unwrap();
        assert_eq!(c.interval_ms, 250);
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.duration_secs, 10);
    }

    #[test]
    fn zero_duration_is_unbounded() {
        let c = SimulationConfig {
            duration_secs: 0,
            ..Default::default()
        };
        assert_eq!(c.duration(), None);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let c = SimulationConfig {
            interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(c.interval(), Duration::from_millis(1));
    }

    #[test]
    fn rejects_bad_types() {
        assert!(SimulationConfig::from_toml("interval_ms = \"fast\"").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "duration_secs = 0\npretty = true").unwrap();
        let c = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(c.duration_secs, 0);
        assert!(c.pretty);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SimulationConfig::load(&dir.path().join("absent.toml")).is_err());
    }
}

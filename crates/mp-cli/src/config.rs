//! Planner process configuration from environment.

use mp_core::{PlannerConfig, QueuePath};
use mp_link::SessionConfig;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub colliders: PathBuf,
    pub navlog_dir: PathBuf,
    pub seed: Option<u64>,
    pub planner: PlannerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = PlannerConfig::default();
        let parse_f64 = |key: &str, default: f64| {
            lookup(key)
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };
        Self {
            colliders: lookup("MP_COLLIDERS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("colliders.csv")),
            navlog_dir: lookup("MP_NAVLOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("Logs")),
            seed: lookup("MP_SEED").and_then(|s| s.parse().ok()),
            planner: PlannerConfig {
                target_altitude: parse_f64("MP_TARGET_ALTITUDE", defaults.target_altitude),
                safety_distance: parse_f64("MP_SAFETY_DISTANCE", defaults.safety_distance),
                queue_path: match lookup("MP_QUEUE_PATH").as_deref() {
                    Some("pruned") => QueuePath::Pruned,
                    Some("raw") | None => QueuePath::Raw,
                    Some(other) => {
                        tracing::warn!(value = other, "unknown MP_QUEUE_PATH, using raw");
                        QueuePath::Raw
                    }
                },
                ..defaults
            },
        }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            seed: self.seed,
            ..SessionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]);
        assert_eq!(config.colliders, PathBuf::from("colliders.csv"));
        assert_eq!(config.navlog_dir, PathBuf::from("Logs"));
        assert_eq!(config.seed, None);
        assert_eq!(config.planner.target_altitude, 5.0);
        assert_eq!(config.planner.safety_distance, 5.0);
        assert_eq!(config.planner.queue_path, QueuePath::Raw);
    }

    #[test]
    fn overrides_from_environment() {
        let config = config(&[
            ("MP_COLLIDERS", "data/colliders.csv"),
            ("MP_SEED", "42"),
            ("MP_TARGET_ALTITUDE", "10"),
            ("MP_QUEUE_PATH", "pruned"),
        ]);
        assert_eq!(config.colliders, PathBuf::from("data/colliders.csv"));
        assert_eq!(config.session().seed, Some(42));
        assert_eq!(config.planner.target_altitude, 10.0);
        assert_eq!(config.planner.safety_distance, 5.0);
        assert_eq!(config.planner.queue_path, QueuePath::Pruned);
    }

    #[test]
    fn unparsable_values_fall_back() {
        let config = config(&[("MP_SEED", "abc"), ("MP_SAFETY_DISTANCE", "far")]);
        assert_eq!(config.seed, None);
        assert_eq!(config.planner.safety_distance, 5.0);
    }
}

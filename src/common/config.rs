//! Runtime configuration loaded from the process environment.

use std::env;
use std::path::PathBuf;

/// Snapshot of configuration values consumed by the binaries.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub data_root: PathBuf,
    pub dataset_path: PathBuf,
    pub bundle_dir: PathBuf,
    pub log_filter: Option<String>,
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_root = PathBuf::from(get("SYMPREDICT_DATA_ROOT").unwrap_or_else(|| "./data".into()));
        let dataset_path = get("SYMPREDICT_DATASET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root.join("finaldata.csv"));
        let bundle_dir = get("SYMPREDICT_BUNDLE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root.join("model"));

        Self {
            data_root,
            dataset_path,
            bundle_dir,
            log_filter: get("SYMPREDICT_LOG"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_hang_off_data_root() {
        let cfg = AppCfg::from_lookup(|_| None);
        assert_eq!(cfg.data_root, PathBuf::from("./data"));
        assert_eq!(cfg.dataset_path, PathBuf::from("./data/finaldata.csv"));
        assert_eq!(cfg.bundle_dir, PathBuf::from("./data/model"));
        assert!(cfg.log_filter.is_none());
    }

    #[test]
    fn explicit_values_win() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SYMPREDICT_DATA_ROOT", "/srv/sym"),
            ("SYMPREDICT_BUNDLE_DIR", "/opt/bundle"),
            ("SYMPREDICT_LOG", "debug"),
            ("SYMPREDICT_DATASET", "  "),
        ]);
        let cfg = AppCfg::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.dataset_path, PathBuf::from("/srv/sym/finaldata.csv"));
        assert_eq!(cfg.bundle_dir, PathBuf::from("/opt/bundle"));
        assert_eq!(cfg.log_filter.as_deref(), Some("debug"));
    }
}

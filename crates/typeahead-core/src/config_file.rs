use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::http::SearchConfig;
use crate::config::TypeaheadConfig;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub search: Option<SearchSection>,
    pub typeahead: Option<TypeaheadSection>,
    pub display: Option<DisplaySection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSection {
    pub src: Option<String>,
    pub query_param: Option<String>,
    pub params: Option<BTreeMap<String, String>>,
    pub results_pointer: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeaheadSection {
    pub min_chars: Option<usize>,
    pub select_first: Option<bool>,
    pub limit: Option<usize>,
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySection {
    pub theme: Option<String>,
    pub label_fields: Option<Vec<String>>,
}

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),
}

/// Platform config directory path: `<config_dir>/typeahead/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("typeahead").join("config.toml"))
}

/// Load config by cascading CWD `.typeahead.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".typeahead.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Take a field from `overlay` if set there, else from `base`.
fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bs, os) = (base.search.as_ref(), overlay.search.as_ref());
    let (bt, ot) = (base.typeahead.as_ref(), overlay.typeahead.as_ref());
    let (bd, od) = (base.display.as_ref(), overlay.display.as_ref());

    ConfigFile {
        search: Some(SearchSection {
            src: pick(os, bs, |s| s.src.clone()),
            query_param: pick(os, bs, |s| s.query_param.clone()),
            params: pick(os, bs, |s| s.params.clone()),
            results_pointer: pick(os, bs, |s| s.results_pointer.clone()),
            timeout_secs: pick(os, bs, |s| s.timeout_secs),
        }),
        typeahead: Some(TypeaheadSection {
            min_chars: pick(ot, bt, |t| t.min_chars),
            select_first: pick(ot, bt, |t| t.select_first),
            limit: pick(ot, bt, |t| t.limit),
            debounce_ms: pick(ot, bt, |t| t.debounce_ms),
        }),
        display: Some(DisplaySection {
            theme: pick(od, bd, |d| d.theme.clone()),
            label_fields: pick(od, bd, |d| d.label_fields.clone()),
        }),
    }
}

impl ConfigFile {
    /// Engine settings, with defaults for anything unset.
    pub fn typeahead_config(&self) -> TypeaheadConfig {
        let defaults = TypeaheadConfig::default();
        let Some(t) = &self.typeahead else {
            return defaults;
        };
        TypeaheadConfig {
            min_chars: t.min_chars.unwrap_or(defaults.min_chars),
            select_first: t.select_first.unwrap_or(defaults.select_first),
            limit: t.limit.or(defaults.limit),
            debounce_ms: t.debounce_ms.unwrap_or(defaults.debounce_ms),
        }
    }

    /// Backend settings, with defaults for anything unset.
    pub fn search_config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        let Some(s) = &self.search else {
            return defaults;
        };
        SearchConfig {
            src: s.src.clone().unwrap_or(defaults.src),
            query_param: s.query_param.clone().unwrap_or(defaults.query_param),
            params: s.params.clone().unwrap_or(defaults.params),
            results_pointer: s.results_pointer.clone().or(defaults.results_pointer),
            timeout_secs: s.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, ConfigFileError> {
    let path = config_path().ok_or(ConfigFileError::NoConfigDir)?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Write `config` to `path`, creating parent directories as needed.
pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), ConfigFileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typeahead_section_round_trip_toml() {
        let config = ConfigFile {
            typeahead: Some(TypeaheadSection {
                min_chars: Some(3),
                select_first: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        let t = parsed.typeahead_config();
        assert_eq!(t.min_chars, 3);
        assert!(t.select_first);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let parsed: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(parsed.typeahead_config(), TypeaheadConfig::default());
        assert_eq!(parsed.search_config(), SearchConfig::default());
    }

    #[test]
    fn search_params_parse_as_table() {
        let toml_str = "[search]\nsrc = \"https://example.org/api/disasters\"\nresults_pointer = \"/data\"\n\n[search.params]\nlimit = \"10\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let s = parsed.search_config();
        assert_eq!(s.src, "https://example.org/api/disasters");
        assert_eq!(s.results_pointer.as_deref(), Some("/data"));
        assert_eq!(s.params.get("limit").map(String::as_str), Some("10"));
        assert_eq!(s.query_param, "q");
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            search: Some(SearchSection {
                src: Some("https://base.example/search".to_string()),
                timeout_secs: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            search: Some(SearchSection {
                src: Some("https://overlay.example/search".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).search_config();
        assert_eq!(merged.src, "https://overlay.example/search");
        assert_eq!(merged.timeout_secs, 5);
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            display: Some(DisplaySection {
                label_fields: Some(vec!["title".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.display.unwrap().label_fields.unwrap(),
            vec!["title".to_string()]
        );
    }

    #[test]
    fn save_then_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ConfigFile {
            typeahead: Some(TypeaheadSection {
                debounce_ms: Some(150),
                ..Default::default()
            }),
            ..Default::default()
        };
        save_to_path(&config, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded.typeahead_config().debounce_ms, 150);
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[typeahead\nmin_chars = ").unwrap();
        assert!(load_from_path(&path).is_none());
    }

    #[test]
    fn missing_file_is_none() {
        assert!(load_from_path(Path::new("/nonexistent/typeahead.toml")).is_none());
    }
}

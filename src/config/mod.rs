#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::TodoError;
use crate::task::model::{DEFAULT_CATEGORY, Priority};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub defaults: DefaultsConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Task file; relative paths resolve against the working directory.
    #[serde(alias = "file")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "tasks.json".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub priority: Priority,
    pub category: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            priority: Priority::Medium,
            category: DEFAULT_CATEGORY.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub icons: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { icons: true }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
}

pub fn default_paths() -> anyhow::Result<ConfigPaths> {
    let unix = home_config_path_unix();
    if !cfg!(windows) {
        return Ok(ConfigPaths { config_file: unix });
    }

    // Windows: prefer the Unix-style path if present for portability.
    if unix.exists() {
        return Ok(ConfigPaths { config_file: unix });
    }

    let proj = ProjectDirs::from("com", "todolist", "todolist")
        .context("failed to determine platform config directory")?;
    Ok(ConfigPaths {
        config_file: proj.config_dir().join("config.toml"),
    })
}

fn home_config_path_unix() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    home.join(".config").join("todolist").join("config.toml")
}

fn home_dir() -> Option<PathBuf> {
    if let Some(v) = std::env::var_os("HOME") {
        return Some(PathBuf::from(v));
    }
    if let Some(v) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(v));
    }
    let drive = std::env::var_os("HOMEDRIVE");
    let path = std::env::var_os("HOMEPATH");
    match (drive, path) {
        (Some(d), Some(p)) => Some(PathBuf::from(d).join(PathBuf::from(p))),
        _ => None,
    }
}

#[must_use]
pub fn expand_tilde(input: &str) -> String {
    if let Some(rest) = input.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(rest).to_string_lossy().to_string();
    }
    input.to_owned()
}

/// Shortens paths under the home directory for display.
#[must_use]
pub fn tilde_path(input: &str) -> String {
    let Some(home) = home_dir() else {
        return input.to_owned();
    };
    let home_str = home.to_string_lossy();
    if let Some(rest) = input.strip_prefix(home_str.as_ref()) {
        if rest.is_empty() {
            return "~".to_owned();
        }
        if rest.starts_with(std::path::MAIN_SEPARATOR) {
            return format!("~{rest}");
        }
    }
    input.to_owned()
}

pub fn expand_path(input: &str) -> anyhow::Result<PathBuf> {
    let expanded = expand_env_vars(&expand_tilde(input));
    let p = PathBuf::from(expanded);
    if p.is_absolute() {
        return Ok(p);
    }
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(cwd.join(p))
}

fn expand_env_vars(input: &str) -> String {
    // Expand $VAR and ${VAR}. Leave unknown vars untouched.
    let Ok(re) = regex::Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?") else {
        return input.to_owned();
    };
    re.replace_all(input, |caps: &regex::Captures<'_>| {
        let key = &caps[1];
        std::env::var(key).unwrap_or_else(|_| caps[0].to_owned())
    })
    .to_string()
}

pub fn load() -> anyhow::Result<(Config, toml_edit::DocumentMut, ConfigPaths)> {
    let paths = default_paths()?;
    let (doc, cfg) = load_from_file(&paths.config_file)?;
    cfg.validate()?;
    Ok((cfg, doc, paths))
}

pub fn list_resolved_toml() -> anyhow::Result<String> {
    let (cfg, _doc, _paths) = load()?;
    Ok(toml::to_string_pretty(&cfg)?)
}

pub fn get_value_string(key: &str) -> anyhow::Result<Option<String>> {
    let paths = default_paths()?;
    get_value_string_at_path(&paths.config_file, key)
}

pub fn set_value_string(key: &str, value: &str) -> anyhow::Result<()> {
    let paths = default_paths()?;
    set_value_string_at_path(&paths.config_file, key, value)
}

fn load_from_file(path: &Path) -> anyhow::Result<(toml_edit::DocumentMut, Config)> {
    if !path.exists() {
        return Ok((toml_edit::DocumentMut::new(), Config::default()));
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let doc = raw
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("failed to parse TOML in {}", path.display()))?;

    let cfg: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to deserialize TOML in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok((doc, cfg))
}

pub fn get_value_string_at_path(path: &Path, key: &str) -> anyhow::Result<Option<String>> {
    let (_doc, cfg) = load_from_file(path)?;
    cfg.validate()?;

    let norm = normalize_key(key);
    let value = lookup_value(&cfg, &norm);
    Ok(value.map(format_value_for_stdout))
}

pub fn set_value_string_at_path(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let (mut doc, cfg) = load_from_file(path)?;
    cfg.validate()?;

    let (norm_key, value_item) = normalize_key_and_parse_value(key, value)?;
    apply_set(&mut doc, &norm_key, value_item)?;

    // Validate by re-parsing the updated doc into a Config.
    let new_raw = doc.to_string();
    let new_cfg: Config = toml::from_str(&new_raw)
        .with_context(|| format!("config update produced invalid TOML for {}", path.display()))?;
    new_cfg.validate()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, new_raw.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

impl Config {
    pub fn validate(&self) -> Result<(), TodoError> {
        if self.store.path.trim().is_empty() {
            return Err(TodoError::Config("store.path must not be empty".to_owned()));
        }
        Ok(())
    }

    /// Resolved location of the task file, with an optional override.
    pub fn store_path(&self, override_path: Option<&Path>) -> anyhow::Result<PathBuf> {
        match override_path {
            Some(p) => expand_path(&p.to_string_lossy()),
            None => expand_path(&self.store.path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyType {
    Bool,
    String,
    Enum(&'static [&'static str]),
}

fn normalize_key(key: &str) -> String {
    match key {
        "store.file" | "file" => "store.path",
        "priority" => "defaults.priority",
        "category" => "defaults.category",
        "icons" => "ui.icons",
        _ => key,
    }
    .to_owned()
}

fn normalize_key_and_parse_value(
    key: &str,
    value: &str,
) -> anyhow::Result<(String, toml_edit::Item)> {
    let norm = normalize_key(key);
    let key_type = key_type(&norm).ok_or_else(|| TodoError::InvalidConfigKey(key.to_owned()))?;
    let item = match key_type {
        KeyType::Bool => {
            toml_edit::value(
                parse_bool(value).map_err(|msg| TodoError::InvalidConfigValue {
                    key: key.to_owned(),
                    msg,
                })?,
            )
        }
        KeyType::String => toml_edit::value(value),
        KeyType::Enum(allowed) => {
            let v = value.trim().to_ascii_lowercase();
            if !allowed.contains(&v.as_str()) {
                return Err(TodoError::InvalidConfigValue {
                    key: key.to_owned(),
                    msg: format!("must be one of: {}", allowed.join(", ")),
                }
                .into());
            }
            toml_edit::value(v)
        }
    };

    Ok((norm, item))
}

fn key_type(key: &str) -> Option<KeyType> {
    Some(match key {
        "store.path" | "defaults.category" => KeyType::String,
        "ui.icons" => KeyType::Bool,
        "defaults.priority" => KeyType::Enum(&["low", "medium", "high"]),
        _ => return None,
    })
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected true|false, got '{other}'")),
    }
}

fn apply_set(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: toml_edit::Item,
) -> anyhow::Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return Err(TodoError::InvalidConfigKey(key.to_owned()).into());
    }

    let mut cur = doc.as_table_mut();
    for seg in &parts[..parts.len().saturating_sub(1)] {
        if !cur.contains_key(seg) {
            let mut t = toml_edit::Table::new();
            t.set_implicit(true);
            cur.insert(seg, toml_edit::Item::Table(t));
        }
        cur = cur[seg]
            .as_table_mut()
            .ok_or_else(|| TodoError::Config(format!("cannot set {key}: '{seg}' is not a table")))?;
    }

    let leaf = parts[parts.len() - 1];
    cur.insert(leaf, value);
    Ok(())
}

fn lookup_value(cfg: &Config, key: &str) -> Option<serde_json::Value> {
    let mut v = serde_json::to_value(cfg).ok()?;
    for seg in key.split('.').filter(|s| !s.is_empty()) {
        match v {
            serde_json::Value::Object(mut map) => {
                v = map.remove(seg)?;
            }
            _ => return None,
        }
    }
    Some(v)
}

fn format_value_for_stdout(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_owned(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn config_validation_catches_empty_store_path() {
        let mut cfg = Config::default();
        cfg.store.path = "  ".to_owned();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_set_and_get_dot_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        set_value_string_at_path(&path, "ui.icons", "false").unwrap();
        assert_eq!(
            get_value_string_at_path(&path, "ui.icons")
                .unwrap()
                .as_deref(),
            Some("false")
        );

        set_value_string_at_path(&path, "store.file", "~/todo.json").unwrap();
        assert_eq!(
            get_value_string_at_path(&path, "store.path")
                .unwrap()
                .as_deref(),
            Some("~/todo.json")
        );

        set_value_string_at_path(&path, "defaults.priority", "HIGH").unwrap();
        set_value_string_at_path(&path, "category", "Work").unwrap();

        let (_doc, cfg) = load_from_file(&path).unwrap();
        cfg.validate().unwrap();
        assert!(!cfg.ui.icons);
        assert_eq!(cfg.store.path, "~/todo.json");
        assert_eq!(cfg.defaults.priority, Priority::High);
        assert_eq!(cfg.defaults.category, "Work");
    }

    #[test]
    fn config_set_rejects_unknown_keys_and_bad_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        assert!(set_value_string_at_path(&path, "store.color", "red").is_err());
        assert!(set_value_string_at_path(&path, "defaults.priority", "urgent").is_err());
        assert!(set_value_string_at_path(&path, "ui.icons", "yes").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn relative_store_path_resolves_against_cwd() {
        let cfg = Config::default();
        let p = cfg.store_path(None).unwrap();
        assert!(p.is_absolute());
        assert!(p.ends_with("tasks.json"));

        let p = cfg
            .store_path(Some(Path::new("/tmp/other.json")))
            .unwrap();
        assert_eq!(p, PathBuf::from("/tmp/other.json"));
    }
}

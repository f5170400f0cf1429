use anyhow::Context;
use clap::parser::ValueSource;
use clap::ArgMatches;
use serde_yaml::Value;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// A parsed YAML configuration file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub value: Value,
}

/// Directories searched for `<basename>.yaml` when no file is given.
pub fn search_paths(basename: &str) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".")];
    if let Some(home) = home::home_dir() {
        paths.push(home.join(format!(".{basename}")));
    }
    paths.push(Path::new("/etc").join(basename));
    paths
}

/// Load the configuration: `explicit` if non-empty, else the first
/// `<basename>.yaml` found on the search path. `Ok(None)` when nothing is found.
pub fn load(explicit: Option<&str>, basename: &str) -> anyhow::Result<Option<LoadedConfig>> {
    let path = match explicit.filter(|p| !p.is_empty()) {
        Some(p) => PathBuf::from(p),
        None => {
            let file = format!("{basename}.yaml");
            match search_paths(basename)
                .into_iter()
                .map(|dir| dir.join(&file))
                .find(|p| p.is_file())
            {
                Some(p) => p,
                None => return Ok(None),
            }
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file({})", path.display()))?;
    let value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to read configuration file({})", path.display()))?;
    Ok(Some(LoadedConfig { path, value }))
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Flag values resolved against the config file.
///
/// A value set on the command line or through the environment wins; then
/// the config file, keyed by the flag id split on `.`; then the flag's
/// default.
#[derive(Debug, Clone, Copy)]
pub struct Flags<'a> {
    matches: &'a ArgMatches,
    config: Option<&'a Value>,
}

impl<'a> Flags<'a> {
    pub fn new(matches: &'a ArgMatches, config: Option<&'a Value>) -> Self {
        Self { matches, config }
    }

    pub fn matches(&self) -> &'a ArgMatches {
        self.matches
    }

    fn explicit(&self, id: &str) -> bool {
        // value_source asserts the id exists
        self.matches.try_contains_id(id).unwrap_or(false)
            && matches!(
                self.matches.value_source(id),
                Some(ValueSource::CommandLine | ValueSource::EnvVariable)
            )
    }

    fn config_value(&self, id: &str) -> Option<&'a Value> {
        if self.explicit(id) {
            return None;
        }
        let mut value = self.config?;
        for key in id.split('.') {
            value = value.get(key)?;
        }
        Some(value)
    }

    pub fn string(&self, id: &str) -> Option<String> {
        if let Some(s) = self.config_value(id).and_then(scalar) {
            return Some(s);
        }
        self.matches
            .try_get_one::<String>(id)
            .ok()
            .flatten()
            .cloned()
    }

    /// A `SetTrue` flag; `false` when undefined.
    pub fn bool(&self, id: &str) -> bool {
        if let Some(Value::Bool(b)) = self.config_value(id) {
            return *b;
        }
        self.matches
            .try_get_one::<bool>(id)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    }

    /// A multi-valued flag. The config may hold a sequence or one
    /// comma-separated scalar.
    pub fn strings(&self, id: &str) -> Vec<String> {
        match self.config_value(id) {
            Some(Value::Sequence(items)) => return items.iter().filter_map(scalar).collect(),
            Some(other) => {
                if let Some(s) = scalar(other) {
                    return s.split(',').map(|v| v.trim().to_string()).collect();
                }
            }
            None => {}
        }
        self.matches
            .try_get_many::<String>(id)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }

    /// [`Flags::string`] parsed into `T`.
    pub fn parse<T>(&self, id: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.string(id)
            .map(|s| {
                s.parse::<T>()
                    .map_err(|e| anyhow::anyhow!("invalid value {s:?} for --{id}: {e}"))
            })
            .transpose()
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RevwatchError, RevwatchResult};
use crate::logging::{LogLevel, LEVEL_NAMES};

use super::types::Config;

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> RevwatchResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| RevwatchError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_with_warnings(&content, path)
}

/// Parse TOML `content` as if read from `path`.
pub fn parse_with_warnings(
    content: &str,
    path: &Path,
) -> RevwatchResult<(Config, Vec<ConfigWarning>)> {
    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(content);

    let mut config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| RevwatchError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.source = Some(path.to_path_buf());

    // serde_ignored reports dotted paths ("retry.delay_mss"); warn on the leaf.
    let warnings = unknown_paths
        .iter()
        .filter_map(|dotted| dotted.rsplit('.').next())
        .map(|key| ConfigWarning {
            key: key.to_string(),
            file: path.to_path_buf(),
            line: find_line_number(content, key),
            suggestion: suggest_key(key),
        })
        .collect();

    Ok((config, warnings))
}

/// Resolve the effective configuration.
///
/// An explicit file must exist. Without one, the user config is used if
/// present. Environment overrides apply on top of either, then the result
/// is validated.
pub fn resolve(explicit: Option<&Path>) -> RevwatchResult<(Config, Vec<ConfigWarning>)> {
    let (config, warnings) = match explicit {
        Some(path) => load_with_warnings(path)?,
        None => match user_config_path().filter(|p| p.exists()) {
            Some(path) => load_with_warnings(&path)?,
            None => (Config::default(), Vec::new()),
        },
    };

    let config = with_env_overrides(config);
    config.validate()?;
    Ok((config, warnings))
}

/// `<config dir>/revwatch/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs_config_dir().map(|dir| dir.join("revwatch").join("config.toml"))
}

/// Apply environment variable overrides (REVWATCH_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_overrides(config, |name| std::env::var(name).ok(), |warning| {
        eprintln!("Warning: {warning}")
    })
}

/// Apply overrides read through `lookup`. Values that do not parse keep the
/// current setting and are reported through `warn`.
pub fn apply_overrides(
    mut config: Config,
    lookup: impl Fn(&str) -> Option<String>,
    mut warn: impl FnMut(String),
) -> Config {
    if let Some(value) = lookup("REVWATCH_DEBOUNCE_MS") {
        match value.trim().parse() {
            Ok(ms) => config.watch.debounce_ms = ms,
            Err(_) => warn(invalid_number("REVWATCH_DEBOUNCE_MS", &value)),
        }
    }

    if let Some(value) = lookup("REVWATCH_RETRY_ATTEMPTS") {
        match value.trim().parse() {
            Ok(attempts) => config.retry.max_attempts = attempts,
            Err(_) => warn(invalid_number("REVWATCH_RETRY_ATTEMPTS", &value)),
        }
    }

    if let Some(value) = lookup("REVWATCH_RETRY_DELAY_MS") {
        match value.trim().parse() {
            Ok(ms) => config.retry.delay_ms = ms,
            Err(_) => warn(invalid_number("REVWATCH_RETRY_DELAY_MS", &value)),
        }
    }

    if let Some(value) = lookup("REVWATCH_WORKERS") {
        match value.trim().parse() {
            Ok(workers) => config.watch.workers = workers,
            Err(_) => warn(invalid_number("REVWATCH_WORKERS", &value)),
        }
    }

    if let Some(value) = lookup("REVWATCH_LOG") {
        match LogLevel::parse(&value) {
            Some(level) => config.log.level = level,
            None => {
                let hint = closest(&value.to_lowercase(), LEVEL_NAMES)
                    .map(|s| format!(". Did you mean '{s}'?"))
                    .unwrap_or_default();
                warn(format!(
                    "Invalid REVWATCH_LOG value '{value}'{hint} Valid values: {}",
                    LEVEL_NAMES.join(", ")
                ));
            }
        }
    }

    config
}

fn invalid_number(var: &str, value: &str) -> String {
    format!("Invalid {var} value '{value}', expected a non-negative integer")
}

/// Get XDG config directory, falling back to the platform default
fn dirs_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
}

/// First line that assigns `key`, 1-based
fn find_line_number(content: &str, key: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| {
            line.trim_start()
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        })
        .map(|index| index + 1)
}

fn suggest_key(unknown: &str) -> Option<String> {
    const KNOWN_KEYS: &[&str] = &[
        "watch",
        "versions_dir",
        "debounce_ms",
        "workers",
        "retry",
        "max_attempts",
        "delay_ms",
        "log",
        "level",
    ];

    closest(unknown, KNOWN_KEYS).map(str::to_string)
}

/// Nearest candidate within two edits; an exact match needs no suggestion
fn closest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (edit_distance(input, candidate), candidate))
        .filter(|&(distance, _)| (1..=2).contains(&distance))
        .min_by_key(|&(distance, _)| distance)
        .map(|(_, candidate)| candidate)
}

/// Levenshtein distance over chars, one row at a time
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }

    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance_counts_single_edits() {
        assert_eq!(edit_distance("delay_ms", "delay_ms"), 0);
        assert_eq!(edit_distance("delay_mss", "delay_ms"), 1);
        assert_eq!(edit_distance("wrokers", "workers"), 2);
        assert_eq!(edit_distance("", "log"), 3);
    }

    #[test]
    fn line_number_points_at_assignment() {
        let content = "[retry]\n# delay_ms is in milliseconds\ndelay_mss = 5\n";

        assert_eq!(find_line_number(content, "delay_mss"), Some(3));
        assert_eq!(find_line_number(content, "missing"), None);
    }
}

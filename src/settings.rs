//! Compiler settings.
//!
//! Settings come from an optional YAML file, then a `.env` file next to it,
//! then the process environment. Later sources win.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::SettingsError;
use crate::planner::PlanDirection;

/// Environment variable overriding [`CompilerSettings::direction`].
pub const ENV_DIRECTION: &str = "STACKPLAN_DIRECTION";
/// Environment variable overriding [`CompilerSettings::validate_references`].
pub const ENV_VALIDATE_REFERENCES: &str = "STACKPLAN_VALIDATE_REFERENCES";
/// Environment variable overriding [`CompilerSettings::pretty`].
pub const ENV_PRETTY: &str = "STACKPLAN_PRETTY";

/// Settings for a compilation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompilerSettings {
    /// Whether to plan an apply or a teardown.
    pub direction: PlanDirection,
    /// Whether to enforce per-kind reference rules.
    pub validate_references: bool,
    /// Whether to pretty-print the emitted document.
    pub pretty: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            direction: PlanDirection::Apply,
            validate_references: true,
            pretty: false,
        }
    }
}

impl CompilerSettings {
    /// Sets the plan direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: PlanDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Enables or disables reference rule checks.
    #[must_use]
    pub const fn with_validate_references(mut self, validate: bool) -> Self {
        self.validate_references = validate;
        self
    }

    /// Enables or disables pretty-printed output.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DIRECTION) {
            debug!("Overriding direction from {ENV_DIRECTION}");
            self.direction = value.parse().map_err(|_| invalid(ENV_DIRECTION, &value))?;
        }

        if let Some(value) = lookup(ENV_VALIDATE_REFERENCES) {
            debug!("Overriding validate_references from {ENV_VALIDATE_REFERENCES}");
            self.validate_references = parse_bool(ENV_VALIDATE_REFERENCES, &value)?;
        }

        if let Some(value) = lookup(ENV_PRETTY) {
            debug!("Overriding pretty from {ENV_PRETTY}");
            self.pretty = parse_bool(ENV_PRETTY, &value)?;
        }

        Ok(())
    }
}

fn invalid(name: &str, value: &str) -> SettingsError {
    SettingsError::InvalidEnvValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

/// Loader for [`CompilerSettings`].
#[derive(Debug, Default)]
pub struct SettingsLoader {
    /// Directory searched for the `.env` file.
    base_path: Option<PathBuf>,
}

impl SettingsLoader {
    /// Creates a loader that looks for `.env` in the working directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory searched for the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads settings from a YAML file, then applies `.env` and environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if any source cannot be read or holds invalid values.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<CompilerSettings, SettingsError> {
        let mut settings = self.load_file(path)?;
        self.apply_env(&mut settings)?;
        Ok(settings)
    }

    /// Loads settings from defaults plus `.env` and environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file or an override is invalid.
    pub fn load_defaults(&self) -> Result<CompilerSettings, SettingsError> {
        let mut settings = CompilerSettings::default();
        self.apply_env(&mut settings)?;
        Ok(settings)
    }

    /// Loads settings from a YAML file without overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<CompilerSettings, SettingsError> {
        let path = path.as_ref();
        info!("Loading settings from: {}", path.display());

        if !path.exists() {
            return Err(SettingsError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })?;

        Self::parse_yaml(&content, Some(path))
    }

    /// Parses settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(content: &str, source: Option<&Path>) -> Result<CompilerSettings, SettingsError> {
        // An empty document means "all defaults".
        if content.trim().is_empty() {
            return Ok(CompilerSettings::default());
        }

        serde_yaml::from_str(content).map_err(|e| SettingsError::ParseError {
            message: format!("YAML parse error: {e}"),
            location: source.map(|p| p.display().to_string()),
        })
    }

    /// Reads the `.env` file, if present, without touching the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_dotenv(&self) -> Result<BTreeMap<String, String>, SettingsError> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if !env_path.exists() {
            debug!(".env file not found at: {}", env_path.display());
            return Ok(BTreeMap::new());
        }

        info!("Loading environment from: {}", env_path.display());
        let to_error = |e: dotenvy::Error| SettingsError::ParseError {
            message: format!("Failed to load .env file: {e}"),
            location: Some(env_path.display().to_string()),
        };

        dotenvy::from_path_iter(&env_path)
            .map_err(to_error)?
            .map(|item| item.map_err(to_error))
            .collect()
    }

    /// Process environment first, then the `.env` file.
    fn apply_env(&self, settings: &mut CompilerSettings) -> Result<(), SettingsError> {
        let dotenv = self.load_dotenv()?;
        settings.apply_overrides(|name| {
            std::env::var(name)
                .ok()
                .or_else(|| dotenv.get(name).cloned())
        })
    }
}

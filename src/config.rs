//! Runtime configuration for task status tracking.
//!
//! Settings are read once at process start, from the environment or from any
//! key lookup (tests pass a closure over a map):
//!
//! | variable                   | meaning                                   | default   |
//! |----------------------------|-------------------------------------------|-----------|
//! | `TASKS_DATABASE`           | label of the database holding task records | `default` |
//! | `TASKS_EXCLUDED_ACTORS`    | comma-separated actors never recorded     | empty     |
//! | `TASKS_MAX_AGE_SECONDS`    | retention age in seconds                  | `86400`   |
//! | `TASKS_UPSERT_RETRY_LIMIT` | retries after a concurrent first insert   | `3`       |
//!
//! The connection URL for the `default` label comes from `DATABASE_URL`;
//! any other label `reporting` reads `REPORTING_DATABASE_URL`.

use std::collections::HashSet;
use std::num::ParseIntError;
use std::sync::Arc;
use thiserror::Error;

/// Label of the database used when none is configured.
pub const DEFAULT_DATABASE_LABEL: &str = "default";

/// Retention age applied when none is configured (one day).
pub const DEFAULT_MAX_TASK_AGE_SECS: u64 = 86_400;

/// Fallback upsert retries applied when none are configured.
pub const DEFAULT_UPSERT_RETRY_LIMIT: u32 = 3;

const DATABASE_VAR: &str = "TASKS_DATABASE";
const EXCLUDED_ACTORS_VAR: &str = "TASKS_EXCLUDED_ACTORS";
const MAX_AGE_VAR: &str = "TASKS_MAX_AGE_SECONDS";
const RETRY_LIMIT_VAR: &str = "TASKS_UPSERT_RETRY_LIMIT";
const DEFAULT_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric variable could not be parsed.
    #[error("invalid value '{value}' for {variable}: {source}")]
    InvalidNumber {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        source: ParseIntError,
    },

    /// The database label is blank.
    #[error("database label must not be empty")]
    EmptyDatabaseLabel,

    /// No connection URL is configured for the database label.
    #[error("no database URL for label '{label}', set {variable}")]
    MissingDatabaseUrl {
        /// Configured database label.
        label: String,
        /// Variable that was consulted.
        variable: String,
    },
}

/// Immutable set of actor names whose tasks are never recorded.
///
/// Cloning shares the underlying set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedActors(Arc<HashSet<String>>);

impl ExcludedActors {
    /// Parses a comma-separated list, trimming names and dropping empties.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Returns whether the actor is excluded from tracking.
    #[must_use]
    pub fn contains(&self, actor_name: &str) -> bool {
        self.0.contains(actor_name)
    }

    /// Returns the number of excluded actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no actor is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for ExcludedActors {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

/// Task status tracking settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTrackingConfig {
    database_label: String,
    excluded_actors: ExcludedActors,
    max_task_age_secs: u64,
    upsert_retry_limit: u32,
}

impl Default for TaskTrackingConfig {
    fn default() -> Self {
        Self {
            database_label: DEFAULT_DATABASE_LABEL.to_owned(),
            excluded_actors: ExcludedActors::default(),
            max_task_age_secs: DEFAULT_MAX_TASK_AGE_SECS,
            upsert_retry_limit: DEFAULT_UPSERT_RETRY_LIMIT,
        }
    }
}

impl TaskTrackingConfig {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, falling back to defaults for absent
    /// keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(label) = lookup(DATABASE_VAR) {
            let trimmed = label.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::EmptyDatabaseLabel);
            }
            trimmed.clone_into(&mut config.database_label);
        }
        if let Some(actors) = lookup(EXCLUDED_ACTORS_VAR) {
            config.excluded_actors = ExcludedActors::parse(&actors);
        }
        if let Some(raw) = lookup(MAX_AGE_VAR) {
            config.max_task_age_secs = parse_number(MAX_AGE_VAR, &raw)?;
        }
        if let Some(raw) = lookup(RETRY_LIMIT_VAR) {
            config.upsert_retry_limit = parse_number(RETRY_LIMIT_VAR, &raw)?;
        }

        Ok(config)
    }

    /// Sets the database label.
    #[must_use]
    pub fn with_database_label(mut self, label: impl Into<String>) -> Self {
        self.database_label = label.into();
        self
    }

    /// Sets the excluded actor names.
    #[must_use]
    pub fn with_excluded_actors<I, S>(mut self, actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_actors = actors.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the retention age in seconds.
    #[must_use]
    pub const fn with_max_task_age_secs(mut self, seconds: u64) -> Self {
        self.max_task_age_secs = seconds;
        self
    }

    /// Sets how often a fallback upsert is retried after a concurrent insert.
    #[must_use]
    pub const fn with_upsert_retry_limit(mut self, limit: u32) -> Self {
        self.upsert_retry_limit = limit;
        self
    }

    /// Returns the database label.
    #[must_use]
    pub fn database_label(&self) -> &str {
        &self.database_label
    }

    /// Returns the excluded actor names.
    #[must_use]
    pub const fn excluded_actors(&self) -> &ExcludedActors {
        &self.excluded_actors
    }

    /// Returns the retention age in seconds.
    #[must_use]
    pub const fn max_task_age_secs(&self) -> u64 {
        self.max_task_age_secs
    }

    /// Returns the fallback upsert retry limit.
    #[must_use]
    pub const fn upsert_retry_limit(&self) -> u32 {
        self.upsert_retry_limit
    }

    /// Returns the environment variable naming the database URL for the
    /// configured label.
    #[must_use]
    pub fn database_url_variable(&self) -> String {
        if self.database_label == DEFAULT_DATABASE_LABEL {
            return DEFAULT_DATABASE_URL_VAR.to_owned();
        }
        let prefix = self.database_label.to_ascii_uppercase().replace('-', "_");
        format!("{prefix}_{DEFAULT_DATABASE_URL_VAR}")
    }

    /// Resolves the database URL for the configured label through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when the variable is unset
    /// or blank.
    pub fn database_url_from<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let variable = self.database_url_variable();
        lookup(&variable)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingDatabaseUrl {
                label: self.database_label.clone(),
                variable,
            })
    }

    /// Resolves the database URL for the configured label from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when the variable is unset.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        self.database_url_from(|key| std::env::var(key).ok())
    }
}

fn parse_number<T>(variable: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    raw.trim()
        .parse()
        .map_err(|source| ConfigError::InvalidNumber {
            variable,
            value: raw.to_owned(),
            source,
        })
}

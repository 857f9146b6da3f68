use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `LTV_REPORT__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub format: FormatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Cohort window: only bookers whose first booking item ended at least
    /// this many months ago are included.
    #[serde(default = "default_period_months")]
    pub period_months: u32,
    /// Commission fraction applied to cohort turnover for the LTV column.
    #[serde(default = "default_commission")]
    pub commission: f64,
    /// Fixed UTC offset of the zone the bookings were made in. Month
    /// bucketing and the cutoff midnight are computed in this zone.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

/// Presentation-layer number formatting. Never affects the computation.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,
}

// Default functions
fn default_database_url() -> String {
    "sqlite://bookings.db".to_string()
}
fn default_period_months() -> u32 {
    12
}
fn default_commission() -> f64 {
    0.10
}
fn default_utc_offset_minutes() -> i32 {
    60
}
fn default_decimal_separator() -> String {
    ",".to_string()
}
fn default_thousands_separator() -> String {
    ".".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            period_months: default_period_months(),
            commission: default_commission(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            decimal_separator: default_decimal_separator(),
            thousands_separator: default_thousands_separator(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            report: ReportConfig::default(),
            format: FormatConfig::default(),
        }
    }
}

impl ReportConfig {
    /// The configured zone as a `FixedOffset`. Offsets beyond ±24h are
    /// rejected by chrono; fall back to UTC rather than abort the report.
    pub fn timezone(&self) -> FixedOffset {
        match FixedOffset::east_opt(self.utc_offset_minutes * 60) {
            Some(offset) => offset,
            None => {
                tracing::warn!(
                    offset_minutes = self.utc_offset_minutes,
                    "Configured UTC offset out of range, using UTC"
                );
                Utc.fix()
            }
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("LTV_REPORT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.report.period_months, 12);
        assert_eq!(config.report.commission, 0.10);
        assert_eq!(config.database.url, "sqlite://bookings.db");
        assert_eq!(config.format.decimal_separator, ",");
        assert_eq!(config.format.thousands_separator, ".");
    }

    #[test]
    fn test_timezone_from_offset() {
        let report = ReportConfig {
            utc_offset_minutes: 60,
            ..ReportConfig::default()
        };
        assert_eq!(report.timezone().local_minus_utc(), 3600);
    }

    #[test]
    fn test_timezone_out_of_range_falls_back_to_utc() {
        let report = ReportConfig {
            utc_offset_minutes: 100_000,
            ..ReportConfig::default()
        };
        assert_eq!(report.timezone().local_minus_utc(), 0);
    }
}

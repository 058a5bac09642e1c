//! Environment-driven settings for the forecasting services.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use pharmstock_forecast::{BulkForecastRequest, ForecastConfig, NoiseMode};
use pharmstock_inventory::ProductFilter;

use crate::scan::ReorderScanRunner;

pub const FORECAST_DAYS_VAR: &str = "PHARMSTOCK_FORECAST_DAYS";
pub const MAX_FORECAST_DAYS_VAR: &str = "PHARMSTOCK_MAX_FORECAST_DAYS";
pub const LEAD_TIME_DAYS_VAR: &str = "PHARMSTOCK_LEAD_TIME_DAYS";
pub const CONCURRENCY_VAR: &str = "PHARMSTOCK_FORECAST_CONCURRENCY";
pub const NOISE_SEED_VAR: &str = "PHARMSTOCK_NOISE_SEED";
pub const SCAN_INTERVAL_VAR: &str = "PHARMSTOCK_SCAN_INTERVAL_SECS";
pub const SCAN_LIMIT_VAR: &str = "PHARMSTOCK_SCAN_LIMIT";
pub const SCAN_LOW_STOCK_ONLY_VAR: &str = "PHARMSTOCK_SCAN_LOW_STOCK_ONLY";

#[derive(Debug, Clone)]
pub struct ForecastSettings {
    pub forecast: ForecastConfig,
    pub scan: ReorderScanRunner,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ForecastSettings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Missing or unparsable
    /// values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ForecastConfig::default();

        let max_forecast_days: u32 = parse_var(&lookup, MAX_FORECAST_DAYS_VAR, defaults.max_forecast_days);
        let max_forecast_days = if max_forecast_days < defaults.default_forecast_days {
            warn!(
                var = MAX_FORECAST_DAYS_VAR,
                max_forecast_days, "maximum horizon below the default horizon; using default"
            );
            defaults.max_forecast_days
        } else {
            max_forecast_days
        };

        let forecast_days: u32 = parse_var(&lookup, FORECAST_DAYS_VAR, defaults.default_forecast_days);
        let forecast_days = if forecast_days == 0 || forecast_days > max_forecast_days {
            warn!(
                var = FORECAST_DAYS_VAR,
                forecast_days, max_forecast_days, "forecast horizon out of range; using default"
            );
            defaults.default_forecast_days
        } else {
            forecast_days
        };

        let lead_time_days: u32 = parse_var(&lookup, LEAD_TIME_DAYS_VAR, defaults.lead_time_days);

        let concurrency: usize = parse_var(&lookup, CONCURRENCY_VAR, defaults.concurrency);
        let noise = match lookup(NOISE_SEED_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(seed) => NoiseMode::Seeded(seed),
                Err(_) => {
                    warn!(var = NOISE_SEED_VAR, value = %raw, "invalid noise seed; using entropy");
                    defaults.noise
                }
            },
            None => defaults.noise,
        };

        let forecast = ForecastConfig::default()
            .with_max_forecast_days(max_forecast_days)
            .with_default_forecast_days(forecast_days)
            .with_lead_time_days(lead_time_days)
            .with_concurrency(concurrency)
            .with_noise(noise);

        let scan_defaults = ReorderScanRunner::default();
        let interval_secs: u64 = parse_var(&lookup, SCAN_INTERVAL_VAR, scan_defaults.interval.as_secs());
        let limit: usize = parse_var(&lookup, SCAN_LIMIT_VAR, scan_defaults.request.limit);
        let low_stock_only: bool = parse_var(&lookup, SCAN_LOW_STOCK_ONLY_VAR, false);

        let scan = ReorderScanRunner {
            interval: Duration::from_secs(interval_secs.max(1)),
            request: BulkForecastRequest {
                filter: ProductFilter { low_stock_only },
                forecast_days,
                limit,
            },
            ..scan_defaults
        };

        Self { forecast, scan }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var = key, value = %raw, "invalid setting; using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = ForecastSettings::default();
        assert_eq!(settings.forecast, ForecastConfig::default());
        assert_eq!(settings.scan.interval, Duration::from_secs(3600));
        assert_eq!(settings.scan.request.forecast_days, 30);
        assert!(!settings.scan.request.filter.low_stock_only);
    }

    #[test]
    fn reads_overrides() {
        let settings = ForecastSettings::from_lookup(lookup_from(&[
            (FORECAST_DAYS_VAR, "45"),
            (MAX_FORECAST_DAYS_VAR, "120"),
            (LEAD_TIME_DAYS_VAR, "10"),
            (CONCURRENCY_VAR, "2"),
            (NOISE_SEED_VAR, "1234"),
            (SCAN_INTERVAL_VAR, "600"),
            (SCAN_LIMIT_VAR, "10"),
            (SCAN_LOW_STOCK_ONLY_VAR, "true"),
        ]));

        assert_eq!(settings.forecast.default_forecast_days, 45);
        assert_eq!(settings.forecast.max_forecast_days, 120);
        assert_eq!(settings.forecast.lead_time_days, 10);
        assert_eq!(settings.forecast.concurrency, 2);
        assert_eq!(settings.forecast.noise, NoiseMode::Seeded(1234));
        assert_eq!(settings.scan.interval, Duration::from_secs(600));
        assert_eq!(settings.scan.request.limit, 10);
        assert_eq!(settings.scan.request.forecast_days, 45);
        assert!(settings.scan.request.filter.low_stock_only);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let settings = ForecastSettings::from_lookup(lookup_from(&[
            (FORECAST_DAYS_VAR, "0"),
            (CONCURRENCY_VAR, "many"),
            (NOISE_SEED_VAR, "-1"),
        ]));

        assert_eq!(settings.forecast.default_forecast_days, 30);
        assert_eq!(settings.forecast.concurrency, 8);
        assert_eq!(settings.forecast.noise, NoiseMode::Entropy);
    }

    #[test]
    fn horizon_beyond_maximum_falls_back_to_default() {
        let settings = ForecastSettings::from_lookup(lookup_from(&[
            (FORECAST_DAYS_VAR, "400"),
            (MAX_FORECAST_DAYS_VAR, "180"),
        ]));

        assert_eq!(settings.forecast.max_forecast_days, 180);
        assert_eq!(settings.forecast.default_forecast_days, 30);
        assert_eq!(settings.scan.request.forecast_days, 30);
    }
}

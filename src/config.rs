//! Application configuration, resolved once at startup.

use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};

use crate::application::{DEFAULT_CHOLESTEROL_BIN_WIDTH, MAX_HISTOGRAM_BINS};
use crate::domain::{FieldBounds, NumericBounds, SchemaVersion};

/// Default clock offset (Asia/Kuala_Lumpur).
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub schema: SchemaVersion,
    pub utc_offset: FixedOffset,
    pub dataset_path: PathBuf,
    pub bounds: FieldBounds,
    pub cholesterol_bin_width: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models"),
            schema: SchemaVersion::Full,
            utc_offset: default_offset(),
            dataset_path: PathBuf::from("data/OHCA.csv"),
            bounds: FieldBounds::default(),
            cholesterol_bin_width: DEFAULT_CHOLESTEROL_BIN_WIDTH,
        }
    }
}

impl AppConfig {
    /// Load config overrides from the process environment (best-effort).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config overrides through `lookup`.
    ///
    /// Supported:
    /// - CARDIALYZE_MODEL_PATH
    /// - CARDIALYZE_SCHEMA="full|reduced"
    /// - CARDIALYZE_UTC_OFFSET="+08:00"
    /// - CARDIALYZE_DATASET_PATH
    /// - CARDIALYZE_CHOLESTEROL_BIN_WIDTH
    /// - CARDIALYZE_BOUNDS_{AGE,RESTING_BP,CHOLESTEROL,MAX_HEART_RATE,OLDPEAK}="min,max"
    ///
    /// Invalid values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("CARDIALYZE_MODEL_PATH").filter(|v| !v.trim().is_empty()) {
            cfg.model_path = PathBuf::from(v.trim());
        }

        if let Some(v) = lookup("CARDIALYZE_SCHEMA") {
            match v.parse::<SchemaVersion>() {
                Ok(schema) => cfg.schema = schema,
                Err(e) => tracing::warn!("Ignoring CARDIALYZE_SCHEMA: {e}"),
            }
        }

        if let Some(v) = lookup("CARDIALYZE_UTC_OFFSET") {
            match parse_offset(&v) {
                Some(offset) => cfg.utc_offset = offset,
                None => tracing::warn!("Ignoring CARDIALYZE_UTC_OFFSET: {v:?}"),
            }
        }

        if let Some(v) = lookup("CARDIALYZE_DATASET_PATH").filter(|v| !v.trim().is_empty()) {
            cfg.dataset_path = PathBuf::from(v.trim());
        }

        let bounds = &mut cfg.bounds;
        // The flag marks fields stored as whole numbers in the form.
        for (key, slot, whole) in [
            ("CARDIALYZE_BOUNDS_AGE", &mut bounds.age, true),
            ("CARDIALYZE_BOUNDS_RESTING_BP", &mut bounds.resting_blood_pressure, true),
            ("CARDIALYZE_BOUNDS_CHOLESTEROL", &mut bounds.serum_cholesterol, true),
            ("CARDIALYZE_BOUNDS_MAX_HEART_RATE", &mut bounds.max_heart_rate, true),
            ("CARDIALYZE_BOUNDS_OLDPEAK", &mut bounds.oldpeak, false),
        ] {
            if let Some(v) = lookup(key) {
                let parsed = parse_bounds(&v).filter(|b| !whole || fits_whole(b));
                match parsed {
                    Some(parsed) => *slot = parsed,
                    None => tracing::warn!("Ignoring {key}: {v:?}"),
                }
            }
        }

        // Parsed after the bounds so the bin count is checked against them.
        if let Some(v) = lookup("CARDIALYZE_CHOLESTEROL_BIN_WIDTH") {
            let span = cfg.bounds.serum_cholesterol.max - cfg.bounds.serum_cholesterol.min;
            match v.trim().parse::<f64>() {
                Ok(x) if x.is_finite()
                    && x > 0.0
                    && span / x < (MAX_HISTOGRAM_BINS - 1) as f64 =>
                {
                    cfg.cholesterol_bin_width = x;
                }
                _ => tracing::warn!("Ignoring CARDIALYZE_CHOLESTEROL_BIN_WIDTH: {v:?}"),
            }
        }

        cfg
    }
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parse `"+HH:MM"` / `"-HH:MM"` (or `"Z"`) into an offset.
#[must_use]
pub fn parse_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }

    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Whole-number fields are held as `u16`.
fn fits_whole(bounds: &NumericBounds) -> bool {
    bounds.min >= 0.0 && bounds.max <= f64::from(u16::MAX)
}

/// Parse `"min,max"` into bounds; rejects non-finite or inverted pairs.
#[must_use]
pub fn parse_bounds(value: &str) -> Option<NumericBounds> {
    let (min, max) = value.split_once(',')?;
    let min: f64 = min.trim().parse().ok()?;
    let max: f64 = max.trim().parse().ok()?;
    if !min.is_finite() || !max.is_finite() || min > max {
        return None;
    }
    Some(NumericBounds::new(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.utc_offset.local_minus_utc(), 8 * 3600);
        assert_eq!(cfg.model_path, PathBuf::from("models"));
        assert_eq!(cfg.dataset_path, PathBuf::from("data/OHCA.csv"));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("CARDIALYZE_MODEL_PATH", "/opt/models"),
            ("CARDIALYZE_SCHEMA", "reduced"),
            ("CARDIALYZE_UTC_OFFSET", "-05:30"),
            ("CARDIALYZE_BOUNDS_AGE", "18, 90"),
            ("CARDIALYZE_CHOLESTEROL_BIN_WIDTH", "25"),
        ]);
        assert_eq!(cfg.model_path, PathBuf::from("/opt/models"));
        assert_eq!(cfg.schema, SchemaVersion::Reduced);
        assert_eq!(cfg.utc_offset.local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(cfg.bounds.age, NumericBounds::new(18.0, 90.0));
        assert_eq!(cfg.cholesterol_bin_width, 25.0);
    }

    #[test]
    fn test_invalid_values_ignored() {
        let cfg = config(&[
            ("CARDIALYZE_SCHEMA", "partial"),
            ("CARDIALYZE_UTC_OFFSET", "KL"),
            ("CARDIALYZE_BOUNDS_OLDPEAK", "6.2,-2.6"),
            ("CARDIALYZE_BOUNDS_AGE", "abc"),
            ("CARDIALYZE_CHOLESTEROL_BIN_WIDTH", "-1"),
        ]);
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_bin_width_too_narrow_for_bounds() {
        let cfg = config(&[("CARDIALYZE_CHOLESTEROL_BIN_WIDTH", "1e-300")]);
        assert_eq!(cfg.cholesterol_bin_width, DEFAULT_CHOLESTEROL_BIN_WIDTH);

        // 438 mg/dl of default span at width 1 needs 439 bins: accepted.
        let cfg = config(&[("CARDIALYZE_CHOLESTEROL_BIN_WIDTH", "1")]);
        assert_eq!(cfg.cholesterol_bin_width, 1.0);

        // The same width over a wider configured span is refused.
        let cfg = config(&[
            ("CARDIALYZE_BOUNDS_CHOLESTEROL", "0,5000"),
            ("CARDIALYZE_CHOLESTEROL_BIN_WIDTH", "1"),
        ]);
        assert_eq!(cfg.bounds.serum_cholesterol, NumericBounds::new(0.0, 5000.0));
        assert_eq!(cfg.cholesterol_bin_width, DEFAULT_CHOLESTEROL_BIN_WIDTH);
    }

    #[test]
    fn test_whole_number_bounds_must_fit_form() {
        let cfg = config(&[
            ("CARDIALYZE_BOUNDS_AGE", "-5,90"),
            ("CARDIALYZE_BOUNDS_MAX_HEART_RATE", "60,70000"),
            ("CARDIALYZE_BOUNDS_OLDPEAK", "-3,7"),
        ]);
        assert_eq!(cfg.bounds.age, FieldBounds::default().age);
        assert_eq!(cfg.bounds.max_heart_rate, FieldBounds::default().max_heart_rate);
        assert_eq!(cfg.bounds.oldpeak, NumericBounds::new(-3.0, 7.0));
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+08:00").map(|o| o.local_minus_utc()), Some(28_800));
        assert_eq!(parse_offset("Z").map(|o| o.local_minus_utc()), Some(0));
        assert_eq!(parse_offset("+8").map(|o| o.local_minus_utc()), Some(28_800));
        assert!(parse_offset("08:00").is_none());
        assert!(parse_offset("+24:00").is_none());
    }
}

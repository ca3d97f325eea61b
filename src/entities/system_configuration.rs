//! SystemConfiguration entity - Coppie chiave/valore della configurazione di sistema
//!
//! Key and unit live in text columns but are only ever handed out as
//! [`ConfigKey`] / [`ConfigUnit`]: decoding a row whose key or unit is not a
//! known member fails, and the raw string setters validate before storing.

use super::{AuditFields, ConfigKey, ConfigUnit};
use crate::repositories::{Entity, SqlValue};
use crate::utils::{EnumStr, StringError, StringExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Upper bound, in characters, of every text column of the table
pub const MAX_COLUMN_LENGTH: usize = 2048;

/// Longest time span a configuration may hold, in days
pub const MAX_DURATION_DAYS: i64 = 36_500;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow, Validate)]
pub struct SystemConfiguration {
    pub id: Uuid,
    #[sqlx(rename = "config_key")]
    key: ConfigKey,
    #[sqlx(rename = "config_unit")]
    unit: ConfigUnit,
    #[sqlx(rename = "config_value")]
    #[validate(length(max = 2048, message = "Configuration value cannot exceed 2048 characters"))]
    pub value: String,
    #[validate(length(max = 2048, message = "Description cannot exceed 2048 characters"))]
    pub description: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl SystemConfiguration {
    pub fn new(key: ConfigKey, unit: ConfigUnit, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            unit,
            value: value.into(),
            description: None,
            audit: AuditFields::default(),
        }
    }

    pub fn key(&self) -> ConfigKey {
        self.key
    }

    pub fn set_key(&mut self, key: ConfigKey) {
        self.key = key;
    }

    /// Stored form of the key
    pub fn key_str(&self) -> &'static str {
        self.key.as_str()
    }

    /// Sets the key from its textual form, matched case-insensitively
    pub fn set_key_str(&mut self, raw: &str) -> Result<(), StringError> {
        self.key = parse_column(raw)?;
        Ok(())
    }

    pub fn unit(&self) -> ConfigUnit {
        self.unit
    }

    pub fn set_unit(&mut self, unit: ConfigUnit) {
        self.unit = unit;
    }

    pub fn unit_str(&self) -> &'static str {
        self.unit.as_str()
    }

    pub fn set_unit_str(&mut self, raw: &str) -> Result<(), StringError> {
        self.unit = parse_column(raw)?;
        Ok(())
    }

    /// Value as an integer, `None` when it does not parse
    pub fn value_as_i64(&self) -> Option<i64> {
        self.value.trim().parse().ok()
    }

    /// Value as a time span in the record's unit, `None` unless it lies
    /// between zero and [`MAX_DURATION_DAYS`]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.unit
            .to_duration(self.value_as_i64()?)
            .filter(|span| *span >= chrono::Duration::zero())
            .filter(|span| *span <= chrono::Duration::days(MAX_DURATION_DAYS))
    }

    /// A value stored with a time unit must be a span [`duration`](Self::duration) accepts
    pub fn check_value(&self) -> Result<(), String> {
        if self.unit.is_time_unit() && self.duration().is_none() {
            return Err(format!(
                "{} must be a whole number of {} between 0 and {} days",
                self.key, self.unit, MAX_DURATION_DAYS
            ));
        }
        Ok(())
    }
}

fn parse_column<T: EnumStr>(raw: &str) -> Result<T, StringError> {
    let available = raw.chars().count();
    if available > MAX_COLUMN_LENGTH {
        return Err(StringError::OutOfRange {
            requested: MAX_COLUMN_LENGTH,
            available,
        });
    }
    raw.parse_enum(true)
}

impl Entity for SystemConfiguration {
    type Id = Uuid;

    const TABLE: &'static str = "system_configurations";
    const KEY_COLUMN: &'static str = "id";
    const COLUMNS: &'static [&'static str] =
        &["config_key", "config_unit", "config_value", "description"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.key_str().into(),
            self.unit_str().into(),
            self.value.clone().into(),
            self.description.clone().into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_str_round_trip() {
        let mut config = SystemConfiguration::new(ConfigKey::MaxLoginAttempts, ConfigUnit::Count, "5");

        config.set_key_str("tokenLIFETIME").unwrap();
        assert_eq!(config.key(), ConfigKey::TokenLifetime);
        assert_eq!(config.key_str(), "TokenLifetime");

        let err = config.set_key_str("SomethingElse").unwrap_err();
        assert!(matches!(err, StringError::UnknownVariant { type_name: "ConfigKey", .. }));
        // a failed write leaves the previous key in place
        assert_eq!(config.key(), ConfigKey::TokenLifetime);
    }

    #[test]
    fn test_unit_str_rejects_oversized_input() {
        let mut config = SystemConfiguration::new(ConfigKey::TokenLifetime, ConfigUnit::Hours, "8");
        let huge = "h".repeat(MAX_COLUMN_LENGTH + 1);
        assert!(matches!(
            config.set_unit_str(&huge),
            Err(StringError::OutOfRange { .. })
        ));
        config.set_unit_str("minutes").unwrap();
        assert_eq!(config.unit(), ConfigUnit::Minutes);
    }

    #[test]
    fn test_value_length_is_validated() {
        let mut config = SystemConfiguration::new(ConfigKey::MaintenanceMode, ConfigUnit::Flag, "false");
        assert!(config.validate().is_ok());

        config.value = "x".repeat(MAX_COLUMN_LENGTH + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_by_unit() {
        let config = SystemConfiguration::new(ConfigKey::PasswordExpiry, ConfigUnit::Days, " 90 ");
        assert_eq!(config.duration(), Some(chrono::Duration::days(90)));

        let flag = SystemConfiguration::new(ConfigKey::MaintenanceMode, ConfigUnit::Flag, "1");
        assert_eq!(flag.duration(), None);

        let garbage = SystemConfiguration::new(ConfigKey::TokenLifetime, ConfigUnit::Hours, "soon");
        assert_eq!(garbage.duration(), None);
        assert!(garbage.check_value().is_err());
    }

    #[test]
    fn test_duration_is_bounded() {
        let huge = SystemConfiguration::new(ConfigKey::PasswordExpiry, ConfigUnit::Days, "100000000");
        assert_eq!(huge.duration(), None);
        assert!(huge.check_value().is_err());

        let negative = SystemConfiguration::new(ConfigKey::TokenLifetime, ConfigUnit::Minutes, "-5");
        assert_eq!(negative.duration(), None);
        assert!(negative.check_value().is_err());

        let limit = MAX_DURATION_DAYS.to_string();
        let longest = SystemConfiguration::new(ConfigKey::PasswordExpiry, ConfigUnit::Days, limit);
        assert_eq!(longest.duration(), Some(chrono::Duration::days(MAX_DURATION_DAYS)));
        assert!(longest.check_value().is_ok());

        // values of non time units are free form
        let flag = SystemConfiguration::new(ConfigKey::MaintenanceMode, ConfigUnit::Flag, "on");
        assert!(flag.check_value().is_ok());
    }
}

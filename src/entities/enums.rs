//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use crate::utils::{EnumStr, StringError, StringExt};
use serde::{Deserialize, Serialize};
use sqlx::Sqlite;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteTypeInfo, SqliteValueRef};
use std::fmt;
use std::str::FromStr;

// ********************* ENUMERAZIONI UTILI **********************//

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum UserType {
    Admin,
    Operator,
    Viewer,
}

impl EnumStr for UserType {
    const TYPE_NAME: &'static str = "UserType";
    const VARIANTS: &'static [Self] = &[UserType::Admin, UserType::Operator, UserType::Viewer];

    fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "ADMIN",
            UserType::Operator => "OPERATOR",
            UserType::Viewer => "VIEWER",
        }
    }
}

/// Keys of the system configuration table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Lifetime of an issued login token
    TokenLifetime,
    /// Age after which a password must be changed
    PasswordExpiry,
    MaxLoginAttempts,
    SessionIdleTimeout,
    MaintenanceMode,
}

impl EnumStr for ConfigKey {
    const TYPE_NAME: &'static str = "ConfigKey";
    const VARIANTS: &'static [Self] = &[
        ConfigKey::TokenLifetime,
        ConfigKey::PasswordExpiry,
        ConfigKey::MaxLoginAttempts,
        ConfigKey::SessionIdleTimeout,
        ConfigKey::MaintenanceMode,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::TokenLifetime => "TokenLifetime",
            ConfigKey::PasswordExpiry => "PasswordExpiry",
            ConfigKey::MaxLoginAttempts => "MaxLoginAttempts",
            ConfigKey::SessionIdleTimeout => "SessionIdleTimeout",
            ConfigKey::MaintenanceMode => "MaintenanceMode",
        }
    }
}

/// Unit a configuration value is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigUnit {
    None,
    Seconds,
    Minutes,
    Hours,
    Days,
    Count,
    Flag,
}

impl EnumStr for ConfigUnit {
    const TYPE_NAME: &'static str = "ConfigUnit";
    const VARIANTS: &'static [Self] = &[
        ConfigUnit::None,
        ConfigUnit::Seconds,
        ConfigUnit::Minutes,
        ConfigUnit::Hours,
        ConfigUnit::Days,
        ConfigUnit::Count,
        ConfigUnit::Flag,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ConfigUnit::None => "None",
            ConfigUnit::Seconds => "Seconds",
            ConfigUnit::Minutes => "Minutes",
            ConfigUnit::Hours => "Hours",
            ConfigUnit::Days => "Days",
            ConfigUnit::Count => "Count",
            ConfigUnit::Flag => "Flag",
        }
    }
}

impl ConfigUnit {
    pub fn is_time_unit(self) -> bool {
        matches!(
            self,
            ConfigUnit::Seconds | ConfigUnit::Minutes | ConfigUnit::Hours | ConfigUnit::Days
        )
    }

    /// Length of `amount` units, `None` for units that are not a time span
    pub fn to_duration(self, amount: i64) -> Option<chrono::Duration> {
        match self {
            ConfigUnit::Seconds => chrono::Duration::try_seconds(amount),
            ConfigUnit::Minutes => chrono::Duration::try_minutes(amount),
            ConfigUnit::Hours => chrono::Duration::try_hours(amount),
            ConfigUnit::Days => chrono::Duration::try_days(amount),
            ConfigUnit::None | ConfigUnit::Count | ConfigUnit::Flag => None,
        }
    }
}

/*
 * ConfigKey e ConfigUnit sono salvati come testo: in lettura la stringa viene
 * riconvertita (case-insensitive) e una stringa sconosciuta fa fallire la
 * decodifica della riga, in JSON invece si usa la forma canonica.
 */
macro_rules! string_backed_enum {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StringError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse_enum(true)
            }
        }

        impl TryFrom<String> for $name {
            type Error = StringError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl sqlx::Type<Sqlite> for $name {
            fn type_info() -> SqliteTypeInfo {
                <str as sqlx::Type<Sqlite>>::type_info()
            }

            fn compatible(ty: &SqliteTypeInfo) -> bool {
                <str as sqlx::Type<Sqlite>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, Sqlite> for $name {
            fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
                let raw = <&str as sqlx::Decode<'r, Sqlite>>::decode(value)?;
                Ok(raw.parse::<$name>()?)
            }
        }
    };
}

string_backed_enum!(ConfigKey);
string_backed_enum!(ConfigUnit);

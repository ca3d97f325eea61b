//! SystemConfiguration DTOs - Data Transfer Objects per la configurazione di sistema

use crate::entities::{ConfigKey, ConfigUnit, SystemConfiguration};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SystemConfigurationDTO {
    pub id: Uuid,
    pub key: ConfigKey,
    pub unit: ConfigUnit,
    pub value: String,
    pub description: Option<String>,
    pub modified_at: DateTime<Utc>,
    pub row_version: i64,
}

impl From<SystemConfiguration> for SystemConfigurationDTO {
    fn from(value: SystemConfiguration) -> Self {
        Self {
            id: value.id,
            key: value.key(),
            unit: value.unit(),
            value: value.value,
            description: value.description,
            modified_at: value.audit.modified_at,
            row_version: value.audit.row_version,
        }
    }
}

/// Key and unit arrive as plain strings and are parsed by the handler, so an
/// unknown member is a 400 rather than a body rejection
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct UpsertConfigurationDTO {
    #[validate(length(min = 1, max = 2048, message = "Key must be between 1 and 2048 characters"))]
    pub key: String,

    #[validate(length(min = 1, max = 2048, message = "Unit must be between 1 and 2048 characters"))]
    pub unit: String,

    #[validate(length(max = 2048, message = "Value cannot exceed 2048 characters"))]
    pub value: String,

    #[validate(length(max = 2048, message = "Description cannot exceed 2048 characters"))]
    pub description: Option<String>,
}

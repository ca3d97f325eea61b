//! SystemConfiguration services - Lettura e modifica della configurazione di sistema

use crate::core::{AppError, AppState, require_user_type};
use crate::dtos::{SystemConfigurationDTO, UpsertConfigurationDTO};
use crate::entities::{ConfigKey, ConfigUnit, SystemConfiguration, User, UserType};
use axum::{
    Extension,
    extract::{Json, Path, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

#[instrument(skip(state))]
pub async fn list_configurations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SystemConfigurationDTO>>, AppError> {
    let configurations = state.configurations.list(&state.request_token()).await?;
    debug!("Found {} configurations", configurations.len());
    Ok(Json(
        configurations
            .into_iter()
            .map(SystemConfigurationDTO::from)
            .collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_configuration(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>, // nome della chiave, case-insensitive
) -> Result<Json<SystemConfigurationDTO>, AppError> {
    let key: ConfigKey = key.parse()?;
    let configuration = state
        .configurations
        .get_by_key(key, &state.request_token())
        .await?
        .ok_or_else(|| AppError::not_found("Configuration not found"))?;
    Ok(Json(SystemConfigurationDTO::from(configuration)))
}

#[instrument(skip(state, current_user, body), fields(admin = %current_user.username, key = %body.key))]
pub async fn upsert_configuration(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpsertConfigurationDTO>,
) -> Result<Json<SystemConfigurationDTO>, AppError> {
    // 1. Solo gli amministratori possono modificare la configurazione
    // 2. Validare lunghezze e convertire chiave e unità nei rispettivi enum
    // 3. Inserire o sovrascrivere il record con la stessa chiave
    require_user_type(&current_user, &[UserType::Admin])?;
    body.validate()?;

    let key: ConfigKey = body.key.parse()?;
    let unit: ConfigUnit = body.unit.parse()?;
    let mut configuration = SystemConfiguration::new(key, unit, body.value);
    configuration.description = body.description;

    let mut ctx = state.context();
    let saved = state.configurations.upsert(&mut ctx, configuration).await?;

    info!("Configuration saved at version {}", saved.audit.row_version);
    Ok(Json(SystemConfigurationDTO::from(saved)))
}

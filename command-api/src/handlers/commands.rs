//! Command resource endpoints
//!
//! Every handler follows the same shape: open a session, load what it
//! needs, check the command exists, act, and commit at most once. Presence
//! is decided by the id lookup before the body is looked at, so a missing
//! command is a 404 even when the request body is unusable.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::get,
    Json, Router,
};

use super::error::{ApiError, ApiOperation};
use crate::models::{Command, CommandCreateDto, CommandId, CommandReadDto, CommandUpdateDto};
use crate::patch::PatchDocument;
use crate::repository::{CommandRepository, CommandSession, RepositoryError};
use crate::responses::{Created, NoContent};
use crate::state::AppState;

/// Routes for the command resource, relative to the base path
pub fn routes<R: CommandRepository>() -> Router<AppState<R>> {
    Router::new()
        .route("/commands", get(list_commands::<R>).post(create_command::<R>))
        .route(
            "/commands/{id}",
            get(get_command::<R>)
                .put(update_command::<R>)
                .patch(patch_command::<R>)
                .delete(delete_command::<R>),
        )
}

fn store_error(operation: ApiOperation) -> impl Fn(RepositoryError) -> ApiError {
    move |err| ApiError::from(err).with_operation(operation)
}

async fn load<S: CommandSession>(
    session: &mut S,
    operation: ApiOperation,
    id: CommandId,
) -> Result<Command, ApiError> {
    session
        .get_by_id(id)
        .await
        .map_err(store_error(operation))?
        .ok_or_else(|| ApiError::not_found(operation, id))
}

/// `GET /commands`
pub async fn list_commands<R: CommandRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<CommandReadDto>>, ApiError> {
    let op = ApiOperation::List;
    let mut session = state.repository().begin().await.map_err(store_error(op))?;
    let commands = session.list_all().await.map_err(store_error(op))?;

    tracing::debug!(count = commands.len(), "Listed commands");
    Ok(Json(commands.into_iter().map(CommandReadDto::from).collect()))
}

/// `GET /commands/{id}`
pub async fn get_command<R: CommandRepository>(
    State(state): State<AppState<R>>,
    id: Result<Path<CommandId>, PathRejection>,
) -> Result<Json<CommandReadDto>, ApiError> {
    let op = ApiOperation::Get;
    let Path(id) = id.map_err(|e| ApiError::from(e).with_operation(op))?;

    let mut session = state.repository().begin().await.map_err(store_error(op))?;
    let command = load(&mut session, op, id).await?;

    tracing::debug!(command_id = id, "Fetched command");
    Ok(Json(command.into()))
}

/// `POST /commands`
pub async fn create_command<R: CommandRepository>(
    State(state): State<AppState<R>>,
    body: Result<Json<CommandCreateDto>, JsonRejection>,
) -> Result<Created<CommandReadDto>, ApiError> {
    let op = ApiOperation::Create;
    let Json(dto) = body.map_err(|e| ApiError::from(e).with_operation(op))?;
    dto.validate()
        .map_err(|errors| ApiError::validation_failed(op, errors))?;

    let mut command = Command::from(dto);
    let mut session = state.repository().begin().await.map_err(store_error(op))?;
    session.insert(&mut command).await.map_err(store_error(op))?;
    session.commit().await.map_err(store_error(op))?;

    tracing::info!(command_id = command.id, "Created command");
    let location = state.command_location(command.id);
    Ok(Created::new(CommandReadDto::from(command)).with_location(location))
}

/// `PUT /commands/{id}`
pub async fn update_command<R: CommandRepository>(
    State(state): State<AppState<R>>,
    id: Result<Path<CommandId>, PathRejection>,
    body: Result<Json<CommandUpdateDto>, JsonRejection>,
) -> Result<NoContent, ApiError> {
    let op = ApiOperation::Update;
    let Path(id) = id.map_err(|e| ApiError::from(e).with_operation(op))?;

    let mut session = state.repository().begin().await.map_err(store_error(op))?;
    let mut command = load(&mut session, op, id).await?;

    let Json(dto) = body.map_err(|e| ApiError::from(e).with_operation(op))?;
    dto.validate()
        .map_err(|errors| ApiError::validation_failed(op, errors).with_entity_id(id))?;

    dto.apply_to(&mut command);
    session.mark_updated(&command).await.map_err(store_error(op))?;
    session.commit().await.map_err(store_error(op))?;

    tracing::info!(command_id = id, "Updated command");
    Ok(NoContent)
}

/// `PATCH /commands/{id}`
///
/// The operations run against the command's update shape; the result must
/// pass the same validation as a full update before it is merged back.
pub async fn patch_command<R: CommandRepository>(
    State(state): State<AppState<R>>,
    id: Result<Path<CommandId>, PathRejection>,
    body: Result<Json<PatchDocument>, JsonRejection>,
) -> Result<NoContent, ApiError> {
    let op = ApiOperation::Patch;
    let Path(id) = id.map_err(|e| ApiError::from(e).with_operation(op))?;

    let mut session = state.repository().begin().await.map_err(store_error(op))?;
    let mut command = load(&mut session, op, id).await?;

    let Json(patch) = body.map_err(|e| ApiError::from(e).with_operation(op))?;
    let patched = patch
        .apply(&CommandUpdateDto::from(&command))
        .map_err(|e| ApiError::validation_failed(op, e.into()).with_entity_id(id))?;
    patched
        .validate()
        .map_err(|errors| ApiError::validation_failed(op, errors).with_entity_id(id))?;

    patched.apply_to(&mut command);
    session.mark_updated(&command).await.map_err(store_error(op))?;
    session.commit().await.map_err(store_error(op))?;

    tracing::info!(command_id = id, operations = patch.len(), "Patched command");
    Ok(NoContent)
}

/// `DELETE /commands/{id}`
pub async fn delete_command<R: CommandRepository>(
    State(state): State<AppState<R>>,
    id: Result<Path<CommandId>, PathRejection>,
) -> Result<NoContent, ApiError> {
    let op = ApiOperation::Delete;
    let Path(id) = id.map_err(|e| ApiError::from(e).with_operation(op))?;

    let mut session = state.repository().begin().await.map_err(store_error(op))?;
    let command = load(&mut session, op, id).await?;
    session.remove(&command).await.map_err(store_error(op))?;
    session.commit().await.map_err(store_error(op))?;

    tracing::info!(command_id = id, "Deleted command");
    Ok(NoContent)
}

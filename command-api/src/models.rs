//! Command entity, wire shapes, and the mapping between them
//!
//! The stored [`Command`] never travels over the wire directly. Each request
//! direction has its own shape:
//!
//! - [`CommandReadDto`]: what clients receive (includes the id)
//! - [`CommandCreateDto`]: what clients send to create (no id)
//! - [`CommandUpdateDto`]: what clients send to replace, and the document a
//!   patch is applied to
//!
//! All conversions are plain field copies.
//!
//! # Example
//!
//! ```rust
//! use command_api::models::{Command, CommandCreateDto, CommandReadDto};
//!
//! let dto = CommandCreateDto::new("List files", "Linux", "ls -la");
//! let command = Command::from(dto);
//! assert_eq!(command.id, 0);
//!
//! let read = CommandReadDto::from(command);
//! assert_eq!(read.command_line, "ls -la");
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::responses::ValidationError;

/// Identifier type for stored commands
pub type CommandId = i32;

/// Field names as they appear on the wire
pub const HOW_TO: &str = "howTo";
pub const PLATFORM: &str = "platform";
pub const COMMAND_LINE: &str = "commandLine";

/// A stored how-to entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Command {
    /// Assigned by the repository on insert; `0` until then
    pub id: CommandId,
    pub how_to: String,
    pub platform: String,
    pub command_line: String,
}

/// Response shape for a single command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReadDto {
    pub id: CommandId,
    pub how_to: String,
    pub platform: String,
    pub command_line: String,
}

/// Request shape for `POST /commands`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandCreateDto {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub how_to: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub platform: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub command_line: String,
}

/// Request shape for `PUT /commands/{id}` and the patch target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandUpdateDto {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub how_to: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub platform: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub command_line: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Command {
    /// Create an unsaved command
    pub fn new(
        how_to: impl Into<String>,
        platform: impl Into<String>,
        command_line: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            how_to: how_to.into(),
            platform: platform.into(),
            command_line: command_line.into(),
        }
    }

    /// Set the identifier (used by repositories and test fixtures)
    #[must_use]
    pub fn with_id(mut self, id: CommandId) -> Self {
        self.id = id;
        self
    }
}

impl From<Command> for CommandReadDto {
    fn from(command: Command) -> Self {
        Self {
            id: command.id,
            how_to: command.how_to,
            platform: command.platform,
            command_line: command.command_line,
        }
    }
}

impl From<CommandCreateDto> for Command {
    fn from(dto: CommandCreateDto) -> Self {
        Self {
            id: CommandId::default(),
            how_to: dto.how_to,
            platform: dto.platform,
            command_line: dto.command_line,
        }
    }
}

impl From<&Command> for CommandUpdateDto {
    fn from(command: &Command) -> Self {
        Self {
            how_to: command.how_to.clone(),
            platform: command.platform.clone(),
            command_line: command.command_line.clone(),
        }
    }
}

impl CommandCreateDto {
    pub fn new(
        how_to: impl Into<String>,
        platform: impl Into<String>,
        command_line: impl Into<String>,
    ) -> Self {
        Self {
            how_to: how_to.into(),
            platform: platform.into(),
            command_line: command_line.into(),
        }
    }

    /// Check that every field is populated
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.how_to, &self.platform, &self.command_line)
    }
}

impl CommandUpdateDto {
    pub fn new(
        how_to: impl Into<String>,
        platform: impl Into<String>,
        command_line: impl Into<String>,
    ) -> Self {
        Self {
            how_to: how_to.into(),
            platform: platform.into(),
            command_line: command_line.into(),
        }
    }

    /// Check that every field is populated
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.how_to, &self.platform, &self.command_line)
    }

    /// Overwrite the string fields of `target`, leaving its id alone
    pub fn apply_to(self, target: &mut Command) {
        target.how_to = self.how_to;
        target.platform = self.platform;
        target.command_line = self.command_line;
    }

    /// Mutable access to a field by its wire name
    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            HOW_TO => Some(&mut self.how_to),
            PLATFORM => Some(&mut self.platform),
            COMMAND_LINE => Some(&mut self.command_line),
            _ => None,
        }
    }

    /// Read a field by its wire name
    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        match name {
            HOW_TO => Some(&self.how_to),
            PLATFORM => Some(&self.platform),
            COMMAND_LINE => Some(&self.command_line),
            _ => None,
        }
    }
}

fn validate_fields(how_to: &str, platform: &str, command_line: &str) -> Result<(), ValidationError> {
    let mut errors = ValidationError::new("One or more validation errors occurred");

    for (field, value) in [(HOW_TO, how_to), (PLATFORM, platform), (COMMAND_LINE, command_line)] {
        if value.trim().is_empty() {
            errors.add_field_error(field, "REQUIRED", format!("The {} field is required.", field));
        }
    }

    if errors.has_errors() {
        Err(errors)
    } else {
        Ok(())
    }
}

//! Patch engine for partial command updates
//!
//! A patch document is an RFC 6902 style array of operations. Commands only
//! have three string fields, so instead of walking an arbitrary JSON tree the
//! engine treats a [`CommandUpdateDto`] as a fixed-schema document and
//! resolves each path to one of its fields.
//!
//! Application is all-or-nothing: operations run in order against a copy of
//! the target, and the first inapplicable one aborts the whole patch.
//!
//! # Example
//!
//! ```rust
//! use command_api::models::CommandUpdateDto;
//! use command_api::patch::PatchDocument;
//!
//! let doc: PatchDocument = serde_json::from_str(
//!     r#"[{"op": "replace", "path": "/howTo", "value": "updated"}]"#,
//! ).unwrap();
//!
//! let original = CommandUpdateDto::new("mock", "Mock", "Mock");
//! let patched = doc.apply(&original).unwrap();
//! assert_eq!(patched.how_to, "updated");
//! assert_eq!(original.how_to, "mock");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CommandUpdateDto, COMMAND_LINE, HOW_TO, PLATFORM};
use crate::responses::ValidationError;

const FIELDS: [&str; 3] = [HOW_TO, PLATFORM, COMMAND_LINE];

/// A single patch instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    /// Operation name as it appears in the `op` member
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Replace { .. } => "replace",
            Self::Move { .. } => "move",
            Self::Copy { .. } => "copy",
            Self::Test { .. } => "test",
        }
    }

    /// Target path of the operation
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. }
            | Self::Remove { path }
            | Self::Replace { path, .. }
            | Self::Move { path, .. }
            | Self::Copy { path, .. }
            | Self::Test { path, .. } => path,
        }
    }

    fn apply(&self, doc: &mut CommandUpdateDto) -> Result<(), PatchError> {
        match self {
            Self::Add { path, value } | Self::Replace { path, value } => {
                let field = resolve(self, path)?;
                let value = string_value(self, path, value)?;
                set(doc, field, value);
            }
            Self::Remove { path } => {
                let field = resolve(self, path)?;
                set(doc, field, String::new());
            }
            Self::Move { from, path } => {
                let source = resolve(self, from)?;
                let target = resolve(self, path)?;
                if source != target {
                    let value = get(doc, source);
                    set(doc, source, String::new());
                    set(doc, target, value);
                }
            }
            Self::Copy { from, path } => {
                let source = resolve(self, from)?;
                let target = resolve(self, path)?;
                let value = get(doc, source);
                set(doc, target, value);
            }
            Self::Test { path, value } => {
                let field = resolve(self, path)?;
                let expected = string_value(self, path, value)?;
                if get(doc, field) != expected {
                    return Err(PatchError::new(
                        self,
                        path,
                        PatchErrorKind::TestFailed,
                        format!("The current value at '{}' does not match the test value", path),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// An ordered sequence of patch operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument(Vec<PatchOperation>);

impl PatchDocument {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self(operations)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply every operation in order to a copy of `target`
    ///
    /// Returns the patched copy, or the first error encountered. `target`
    /// itself is never modified.
    pub fn apply(&self, target: &CommandUpdateDto) -> Result<CommandUpdateDto, PatchError> {
        let mut doc = target.clone();
        for (index, operation) in self.0.iter().enumerate() {
            operation
                .apply(&mut doc)
                .map_err(|err| err.at_index(index))?;
        }
        Ok(doc)
    }
}

impl From<Vec<PatchOperation>> for PatchDocument {
    fn from(operations: Vec<PatchOperation>) -> Self {
        Self(operations)
    }
}

/// Why an operation could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchErrorKind {
    /// Path is not a pointer to one of the command fields
    InvalidPath,
    /// Value is not a string (or null)
    InvalidValue,
    /// A `test` operation did not match
    TestFailed,
}

impl PatchErrorKind {
    /// Error code used in validation responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath | Self::InvalidValue => "INVALID_PATCH_OPERATION",
            Self::TestFailed => "TEST_FAILED",
        }
    }
}

/// Error raised when a patch operation is inapplicable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchError {
    /// Position of the failing operation in the document
    pub index: usize,
    /// Name of the failing operation
    pub op: &'static str,
    /// The path that could not be used
    pub path: String,
    pub kind: PatchErrorKind,
    pub message: String,
}

impl PatchError {
    fn new(
        operation: &PatchOperation,
        path: &str,
        kind: PatchErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index: 0,
            op: operation.name(),
            path: path.to_string(),
            kind,
            message: message.into(),
        }
    }

    fn at_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "patch operation {} ({}) failed at '{}': {}",
            self.index, self.op, self.path, self.message
        )
    }
}

impl std::error::Error for PatchError {}

impl From<PatchError> for ValidationError {
    fn from(err: PatchError) -> Self {
        let mut validation = ValidationError::new("The patch document could not be applied");
        let field = if err.path.is_empty() { "/" } else { err.path.as_str() };
        validation.add_field_error(field, err.kind.code(), err.to_string());
        validation
    }
}

/// Resolve a JSON pointer to a field name
fn resolve(operation: &PatchOperation, pointer: &str) -> Result<&'static str, PatchError> {
    let invalid = |message: String| {
        PatchError::new(operation, pointer, PatchErrorKind::InvalidPath, message)
    };

    let Some(token) = pointer.strip_prefix('/') else {
        return Err(invalid(format!(
            "'{}' is not a valid path; paths must name a command field",
            pointer
        )));
    };
    if token.contains('/') {
        return Err(invalid(format!("The target location '{}' was not found", pointer)));
    }

    let token = token.replace("~1", "/").replace("~0", "~");
    FIELDS
        .iter()
        .copied()
        .find(|field| field.eq_ignore_ascii_case(&token))
        .ok_or_else(|| invalid(format!("The target location '{}' was not found", pointer)))
}

fn string_value(operation: &PatchOperation, path: &str, value: &Value) -> Result<String, PatchError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(PatchError::new(
            operation,
            path,
            PatchErrorKind::InvalidValue,
            format!("The value '{}' is invalid for target location '{}'", other, path),
        )),
    }
}

fn get(doc: &CommandUpdateDto, field: &str) -> String {
    doc.field(field).unwrap_or_default().to_string()
}

fn set(doc: &mut CommandUpdateDto, field: &str, value: String) {
    if let Some(slot) = doc.field_mut(field) {
        *slot = value;
    }
}

use crate::codec::CodecError;
use crate::geometry::Vector;
use crate::warning::Warning;

/// A structural problem in external data, located by a dotted path such as
/// `blueprint.entities[3].position`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct FormatError {
    pub path: String,
    pub message: String,
}

impl FormatError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Prefix the path with an enclosing location.
    pub fn within(mut self, parent: &str) -> Self {
        self.path = if self.path.is_empty() {
            parent.to_string()
        } else {
            format!("{parent}.{}", self.path)
        };
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    #[error("format error at {0}")]
    Format(#[from] FormatError),
    #[error("'{name}' at {position} has a connection to an entity that is not in this blueprint")]
    InvalidAssociation { name: String, position: Vector },
    #[error("schedule {schedule} references a locomotive that is not in this blueprint (slot {slot})")]
    InvalidLocomotive { schedule: usize, slot: usize },
    #[error("resulting blueprint would be {width}x{height} tiles; the limit is 10000x10000")]
    UnreasonablySized { width: u32, height: u32 },
    #[error("expected '{expected}' blueprintable, found '{found}'")]
    IncorrectBlueprintType { expected: String, found: String },
    #[error("malformed blueprint string: {0}")]
    MalformedString(#[from] CodecError),
    #[error("warning promoted under pedantic validation: {0}")]
    Pedantic(Warning),
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no such entity in this blueprint")]
    EntityNotFound,
    #[error("cannot connect '{name}': {reason}")]
    NotConnectable { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_path_nesting() {
        let e = FormatError::new("position", "missing field `x`").within("blueprint.entities[0]");
        assert_eq!(e.path, "blueprint.entities[0].position");
        assert_eq!(e.to_string(), "blueprint.entities[0].position: missing field `x`");
    }

    #[test]
    fn association_error_names_entity() {
        let e = BlueprintError::InvalidAssociation {
            name: "wooden-chest".into(),
            position: Vector::new(0.5, 0.5),
        };
        assert!(e.to_string().contains("'wooden-chest' at (0.5, 0.5)"));
    }
}

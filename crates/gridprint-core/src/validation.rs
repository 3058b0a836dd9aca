//! Validation modes and the context warnings flow through.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::GameData;
use crate::error::BlueprintError;
use crate::warning::Warning;

/// How much checking to perform, from nothing to treating warnings as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// No checks at all.
    None,
    /// Structural checks only. Semantic warnings are not produced.
    Minimum,
    /// Structural checks plus semantic warnings.
    #[default]
    Strict,
    /// As strict, with every warning promoted to an error.
    Pedantic,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "minimum" => Ok(Self::Minimum),
            "strict" => Ok(Self::Strict),
            "pedantic" => Ok(Self::Pedantic),
            other => Err(format!("unknown validation mode '{other}'")),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Minimum => "minimum",
            Self::Strict => "strict",
            Self::Pedantic => "pedantic",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ValidationContext
// ---------------------------------------------------------------------------

/// Collects warnings for one operation according to a [`ValidationMode`].
#[derive(Debug)]
pub struct ValidationContext<'a> {
    mode: ValidationMode,
    data: &'a GameData,
    warnings: Vec<Warning>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(mode: ValidationMode, data: &'a GameData) -> Self {
        Self {
            mode,
            data,
            warnings: Vec::new(),
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn data(&self) -> &'a GameData {
        self.data
    }

    /// True if semantic warnings are being produced in this mode.
    pub fn wants_warnings(&self) -> bool {
        self.mode >= ValidationMode::Strict
    }

    /// Record a warning. Dropped below strict, an error under pedantic.
    pub fn warn(&mut self, warning: Warning) -> Result<(), BlueprintError> {
        match self.mode {
            ValidationMode::None | ValidationMode::Minimum => Ok(()),
            ValidationMode::Strict => {
                tracing::warn!(%warning, "blueprint warning");
                self.warnings.push(warning);
                Ok(())
            }
            ValidationMode::Pedantic => Err(BlueprintError::Pedantic(warning)),
        }
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = Warning>) -> Result<(), BlueprintError> {
        for warning in warnings {
            self.warn(warning)?;
        }
        Ok(())
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// Outcome of an inspect-only validation pass.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<BlueprintError>,
    pub warnings: Vec<Warning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record the outcome of one check.
    pub fn absorb(&mut self, outcome: Result<(), BlueprintError>) {
        if let Err(e) = outcome {
            self.errors.push(e);
        }
    }

    /// The first error, or the warnings if there were none.
    pub fn into_result(self) -> Result<Vec<Warning>, BlueprintError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.warnings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Warning {
        Warning::UnknownEntity("mystery-box".into())
    }

    #[test]
    fn strict_collects() {
        let data = GameData::default();
        let mut ctx = ValidationContext::new(ValidationMode::Strict, &data);
        ctx.warn(sample()).unwrap();
        assert_eq!(ctx.into_warnings(), vec![sample()]);
    }

    #[test]
    fn minimum_drops() {
        let data = GameData::default();
        let mut ctx = ValidationContext::new(ValidationMode::Minimum, &data);
        ctx.warn(sample()).unwrap();
        assert!(ctx.warnings().is_empty());
        assert!(!ctx.wants_warnings());
    }

    #[test]
    fn pedantic_promotes() {
        let data = GameData::default();
        let mut ctx = ValidationContext::new(ValidationMode::Pedantic, &data);
        let result = ctx.warn(sample());
        assert!(matches!(result, Err(BlueprintError::Pedantic(Warning::UnknownEntity(_)))));
    }

    #[test]
    fn mode_parsing_and_order() {
        assert_eq!("Pedantic".parse::<ValidationMode>().unwrap(), ValidationMode::Pedantic);
        assert!("loose".parse::<ValidationMode>().is_err());
        assert!(ValidationMode::None < ValidationMode::Minimum);
        assert!(ValidationMode::Strict < ValidationMode::Pedantic);
        assert_eq!(ValidationMode::default(), ValidationMode::Strict);
    }

    #[test]
    fn result_first_error_wins() {
        let mut result = ValidationResult::default();
        result.absorb(Ok(()));
        assert!(result.is_valid());
        result.absorb(Err(BlueprintError::EntityNotFound));
        result.absorb(Err(BlueprintError::IndexOutOfRange { index: 3, len: 1 }));
        assert!(!result.is_valid());
        assert!(matches!(result.into_result(), Err(BlueprintError::EntityNotFound)));
    }
}

//! Signals and blueprint icons.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::GameData;
use crate::error::{BlueprintError, FormatError};
use crate::validation::{ValidationContext, ValidationMode};
use crate::warning::Warning;

/// Maximum number of icons a blueprint may display.
pub const MAX_ICONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Item,
    Fluid,
    Virtual,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalType::Item => "item",
            SignalType::Fluid => "fluid",
            SignalType::Virtual => "virtual",
        };
        f.write_str(s)
    }
}

/// A named signal together with its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId {
    pub name: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
}

impl SignalId {
    pub fn new(name: &str, signal_type: SignalType) -> Self {
        Self {
            name: name.to_string(),
            signal_type,
        }
    }

    /// Build a signal from its name alone, inferring the type from `data`.
    pub fn from_name(name: &str, data: &GameData) -> Result<Self, BlueprintError> {
        match data.signal_type(name) {
            Some(signal_type) => Ok(Self::new(name, signal_type)),
            None => Err(FormatError::new("signal.name", format!("unknown signal name '{name}'")).into()),
        }
    }

    /// Warn about signals the data table does not know, or knows with a
    /// different type.
    pub fn check(&self, ctx: &mut ValidationContext<'_>) -> Result<(), BlueprintError> {
        match ctx.data().signal_type(&self.name) {
            None => ctx.warn(Warning::UnknownSignal(self.name.clone())),
            Some(expected) if expected != self.signal_type => ctx.warn(Warning::MalformedSignal {
                name: self.name.clone(),
                expected,
                found: self.signal_type,
            }),
            Some(_) => Ok(()),
        }
    }
}

/// One of the up-to-four icons shown on a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub signal: SignalId,
    /// Slot, 1 through 4.
    pub index: u8,
}

impl Icon {
    pub fn new(signal: SignalId, index: u8) -> Self {
        Self { signal, index }
    }
}

/// Build icons from signal names, numbering them 1.. in order.
pub fn icons_from_names(names: &[&str], data: &GameData) -> Result<Vec<Icon>, BlueprintError> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Ok(Icon::new(SignalId::from_name(name, data)?, (i + 1) as u8)))
        .collect()
}

/// Check icon count and slot range, then each icon's signal.
pub fn validate_icons(icons: &[Icon], ctx: &mut ValidationContext<'_>) -> Result<(), BlueprintError> {
    if ctx.mode() == ValidationMode::None {
        return Ok(());
    }
    if icons.len() > MAX_ICONS {
        return Err(FormatError::new(
            "blueprint.icons",
            format!("at most {MAX_ICONS} icons are allowed, found {}", icons.len()),
        )
        .into());
    }
    for (i, icon) in icons.iter().enumerate() {
        if !(1..=MAX_ICONS as u8).contains(&icon.index) {
            return Err(FormatError::new(
                format!("blueprint.icons[{i}].index"),
                format!("icon index must be between 1 and {MAX_ICONS}, found {}", icon.index),
            )
            .into());
        }
    }
    if ctx.mode() >= ValidationMode::Strict {
        for icon in icons {
            icon.signal.check(ctx)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signal_type_inferred_from_data() {
        let data = GameData::vanilla();
        let signal = SignalId::from_name("signal-A", &data).unwrap();
        assert_eq!(signal.signal_type, SignalType::Virtual);
        assert!(SignalId::from_name("not-a-signal", &data).is_err());
    }

    #[test]
    fn signal_serializes_type_key() {
        let signal = SignalId::new("iron-plate", SignalType::Item);
        assert_eq!(
            serde_json::to_value(&signal).unwrap(),
            json!({"name": "iron-plate", "type": "item"})
        );
    }

    #[test]
    fn mismatched_signal_type_warns() {
        let data = GameData::vanilla();
        let mut ctx = ValidationContext::new(ValidationMode::Strict, &data);
        SignalId::new("iron-plate", SignalType::Fluid).check(&mut ctx).unwrap();
        SignalId::new("mystery", SignalType::Item).check(&mut ctx).unwrap();
        let warnings = ctx.into_warnings();
        assert!(matches!(warnings[0], Warning::MalformedSignal { .. }));
        assert!(matches!(warnings[1], Warning::UnknownSignal(_)));
    }

    #[test]
    fn too_many_icons_is_an_error() {
        let data = GameData::vanilla();
        let icons = icons_from_names(&["signal-A", "signal-B", "signal-C", "signal-D", "signal-E"], &data).unwrap();
        let mut ctx = ValidationContext::new(ValidationMode::Minimum, &data);
        assert!(matches!(validate_icons(&icons, &mut ctx), Err(BlueprintError::Format(_))));
    }

    #[test]
    fn icon_index_out_of_range() {
        let data = GameData::vanilla();
        let icons = vec![Icon::new(SignalId::new("signal-A", SignalType::Virtual), 0)];
        let mut ctx = ValidationContext::new(ValidationMode::Strict, &data);
        assert!(validate_icons(&icons, &mut ctx).is_err());

        let mut off = ValidationContext::new(ValidationMode::None, &data);
        assert!(validate_icons(&icons, &mut off).is_ok());
    }
}

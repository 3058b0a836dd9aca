//! RGBA colors in either the 0..=1 or the 0..=255 scale.

use serde::{Deserialize, Serialize};

use crate::error::{BlueprintError, FormatError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    /// Omitted alpha is inferred from the scale of the other channels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Sequence(Vec<f64>),
    Mapping {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default)]
        a: Option<f64>,
    },
}

impl TryFrom<ColorRepr> for Color {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        let color = match repr {
            ColorRepr::Sequence(channels) => match channels.as_slice() {
                [r, g, b] => Color::raw(*r, *g, *b, None),
                [r, g, b, a] => Color::raw(*r, *g, *b, Some(*a)),
                other => return Err(format!("color must have 3 or 4 channels, found {}", other.len())),
            },
            ColorRepr::Mapping { r, g, b, a } => Color::raw(r, g, b, a),
        };
        color.check().map_err(|e| e.message)?;
        Ok(color)
    }
}

impl Color {
    const fn raw(r: f64, g: f64, b: f64, a: Option<f64>) -> Self {
        Self { r, g, b, a }
    }

    /// A color with every channel checked against `[0, 255]`.
    pub fn new(r: f64, g: f64, b: f64, a: Option<f64>) -> Result<Self, BlueprintError> {
        let color = Self::raw(r, g, b, a);
        color.check()?;
        Ok(color)
    }

    pub fn rgb(r: f64, g: f64, b: f64) -> Result<Self, BlueprintError> {
        Self::new(r, g, b, None)
    }

    pub fn check(&self) -> Result<(), FormatError> {
        let channels = [("r", Some(self.r)), ("g", Some(self.g)), ("b", Some(self.b)), ("a", self.a)];
        for (name, value) in channels {
            let Some(value) = value else { continue };
            if !(0.0..=255.0).contains(&value) {
                return Err(FormatError::new(
                    format!("color.{name}"),
                    format!("channel must be within [0, 255], found {value}"),
                ));
            }
        }
        Ok(())
    }

    /// True if every given channel is at most 1, i.e. the 0..=1 scale.
    pub fn is_unit_scale(&self) -> bool {
        [Some(self.r), Some(self.g), Some(self.b), self.a]
            .into_iter()
            .flatten()
            .all(|c| c <= 1.0)
    }

    /// Alpha, defaulting to fully opaque in whichever scale the color uses.
    pub fn alpha(&self) -> f64 {
        self.a.unwrap_or(if self.is_unit_scale() { 1.0 } else { 255.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sequence_form_normalizes_to_mapping() {
        let color: Color = serde_json::from_value(json!([127, 127, 127])).unwrap();
        assert_eq!(
            serde_json::to_value(color).unwrap(),
            json!({"r": 127.0, "g": 127.0, "b": 127.0})
        );
        assert_eq!(color.alpha(), 255.0);
    }

    #[test]
    fn unit_scale_alpha_default() {
        let color = Color::rgb(0.5, 0.25, 1.0).unwrap();
        assert!(color.is_unit_scale());
        assert_eq!(color.alpha(), 1.0);
    }

    #[test]
    fn explicit_alpha_round_trips() {
        let color: Color = serde_json::from_value(json!({"r": 1.0, "g": 0.0, "b": 0.0, "a": 0.5})).unwrap();
        assert_eq!(color.a, Some(0.5));
        assert_eq!(serde_json::to_value(color).unwrap()["a"], json!(0.5));
    }

    #[test]
    fn out_of_range_channel_rejected() {
        assert!(Color::rgb(256.0, 0.0, 0.0).is_err());
        assert!(Color::new(0.0, 0.0, 0.0, Some(-1.0)).is_err());
        assert!(serde_json::from_value::<Color>(json!([300, 0, 0])).is_err());
    }

    #[test]
    fn wrong_channel_count_rejected() {
        assert!(serde_json::from_value::<Color>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<Color>(json!([1, 2, 3, 4, 5])).is_err());
    }
}

use serde::{Deserialize, Serialize};

/// A single form field as the user typed it.
///
/// Numbers come through as numbers, anything else is kept verbatim so the
/// normalizer can decide what to do with it instead of the whole config
/// failing to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl NumericInput {
    /// Parsed value, or `None` when the field does not hold a number.
    /// NaN is never a number here; infinities are returned as-is.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            NumericInput::Number(v) => *v,
            NumericInput::Text(s) => s.trim().parse::<f64>().ok()?,
            NumericInput::Other(_) => return None,
        };

        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(value: String) -> Self {
        NumericInput::Text(value)
    }
}

/// A free-text form field. Non-string JSON values are kept so the
/// normalizer can warn about them rather than rejecting the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Text(String),
    Other(serde_json::Value),
}

impl TextInput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TextInput::Text(s) => Some(s),
            TextInput::Other(_) => None,
        }
    }
}

impl From<&str> for TextInput {
    fn from(value: &str) -> Self {
        TextInput::Text(value.to_string())
    }
}

impl From<String> for TextInput {
    fn from(value: String) -> Self {
        TextInput::Text(value)
    }
}

/// Unvalidated simulation inputs, one optional field per form control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawParameters {
    pub route: Option<TextInput>,
    pub dose: Option<NumericInput>,
    pub volume: Option<NumericInput>,
    pub ke: Option<NumericInput>,
    pub ka: Option<NumericInput>,
    pub bioavailability: Option<NumericInput>,
    pub interval: Option<NumericInput>,
    pub dose_count: Option<NumericInput>,
    pub therapeutic_min: Option<NumericInput>,
    pub therapeutic_max: Option<NumericInput>,
}

impl RawParameters {
    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: RawParameters) -> Self {
        Self {
            route: overrides.route.or(self.route),
            dose: overrides.dose.or(self.dose),
            volume: overrides.volume.or(self.volume),
            ke: overrides.ke.or(self.ke),
            ka: overrides.ka.or(self.ka),
            bioavailability: overrides.bioavailability.or(self.bioavailability),
            interval: overrides.interval.or(self.interval),
            dose_count: overrides.dose_count.or(self.dose_count),
            therapeutic_min: overrides.therapeutic_min.or(self.therapeutic_min),
            therapeutic_max: overrides.therapeutic_max.or(self.therapeutic_max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_input_parsing() {
        assert_eq!(NumericInput::from(2.5).value(), Some(2.5));
        assert_eq!(NumericInput::from(" 12 ").value(), Some(12.0));
        assert_eq!(NumericInput::from("abc").value(), None);
        assert_eq!(NumericInput::from("").value(), None);
        assert_eq!(NumericInput::from("NaN").value(), None);
        assert_eq!(NumericInput::from("inf").value(), Some(f64::INFINITY));
        assert_eq!(NumericInput::Other(serde_json::Value::Bool(true)).value(), None);
    }

    #[test]
    fn test_raw_parameters_from_json() {
        let json = r#"{ "route": "oral", "dose": 250, "ke": "0.2", "ka": true, "volume": null }"#;
        let raw: RawParameters = serde_json::from_str(json).unwrap();

        assert_eq!(raw.route.as_ref().and_then(TextInput::as_text), Some("oral"));
        assert_eq!(raw.dose.as_ref().and_then(NumericInput::value), Some(250.0));
        assert_eq!(raw.ke.as_ref().and_then(NumericInput::value), Some(0.2));
        assert!(raw.ka.is_some());
        assert_eq!(raw.ka.as_ref().and_then(NumericInput::value), None);
        assert!(raw.volume.is_none());
    }

    #[test]
    fn test_non_string_route_is_kept() {
        let raw: RawParameters = serde_json::from_str(r#"{ "route": 1 }"#).unwrap();
        assert_eq!(raw.route, Some(TextInput::Other(serde_json::json!(1))));
        assert_eq!(raw.route.as_ref().and_then(TextInput::as_text), None);
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = RawParameters {
            dose: Some(100.0.into()),
            volume: Some(20.0.into()),
            ..Default::default()
        };
        let overrides = RawParameters {
            dose: Some(300.0.into()),
            ..Default::default()
        };

        let merged = base.merge(overrides);
        assert_eq!(merged.dose, Some(NumericInput::Number(300.0)));
        assert_eq!(merged.volume, Some(NumericInput::Number(20.0)));
    }
}

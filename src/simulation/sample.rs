use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Subtherapeutic,
    Therapeutic,
    Toxic,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Subtherapeutic => "subtherapeutic",
            Status::Therapeutic => "therapeutic",
            Status::Toxic => "toxic",
        };
        f.write_str(name)
    }
}

/// One point of the concentration curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,          // h
    pub concentration: f64, // mg/L
    pub therapeutic_min: f64,
    pub therapeutic_max: f64,
    pub in_range: bool,
    pub status: Status,
}

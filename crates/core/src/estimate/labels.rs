//! Human-readable descriptors for roof azimuth and tilt.
//!
//! Shared by the estimate response, the history views and the CLI report so the three never
//! disagree on a label.

use serde::{Deserialize, Serialize};

/// Compass name for the four cardinal azimuths, `"<deg>°"` otherwise.
pub fn describe_azimuth(azimuth: i32) -> String {
    match azimuth {
        0 => "North".to_string(),
        90 => "East".to_string(),
        180 => "South".to_string(),
        270 => "West".to_string(),
        other => format!("{other}°"),
    }
}

/// Direction relative to someone standing in front of the house, on the 8 multiples of 45°.
pub fn describe_facing(azimuth: i32) -> String {
    let label = match azimuth {
        0 => "Back",
        45 => "Back Left",
        90 => "Left",
        135 => "Front Left",
        180 => "Front",
        225 => "Front Right",
        270 => "Right",
        315 => "Back Right",
        other => return format!("{other}°"),
    };
    label.to_string()
}

pub fn describe_tilt(tilt: i32) -> String {
    match RoofType::from_tilt(tilt) {
        Some(roof) => roof.label().to_string(),
        None => format!("{tilt}°"),
    }
}

/// Roof presets offered on the estimator form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoofType {
    Flat,
    Slight,
    Steep,
}

impl RoofType {
    pub fn from_tilt(tilt: i32) -> Option<Self> {
        match tilt {
            5 => Some(RoofType::Flat),
            15 => Some(RoofType::Slight),
            30 => Some(RoofType::Steep),
            _ => None,
        }
    }

    pub fn tilt(&self) -> i32 {
        match self {
            RoofType::Flat => 5,
            RoofType::Slight => 15,
            RoofType::Steep => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoofType::Flat => "Flat",
            RoofType::Slight => "Slightly Sloped",
            RoofType::Steep => "Steep",
        }
    }
}

/// Display labels attached to a calculation in API responses and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryLabels {
    pub orientation: String,
    pub facing: String,
    pub tilt: String,
    pub roof_type: Option<RoofType>,
}

impl GeometryLabels {
    pub fn new(azimuth: i32, tilt: i32) -> Self {
        Self {
            orientation: describe_azimuth(azimuth),
            facing: describe_facing(azimuth),
            tilt: describe_tilt(tilt),
            roof_type: RoofType::from_tilt(tilt),
        }
    }
}

//! Values computed from the registry for display: BMI and procedure durations.

use serde::{Deserialize, Serialize};

use super::fields::{parse_clock_time, TextField};
use super::registry::FieldRegistry;

/// BMI band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_value(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bmi {
    /// Rounded to one decimal place
    pub value: f64,
    pub category: BmiCategory,
}

impl Bmi {
    /// Imperial BMI: 703 × lb / in².
    pub fn from_imperial(feet: u32, inches: u32, weight_lb: u32) -> Option<Self> {
        let total_inches = feet.checked_mul(12)?.checked_add(inches)?;
        if total_inches == 0 || weight_lb == 0 {
            return None;
        }
        let total_inches = f64::from(total_inches);
        let raw = 703.0 * f64::from(weight_lb) / (total_inches * total_inches);
        let value = (raw * 10.0).round() / 10.0;
        Some(Self {
            value,
            category: BmiCategory::from_value(value),
        })
    }

    /// BMI from the registry's height/weight, only when all three are in range.
    pub fn from_registry(registry: &FieldRegistry) -> Option<Self> {
        let value = |field: TextField| -> Option<u32> {
            let text = registry.text(field);
            if !field.format().accepts(text) {
                return None;
            }
            text.trim().parse().ok()
        };
        Self::from_imperial(
            value(TextField::HeightFeet)?,
            value(TextField::HeightInches)?,
            value(TextField::Weight)?,
        )
    }
}

/// Minutes between two HH:MM times; an end before the start crosses midnight.
pub fn minutes_between(start: &str, end: &str) -> Option<i64> {
    let start = parse_clock_time(start)?;
    let end = parse_clock_time(end)?;
    let minutes = (end - start).num_minutes();
    Some(if minutes < 0 { minutes + 24 * 60 } else { minutes })
}

/// Render minutes as "1h 15m" or "45m".
pub fn format_minutes(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, rest)
    } else {
        format!("{}m", rest)
    }
}

/// Procedure durations derived from the four monitoring timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    /// Time in room → out of room
    pub room_minutes: Option<i64>,
    /// Sedation start → sedation end
    pub sedation_minutes: Option<i64>,
}

impl Durations {
    pub fn from_registry(registry: &FieldRegistry) -> Self {
        Self {
            room_minutes: minutes_between(
                registry.text(TextField::TimeInRoom),
                registry.text(TextField::OutOfRoomTime),
            ),
            sedation_minutes: minutes_between(
                registry.text(TextField::SedationStartTime),
                registry.text(TextField::SedationEndTime),
            ),
        }
    }
}

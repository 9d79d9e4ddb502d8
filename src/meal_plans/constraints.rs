use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::repo_types::Day;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Portions {
    #[default]
    Normal,
    Extra,
    /// No dinner needed at home.
    #[serde(rename = "none")]
    NoMeal,
    Reduced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Normal,
    Complex,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayConstraint {
    #[serde(default)]
    pub portions: Portions,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub notes: String,
}

static DEFAULT_DAY: DayConstraint = DayConstraint {
    portions: Portions::Normal,
    complexity: Complexity::Normal,
    notes: String::new(),
};

/// One constraint per day of the week, every day always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WeeklyConstraints {
    days: BTreeMap<Day, DayConstraint>,
}

impl Default for WeeklyConstraints {
    fn default() -> Self {
        Self {
            days: Day::ALL.into_iter().map(|d| (d, DayConstraint::default())).collect(),
        }
    }
}

impl WeeklyConstraints {
    pub fn get(&self, day: Day) -> &DayConstraint {
        self.days.get(&day).unwrap_or(&DEFAULT_DAY)
    }

    pub fn set(&mut self, day: Day, constraint: DayConstraint) {
        self.days.insert(day, constraint);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, &DayConstraint)> {
        self.days.iter().map(|(d, c)| (*d, c))
    }

    /// Builds constraints from the extraction reply.
    ///
    /// Day keys match case-insensitively; a day the reply leaves out gets the
    /// defaults. Unknown enum values fall back to defaults too, but the reply
    /// itself has to be a JSON object.
    pub fn from_extraction(value: &serde_json::Value) -> Result<Self, AppError> {
        let obj = value
            .as_object()
            .ok_or_else(|| AppError::extraction("weekly constraints must be a JSON object"))?;

        let mut out = Self::default();
        for (key, raw) in obj {
            let Ok(day) = key.parse::<Day>() else {
                warn!(key = %key, "ignoring unknown day in weekly constraints");
                continue;
            };
            out.set(day, lenient_constraint(raw));
        }
        Ok(out)
    }

    /// Restores constraints stored on a session; missing days get defaults.
    pub fn from_stored(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let stored: BTreeMap<Day, DayConstraint> = serde_json::from_value(value)?;
        let mut out = Self::default();
        for (day, c) in stored {
            out.set(day, c);
        }
        Ok(out)
    }
}

fn lenient_constraint(raw: &serde_json::Value) -> DayConstraint {
    let field = |name: &str| {
        raw.get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default()
    };

    let portions = match field("portions").as_str() {
        "extra" => Portions::Extra,
        "none" => Portions::NoMeal,
        "reduced" => Portions::Reduced,
        _ => Portions::Normal,
    };
    let complexity = match field("complexity").as_str() {
        "simple" => Complexity::Simple,
        "complex" => Complexity::Complex,
        _ => Complexity::Normal,
    };
    let notes = raw
        .get("notes")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    DayConstraint { portions, complexity, notes }
}

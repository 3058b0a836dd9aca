//! Train schedules: an ordered list of stops plus the locomotives running it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BlueprintError;
use crate::id::{Association, EntityId};
use crate::signal::SignalId;
use crate::validation::ValidationContext;
use crate::warning::Warning;

const WAIT_CONDITION_TYPES: &[&str] = &[
    "time",
    "inactivity",
    "full",
    "empty",
    "item_count",
    "fluid_count",
    "circuit",
    "robots_inactive",
    "passenger_present",
    "passenger_not_present",
];

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Comparison operator. ASCII spellings are accepted and normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Comparator {
    Greater,
    Less,
    Equal,
    GreaterOrEqual,
    LessOrEqual,
    NotEqual,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::Equal => "=",
            Comparator::GreaterOrEqual => "≥",
            Comparator::LessOrEqual => "≤",
            Comparator::NotEqual => "≠",
        }
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            ">" => Comparator::Greater,
            "<" => Comparator::Less,
            "=" | "==" => Comparator::Equal,
            "≥" | ">=" => Comparator::GreaterOrEqual,
            "≤" | "<=" => Comparator::LessOrEqual,
            "≠" | "!=" => Comparator::NotEqual,
            other => return Err(format!("unknown comparator '{other}'")),
        })
    }
}

impl TryFrom<String> for Comparator {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Comparator> for String {
    fn from(c: Comparator) -> String {
        c.symbol().to_string()
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A signal compared against a constant or a second signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_signal: Option<SignalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparator: Option<Comparator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_signal: Option<SignalId>,
}

impl Condition {
    pub fn constant(signal: SignalId, comparator: Comparator, constant: i32) -> Self {
        Self {
            first_signal: Some(signal),
            comparator: Some(comparator),
            constant: Some(constant),
            second_signal: None,
        }
    }

    fn check(&self, ctx: &mut ValidationContext<'_>) -> Result<(), BlueprintError> {
        for signal in self.first_signal.iter().chain(self.second_signal.iter()) {
            signal.check(ctx)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitCondition {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WaitCondition {
    fn with_kind(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            compare_type: Some("or".to_string()),
            ticks: None,
            condition: None,
            extra: Map::new(),
        }
    }

    pub fn time(ticks: u32) -> Self {
        Self {
            ticks: Some(ticks),
            ..Self::with_kind("time")
        }
    }

    pub fn inactivity(ticks: u32) -> Self {
        Self {
            ticks: Some(ticks),
            ..Self::with_kind("inactivity")
        }
    }

    pub fn full() -> Self {
        Self::with_kind("full")
    }

    pub fn empty() -> Self {
        Self::with_kind("empty")
    }

    pub fn circuit(condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..Self::with_kind("circuit")
        }
    }

    pub fn item_count(condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..Self::with_kind("item_count")
        }
    }

    /// Combine with the previous condition using `and` instead of `or`.
    pub fn and(mut self) -> Self {
        self.compare_type = Some("and".to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub station: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wait_conditions: Vec<WaitCondition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Stop {
    pub fn new(station: &str, wait_conditions: Vec<WaitCondition>) -> Self {
        Self {
            station: station.to_string(),
            wait_conditions,
            extra: Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    pub stops: Vec<Stop>,
    /// Locomotives running this schedule, as references into the entity list.
    pub locomotives: Vec<Association>,
    pub extra: Map<String, Value>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stop(&mut self, station: &str, wait_conditions: Vec<WaitCondition>) {
        self.stops.push(Stop::new(station, wait_conditions));
    }

    pub fn remove_stop(&mut self, station: &str) -> Option<Stop> {
        let index = self.stops.iter().position(|s| s.station == station)?;
        Some(self.stops.remove(index))
    }

    pub fn add_locomotive(&mut self, locomotive: Association) {
        if !self.locomotives.contains(&locomotive) {
            self.locomotives.push(locomotive);
        }
    }

    pub fn remove_locomotive(&mut self, locomotive: EntityId) {
        self.locomotives.retain(|l| !l.points_to(locomotive));
    }

    pub fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<(), BlueprintError> {
        if !ctx.wants_warnings() {
            return Ok(());
        }
        if !self.extra.is_empty() {
            ctx.warn(Warning::UnknownKeyword {
                object: "schedule".to_string(),
                keys: self.extra.keys().cloned().collect(),
            })?;
        }
        for stop in &self.stops {
            for wait in &stop.wait_conditions {
                if !WAIT_CONDITION_TYPES.contains(&wait.kind.as_str()) {
                    ctx.warn(Warning::Value(format!(
                        "unknown wait condition type '{}' at station '{}'",
                        wait.kind, stop.station
                    )))?;
                }
                if let Some(condition) = &wait.condition {
                    condition.check(ctx)?;
                }
            }
        }
        Ok(())
    }
}

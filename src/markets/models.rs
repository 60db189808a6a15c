use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A labelled outcome together with its quoted probability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub label: String,
    pub probability: Decimal,
}

impl Outcome {
    pub fn new(label: impl Into<String>, probability: Decimal) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Market entity - one betting proposition, resolved at most once
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: Uuid,
    pub name: String,
    pub event_id: Option<Uuid>,
    pub possible_outcomes: Vec<Outcome>,
    /// None while the market is open for betting
    pub resolved_outcome: Option<Outcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Market {
    pub fn new(name: String, event_id: Option<Uuid>, possible_outcomes: Vec<Outcome>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            event_id,
            possible_outcomes,
            resolved_outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_outcome.is_some()
    }

    /// Offered outcome with the given label, if any
    pub fn offered_outcome(&self, label: &str) -> Option<&Outcome> {
        self.possible_outcomes.iter().find(|o| o.label == label)
    }

    pub fn resolved_with(mut self, outcome: Outcome) -> Self {
        self.resolved_outcome = Some(outcome);
        self.updated_at = Utc::now();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketRequest {
    pub name: Option<String>,
    pub event_id: Option<Uuid>,
    #[serde(default)]
    pub possible_outcomes: Vec<Outcome>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMarketRequest {
    pub name: Option<String>,
    pub possible_outcomes: Option<Vec<Outcome>>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveMarketRequest {
    pub label: String,
}

//! Animal registry models.

use serde::{Deserialize, Serialize};

/// Livestock species tracked by the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Cow,
    Buffalo,
    Goat,
    Sheep,
    Poultry,
    Other,
}

/// Farm production type; dairy farms sell milk during an animal's life.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FarmType {
    Dairy,
    Mixed,
}

/// Unit an animal's age is recorded in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Months,
    Years,
}

/// A registered animal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    /// Unique animal ID
    pub animal_id: String,
    /// Owning farmer's user ID
    pub farmer_id: String,
    /// Display name, if the farmer gave one
    pub name: Option<String>,
    /// External tag identifier (unique, uppercase)
    pub tag_id: String,
    /// Species
    pub species: Species,
    /// Farm production type
    pub farm_type: Option<FarmType>,
    /// Age in `age_unit`s
    pub age: Option<f64>,
    /// Unit for `age`
    pub age_unit: AgeUnit,
    /// Registration timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Animal {
    /// Register a new animal with required fields.
    pub fn new(farmer_id: &str, tag_id: &str, species: Species) -> Self {
        Self {
            animal_id: uuid::Uuid::new_v4().to_string(),
            farmer_id: farmer_id.to_string(),
            name: None,
            tag_id: tag_id.to_uppercase(),
            species,
            farm_type: None,
            age: None,
            age_unit: AgeUnit::Years,
            created_at: chrono::Utc::now(),
        }
    }

    /// Whether milk withdrawal applies: cows, buffaloes, or animals on a
    /// dairy farm.
    pub fn is_dairy(&self) -> bool {
        matches!(self.species, Species::Cow | Species::Buffalo)
            || self.farm_type == Some(FarmType::Dairy)
    }

    /// Age converted to months, if recorded.
    pub fn age_in_months(&self) -> Option<f64> {
        let age = self.age?;
        Some(match self.age_unit {
            AgeUnit::Months => age,
            AgeUnit::Years => age * 12.0,
        })
    }
}

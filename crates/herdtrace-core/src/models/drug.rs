//! Drug reference models.

use serde::{Deserialize, Serialize};

/// Therapeutic category of a reference drug.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DrugCategory {
    Antibiotic,
    Antiparasitic,
    Vaccine,
    Vitamin,
    Hormone,
    Other,
}

impl DrugCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DrugCategory::Antibiotic => "antibiotic",
            DrugCategory::Antiparasitic => "antiparasitic",
            DrugCategory::Vaccine => "vaccine",
            DrugCategory::Vitamin => "vitamin",
            DrugCategory::Hormone => "hormone",
            DrugCategory::Other => "other",
        }
    }
}

/// Residue risk classification for a drug.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

/// Tolerance of an age group to a drug.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Toxicity {
    Safe,
    Caution,
    Unsafe,
}

/// Per-age-group toxicity ratings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToxicityByAge {
    /// Animals younger than six months
    pub calves: Toxicity,
    /// Fully grown animals
    pub adults: Toxicity,
    /// Pregnant animals
    pub pregnant: Toxicity,
}

impl Default for ToxicityByAge {
    fn default() -> Self {
        Self {
            calves: Toxicity::Safe,
            adults: Toxicity::Safe,
            pregnant: Toxicity::Safe,
        }
    }
}

/// Unit a reference dosage is expressed in (per kilogram bodyweight).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReferenceDoseUnit {
    #[serde(rename = "mg/kg")]
    MgPerKg,
    #[serde(rename = "ml/kg")]
    MlPerKg,
    #[serde(rename = "units/kg")]
    UnitsPerKg,
}

/// Unit a treatment dosage is recorded in, once the per-kg basis is dropped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoseUnit {
    Mg,
    Ml,
    Units,
}

impl ReferenceDoseUnit {
    /// Strip the `/kg` suffix to get the unit treatments record.
    pub fn base_unit(self) -> DoseUnit {
        match self {
            ReferenceDoseUnit::MgPerKg => DoseUnit::Mg,
            ReferenceDoseUnit::MlPerKg => DoseUnit::Ml,
            ReferenceDoseUnit::UnitsPerKg => DoseUnit::Units,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceDoseUnit::MgPerKg => "mg/kg",
            ReferenceDoseUnit::MlPerKg => "ml/kg",
            ReferenceDoseUnit::UnitsPerKg => "units/kg",
        }
    }
}

/// Unit for a Maximum Residue Limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MrlUnit {
    #[serde(rename = "mg/kg")]
    MgPerKg,
    #[serde(rename = "ug/kg")]
    UgPerKg,
    #[serde(rename = "ppb")]
    Ppb,
}

impl MrlUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            MrlUnit::MgPerKg => "mg/kg",
            MrlUnit::UgPerKg => "ug/kg",
            MrlUnit::Ppb => "ppb",
        }
    }
}

/// A reference drug with its safety attributes.
///
/// Rows are created by seeding and treated as read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    /// Canonical name (uppercase, unique)
    pub drug_name: String,
    /// Therapeutic category
    pub category: DrugCategory,
    /// Maximum Residue Limit for produce from treated animals
    pub mrl_limit: f64,
    /// Unit of the MRL limit
    pub mrl_limit_unit: MrlUnit,
    /// Days milk must be withheld after administration
    pub withdrawal_period_milk: i64,
    /// Days meat must be withheld after administration
    pub withdrawal_period_meat: i64,
    /// Residue risk classification
    pub risk_level: RiskLevel,
    /// Toxicity per age group
    pub toxicity_by_age: ToxicityByAge,
    /// Whether unrestricted use in livestock is permitted
    pub allowed: bool,
    /// Whether the drug is banned outright
    pub banned: bool,
    /// Canonical names of drugs this one interacts with
    pub interactions: Vec<String>,
    /// Canonical names of safer alternatives
    pub alternatives: Vec<String>,
    /// Safe dosage per kg bodyweight
    pub safe_dosage: f64,
    /// Unit of the safe dosage
    pub dosage_unit: ReferenceDoseUnit,
    /// Human-readable summary
    pub description: String,
    /// Whether the drug is visible to lookups
    pub is_active: bool,
}

impl Drug {
    /// Create a drug with required fields; safety attributes default to benign.
    pub fn new(drug_name: &str, category: DrugCategory, safe_dosage: f64) -> Self {
        Self {
            drug_name: drug_name.to_uppercase(),
            category,
            mrl_limit: 0.1,
            mrl_limit_unit: MrlUnit::MgPerKg,
            withdrawal_period_milk: 0,
            withdrawal_period_meat: 0,
            risk_level: RiskLevel::Medium,
            toxicity_by_age: ToxicityByAge::default(),
            allowed: true,
            banned: false,
            interactions: Vec::new(),
            alternatives: Vec::new(),
            safe_dosage,
            dosage_unit: ReferenceDoseUnit::MgPerKg,
            description: String::new(),
            is_active: true,
        }
    }

    /// Case-insensitive check whether `other` appears in this drug's
    /// interaction list.
    pub fn interacts_with(&self, other: &str) -> bool {
        let other_upper = other.to_uppercase();
        self.interactions.iter().any(|i| *i == other_upper)
    }

    /// Withdrawal days for the given produce basis.
    pub fn withdrawal_days(&self, dairy: bool) -> i64 {
        if dairy {
            self.withdrawal_period_milk
        } else {
            self.withdrawal_period_meat
        }
    }
}

//! Treatment record models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::drug::{DoseUnit, DrugCategory};

/// Dosing frequency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Once,
    Twice,
    Thrice,
    Daily,
    Weekly,
}

/// Unit a treatment course duration is expressed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Days,
    Weeks,
}

/// Lifecycle state of a treatment.
///
/// `pending` marks farmer-entered treatments awaiting vet review; the
/// withdrawal sweep flips `active` records to `completed` once the
/// withdrawal end date passes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentStatus {
    Active,
    Pending,
    Completed,
}

/// A recorded medicine administration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    /// Unique treatment ID
    pub treatment_id: String,
    /// Farmer who owns the animal
    pub farmer_id: String,
    /// Treated animal
    pub animal_id: String,
    /// Supervising vet, if any
    pub vet_id: Option<String>,
    /// Medicine name as submitted
    pub medicine: String,
    /// Category copied from the drug reference
    pub drug_type: DrugCategory,
    /// Administered dosage
    pub dosage: f64,
    /// Unit for `dosage`
    pub dosage_unit: DoseUnit,
    /// Dosing frequency
    pub frequency: Frequency,
    /// Course duration
    pub duration: i64,
    /// Unit for `duration`
    pub duration_unit: DurationUnit,
    /// When the medicine was administered
    pub date_given: DateTime<Utc>,
    /// Withdrawal period applied, in days
    pub withdrawal_period_days: i64,
    /// Date the withdrawal period ends
    pub withdrawal_end_date: DateTime<Utc>,
    /// Lifecycle status
    pub status: TreatmentStatus,
    /// Free-form notes
    pub notes: Option<String>,
    /// Composite risk score, 0-100
    pub risk_score: u8,
    /// SHA-256 audit hash, set once the audit record is written
    pub audit_hash: Option<String>,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Treatment {
    /// Days the animal's produce must still be withheld, measured on local
    /// date boundaries (negative once the period has ended).
    pub fn days_until_withdrawal_ends(&self, now: DateTime<Utc>) -> i64 {
        let end = self.withdrawal_end_date.date_naive();
        let today = now.date_naive();
        (end - today).num_days()
    }

    /// Whether the withdrawal period has fully elapsed.
    pub fn withdrawal_ended(&self, now: DateTime<Utc>) -> bool {
        self.withdrawal_end_date <= now
    }
}

/// Compute the withdrawal end date from the administration date.
pub fn withdrawal_end_date(date_given: DateTime<Utc>, withdrawal_days: i64) -> DateTime<Utc> {
    date_given + Duration::days(withdrawal_days)
}

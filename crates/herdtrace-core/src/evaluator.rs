//! Risk and withdrawal evaluation for a proposed treatment.
//!
//! Pure computation over a drug reference record, the requested dose, and
//! the animal's attributes. Persistence and alerting stay in
//! [`crate::treatment`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{withdrawal_end_date, Animal, Drug, Frequency, RiskLevel, Toxicity, Treatment};

#[derive(Debug, Error)]
pub enum EvalError {
    /// The drug is banned outright; the treatment must be rejected.
    #[error("the drug \"{0}\" is banned and cannot be used")]
    BannedDrug(String),
}

/// Outcome of evaluating a proposed treatment against the drug reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Withdrawal days applied (milk basis for dairy animals, meat otherwise)
    pub withdrawal_days: i64,
    /// Date the withdrawal period ends
    pub withdrawal_end_date: DateTime<Utc>,
    /// Composite risk score, 0-100
    pub risk_score: u8,
    /// Dosage exceeds the drug's safe dosage
    pub overdose: bool,
    /// Recently administered medicines that conflict with this drug
    pub interactions: Vec<String>,
    /// Drug's risk level is High or Critical
    pub mrl_risk: bool,
    /// Drug is not allowed for unrestricted use (but not banned)
    pub restricted: bool,
}

/// Evaluate a proposed treatment.
///
/// `recent` holds the animal's most recent active treatments (the caller
/// limits these to the interaction window) paired with their reference
/// records where the medicine resolves to one.
pub fn evaluate(
    drug: &Drug,
    dosage: f64,
    frequency: Frequency,
    animal: &Animal,
    date_given: DateTime<Utc>,
    recent: &[(Treatment, Option<Drug>)],
) -> Result<Evaluation, EvalError> {
    if drug.banned {
        return Err(EvalError::BannedDrug(drug.drug_name.clone()));
    }

    let withdrawal_days = drug.withdrawal_days(animal.is_dairy());

    Ok(Evaluation {
        withdrawal_days,
        withdrawal_end_date: withdrawal_end_date(date_given, withdrawal_days),
        risk_score: risk_score(drug, dosage, animal, frequency),
        overdose: dosage > drug.safe_dosage,
        interactions: interaction_conflicts(drug, recent),
        mrl_risk: drug.risk_level >= RiskLevel::High,
        restricted: !drug.allowed,
    })
}

/// Composite risk score: base level plus overdose, calf-toxicity and
/// frequency add-ons, saturating at 100.
pub fn risk_score(drug: &Drug, dosage: f64, animal: &Animal, frequency: Frequency) -> u8 {
    let total = u32::from(base_risk(drug.risk_level))
        + u32::from(overdose_addon(dosage, drug.safe_dosage))
        + u32::from(age_addon(drug, animal))
        + u32::from(frequency_addon(frequency));
    total.min(100) as u8
}

pub fn base_risk(level: RiskLevel) -> u8 {
    match level {
        RiskLevel::Low => 10,
        RiskLevel::Medium => 30,
        RiskLevel::High => 60,
        RiskLevel::Critical => 90,
    }
}

/// Add-on for dosages above the safe dosage, graded by how far over they go.
/// A non-positive safe dosage contributes nothing.
pub fn overdose_addon(dosage: f64, safe_dosage: f64) -> u8 {
    if safe_dosage <= 0.0 || dosage <= safe_dosage {
        return 0;
    }
    let ratio = dosage / safe_dosage;
    if ratio > 2.0 {
        30
    } else if ratio > 1.5 {
        20
    } else {
        10
    }
}

/// Add-on for calves (under six months) given a drug their age group does
/// not tolerate. Animals with no recorded age contribute nothing.
pub fn age_addon(drug: &Drug, animal: &Animal) -> u8 {
    match animal.age_in_months() {
        Some(months) if months < 6.0 => match drug.toxicity_by_age.calves {
            Toxicity::Unsafe => 20,
            Toxicity::Caution => 10,
            Toxicity::Safe => 0,
        },
        _ => 0,
    }
}

pub fn frequency_addon(frequency: Frequency) -> u8 {
    match frequency {
        Frequency::Once => 0,
        Frequency::Twice => 5,
        Frequency::Thrice => 10,
        Frequency::Daily => 15,
        Frequency::Weekly => 5,
    }
}

/// Medicines among the recent treatments that conflict with the new drug.
///
/// The check is skipped entirely when the new drug declares no
/// interactions, and a recent medicine with no reference record is skipped.
/// Within a pair the check is bidirectional: either drug naming the other
/// counts.
fn interaction_conflicts(drug: &Drug, recent: &[(Treatment, Option<Drug>)]) -> Vec<String> {
    if drug.interactions.is_empty() {
        return Vec::new();
    }

    let mut conflicts = Vec::new();
    for (treatment, recent_drug) in recent {
        if let Some(recent_drug) = recent_drug {
            if drug.interacts_with(&treatment.medicine)
                || recent_drug.interacts_with(&drug.drug_name)
            {
                conflicts.push(treatment.medicine.clone());
            }
        }
    }
    conflicts
}

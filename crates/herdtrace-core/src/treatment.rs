//! Treatment intake: ownership and reference checks, safety evaluation,
//! persistence, audit hashing, and alerting, in that order.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::audit;
use crate::db::{Database, DbError, DbResult, TreatmentFilter};
use crate::evaluator::{self, EvalError};
use crate::models::{
    Alert, AlertSeverity, AlertType, Drug, Frequency, Identity, Role, Treatment, TreatmentStatus,
};
use crate::notify::{AlertPing, Event, Notifier, TreatmentReview};

/// How far back the interaction check looks.
const INTERACTION_WINDOW_DAYS: i64 = 30;
/// How many recent treatments the interaction check inspects.
const INTERACTION_LOOKBACK: i64 = 2;

#[derive(Debug, Error)]
pub enum TreatmentError {
    #[error("Animal not found or access denied")]
    AccessDenied,
    #[error("Medicine \"{0}\" not found in database. Please use a valid medicine name.")]
    UnknownMedicine(String),
    #[error("The drug \"{0}\" is banned and cannot be used.")]
    BannedDrug(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Input for recording a treatment.
#[derive(Debug, Clone)]
pub struct NewTreatment {
    pub farmer_id: String,
    pub animal_id: String,
    pub vet_id: Option<String>,
    pub medicine: String,
    pub dosage: f64,
    pub frequency: Frequency,
    pub duration: Option<i64>,
    pub date_given: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Which safety checks fired during intake. `banned` is always false on a
/// successful intake; banned drugs reject the whole submission.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SafetyFlags {
    pub overdose: bool,
    pub interactions: bool,
    pub mrl_risk: bool,
    pub banned: bool,
}

/// A successfully recorded treatment with its derived artifacts.
#[derive(Debug, Clone)]
pub struct TreatmentOutcome {
    pub treatment: Treatment,
    pub withdrawal_end_date: DateTime<Utc>,
    pub audit_hash: String,
    pub risk_score: u8,
    pub alerts: SafetyFlags,
}

/// Record a treatment for an animal.
///
/// The animal must belong to the submitting farmer and the medicine must
/// resolve in the drug reference. Banned drugs reject the submission after
/// raising a violation alert. Everything else persists a treatment plus its
/// audit record, raises the applicable alerts, and pushes best-effort
/// notifications.
pub fn add_treatment(
    db: &Database,
    notifier: &dyn Notifier,
    input: NewTreatment,
) -> Result<TreatmentOutcome, TreatmentError> {
    let now = Utc::now();

    let animal = db
        .get_animal(&input.animal_id)?
        .filter(|animal| animal.farmer_id == input.farmer_id)
        .ok_or(TreatmentError::AccessDenied)?;

    let drug = db
        .get_drug(&input.medicine)?
        .ok_or_else(|| TreatmentError::UnknownMedicine(input.medicine.clone()))?;

    let date_given = input.date_given.unwrap_or(now);
    let recent = recent_with_drugs(db, &input.animal_id, now)?;

    let eval = match evaluator::evaluate(
        &drug,
        input.dosage,
        input.frequency,
        &animal,
        date_given,
        &recent,
    ) {
        Ok(eval) => eval,
        Err(EvalError::BannedDrug(_)) => {
            reject_banned(db, notifier, &input)?;
            return Err(TreatmentError::BannedDrug(input.medicine));
        }
    };

    if eval.restricted {
        let mut alert = Alert::new(
            &input.farmer_id,
            AlertType::Warning,
            "Restricted Drug Usage",
            &format!(
                "The drug \"{}\" is restricted. Please ensure proper authorization.",
                input.medicine
            ),
            AlertSeverity::High,
        );
        alert.animal_id = Some(input.animal_id.clone());
        alert.action_required = true;
        db.insert_alert(&alert)?;
    }

    if !eval.interactions.is_empty() {
        let mut alert = Alert::new(
            &input.farmer_id,
            AlertType::Warning,
            "Drug Interaction Warning",
            &format!(
                "Warning: {} may interact with recently administered drugs: {}. \
                 Please consult a veterinarian.",
                input.medicine,
                eval.interactions.join(", ")
            ),
            AlertSeverity::High,
        );
        alert.animal_id = Some(input.animal_id.clone());
        alert.action_required = true;
        alert.metadata = serde_json::json!({ "interactions": eval.interactions });
        db.insert_alert(&alert)?;
    }

    if eval.overdose {
        let unit = drug.dosage_unit.as_str();
        let mut alert = Alert::new(
            &input.farmer_id,
            AlertType::Violation,
            "Overdose Detected",
            &format!(
                "High dosage detected for {}. Dosage: {} {} exceeds safe limit of {} {}.",
                input.medicine, input.dosage, unit, drug.safe_dosage, unit
            ),
            AlertSeverity::Critical,
        );
        alert.animal_id = Some(input.animal_id.clone());
        alert.action_required = true;
        alert.metadata = serde_json::json!({
            "dosage": input.dosage,
            "safeLimit": drug.safe_dosage,
            "unit": unit,
        });
        db.insert_alert(&alert)?;
    }

    if eval.mrl_risk {
        let mut alert = Alert::new(
            &input.farmer_id,
            AlertType::Warning,
            "High MRL Risk",
            &format!(
                "The drug \"{}\" has a high MRL risk ({}). Ensure proper withdrawal period \
                 is followed. MRL Limit: {} {}.",
                input.medicine,
                drug.risk_level.as_str(),
                drug.mrl_limit,
                drug.mrl_limit_unit.as_str()
            ),
            if drug.risk_level == crate::models::RiskLevel::Critical {
                AlertSeverity::Critical
            } else {
                AlertSeverity::High
            },
        );
        alert.animal_id = Some(input.animal_id.clone());
        alert.action_required = true;
        alert.metadata = serde_json::json!({
            "mrlLimit": drug.mrl_limit,
            "mrlLimitUnit": drug.mrl_limit_unit.as_str(),
            "riskLevel": drug.risk_level,
        });
        db.insert_alert(&alert)?;
    }

    let mut treatment = Treatment {
        treatment_id: uuid::Uuid::new_v4().to_string(),
        farmer_id: input.farmer_id.clone(),
        animal_id: input.animal_id.clone(),
        vet_id: input.vet_id.clone(),
        medicine: input.medicine.clone(),
        drug_type: drug.category,
        dosage: input.dosage,
        dosage_unit: drug.dosage_unit.base_unit(),
        frequency: input.frequency,
        duration: input.duration.unwrap_or(1),
        duration_unit: crate::models::DurationUnit::Days,
        date_given,
        withdrawal_period_days: eval.withdrawal_days,
        withdrawal_end_date: eval.withdrawal_end_date,
        status: if input.vet_id.is_some() {
            TreatmentStatus::Active
        } else {
            TreatmentStatus::Pending
        },
        notes: input.notes.clone(),
        risk_score: eval.risk_score,
        audit_hash: None,
        created_at: now,
    };
    db.insert_treatment(&treatment)?;

    let audit_hash = audit::record_treatment_audit(db, &treatment, now)?;
    db.set_treatment_audit_hash(&treatment.treatment_id, &audit_hash)?;
    treatment.audit_hash = Some(audit_hash.clone());

    if treatment.vet_id.is_none() {
        let mut alert = Alert::new(
            &input.farmer_id,
            AlertType::Warning,
            "Treatment Added Without Vet Approval",
            &format!(
                "A treatment for {} has been added by farmer. Please review and verify.",
                input.medicine
            ),
            AlertSeverity::Medium,
        );
        alert.animal_id = Some(input.animal_id.clone());
        alert.treatment_id = Some(treatment.treatment_id.clone());
        alert.action_required = true;
        alert.metadata = serde_json::json!({
            "treatmentId": treatment.treatment_id,
            "medicine": input.medicine,
            "farmerId": input.farmer_id,
        });
        db.insert_alert(&alert)?;

        notifier.broadcast_vets(&Event::TreatmentReview(TreatmentReview {
            treatment_id: treatment.treatment_id.clone(),
            farmer_id: input.farmer_id.clone(),
            animal_id: input.animal_id.clone(),
            medicine: input.medicine.clone(),
            message: "New treatment requires vet verification".to_string(),
        }));
    }

    let end_date = eval.withdrawal_end_date.format("%Y-%m-%d");
    let mut withdrawal_alert = Alert::new(
        &input.farmer_id,
        AlertType::Warning,
        "Withdrawal Period Active",
        &format!(
            "Withdrawal period for {} ends on {}. Do not sell milk/meat until then.",
            input.medicine, end_date
        ),
        AlertSeverity::High,
    );
    withdrawal_alert.animal_id = Some(input.animal_id.clone());
    withdrawal_alert.treatment_id = Some(treatment.treatment_id.clone());
    withdrawal_alert.action_required = true;
    withdrawal_alert.metadata = serde_json::json!({
        "withdrawalEndDate": eval.withdrawal_end_date,
        "medicine": input.medicine,
    });
    db.insert_alert(&withdrawal_alert)?;

    let farmer_ping = if eval.overdose {
        AlertPing {
            alert_type: AlertType::Violation,
            title: "Overdose Detected".to_string(),
            message: format!("Overdose detected for {}", input.medicine),
            severity: AlertSeverity::Critical,
        }
    } else {
        AlertPing {
            alert_type: AlertType::Warning,
            title: "Treatment Added".to_string(),
            message: format!(
                "Treatment for {} added successfully. Withdrawal period ends on {}.",
                input.medicine, end_date
            ),
            severity: AlertSeverity::Medium,
        }
    };
    notifier.notify_user(&input.farmer_id, &Event::NewAlert(farmer_ping));

    if let Some(vet_id) = &treatment.vet_id {
        notifier.notify_user(
            vet_id,
            &Event::NewAlert(AlertPing {
                alert_type: AlertType::Safe,
                title: "Treatment Added".to_string(),
                message: format!("Treatment for {} has been added.", input.medicine),
                severity: AlertSeverity::Low,
            }),
        );
    }

    Ok(TreatmentOutcome {
        withdrawal_end_date: treatment.withdrawal_end_date,
        audit_hash,
        risk_score: treatment.risk_score,
        alerts: SafetyFlags {
            overdose: eval.overdose,
            interactions: !eval.interactions.is_empty(),
            mrl_risk: eval.mrl_risk,
            banned: false,
        },
        treatment,
    })
}

/// List treatments scoped by the caller's role: farmers see their own, vets
/// see those assigned to them, everyone else sees all.
pub fn treatments_for_identity(
    db: &Database,
    identity: &Identity,
    animal_id: Option<String>,
    status: Option<TreatmentStatus>,
) -> DbResult<Vec<Treatment>> {
    let mut filter = TreatmentFilter {
        animal_id,
        status,
        ..TreatmentFilter::default()
    };
    match identity.role {
        Role::Farmer => filter.farmer_id = Some(identity.user_id.clone()),
        Role::Vet => filter.vet_id = Some(identity.user_id.clone()),
        _ => {}
    }
    db.list_treatments(&filter)
}

/// The animal's most recent active treatments inside the interaction
/// window, paired with their reference records where the medicine resolves.
fn recent_with_drugs(
    db: &Database,
    animal_id: &str,
    now: DateTime<Utc>,
) -> DbResult<Vec<(Treatment, Option<Drug>)>> {
    let since = now - Duration::days(INTERACTION_WINDOW_DAYS);
    let recent = db.recent_active_treatments(animal_id, since, INTERACTION_LOOKBACK)?;

    recent
        .into_iter()
        .map(|treatment| {
            let drug = db.get_drug(&treatment.medicine)?;
            Ok((treatment, drug))
        })
        .collect()
}

/// Raise the violation alert and ping for a banned-drug submission.
fn reject_banned(
    db: &Database,
    notifier: &dyn Notifier,
    input: &NewTreatment,
) -> Result<(), TreatmentError> {
    let mut alert = Alert::new(
        &input.farmer_id,
        AlertType::Violation,
        "Banned Drug Detected",
        &format!(
            "The drug \"{}\" is banned and cannot be used. \
             Please contact a veterinarian immediately.",
            input.medicine
        ),
        AlertSeverity::Critical,
    );
    alert.animal_id = Some(input.animal_id.clone());
    alert.action_required = true;
    alert.metadata = serde_json::json!({
        "drug": input.medicine,
        "reason": "Banned drug",
    });
    db.insert_alert(&alert)?;

    notifier.notify_user(
        &input.farmer_id,
        &Event::NewAlert(AlertPing {
            alert_type: AlertType::Violation,
            title: "Banned Drug Detected".to_string(),
            message: format!("The drug \"{}\" is banned.", input.medicine),
            severity: AlertSeverity::Critical,
        }),
    );

    Ok(())
}

//! Periodic maintenance sweep over treatment records.
//!
//! Two passes, run together on a schedule: the withdrawal pass warns
//! farmers whose withdrawal periods are about to end and completes
//! treatments whose periods have passed; the overdose pass flags very high
//! dosages recorded in the last day. A failure on one record is logged and
//! never aborts the rest of the sweep.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::db::{Database, DbResult};
use crate::models::{Alert, AlertSeverity, AlertType, Treatment};
use crate::notify::{AlertPing, Event, Notifier};

/// Flat dosage ceiling for the overdose pass, independent of any per-drug
/// safe dosage.
const SWEEP_DOSAGE_LIMIT: f64 = 100.0;

/// How far back the overdose pass looks.
const OVERDOSE_WINDOW_HOURS: i64 = 24;

/// What one sweep did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Active treatments inspected by the withdrawal pass
    pub withdrawal_checked: usize,
    /// "ending soon" alerts created
    pub withdrawal_alerts: usize,
    /// Treatments flipped to completed
    pub completed: usize,
    /// Recent treatments inspected by the overdose pass
    pub overdose_checked: usize,
    /// Overdose alerts created
    pub overdose_alerts: usize,
}

/// Run both sweep passes once.
pub fn run_sweep(db: &Database, notifier: &dyn Notifier) -> DbResult<SweepStats> {
    let now = Utc::now();
    let mut stats = SweepStats::default();

    let active = db.active_treatments()?;
    stats.withdrawal_checked = active.len();
    for treatment in &active {
        match check_withdrawal(db, notifier, treatment, now) {
            Ok(outcome) => {
                if outcome.alerted {
                    stats.withdrawal_alerts += 1;
                }
                if outcome.completed {
                    stats.completed += 1;
                }
            }
            Err(err) => {
                warn!(
                    treatment_id = %treatment.treatment_id,
                    error = %err,
                    "withdrawal check failed, continuing sweep"
                );
            }
        }
    }

    let recent = db.active_treatments_given_since(now - Duration::hours(OVERDOSE_WINDOW_HOURS))?;
    stats.overdose_checked = recent.len();
    for treatment in &recent {
        match check_overdose(db, notifier, treatment) {
            Ok(alerted) => {
                if alerted {
                    stats.overdose_alerts += 1;
                }
            }
            Err(err) => {
                warn!(
                    treatment_id = %treatment.treatment_id,
                    error = %err,
                    "overdose check failed, continuing sweep"
                );
            }
        }
    }

    Ok(stats)
}

#[derive(Default)]
struct WithdrawalOutcome {
    alerted: bool,
    completed: bool,
}

fn check_withdrawal(
    db: &Database,
    notifier: &dyn Notifier,
    treatment: &Treatment,
    now: DateTime<Utc>,
) -> DbResult<WithdrawalOutcome> {
    let mut outcome = WithdrawalOutcome::default();
    let days_remaining = treatment.days_until_withdrawal_ends(now);

    if days_remaining <= 1
        && days_remaining > 0
        && !db.has_unread_alert_for_treatment(&treatment.treatment_id, AlertType::Warning)?
    {
        // Prefer the animal's tag in the message; fall back to its ID.
        let animal_ref = db
            .get_animal(&treatment.animal_id)?
            .map(|animal| animal.tag_id)
            .unwrap_or_else(|| treatment.animal_id.clone());

        let mut alert = Alert::new(
            &treatment.farmer_id,
            AlertType::Warning,
            "Withdrawal Period Ending Soon",
            &format!(
                "Withdrawal period ending for Animal {} on {}. \
                 Please do not sell milk/meat until then.",
                animal_ref,
                treatment.withdrawal_end_date.format("%Y-%m-%d")
            ),
            AlertSeverity::Medium,
        );
        alert.animal_id = Some(treatment.animal_id.clone());
        alert.treatment_id = Some(treatment.treatment_id.clone());
        alert.action_required = true;
        alert.metadata = serde_json::json!({
            "daysRemaining": days_remaining,
            "withdrawalEndDate": treatment.withdrawal_end_date,
        });
        db.insert_alert(&alert)?;
        notifier.notify_user(&treatment.farmer_id, &Event::NewAlert(AlertPing::from(&alert)));
        outcome.alerted = true;
    }

    if treatment.withdrawal_ended(now) {
        db.mark_treatment_completed(&treatment.treatment_id)?;
        outcome.completed = true;
    }

    Ok(outcome)
}

fn check_overdose(
    db: &Database,
    notifier: &dyn Notifier,
    treatment: &Treatment,
) -> DbResult<bool> {
    if treatment.dosage <= SWEEP_DOSAGE_LIMIT {
        return Ok(false);
    }
    if db.has_alert_titled(&treatment.treatment_id, AlertType::Violation, "Overdose Detected")? {
        return Ok(false);
    }

    let mut alert = Alert::new(
        &treatment.farmer_id,
        AlertType::Violation,
        "Overdose Detected",
        &format!(
            "High dosage detected for {}. Dosage: {} mg/kg exceeds safe limit of {} mg/kg.",
            treatment.medicine, treatment.dosage, SWEEP_DOSAGE_LIMIT
        ),
        AlertSeverity::Critical,
    );
    alert.animal_id = Some(treatment.animal_id.clone());
    alert.treatment_id = Some(treatment.treatment_id.clone());
    alert.action_required = true;
    alert.metadata = serde_json::json!({
        "dosage": treatment.dosage,
        "safeLimit": SWEEP_DOSAGE_LIMIT,
        "medicine": treatment.medicine,
    });
    db.insert_alert(&alert)?;
    notifier.notify_user(&treatment.farmer_id, &Event::NewAlert(AlertPing::from(&alert)));

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        withdrawal_end_date, Animal, DoseUnit, DrugCategory, DurationUnit, Frequency, Species,
        TreatmentStatus,
    };
    use crate::notify::NullNotifier;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_animal(db: &Database) -> Animal {
        let animal = Animal::new("farmer-1", "TAG001", Species::Cow);
        db.insert_animal(&animal).unwrap();
        animal
    }

    fn seed_treatment(
        db: &Database,
        animal: &Animal,
        dosage: f64,
        given_days_ago: i64,
        withdrawal_days: i64,
    ) -> Treatment {
        let date_given = Utc::now() - Duration::days(given_days_ago);
        let treatment = Treatment {
            treatment_id: uuid::Uuid::new_v4().to_string(),
            farmer_id: animal.farmer_id.clone(),
            animal_id: animal.animal_id.clone(),
            vet_id: Some("vet-1".into()),
            medicine: "Oxytetracycline".into(),
            drug_type: DrugCategory::Antibiotic,
            dosage,
            dosage_unit: DoseUnit::Mg,
            frequency: Frequency::Once,
            duration: 1,
            duration_unit: DurationUnit::Days,
            date_given,
            withdrawal_period_days: withdrawal_days,
            withdrawal_end_date: withdrawal_end_date(date_given, withdrawal_days),
            status: TreatmentStatus::Active,
            notes: None,
            risk_score: 30,
            audit_hash: None,
            created_at: date_given,
        };
        db.insert_treatment(&treatment).unwrap();
        treatment
    }

    #[test]
    fn test_withdrawal_ending_soon_alerts_once() {
        let db = setup_db();
        let animal = seed_animal(&db);
        // Given 6 days ago with a 7-day withdrawal: ends tomorrow.
        let treatment = seed_treatment(&db, &animal, 10.0, 6, 7);

        let stats = run_sweep(&db, &NullNotifier).unwrap();
        assert_eq!(stats.withdrawal_checked, 1);
        assert_eq!(stats.withdrawal_alerts, 1);
        assert_eq!(stats.completed, 0);

        let alerts = db.list_alerts("farmer-1", false).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Withdrawal Period Ending Soon");
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert!(alerts[0].message.contains("TAG001"));
        assert_eq!(alerts[0].treatment_id.as_deref(), Some(treatment.treatment_id.as_str()));

        // A second sweep dedups on the unread alert.
        let stats = run_sweep(&db, &NullNotifier).unwrap();
        assert_eq!(stats.withdrawal_alerts, 0);
        assert_eq!(db.list_alerts("farmer-1", false).unwrap().len(), 1);
    }

    #[test]
    fn test_expired_withdrawal_completes_treatment() {
        let db = setup_db();
        let animal = seed_animal(&db);
        // Given 10 days ago with a 7-day withdrawal: already over.
        let treatment = seed_treatment(&db, &animal, 10.0, 10, 7);

        let stats = run_sweep(&db, &NullNotifier).unwrap();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.withdrawal_alerts, 0);

        let stored = db.get_treatment(&treatment.treatment_id).unwrap().unwrap();
        assert_eq!(stored.status, TreatmentStatus::Completed);

        // Completed treatments drop out of the next sweep.
        let stats = run_sweep(&db, &NullNotifier).unwrap();
        assert_eq!(stats.withdrawal_checked, 0);
    }

    #[test]
    fn test_far_future_withdrawal_stays_quiet() {
        let db = setup_db();
        let animal = seed_animal(&db);
        seed_treatment(&db, &animal, 10.0, 0, 14);

        let stats = run_sweep(&db, &NullNotifier).unwrap();
        assert_eq!(stats.withdrawal_alerts, 0);
        assert_eq!(stats.completed, 0);
        assert!(db.list_alerts("farmer-1", false).unwrap().is_empty());
    }

    #[test]
    fn test_overdose_pass_flags_recent_high_dosage() {
        let db = setup_db();
        let animal = seed_animal(&db);
        let treatment = seed_treatment(&db, &animal, 150.0, 0, 14);

        let stats = run_sweep(&db, &NullNotifier).unwrap();
        assert_eq!(stats.overdose_checked, 1);
        assert_eq!(stats.overdose_alerts, 1);

        let alerts = db.list_alerts("farmer-1", false).unwrap();
        let overdose = alerts
            .iter()
            .find(|a| a.title == "Overdose Detected")
            .unwrap();
        assert_eq!(overdose.severity, AlertSeverity::Critical);
        assert!(overdose.message.contains("150"));
        assert_eq!(
            overdose.treatment_id.as_deref(),
            Some(treatment.treatment_id.as_str())
        );

        // Dedup holds even after the alert is read.
        db.mark_alert_read(&overdose.alert_id).unwrap();
        let stats = run_sweep(&db, &NullNotifier).unwrap();
        assert_eq!(stats.overdose_alerts, 0);
    }

    #[test]
    fn test_overdose_pass_ignores_old_and_low_dosages() {
        let db = setup_db();
        let animal = seed_animal(&db);
        // High dosage but given two days ago: outside the window.
        seed_treatment(&db, &animal, 150.0, 2, 14);
        // Recent but under the limit.
        seed_treatment(&db, &animal, 90.0, 0, 14);

        let stats = run_sweep(&db, &NullNotifier).unwrap();
        assert_eq!(stats.overdose_checked, 1);
        assert_eq!(stats.overdose_alerts, 0);
    }
}

//! Treatment database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::drugs::{category_to_string, string_to_category};
use super::{parse_ts, ts, Database, DbError, DbResult};
use crate::models::{DoseUnit, DurationUnit, Frequency, Treatment, TreatmentStatus};

const TREATMENT_COLUMNS: &str = "treatment_id, farmer_id, animal_id, vet_id, medicine, \
     drug_type, dosage, dosage_unit, frequency, duration, duration_unit, date_given, \
     withdrawal_period_days, withdrawal_end_date, status, notes, risk_score, \
     audit_hash, created_at";

/// Filter for treatment listings; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TreatmentFilter {
    pub farmer_id: Option<String>,
    pub vet_id: Option<String>,
    pub animal_id: Option<String>,
    pub status: Option<TreatmentStatus>,
}

impl Database {
    /// Insert a treatment record.
    pub fn insert_treatment(&self, treatment: &Treatment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO treatments (
                treatment_id, farmer_id, animal_id, vet_id, medicine, drug_type,
                dosage, dosage_unit, frequency, duration, duration_unit,
                date_given, withdrawal_period_days, withdrawal_end_date, status,
                notes, risk_score, audit_hash, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                treatment.treatment_id,
                treatment.farmer_id,
                treatment.animal_id,
                treatment.vet_id,
                treatment.medicine,
                category_to_string(treatment.drug_type),
                treatment.dosage,
                dose_unit_to_string(treatment.dosage_unit),
                frequency_to_string(treatment.frequency),
                treatment.duration,
                duration_unit_to_string(treatment.duration_unit),
                ts(&treatment.date_given),
                treatment.withdrawal_period_days,
                ts(&treatment.withdrawal_end_date),
                status_to_string(treatment.status),
                treatment.notes,
                treatment.risk_score,
                treatment.audit_hash,
                ts(&treatment.created_at),
            ],
        )?;
        Ok(())
    }

    /// Get a treatment by ID.
    pub fn get_treatment(&self, treatment_id: &str) -> DbResult<Option<Treatment>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {TREATMENT_COLUMNS} FROM treatments WHERE treatment_id = ?1"),
                [treatment_id],
                TreatmentRow::from_row,
            )
            .optional()?;
        row.map(Treatment::try_from).transpose()
    }

    /// Record the audit hash once the audit record is written.
    pub fn set_treatment_audit_hash(&self, treatment_id: &str, hash: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE treatments SET audit_hash = ?2 WHERE treatment_id = ?1",
            params![treatment_id, hash],
        )?;
        Ok(rows_affected > 0)
    }

    /// List treatments matching the filter, newest administration first.
    pub fn list_treatments(&self, filter: &TreatmentFilter) -> DbResult<Vec<Treatment>> {
        let mut sql = format!("SELECT {TREATMENT_COLUMNS} FROM treatments WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(farmer_id) = &filter.farmer_id {
            sql.push_str(" AND farmer_id = ?");
            args.push(farmer_id.clone());
        }
        if let Some(vet_id) = &filter.vet_id {
            sql.push_str(" AND vet_id = ?");
            args.push(vet_id.clone());
        }
        if let Some(animal_id) = &filter.animal_id {
            sql.push_str(" AND animal_id = ?");
            args.push(animal_id.clone());
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(status_to_string(status).to_string());
        }
        sql.push_str(" ORDER BY date_given DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), TreatmentRow::from_row)?;
        collect_treatments(rows)
    }

    /// The most recent active treatments for an animal administered since
    /// `since`, newest first. Drives the interaction check.
    pub fn recent_active_treatments(
        &self,
        animal_id: &str,
        since: DateTime<Utc>,
        limit: i64,
    ) -> DbResult<Vec<Treatment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {TREATMENT_COLUMNS} FROM treatments
            WHERE animal_id = ?1 AND status = 'active' AND date_given >= ?2
            ORDER BY date_given DESC
            LIMIT ?3
            "#
        ))?;
        let rows = stmt.query_map(
            params![animal_id, ts(&since), limit],
            TreatmentRow::from_row,
        )?;
        collect_treatments(rows)
    }

    /// All treatments currently in withdrawal (status active).
    pub fn active_treatments(&self) -> DbResult<Vec<Treatment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TREATMENT_COLUMNS} FROM treatments WHERE status = 'active'"
        ))?;
        let rows = stmt.query_map([], TreatmentRow::from_row)?;
        collect_treatments(rows)
    }

    /// Active treatments administered since `cutoff` (the daily overdose scan).
    pub fn active_treatments_given_since(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<Treatment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TREATMENT_COLUMNS} FROM treatments
             WHERE status = 'active' AND date_given >= ?1"
        ))?;
        let rows = stmt.query_map([ts(&cutoff)], TreatmentRow::from_row)?;
        collect_treatments(rows)
    }

    /// Flip a treatment to completed once its withdrawal period has elapsed.
    pub fn mark_treatment_completed(&self, treatment_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE treatments SET status = 'completed' WHERE treatment_id = ?1",
            [treatment_id],
        )?;
        Ok(rows_affected > 0)
    }
}

fn collect_treatments(
    rows: impl Iterator<Item = rusqlite::Result<TreatmentRow>>,
) -> DbResult<Vec<Treatment>> {
    let mut treatments = Vec::new();
    for row in rows {
        treatments.push(Treatment::try_from(row?)?);
    }
    Ok(treatments)
}

struct TreatmentRow {
    treatment_id: String,
    farmer_id: String,
    animal_id: String,
    vet_id: Option<String>,
    medicine: String,
    drug_type: String,
    dosage: f64,
    dosage_unit: String,
    frequency: String,
    duration: i64,
    duration_unit: String,
    date_given: String,
    withdrawal_period_days: i64,
    withdrawal_end_date: String,
    status: String,
    notes: Option<String>,
    risk_score: i64,
    audit_hash: Option<String>,
    created_at: String,
}

impl TreatmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            treatment_id: row.get(0)?,
            farmer_id: row.get(1)?,
            animal_id: row.get(2)?,
            vet_id: row.get(3)?,
            medicine: row.get(4)?,
            drug_type: row.get(5)?,
            dosage: row.get(6)?,
            dosage_unit: row.get(7)?,
            frequency: row.get(8)?,
            duration: row.get(9)?,
            duration_unit: row.get(10)?,
            date_given: row.get(11)?,
            withdrawal_period_days: row.get(12)?,
            withdrawal_end_date: row.get(13)?,
            status: row.get(14)?,
            notes: row.get(15)?,
            risk_score: row.get(16)?,
            audit_hash: row.get(17)?,
            created_at: row.get(18)?,
        })
    }
}

impl TryFrom<TreatmentRow> for Treatment {
    type Error = DbError;

    fn try_from(row: TreatmentRow) -> Result<Self, Self::Error> {
        let risk_score = u8::try_from(row.risk_score)
            .map_err(|_| DbError::Constraint(format!("risk score out of range: {}", row.risk_score)))?;

        Ok(Treatment {
            treatment_id: row.treatment_id,
            farmer_id: row.farmer_id,
            animal_id: row.animal_id,
            vet_id: row.vet_id,
            medicine: row.medicine,
            drug_type: string_to_category(&row.drug_type)?,
            dosage: row.dosage,
            dosage_unit: string_to_dose_unit(&row.dosage_unit)?,
            frequency: string_to_frequency(&row.frequency)?,
            duration: row.duration,
            duration_unit: string_to_duration_unit(&row.duration_unit)?,
            date_given: parse_ts(&row.date_given)?,
            withdrawal_period_days: row.withdrawal_period_days,
            withdrawal_end_date: parse_ts(&row.withdrawal_end_date)?,
            status: string_to_status(&row.status)?,
            notes: row.notes,
            risk_score,
            audit_hash: row.audit_hash,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

pub(super) fn status_to_string(status: TreatmentStatus) -> &'static str {
    match status {
        TreatmentStatus::Active => "active",
        TreatmentStatus::Pending => "pending",
        TreatmentStatus::Completed => "completed",
    }
}

fn string_to_status(s: &str) -> DbResult<TreatmentStatus> {
    match s {
        "active" => Ok(TreatmentStatus::Active),
        "pending" => Ok(TreatmentStatus::Pending),
        "completed" => Ok(TreatmentStatus::Completed),
        _ => Err(DbError::Constraint(format!("unknown treatment status: {s}"))),
    }
}

fn dose_unit_to_string(unit: DoseUnit) -> &'static str {
    match unit {
        DoseUnit::Mg => "mg",
        DoseUnit::Ml => "ml",
        DoseUnit::Units => "units",
    }
}

fn string_to_dose_unit(s: &str) -> DbResult<DoseUnit> {
    match s {
        "mg" => Ok(DoseUnit::Mg),
        "ml" => Ok(DoseUnit::Ml),
        "units" => Ok(DoseUnit::Units),
        _ => Err(DbError::Constraint(format!("unknown dose unit: {s}"))),
    }
}

fn frequency_to_string(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Once => "once",
        Frequency::Twice => "twice",
        Frequency::Thrice => "thrice",
        Frequency::Daily => "daily",
        Frequency::Weekly => "weekly",
    }
}

fn string_to_frequency(s: &str) -> DbResult<Frequency> {
    match s {
        "once" => Ok(Frequency::Once),
        "twice" => Ok(Frequency::Twice),
        "thrice" => Ok(Frequency::Thrice),
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        _ => Err(DbError::Constraint(format!("unknown frequency: {s}"))),
    }
}

fn duration_unit_to_string(unit: DurationUnit) -> &'static str {
    match unit {
        DurationUnit::Days => "days",
        DurationUnit::Weeks => "weeks",
    }
}

fn string_to_duration_unit(s: &str) -> DbResult<DurationUnit> {
    match s {
        "days" => Ok(DurationUnit::Days),
        "weeks" => Ok(DurationUnit::Weeks),
        _ => Err(DbError::Constraint(format!("unknown duration unit: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DrugCategory;
    use chrono::Duration;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_animal(db: &Database, animal_id: &str) {
        db.conn()
            .execute(
                "INSERT INTO animals (animal_id, farmer_id, tag_id, species, age_unit, created_at)
                 VALUES (?1, 'farmer-1', ?1, 'cow', 'years', ?2)",
                params![animal_id, ts(&Utc::now())],
            )
            .unwrap();
    }

    fn make_treatment(animal_id: &str, medicine: &str, date_given: DateTime<Utc>) -> Treatment {
        Treatment {
            treatment_id: uuid::Uuid::new_v4().to_string(),
            farmer_id: "farmer-1".into(),
            animal_id: animal_id.into(),
            vet_id: None,
            medicine: medicine.into(),
            drug_type: DrugCategory::Antibiotic,
            dosage: 10.0,
            dosage_unit: DoseUnit::Mg,
            frequency: Frequency::Daily,
            duration: 3,
            duration_unit: DurationUnit::Days,
            date_given,
            withdrawal_period_days: 7,
            withdrawal_end_date: date_given + Duration::days(7),
            status: TreatmentStatus::Active,
            notes: None,
            risk_score: 45,
            audit_hash: None,
            created_at: date_given,
        }
    }

    #[test]
    fn test_insert_and_get_treatment() {
        let db = setup_db();
        seed_animal(&db, "animal-1");
        let treatment = make_treatment("animal-1", "Oxytetracycline", Utc::now());
        db.insert_treatment(&treatment).unwrap();

        let found = db.get_treatment(&treatment.treatment_id).unwrap().unwrap();
        assert_eq!(found, treatment);
    }

    #[test]
    fn test_set_audit_hash() {
        let db = setup_db();
        seed_animal(&db, "animal-1");
        let treatment = make_treatment("animal-1", "Oxytetracycline", Utc::now());
        db.insert_treatment(&treatment).unwrap();

        assert!(db
            .set_treatment_audit_hash(&treatment.treatment_id, "abc123")
            .unwrap());
        let found = db.get_treatment(&treatment.treatment_id).unwrap().unwrap();
        assert_eq!(found.audit_hash.as_deref(), Some("abc123"));

        assert!(!db.set_treatment_audit_hash("no-such-id", "abc123").unwrap());
    }

    #[test]
    fn test_list_treatments_filters_and_orders() {
        let db = setup_db();
        seed_animal(&db, "animal-1");
        seed_animal(&db, "animal-2");
        let now = Utc::now();

        let older = make_treatment("animal-1", "Oxytetracycline", now - Duration::days(2));
        let newer = make_treatment("animal-1", "Amoxicillin", now);
        let other = make_treatment("animal-2", "Ivermectin", now - Duration::days(1));
        db.insert_treatment(&older).unwrap();
        db.insert_treatment(&newer).unwrap();
        db.insert_treatment(&other).unwrap();

        let filter = TreatmentFilter {
            animal_id: Some("animal-1".into()),
            ..Default::default()
        };
        let listed = db.list_treatments(&filter).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].medicine, "Amoxicillin");
        assert_eq!(listed[1].medicine, "Oxytetracycline");

        let all = db.list_treatments(&TreatmentFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_list_treatments_by_status() {
        let db = setup_db();
        seed_animal(&db, "animal-1");
        let mut pending = make_treatment("animal-1", "Oxytetracycline", Utc::now());
        pending.status = TreatmentStatus::Pending;
        db.insert_treatment(&pending).unwrap();
        db.insert_treatment(&make_treatment("animal-1", "Amoxicillin", Utc::now()))
            .unwrap();

        let filter = TreatmentFilter {
            status: Some(TreatmentStatus::Pending),
            ..Default::default()
        };
        let listed = db.list_treatments(&filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].medicine, "Oxytetracycline");
    }

    #[test]
    fn test_recent_active_treatments_window_and_limit() {
        let db = setup_db();
        seed_animal(&db, "animal-1");
        let now = Utc::now();

        db.insert_treatment(&make_treatment("animal-1", "Old", now - Duration::days(40)))
            .unwrap();
        db.insert_treatment(&make_treatment("animal-1", "Third", now - Duration::days(3)))
            .unwrap();
        db.insert_treatment(&make_treatment("animal-1", "Second", now - Duration::days(2)))
            .unwrap();
        db.insert_treatment(&make_treatment("animal-1", "First", now - Duration::days(1)))
            .unwrap();

        let since = now - Duration::days(30);
        let recent = db.recent_active_treatments("animal-1", since, 2).unwrap();
        let names: Vec<&str> = recent.iter().map(|t| t.medicine.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_mark_completed() {
        let db = setup_db();
        seed_animal(&db, "animal-1");
        let treatment = make_treatment("animal-1", "Oxytetracycline", Utc::now());
        db.insert_treatment(&treatment).unwrap();

        assert!(db.mark_treatment_completed(&treatment.treatment_id).unwrap());
        let found = db.get_treatment(&treatment.treatment_id).unwrap().unwrap();
        assert_eq!(found.status, TreatmentStatus::Completed);

        assert!(db.active_treatments().unwrap().is_empty());
    }

    #[test]
    fn test_active_treatments_given_since() {
        let db = setup_db();
        seed_animal(&db, "animal-1");
        let now = Utc::now();
        db.insert_treatment(&make_treatment("animal-1", "Recent", now - Duration::hours(2)))
            .unwrap();
        db.insert_treatment(&make_treatment("animal-1", "Stale", now - Duration::days(3)))
            .unwrap();

        let recent = db
            .active_treatments_given_since(now - Duration::hours(24))
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].medicine, "Recent");
    }
}

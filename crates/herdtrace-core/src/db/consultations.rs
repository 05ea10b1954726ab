//! Consultation database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_opt_ts, parse_ts, ts, Database, DbError, DbResult};
use crate::models::{Consultation, ConsultationStatus, GeoPoint};

const CONSULTATION_COLUMNS: &str = "consultation_id, farmer_id, vet_id, animal_id, symptom, \
     mobile_number, lat, lng, status, radius_meters, notified_vet_ids, accepted_at, \
     closed_at, created_at";

impl Database {
    /// Insert a consultation request.
    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO consultations (
                consultation_id, farmer_id, vet_id, animal_id, symptom,
                mobile_number, lat, lng, status, radius_meters,
                notified_vet_ids, accepted_at, closed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                consultation.consultation_id,
                consultation.farmer_id,
                consultation.vet_id,
                consultation.animal_id,
                consultation.symptom,
                consultation.mobile_number,
                consultation.location.lat,
                consultation.location.lng,
                status_to_string(consultation.status),
                consultation.radius_meters,
                serde_json::to_string(&consultation.notified_vet_ids)?,
                consultation.accepted_at.map(|t| ts(&t)),
                consultation.closed_at.map(|t| ts(&t)),
                ts(&consultation.created_at),
            ],
        )?;
        Ok(())
    }

    /// Get a consultation by ID.
    pub fn get_consultation(&self, consultation_id: &str) -> DbResult<Option<Consultation>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE consultation_id = ?1"
                ),
                [consultation_id],
                ConsultationRow::from_row,
            )
            .optional()?;
        row.map(Consultation::try_from).transpose()
    }

    /// Claim a pending consultation for a vet. The update only applies while
    /// the status is still `pending`, so exactly one caller can win; losers
    /// see `false` and must re-read for the current status.
    pub fn try_accept_consultation(
        &self,
        consultation_id: &str,
        vet_id: &str,
        accepted_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE consultations
            SET vet_id = ?2, status = 'active', accepted_at = ?3
            WHERE consultation_id = ?1 AND status = 'pending'
            "#,
            params![consultation_id, vet_id, ts(&accepted_at)],
        )?;
        Ok(rows_affected > 0)
    }

    /// Set a consultation's status directly, stamping `closed_at` when it
    /// transitions to closed.
    pub fn set_consultation_status(
        &self,
        consultation_id: &str,
        status: ConsultationStatus,
    ) -> DbResult<bool> {
        let closed_at = match status {
            ConsultationStatus::Closed => Some(ts(&Utc::now())),
            _ => None,
        };
        let rows_affected = self.conn.execute(
            r#"
            UPDATE consultations
            SET status = ?2, closed_at = COALESCE(?3, closed_at)
            WHERE consultation_id = ?1
            "#,
            params![consultation_id, status_to_string(status), closed_at],
        )?;
        Ok(rows_affected > 0)
    }

    /// A farmer's consultations, newest first.
    pub fn list_consultations_for_farmer(&self, farmer_id: &str) -> DbResult<Vec<Consultation>> {
        self.list_consultations_by("farmer_id", farmer_id)
    }

    /// Consultations assigned to a vet, newest first.
    pub fn list_consultations_for_vet(&self, vet_id: &str) -> DbResult<Vec<Consultation>> {
        self.list_consultations_by("vet_id", vet_id)
    }

    fn list_consultations_by(&self, column: &str, value: &str) -> DbResult<Vec<Consultation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONSULTATION_COLUMNS} FROM consultations
             WHERE {column} = ?1
             ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([value], ConsultationRow::from_row)?;

        let mut consultations = Vec::new();
        for row in rows {
            consultations.push(Consultation::try_from(row?)?);
        }
        Ok(consultations)
    }
}

struct ConsultationRow {
    consultation_id: String,
    farmer_id: String,
    vet_id: Option<String>,
    animal_id: Option<String>,
    symptom: String,
    mobile_number: String,
    lat: f64,
    lng: f64,
    status: String,
    radius_meters: f64,
    notified_vet_ids: String,
    accepted_at: Option<String>,
    closed_at: Option<String>,
    created_at: String,
}

impl ConsultationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            consultation_id: row.get(0)?,
            farmer_id: row.get(1)?,
            vet_id: row.get(2)?,
            animal_id: row.get(3)?,
            symptom: row.get(4)?,
            mobile_number: row.get(5)?,
            lat: row.get(6)?,
            lng: row.get(7)?,
            status: row.get(8)?,
            radius_meters: row.get(9)?,
            notified_vet_ids: row.get(10)?,
            accepted_at: row.get(11)?,
            closed_at: row.get(12)?,
            created_at: row.get(13)?,
        })
    }
}

impl TryFrom<ConsultationRow> for Consultation {
    type Error = DbError;

    fn try_from(row: ConsultationRow) -> Result<Self, Self::Error> {
        Ok(Consultation {
            consultation_id: row.consultation_id,
            farmer_id: row.farmer_id,
            vet_id: row.vet_id,
            animal_id: row.animal_id,
            symptom: row.symptom,
            mobile_number: row.mobile_number,
            location: GeoPoint {
                lat: row.lat,
                lng: row.lng,
            },
            status: string_to_status(&row.status)?,
            radius_meters: row.radius_meters,
            notified_vet_ids: serde_json::from_str(&row.notified_vet_ids)?,
            accepted_at: parse_opt_ts(row.accepted_at)?,
            closed_at: parse_opt_ts(row.closed_at)?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

pub(super) fn status_to_string(status: ConsultationStatus) -> &'static str {
    match status {
        ConsultationStatus::Pending => "pending",
        ConsultationStatus::Active => "active",
        ConsultationStatus::Closed => "closed",
        ConsultationStatus::Rejected => "rejected",
    }
}

fn string_to_status(s: &str) -> DbResult<ConsultationStatus> {
    match s {
        "pending" => Ok(ConsultationStatus::Pending),
        "active" => Ok(ConsultationStatus::Active),
        "closed" => Ok(ConsultationStatus::Closed),
        "rejected" => Ok(ConsultationStatus::Rejected),
        _ => Err(DbError::Constraint(format!(
            "unknown consultation status: {s}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_consultation(farmer_id: &str) -> Consultation {
        let mut c = Consultation::new(
            farmer_id,
            "not eating since yesterday",
            "9876543210",
            GeoPoint { lat: 28.61, lng: 77.2 },
        );
        c.notified_vet_ids = vec!["vet-1".into(), "vet-2".into()];
        c
    }

    #[test]
    fn test_insert_and_get_consultation() {
        let db = setup_db();
        let consultation = make_consultation("farmer-1");
        db.insert_consultation(&consultation).unwrap();

        let found = db
            .get_consultation(&consultation.consultation_id)
            .unwrap()
            .unwrap();
        assert_eq!(found, consultation);
    }

    #[test]
    fn test_accept_wins_exactly_once() {
        let db = setup_db();
        let consultation = make_consultation("farmer-1");
        db.insert_consultation(&consultation).unwrap();

        let now = Utc::now();
        assert!(db
            .try_accept_consultation(&consultation.consultation_id, "vet-1", now)
            .unwrap());
        // Second accept loses, and the winner keeps the assignment.
        assert!(!db
            .try_accept_consultation(&consultation.consultation_id, "vet-2", now)
            .unwrap());

        let found = db
            .get_consultation(&consultation.consultation_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.status, ConsultationStatus::Active);
        assert_eq!(found.vet_id.as_deref(), Some("vet-1"));
        assert_eq!(found.accepted_at, Some(now));
    }

    #[test]
    fn test_set_status_stamps_closed_at() {
        let db = setup_db();
        let consultation = make_consultation("farmer-1");
        db.insert_consultation(&consultation).unwrap();

        assert!(db
            .set_consultation_status(&consultation.consultation_id, ConsultationStatus::Closed)
            .unwrap());
        let found = db
            .get_consultation(&consultation.consultation_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.status, ConsultationStatus::Closed);
        assert!(found.closed_at.is_some());

        assert!(!db
            .set_consultation_status("no-such-id", ConsultationStatus::Closed)
            .unwrap());
    }

    #[test]
    fn test_lists_are_scoped_and_ordered() {
        let db = setup_db();
        let mut older = make_consultation("farmer-1");
        older.created_at = Utc::now() - chrono::Duration::minutes(10);
        let newer = make_consultation("farmer-1");
        let foreign = make_consultation("farmer-2");
        db.insert_consultation(&older).unwrap();
        db.insert_consultation(&newer).unwrap();
        db.insert_consultation(&foreign).unwrap();

        let listed = db.list_consultations_for_farmer("farmer-1").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].consultation_id, newer.consultation_id);

        db.try_accept_consultation(&foreign.consultation_id, "vet-9", Utc::now())
            .unwrap();
        let vet_list = db.list_consultations_for_vet("vet-9").unwrap();
        assert_eq!(vet_list.len(), 1);
        assert_eq!(vet_list[0].consultation_id, foreign.consultation_id);
    }
}

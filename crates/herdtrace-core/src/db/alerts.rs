//! Alert database operations.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_opt_ts, parse_ts, ts, Database, DbError, DbResult};
use crate::models::{Alert, AlertSeverity, AlertType};

const ALERT_COLUMNS: &str = "alert_id, farmer_id, animal_id, treatment_id, alert_type, \
     title, message, severity, read_status, read_at, action_required, metadata, created_at";

impl Database {
    /// Insert an alert.
    pub fn insert_alert(&self, alert: &Alert) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO alerts (
                alert_id, farmer_id, animal_id, treatment_id, alert_type,
                title, message, severity, read_status, read_at,
                action_required, metadata, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                alert.alert_id,
                alert.farmer_id,
                alert.animal_id,
                alert.treatment_id,
                type_to_string(alert.alert_type),
                alert.title,
                alert.message,
                severity_to_string(alert.severity),
                alert.read_status,
                alert.read_at.map(|t| ts(&t)),
                alert.action_required,
                serde_json::to_string(&alert.metadata)?,
                ts(&alert.created_at),
            ],
        )?;
        Ok(())
    }

    /// Get an alert by ID.
    pub fn get_alert(&self, alert_id: &str) -> DbResult<Option<Alert>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE alert_id = ?1"),
                [alert_id],
                AlertRow::from_row,
            )
            .optional()?;
        row.map(Alert::try_from).transpose()
    }

    /// List a farmer's alerts, newest first; optionally only unread ones.
    pub fn list_alerts(&self, farmer_id: &str, unread_only: bool) -> DbResult<Vec<Alert>> {
        let sql = if unread_only {
            format!(
                "SELECT {ALERT_COLUMNS} FROM alerts
                 WHERE farmer_id = ?1 AND read_status = 0
                 ORDER BY created_at DESC"
            )
        } else {
            format!(
                "SELECT {ALERT_COLUMNS} FROM alerts
                 WHERE farmer_id = ?1
                 ORDER BY created_at DESC"
            )
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([farmer_id], AlertRow::from_row)?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(Alert::try_from(row?)?);
        }
        Ok(alerts)
    }

    /// Mark an alert read, stamping the read time.
    pub fn mark_alert_read(&self, alert_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE alerts SET read_status = 1, read_at = ?2 WHERE alert_id = ?1",
            params![alert_id, ts(&Utc::now())],
        )?;
        Ok(rows_affected > 0)
    }

    /// Whether an unread alert of the given type already exists for a
    /// treatment. The withdrawal sweep dedups on this.
    pub fn has_unread_alert_for_treatment(
        &self,
        treatment_id: &str,
        alert_type: AlertType,
    ) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM alerts
             WHERE treatment_id = ?1 AND alert_type = ?2 AND read_status = 0",
            params![treatment_id, type_to_string(alert_type)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether an alert with the given type and title exists for a
    /// treatment, read or not. The overdose sweep dedups on this.
    pub fn has_alert_titled(
        &self,
        treatment_id: &str,
        alert_type: AlertType,
        title: &str,
    ) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM alerts
             WHERE treatment_id = ?1 AND alert_type = ?2 AND title = ?3",
            params![treatment_id, type_to_string(alert_type), title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

struct AlertRow {
    alert_id: String,
    farmer_id: String,
    animal_id: Option<String>,
    treatment_id: Option<String>,
    alert_type: String,
    title: String,
    message: String,
    severity: String,
    read_status: bool,
    read_at: Option<String>,
    action_required: bool,
    metadata: String,
    created_at: String,
}

impl AlertRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            alert_id: row.get(0)?,
            farmer_id: row.get(1)?,
            animal_id: row.get(2)?,
            treatment_id: row.get(3)?,
            alert_type: row.get(4)?,
            title: row.get(5)?,
            message: row.get(6)?,
            severity: row.get(7)?,
            read_status: row.get(8)?,
            read_at: row.get(9)?,
            action_required: row.get(10)?,
            metadata: row.get(11)?,
            created_at: row.get(12)?,
        })
    }
}

impl TryFrom<AlertRow> for Alert {
    type Error = DbError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            alert_id: row.alert_id,
            farmer_id: row.farmer_id,
            animal_id: row.animal_id,
            treatment_id: row.treatment_id,
            alert_type: string_to_type(&row.alert_type)?,
            title: row.title,
            message: row.message,
            severity: string_to_severity(&row.severity)?,
            read_status: row.read_status,
            read_at: parse_opt_ts(row.read_at)?,
            action_required: row.action_required,
            metadata: serde_json::from_str(&row.metadata)?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

fn type_to_string(alert_type: AlertType) -> &'static str {
    match alert_type {
        AlertType::Safe => "safe",
        AlertType::Warning => "warning",
        AlertType::Violation => "violation",
    }
}

fn string_to_type(s: &str) -> DbResult<AlertType> {
    match s {
        "safe" => Ok(AlertType::Safe),
        "warning" => Ok(AlertType::Warning),
        "violation" => Ok(AlertType::Violation),
        _ => Err(DbError::Constraint(format!("unknown alert type: {s}"))),
    }
}

fn severity_to_string(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Low => "low",
        AlertSeverity::Medium => "medium",
        AlertSeverity::High => "high",
        AlertSeverity::Critical => "critical",
    }
}

fn string_to_severity(s: &str) -> DbResult<AlertSeverity> {
    match s {
        "low" => Ok(AlertSeverity::Low),
        "medium" => Ok(AlertSeverity::Medium),
        "high" => Ok(AlertSeverity::High),
        "critical" => Ok(AlertSeverity::Critical),
        _ => Err(DbError::Constraint(format!("unknown severity: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_alert(farmer_id: &str, title: &str) -> Alert {
        Alert::new(
            farmer_id,
            AlertType::Warning,
            title,
            "message",
            AlertSeverity::High,
        )
    }

    #[test]
    fn test_insert_and_get_alert() {
        let db = setup_db();
        let mut alert = make_alert("farmer-1", "Withdrawal Period Active");
        alert.treatment_id = Some("t-1".into());
        alert.metadata = serde_json::json!({"medicine": "Oxytetracycline"});
        db.insert_alert(&alert).unwrap();

        let found = db.get_alert(&alert.alert_id).unwrap().unwrap();
        assert_eq!(found, alert);
    }

    #[test]
    fn test_list_alerts_newest_first() {
        let db = setup_db();
        let mut first = make_alert("farmer-1", "First");
        first.created_at = Utc::now() - chrono::Duration::minutes(5);
        let second = make_alert("farmer-1", "Second");
        let foreign = make_alert("farmer-2", "Other");
        db.insert_alert(&first).unwrap();
        db.insert_alert(&second).unwrap();
        db.insert_alert(&foreign).unwrap();

        let alerts = db.list_alerts("farmer-1", false).unwrap();
        let titles: Vec<&str> = alerts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[test]
    fn test_list_alerts_unread_only() {
        let db = setup_db();
        let read_alert = make_alert("farmer-1", "Seen");
        let unread_alert = make_alert("farmer-1", "Unseen");
        db.insert_alert(&read_alert).unwrap();
        db.insert_alert(&unread_alert).unwrap();
        db.mark_alert_read(&read_alert.alert_id).unwrap();

        let alerts = db.list_alerts("farmer-1", true).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Unseen");
    }

    #[test]
    fn test_mark_alert_read_stamps_time() {
        let db = setup_db();
        let alert = make_alert("farmer-1", "Withdrawal Period Active");
        db.insert_alert(&alert).unwrap();

        assert!(db.mark_alert_read(&alert.alert_id).unwrap());
        let found = db.get_alert(&alert.alert_id).unwrap().unwrap();
        assert!(found.read_status);
        assert!(found.read_at.is_some());

        assert!(!db.mark_alert_read("no-such-id").unwrap());
    }

    #[test]
    fn test_unread_dedup_check() {
        let db = setup_db();
        let mut alert = make_alert("farmer-1", "Withdrawal Period Ending Soon");
        alert.treatment_id = Some("t-1".into());
        db.insert_alert(&alert).unwrap();

        assert!(db
            .has_unread_alert_for_treatment("t-1", AlertType::Warning)
            .unwrap());
        assert!(!db
            .has_unread_alert_for_treatment("t-1", AlertType::Violation)
            .unwrap());

        db.mark_alert_read(&alert.alert_id).unwrap();
        assert!(!db
            .has_unread_alert_for_treatment("t-1", AlertType::Warning)
            .unwrap());
    }

    #[test]
    fn test_titled_dedup_check_ignores_read_status() {
        let db = setup_db();
        let mut alert = make_alert("farmer-1", "Overdose Detected");
        alert.alert_type = AlertType::Violation;
        alert.treatment_id = Some("t-1".into());
        db.insert_alert(&alert).unwrap();
        db.mark_alert_read(&alert.alert_id).unwrap();

        assert!(db
            .has_alert_titled("t-1", AlertType::Violation, "Overdose Detected")
            .unwrap());
        assert!(!db
            .has_alert_titled("t-1", AlertType::Violation, "Banned Drug Detected")
            .unwrap());
    }
}

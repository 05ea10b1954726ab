//! Tamper-evidence hashing for treatment records.
//!
//! Each persisted treatment gets a SHA-256 hash over a canonical JSON
//! payload, stored in the append-only audit log. This is a flat
//! tamper-evidence log: records carry no previous-hash linkage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::{Database, DbResult};
use crate::models::{AuditRecord, Treatment};

/// Hashed payload for a treatment audit record.
///
/// Field order here IS the canonical order: the hash covers
/// `serde_json::to_string` of this struct, which serializes fields in
/// declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditPayload {
    #[serde(rename = "type")]
    pub record_type: String,
    pub treatment_id: String,
    pub animal_id: String,
    pub farmer_id: String,
    pub medicine: String,
    pub dosage: f64,
    pub date_given: DateTime<Utc>,
    pub withdrawal_end_date: DateTime<Utc>,
    pub risk_score: u8,
    pub timestamp: DateTime<Utc>,
}

impl AuditPayload {
    pub fn for_treatment(treatment: &Treatment, timestamp: DateTime<Utc>) -> Self {
        Self {
            record_type: "treatment".to_string(),
            treatment_id: treatment.treatment_id.clone(),
            animal_id: treatment.animal_id.clone(),
            farmer_id: treatment.farmer_id.clone(),
            medicine: treatment.medicine.clone(),
            dosage: treatment.dosage,
            date_given: treatment.date_given,
            withdrawal_end_date: treatment.withdrawal_end_date,
            risk_score: treatment.risk_score,
            timestamp,
        }
    }
}

/// Hex-encoded SHA-256 of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a treatment's audit payload and append it to the audit log.
/// Returns the hash.
pub fn record_treatment_audit(
    db: &Database,
    treatment: &Treatment,
    timestamp: DateTime<Utc>,
) -> DbResult<String> {
    let payload = AuditPayload::for_treatment(treatment, timestamp);
    let json = serde_json::to_string(&payload)?;
    let hash = sha256_hex(json.as_bytes());

    db.insert_audit_record(&AuditRecord {
        hash: hash.clone(),
        record_type: payload.record_type,
        reference_id: treatment.treatment_id.clone(),
        payload: json,
        previous_hash: None,
        created_at: timestamp,
    })?;

    Ok(hash)
}

/// Result of checking a stored audit record against its hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditVerification {
    /// The stored record under inspection
    pub record: AuditRecord,
    /// Whether the stored payload still hashes to the stored hash
    pub valid: bool,
}

/// Look up an audit record and recompute its hash over the stored payload.
/// `None` means no record exists for the hash.
pub fn verify_audit_record(db: &Database, hash: &str) -> DbResult<Option<AuditVerification>> {
    let record = match db.get_audit_record(hash)? {
        Some(record) => record,
        None => return Ok(None),
    };

    let valid = sha256_hex(record.payload.as_bytes()) == record.hash;
    Ok(Some(AuditVerification { record, valid }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoseUnit, DrugCategory, DurationUnit, Frequency, TreatmentStatus};
    use chrono::TimeZone;

    fn make_treatment() -> Treatment {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        Treatment {
            treatment_id: "t-1".into(),
            farmer_id: "farmer-1".into(),
            animal_id: "animal-1".into(),
            vet_id: None,
            medicine: "Oxytetracycline".into(),
            drug_type: DrugCategory::Antibiotic,
            dosage: 10.0,
            dosage_unit: DoseUnit::Mg,
            frequency: Frequency::Once,
            duration: 1,
            duration_unit: DurationUnit::Days,
            date_given: date,
            withdrawal_period_days: 7,
            withdrawal_end_date: crate::models::withdrawal_end_date(date, 7),
            status: TreatmentStatus::Active,
            notes: None,
            risk_score: 30,
            audit_hash: None,
            created_at: date,
        }
    }

    #[test]
    fn test_payload_field_order_is_stable() {
        let treatment = make_treatment();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).unwrap();
        let json = serde_json::to_string(&AuditPayload::for_treatment(&treatment, ts)).unwrap();

        let type_pos = json.find("\"type\"").unwrap();
        let treatment_pos = json.find("\"treatmentId\"").unwrap();
        let medicine_pos = json.find("\"medicine\"").unwrap();
        let timestamp_pos = json.find("\"timestamp\"").unwrap();
        assert!(type_pos < treatment_pos);
        assert!(treatment_pos < medicine_pos);
        assert!(medicine_pos < timestamp_pos);
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_record_and_verify_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let treatment = make_treatment();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).unwrap();

        let hash = record_treatment_audit(&db, &treatment, ts).unwrap();
        assert_eq!(hash.len(), 64);

        let verification = verify_audit_record(&db, &hash).unwrap().unwrap();
        assert!(verification.valid);
        assert_eq!(verification.record.reference_id, "t-1");
        assert_eq!(verification.record.record_type, "treatment");
        assert!(verification.record.previous_hash.is_none());
    }

    #[test]
    fn test_verify_unknown_hash_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(verify_audit_record(&db, "deadbeef").unwrap().is_none());
    }

    #[test]
    fn test_verify_detects_tampered_payload() {
        let db = Database::open_in_memory().unwrap();
        let treatment = make_treatment();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).unwrap();
        let hash = record_treatment_audit(&db, &treatment, ts).unwrap();

        db.conn()
            .execute(
                "UPDATE audit_log SET payload = ?1 WHERE hash = ?2",
                rusqlite::params!["{\"type\":\"treatment\",\"dosage\":999}", hash],
            )
            .unwrap();

        let verification = verify_audit_record(&db, &hash).unwrap().unwrap();
        assert!(!verification.valid);
    }

    #[test]
    fn test_same_payload_same_hash() {
        let treatment = make_treatment();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).unwrap();

        let a = serde_json::to_string(&AuditPayload::for_treatment(&treatment, ts)).unwrap();
        let b = serde_json::to_string(&AuditPayload::for_treatment(&treatment, ts)).unwrap();
        assert_eq!(sha256_hex(a.as_bytes()), sha256_hex(b.as_bytes()));
    }
}

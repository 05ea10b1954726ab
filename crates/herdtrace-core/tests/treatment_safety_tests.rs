//! Treatment safety integration tests over the built-in drug catalog.

use herdtrace_core::audit::verify_audit_record;
use herdtrace_core::db::Database;
use herdtrace_core::models::{Animal, Frequency, Identity, Role, Species};
use herdtrace_core::notify::NullNotifier;
use herdtrace_core::seed::seed_drugs;
use herdtrace_core::treatment::{add_treatment, treatments_for_identity, NewTreatment, TreatmentError};

fn setup() -> Database {
    let db = Database::open_in_memory().unwrap();
    seed_drugs(&db).unwrap();
    db
}

fn register_cow(db: &Database, farmer_id: &str) -> Animal {
    let animal = Animal::new(farmer_id, "COW001", Species::Cow);
    db.insert_animal(&animal).unwrap();
    animal
}

fn make_request(farmer_id: &str, animal_id: &str, medicine: &str, dosage: f64) -> NewTreatment {
    NewTreatment {
        farmer_id: farmer_id.to_string(),
        animal_id: animal_id.to_string(),
        vet_id: None,
        medicine: medicine.to_string(),
        dosage,
        frequency: Frequency::Once,
        duration: None,
        date_given: None,
        notes: None,
    }
}

#[test]
fn test_safe_treatment_on_seeded_catalog() {
    let db = setup();
    let animal = register_cow(&db, "farmer-1");

    let outcome = add_treatment(
        &db,
        &NullNotifier,
        make_request("farmer-1", &animal.animal_id, "Amoxicillin", 10.0),
    )
    .unwrap();

    // Medium-risk antibiotic at a safe dose: base score only.
    assert_eq!(outcome.risk_score, 30);
    assert!(!outcome.alerts.overdose);
    assert!(!outcome.alerts.interactions);
    assert!(!outcome.alerts.mrl_risk);

    // Cow uses the milk withdrawal basis (3 days for standard antibiotics).
    assert_eq!(outcome.treatment.withdrawal_period_days, 3);
    let expected_end = outcome.treatment.date_given + chrono::Duration::days(3);
    assert_eq!(outcome.withdrawal_end_date, expected_end);
}

#[test]
fn test_audit_record_verifies_after_intake() {
    let db = setup();
    let animal = register_cow(&db, "farmer-1");

    let outcome = add_treatment(
        &db,
        &NullNotifier,
        make_request("farmer-1", &animal.animal_id, "Ivermectin", 0.2),
    )
    .unwrap();

    assert_eq!(outcome.audit_hash.len(), 64);
    let stored = db
        .get_treatment(&outcome.treatment.treatment_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.audit_hash.as_deref(), Some(outcome.audit_hash.as_str()));

    let verification = verify_audit_record(&db, &outcome.audit_hash).unwrap().unwrap();
    assert!(verification.valid);
}

#[test]
fn test_banned_drug_rejected_end_to_end() {
    let db = setup();
    let animal = register_cow(&db, "farmer-1");

    for banned in ["Chloramphenicol", "Colistin", "Diclofenac"] {
        let err = add_treatment(
            &db,
            &NullNotifier,
            make_request("farmer-1", &animal.animal_id, banned, 5.0),
        )
        .unwrap_err();
        assert!(matches!(err, TreatmentError::BannedDrug(name) if name == banned));
    }

    // Nothing was recorded, but each rejection left a violation alert.
    let farmer = Identity::new("farmer-1", Role::Farmer);
    assert!(treatments_for_identity(&db, &farmer, None, None)
        .unwrap()
        .is_empty());
    let alerts = db.list_alerts("farmer-1", false).unwrap();
    assert_eq!(alerts.len(), 3);
    assert!(alerts.iter().all(|a| a.title == "Banned Drug Detected"));
}

#[test]
fn test_unknown_medicine_is_a_hard_error() {
    let db = setup();
    let animal = register_cow(&db, "farmer-1");

    let err = add_treatment(
        &db,
        &NullNotifier,
        make_request("farmer-1", &animal.animal_id, "Turmeric", 5.0),
    )
    .unwrap_err();
    assert!(matches!(err, TreatmentError::UnknownMedicine(name) if name == "Turmeric"));
}

#[test]
fn test_overdose_on_high_risk_drug() {
    let db = setup();
    let animal = register_cow(&db, "farmer-1");

    // Gentamicin: safe dosage 5 mg/kg, so 12 mg/kg is more than double.
    let outcome = add_treatment(
        &db,
        &NullNotifier,
        make_request("farmer-1", &animal.animal_id, "Gentamicin", 12.0),
    )
    .unwrap();

    assert!(outcome.alerts.overdose);
    assert!(outcome.alerts.mrl_risk);
    assert_eq!(outcome.risk_score, 90); // High base 60 + severe overdose 30

    let titles: Vec<String> = db
        .list_alerts("farmer-1", false)
        .unwrap()
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert!(titles.contains(&"Overdose Detected".to_string()));
    assert!(titles.contains(&"High MRL Risk".to_string()));
}

#[test]
fn test_interaction_detected_from_seeded_pairs() {
    let db = setup();
    let animal = register_cow(&db, "farmer-1");

    // A vet-approved aminoglycoside course is still active on the animal.
    let mut first = make_request("farmer-1", &animal.animal_id, "Gentamicin", 4.0);
    first.vet_id = Some("vet-1".to_string());
    add_treatment(&db, &NullNotifier, first).unwrap();

    let outcome = add_treatment(
        &db,
        &NullNotifier,
        make_request("farmer-1", &animal.animal_id, "Flunixin Meglumine", 2.0),
    )
    .unwrap();

    assert!(outcome.alerts.interactions);
    let alerts = db.list_alerts("farmer-1", false).unwrap();
    let warning = alerts
        .iter()
        .find(|a| a.title == "Drug Interaction Warning")
        .unwrap();
    assert!(warning.message.contains("Gentamicin"));
}

//! SQLite schema definition.

/// Complete database schema for herdtrace.
///
/// Timestamps are RFC 3339 TEXT and always bound from Rust; the schema
/// declares no datetime defaults.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Drug Reference (seeded, read-only at runtime)
-- ============================================================================

CREATE TABLE IF NOT EXISTS drugs (
    drug_name TEXT PRIMARY KEY,                  -- uppercase canonical name
    category TEXT NOT NULL,
    mrl_limit REAL NOT NULL DEFAULT 0.1,
    mrl_limit_unit TEXT NOT NULL DEFAULT 'mg/kg',
    withdrawal_period_milk INTEGER NOT NULL DEFAULT 0,
    withdrawal_period_meat INTEGER NOT NULL DEFAULT 0,
    risk_level TEXT NOT NULL DEFAULT 'Medium',
    toxicity_by_age TEXT NOT NULL DEFAULT '{}',  -- JSON {calves, adults, pregnant}
    allowed INTEGER NOT NULL DEFAULT 1,
    banned INTEGER NOT NULL DEFAULT 0,
    interactions TEXT NOT NULL DEFAULT '[]',     -- JSON array of drug names
    alternatives TEXT NOT NULL DEFAULT '[]',     -- JSON array of drug names
    safe_dosage REAL NOT NULL,
    dosage_unit TEXT NOT NULL DEFAULT 'mg/kg',
    description TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_drugs_category ON drugs(category);
CREATE INDEX IF NOT EXISTS idx_drugs_flags ON drugs(allowed, banned);

-- ============================================================================
-- Animals
-- ============================================================================

CREATE TABLE IF NOT EXISTS animals (
    animal_id TEXT PRIMARY KEY,
    farmer_id TEXT NOT NULL,
    name TEXT,
    tag_id TEXT NOT NULL UNIQUE,                 -- uppercase external tag
    species TEXT NOT NULL,
    farm_type TEXT,
    age REAL,
    age_unit TEXT NOT NULL DEFAULT 'years',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_animals_farmer ON animals(farmer_id, created_at);

-- ============================================================================
-- Vet Locations
-- ============================================================================

CREATE TABLE IF NOT EXISTS vet_locations (
    vet_id TEXT PRIMARY KEY,
    lat REAL NOT NULL,
    lng REAL NOT NULL,
    is_available INTEGER NOT NULL DEFAULT 1,
    is_online INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Bounding-box prefilter for the nearby search
CREATE INDEX IF NOT EXISTS idx_vet_locations_point ON vet_locations(lat, lng);

-- ============================================================================
-- Treatments
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatments (
    treatment_id TEXT PRIMARY KEY,
    farmer_id TEXT NOT NULL,
    animal_id TEXT NOT NULL REFERENCES animals(animal_id),
    vet_id TEXT,
    medicine TEXT NOT NULL,
    drug_type TEXT NOT NULL,
    dosage REAL NOT NULL,
    dosage_unit TEXT NOT NULL,
    frequency TEXT NOT NULL,
    duration INTEGER NOT NULL DEFAULT 1,
    duration_unit TEXT NOT NULL DEFAULT 'days',
    date_given TEXT NOT NULL,
    withdrawal_period_days INTEGER NOT NULL,
    withdrawal_end_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',       -- active, pending, completed
    notes TEXT,
    risk_score INTEGER NOT NULL DEFAULT 0,
    audit_hash TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_treatments_farmer ON treatments(farmer_id, date_given);
CREATE INDEX IF NOT EXISTS idx_treatments_animal ON treatments(animal_id, status);
CREATE INDEX IF NOT EXISTS idx_treatments_withdrawal ON treatments(withdrawal_end_date, status);

-- ============================================================================
-- Alerts
-- ============================================================================

CREATE TABLE IF NOT EXISTS alerts (
    alert_id TEXT PRIMARY KEY,
    farmer_id TEXT NOT NULL,
    animal_id TEXT,
    treatment_id TEXT,
    alert_type TEXT NOT NULL,                    -- safe, warning, violation
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    severity TEXT NOT NULL DEFAULT 'medium',
    read_status INTEGER NOT NULL DEFAULT 0,
    read_at TEXT,
    action_required INTEGER NOT NULL DEFAULT 0,
    metadata TEXT NOT NULL DEFAULT 'null',       -- JSON
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerts_farmer ON alerts(farmer_id, read_status, created_at);
CREATE INDEX IF NOT EXISTS idx_alerts_treatment ON alerts(treatment_id, alert_type);

-- ============================================================================
-- Consultations
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    consultation_id TEXT PRIMARY KEY,
    farmer_id TEXT NOT NULL,
    vet_id TEXT,
    animal_id TEXT,
    symptom TEXT NOT NULL,
    mobile_number TEXT NOT NULL,
    lat REAL NOT NULL,
    lng REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',      -- pending, active, closed, rejected
    radius_meters REAL NOT NULL,
    notified_vet_ids TEXT NOT NULL DEFAULT '[]', -- JSON array of vet IDs
    accepted_at TEXT,
    closed_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consultations_farmer ON consultations(farmer_id, status);
CREATE INDEX IF NOT EXISTS idx_consultations_vet ON consultations(vet_id, status);
CREATE INDEX IF NOT EXISTS idx_consultations_status ON consultations(status, created_at);

-- ============================================================================
-- Audit Log (append-only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS audit_log (
    hash TEXT PRIMARY KEY,                       -- SHA-256 of payload
    record_type TEXT NOT NULL,
    reference_id TEXT NOT NULL,
    payload TEXT NOT NULL,                       -- canonical JSON as hashed
    previous_hash TEXT,                          -- reserved, never populated
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_reference ON audit_log(reference_id);
"#;

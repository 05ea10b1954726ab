//! HerdTrace Core Library
//!
//! Treatment safety and veterinary consultation matching for livestock,
//! backed by a local SQLite store.
//!
//! # Architecture
//!
//! ```text
//! Treatment intake ──► drug reference lookup
//!                              │
//!                      safety evaluation
//!          (banned / overdose / interaction / MRL / risk score)
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!       withdrawal end    safety alerts    live events
//!              │
//!              ▼
//!     SHA-256 audit record
//!
//! Consultation request ──► geo matcher (haversine within radius)
//!                                  │
//!                     broadcast to candidate vets
//!                                  │
//!                      first acceptance claims it
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: domain types (Drug, Animal, Treatment, Consultation, ...)
//! - [`evaluator`]: pure treatment safety computation
//! - [`treatment`]: treatment intake orchestration
//! - [`consult`]: consultation lifecycle and nearby-vet matching
//! - [`sweep`]: periodic withdrawal and overdose scans
//! - [`audit`]: canonical payload hashing and verification
//! - [`notify`]: event types and delivery trait
//! - [`geo`]: haversine distance and bounding boxes
//! - [`seed`]: built-in drug catalog

pub mod audit;
pub mod consult;
pub mod db;
pub mod evaluator;
pub mod geo;
pub mod models;
pub mod notify;
pub mod seed;
pub mod sweep;
pub mod treatment;

// Re-export commonly used types
pub use consult::{
    accept_consultation, create_consultation, find_nearby_vets, update_consultation_status,
    ConsultError, ConsultationCreated, NewConsultation,
};
pub use db::{Database, DbError, DbResult};
pub use evaluator::{evaluate, EvalError, Evaluation};
pub use models::{
    AgeUnit, Alert, AlertSeverity, AlertType, Animal, Consultation, ConsultationStatus, Drug,
    FarmType, Frequency, GeoPoint, Identity, NearbyVet, RiskLevel, Role, Species, Treatment,
    TreatmentStatus, VetLocation,
};
pub use notify::{Event, Notifier, NullNotifier};
pub use seed::seed_drugs;
pub use sweep::{run_sweep, SweepStats};
pub use treatment::{
    add_treatment, treatments_for_identity, NewTreatment, SafetyFlags, TreatmentError,
    TreatmentOutcome,
};

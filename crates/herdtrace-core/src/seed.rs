//! Built-in drug reference catalog.
//!
//! Seeds the livestock medicine table on first start. Idempotent: a
//! database that already holds drug rows is left untouched.

use tracing::info;

use crate::db::{Database, DbResult};
use crate::models::{
    Drug, DrugCategory, ReferenceDoseUnit, RiskLevel, Toxicity, ToxicityByAge,
};

use DrugCategory::{Antibiotic, Antiparasitic, Hormone, Other, Vitamin};
use ReferenceDoseUnit::{MgPerKg, MlPerKg, UnitsPerKg};
use RiskLevel::{Critical, High};

/// (name, category, safe dosage, dosage unit, banned, explicit risk override)
type CatalogEntry = (
    &'static str,
    DrugCategory,
    f64,
    ReferenceDoseUnit,
    bool,
    Option<RiskLevel>,
);

const CATALOG: &[CatalogEntry] = &[
    // Antibiotics
    ("Oxytetracycline", Antibiotic, 20.0, MgPerKg, false, None),
    ("Tetracycline", Antibiotic, 20.0, MgPerKg, false, Some(High)),
    ("Doxycycline", Antibiotic, 10.0, MgPerKg, false, None),
    ("Amoxicillin", Antibiotic, 15.0, MgPerKg, false, None),
    ("Ampicillin", Antibiotic, 15.0, MgPerKg, false, None),
    ("Penicillin G", Antibiotic, 20000.0, UnitsPerKg, false, Some(High)),
    ("Ceftriaxone", Antibiotic, 20.0, MgPerKg, false, None),
    ("Cefotaxime", Antibiotic, 20.0, MgPerKg, false, None),
    ("Cephalexin", Antibiotic, 25.0, MgPerKg, false, None),
    ("Enrofloxacin", Antibiotic, 5.0, MgPerKg, false, Some(High)),
    ("Ciprofloxacin", Antibiotic, 5.0, MgPerKg, false, Some(High)),
    ("Levofloxacin", Antibiotic, 5.0, MgPerKg, false, Some(High)),
    ("Norfloxacin", Antibiotic, 5.0, MgPerKg, false, Some(High)),
    ("Gentamicin", Antibiotic, 5.0, MgPerKg, false, Some(High)),
    ("Neomycin", Antibiotic, 10.0, MgPerKg, false, None),
    ("Streptomycin", Antibiotic, 10.0, MgPerKg, false, Some(High)),
    ("Sulphamethoxazole", Antibiotic, 25.0, MgPerKg, false, None),
    ("Trimethoprim", Antibiotic, 5.0, MgPerKg, false, None),
    ("Chloramphenicol", Antibiotic, 0.0, MgPerKg, true, Some(Critical)),
    ("Florfenicol", Antibiotic, 20.0, MgPerKg, false, None),
    ("Amikacin", Antibiotic, 10.0, MgPerKg, false, Some(High)),
    ("Kanamycin", Antibiotic, 10.0, MgPerKg, false, Some(High)),
    ("Azithromycin", Antibiotic, 10.0, MgPerKg, false, None),
    ("Clarithromycin", Antibiotic, 10.0, MgPerKg, false, None),
    ("Erythromycin", Antibiotic, 10.0, MgPerKg, false, None),
    ("Colistin", Antibiotic, 0.0, MgPerKg, true, Some(Critical)),
    ("Nitrofurazone", Antibiotic, 0.0, MgPerKg, true, Some(Critical)),
    ("Furazolidone", Antibiotic, 0.0, MgPerKg, true, Some(Critical)),
    // Anthelmintics
    ("Albendazole", Antiparasitic, 10.0, MgPerKg, false, None),
    ("Fenbendazole", Antiparasitic, 10.0, MgPerKg, false, None),
    ("Ivermectin", Antiparasitic, 0.2, MgPerKg, false, None),
    ("Moxidectin", Antiparasitic, 0.2, MgPerKg, false, None),
    ("Levamisole", Antiparasitic, 7.5, MgPerKg, false, None),
    ("Praziquantel", Antiparasitic, 25.0, MgPerKg, false, None),
    ("Closantel", Antiparasitic, 10.0, MgPerKg, false, None),
    ("Oxyclozanide", Antiparasitic, 15.0, MgPerKg, false, None),
    ("Niclosamide", Antiparasitic, 50.0, MgPerKg, false, None),
    ("Doramectin", Antiparasitic, 0.2, MgPerKg, false, None),
    // Anti-inflammatories
    ("Meloxicam", Other, 0.5, MgPerKg, false, None),
    ("Flunixin Meglumine", Other, 2.2, MgPerKg, false, None),
    ("Ketoprofen", Other, 3.0, MgPerKg, false, None),
    ("Diclofenac", Other, 0.0, MgPerKg, true, Some(Critical)),
    ("Carprofen", Other, 1.4, MgPerKg, false, None),
    ("Paracetamol", Other, 10.0, MgPerKg, false, None),
    ("Prednisolone", Hormone, 1.0, MgPerKg, false, None),
    ("Dexamethasone", Hormone, 0.1, MgPerKg, false, None),
    ("Ibuprofen", Other, 10.0, MgPerKg, false, None),
    ("Phenylbutazone", Other, 4.4, MgPerKg, false, None),
    // Antipyretics
    ("Analgin", Other, 50.0, MgPerKg, false, None),
    // External antiparasitics
    ("Cypermethrin", Antiparasitic, 0.1, MgPerKg, false, None),
    ("Permethrin", Antiparasitic, 0.1, MgPerKg, false, None),
    ("Amitraz", Antiparasitic, 0.025, MgPerKg, false, None),
    ("Fipronil", Antiparasitic, 0.1, MgPerKg, false, None),
    ("Deltamethrin", Antiparasitic, 0.05, MgPerKg, false, None),
    ("Fluralaner", Antiparasitic, 0.1, MgPerKg, false, None),
    ("Sarolaner", Antiparasitic, 0.1, MgPerKg, false, None),
    // Anti-diarrheals
    ("Metronidazole", Antibiotic, 15.0, MgPerKg, false, None),
    // Reproductive
    ("Oxytocin", Hormone, 10.0, UnitsPerKg, false, None),
    // Supportive
    ("B-Complex Injection", Vitamin, 5.0, MlPerKg, false, None),
    ("Multivitamin Liquid", Vitamin, 10.0, MlPerKg, false, None),
    ("Calcium Borogluconate", Vitamin, 50.0, MlPerKg, false, None),
    // Respiratory
    ("Bromhexine", Other, 0.5, MgPerKg, false, None),
    ("Theophylline", Other, 10.0, MgPerKg, false, None),
    ("Salbutamol", Other, 0.1, MgPerKg, false, None),
    ("Doxophylline", Other, 5.0, MgPerKg, false, None),
];

/// Adverse pairings, declared once per pair; either order of
/// administration must trip the interaction check, so both drugs get
/// the partner in their list.
const INTERACTION_PAIRS: &[(&str, &str)] = &[
    // Aminoglycoside plus NSAID compounds the kidney load
    ("GENTAMICIN", "FLUNIXIN MEGLUMINE"),
    ("GENTAMICIN", "MELOXICAM"),
    ("GENTAMICIN", "KETOPROFEN"),
    ("STREPTOMYCIN", "FLUNIXIN MEGLUMINE"),
    ("KANAMYCIN", "FLUNIXIN MEGLUMINE"),
    ("AMIKACIN", "FLUNIXIN MEGLUMINE"),
    ("NEOMYCIN", "FLUNIXIN MEGLUMINE"),
    // Bacteriostatic antagonizes bactericidal
    ("TETRACYCLINE", "PENICILLIN G"),
    ("OXYTETRACYCLINE", "PENICILLIN G"),
    ("DOXYCYCLINE", "AMPICILLIN"),
    ("CHLORAMPHENICOL", "PENICILLIN G"),
    // Corticosteroid plus NSAID risks ulceration
    ("DEXAMETHASONE", "PHENYLBUTAZONE"),
    ("DEXAMETHASONE", "FLUNIXIN MEGLUMINE"),
    ("DEXAMETHASONE", "IBUPROFEN"),
    ("DEXAMETHASONE", "MELOXICAM"),
    ("PREDNISOLONE", "PHENYLBUTAZONE"),
    ("PREDNISOLONE", "IBUPROFEN"),
    // Quinolones and macrolides slow theophylline clearance
    ("ENROFLOXACIN", "THEOPHYLLINE"),
    ("CIPROFLOXACIN", "THEOPHYLLINE"),
    ("ERYTHROMYCIN", "THEOPHYLLINE"),
    ("CLARITHROMYCIN", "THEOPHYLLINE"),
];

/// Load the built-in catalog into `db` unless drugs are already present.
///
/// Returns the number of rows inserted, zero when the table was already
/// populated.
pub fn seed_drugs(db: &Database) -> DbResult<usize> {
    if db.count_drugs()? > 0 {
        return Ok(0);
    }

    let mut inserted = 0;
    for entry in CATALOG {
        db.insert_drug(&build_drug(entry))?;
        inserted += 1;
    }
    info!(drugs = inserted, "seeded drug reference table");
    Ok(inserted)
}

fn build_drug(entry: &CatalogEntry) -> Drug {
    let (name, category, safe_dosage, unit, banned, risk) = *entry;
    let upper = name.to_uppercase();

    let mut drug = Drug::new(name, category, safe_dosage);
    drug.mrl_limit = if banned { 0.0 } else { 0.1 };
    let (milk, meat) = withdrawal_preset(&upper, category);
    drug.withdrawal_period_milk = milk;
    drug.withdrawal_period_meat = meat;
    drug.risk_level = risk.unwrap_or_else(|| default_risk(&upper, category, banned));
    drug.toxicity_by_age = if banned {
        ToxicityByAge {
            calves: Toxicity::Unsafe,
            adults: Toxicity::Unsafe,
            pregnant: Toxicity::Unsafe,
        }
    } else {
        ToxicityByAge {
            calves: Toxicity::Safe,
            adults: Toxicity::Safe,
            pregnant: Toxicity::Caution,
        }
    };
    drug.allowed = !banned;
    drug.banned = banned;
    drug.interactions = interactions_for(&upper);
    drug.dosage_unit = unit;
    drug.description = format!("{name} - {} for livestock treatment", category.as_str());
    drug
}

/// Risk classification for entries without an explicit override.
fn default_risk(upper_name: &str, category: DrugCategory, banned: bool) -> RiskLevel {
    const HIGH_RISK: &[&str] = &[
        "CHLORAMPHENICOL",
        "COLISTIN",
        "NITROFURAZONE",
        "FURAZOLIDONE",
        "STREPTOMYCIN",
        "KANAMYCIN",
        "GENTAMICIN",
        "ENROFLOXACIN",
        "TETRACYCLINE",
        "DICLOFENAC",
    ];

    if banned {
        RiskLevel::Critical
    } else if HIGH_RISK.contains(&upper_name) {
        RiskLevel::High
    } else if category == DrugCategory::Antibiotic {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Withdrawal preset in days as (milk, meat).
fn withdrawal_preset(upper_name: &str, category: DrugCategory) -> (i64, i64) {
    if matches!(
        upper_name,
        "GENTAMICIN" | "STREPTOMYCIN" | "KANAMYCIN" | "AMIKACIN"
    ) {
        return (5, 14);
    }
    if matches!(
        upper_name,
        "ENROFLOXACIN" | "CIPROFLOXACIN" | "LEVOFLOXACIN" | "NORFLOXACIN"
    ) {
        return (2, 10);
    }
    if category == DrugCategory::Antibiotic {
        return (3, 7);
    }
    if matches!(upper_name, "MELOXICAM" | "FLUNIXIN MEGLUMINE" | "KETOPROFEN") {
        return (1, 5);
    }
    if category == DrugCategory::Antiparasitic {
        return (0, 7);
    }
    (0, 0)
}

fn interactions_for(upper_name: &str) -> Vec<String> {
    let mut partners = Vec::new();
    for (a, b) in INTERACTION_PAIRS {
        if *a == upper_name {
            partners.push((*b).to_string());
        } else if *b == upper_name {
            partners.push((*a).to_string());
        }
    }
    partners
}

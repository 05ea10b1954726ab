//! Drug reference database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Drug, DrugCategory, MrlUnit, ReferenceDoseUnit, RiskLevel, ToxicityByAge};

/// Maximum rows a drug search returns.
const SEARCH_LIMIT: i64 = 30;

const DRUG_COLUMNS: &str = "drug_name, category, mrl_limit, mrl_limit_unit, \
     withdrawal_period_milk, withdrawal_period_meat, risk_level, toxicity_by_age, \
     allowed, banned, interactions, alternatives, safe_dosage, dosage_unit, \
     description, is_active";

impl Database {
    /// Insert a reference drug. Fails on duplicate names.
    pub fn insert_drug(&self, drug: &Drug) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO drugs (
                drug_name, category, mrl_limit, mrl_limit_unit,
                withdrawal_period_milk, withdrawal_period_meat, risk_level,
                toxicity_by_age, allowed, banned, interactions, alternatives,
                safe_dosage, dosage_unit, description, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                drug.drug_name,
                category_to_string(drug.category),
                drug.mrl_limit,
                drug.mrl_limit_unit.as_str(),
                drug.withdrawal_period_milk,
                drug.withdrawal_period_meat,
                risk_to_string(drug.risk_level),
                serde_json::to_string(&drug.toxicity_by_age)?,
                drug.allowed,
                drug.banned,
                serde_json::to_string(&drug.interactions)?,
                serde_json::to_string(&drug.alternatives)?,
                drug.safe_dosage,
                ref_unit_to_string(drug.dosage_unit),
                drug.description,
                drug.is_active,
            ],
        )?;
        Ok(())
    }

    /// Look up an active drug by name (case-insensitive).
    pub fn get_drug(&self, name: &str) -> DbResult<Option<Drug>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {DRUG_COLUMNS} FROM drugs WHERE drug_name = ?1 AND is_active = 1"),
                [name.to_uppercase()],
                DrugRow::from_row,
            )
            .optional()?;
        row.map(Drug::try_from).transpose()
    }

    /// Search active drugs by name, description, or category; prefix matches
    /// on the name rank before substring matches.
    pub fn search_drugs(&self, term: &str) -> DbResult<Vec<Drug>> {
        let cleaned = term.trim();
        if cleaned.is_empty() {
            return Ok(Vec::new());
        }

        let escaped = escape_like(cleaned);
        let prefix = format!("{escaped}%");
        let contains = format!("%{escaped}%");

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {DRUG_COLUMNS} FROM drugs
            WHERE is_active = 1
              AND (drug_name LIKE ?1 ESCAPE '\'
                   OR drug_name LIKE ?2 ESCAPE '\'
                   OR description LIKE ?2 ESCAPE '\'
                   OR category LIKE ?2 ESCAPE '\')
            ORDER BY CASE WHEN drug_name LIKE ?1 ESCAPE '\' THEN 0 ELSE 1 END,
                     drug_name
            LIMIT ?3
            "#
        ))?;

        let rows = stmt.query_map(params![prefix, contains, SEARCH_LIMIT], DrugRow::from_row)?;

        let mut drugs = Vec::new();
        for row in rows {
            drugs.push(Drug::try_from(row?)?);
        }
        Ok(drugs)
    }

    /// Number of reference drugs (used to skip redundant seeding).
    pub fn count_drugs(&self) -> DbResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM drugs", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Escape LIKE wildcards so user terms match literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

struct DrugRow {
    drug_name: String,
    category: String,
    mrl_limit: f64,
    mrl_limit_unit: String,
    withdrawal_period_milk: i64,
    withdrawal_period_meat: i64,
    risk_level: String,
    toxicity_by_age: String,
    allowed: bool,
    banned: bool,
    interactions: String,
    alternatives: String,
    safe_dosage: f64,
    dosage_unit: String,
    description: String,
    is_active: bool,
}

impl DrugRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            drug_name: row.get(0)?,
            category: row.get(1)?,
            mrl_limit: row.get(2)?,
            mrl_limit_unit: row.get(3)?,
            withdrawal_period_milk: row.get(4)?,
            withdrawal_period_meat: row.get(5)?,
            risk_level: row.get(6)?,
            toxicity_by_age: row.get(7)?,
            allowed: row.get(8)?,
            banned: row.get(9)?,
            interactions: row.get(10)?,
            alternatives: row.get(11)?,
            safe_dosage: row.get(12)?,
            dosage_unit: row.get(13)?,
            description: row.get(14)?,
            is_active: row.get(15)?,
        })
    }
}

impl TryFrom<DrugRow> for Drug {
    type Error = DbError;

    fn try_from(row: DrugRow) -> Result<Self, Self::Error> {
        let toxicity_by_age: ToxicityByAge = serde_json::from_str(&row.toxicity_by_age)?;
        let interactions: Vec<String> = serde_json::from_str(&row.interactions)?;
        let alternatives: Vec<String> = serde_json::from_str(&row.alternatives)?;

        Ok(Drug {
            drug_name: row.drug_name,
            category: string_to_category(&row.category)?,
            mrl_limit: row.mrl_limit,
            mrl_limit_unit: string_to_mrl_unit(&row.mrl_limit_unit)?,
            withdrawal_period_milk: row.withdrawal_period_milk,
            withdrawal_period_meat: row.withdrawal_period_meat,
            risk_level: string_to_risk(&row.risk_level)?,
            toxicity_by_age,
            allowed: row.allowed,
            banned: row.banned,
            interactions,
            alternatives,
            safe_dosage: row.safe_dosage,
            dosage_unit: string_to_ref_unit(&row.dosage_unit)?,
            description: row.description,
            is_active: row.is_active,
        })
    }
}

pub(super) fn category_to_string(category: DrugCategory) -> &'static str {
    match category {
        DrugCategory::Antibiotic => "antibiotic",
        DrugCategory::Antiparasitic => "antiparasitic",
        DrugCategory::Vaccine => "vaccine",
        DrugCategory::Vitamin => "vitamin",
        DrugCategory::Hormone => "hormone",
        DrugCategory::Other => "other",
    }
}

pub(super) fn string_to_category(s: &str) -> DbResult<DrugCategory> {
    match s {
        "antibiotic" => Ok(DrugCategory::Antibiotic),
        "antiparasitic" => Ok(DrugCategory::Antiparasitic),
        "vaccine" => Ok(DrugCategory::Vaccine),
        "vitamin" => Ok(DrugCategory::Vitamin),
        "hormone" => Ok(DrugCategory::Hormone),
        "other" => Ok(DrugCategory::Other),
        _ => Err(DbError::Constraint(format!("unknown drug category: {s}"))),
    }
}

fn risk_to_string(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => "Low",
        RiskLevel::Medium => "Medium",
        RiskLevel::High => "High",
        RiskLevel::Critical => "Critical",
    }
}

fn string_to_risk(s: &str) -> DbResult<RiskLevel> {
    match s {
        "Low" => Ok(RiskLevel::Low),
        "Medium" => Ok(RiskLevel::Medium),
        "High" => Ok(RiskLevel::High),
        "Critical" => Ok(RiskLevel::Critical),
        _ => Err(DbError::Constraint(format!("unknown risk level: {s}"))),
    }
}

fn ref_unit_to_string(unit: ReferenceDoseUnit) -> &'static str {
    match unit {
        ReferenceDoseUnit::MgPerKg => "mg/kg",
        ReferenceDoseUnit::MlPerKg => "ml/kg",
        ReferenceDoseUnit::UnitsPerKg => "units/kg",
    }
}

fn string_to_ref_unit(s: &str) -> DbResult<ReferenceDoseUnit> {
    match s {
        "mg/kg" => Ok(ReferenceDoseUnit::MgPerKg),
        "ml/kg" => Ok(ReferenceDoseUnit::MlPerKg),
        "units/kg" => Ok(ReferenceDoseUnit::UnitsPerKg),
        _ => Err(DbError::Constraint(format!("unknown dosage unit: {s}"))),
    }
}

fn string_to_mrl_unit(s: &str) -> DbResult<MrlUnit> {
    match s {
        "mg/kg" => Ok(MrlUnit::MgPerKg),
        "ug/kg" => Ok(MrlUnit::UgPerKg),
        "ppb" => Ok(MrlUnit::Ppb),
        _ => Err(DbError::Constraint(format!("unknown MRL unit: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Toxicity;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_drug(name: &str) -> Drug {
        Drug::new(name, DrugCategory::Antibiotic, 20.0)
    }

    #[test]
    fn test_insert_and_get_drug() {
        let db = setup_db();
        let mut drug = make_drug("Oxytetracycline");
        drug.withdrawal_period_milk = 3;
        drug.withdrawal_period_meat = 7;
        drug.interactions = vec!["GENTAMICIN".into()];
        drug.toxicity_by_age.pregnant = Toxicity::Caution;
        db.insert_drug(&drug).unwrap();

        let found = db.get_drug("oxytetracycline").unwrap().unwrap();
        assert_eq!(found, drug);
    }

    #[test]
    fn test_get_drug_missing() {
        let db = setup_db();
        assert!(db.get_drug("NOSUCHDRUG").unwrap().is_none());
    }

    #[test]
    fn test_get_drug_skips_inactive() {
        let db = setup_db();
        let mut drug = make_drug("Oxytetracycline");
        drug.is_active = false;
        db.insert_drug(&drug).unwrap();

        assert!(db.get_drug("OXYTETRACYCLINE").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = setup_db();
        db.insert_drug(&make_drug("Oxytetracycline")).unwrap();
        assert!(db.insert_drug(&make_drug("OXYTETRACYCLINE")).is_err());
    }

    #[test]
    fn test_search_ranks_prefix_before_substring() {
        let db = setup_db();
        db.insert_drug(&make_drug("Oxytetracycline")).unwrap();
        db.insert_drug(&make_drug("Tetracycline")).unwrap();
        db.insert_drug(&make_drug("Doxycycline")).unwrap();

        let results = db.search_drugs("tetra").unwrap();
        let names: Vec<&str> = results.iter().map(|d| d.drug_name.as_str()).collect();
        assert_eq!(names, vec!["TETRACYCLINE", "OXYTETRACYCLINE"]);
    }

    #[test]
    fn test_search_matches_category() {
        let db = setup_db();
        db.insert_drug(&Drug::new("Ivermectin", DrugCategory::Antiparasitic, 0.2))
            .unwrap();

        let results = db.search_drugs("antiparasitic").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].drug_name, "IVERMECTIN");
    }

    #[test]
    fn test_search_blank_term_is_empty() {
        let db = setup_db();
        db.insert_drug(&make_drug("Oxytetracycline")).unwrap();
        assert!(db.search_drugs("   ").unwrap().is_empty());
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let db = setup_db();
        db.insert_drug(&make_drug("Oxytetracycline")).unwrap();
        assert!(db.search_drugs("%").unwrap().is_empty());
        assert!(db.search_drugs("_").unwrap().is_empty());
    }

    #[test]
    fn test_count_drugs() {
        let db = setup_db();
        assert_eq!(db.count_drugs().unwrap(), 0);
        db.insert_drug(&make_drug("Oxytetracycline")).unwrap();
        assert_eq!(db.count_drugs().unwrap(), 1);
    }
}

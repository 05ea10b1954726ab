//! Animal registry database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_ts, ts, Database, DbError, DbResult};
use crate::models::{AgeUnit, Animal, FarmType, Species};

impl Database {
    /// Insert a registered animal. Fails on duplicate tag IDs.
    pub fn insert_animal(&self, animal: &Animal) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO animals (
                animal_id, farmer_id, name, tag_id, species, farm_type,
                age, age_unit, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                animal.animal_id,
                animal.farmer_id,
                animal.name,
                animal.tag_id,
                species_to_string(animal.species),
                animal.farm_type.map(farm_type_to_string),
                animal.age,
                age_unit_to_string(animal.age_unit),
                ts(&animal.created_at),
            ],
        )?;
        Ok(())
    }

    /// Get an animal by ID.
    pub fn get_animal(&self, animal_id: &str) -> DbResult<Option<Animal>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT animal_id, farmer_id, name, tag_id, species, farm_type,
                       age, age_unit, created_at
                FROM animals
                WHERE animal_id = ?1
                "#,
                [animal_id],
                AnimalRow::from_row,
            )
            .optional()?;
        row.map(Animal::try_from).transpose()
    }
}

struct AnimalRow {
    animal_id: String,
    farmer_id: String,
    name: Option<String>,
    tag_id: String,
    species: String,
    farm_type: Option<String>,
    age: Option<f64>,
    age_unit: String,
    created_at: String,
}

impl AnimalRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            animal_id: row.get(0)?,
            farmer_id: row.get(1)?,
            name: row.get(2)?,
            tag_id: row.get(3)?,
            species: row.get(4)?,
            farm_type: row.get(5)?,
            age: row.get(6)?,
            age_unit: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl TryFrom<AnimalRow> for Animal {
    type Error = DbError;

    fn try_from(row: AnimalRow) -> Result<Self, Self::Error> {
        Ok(Animal {
            animal_id: row.animal_id,
            farmer_id: row.farmer_id,
            name: row.name,
            tag_id: row.tag_id,
            species: string_to_species(&row.species)?,
            farm_type: row.farm_type.as_deref().map(string_to_farm_type).transpose()?,
            age: row.age,
            age_unit: string_to_age_unit(&row.age_unit)?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

fn species_to_string(species: Species) -> &'static str {
    match species {
        Species::Cow => "cow",
        Species::Buffalo => "buffalo",
        Species::Goat => "goat",
        Species::Sheep => "sheep",
        Species::Poultry => "poultry",
        Species::Other => "other",
    }
}

fn string_to_species(s: &str) -> DbResult<Species> {
    match s {
        "cow" => Ok(Species::Cow),
        "buffalo" => Ok(Species::Buffalo),
        "goat" => Ok(Species::Goat),
        "sheep" => Ok(Species::Sheep),
        "poultry" => Ok(Species::Poultry),
        "other" => Ok(Species::Other),
        _ => Err(DbError::Constraint(format!("unknown species: {s}"))),
    }
}

fn farm_type_to_string(farm_type: FarmType) -> &'static str {
    match farm_type {
        FarmType::Dairy => "dairy",
        FarmType::Mixed => "mixed",
    }
}

fn string_to_farm_type(s: &str) -> DbResult<FarmType> {
    match s {
        "dairy" => Ok(FarmType::Dairy),
        "mixed" => Ok(FarmType::Mixed),
        _ => Err(DbError::Constraint(format!("unknown farm type: {s}"))),
    }
}

fn age_unit_to_string(unit: AgeUnit) -> &'static str {
    match unit {
        AgeUnit::Months => "months",
        AgeUnit::Years => "years",
    }
}

fn string_to_age_unit(s: &str) -> DbResult<AgeUnit> {
    match s {
        "months" => Ok(AgeUnit::Months),
        "years" => Ok(AgeUnit::Years),
        _ => Err(DbError::Constraint(format!("unknown age unit: {s}"))),
    }
}

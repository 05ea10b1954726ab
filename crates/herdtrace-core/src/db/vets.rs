//! Vet location database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_ts, ts, Database, DbError, DbResult};
use crate::geo::BoundingBox;
use crate::models::VetLocation;

impl Database {
    /// Insert or replace a vet's reported location. The online flag is
    /// socket-driven and survives location updates.
    pub fn upsert_vet_location(&self, location: &VetLocation) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO vet_locations (vet_id, lat, lng, is_available, is_online, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(vet_id) DO UPDATE SET
                lat = excluded.lat,
                lng = excluded.lng,
                is_available = excluded.is_available,
                updated_at = excluded.updated_at
            "#,
            params![
                location.vet_id,
                location.lat,
                location.lng,
                location.is_available,
                location.is_online,
                ts(&location.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Flip a vet's online flag. Returns false when the vet has never
    /// reported a location, in which case there is nothing to track.
    pub fn set_vet_online(&self, vet_id: &str, online: bool) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE vet_locations SET is_online = ?2 WHERE vet_id = ?1",
            params![vet_id, online],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a vet's stored location.
    pub fn get_vet_location(&self, vet_id: &str) -> DbResult<Option<VetLocation>> {
        let row = self
            .conn
            .query_row(
                "SELECT vet_id, lat, lng, is_available, is_online, updated_at
                 FROM vet_locations WHERE vet_id = ?1",
                [vet_id],
                VetLocationRow::from_row,
            )
            .optional()?;
        row.map(VetLocation::try_from).transpose()
    }

    /// Available vets whose point falls inside the bounding box. This is the
    /// indexed prefilter; callers refine with an exact distance check.
    pub fn vet_locations_in_box(&self, bbox: &BoundingBox) -> DbResult<Vec<VetLocation>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT vet_id, lat, lng, is_available, is_online, updated_at
            FROM vet_locations
            WHERE is_available = 1
              AND lat BETWEEN ?1 AND ?2
              AND lng BETWEEN ?3 AND ?4
            "#,
        )?;

        let rows = stmt.query_map(
            params![bbox.min_lat, bbox.max_lat, bbox.min_lng, bbox.max_lng],
            VetLocationRow::from_row,
        )?;

        collect_locations(rows)
    }

    /// Every available vet, regardless of position. Fallback when the
    /// indexed path fails.
    pub fn all_available_vet_locations(&self) -> DbResult<Vec<VetLocation>> {
        let mut stmt = self.conn.prepare(
            "SELECT vet_id, lat, lng, is_available, is_online, updated_at
             FROM vet_locations WHERE is_available = 1",
        )?;
        let rows = stmt.query_map([], VetLocationRow::from_row)?;
        collect_locations(rows)
    }
}

fn collect_locations(
    rows: impl Iterator<Item = rusqlite::Result<VetLocationRow>>,
) -> DbResult<Vec<VetLocation>> {
    let mut locations = Vec::new();
    for row in rows {
        locations.push(VetLocation::try_from(row?)?);
    }
    Ok(locations)
}

struct VetLocationRow {
    vet_id: String,
    lat: f64,
    lng: f64,
    is_available: bool,
    is_online: bool,
    updated_at: String,
}

impl VetLocationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            vet_id: row.get(0)?,
            lat: row.get(1)?,
            lng: row.get(2)?,
            is_available: row.get(3)?,
            is_online: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl TryFrom<VetLocationRow> for VetLocation {
    type Error = DbError;

    fn try_from(row: VetLocationRow) -> Result<Self, Self::Error> {
        Ok(VetLocation {
            vet_id: row.vet_id,
            lat: row.lat,
            lng: row.lng,
            is_available: row.is_available,
            is_online: row.is_online,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

use super::{new_id, optional_text, required_text, string_list};
use crate::error::{StoreError, StoreResult};
use crate::model::{Material, MaterialPatch, NewMaterial};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, instrument};

const COLUMNS: &str = "id, title, kind, tags_json, url";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Material> {
    let tags_json: String = row.get(3)?;
    Ok(Material {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: row.get(2)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        url: row.get(4)?,
    })
}

fn normalize(m: &mut Material) -> StoreResult<String> {
    m.title = required_text("title", &m.title)?;
    m.url = required_text("url", &m.url)?;
    m.kind = optional_text(m.kind.take());
    m.tags = string_list(std::mem::take(&mut m.tags));
    Ok(serde_json::to_string(&m.tags)?)
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewMaterial) -> StoreResult<Material> {
    let mut m = Material {
        id: new_id(),
        title: input.title,
        kind: input.kind,
        tags: input.tags,
        url: input.url,
    };
    let tags_json = normalize(&mut m)?;
    conn.execute(
        "INSERT INTO materials(id, title, kind, tags_json, url) VALUES(?, ?, ?, ?, ?)",
        (&m.id, &m.title, &m.kind, &tags_json, &m.url),
    )?;
    info!(material_id = %m.id, "material registered");
    Ok(m)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Material> {
    let sql = format!("SELECT {} FROM materials WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("material", id))
}

pub fn list(conn: &Connection, tag: Option<&str>) -> StoreResult<Vec<Material>> {
    let sql = format!("SELECT {} FROM materials ORDER BY title, id", COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match tag {
        Some(t) => rows
            .into_iter()
            .filter(|m| m.tags.iter().any(|x| x == t))
            .collect(),
        None => rows,
    })
}

#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: MaterialPatch) -> StoreResult<Material> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut m = get(conn, id)?;
    patch.apply(&mut m);
    let tags_json = normalize(&mut m)?;
    conn.execute(
        "UPDATE materials SET title = ?, kind = ?, tags_json = ?, url = ? WHERE id = ?",
        (&m.title, &m.kind, &tags_json, &m.url, id),
    )?;
    info!(material_id = %id, "material updated");
    Ok(m)
}

/// Lesson-plan links to the material are dropped by schema cascade.
#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    let n = conn.execute("DELETE FROM materials WHERE id = ?", [id])?;
    if n == 0 {
        return Err(StoreError::not_found("material", id));
    }
    info!(material_id = %id, "material deleted");
    Ok(())
}

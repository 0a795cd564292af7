//! Lesson plans and their three link sets (classes, materials,
//! evaluations). Link sets are always replaced whole, never diffed.

use crate::db::{self, in_transaction};
use crate::error::{StoreError, StoreResult};
use crate::model::{LessonPlan, LessonPlanPatch, LessonPlanSummary, NewLessonPlan};
use crate::repo::{new_id, optional_date, optional_text, required_text};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy)]
enum Link {
    Class,
    Material,
    Evaluation,
}

impl Link {
    const ALL: [Link; 3] = [Link::Class, Link::Material, Link::Evaluation];

    fn join_table(self) -> &'static str {
        match self {
            Link::Class => "lesson_plan_classes",
            Link::Material => "lesson_plan_materials",
            Link::Evaluation => "lesson_plan_evaluations",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Link::Class => "class_id",
            Link::Material => "material_id",
            Link::Evaluation => "evaluation_id",
        }
    }

    fn target_table(self) -> &'static str {
        match self {
            Link::Class => "classes",
            Link::Material => "materials",
            Link::Evaluation => "evaluations",
        }
    }

    fn entity(self) -> &'static str {
        match self {
            Link::Class => "class",
            Link::Material => "material",
            Link::Evaluation => "evaluation",
        }
    }
}

/// First occurrence wins; blanks are dropped.
fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

fn ensure_targets(conn: &Connection, link: Link, ids: &[String]) -> StoreResult<()> {
    for id in ids {
        if !db::row_exists(conn, link.target_table(), id)? {
            return Err(StoreError::not_found(link.entity(), id));
        }
    }
    Ok(())
}

fn replace_links(conn: &Connection, plan_id: &str, link: Link, ids: &[String]) -> StoreResult<()> {
    let del = format!("DELETE FROM {} WHERE lesson_plan_id = ?", link.join_table());
    let removed = conn.execute(&del, [plan_id])?;
    let ins = format!(
        "INSERT INTO {}(lesson_plan_id, {}) VALUES(?, ?)",
        link.join_table(),
        link.column()
    );
    let mut stmt = conn.prepare(&ins)?;
    for id in ids {
        stmt.execute((plan_id, id))?;
    }
    debug!(plan_id, table = link.join_table(), removed, added = ids.len(), "links replaced");
    Ok(())
}

fn read_links(conn: &Connection, plan_id: &str, link: Link) -> StoreResult<Vec<String>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE lesson_plan_id = ? ORDER BY rowid",
        link.column(),
        link.join_table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map([plan_id], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn insert_plan(conn: &Connection, plan: &LessonPlan) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO lesson_plans(id, title, date, objectives, activities, assessment, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &plan.id,
            &plan.title,
            &plan.date,
            &plan.objectives,
            &plan.activities,
            &plan.assessment,
            &plan.created_at,
        ),
    )?;
    replace_links(conn, &plan.id, Link::Class, &plan.class_ids)?;
    replace_links(conn, &plan.id, Link::Material, &plan.material_ids)?;
    replace_links(conn, &plan.id, Link::Evaluation, &plan.evaluation_ids)?;
    Ok(())
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewLessonPlan) -> StoreResult<LessonPlan> {
    let plan = LessonPlan {
        id: new_id(),
        title: required_text("title", &input.title)?,
        date: optional_date("date", input.date)?,
        objectives: optional_text(input.objectives),
        activities: optional_text(input.activities),
        assessment: optional_text(input.assessment),
        created_at: now(),
        class_ids: dedup(input.class_ids),
        material_ids: dedup(input.material_ids),
        evaluation_ids: dedup(input.evaluation_ids),
    };
    ensure_targets(conn, Link::Class, &plan.class_ids)?;
    ensure_targets(conn, Link::Material, &plan.material_ids)?;
    ensure_targets(conn, Link::Evaluation, &plan.evaluation_ids)?;

    in_transaction(conn, |tx| insert_plan(tx, &plan))?;
    info!(plan_id = %plan.id, "lesson plan created");
    Ok(plan)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<LessonPlan> {
    let row = conn
        .query_row(
            "SELECT id, title, date, objectives, activities, assessment, created_at
             FROM lesson_plans WHERE id = ?",
            [id],
            |r| {
                Ok(LessonPlan {
                    id: r.get(0)?,
                    title: r.get(1)?,
                    date: r.get(2)?,
                    objectives: r.get(3)?,
                    activities: r.get(4)?,
                    assessment: r.get(5)?,
                    created_at: r.get(6)?,
                    class_ids: Vec::new(),
                    material_ids: Vec::new(),
                    evaluation_ids: Vec::new(),
                })
            },
        )
        .optional()?;
    let Some(mut plan) = row else {
        return Err(StoreError::not_found("lesson plan", id));
    };
    plan.class_ids = read_links(conn, id, Link::Class)?;
    plan.material_ids = read_links(conn, id, Link::Material)?;
    plan.evaluation_ids = read_links(conn, id, Link::Evaluation)?;
    Ok(plan)
}

/// Summaries, optionally only plans linked to `class_id`. Newest date first.
pub fn list(conn: &Connection, class_id: Option<&str>) -> StoreResult<Vec<LessonPlanSummary>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.title, p.date FROM lesson_plans p
         WHERE ?1 IS NULL
            OR EXISTS(SELECT 1 FROM lesson_plan_classes l
                      WHERE l.lesson_plan_id = p.id AND l.class_id = ?1)
         ORDER BY p.date IS NULL, p.date DESC, p.created_at DESC",
    )?;
    let rows = stmt
        .query_map([class_id], |r| {
            Ok(LessonPlanSummary {
                id: r.get(0)?,
                title: r.get(1)?,
                date: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Scalar fields patch in place; each supplied link list replaces that
/// relation in the same transaction.
#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: LessonPlanPatch) -> StoreResult<LessonPlan> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut plan = get(conn, id)?;
    if let Some(v) = patch.title {
        plan.title = required_text("title", &v)?;
    }
    if let Some(v) = patch.date {
        plan.date = optional_date("date", v)?;
    }
    if let Some(v) = patch.objectives {
        plan.objectives = optional_text(v);
    }
    if let Some(v) = patch.activities {
        plan.activities = optional_text(v);
    }
    if let Some(v) = patch.assessment {
        plan.assessment = optional_text(v);
    }

    let replaced: Vec<(Link, Vec<String>)> = Link::ALL
        .into_iter()
        .zip([patch.class_ids, patch.material_ids, patch.evaluation_ids])
        .filter_map(|(link, ids)| ids.map(|ids| (link, dedup(ids))))
        .collect();
    for (link, ids) in &replaced {
        ensure_targets(conn, *link, ids)?;
    }

    in_transaction(conn, |tx| {
        tx.execute(
            "UPDATE lesson_plans SET title = ?, date = ?, objectives = ?, activities = ?, assessment = ?
             WHERE id = ?",
            (
                &plan.title,
                &plan.date,
                &plan.objectives,
                &plan.activities,
                &plan.assessment,
                id,
            ),
        )?;
        for (link, ids) in &replaced {
            replace_links(tx, id, *link, ids)?;
        }
        Ok(())
    })?;

    for (link, ids) in replaced {
        match link {
            Link::Class => plan.class_ids = ids,
            Link::Material => plan.material_ids = ids,
            Link::Evaluation => plan.evaluation_ids = ids,
        }
    }
    info!(plan_id = %id, "lesson plan updated");
    Ok(plan)
}

/// Only the parent row is deleted; link rows go by schema cascade.
#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    let n = conn.execute("DELETE FROM lesson_plans WHERE id = ?", [id])?;
    if n == 0 {
        return Err(StoreError::not_found("lesson plan", id));
    }
    info!(plan_id = %id, "lesson plan deleted");
    Ok(())
}

#[instrument(skip(conn))]
pub fn duplicate(conn: &Connection, id: &str) -> StoreResult<LessonPlan> {
    let source = get(conn, id)?;
    let copy = LessonPlan {
        id: new_id(),
        title: format!("{} (Copy)", source.title),
        created_at: now(),
        ..source
    };
    in_transaction(conn, |tx| insert_plan(tx, &copy))?;
    info!(source_id = %id, plan_id = %copy.id, "lesson plan duplicated");
    Ok(copy)
}

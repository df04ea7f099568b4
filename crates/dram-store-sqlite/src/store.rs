//! The SQLite implementation of [`TastingStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use dram_core::{
  assignment::{AggregatedDescriptor, DescriptorAssignment, SectionDescriptor},
  descriptor::{DescriptorId, DescriptorTerm, Section},
  rebuild::{RebuildOutput, RebuildRun, ReviewFlag},
  review::{NewReview, Review, ReviewId, ReviewText, SourceReview, Whiskey, WhiskeyId},
  store::TastingStore,
};

use crate::{
  encode::{
    RawAggregate, RawAssignment, RawDescriptor, RawFlag, RawReview, RawRun,
    RawSectionDescriptor, RawWhiskey, decode_count, encode_count, encode_date, encode_dt,
    encode_review_ids, encode_sections, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

const REVIEW_COLUMNS: &str = "review_id, whiskey_id, source_site, source_url, review_date, \
                              nose, palate, finish";

fn raw_review(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawReview> {
  Ok(RawReview {
    review_id:   row.get(0)?,
    whiskey_id:  row.get(1)?,
    source_site: row.get(2)?,
    source_url:  row.get(3)?,
    review_date: row.get(4)?,
    nose:        row.get(5)?,
    palate:      row.get(6)?,
    finish:      row.get(7)?,
  })
}

fn raw_whiskey(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawWhiskey> {
  Ok(RawWhiskey {
    whiskey_id: row.get(0)?,
    name:       row.get(1)?,
    distillery: row.get(2)?,
  })
}

fn raw_section_descriptor(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSectionDescriptor> {
  Ok(RawSectionDescriptor {
    descriptor_id: row.get(0)?,
    name:          row.get(1)?,
    review_count:  row.get(2)?,
  })
}

/// Rebuild runs (and their flags) kept after each commit; older ones are
/// pruned in the same transaction.
pub const RUN_HISTORY: usize = 10;

/// Case-insensitive identity of a whiskey name.
fn name_key(name: &str) -> String { name.trim().to_lowercase() }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dram store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn descriptor_exists(&self, name: String) -> Result<bool> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT 1 FROM descriptor_vocabulary WHERE descriptor_name = ?1",
                rusqlite::params![name],
                |_| Ok(true),
              )
              .optional()?
              .unwrap_or(false),
          )
        })
        .await?,
    )
  }
}

// ─── TastingStore impl ───────────────────────────────────────────────────────

impl TastingStore for SqliteStore {
  type Error = Error;

  // ── Vocabulary ────────────────────────────────────────────────────────────

  async fn add_descriptor(
    &self,
    name: String,
    sections: Vec<Section>,
  ) -> Result<DescriptorTerm> {
    // Validate before touching the database; the id is assigned below.
    let mut term = DescriptorTerm::new(DescriptorId(0), &name, sections)?;
    if self.descriptor_exists(term.name.clone()).await? {
      return Err(Error::DuplicateDescriptor(term.name));
    }

    let name_str     = term.name.clone();
    let sections_str = encode_sections(&term.applicable_sections)?;

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO descriptor_vocabulary (descriptor_name, applicable_sections, is_active)
           VALUES (?1, ?2, 1)",
          rusqlite::params![name_str, sections_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    term.descriptor_id = DescriptorId(id);
    Ok(term)
  }

  async fn deactivate_descriptor(&self, id: DescriptorId) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE descriptor_vocabulary SET is_active = 0 WHERE descriptor_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn list_active_descriptors(&self) -> Result<Vec<DescriptorTerm>> {
    let raws: Vec<RawDescriptor> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT descriptor_id, descriptor_name, applicable_sections, is_active
           FROM descriptor_vocabulary
           WHERE is_active = 1
           ORDER BY length(descriptor_name) DESC, descriptor_name, descriptor_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDescriptor {
              descriptor_id: row.get(0)?,
              name:          row.get(1)?,
              sections:      row.get(2)?,
              active:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDescriptor::into_term).collect()
  }

  // ── Whiskeys ──────────────────────────────────────────────────────────────

  async fn find_or_create_whiskey(
    &self,
    name: String,
    distillery: Option<String>,
  ) -> Result<Whiskey> {
    let key  = name_key(&name);
    let name = name.trim().to_owned();

    let raw: RawWhiskey = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT whiskey_id, name, distillery FROM whiskeys WHERE name_key = ?1",
            rusqlite::params![key],
            raw_whiskey,
          )
          .optional()?;
        if let Some(w) = existing {
          return Ok(w);
        }

        conn.execute(
          "INSERT INTO whiskeys (name, name_key, distillery) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, key, distillery],
        )?;
        Ok(RawWhiskey { whiskey_id: conn.last_insert_rowid(), name, distillery })
      })
      .await?;

    Ok(raw.into_whiskey())
  }

  async fn get_whiskey(&self, id: WhiskeyId) -> Result<Option<Whiskey>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT whiskey_id, name, distillery FROM whiskeys WHERE whiskey_id = ?1",
              rusqlite::params![id.0],
              raw_whiskey,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawWhiskey::into_whiskey))
  }

  async fn search_whiskeys(&self, query: String, limit: usize) -> Result<Vec<Whiskey>> {
    let needle = query.trim().to_lowercase();
    let limit  = encode_count(limit);

    let raws: Vec<RawWhiskey> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT whiskey_id, name, distillery FROM whiskeys
           WHERE instr(name_key, ?1) > 0
           ORDER BY name
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![needle, limit], raw_whiskey)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawWhiskey::into_whiskey).collect())
  }

  async fn count_whiskeys(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM whiskeys", [], |r| r.get(0))?)
      })
      .await?;
    Ok(decode_count(n))
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn add_review(&self, input: NewReview) -> Result<Review> {
    if self.get_whiskey(input.whiskey_id).await?.is_none() {
      return Err(Error::WhiskeyNotFound(input.whiskey_id));
    }

    let whiskey_id  = input.whiskey_id.0;
    let source_site = input.source_site.clone();
    let source_url  = input.source_url.clone();
    let review_date = input.review_date.map(encode_date);
    let text        = input.text.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reviews (
             whiskey_id, source_site, source_url, review_date, nose, palate, finish
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            whiskey_id,
            source_site,
            source_url,
            review_date,
            text.nose,
            text.palate,
            text.finish,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Review {
      review_id:   ReviewId(id),
      whiskey_id:  input.whiskey_id,
      source_site: input.source_site,
      source_url:  input.source_url,
      review_date: input.review_date,
      text:        input.text,
    })
  }

  async fn get_review_text(&self, id: ReviewId) -> Result<Option<ReviewText>> {
    let text = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT nose, palate, finish FROM reviews WHERE review_id = ?1",
              rusqlite::params![id.0],
              |row| {
                Ok(ReviewText {
                  nose:   row.get(0)?,
                  palate: row.get(1)?,
                  finish: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(text)
  }

  async fn list_reviews(&self) -> Result<Vec<Review>> {
    let raws: Vec<RawReview> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY review_id"))?;
        let rows = stmt
          .query_map([], raw_review)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }

  async fn review_whiskey_map(&self) -> Result<HashMap<ReviewId, WhiskeyId>> {
    let pairs: Vec<(i64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT review_id, whiskey_id FROM reviews")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      pairs
        .into_iter()
        .map(|(r, w)| (ReviewId(r), WhiskeyId(w)))
        .collect(),
    )
  }

  async fn source_reviews(&self, whiskey_id: WhiskeyId) -> Result<Vec<SourceReview>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT source_site, source_url FROM reviews
           WHERE whiskey_id = ?1 AND source_url IS NOT NULL
           ORDER BY source_site, source_url",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![whiskey_id.0], |row| {
            Ok(SourceReview { site: row.get(0)?, url: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  // ── Rebuild ───────────────────────────────────────────────────────────────

  async fn commit_rebuild(&self, output: RebuildOutput) -> Result<()> {
    let RebuildOutput { run, assignments, aggregates, flags } = output;

    let run_id_str   = encode_uuid(run.run_id);
    let started_str  = encode_dt(run.started_at);
    let finished_str = encode_dt(run.finished_at);
    let stats_str    = serde_json::to_string(&run.stats)?;

    let assignment_rows: Vec<(i64, i64, &'static str, f64, &'static str)> = assignments
      .iter()
      .map(|a| {
        (a.review_id.0, a.descriptor_id.0, a.section.as_str(), a.confidence, a.method.as_str())
      })
      .collect();

    let aggregate_rows = aggregates
      .iter()
      .map(|a| {
        Ok((
          a.whiskey_id.0,
          a.descriptor_id.0,
          a.section.as_str(),
          encode_count(a.review_count),
          encode_review_ids(&a.review_ids)?,
        ))
      })
      .collect::<Result<Vec<_>>>()?;

    let flag_rows: Vec<(i64, i64, f64, i64)> = flags
      .iter()
      .map(|f| {
        (f.review_id.0, f.whiskey_id.0, f.confidence, encode_count(f.descriptor_count))
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM aggregated_whiskey_descriptors", [])?;
        tx.execute("DELETE FROM review_descriptors", [])?;

        {
          let mut stmt = tx.prepare(
            "INSERT INTO review_descriptors (
               review_id, descriptor_id, tasting_section, confidence, extraction_method
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (review, descriptor, section, confidence, method) in &assignment_rows {
            stmt.execute(rusqlite::params![review, descriptor, section, confidence, method])?;
          }

          let mut stmt = tx.prepare(
            "INSERT INTO aggregated_whiskey_descriptors (
               whiskey_id, descriptor_id, tasting_section, review_count, review_ids
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (whiskey, descriptor, section, count, ids) in &aggregate_rows {
            stmt.execute(rusqlite::params![whiskey, descriptor, section, count, ids])?;
          }

          tx.execute(
            "INSERT INTO rebuild_runs (run_id, started_at, finished_at, stats)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![run_id_str, started_str, finished_str, stats_str],
          )?;

          let mut stmt = tx.prepare(
            "INSERT INTO review_flags (
               run_id, review_id, whiskey_id, confidence, descriptor_count
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (review, whiskey, confidence, count) in &flag_rows {
            stmt.execute(rusqlite::params![run_id_str, review, whiskey, confidence, count])?;
          }
        }

        let keep = encode_count(RUN_HISTORY);
        tx.execute(
          "DELETE FROM review_flags WHERE run_id NOT IN (
             SELECT run_id FROM rebuild_runs ORDER BY rowid DESC LIMIT ?1
           )",
          rusqlite::params![keep],
        )?;
        tx.execute(
          "DELETE FROM rebuild_runs WHERE run_id NOT IN (
             SELECT run_id FROM rebuild_runs ORDER BY rowid DESC LIMIT ?1
           )",
          rusqlite::params![keep],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      run_id = %run.run_id,
      assignments = assignments.len(),
      aggregates = aggregates.len(),
      flags = flags.len(),
      "rebuild committed"
    );
    Ok(())
  }

  async fn list_assignments(&self) -> Result<Vec<DescriptorAssignment>> {
    let raws: Vec<RawAssignment> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT review_id, descriptor_id, tasting_section, confidence, extraction_method
           FROM review_descriptors
           ORDER BY review_id, tasting_section, descriptor_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawAssignment {
              review_id:     row.get(0)?,
              descriptor_id: row.get(1)?,
              section:       row.get(2)?,
              confidence:    row.get(3)?,
              method:        row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  async fn latest_run(&self) -> Result<Option<RebuildRun>> {
    let raw = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT run_id, started_at, finished_at, stats FROM rebuild_runs
               ORDER BY rowid DESC LIMIT 1",
              [],
              |row| {
                Ok(RawRun {
                  run_id:      row.get(0)?,
                  started_at:  row.get(1)?,
                  finished_at: row.get(2)?,
                  stats:       row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRun::into_run).transpose()
  }

  async fn run_flags(&self, run_id: Uuid) -> Result<Vec<ReviewFlag>> {
    let id_str = encode_uuid(run_id);

    let raws: Vec<RawFlag> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT review_id, whiskey_id, confidence, descriptor_count
           FROM review_flags WHERE run_id = ?1
           ORDER BY confidence, review_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawFlag {
              review_id:        row.get(0)?,
              whiskey_id:       row.get(1)?,
              confidence:       row.get(2)?,
              descriptor_count: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawFlag::into_flag).collect())
  }

  // ── Aggregate reads ───────────────────────────────────────────────────────

  async fn whiskey_descriptors(
    &self,
    whiskey_id: WhiskeyId,
  ) -> Result<Vec<AggregatedDescriptor>> {
    let raws: Vec<RawAggregate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT whiskey_id, descriptor_id, tasting_section, review_count, review_ids
           FROM aggregated_whiskey_descriptors
           WHERE whiskey_id = ?1
           ORDER BY tasting_section, review_count DESC, descriptor_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![whiskey_id.0], |row| {
            Ok(RawAggregate {
              whiskey_id:    row.get(0)?,
              descriptor_id: row.get(1)?,
              section:       row.get(2)?,
              review_count:  row.get(3)?,
              review_ids:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAggregate::into_aggregate).collect()
  }

  async fn section_descriptors(
    &self,
    whiskey_id: WhiskeyId,
    section: Section,
  ) -> Result<Vec<SectionDescriptor>> {
    let section_str = section.as_str();

    let raws: Vec<RawSectionDescriptor> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.descriptor_id, v.descriptor_name, a.review_count
           FROM aggregated_whiskey_descriptors a
           JOIN descriptor_vocabulary v ON v.descriptor_id = a.descriptor_id
           WHERE a.whiskey_id = ?1 AND a.tasting_section = ?2
           ORDER BY a.review_count DESC, v.descriptor_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![whiskey_id.0, section_str], raw_section_descriptor)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawSectionDescriptor::into_section_descriptor)
        .collect(),
    )
  }

  async fn distractor_candidates(
    &self,
    whiskey_id: WhiskeyId,
    section: Section,
  ) -> Result<Vec<SectionDescriptor>> {
    let section_str = section.as_str();

    let raws: Vec<RawSectionDescriptor> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.descriptor_id, v.descriptor_name, SUM(a.review_count)
           FROM aggregated_whiskey_descriptors a
           JOIN descriptor_vocabulary v ON v.descriptor_id = a.descriptor_id
           WHERE a.tasting_section = ?2
             AND a.whiskey_id != ?1
             AND a.descriptor_id NOT IN (
               SELECT descriptor_id FROM aggregated_whiskey_descriptors
               WHERE whiskey_id = ?1 AND tasting_section = ?2
             )
           GROUP BY a.descriptor_id, v.descriptor_name
           ORDER BY v.descriptor_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![whiskey_id.0, section_str], raw_section_descriptor)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawSectionDescriptor::into_section_descriptor)
        .collect(),
    )
  }
}

//! JSON import formats for seeding the store.
//!
//! Vocabulary:
//!
//! ```json
//! [{ "name": "brown sugar", "sections": ["nose", "palate"] }]
//! ```
//!
//! Reviews (whiskeys are created on first mention):
//!
//! ```json
//! [{ "whiskey": "Lagavulin 16", "distillery": "Lagavulin",
//!    "source_site": "example.com", "source_url": "https://…",
//!    "review_date": "2024-03-01",
//!    "nose": "Peat | Smoke", "palate": "…", "finish": null }]
//! ```

use std::path::Path;

use anyhow::Context as _;
use chrono::NaiveDate;
use dram_core::{
  descriptor::Section,
  review::{NewReview, ReviewText},
  store::TastingStore,
};
use dram_store_sqlite::{Error as StoreError, SqliteStore};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct VocabularyEntry {
  pub name:     String,
  /// Every section when omitted.
  #[serde(default = "all_sections")]
  pub sections: Vec<Section>,
}

fn all_sections() -> Vec<Section> { Section::ALL.to_vec() }

#[derive(Debug, Deserialize)]
pub struct ReviewEntry {
  pub whiskey:     String,
  #[serde(default)]
  pub distillery:  Option<String>,
  pub source_site: String,
  #[serde(default)]
  pub source_url:  Option<String>,
  #[serde(default)]
  pub review_date: Option<NaiveDate>,
  #[serde(flatten)]
  pub text:        ReviewText,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub added:   usize,
  pub skipped: usize,
}

/// Add every entry; names already in the vocabulary are skipped.
pub async fn import_vocabulary(store: &SqliteStore, path: &Path) -> anyhow::Result<ImportSummary> {
  let entries: Vec<VocabularyEntry> = read_json(path)?;
  let mut summary = ImportSummary::default();

  for entry in entries {
    match store.add_descriptor(entry.name.clone(), entry.sections).await {
      Ok(_) => summary.added += 1,
      Err(StoreError::DuplicateDescriptor(name)) => {
        tracing::debug!(%name, "descriptor already present");
        summary.skipped += 1;
      }
      Err(e) => return Err(e).with_context(|| format!("adding descriptor {:?}", entry.name)),
    }
  }

  tracing::info!(added = summary.added, skipped = summary.skipped, "vocabulary imported");
  Ok(summary)
}

pub async fn import_reviews(store: &SqliteStore, path: &Path) -> anyhow::Result<ImportSummary> {
  let entries: Vec<ReviewEntry> = read_json(path)?;
  let mut summary = ImportSummary::default();

  for entry in entries {
    let whiskey = store
      .find_or_create_whiskey(entry.whiskey.clone(), entry.distillery)
      .await
      .with_context(|| format!("resolving whiskey {:?}", entry.whiskey))?;
    store
      .add_review(NewReview {
        whiskey_id:  whiskey.whiskey_id,
        source_site: entry.source_site,
        source_url:  entry.source_url,
        review_date: entry.review_date,
        text:        entry.text,
      })
      .await
      .context("adding review")?;
    summary.added += 1;
  }

  tracing::info!(added = summary.added, "reviews imported");
  Ok(summary)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write_temp(name: &str, body: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("dram-{}-{name}", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn vocabulary_sections_default_to_all() {
    let entries: Vec<VocabularyEntry> =
      serde_json::from_str(r#"[{"name":"oak"},{"name":"peat","sections":["nose"]}]"#).unwrap();
    assert_eq!(entries[0].sections, Section::ALL);
    assert_eq!(entries[1].sections, [Section::Nose]);
  }

  #[test]
  fn review_entry_flattens_text() {
    let entry: ReviewEntry = serde_json::from_str(
      r#"{"whiskey":"Talisker 10","source_site":"a.com","review_date":"2024-03-01",
          "nose":"Smoke | Pepper","finish":null}"#,
    )
    .unwrap();
    assert_eq!(entry.text.nose.as_deref(), Some("Smoke | Pepper"));
    assert_eq!(entry.text.palate, None);
    assert_eq!(entry.review_date, NaiveDate::from_ymd_opt(2024, 3, 1));
  }

  #[tokio::test]
  async fn import_vocabulary_skips_duplicates() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let path = write_temp(
      "vocab.json",
      r#"[{"name":"oak"},{"name":"Oak"},{"name":"brown sugar","sections":["nose"]}]"#,
    );

    let summary = import_vocabulary(&store, &path).await.unwrap();
    assert_eq!(summary, ImportSummary { added: 2, skipped: 1 });
    assert_eq!(store.list_active_descriptors().await.unwrap().len(), 2);
    std::fs::remove_file(path).ok();
  }

  #[tokio::test]
  async fn import_reviews_creates_whiskeys_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let path = write_temp(
      "reviews.json",
      r#"[
        {"whiskey":"Talisker 10","source_site":"a.com","nose":"Smoke"},
        {"whiskey":"talisker 10","source_site":"b.com","palate":"Pepper | Brine"}
      ]"#,
    );

    let summary = import_reviews(&store, &path).await.unwrap();
    assert_eq!(summary.added, 2);
    assert_eq!(store.count_whiskeys().await.unwrap(), 1);
    assert_eq!(store.list_reviews().await.unwrap().len(), 2);
    std::fs::remove_file(path).ok();
  }

  #[tokio::test]
  async fn malformed_file_is_an_error() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let path = write_temp("bad.json", "{not json");
    assert!(import_reviews(&store, &path).await.is_err());
    std::fs::remove_file(path).ok();
  }
}

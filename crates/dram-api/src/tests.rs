//! Router tests against an in-memory store seeded through a real rebuild.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use dram_core::{
  descriptor::Section,
  review::{NewReview, ReviewText, WhiskeyId},
  store::TastingStore,
};
use dram_extract::{MatcherOptions, Vocabulary};
use dram_store_sqlite::SqliteStore;
use serde_json::Value;
use tower::ServiceExt as _;

use crate::api_router;

struct Seeded {
  router:  Router,
  islay:   WhiskeyId,
  bourbon: WhiskeyId,
  unrated: WhiskeyId,
}

async fn add_review(s: &SqliteStore, whiskey_id: WhiskeyId, site: &str, text: ReviewText) {
  s.add_review(NewReview {
    whiskey_id,
    source_site: site.into(),
    source_url: Some(format!("https://{site}/{whiskey_id}")),
    review_date: None,
    text,
  })
  .await
  .unwrap();
}

fn pipes(nose: &str, palate: &str, finish: &str) -> ReviewText {
  ReviewText {
    nose:   Some(nose.into()),
    palate: Some(palate.into()),
    finish: Some(finish.into()),
  }
}

async fn seeded() -> Seeded {
  let s = SqliteStore::open_in_memory().await.unwrap();
  for name in [
    "peat", "smoke", "iodine", "brine", "oak", "vanilla", "caramel", "brown sugar",
    "sugar", "cherry", "pepper", "honey", "leather", "tobacco", "citrus",
  ] {
    s.add_descriptor(name.into(), Section::ALL.to_vec()).await.unwrap();
  }

  let islay = s
    .find_or_create_whiskey("Lagavulin 16".into(), Some("Lagavulin".into()))
    .await
    .unwrap()
    .whiskey_id;
  let bourbon = s
    .find_or_create_whiskey("Cowboy Bourbon (2025)".into(), None)
    .await
    .unwrap()
    .whiskey_id;
  let unrated = s
    .find_or_create_whiskey("Lagavulin 8".into(), None)
    .await
    .unwrap()
    .whiskey_id;

  add_review(&s, islay, "alpha.com", pipes(
    "Peat | Smoke | Iodine",
    "Brine | Smoke",
    "Smoke | Leather",
  ))
  .await;
  add_review(&s, islay, "beta.com", pipes("Smoke | Peat", "Pepper | Brine", "Tobacco"))
    .await;
  add_review(&s, bourbon, "alpha.com", pipes(
    "Brown sugar | Vanilla | Cherry",
    "Caramel | Oak | Honey",
    "Oak | Citrus",
  ))
  .await;
  // Only a nose section: never quizzable.
  add_review(&s, unrated, "alpha.com", ReviewText {
    nose: Some("Peat | Smoke".into()),
    ..Default::default()
  })
  .await;

  let vocabulary = Vocabulary::new(s.list_active_descriptors().await.unwrap()).unwrap();
  let reviews = s.list_reviews().await.unwrap();
  let map = s.review_whiskey_map().await.unwrap();
  let output =
    dram_extract::rebuild(&vocabulary, &reviews, &map, &MatcherOptions::default()).unwrap();
  s.commit_rebuild(output).await.unwrap();

  Seeded { router: api_router(Arc::new(s)), islay, bourbon, unrated }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
  let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap())
}

// ── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_whiskey_count() {
  let s = seeded().await;
  let (status, body) = get(&s.router, "/health").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
  assert_eq!(body["database"], "connected");
  assert_eq!(body["whiskeys"], 3);
}

// ── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_requires_query() {
  let s = seeded().await;
  for uri in ["/whiskeys/search", "/whiskeys/search?q=", "/whiskeys/search?q=%20%20"] {
    let (status, body) = get(&s.router, uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    assert!(body["error"].as_str().unwrap().contains("'q'"));
  }
}

#[tokio::test]
async fn search_returns_slugged_hits() {
  let s = seeded().await;
  let (status, body) = get(&s.router, "/whiskeys/search?q=bourbon").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["query"], "bourbon");
  assert_eq!(body["count"], 1);
  assert_eq!(body["results"][0]["slug"], "cowboy-bourbon-2025");
  assert_eq!(body["results"][0]["whiskey_id"], s.bourbon.0);

  let (_, body) = get(&s.router, "/whiskeys/search?q=lagavulin&limit=1").await;
  assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn search_with_huge_limit_still_limits() {
  let s = seeded().await;
  let (status, body) =
    get(&s.router, "/whiskeys/search?q=lagavulin&limit=18446744073709551615").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["count"], 2);
}

// ── Descriptors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn descriptors_include_provenance() {
  let s = seeded().await;
  let (status, body) = get(&s.router, &format!("/whiskeys/{}/descriptors", s.islay)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["whiskey"]["name"], "Lagavulin 16");

  let smoke_nose = body["descriptors"]
    .as_array()
    .unwrap()
    .iter()
    .find(|d| d["section"] == "nose" && d["review_count"] == 2)
    .expect("a nose descriptor cited by both reviews");
  assert_eq!(smoke_nose["review_ids"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn descriptors_for_unknown_whiskey_is_404() {
  let s = seeded().await;
  let (status, body) = get(&s.router, "/whiskeys/999/descriptors").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}

// ── Quiz ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn quiz_has_three_sections_with_correct_answers() {
  let s = seeded().await;
  let (status, body) = get(&s.router, &format!("/quiz/{}", s.islay)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["whiskey"]["id"], s.islay.0);
  assert_eq!(body["whiskey"]["distillery"], "Lagavulin");

  for section in ["nose", "palate", "finish"] {
    let q = &body["quiz"][section];
    let options = q["options"].as_array().unwrap();
    let correct = options.iter().filter(|o| o["correct"] == true).count();
    assert!(correct >= 1, "{section}");
    assert_eq!(q["correct_count"], correct as u64, "{section}");
    assert!(options.len() <= crate::quiz::OPTIONS_PER_SECTION);
  }

  // Nose: peat, smoke, iodine are correct; bourbon notes are the distractors.
  let nose = body["quiz"]["nose"]["options"].as_array().unwrap();
  let correct: Vec<&str> = nose
    .iter()
    .filter(|o| o["correct"] == true)
    .map(|o| o["name"].as_str().unwrap())
    .collect();
  assert_eq!(correct.len(), 3);
  assert!(nose.iter().any(|o| o["name"] == "vanilla" && o["correct"] == false));

  let sites: Vec<&str> = body["source_reviews"]
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["site"].as_str().unwrap())
    .collect();
  assert_eq!(sites, ["alpha.com", "beta.com"]);
}

#[tokio::test]
async fn quiz_for_unknown_whiskey_is_404() {
  let s = seeded().await;
  let (status, _) = get(&s.router, "/quiz/999").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quiz_with_missing_section_is_404() {
  let s = seeded().await;
  let (status, body) = get(&s.router, &format!("/quiz/{}", s.unrated)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("palate"));
}

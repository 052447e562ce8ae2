//! Catalog loader: turns lesson, video and admin-authored records into one
//! canonical `CatalogItem` shape.
//!
//! Each field is resolved through an ordered list of `Rule`s; the first rule
//! producing a non-empty string wins. Raw record shapes never leave this module.
//!
//! Source order is lessons -> videos -> admin. When an id repeats, the later
//! record replaces the earlier one in place (catalog position is kept).

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::{Collections, VideoRouteStyle};
use crate::domain::{CatalogItem, Level};
use crate::error::{AppError, Result};
use crate::store::{Document, DocumentStore};
use crate::util::capitalize;

/// One extraction step for a text field.
#[derive(Clone, Copy, Debug)]
pub enum Rule {
  /// Top-level string field.
  Field(&'static str),
  /// String field inside a nested object, e.g. `introduction.title`.
  Nested(&'static str, &'static str),
}

impl Rule {
  fn apply<'a>(&self, doc: &'a Document) -> Option<&'a str> {
    match *self {
      Rule::Field(key) => doc.str_field(key),
      Rule::Nested(outer, inner) => doc
        .data
        .get(outer)
        .and_then(Value::as_object)
        .and_then(|o| o.get(inner))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty()),
    }
  }
}

/// First non-empty value produced by `rules`, in order.
pub fn resolve(doc: &Document, rules: &[Rule]) -> Option<String> {
  rules.iter().find_map(|r| r.apply(doc)).map(str::to_string)
}

const LESSON_TITLE: &[Rule] = &[Rule::Field("title"), Rule::Nested("introduction", "title")];
const LESSON_DESCRIPTION: &[Rule] = &[
  Rule::Nested("introduction", "summary"),
  Rule::Nested("introduction", "description"),
  Rule::Field("description"),
  Rule::Field("summary"),
];
const DEFAULT_CATEGORY: &str = "general";

/// Which collection a record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
  Lesson,
  Video,
  Admin,
}

/// Counters describing one catalog load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
  pub lessons: usize,
  pub videos: usize,
  pub admin: usize,
  /// Admin records skipped because they are not published.
  pub unpublished: usize,
  /// Records whose level was not recognized; they are kept and ranked as A1.
  pub invalid: usize,
  /// Ids seen more than once; the later record replaced the earlier one.
  pub duplicates: usize,
}

fn parse_level(doc: &Document) -> Result<Level> {
  match doc.str_field("level") {
    Some(raw) => raw.parse(),
    None => Ok(Level::default()),
  }
}

/// A1 when the level is missing or unrecognized.
fn level_or_default(doc: &Document) -> Level {
  parse_level(doc).unwrap_or_default()
}

pub fn lesson_item(doc: &Document) -> CatalogItem {
  let module_id = doc.str_field("moduleId").unwrap_or(DEFAULT_CATEGORY);
  let title = resolve(doc, LESSON_TITLE).unwrap_or_else(|| format!("Lesson {}", doc.id));
  let description =
    resolve(doc, LESSON_DESCRIPTION).unwrap_or_else(|| format!("Learn {}", title.to_lowercase()));
  CatalogItem {
    id: doc.id.clone(),
    category: capitalize(module_id),
    level: level_or_default(doc),
    description,
    kind: "lesson".into(),
    route: format!("/lesson/{}/{}", module_id, doc.id),
    title,
  }
}

pub fn video_item(doc: &Document, style: VideoRouteStyle) -> CatalogItem {
  let category = doc.str_field("category").unwrap_or(DEFAULT_CATEGORY);
  let title = resolve(doc, &[Rule::Field("title")]).unwrap_or_else(|| format!("Video {}", doc.id));
  let description =
    resolve(doc, &[Rule::Field("description")]).unwrap_or_else(|| format!("Watch {}", title.to_lowercase()));
  let route = match style {
    VideoRouteStyle::Flat => format!("/videos/{}", doc.id),
    VideoRouteStyle::ModuleScoped => format!("/modules/{}/video/{}", category, doc.id),
  };
  CatalogItem {
    id: doc.id.clone(),
    category: capitalize(category),
    level: level_or_default(doc),
    description,
    kind: "video".into(),
    route,
    title,
  }
}

/// `None` for records that are not published.
pub fn admin_item(doc: &Document) -> Option<CatalogItem> {
  if doc.str_field("status") != Some("published") {
    return None;
  }
  let category = doc.str_field("category").unwrap_or(DEFAULT_CATEGORY);
  Some(CatalogItem {
    id: doc.id.clone(),
    title: resolve(doc, &[Rule::Field("title")]).unwrap_or_else(|| "Untitled".into()),
    category: capitalize(category),
    level: level_or_default(doc),
    description: resolve(doc, &[Rule::Field("description")]).unwrap_or_default(),
    kind: resolve(doc, &[Rule::Field("type")]).unwrap_or_else(|| "lesson".into()),
    route: format!("/modules/{}/content/{}", category, doc.id),
  })
}

/// Accumulates items across sources, applying the duplicate-id policy.
#[derive(Default)]
pub struct CatalogBuilder {
  items: Vec<CatalogItem>,
  index: HashMap<String, usize>,
  report: LoadReport,
}

impl CatalogBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Convert and add one raw record.
  pub fn push_record(&mut self, source: Source, doc: &Document, style: VideoRouteStyle) {
    let converted = match source {
      Source::Lesson => Some(lesson_item(doc)),
      Source::Video => Some(video_item(doc, style)),
      Source::Admin => admin_item(doc),
    };
    let Some(item) = converted else {
      self.report.unpublished += 1;
      debug!(target: "catalog", id = %doc.id, "Skipping unpublished admin item");
      return;
    };
    if let Err(e) = parse_level(doc) {
      self.report.invalid += 1;
      warn!(target: "catalog", id = %doc.id, ?source, error = %e, "Unrecognized catalog level; ranking as A1");
    }
    match source {
      Source::Lesson => self.report.lessons += 1,
      Source::Video => self.report.videos += 1,
      Source::Admin => self.report.admin += 1,
    }
    debug!(target: "catalog", id = %item.id, route = %item.route, "Catalog item loaded");
    self.insert(item);
  }

  fn insert(&mut self, item: CatalogItem) {
    match self.index.get(&item.id) {
      Some(&pos) => {
        self.report.duplicates += 1;
        warn!(target: "catalog", id = %item.id, "Duplicate catalog id; later record replaces earlier one");
        self.items[pos] = item;
      }
      None => {
        self.index.insert(item.id.clone(), self.items.len());
        self.items.push(item);
      }
    }
  }

  /// Fails with `EmptyCatalog` when nothing survived.
  pub fn finish(self) -> Result<(Vec<CatalogItem>, LoadReport)> {
    if self.items.is_empty() {
      return Err(AppError::EmptyCatalog);
    }
    Ok((self.items, self.report))
  }
}

/// Read all three sources from the store and build the catalog.
#[instrument(level = "info", skip_all, fields(store = store.name()))]
pub async fn load_catalog(
  store: &dyn DocumentStore,
  collections: &Collections,
  style: VideoRouteStyle,
) -> Result<(Vec<CatalogItem>, LoadReport)> {
  let mut builder = CatalogBuilder::new();
  let sources = [
    (Source::Lesson, &collections.lessons),
    (Source::Video, &collections.videos),
    (Source::Admin, &collections.admin_content),
  ];
  for (source, collection) in sources {
    for doc in store.list(collection).await? {
      builder.push_record(source, &doc, style);
    }
  }
  let (items, report) = builder.finish()?;
  info!(
    target: "catalog",
    total = items.len(),
    lessons = report.lessons,
    videos = report.videos,
    admin = report.admin,
    unpublished = report.unpublished,
    invalid = report.invalid,
    duplicates = report.duplicates,
    "Catalog loaded"
  );
  Ok((items, report))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use serde_json::json;

  fn doc(id: &str, v: Value) -> Document {
    match v {
      Value::Object(m) => Document::new(id, m),
      _ => unreachable!(),
    }
  }

  #[test]
  fn lesson_title_falls_back_through_rules() {
    let explicit = lesson_item(&doc("l1", json!({"title": "Top", "introduction": {"title": "Intro"}})));
    assert_eq!(explicit.title, "Top");

    let nested = lesson_item(&doc("l2", json!({"title": "", "introduction": {"title": "Intro"}})));
    assert_eq!(nested.title, "Intro");

    let synthesized = lesson_item(&doc("l3", json!({"moduleId": "grammar"})));
    assert_eq!(synthesized.title, "Lesson l3");
    assert_eq!(synthesized.description, "Learn lesson l3");
  }

  #[test]
  fn lesson_description_prefers_introduction() {
    let d = doc("l1", json!({
      "introduction": {"description": "intro desc"},
      "description": "top desc",
      "summary": "top summary"
    }));
    assert_eq!(lesson_item(&d).description, "intro desc");

    let d = doc("l2", json!({"summary": "top summary"}));
    assert_eq!(lesson_item(&d).description, "top summary");
  }

  #[test]
  fn lesson_shape_uses_module_id() {
    let item = lesson_item(&doc("g1", json!({"moduleId": "grammar", "level": "a2"})));
    assert_eq!(item.category, "Grammar");
    assert_eq!(item.level, Level::A2);
    assert_eq!(item.kind, "lesson");
    assert_eq!(item.route, "/lesson/grammar/g1");

    let general = lesson_item(&doc("x", json!({})));
    assert_eq!(general.category, "General");
    assert_eq!(general.level, Level::A1);
    assert_eq!(general.route, "/lesson/general/x");
  }

  #[test]
  fn video_route_follows_configured_style() {
    let d = doc("v1", json!({"title": "Idioms", "category": "vocabulary", "level": "B2"}));
    let flat = video_item(&d, VideoRouteStyle::Flat);
    assert_eq!(flat.route, "/videos/v1");
    assert_eq!(flat.category, "Vocabulary");
    assert_eq!(flat.description, "Watch idioms");
    let scoped = video_item(&d, VideoRouteStyle::ModuleScoped);
    assert_eq!(scoped.route, "/modules/vocabulary/video/v1");
  }

  #[test]
  fn admin_items_require_published_status() {
    assert!(admin_item(&doc("a1", json!({"status": "draft", "title": "x"}))).is_none());
    assert!(admin_item(&doc("a2", json!({"title": "x"}))).is_none());

    let item = admin_item(&doc("a3", json!({"status": "published", "category": "reading", "type": "article"}))).unwrap();
    assert_eq!(item.title, "Untitled");
    assert_eq!(item.kind, "article");
    assert_eq!(item.description, "");
    assert_eq!(item.route, "/modules/reading/content/a3");
  }

  #[test]
  fn unrecognized_level_is_kept_and_ranked_as_a1() {
    assert_eq!(lesson_item(&doc("l1", json!({"level": "intermediate"}))).level, Level::A1);

    let mut b = CatalogBuilder::new();
    b.push_record(Source::Lesson, &doc("l1", json!({"level": "Beginner"})), VideoRouteStyle::Flat);
    b.push_record(Source::Video, &doc("v1", json!({"level": "B1"})), VideoRouteStyle::Flat);
    b.push_record(Source::Admin, &doc("a1", json!({"status": "published", "level": "expert"})), VideoRouteStyle::Flat);
    let (items, report) = b.finish().unwrap();
    let ids: Vec<_> = items.iter().map(|i| (i.id.as_str(), i.level)).collect();
    assert_eq!(ids, vec![("l1", Level::A1), ("v1", Level::B1), ("a1", Level::A1)]);
    assert_eq!(report.invalid, 2);
    assert_eq!((report.lessons, report.videos, report.admin), (1, 1, 1));
  }

  #[test]
  fn unpublished_record_with_bad_level_is_not_counted_invalid() {
    let mut b = CatalogBuilder::new();
    b.push_record(Source::Admin, &doc("a1", json!({"status": "draft", "level": "expert"})), VideoRouteStyle::Flat);
    b.push_record(Source::Lesson, &doc("l1", json!({})), VideoRouteStyle::Flat);
    let (_, report) = b.finish().unwrap();
    assert_eq!(report.unpublished, 1);
    assert_eq!(report.invalid, 0);
  }

  #[test]
  fn later_duplicate_replaces_in_place() {
    let mut b = CatalogBuilder::new();
    let style = VideoRouteStyle::Flat;
    b.push_record(Source::Lesson, &doc("shared", json!({"title": "From lessons"})), style);
    b.push_record(Source::Lesson, &doc("other", json!({"title": "Other"})), style);
    b.push_record(Source::Video, &doc("shared", json!({"title": "From videos"})), style);
    let (items, report) = b.finish().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "shared");
    assert_eq!(items[0].title, "From videos");
    assert_eq!(items[0].kind, "video");
    assert_eq!(report.duplicates, 1);
  }

  #[test]
  fn empty_builder_signals_empty_catalog() {
    let mut b = CatalogBuilder::new();
    b.push_record(Source::Admin, &doc("a1", json!({"status": "archived"})), VideoRouteStyle::Flat);
    assert!(matches!(b.finish(), Err(AppError::EmptyCatalog)));
  }

  #[tokio::test]
  async fn load_catalog_reads_all_sources_in_order() {
    let store = MemoryStore::from_json(json!({
      "lessonContent": { "g1": {"moduleId": "grammar", "introduction": {"title": "Present Simple"}} },
      "videos": { "v1": {"title": "Idioms", "category": "vocabulary", "level": "B2"} },
      "adminContent": {
        "a1": {"status": "published", "title": "Short Stories", "category": "reading"},
        "a2": {"status": "draft", "title": "WIP"}
      }
    }))
    .unwrap();

    let (items, report) = load_catalog(&store, &Collections::default(), VideoRouteStyle::Flat).await.unwrap();
    assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["g1", "v1", "a1"]);
    assert_eq!(report, LoadReport { lessons: 1, videos: 1, admin: 1, unpublished: 1, invalid: 0, duplicates: 0 });
  }

  #[tokio::test]
  async fn load_catalog_fails_on_empty_store() {
    let store = MemoryStore::default();
    let res = load_catalog(&store, &Collections::default(), VideoRouteStyle::Flat).await;
    assert!(matches!(res, Err(AppError::EmptyCatalog)));
  }
}

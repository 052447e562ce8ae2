//! Text blobs fed to the vectorizer, for catalog items and learner queries.

use crate::domain::{CatalogItem, LearnerProfile};

/// `"{title} {title} {category} {level} {description}"`.
/// The title appears twice so it weighs double under term counting.
pub fn item_text(item: &CatalogItem) -> String {
  format!(
    "{title} {title} {category} {level} {description}",
    title = item.title,
    category = item.category,
    level = item.level,
    description = item.description,
  )
}

/// Level token three times, then every goal twice, in goal order.
pub fn query_text(profile: &LearnerProfile) -> String {
  let level = profile.level.as_str();
  let mut parts: Vec<&str> = vec![level; 3];
  for goal in &profile.goals {
    parts.push(goal);
    parts.push(goal);
  }
  parts.join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Level;

  #[test]
  fn item_text_doubles_title() {
    let item = CatalogItem {
      id: "g1".into(),
      title: "Present Simple".into(),
      category: "Grammar".into(),
      level: Level::A1,
      description: "Basic tense".into(),
      kind: "lesson".into(),
      route: "/lesson/grammar/g1".into(),
    };
    assert_eq!(item_text(&item), "Present Simple Present Simple Grammar A1 Basic tense");
  }

  #[test]
  fn empty_description_leaves_trailing_space() {
    let item = CatalogItem {
      id: "x".into(),
      title: "T".into(),
      category: "C".into(),
      level: Level::B2,
      description: String::new(),
      kind: "video".into(),
      route: "/videos/x".into(),
    };
    assert_eq!(item_text(&item), "T T C B2 ");
  }

  #[test]
  fn query_keeps_duplicate_goals() {
    let profile = LearnerProfile {
      level: Level::B1,
      goals: vec!["Grammar".into(), "Reading".into(), "Grammar".into()],
      ..Default::default()
    };
    assert_eq!(query_text(&profile), "B1 B1 B1 Grammar Grammar Reading Reading Grammar Grammar");
  }

  #[test]
  fn query_without_goals_is_level_only() {
    assert_eq!(query_text(&LearnerProfile::default()), "A1 A1 A1");
  }
}

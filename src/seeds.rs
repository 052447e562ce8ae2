//! Built-in demo documents so the service is usable without a fixture file
//! or a remote store.

use serde_json::{json, Value};

/// Collections in the same shape the remote store holds them.
pub fn seed_documents() -> Value {
  json!({
    "lessonContent": {
      "grammar-present-simple": {
        "moduleId": "grammar",
        "level": "A1",
        "introduction": {
          "title": "Present Simple Tense",
          "summary": "Talk about habits and daily routines with the present simple."
        }
      },
      "grammar-past-simple": {
        "moduleId": "grammar",
        "level": "A2",
        "introduction": {
          "title": "Past Simple Tense",
          "summary": "Describe finished actions in the past."
        }
      },
      "vocabulary-common-verbs": {
        "moduleId": "vocabulary",
        "level": "A1",
        "introduction": { "title": "Common Verbs" },
        "description": "Essential everyday verbs."
      },
      "reading-short-stories": {
        "moduleId": "reading",
        "level": "A1",
        "title": "Short Stories"
      },
      "writing-opinion-essay": {
        "moduleId": "writing",
        "level": "B2",
        "introduction": {
          "title": "Opinion Essays",
          "description": "Structure an argument and support it with examples."
        }
      }
    },
    "videos": {
      "video-idioms": {
        "title": "English Idioms",
        "category": "vocabulary",
        "level": "B2",
        "description": "Idioms native speakers use every day."
      },
      "video-listening-cafe": {
        "title": "At the Cafe",
        "category": "listening",
        "level": "A2"
      }
    },
    "adminContent": {
      "admin-phrasal-verbs": {
        "status": "published",
        "title": "Phrasal Verbs in Context",
        "category": "vocabulary",
        "level": "B1",
        "description": "Learn phrasal verbs through short dialogues.",
        "type": "lesson"
      },
      "admin-draft-conditionals": {
        "status": "draft",
        "title": "Conditionals (draft)",
        "category": "grammar",
        "level": "B1"
      }
    },
    "users": {
      "demo-learner": {
        "quizLevel": "A1",
        "learningGoals": ["Grammar", "Vocabulary"]
      },
      "demo-advanced": {
        "quizLevel": "B2",
        "learningGoals": ["Writing"]
      }
    },
    "userProgress": {
      "demo-learner": {
        "completedLessons": ["grammar-present-simple"]
      }
    }
  })
}

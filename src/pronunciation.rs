//! Pronunciation scoring: compare a recognized utterance with the target
//! sentence using a matching-blocks similarity ratio, then bucket the score
//! and list word-level differences.
//!
//! Stateless; independent of the recommender.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// How many missing / extra words are reported in the detail lines.
const DETAIL_WORDS: usize = 3;
/// Sequences at least this long ignore characters that are too common.
const POPULAR_MIN_LEN: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PronunciationLevel {
  Excellent,
  Good,
  Fair,
  NeedsImprovement,
  Poor,
}

impl PronunciationLevel {
  pub fn from_score(score: u8) -> Self {
    match score {
      90..=u8::MAX => Self::Excellent,
      80..=89 => Self::Good,
      70..=79 => Self::Fair,
      60..=69 => Self::NeedsImprovement,
      _ => Self::Poor,
    }
  }

  pub fn feedback(self) -> &'static str {
    match self {
      Self::Excellent => "Excellent pronunciation! Very clear and accurate.",
      Self::Good => "Good job! Your pronunciation is clear and understandable.",
      Self::Fair => "Fair attempt. Try to pronounce each word more clearly.",
      Self::NeedsImprovement => "Needs improvement. Focus on clarity and correct pronunciation.",
      Self::Poor => "Keep practicing! Listen to the model sentence again and try to match it.",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
  pub score: u8,
  pub level: PronunciationLevel,
  pub feedback: String,
  pub detail: Vec<String>,
  pub missing_words: Vec<String>,
  pub extra_words: Vec<String>,
  pub similarity: f64,
}

/// Score `user_text` against `target_text`.
pub fn score(user_text: &str, target_text: &str) -> ScoreResult {
  let similarity = similarity(user_text, target_text);
  let score = (similarity * 100.0).floor().clamp(0.0, 100.0) as u8;
  let level = PronunciationLevel::from_score(score);
  let (missing_words, extra_words) = word_diff(user_text, target_text);

  let mut detail = Vec::new();
  if !missing_words.is_empty() {
    detail.push(format!("Missing words: {}", head(&missing_words).join(", ")));
  }
  if !extra_words.is_empty() {
    detail.push(format!("Extra words detected: {}", head(&extra_words).join(", ")));
  }
  if detail.is_empty() {
    detail.push("Word choice is accurate!".to_string());
  }

  ScoreResult { score, level, feedback: level.feedback().to_string(), detail, missing_words, extra_words, similarity }
}

fn head(words: &[String]) -> &[String] {
  &words[..words.len().min(DETAIL_WORDS)]
}

/// Similarity of the lowercased, trimmed strings in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
  let a: Vec<char> = a.trim().to_lowercase().chars().collect();
  let b: Vec<char> = b.trim().to_lowercase().chars().collect();
  ratio(&a, &b)
}

/// `2 * M / T` where M is the total size of the matching blocks.
pub fn ratio(a: &[char], b: &[char]) -> f64 {
  let total = a.len() + b.len();
  if total == 0 {
    return 1.0;
  }
  let matches: usize = Matcher::new(a, b).matching_blocks().iter().map(|&(_, _, size)| size).sum();
  2.0 * matches as f64 / total as f64
}

/// Words of `target` absent from `user` (target order) and words of `user`
/// absent from `target` (user order). Repeats are kept.
pub fn word_diff(user: &str, target: &str) -> (Vec<String>, Vec<String>) {
  let user_lower = user.to_lowercase();
  let target_lower = target.to_lowercase();
  let user_words: Vec<&str> = user_lower.split_whitespace().collect();
  let target_words: Vec<&str> = target_lower.split_whitespace().collect();
  let user_set: HashSet<&str> = user_words.iter().copied().collect();
  let target_set: HashSet<&str> = target_words.iter().copied().collect();

  let missing = target_words.iter().filter(|w| !user_set.contains(*w)).map(|w| w.to_string()).collect();
  let extra = user_words.iter().filter(|w| !target_set.contains(*w)).map(|w| w.to_string()).collect();
  (missing, extra)
}

/// Longest-common-block matcher (Ratcliff/Obershelp).
struct Matcher<'a> {
  a: &'a [char],
  b: &'a [char],
  b2j: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
  fn new(a: &'a [char], b: &'a [char]) -> Self {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
      b2j.entry(c).or_default().push(j);
    }
    if b.len() >= POPULAR_MIN_LEN {
      let limit = b.len() / 100 + 1;
      b2j.retain(|_, idxs| idxs.len() <= limit);
    }
    Self { a, b, b2j }
  }

  /// Longest block a[i..i+k] == b[j..j+k] in the given window, earliest in a
  /// then earliest in b on ties.
  fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0);
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for i in alo..ahi {
      let mut next: HashMap<usize, usize> = HashMap::new();
      if let Some(js) = self.b2j.get(&self.a[i]) {
        for &j in js {
          if j < blo {
            continue;
          }
          if j >= bhi {
            break;
          }
          let k = j.checked_sub(1).and_then(|p| j2len.get(&p)).copied().unwrap_or(0) + 1;
          next.insert(j, k);
          if k > bestsize {
            besti = i + 1 - k;
            bestj = j + 1 - k;
            bestsize = k;
          }
        }
      }
      j2len = next;
    }

    // popular characters were left out of b2j; grow the block through them
    while besti > alo && bestj > blo && self.a[besti - 1] == self.b[bestj - 1] {
      besti -= 1;
      bestj -= 1;
      bestsize += 1;
    }
    while besti + bestsize < ahi && bestj + bestsize < bhi && self.a[besti + bestsize] == self.b[bestj + bestsize] {
      bestsize += 1;
    }
    (besti, bestj, bestsize)
  }

  fn matching_blocks(&self) -> Vec<(usize, usize, usize)> {
    let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
    let mut blocks = Vec::new();
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
      let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
      if k == 0 {
        continue;
      }
      blocks.push((i, j, k));
      if alo < i && blo < j {
        queue.push((alo, i, blo, j));
      }
      if i + k < ahi && j + k < bhi {
        queue.push((i + k, ahi, j + k, bhi));
      }
    }
    blocks.sort_unstable();
    blocks
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
  }

  #[test]
  fn identical_sentences_score_full_marks() {
    let r = score("hello world", "hello world");
    assert_eq!(r.score, 100);
    assert_eq!(r.level, PronunciationLevel::Excellent);
    assert_eq!(r.detail, vec!["Word choice is accurate!"]);
  }

  #[test]
  fn case_and_outer_whitespace_are_ignored() {
    assert_eq!(score("  Hello World ", "hello world").score, 100);
  }

  #[test]
  fn empty_attempt_is_poor() {
    let r = score("", "hello");
    assert_eq!(r.score, 0);
    assert_eq!(r.level, PronunciationLevel::Poor);
    assert_eq!(r.detail, vec!["Missing words: hello"]);
  }

  #[test]
  fn near_miss_scores_between_sixty_and_hundred() {
    let r = score("hello world", "hello word");
    assert!(r.score > 60 && r.score < 100, "score {}", r.score);
    // 2 * 10 / 21
    assert_eq!(r.score, 95);
    assert_eq!(r.missing_words, vec!["word"]);
    assert_eq!(r.extra_words, vec!["world"]);
  }

  #[test]
  fn missing_word_detected_in_target_order() {
    let r = score("the fox", "the quick fox");
    assert_eq!(r.missing_words, vec!["quick"]);
    assert!(r.extra_words.is_empty());
    assert_eq!(r.detail, vec!["Missing words: quick"]);
  }

  #[test]
  fn detail_lists_at_most_three_words() {
    let r = score("one two three four five", "alpha beta gamma delta");
    assert_eq!(r.detail[0], "Missing words: alpha, beta, gamma");
    assert_eq!(r.detail[1], "Extra words detected: one, two, three");
    assert_eq!(r.missing_words.len(), 4);
  }

  #[test]
  fn buckets_follow_thresholds() {
    assert_eq!(PronunciationLevel::from_score(90), PronunciationLevel::Excellent);
    assert_eq!(PronunciationLevel::from_score(89), PronunciationLevel::Good);
    assert_eq!(PronunciationLevel::from_score(70), PronunciationLevel::Fair);
    assert_eq!(PronunciationLevel::from_score(60), PronunciationLevel::NeedsImprovement);
    assert_eq!(PronunciationLevel::from_score(59), PronunciationLevel::Poor);
  }

  #[test]
  fn ratio_matches_known_values() {
    assert_eq!(ratio(&[], &[]), 1.0);
    assert!((ratio(&chars("abcd"), &chars("bcde")) - 0.75).abs() < 1e-12);
    // "abxcd" vs "abcd": blocks "ab" + "cd"
    assert!((ratio(&chars("abxcd"), &chars("abcd")) - 8.0 / 9.0).abs() < 1e-12);
  }

  #[test]
  fn long_inputs_still_match_through_popular_chars() {
    let target = "the cat sat on the mat ".repeat(12);
    assert!(target.chars().count() >= POPULAR_MIN_LEN);
    assert_eq!(score(&target, &target).score, 100);
  }

  #[test]
  fn level_serializes_kebab_case() {
    assert_eq!(serde_json::to_value(PronunciationLevel::NeedsImprovement).unwrap(), "needs-improvement");
  }
}

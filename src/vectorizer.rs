//! Bounded-vocabulary TF-IDF over catalog feature texts.
//!
//! - tokens: lowercase runs of word characters (alphanumeric or `_`), length >= 2
//! - English stop words removed before n-grams are formed
//! - unigrams and bigrams, vocabulary capped by total corpus frequency
//! - smooth idf `ln((1 + n) / (1 + df)) + 1`, raw counts, L2 normalized
//!
//! `TfidfConfig::fit` is the only way to obtain a `TfidfModel`, so a model is
//! always fitted; the "no model yet" case lives in the application state.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Clone, Debug)]
pub struct TfidfConfig {
  pub max_features: usize,
  /// Inclusive (min, max) n-gram lengths.
  pub ngram_range: (usize, usize),
}

impl Default for TfidfConfig {
  fn default() -> Self {
    Self { max_features: 1000, ngram_range: (1, 2) }
  }
}

/// Sparse vector: `(feature index, weight)` pairs sorted by index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
  pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
  pub fn is_zero(&self) -> bool {
    self.entries.iter().all(|&(_, w)| w == 0.0)
  }

  pub fn norm(&self) -> f64 {
    self.entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt()
  }

  pub fn dot(&self, other: &SparseVector) -> f64 {
    let (mut i, mut j, mut acc) = (0, 0, 0.0);
    let (a, b) = (&self.entries, &other.entries);
    while i < a.len() && j < b.len() {
      match a[i].0.cmp(&b[j].0) {
        std::cmp::Ordering::Less => i += 1,
        std::cmp::Ordering::Greater => j += 1,
        std::cmp::Ordering::Equal => {
          acc += a[i].1 * b[j].1;
          i += 1;
          j += 1;
        }
      }
    }
    acc
  }
}

/// Cosine similarity; 0 when either vector is zero.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
  let denom = a.norm() * b.norm();
  if denom == 0.0 {
    return 0.0;
  }
  (a.dot(b) / denom).clamp(0.0, 1.0)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TfidfModel {
  vocabulary: HashMap<String, usize>,
  idf: Vec<f64>,
  ngram_range: (usize, usize),
}

impl TfidfConfig {
  /// Build the vocabulary and return the model plus one vector per document.
  pub fn fit(&self, documents: &[String]) -> Result<(TfidfModel, Vec<SparseVector>)> {
    if documents.is_empty() {
      return Err(AppError::EmptyCatalog);
    }
    let analyzed: Vec<Vec<String>> = documents.iter().map(|d| analyze(d, self.ngram_range)).collect();

    let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for terms in &analyzed {
      let mut seen: HashSet<&str> = HashSet::new();
      for t in terms {
        *corpus_freq.entry(t.as_str()).or_insert(0) += 1;
        if seen.insert(t.as_str()) {
          *doc_freq.entry(t.as_str()).or_insert(0) += 1;
        }
      }
    }

    // Most frequent first, ties lexicographic, then re-index alphabetically.
    let mut ranked: Vec<(&str, usize)> = corpus_freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(self.max_features);
    let mut kept: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
    kept.sort_unstable();

    let n = documents.len() as f64;
    let idf: Vec<f64> = kept
      .iter()
      .map(|t| {
        let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
      })
      .collect();
    let vocabulary: HashMap<String, usize> =
      kept.iter().enumerate().map(|(i, t)| (t.to_string(), i)).collect();

    let model = TfidfModel { vocabulary, idf, ngram_range: self.ngram_range };
    let vectors = analyzed.iter().map(|terms| model.vectorize(terms)).collect();
    Ok((model, vectors))
  }
}

impl TfidfModel {
  pub fn vocabulary_len(&self) -> usize {
    self.vocabulary.len()
  }

  /// Map new text into the fitted space; unknown terms are dropped.
  pub fn transform(&self, text: &str) -> SparseVector {
    self.vectorize(&analyze(text, self.ngram_range))
  }

  fn vectorize(&self, terms: &[String]) -> SparseVector {
    let mut counts: HashMap<usize, f64> = HashMap::new();
    for t in terms {
      if let Some(&idx) = self.vocabulary.get(t) {
        *counts.entry(idx).or_insert(0.0) += 1.0;
      }
    }
    let mut entries: Vec<(usize, f64)> = counts.into_iter().map(|(i, c)| (i, c * self.idf[i])).collect();
    entries.sort_unstable_by_key(|&(i, _)| i);

    let norm = entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
      for e in &mut entries {
        e.1 /= norm;
      }
    }
    SparseVector { entries }
  }
}

/// Lowercase word tokens of length >= 2, stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .split(|c: char| !(c.is_alphanumeric() || c == '_'))
    .filter(|t| t.chars().count() >= 2)
    .filter(|t| !is_stop_word(t))
    .map(str::to_string)
    .collect()
}

fn analyze(text: &str, (min_n, max_n): (usize, usize)) -> Vec<String> {
  let tokens = tokenize(text);
  let mut out = Vec::new();
  for n in min_n.max(1)..=max_n {
    if n == 1 {
      out.extend(tokens.iter().cloned());
    } else {
      out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
  }
  out
}

pub fn is_stop_word(word: &str) -> bool {
  STOP_WORDS.binary_search(&word).is_ok()
}

// Sorted; looked up with binary search.
const STOP_WORDS: &[&str] = &[
  "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
  "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "amoungst",
  "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere",
  "are", "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
  "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
  "beyond", "bill", "both", "bottom", "but", "by", "call", "can", "cannot", "cant", "co", "con",
  "could", "couldnt", "cry", "de", "describe", "detail", "do", "done", "down", "due", "during",
  "each", "eg", "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even",
  "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen", "fifty",
  "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty", "found", "four",
  "from", "front", "full", "further", "get", "give", "go", "had", "has", "hasnt", "have", "he",
  "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him",
  "himself", "his", "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed",
  "interest", "into", "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least",
  "less", "ltd", "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more",
  "moreover", "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely",
  "neither", "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor",
  "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
  "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
  "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed", "seeming",
  "seems", "serious", "several", "she", "should", "show", "side", "since", "sincere", "six",
  "sixty", "so", "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere",
  "still", "such", "system", "take", "ten", "than", "that", "the", "their", "them", "themselves",
  "then", "thence", "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these",
  "they", "thick", "thin", "third", "this", "those", "though", "three", "through", "throughout",
  "thru", "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two",
  "un", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
  "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
  "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole",
  "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
  "yours", "yourself", "yourselves",
];

#[cfg(test)]
mod tests {
  use super::*;

  fn docs(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn stop_word_table_is_sorted() {
    assert!(STOP_WORDS.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn tokenize_drops_stop_words_and_short_tokens() {
    assert_eq!(tokenize("The Present, simple tense: A1 x"), vec!["present", "simple", "tense", "a1"]);
  }

  #[test]
  fn bigrams_skip_removed_stop_words() {
    let terms = analyze("past of the tense", (1, 2));
    assert_eq!(terms, vec!["past", "tense", "past tense"]);
  }

  #[test]
  fn fit_rejects_empty_corpus() {
    assert!(matches!(TfidfConfig::default().fit(&[]), Err(AppError::EmptyCatalog)));
  }

  #[test]
  fn item_vectors_are_unit_length() {
    let (_, vectors) = TfidfConfig::default().fit(&docs(&["grammar tense a1", "vocabulary verbs a1"])).unwrap();
    for v in &vectors {
      assert!((v.norm() - 1.0).abs() < 1e-9);
    }
  }

  #[test]
  fn vocabulary_is_capped_by_frequency() {
    let cfg = TfidfConfig { max_features: 2, ngram_range: (1, 1) };
    let (model, _) = cfg.fit(&docs(&["grammar grammar tense", "grammar verbs verbs", "idioms"])).unwrap();
    assert_eq!(model.vocabulary_len(), 2);
    assert!(!model.transform("grammar").is_zero());
    assert!(!model.transform("verbs").is_zero());
    assert!(model.transform("idioms").is_zero());
  }

  #[test]
  fn transform_drops_unknown_terms() {
    let (model, _) = TfidfConfig::default().fit(&docs(&["grammar tense", "reading stories"])).unwrap();
    assert!(model.transform("astronomy physics").is_zero());
    assert!(!model.transform("grammar astronomy").is_zero());
  }

  #[test]
  fn cosine_handles_zero_and_identical_vectors() {
    let (model, vectors) = TfidfConfig::default().fit(&docs(&["grammar tense", "reading stories"])).unwrap();
    let zero = SparseVector::default();
    assert_eq!(cosine(&zero, &vectors[0]), 0.0);
    assert!((cosine(&vectors[0], &vectors[0]) - 1.0).abs() < 1e-9);
    assert_eq!(cosine(&model.transform("grammar"), &vectors[1]), 0.0);
  }
}

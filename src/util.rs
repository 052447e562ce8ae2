//! Small string helpers used across modules.

/// First character uppercased, the rest lowercased ("gRAMMAR" -> "Grammar").
pub fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    None => String::new(),
  }
}

/// Log-safe truncation for user-provided text.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars).collect();
    format!("{}… ({} chars total)", head, s.chars().count())
  }
}

//! Placeholder syntax for step input bindings.
//!
//! A binding value is a placeholder only when the whole string has the form
//! `{{ inner }}`. Everything else, including text that merely contains braces,
//! is a literal.
//!
//! | Form                     | Meaning                                   |
//! |--------------------------|-------------------------------------------|
//! | `{{config.scoring}}`     | dotted path into the workflow `config`     |
//! | `{{env.API_KEY}}`        | environment variable from the run context |
//! | `{{search.leads}}`       | key `leads` of step `search`'s output      |
//! | `{{search}}`             | the whole output of step `search`          |

/// Step ids that would be shadowed by a built-in placeholder namespace.
pub const RESERVED_STEP_IDS: &[&str] = &["config", "env"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
  /// Dotted path into the workflow config. Empty path means the whole config.
  Config { path: &'a str },
  /// Environment variable name.
  Env { name: &'a str },
  /// A single key of a prior step's output.
  StepOutput { step_id: &'a str, key: &'a str },
  /// The entire output of a prior step.
  Step { step_id: &'a str },
}

impl<'a> Reference<'a> {
  /// Parse a binding string. Returns `None` for literals.
  pub fn parse(value: &'a str) -> Option<Self> {
    let inner = value.strip_prefix("{{")?.strip_suffix("}}")?.trim();

    if inner.is_empty()
      || inner.contains("{{")
      || inner.contains("}}")
      || inner.chars().any(char::is_whitespace)
    {
      return None;
    }

    if inner == "config" {
      return Some(Reference::Config { path: "" });
    }
    if let Some(path) = inner.strip_prefix("config.") {
      return Some(Reference::Config { path });
    }
    if let Some(name) = inner.strip_prefix("env.") {
      return (!name.is_empty()).then_some(Reference::Env { name });
    }

    match inner.split_once('.') {
      Some((step_id, key)) if !step_id.is_empty() && !key.is_empty() => {
        Some(Reference::StepOutput { step_id, key })
      }
      Some(_) => None,
      None => Some(Reference::Step { step_id: inner }),
    }
  }

  /// The step this reference reads from, if it reads step output.
  pub fn step_id(&self) -> Option<&'a str> {
    match *self {
      Reference::StepOutput { step_id, .. } | Reference::Step { step_id } => Some(step_id),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_forms() {
    assert_eq!(
      Reference::parse("{{config.scoring}}"),
      Some(Reference::Config { path: "scoring" })
    );
    assert_eq!(
      Reference::parse("{{config}}"),
      Some(Reference::Config { path: "" })
    );
    assert_eq!(
      Reference::parse("{{env.APOLLO_API_KEY}}"),
      Some(Reference::Env {
        name: "APOLLO_API_KEY"
      })
    );
    assert_eq!(
      Reference::parse("{{search.leads}}"),
      Some(Reference::StepOutput {
        step_id: "search",
        key: "leads"
      })
    );
    assert_eq!(
      Reference::parse("{{search}}"),
      Some(Reference::Step { step_id: "search" })
    );
  }

  #[test]
  fn test_key_keeps_remaining_dots() {
    assert_eq!(
      Reference::parse("{{enrich.company.size}}"),
      Some(Reference::StepOutput {
        step_id: "enrich",
        key: "company.size"
      })
    );
  }

  #[test]
  fn test_inner_whitespace_is_trimmed() {
    assert_eq!(
      Reference::parse("{{ search.leads }}"),
      Some(Reference::StepOutput {
        step_id: "search",
        key: "leads"
      })
    );
  }

  #[test]
  fn test_literals() {
    assert_eq!(Reference::parse("plain text"), None);
    assert_eq!(Reference::parse("Hello {{name}}"), None);
    assert_eq!(Reference::parse("{{a}} and {{b}}"), None);
    assert_eq!(Reference::parse("{{}}"), None);
    assert_eq!(Reference::parse("{{ two words }}"), None);
    assert_eq!(Reference::parse("{{env.}}"), None);
    assert_eq!(Reference::parse("{{.leads}}"), None);
    assert_eq!(Reference::parse("{{search.}}"), None);
  }

  #[test]
  fn test_step_id() {
    assert_eq!(
      Reference::parse("{{search.leads}}").and_then(|r| r.step_id()),
      Some("search")
    );
    assert_eq!(
      Reference::parse("{{config.scoring}}").and_then(|r| r.step_id()),
      None
    );
  }
}

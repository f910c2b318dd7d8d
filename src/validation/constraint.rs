//! Declarative field constraints evaluated against a decoded JSON document.

use serde_json::Value;

/// A single broken constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the field, e.g. `input_val_1` or `address.zip`.
    pub field_path: String,
    /// Name of the ApiError this violation maps to.
    pub error_code: &'static str,
    pub message: String,
}

/// What a constraint checks.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Field present and not `null`.
    NotNull,
    /// Field present, a string, and not only whitespace.
    NotBlank,
    /// String no longer than the given number of characters. Absent passes.
    MaxLength(usize),
    /// String accepted by `check`. Absent passes.
    Format {
        description: &'static str,
        check: fn(&str) -> bool,
    },
}

/// A rule bound to a field and to the ApiError reported when it fails.
#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    pub field: &'static str,
    pub rule: Rule,
    pub error: &'static str,
}

impl Constraint {
    pub const fn not_null(field: &'static str, error: &'static str) -> Self {
        Self { field, rule: Rule::NotNull, error }
    }

    pub const fn not_blank(field: &'static str, error: &'static str) -> Self {
        Self { field, rule: Rule::NotBlank, error }
    }

    pub const fn max_length(field: &'static str, max: usize, error: &'static str) -> Self {
        Self { field, rule: Rule::MaxLength(max), error }
    }

    pub const fn format(
        field: &'static str,
        description: &'static str,
        check: fn(&str) -> bool,
        error: &'static str,
    ) -> Self {
        Self {
            field,
            rule: Rule::Format { description, check },
            error,
        }
    }

    /// Evaluate against `document`, returning the violation if any.
    pub fn check(&self, document: &Value) -> Option<ValidationError> {
        let value = lookup(document, self.field);
        let failure = match self.rule {
            Rule::NotNull => match value {
                None | Some(Value::Null) => Some("may not be null".to_string()),
                Some(_) => None,
            },
            Rule::NotBlank => match value {
                Some(Value::String(s)) if !s.trim().is_empty() => None,
                Some(Value::String(_)) | None | Some(Value::Null) => {
                    Some("may not be blank".to_string())
                }
                Some(_) => None,
            },
            Rule::MaxLength(max) => match value {
                Some(Value::String(s)) if s.chars().count() > max => {
                    Some(format!("length must be at most {}", max))
                }
                _ => None,
            },
            Rule::Format { description, check } => match value {
                Some(Value::String(s)) if !check(s) => Some(format!("must be a valid {}", description)),
                _ => None,
            },
        };

        failure.map(|message| ValidationError {
            field_path: self.field.to_string(),
            error_code: self.error,
            message,
        })
    }
}

/// Evaluate every constraint and collect every violation.
pub fn check_all(constraints: &[Constraint], document: &Value) -> Vec<ValidationError> {
    constraints.iter().filter_map(|c| c.check(document)).collect()
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |current, segment| current.get(segment))
}

/// Format check for canonical UUID strings.
pub fn is_uuid(value: &str) -> bool {
    uuid::Uuid::parse_str(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME_REQUIRED: Constraint = Constraint::not_blank("name", "NAME_ERR");

    #[test]
    fn test_not_blank() {
        assert!(NAME_REQUIRED.check(&json!({"name": "x"})).is_none());
        assert!(NAME_REQUIRED.check(&json!({"name": "   "})).is_some());
        assert!(NAME_REQUIRED.check(&json!({"name": null})).is_some());
        assert!(NAME_REQUIRED.check(&json!({})).is_some());
    }

    #[test]
    fn test_not_null_accepts_empty_string() {
        let c = Constraint::not_null("name", "NAME_ERR");
        assert!(c.check(&json!({"name": ""})).is_none());
        assert!(c.check(&json!({})).is_some());
    }

    #[test]
    fn test_nested_field_path() {
        let c = Constraint::not_blank("address.zip", "ZIP_ERR");
        assert!(c.check(&json!({"address": {"zip": "12345"}})).is_none());

        let violation = c.check(&json!({"address": {}})).unwrap();
        assert_eq!(violation.field_path, "address.zip");
        assert_eq!(violation.error_code, "ZIP_ERR");
    }

    #[test]
    fn test_max_length_and_format() {
        let short = Constraint::max_length("code", 3, "CODE_ERR");
        assert!(short.check(&json!({"code": "abc"})).is_none());
        assert!(short.check(&json!({"code": "abcd"})).is_some());
        assert!(short.check(&json!({})).is_none());

        let id = Constraint::format("id", "UUID", is_uuid, "ID_ERR");
        assert!(id.check(&json!({"id": "not-a-uuid"})).is_some());
        assert!(id
            .check(&json!({"id": "123e4567-e89b-12d3-a456-426614174000"}))
            .is_none());
    }

    #[test]
    fn test_check_all_collects_everything() {
        let constraints = [
            Constraint::not_blank("a", "A_ERR"),
            Constraint::not_blank("b", "B_ERR"),
        ];
        let errors = check_all(&constraints, &json!({}));
        assert_eq!(errors.len(), 2);
    }
}

use thiserror::Error;

/// Local, recoverable input problems raised by the play editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide at least a play name and formation (name is empty)")]
    MissingName,
    #[error("Please provide at least a play name and formation (formation is empty)")]
    MissingFormation,
    #[error("Player label cannot be empty")]
    EmptyLabel,
}

/// Raised when untrusted JSON (imported playbooks, AI responses) does not
/// have the expected shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("invalid json: {0}")]
    InvalidJson(String),
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("wrong type at {at}: {detail}")]
    WrongType { at: String, detail: String },
    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: String, value: String },
    #[error("field `{field}` has unknown value `{value}`")]
    UnknownVariant { field: String, value: String },
    #[error("duplicate marker id `{marker_id}` in `{field}`")]
    DuplicateMarker { field: String, marker_id: String },
    #[error("`{field}` references unknown marker `{marker_id}`")]
    DanglingPath { field: String, marker_id: String },
    #[error("`{field}` has more than one path for marker `{marker_id}`")]
    DuplicatePath { field: String, marker_id: String },
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        if !err.is_data() {
            return SchemaError::InvalidJson(message);
        }
        let at = format!("line {} column {}", err.line(), err.column());
        if let Some(name) = backticked_after(&message, "missing field `") {
            return SchemaError::MissingField(name.to_string());
        }
        if let Some(value) = backticked_after(&message, "unknown variant `") {
            return SchemaError::UnknownVariant {
                field: at,
                value: value.to_string(),
            };
        }
        if message.starts_with("invalid type") || message.starts_with("invalid value") {
            let detail = message
                .split(" at line ")
                .next()
                .unwrap_or(message.as_str())
                .to_string();
            return SchemaError::WrongType { at, detail };
        }
        SchemaError::InvalidJson(message)
    }
}

// serde_json reports field and variant names between backticks.
fn backticked_after<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = message.strip_prefix(prefix)?;
    rest.split('`').next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Roster {
        name: String,
        side: Side,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    enum Side {
        Offense,
    }

    fn decode(raw: &str) -> SchemaError {
        serde_json::from_str::<Roster>(raw).expect_err("should fail").into()
    }

    #[test]
    fn serde_errors_map_onto_schema_variants() {
        assert_eq!(
            decode(r#"{"side":"Offense"}"#),
            SchemaError::MissingField("name".to_string())
        );
        assert!(matches!(
            decode(r#"{"name":"a","side":"Kicking"}"#),
            SchemaError::UnknownVariant { ref value, .. } if value == "Kicking"
        ));
        assert!(matches!(
            decode(r#"{"name":7,"side":"Offense"}"#),
            SchemaError::WrongType { ref detail, .. } if detail.starts_with("invalid type")
        ));
        assert!(matches!(decode("{"), SchemaError::InvalidJson(_)));
    }
}

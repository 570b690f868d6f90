//! Shared validation helpers for inbound HTTP adapters.
//!
//! Raw path, query, and body strings are parsed here into domain values so
//! handlers only pass well-formed input to the services. Every failure is a
//! `400` carrying `{field, code, value?}` details.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{
    Error, IdeaId, IdeaValidationError, InvalidIdentifier, RegistrationError, Score, UserId,
    Username,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidNumber,
    InvalidUsername,
    InvalidEmail,
    InvalidPassword,
    EmptyField,
    ScoreOutOfRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidNumber => "invalid_number",
            ErrorCode::InvalidUsername => "invalid_username",
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::InvalidPassword => "invalid_password",
            ErrorCode::EmptyField => "empty_field",
            ErrorCode::ScoreOutOfRange => "score_out_of_range",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

fn identifier_error(field: FieldName) -> impl FnOnce(InvalidIdentifier) -> Error {
    move |err| invalid_uuid_error(field, err.value())
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(identifier_error(field))
}

pub(crate) fn parse_idea_id(value: &str, field: FieldName) -> Result<IdeaId, Error> {
    IdeaId::new(value).map_err(identifier_error(field))
}

pub(crate) fn parse_username(value: &str, field: FieldName) -> Result<Username, Error> {
    Username::new(value).map_err(|err| {
        ValidationError::new(field.as_str(), err.to_string())
            .with_value(ErrorCode::InvalidUsername, value)
    })
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be an RFC 3339 timestamp"))
        .with_value(ErrorCode::InvalidTimestamp, value)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: String,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, &value))
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

fn invalid_number_error(field: FieldName, value: &str, expected: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be {expected}"))
        .with_value(ErrorCode::InvalidNumber, value)
}

/// Parse an optional non-negative integer, defaulting to zero when absent.
pub(crate) fn parse_count_threshold(value: Option<String>, field: FieldName) -> Result<u64, Error> {
    match value {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid_number_error(field, &raw, "a non-negative integer")),
    }
}

/// Parse an optional finite number, defaulting to zero when absent.
pub(crate) fn parse_score_threshold(value: Option<String>, field: FieldName) -> Result<f64, Error> {
    match value {
        None => Ok(0.0),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|parsed| parsed.is_finite())
            .ok_or_else(|| invalid_number_error(field, &raw, "a finite number")),
    }
}

pub(crate) fn parse_score(value: i64, field: FieldName) -> Result<Score, Error> {
    Score::new(value).map_err(|err| {
        ValidationError::new(field.as_str(), err.to_string())
            .with_value(ErrorCode::ScoreOutOfRange, value.to_string())
    })
}

pub(crate) fn registration_error(err: RegistrationError) -> Error {
    let code = match &err {
        RegistrationError::Username(_) => ErrorCode::InvalidUsername,
        RegistrationError::Email(_) => ErrorCode::InvalidEmail,
        RegistrationError::Password(_) => ErrorCode::InvalidPassword,
    };
    ValidationError::new(err.field(), err.to_string()).with_code(code)
}

pub(crate) fn idea_text_error(err: IdeaValidationError) -> Error {
    ValidationError::new(err.field(), err.to_string()).with_code(ErrorCode::EmptyField)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    const FIELD: FieldName = FieldName::new("thing");

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error.details()?.get(key)?.as_str()
    }

    #[rstest]
    fn malformed_ids_echo_the_value() {
        let err = parse_user_id("nope", FIELD).expect_err("malformed");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(err.message(), "thing must be a valid UUID");
        assert_eq!(detail(&err, "field"), Some("thing"));
        assert_eq!(detail(&err, "code"), Some("invalid_uuid"));
        assert_eq!(detail(&err, "value"), Some("nope"));
    }

    #[rstest]
    #[case(None, 0)]
    #[case(Some("7"), 7)]
    #[case(Some(" 12 "), 12)]
    fn count_thresholds_default_to_zero(#[case] raw: Option<&str>, #[case] expected: u64) {
        let parsed = parse_count_threshold(raw.map(str::to_owned), FIELD).expect("valid");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case("-1")]
    #[case("1.5")]
    #[case("lots")]
    fn count_thresholds_reject_non_counts(#[case] raw: &str) {
        let err = parse_count_threshold(Some(raw.to_owned()), FIELD).expect_err("invalid");
        assert_eq!(detail(&err, "code"), Some("invalid_number"));
    }

    #[rstest]
    #[case("NaN")]
    #[case("inf")]
    #[case("three")]
    fn score_thresholds_must_be_finite(#[case] raw: &str) {
        assert!(parse_score_threshold(Some(raw.to_owned()), FIELD).is_err());
    }

    #[rstest]
    fn score_thresholds_accept_fractions() {
        let parsed = parse_score_threshold(Some("3.5".to_owned()), FIELD).expect("valid");
        assert!((parsed - 3.5).abs() < f64::EPSILON);
    }

    #[rstest]
    fn timestamps_are_normalised_to_utc() {
        let parsed = parse_rfc3339_timestamp("2024-05-01T14:00:00+02:00".to_owned(), FIELD)
            .expect("valid timestamp");
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[rstest]
    fn bad_timestamps_are_rejected() {
        let err = parse_optional_rfc3339_timestamp(Some("yesterday".to_owned()), FIELD)
            .expect_err("invalid");
        assert_eq!(detail(&err, "code"), Some("invalid_timestamp"));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn scores_outside_the_scale_are_rejected(#[case] raw: i64) {
        let err = parse_score(raw, FieldName::new("score")).expect_err("out of range");
        assert_eq!(detail(&err, "code"), Some("score_out_of_range"));
        assert_eq!(detail(&err, "value"), Some(raw.to_string().as_str()));
    }

    #[rstest]
    fn missing_fields_name_the_field() {
        let err = missing_field_error(FieldName::new("user_id"));
        assert_eq!(err.message(), "missing required field: user_id");
        assert_eq!(detail(&err, "code"), Some("missing_field"));
    }
}

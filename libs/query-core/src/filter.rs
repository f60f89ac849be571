use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{QueryError, Result};

/// Comparison applied by a single filter token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Case-insensitive "contains".
    ILike,
    /// Case-insensitive "does not contain".
    NotILike,
}

/// Every accepted operator spelling.
///
/// Several spellings are textual prefixes of others (`>` of `>=`, `__gt__` of
/// `__gte__`); when two match at the same position the longer one wins.
const SPELLINGS: &[(&str, Operator)] = &[
    ("__gte__", Operator::Ge),
    ("__gt__", Operator::Gt),
    ("__lte__", Operator::Le),
    ("__lt__", Operator::Lt),
    ("__ne__", Operator::Ne),
    ("__eq__", Operator::Eq),
    ("__nil__", Operator::NotILike),
    ("__il__", Operator::ILike),
    (">=", Operator::Ge),
    (">", Operator::Gt),
    ("<=", Operator::Le),
    ("<", Operator::Lt),
    ("!=", Operator::Ne),
    ("==", Operator::Eq),
];

impl Operator {
    /// Canonical spelling used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "__eq__",
            Operator::Ne => "__ne__",
            Operator::Gt => "__gt__",
            Operator::Ge => "__gte__",
            Operator::Lt => "__lt__",
            Operator::Le => "__lte__",
            Operator::ILike => "__il__",
            Operator::NotILike => "__nil__",
        }
    }

    /// Short symbolic alias, if the operator has one.
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("=="),
            Operator::Ne => Some("!="),
            Operator::Gt => Some(">"),
            Operator::Ge => Some(">="),
            Operator::Lt => Some("<"),
            Operator::Le => Some("<="),
            Operator::ILike | Operator::NotILike => None,
        }
    }

    /// Human-readable list of every accepted spelling, for error messages.
    pub fn supported() -> String {
        let all = [
            Operator::Eq,
            Operator::Le,
            Operator::Lt,
            Operator::Ge,
            Operator::Gt,
            Operator::Ne,
            Operator::ILike,
            Operator::NotILike,
        ];
        let parts: Vec<String> = all
            .iter()
            .map(|op| match op.symbol() {
                Some(sym) => format!("{} ({})", op.as_str(), sym),
                None => op.as_str().to_string(),
            })
            .collect();
        format!("[{}]", parts.join(", "))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared storage type of a filterable field; drives value coercion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I32,
    I64,
    F64,
    Bool,
    Uuid,
    DateTimeUtc,
    Date,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::I32 => "integer",
            FieldKind::I64 => "bigint",
            FieldKind::F64 => "float",
            FieldKind::Bool => "boolean",
            FieldKind::Uuid => "uuid",
            FieldKind::DateTimeUtc => "datetime",
            FieldKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// A typed literal produced from a raw token value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    String(String),
}

/// One `field<op>value` segment of a `filter_by` string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterToken {
    pub field: String,
    pub op: Operator,
    pub raw: String,
}

/// Split a filter token at the first operator it contains.
///
/// Whatever follows that operator is the value, so the value may itself
/// contain operator characters (`title==a>b` compares `title` with `a>b`).
pub fn resolve(token: &str) -> Result<FilterToken> {
    let token = token.trim();
    let first = SPELLINGS
        .iter()
        .filter_map(|&(spelling, op)| token.find(spelling).map(|at| (at, spelling, op)))
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.len().cmp(&a.1.len())));

    if let Some((at, spelling, op)) = first {
        let field = token[..at].trim();
        if !field.is_empty() {
            return Ok(FilterToken {
                field: field.to_string(),
                op,
                raw: token[at + spelling.len()..].trim().to_string(),
            });
        }
    }
    Err(QueryError::InvalidOperator {
        token: token.to_string(),
    })
}

/// Convert a raw token value into a typed literal for a field of `kind`.
pub fn coerce(field: &str, kind: FieldKind, raw: &str) -> Result<Scalar> {
    let invalid = || QueryError::InvalidValue {
        field: field.to_string(),
        kind,
        value: raw.to_string(),
    };

    Ok(match kind {
        FieldKind::String => Scalar::String(raw.to_string()),
        FieldKind::I32 => {
            let n = raw.trim().parse::<i32>().map_err(|_| invalid())?;
            Scalar::Int(i64::from(n))
        }
        FieldKind::I64 => Scalar::Int(raw.trim().parse::<i64>().map_err(|_| invalid())?),
        FieldKind::F64 => Scalar::Float(raw.trim().parse::<f64>().map_err(|_| invalid())?),
        FieldKind::Bool => Scalar::Bool(raw == "true" || raw == "1"),
        FieldKind::Uuid => Scalar::Uuid(Uuid::parse_str(raw.trim()).map_err(|_| invalid())?),
        FieldKind::DateTimeUtc => {
            Scalar::DateTime(parse_datetime(raw.trim()).ok_or_else(|| {
                QueryError::InvalidDatetimeValue {
                    field: field.to_string(),
                    kind,
                    value: raw.to_string(),
                }
            })?)
        }
        FieldKind::Date => Scalar::Date(
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                QueryError::InvalidDatetimeValue {
                    field: field.to_string(),
                    kind,
                    value: raw.to_string(),
                }
            })?,
        ),
    })
}

/// ISO-8601 timestamp parsing. Offsets are honoured; naive values are UTC;
/// a bare date means midnight UTC.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

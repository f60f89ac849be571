//! `page`/`size`/`sort_by`/`filter_by` → SeaORM ordering and predicates.
//!
//! An entity declares its queryable surface once as a [`FieldMap`]. The
//! [`PaginationFactory`] turns that map plus exclusion lists into a
//! [`QuerySchema`]; services build the schema when they are constructed and
//! call [`QuerySchema::bind`] per request. Binding validates everything up
//! front; compiling to SQL expressions happens lazily and at most once per
//! [`PaginationQuery`].

use std::sync::Arc;

use once_cell::sync::OnceCell;
use query_core::{
    coerce, parse_sort, resolve, split_fields, FieldKind, FilterToken, Operator, PageRequest,
    QueryError, Scalar, SortDir, SortKey,
};
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
    ColumnTrait, Condition, EntityTrait, IdenStatic, Order, Value,
};

use crate::repo::Resource;

/// Column descriptor for one api-visible field.
#[derive(Clone, Debug)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
}

/// Ordered api-name → column map of an entity.
#[derive(Clone, Debug)]
pub struct FieldMap<E: EntityTrait> {
    fields: Vec<(String, Field<E>)>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        let name = api_name.into();
        self.fields.retain(|(n, _)| *n != name);
        self.fields.push((name, Field { col, kind }));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Look a field up by its storage column.
    pub fn by_column(&self, col: &E::Column) -> Option<(&str, &Field<E>)> {
        let target = col.as_str();
        self.fields
            .iter()
            .find(|(_, f)| f.col.as_str() == target)
            .map(|(n, f)| (n.as_str(), f))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Convert a coerced literal into the exact `Value` variant a column of `kind` stores.
pub fn scalar_to_value(field: &str, kind: FieldKind, scalar: Scalar) -> Result<Value, QueryError> {
    let mismatch = |v: String| QueryError::InvalidValue {
        field: field.to_string(),
        kind,
        value: v,
    };
    Ok(match (kind, scalar) {
        (FieldKind::String, Scalar::String(s)) => Value::from(s),
        (FieldKind::I32, Scalar::Int(n)) => {
            Value::from(i32::try_from(n).map_err(|_| mismatch(n.to_string()))?)
        }
        (FieldKind::I64, Scalar::Int(n)) => Value::from(n),
        (FieldKind::F64, Scalar::Float(f)) => Value::from(f),
        (FieldKind::F64, Scalar::Int(n)) => Value::from(n as f64),
        (FieldKind::Bool, Scalar::Bool(b)) => Value::from(b),
        (FieldKind::Uuid, Scalar::Uuid(u)) => Value::from(u),
        (FieldKind::DateTimeUtc, Scalar::DateTime(dt)) => Value::from(dt),
        (FieldKind::Date, Scalar::Date(d)) => Value::from(d),
        (_, other) => return Err(mismatch(format!("{other:?}"))),
    })
}

/// Coerce a JSON payload value for a column of `kind`.
pub fn json_to_value(
    field: &str,
    kind: FieldKind,
    json: &serde_json::Value,
) -> Result<Value, QueryError> {
    let raw = match json {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => {
            return Err(QueryError::InvalidValue {
                field: field.to_string(),
                kind,
                value: other.to_string(),
            })
        }
    };
    if kind == FieldKind::Bool && !matches!(json, serde_json::Value::Bool(_)) {
        return Err(QueryError::InvalidValue {
            field: field.to_string(),
            kind,
            value: raw,
        });
    }
    let scalar = coerce(field, kind, &raw)?;
    scalar_to_value(field, kind, scalar)
}

/// Builds [`QuerySchema`]s from an entity's field map.
pub struct PaginationFactory;

impl PaginationFactory {
    /// Allowed sort fields are all declared fields minus `exclude_sort`;
    /// likewise for filters.
    pub fn create<E: Resource>(exclude_sort: &[&str], exclude_filter: &[&str]) -> QuerySchema<E> {
        let fields = E::fields();
        let sortable = fields
            .names()
            .filter(|n| !exclude_sort.contains(n))
            .map(str::to_string)
            .collect();
        let filterable = fields
            .names()
            .filter(|n| !exclude_filter.contains(n))
            .map(str::to_string)
            .collect();
        QuerySchema {
            fields: Arc::new(fields),
            sortable,
            filterable,
        }
    }
}

/// Allow-lists and field descriptors for one entity, shared across requests.
#[derive(Debug)]
pub struct QuerySchema<E: EntityTrait> {
    fields: Arc<FieldMap<E>>,
    sortable: Vec<String>,
    filterable: Vec<String>,
}

impl<E: EntityTrait> Clone for QuerySchema<E> {
    fn clone(&self) -> Self {
        Self {
            fields: Arc::clone(&self.fields),
            sortable: self.sortable.clone(),
            filterable: self.filterable.clone(),
        }
    }
}

impl<E: EntityTrait> QuerySchema<E> {
    pub fn sortable(&self) -> &[String] {
        &self.sortable
    }

    pub fn filterable(&self) -> &[String] {
        &self.filterable
    }

    /// Validate request parameters against this schema.
    ///
    /// Every failure surfaces here, before any statement is built.
    pub fn bind(&self, req: PageRequest) -> Result<PaginationQuery<E>, QueryError> {
        req.validate()?;

        let sort_keys = parse_sort(req.sort_by.as_deref());
        for key in &sort_keys {
            if !self.sortable.iter().any(|f| *f == key.field) {
                return Err(QueryError::UnknownSortField {
                    field: key.field.clone(),
                    allowed: self.sortable.clone(),
                });
            }
        }

        let mut filters = Vec::new();
        for raw in split_fields(req.filter_by.as_deref()) {
            let token = resolve(raw)?;
            let field = match self.fields.get(&token.field) {
                Some(f) if self.filterable.iter().any(|n| *n == token.field) => f,
                _ => {
                    return Err(QueryError::UnknownFilterField {
                        field: token.field,
                        allowed: self.filterable.clone(),
                    })
                }
            };
            // surface value and operator errors now rather than at compile time
            compile_filter(&token, field)?;
            filters.push(token);
        }

        Ok(PaginationQuery {
            page: req.page,
            size: req.size,
            sort_keys,
            filters,
            fields: Arc::clone(&self.fields),
            sort_cache: OnceCell::new(),
            filter_cache: OnceCell::new(),
        })
    }
}

/// A validated listing request with lazily compiled sort and filter expressions.
#[derive(Debug)]
pub struct PaginationQuery<E: EntityTrait> {
    page: u64,
    size: u64,
    sort_keys: Vec<SortKey>,
    filters: Vec<FilterToken>,
    fields: Arc<FieldMap<E>>,
    sort_cache: OnceCell<Vec<(E::Column, Order)>>,
    filter_cache: OnceCell<Vec<SimpleExpr>>,
}

impl<E: EntityTrait> PaginationQuery<E> {
    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort_keys
    }

    pub fn filter_tokens(&self) -> &[FilterToken] {
        &self.filters
    }

    /// Ordering columns in request order; empty when `sort_by` was blank.
    pub fn sort_fields(&self) -> Result<&[(E::Column, Order)], QueryError> {
        self.sort_cache
            .get_or_try_init(|| {
                self.sort_keys
                    .iter()
                    .map(|key| {
                        let field = self.fields.get(&key.field).ok_or_else(|| {
                            QueryError::UnknownSortField {
                                field: key.field.clone(),
                                allowed: self.fields.names().map(str::to_string).collect(),
                            }
                        })?;
                        let order = match key.dir {
                            SortDir::Asc => Order::Asc,
                            SortDir::Desc => Order::Desc,
                        };
                        Ok((field.col, order))
                    })
                    .collect()
            })
            .map(Vec::as_slice)
    }

    /// Filter predicates; empty when `filter_by` was blank.
    pub fn filter_fields(&self) -> Result<&[SimpleExpr], QueryError> {
        self.filter_cache
            .get_or_try_init(|| {
                self.filters
                    .iter()
                    .map(|token| {
                        let field = self.fields.get(&token.field).ok_or_else(|| {
                            QueryError::UnknownFilterField {
                                field: token.field.clone(),
                                allowed: self.fields.names().map(str::to_string).collect(),
                            }
                        })?;
                        compile_filter(token, field)
                    })
                    .collect()
            })
            .map(Vec::as_slice)
    }

    /// All filter predicates ANDed together.
    pub fn condition(&self) -> Result<Condition, QueryError> {
        Ok(self
            .filter_fields()?
            .iter()
            .cloned()
            .fold(Condition::all(), |cond, expr| cond.add(expr)))
    }
}

/// Make `%` and `_` in user input match literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn compile_filter<E: EntityTrait>(
    token: &FilterToken,
    field: &Field<E>,
) -> Result<SimpleExpr, QueryError> {
    match token.op {
        Operator::ILike | Operator::NotILike => {
            if field.kind != FieldKind::String {
                return Err(QueryError::InvalidValue {
                    field: token.field.clone(),
                    kind: field.kind,
                    value: token.raw.clone(),
                });
            }
            let pattern =
                LikeExpr::new(format!("%{}%", escape_like(&token.raw.to_lowercase()))).escape('\\');
            let lowered = Expr::expr(Func::lower(Expr::col((E::default(), field.col))));
            Ok(if token.op == Operator::ILike {
                lowered.like(pattern)
            } else {
                lowered.not_like(pattern)
            })
        }
        Operator::Eq | Operator::Ne | Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le => {
            let scalar = coerce(&token.field, field.kind, &token.raw)?;
            let value = scalar_to_value(&token.field, field.kind, scalar)?;
            let col = field.col;
            Ok(match token.op {
                Operator::Ne => col.ne(value),
                Operator::Gt => col.gt(value),
                Operator::Ge => col.gte(value),
                Operator::Lt => col.lt(value),
                Operator::Le => col.lte(value),
                _ => col.eq(value),
            })
        }
    }
}

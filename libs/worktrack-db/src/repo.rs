//! Generic persistence operations over any [`Resource`].
//!
//! Every operation runs on the session's transaction. Mutations take a
//! `commit` flag: `true` finalizes the transaction after the statement,
//! `false` leaves it open for further work. A failed operation rolls the
//! transaction back before returning its error.

use std::marker::PhantomData;

use chrono::Utc;
use sea_orm::{
    sea_query::{OnConflict, SimpleExpr},
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait,
    EntityTrait, IdenStatic, Iterable, LoaderTrait, ModelTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, Related, StatementBuilder, Value,
};
use tracing::{debug, warn};

use crate::error::{RepoError, RepoResult};
use crate::query::{json_to_value, FieldMap, PaginationQuery};
use crate::session::DbSession;

pub const DEFAULT_LIMIT: u64 = 20;
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// An entity the generic repository can persist.
pub trait Resource: EntityTrait {
    /// Name used in not-found errors.
    const NAME: &'static str;

    /// Api-visible fields; also resolves keys of JSON payloads.
    fn fields() -> FieldMap<Self>;

    fn primary_key() -> Self::Column;

    /// Fill generated values (id, timestamps) before insert.
    fn on_insert(_am: &mut Self::ActiveModel) {}

    /// Column refreshed on every update or upsert.
    fn updated_at() -> Option<Self::Column> {
        None
    }
}

/// Write input: a typed active model or a JSON object keyed by api field names.
#[derive(Clone, Debug)]
pub enum Payload<A> {
    Active(A),
    Map(serde_json::Map<String, serde_json::Value>),
}

impl<A> From<A> for Payload<A>
where
    A: ActiveModelTrait,
{
    fn from(am: A) -> Self {
        Payload::Active(am)
    }
}

impl<A> Payload<A> {
    pub fn map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Payload::Map(map)
    }
}

/// Single-row selector: a value matched against a field (primary key by
/// default) plus optional extra predicates.
#[derive(Clone, Debug)]
pub struct Lookup<E: EntityTrait> {
    value: Value,
    field: Option<E::Column>,
    predicates: Vec<SimpleExpr>,
}

impl<E: Resource> Lookup<E> {
    pub fn id(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            field: None,
            predicates: Vec::new(),
        }
    }

    pub fn by(field: E::Column, value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            field: Some(field),
            predicates: Vec::new(),
        }
    }

    pub fn and(mut self, predicate: SimpleExpr) -> Self {
        self.predicates.push(predicate);
        self
    }

    fn condition(&self) -> Condition {
        let col = self.field.unwrap_or_else(E::primary_key);
        self.predicates
            .iter()
            .cloned()
            .fold(Condition::all().add(col.eq(self.value.clone())), |c, p| {
                c.add(p)
            })
    }
}

/// Predicates, ordering and limit for list reads.
#[derive(Clone, Debug)]
pub struct Criteria<E: EntityTrait> {
    pub predicates: Vec<SimpleExpr>,
    pub order: Vec<(E::Column, Order)>,
    pub limit: Option<u64>,
}

impl<E: EntityTrait> Default for Criteria<E> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            order: Vec::new(),
            limit: Some(DEFAULT_LIMIT),
        }
    }
}

impl<E: EntityTrait> Criteria<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: SimpleExpr) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, col: E::Column, order: Order) -> Self {
        self.order.push((col, order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.limit = None;
        self
    }

    fn condition(&self) -> Condition {
        and_all(&self.predicates)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnConflictMode {
    DoNothing,
    #[default]
    DoUpdate,
}

/// Conflict target and action for upserts.
#[derive(Clone, Debug)]
pub struct UpsertOptions<E: EntityTrait> {
    /// Conflict target; the primary key when empty.
    pub index: Vec<E::Column>,
    pub mode: OnConflictMode,
}

impl<E: EntityTrait> Default for UpsertOptions<E> {
    fn default() -> Self {
        Self {
            index: Vec::new(),
            mode: OnConflictMode::DoUpdate,
        }
    }
}

impl<E: EntityTrait> UpsertOptions<E> {
    pub fn on(index: impl IntoIterator<Item = E::Column>) -> Self {
        Self {
            index: index.into_iter().collect(),
            mode: OnConflictMode::DoUpdate,
        }
    }

    pub fn do_nothing(mut self) -> Self {
        self.mode = OnConflictMode::DoNothing;
        self
    }
}

fn and_all(predicates: &[SimpleExpr]) -> Condition {
    predicates
        .iter()
        .cloned()
        .fold(Condition::all(), |c, p| c.add(p))
}

/// Stateless repository for entity `E`; all state lives in the session.
pub struct Repository<E> {
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Repository<E> {}

impl<E> Default for Repository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").finish()
    }
}

impl<E> Repository<E> {
    pub const fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<E> Repository<E>
where
    E: Resource,
    E::Model: Send + Sync,
    E::ActiveModel: Send,
{
    /* ---------- reads ---------- */

    /// Whether a row matches. In strict mode a miss is `NotFound`.
    pub async fn exists(&self, session: &DbSession, lookup: &Lookup<E>, strict: bool) -> RepoResult<bool> {
        let result: RepoResult<bool> = async {
            let tx = session.tx().await?;
            let n = E::find().filter(lookup.condition()).count(&*tx).await?;
            Ok(n > 0)
        }
        .await;
        match result {
            Ok(false) if strict => Err(RepoError::not_found(E::NAME)),
            other => other,
        }
    }

    pub async fn find_one(&self, session: &DbSession, lookup: &Lookup<E>) -> RepoResult<Option<E::Model>> {
        let tx = session.tx().await?;
        Ok(E::find().filter(lookup.condition()).one(&*tx).await?)
    }

    pub async fn get_one(&self, session: &DbSession, lookup: &Lookup<E>) -> RepoResult<E::Model> {
        self.find_one(session, lookup)
            .await?
            .ok_or_else(|| RepoError::not_found(E::NAME))
    }

    pub async fn get_all(&self, session: &DbSession, criteria: &Criteria<E>) -> RepoResult<Vec<E::Model>> {
        let mut select = E::find().filter(criteria.condition());
        for (col, order) in &criteria.order {
            select = select.order_by(*col, order.clone());
        }
        if let Some(limit) = criteria.limit {
            select = select.limit(limit);
        }
        let tx = session.tx().await?;
        Ok(select.all(&*tx).await?)
    }

    /// One page of rows plus the total count under the same predicates.
    ///
    /// Without a query the first page of `criteria.limit` rows is returned.
    pub async fn get_many(
        &self,
        session: &DbSession,
        query: Option<&PaginationQuery<E>>,
        criteria: &Criteria<E>,
    ) -> RepoResult<query_core::Paginated<E::Model>> {
        let mut cond = criteria.condition();
        let (page, size, offset) = match query {
            Some(q) => {
                for expr in q.filter_fields()? {
                    cond = cond.add(expr.clone());
                }
                (q.page(), q.size(), q.offset())
            }
            None => (1, criteria.limit.unwrap_or(DEFAULT_LIMIT), 0),
        };

        let mut select = E::find().filter(cond);
        if let Some(q) = query {
            for (col, order) in q.sort_fields()? {
                select = select.order_by(*col, order.clone());
            }
        }
        for (col, order) in &criteria.order {
            select = select.order_by(*col, order.clone());
        }

        let tx = session.tx().await?;
        let total = select.clone().count(&*tx).await?;
        let rows = select.offset(offset).limit(size).all(&*tx).await?;
        debug!(entity = E::NAME, total, page, size, returned = rows.len(), "paginated read");
        Ok(query_core::Paginated::new(rows, total, page, size))
    }

    /// Rows with their children of relation `R`, one extra query for the relation.
    pub async fn get_all_with<R>(
        &self,
        session: &DbSession,
        criteria: &Criteria<E>,
    ) -> RepoResult<Vec<(E::Model, Vec<R::Model>)>>
    where
        R: EntityTrait,
        R::Model: Send + Sync,
        E: Related<R>,
    {
        let parents = self.get_all(session, criteria).await?;
        let tx = session.tx().await?;
        let children = parents.load_many(R::default(), &*tx).await?;
        Ok(parents.into_iter().zip(children).collect())
    }

    pub async fn get_one_with<R>(
        &self,
        session: &DbSession,
        lookup: &Lookup<E>,
    ) -> RepoResult<(E::Model, Vec<R::Model>)>
    where
        R: EntityTrait,
        R::Model: Send + Sync,
        E: Related<R>,
    {
        let model = self.get_one(session, lookup).await?;
        let tx = session.tx().await?;
        let children = model.find_related(R::default()).all(&*tx).await?;
        Ok((model, children))
    }

    /// Rows with their parent of relation `P`, one extra query for the relation.
    pub async fn get_all_with_parent<P>(
        &self,
        session: &DbSession,
        criteria: &Criteria<E>,
    ) -> RepoResult<Vec<(E::Model, Option<P::Model>)>>
    where
        P: EntityTrait,
        P::Model: Send + Sync,
        E: Related<P>,
    {
        let rows = self.get_all(session, criteria).await?;
        let tx = session.tx().await?;
        let parents = rows.load_one(P::default(), &*tx).await?;
        Ok(rows.into_iter().zip(parents).collect())
    }

    /* ---------- inserts ---------- */

    pub async fn create(
        &self,
        session: &DbSession,
        payload: Payload<E::ActiveModel>,
        commit: bool,
    ) -> RepoResult<E::Model> {
        let fields = E::fields();
        let mut am = into_active::<E>(payload, &fields)?;
        E::on_insert(&mut am);

        let result: RepoResult<E::Model> = async {
            let tx = session.tx().await?;
            let stmt = insert_returning::<E>(vec![am], None);
            fetch_returning::<E, _, _>(&*tx, &stmt)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| RepoError::not_found(E::NAME))
        }
        .await;
        if let Err(err) = &result {
            warn!(entity = E::NAME, error = %err, "create failed");
        }
        session.finish(result, commit).await
    }

    /// Insert in batches of `batch_size`, preserving input order.
    pub async fn create_many(
        &self,
        session: &DbSession,
        payloads: Vec<Payload<E::ActiveModel>>,
        batch_size: usize,
        commit: bool,
    ) -> RepoResult<Vec<E::Model>> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        let fields = E::fields();
        let models = payloads
            .into_iter()
            .map(|p| {
                let mut am = into_active::<E>(p, &fields)?;
                E::on_insert(&mut am);
                Ok(am)
            })
            .collect::<RepoResult<Vec<_>>>()?;

        let result: RepoResult<Vec<E::Model>> = async {
            let tx = session.tx().await?;
            let mut out = Vec::with_capacity(models.len());
            for run in signature_runs::<E>(models) {
                for chunk in chunked(run, batch_size.max(1)) {
                    let stmt = insert_returning::<E>(chunk, None);
                    out.extend(fetch_returning::<E, _, _>(&*tx, &stmt).await?);
                }
            }
            Ok(out)
        }
        .await;
        if let Ok(rows) = &result {
            debug!(entity = E::NAME, count = rows.len(), "bulk insert");
        }
        session.finish(result, commit).await
    }

    /* ---------- updates ---------- */

    /// Update the single row matching `predicates`; `NotFound` if none matched.
    pub async fn update_one(
        &self,
        session: &DbSession,
        payload: Payload<E::ActiveModel>,
        predicates: &[SimpleExpr],
        commit: bool,
    ) -> RepoResult<E::Model> {
        if predicates.is_empty() {
            return Err(RepoError::MissingPredicates { op: "update_one" });
        }
        let am = prepare_update::<E>(payload)?;

        let result: RepoResult<E::Model> = async {
            let tx = session.tx().await?;
            let mut stmt = E::update_many()
                .set(am)
                .filter(and_all(predicates))
                .into_query();
            stmt.returning_all();
            fetch_returning::<E, _, _>(&*tx, &stmt)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| RepoError::not_found(E::NAME))
        }
        .await;
        session.finish(result, commit).await
    }

    /// Update rows by primary key; every payload must carry it.
    ///
    /// Rows carrying only the key are returned untouched. The updated rows
    /// are re-read by id; their order is not guaranteed.
    pub async fn update_many_by_id(
        &self,
        session: &DbSession,
        payloads: Vec<Payload<E::ActiveModel>>,
        commit: bool,
    ) -> RepoResult<Vec<E::Model>> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        let pk = E::primary_key();
        let fields = E::fields();
        let mut updates = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let mut am = into_active::<E>(payload, &fields)?;
            let id = present_value(&am.get(pk)).ok_or(RepoError::MissingKey {
                op: "update_many_by_id",
            })?;
            am.not_set(pk);
            let changes = has_assignments::<E>(&am).then(|| {
                stamp_updated_at::<E>(&mut am);
                am
            });
            updates.push((id, changes));
        }

        let result: RepoResult<Vec<E::Model>> = async {
            let tx = session.tx().await?;
            let mut ids = Vec::with_capacity(updates.len());
            for (id, changes) in updates {
                if let Some(am) = changes {
                    E::update_many()
                        .set(am)
                        .filter(pk.eq(id.clone()))
                        .exec(&*tx)
                        .await?;
                }
                ids.push(id);
            }
            Ok(E::find().filter(pk.is_in(ids)).all(&*tx).await?)
        }
        .await;
        session.finish(result, commit).await
    }

    /// Bulk assignment over every row matching `predicates`.
    pub async fn update_many_by_whereclause(
        &self,
        session: &DbSession,
        payload: Payload<E::ActiveModel>,
        predicates: &[SimpleExpr],
        commit: bool,
    ) -> RepoResult<()> {
        if predicates.is_empty() {
            return Err(RepoError::MissingPredicates {
                op: "update_many_by_whereclause",
            });
        }
        let am = prepare_update::<E>(payload)?;

        let result: RepoResult<()> = async {
            let tx = session.tx().await?;
            let res = E::update_many()
                .set(am)
                .filter(and_all(predicates))
                .exec(&*tx)
                .await?;
            debug!(entity = E::NAME, rows = res.rows_affected, "bulk update");
            Ok(())
        }
        .await;
        session.finish(result, commit).await
    }

    /* ---------- upserts ---------- */

    pub async fn upsert_one(
        &self,
        session: &DbSession,
        payload: Payload<E::ActiveModel>,
        options: &UpsertOptions<E>,
        commit: bool,
    ) -> RepoResult<E::Model> {
        self.upsert_many(session, vec![payload], options, commit)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::not_found(E::NAME))
    }

    /// Insert or, on conflict over the index fields, update/skip.
    ///
    /// Validation happens before any statement: every index field must be
    /// supplied and at least one non-index field must be present.
    pub async fn upsert_many(
        &self,
        session: &DbSession,
        payloads: Vec<Payload<E::ActiveModel>>,
        options: &UpsertOptions<E>,
        commit: bool,
    ) -> RepoResult<Vec<E::Model>> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        let index: Vec<E::Column> = if options.index.is_empty() {
            vec![E::primary_key()]
        } else {
            options.index.clone()
        };
        let index_names: Vec<String> = index.iter().map(|c| c.as_str().to_string()).collect();

        let fields = E::fields();
        let mut rows = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let mut am = into_active::<E>(payload, &fields)?;
            let supplied = set_columns::<E>(&am);

            let missing: Vec<String> = index_names
                .iter()
                .filter(|name| !supplied.iter().any(|s| s.as_str() == name.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(RepoError::MissingIndexField { missing });
            }
            if supplied
                .iter()
                .all(|c| index_names.iter().any(|n| n == c.as_str()))
            {
                return Err(RepoError::UpsertInvalid);
            }

            let key: Vec<Value> = index
                .iter()
                .filter_map(|c| present_value(&am.get(*c)))
                .collect();
            let mut update_cols: Vec<E::Column> = supplied
                .into_iter()
                .filter(|c| !index_names.iter().any(|n| n == c.as_str()))
                .collect();
            E::on_insert(&mut am);
            if let Some(col) = E::updated_at() {
                if !update_cols.iter().any(|c| c.as_str() == col.as_str()) {
                    update_cols.push(col);
                }
            }
            rows.push((key, update_cols, am));
        }

        let mode = options.mode;
        let result: RepoResult<Vec<E::Model>> = async {
            let tx = session.tx().await?;
            let mut out = Vec::with_capacity(rows.len());
            let mut keys = Vec::with_capacity(rows.len());
            for (update_cols, run) in update_runs::<E>(rows) {
                let mut on_conflict = OnConflict::columns(index.iter().copied());
                match mode {
                    OnConflictMode::DoNothing => on_conflict.do_nothing(),
                    OnConflictMode::DoUpdate => on_conflict.update_columns(update_cols),
                };
                for chunk in chunked(run, DEFAULT_BATCH_SIZE) {
                    let (chunk_keys, models): (Vec<_>, Vec<_>) = chunk.into_iter().unzip();
                    keys.extend(chunk_keys);
                    let stmt = insert_returning::<E>(models, Some(on_conflict.clone()));
                    out.extend(fetch_returning::<E, _, _>(&*tx, &stmt).await?);
                }
            }

            if mode == OnConflictMode::DoNothing {
                // conflicting rows are not returned; read them back by index values
                let by_key = keys.into_iter().fold(Condition::any(), |any, key| {
                    let row = index
                        .iter()
                        .zip(key)
                        .fold(Condition::all(), |all, (col, v)| all.add(col.eq(v)));
                    any.add(row)
                });
                out = E::find().filter(by_key).all(&*tx).await?;
            }
            Ok(out)
        }
        .await;
        if let Err(err) = &result {
            warn!(entity = E::NAME, error = %err, "upsert failed");
        }
        session.finish(result, commit).await
    }

    /* ---------- deletes ---------- */

    pub async fn delete_one(
        &self,
        session: &DbSession,
        lookup: &Lookup<E>,
        commit: bool,
    ) -> RepoResult<E::Model> {
        let result: RepoResult<E::Model> = async {
            let tx = session.tx().await?;
            let mut stmt = E::delete_many().filter(lookup.condition()).into_query();
            stmt.returning_all();
            fetch_returning::<E, _, _>(&*tx, &stmt)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| RepoError::not_found(E::NAME))
        }
        .await;
        session.finish(result, commit).await
    }

    /// Delete every row matching `predicates` and return them.
    pub async fn delete_many(
        &self,
        session: &DbSession,
        predicates: &[SimpleExpr],
        commit: bool,
    ) -> RepoResult<Vec<E::Model>> {
        if predicates.is_empty() {
            return Err(RepoError::MissingPredicates { op: "delete_many" });
        }
        let result: RepoResult<Vec<E::Model>> = async {
            let tx = session.tx().await?;
            let mut stmt = E::delete_many().filter(and_all(predicates)).into_query();
            stmt.returning_all();
            Ok(fetch_returning::<E, _, _>(&*tx, &stmt).await?)
        }
        .await;
        session.finish(result, commit).await
    }
}

/* ---------- helpers ---------- */

fn into_active<E: Resource>(
    payload: Payload<E::ActiveModel>,
    fields: &FieldMap<E>,
) -> RepoResult<E::ActiveModel> {
    match payload {
        Payload::Active(am) => Ok(am),
        Payload::Map(map) => {
            let mut am = <E::ActiveModel as ActiveModelBehavior>::new();
            for (key, json) in map {
                if json.is_null() {
                    continue;
                }
                let field = fields
                    .get(&key)
                    .ok_or_else(|| RepoError::UnknownField { field: key.clone() })?;
                let value = json_to_value(&key, field.kind, &json)?;
                am.set(field.col, value);
            }
            Ok(am)
        }
    }
}

/// Convert an update payload and stamp `updated_at`.
fn prepare_update<E: Resource>(payload: Payload<E::ActiveModel>) -> RepoResult<E::ActiveModel> {
    let fields = E::fields();
    let mut am = into_active::<E>(payload, &fields)?;
    if set_columns::<E>(&am).is_empty() {
        return Err(RepoError::EmptyPayload);
    }
    stamp_updated_at::<E>(&mut am);
    Ok(am)
}

fn stamp_updated_at<E: Resource>(am: &mut E::ActiveModel) {
    if let Some(col) = E::updated_at() {
        if !am.get(col).is_set() {
            am.set(col, Value::from(Utc::now()));
        }
    }
}

fn present_value(v: &ActiveValue<Value>) -> Option<Value> {
    match v {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v.clone()),
        ActiveValue::NotSet => None,
    }
}

/// Columns carrying a value, in declaration order.
fn set_columns<E: EntityTrait>(am: &E::ActiveModel) -> Vec<E::Column> {
    E::Column::iter().filter(|c| !am.is_not_set(*c)).collect()
}

fn has_assignments<E: EntityTrait>(am: &E::ActiveModel) -> bool {
    E::Column::iter().any(|c| am.get(c).is_set())
}

fn signature<E: EntityTrait>(am: &E::ActiveModel) -> Vec<String> {
    set_columns::<E>(am)
        .iter()
        .map(|c| c.as_str().to_string())
        .collect()
}

/// Split into contiguous runs sharing the same set of columns; a multi-row
/// INSERT needs one column list.
fn signature_runs<E: EntityTrait>(models: Vec<E::ActiveModel>) -> Vec<Vec<E::ActiveModel>> {
    let mut runs: Vec<(Vec<String>, Vec<E::ActiveModel>)> = Vec::new();
    for am in models {
        let sig = signature::<E>(&am);
        match runs.last_mut() {
            Some((last, run)) if *last == sig => run.push(am),
            _ => runs.push((sig, vec![am])),
        }
    }
    runs.into_iter().map(|(_, run)| run).collect()
}

type UpsertRow<E> = (
    Vec<Value>,
    Vec<<E as EntityTrait>::Column>,
    <E as EntityTrait>::ActiveModel,
);

/// Like [`signature_runs`], additionally keyed by the update column list.
fn update_runs<E: EntityTrait>(
    rows: Vec<UpsertRow<E>>,
) -> Vec<(Vec<E::Column>, Vec<(Vec<Value>, E::ActiveModel)>)> {
    let mut runs: Vec<(Vec<String>, Vec<E::Column>, Vec<(Vec<Value>, E::ActiveModel)>)> = Vec::new();
    for (key, cols, am) in rows {
        let mut sig = signature::<E>(&am);
        sig.push("|".to_string());
        sig.extend(cols.iter().map(|c| c.as_str().to_string()));
        match runs.last_mut() {
            Some((last, _, run)) if *last == sig => run.push((key, am)),
            _ => runs.push((sig, cols, vec![(key, am)])),
        }
    }
    runs.into_iter().map(|(_, cols, run)| (cols, run)).collect()
}

fn chunked<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(size.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == size {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn insert_returning<E: EntityTrait>(
    models: Vec<E::ActiveModel>,
    on_conflict: Option<OnConflict>,
) -> sea_orm::sea_query::InsertStatement {
    let mut insert = E::insert_many(models);
    if let Some(oc) = on_conflict {
        insert = insert.on_conflict(oc);
    }
    let mut stmt = insert.into_query();
    stmt.returning_all();
    stmt
}

/// Run a statement carrying `RETURNING *` and decode the rows as models.
async fn fetch_returning<E, C, S>(conn: &C, stmt: &S) -> Result<Vec<E::Model>, sea_orm::DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
    S: StatementBuilder,
{
    let built = conn.get_database_backend().build(stmt);
    E::find().from_raw_sql(built).all(conn).await
}

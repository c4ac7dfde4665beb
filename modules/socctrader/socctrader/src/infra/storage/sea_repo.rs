//! `SeaORM` implementation of [`RecordRepository`], shared by every record type.
//!
//! Each record type supplies a [`SeaBinding`]: its entity, the `id` and
//! `version` columns, the sortable fields and the row conversions. Updates run
//! in a transaction: `UPDATE ... SET version = version + 1, <fields> WHERE id = ?`
//! followed by a re-read, so the returned version is the one committed.

use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, Value,
};
use socckit::{Page, PageRequest, SortDir};
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::record::Record;
use crate::domain::repos::RecordRepository;
use crate::infra::storage::db::db_err;

/// Rows fetched per round trip by [`RecordRepository::list_all`].
pub const DEFAULT_SCAN_CHUNK: u64 = 500;

type EntityOf<E> = <E as SeaBinding>::Entity;
type ModelOf<E> = <EntityOf<E> as EntityTrait>::Model;
type ActiveModelOf<E> = <EntityOf<E> as EntityTrait>::ActiveModel;
type ColumnOf<E> = <EntityOf<E> as EntityTrait>::Column;

/// Ties a record type to its table.
pub trait SeaBinding: Record {
    type Entity: EntityTrait;

    fn id_column() -> <Self::Entity as EntityTrait>::Column;

    fn version_column() -> <Self::Entity as EntityTrait>::Column;

    /// Column for a camelCase sort field; `None` when the field is not sortable.
    fn sort_column(field: &str) -> Option<<Self::Entity as EntityTrait>::Column>;

    /// A new row at version 1 with a store-assigned id.
    fn new_row(draft: Self::Draft) -> <Self::Entity as EntityTrait>::ActiveModel;

    /// Business columns to overwrite on update.
    fn field_values(draft: Self::Draft) -> Vec<(<Self::Entity as EntityTrait>::Column, Value)>;

    /// # Errors
    /// Returns [`DomainError::Database`] when a stored value cannot be decoded.
    fn from_row(row: <Self::Entity as EntityTrait>::Model) -> Result<Self, DomainError>;
}

fn sea_order(dir: SortDir) -> Order {
    match dir {
        SortDir::Asc => Order::Asc,
        SortDir::Desc => Order::Desc,
    }
}

/// ORM-based implementation of the `RecordRepository` trait.
pub struct SeaRecordRepository<E: SeaBinding> {
    db: DatabaseConnection,
    scan_chunk: u64,
    _record: PhantomData<fn() -> E>,
}

impl<E: SeaBinding> SeaRecordRepository<E> {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            scan_chunk: DEFAULT_SCAN_CHUNK,
            _record: PhantomData,
        }
    }

    #[must_use]
    pub fn with_scan_chunk(mut self, scan_chunk: u64) -> Self {
        self.scan_chunk = scan_chunk.max(1);
        self
    }

    fn order_columns(page: &PageRequest) -> Result<Vec<(ColumnOf<E>, Order)>, DomainError> {
        page.sort
            .iter()
            .map(|order| {
                E::sort_column(&order.field)
                    .map(|column| (column, sea_order(order.dir)))
                    .ok_or_else(|| DomainError::invalid_sort(E::KIND, order.field.as_str()))
            })
            .collect()
    }
}

#[async_trait]
impl<E> RecordRepository<E> for SeaRecordRepository<E>
where
    E: SeaBinding,
    ModelOf<E>: IntoActiveModel<ActiveModelOf<E>> + Send + Sync,
    ActiveModelOf<E>: Send,
{
    #[instrument(skip_all, fields(kind = %E::KIND))]
    async fn insert(&self, draft: E::Draft) -> Result<E, DomainError> {
        let row = E::new_row(draft).insert(&self.db).await.map_err(db_err)?;
        E::from_row(row)
    }

    #[instrument(skip(self, draft), fields(kind = %E::KIND))]
    async fn update(&self, id: i64, draft: E::Draft) -> Result<Option<E>, DomainError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let version = E::version_column();
        let mut stmt =
            EntityOf::<E>::update_many().col_expr(version, Expr::col(version).add(1_i64));
        for (column, value) in E::field_values(draft) {
            stmt = stmt.col_expr(column, Expr::value(value));
        }

        let result = stmt
            .filter(E::id_column().eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(db_err)?;
            debug!("no row to update");
            return Ok(None);
        }

        let row = EntityOf::<E>::find()
            .filter(E::id_column().eq(id))
            .one(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        row.map(E::from_row).transpose()
    }

    async fn find(&self, id: i64) -> Result<Option<E>, DomainError> {
        EntityOf::<E>::find()
            .filter(E::id_column().eq(id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(E::from_row)
            .transpose()
    }

    #[instrument(skip_all, fields(kind = %E::KIND, page = page.page, size = page.size))]
    async fn list(&self, page: &PageRequest) -> Result<Page<E>, DomainError> {
        let mut select = EntityOf::<E>::find();
        for (column, order) in Self::order_columns(page)? {
            select = select.order_by(column, order);
        }
        select = select.order_by(E::id_column(), Order::Asc);

        let total = EntityOf::<E>::find()
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let items = select
            .offset(page.offset())
            .limit(page.size)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(E::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, page, total))
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let result = EntityOf::<E>::delete_many()
            .filter(E::id_column().eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    #[instrument(skip_all, fields(kind = %E::KIND))]
    async fn list_all(&self) -> Result<Vec<E>, DomainError> {
        let mut records = Vec::new();
        let mut after: Option<i64> = None;

        loop {
            let mut select = EntityOf::<E>::find();
            if let Some(last) = after {
                select = select.filter(E::id_column().gt(last));
            }

            let rows = select
                .order_by(E::id_column(), Order::Asc)
                .limit(self.scan_chunk)
                .all(&self.db)
                .await
                .map_err(db_err)?;

            let fetched = u64::try_from(rows.len()).unwrap_or(u64::MAX);
            for row in rows {
                let record = E::from_row(row)?;
                after = Some(record.id());
                records.push(record);
            }

            if fetched < self.scan_chunk {
                break;
            }
        }

        debug!(rows = records.len(), "scanned table");
        Ok(records)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        EntityOf::<E>::find()
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}

use serde::Serialize;
use serde_json::{json, Map, Value};
use sqlx::{self, postgres::PgRow, FromRow, PgConnection, PgPool, Postgres, Row, Transaction};

use crate::database::manager::DatabaseError;
use crate::database::mutation::{self, ColumnSpec};
use crate::database::query_builder::{self, QueryBuilder};
use crate::filter::{FilterData, SqlResult};

pub struct Repository<T> {
    table_name: String,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            table_name: table_name.into(),
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(FilterData { limit: Some(1), ..filter_data })?
            .select_optional(&self.pool)
            .await
    }

    pub async fn select_404(&self, filter_data: FilterData, what: &str) -> Result<T, DatabaseError> {
        self.select_one(filter_data)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", what)))
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(&self.table_name)?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }
}

/// Repository whose every statement is pinned to one kindergarten.
///
/// The tenant predicate is applied through [`crate::filter::Filter::scope`],
/// so a caller-supplied WHERE document can narrow results but never reach
/// rows of another kindergarten. Rows of other tenants read as "not found".
pub struct TenantRepository<T> {
    table_name: &'static str,
    pool: PgPool,
    kindergarten_id: i32,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> TenantRepository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: &'static str, pool: PgPool, kindergarten_id: i32) -> Self {
        Self {
            table_name,
            pool,
            kindergarten_id,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn kindergarten_id(&self) -> i32 {
        self.kindergarten_id
    }

    fn query(&self) -> Result<QueryBuilder<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?.scope("kindergarten_id", json!(self.kindergarten_id))
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.query()?.filter(filter_data)?.select_all(&self.pool).await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        self.query()?
            .filter(FilterData { limit: Some(1), ..filter_data })?
            .select_optional(&self.pool)
            .await
    }

    pub async fn select_id(&self, id: i32) -> Result<Option<T>, DatabaseError> {
        self.select_one(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await
    }

    pub async fn select_404(&self, id: i32, what: &str) -> Result<T, DatabaseError> {
        self.select_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", what)))
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        self.query()?.filter(filter_data)?.count(&self.pool).await
    }

    pub async fn insert(&self, columns: &[ColumnSpec], values: &Map<String, Value>) -> Result<T, DatabaseError> {
        let sql = mutation::insert_sql(self.table_name, columns, values, self.kindergarten_id);
        query_builder::fetch_optional_as::<T>(&self.pool, &sql)
            .await?
            .ok_or_else(|| self.insert_returned_nothing())
    }

    /// Start a transaction on this repository's pool.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        Ok(self.pool.begin().await?)
    }

    /// Insert on an existing connection; the row is only visible once its transaction commits.
    pub async fn insert_on(
        &self,
        conn: &mut PgConnection,
        columns: &[ColumnSpec],
        values: &Map<String, Value>,
    ) -> Result<T, DatabaseError> {
        let sql = mutation::insert_sql(self.table_name, columns, values, self.kindergarten_id);
        query_builder::fetch_optional_as_on::<T>(conn, &sql)
            .await?
            .ok_or_else(|| self.insert_returned_nothing())
    }

    fn insert_returned_nothing(&self) -> DatabaseError {
        DatabaseError::QueryError(format!("insert into {} returned no row", self.table_name))
    }

    pub async fn update(
        &self,
        id: i32,
        columns: &[ColumnSpec],
        values: &Map<String, Value>,
        what: &str,
    ) -> Result<T, DatabaseError> {
        let Some(sql) = mutation::update_sql(self.table_name, columns, values, id, self.kindergarten_id) else {
            return self.select_404(id, what).await;
        };
        query_builder::fetch_optional_as::<T>(&self.pool, &sql)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", what)))
    }

    /// Delete and return the removed row.
    pub async fn delete(&self, id: i32, what: &str) -> Result<T, DatabaseError> {
        let sql = SqlResult {
            query: format!(
                "DELETE FROM \"{}\" WHERE \"id\" = $1 AND \"kindergarten_id\" = $2 RETURNING *",
                self.table_name
            ),
            params: vec![json!(id), json!(self.kindergarten_id)],
        };
        query_builder::fetch_optional_as::<T>(&self.pool, &sql)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", what)))
    }

    /// Highest `display_order` in this kindergarten, 0 when empty.
    pub async fn max_display_order(&self) -> Result<i32, DatabaseError> {
        let query = format!(
            "SELECT COALESCE(MAX(\"display_order\"), 0) AS max_order FROM \"{}\" WHERE \"kindergarten_id\" = $1",
            self.table_name
        );
        let row = sqlx::query(&query)
            .bind(self.kindergarten_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i32, _>("max_order")?)
    }
}

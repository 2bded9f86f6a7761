//! PostgreSQL destination for generated invoice rows
//!
//! Connections are opened per loader invocation; one transaction per
//! generated table, all rows or none.

use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

use super::table::DataTable;

/// Fixed destination table for persisted rows.
pub const DESTINATION_TABLE: &str = "tbl_captura_ia";

/// Connection to the capture database.
pub struct CaptureDb {
    client: Client,
}

impl CaptureDb {
    /// Connect using the configured credentials.
    ///
    /// Connection failures surface as `StoreUnavailable`, distinct from
    /// statement failures.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.dbname)
            .user(&config.user)
            .password(&config.password);

        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("database connection failed: {}", e)))?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!("database connection error: {}", err);
            }
        });

        Ok(Self { client })
    }

    /// Insert every row of `table` into the destination table inside one
    /// transaction.
    ///
    /// The quoted column list is taken verbatim from the table's own
    /// columns, so the statement is only as safe as the upstream schema
    /// discipline.
    pub async fn insert_rows(&mut self, table: &DataTable) -> Result<usize> {
        if table.is_empty() {
            return Err(Error::Validation("no rows to insert".to_string()));
        }

        let sql = multi_row_insert_sql(DESTINATION_TABLE, table.columns(), table.row_count());
        let mut params: Vec<&(dyn ToSql + Sync)> =
            Vec::with_capacity(table.row_count() * table.columns().len());
        for row in table.rows() {
            for cell in row {
                params.push(cell);
            }
        }

        let transaction = self
            .client
            .transaction()
            .await
            .map_err(|e| Error::Database(format!("failed to begin transaction: {}", e)))?;

        match transaction.execute(sql.as_str(), &params).await {
            Ok(_) => {
                transaction
                    .commit()
                    .await
                    .map_err(|e| Error::Database(format!("commit failed: {}", e)))?;
                Ok(table.row_count())
            }
            Err(e) => {
                // Roll back before surfacing so a partial insert is never visible
                if let Err(rollback_err) = transaction.rollback().await {
                    tracing::warn!("rollback after failed insert also failed: {}", rollback_err);
                }
                Err(Error::Database(format!("insert failed: {}", e)))
            }
        }
    }
}

/// Build `INSERT INTO "t" ("c1", "c2") VALUES ($1, $2), ($3, $4), ...`
/// for `rows` rows of `columns.len()` cells each.
pub fn multi_row_insert_sql(table: &str, columns: &[String], rows: usize) -> String {
    let column_list = columns
        .iter()
        .map(|column| format!("\"{}\"", column))
        .collect::<Vec<_>>()
        .join(", ");

    let width = columns.len();
    let mut sql = format!("INSERT INTO \"{}\" ({}) VALUES ", table, column_list);
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for column in 0..width {
            if column > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&format!("${}", row * width + column + 1));
        }
        sql.push(')');
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_quotes_columns_and_numbers_placeholders() {
        let columns = vec!["item".to_string(), "page_number".to_string()];
        let sql = multi_row_insert_sql("tbl_captura_ia", &columns, 3);
        assert_eq!(
            sql,
            "INSERT INTO \"tbl_captura_ia\" (\"item\", \"page_number\") \
             VALUES ($1, $2), ($3, $4), ($5, $6)"
        );
    }

    #[test]
    fn insert_sql_single_row() {
        let columns = vec!["description".to_string()];
        let sql = multi_row_insert_sql("tbl_captura_ia", &columns, 1);
        assert_eq!(
            sql,
            "INSERT INTO \"tbl_captura_ia\" (\"description\") VALUES ($1)"
        );
    }
}

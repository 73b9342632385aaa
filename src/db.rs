use crate::app::ports::RateStore;
use crate::error::StoreError;
use crate::types::{Category, RateRecord};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::info;

/// SQLite-backed rate store. Each replace is one transaction, so a failure
/// leaves the previous snapshot for that category in place.
pub struct SqliteRateStore {
    conn: Mutex<Connection>,
}

impl SqliteRateStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::connection(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(db_path)?;
        info!("Opened rate store at {}", db_path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rates (
                vendor_id     TEXT NOT NULL,
                category      TEXT NOT NULL,
                position      INTEGER NOT NULL,
                detail_name   TEXT NOT NULL CHECK (length(detail_name) > 0),
                we_buy        TEXT NOT NULL,
                we_sell       TEXT,
                purity        TEXT,
                extracted_at  INTEGER NOT NULL,
                PRIMARY KEY (vendor_id, category, position)
            );
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn replace_sync(
        &self,
        vendor_id: &str,
        category: Category,
        records: &[RateRecord],
    ) -> Result<(), StoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::connection("rate store connection lock poisoned"))?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM rates WHERE vendor_id = ?1 AND category = ?2",
            params![vendor_id, category.as_str()],
        )?;
        let now = Utc::now().timestamp();
        for (position, r) in records.iter().enumerate() {
            tx.execute(
                "INSERT INTO rates (vendor_id, category, position, detail_name, we_buy, we_sell, purity, extracted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    vendor_id,
                    category.as_str(),
                    position as i64,
                    r.detail_name,
                    r.we_buy.to_string(),
                    r.we_sell.map(|d| d.to_string()),
                    r.purity,
                    now
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list_sync(&self, vendor_id: &str) -> Result<Vec<RateRecord>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::connection("rate store connection lock poisoned"))?;
        let mut stmt = conn.prepare(
            "SELECT category, detail_name, we_buy, we_sell, purity FROM rates
             WHERE vendor_id = ?1
             ORDER BY CASE category WHEN 'OurRates' THEN 0 ELSE 1 END, position",
        )?;
        let mut rows = stmt.query(params![vendor_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let category: String = row.get(0)?;
            let we_buy: String = row.get(2)?;
            let we_sell: Option<String> = row.get(3)?;
            out.push(RateRecord {
                vendor_id: vendor_id.to_string(),
                category: Category::parse(&category)
                    .ok_or_else(|| StoreError::constraint(format!("unknown category '{}'", category)))?,
                detail_name: row.get(1)?,
                we_buy: read_decimal(&we_buy)?,
                we_sell: we_sell.as_deref().map(read_decimal).transpose()?,
                purity: row.get(4)?,
            });
        }
        Ok(out)
    }
}

fn read_decimal(s: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(s).map_err(|e| StoreError::constraint(format!("bad stored decimal '{}': {}", s, e)))
}

#[async_trait]
impl RateStore for SqliteRateStore {
    async fn replace(
        &self,
        vendor_id: &str,
        category: Category,
        records: &[RateRecord],
    ) -> Result<(), StoreError> {
        self.replace_sync(vendor_id, category, records)
    }

    async fn list(&self, vendor_id: &str) -> Result<Vec<RateRecord>, StoreError> {
        self.list_sync(vendor_id)
    }
}

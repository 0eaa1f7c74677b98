use std::path::Path;

use chrono::NaiveDate;
use sqlx::{Connection, Row, SqliteConnection};

use crate::{
    database::{self, quote_identifier},
    declare::SaveMode,
    error::{Error, Result},
    logging,
    table::{require_table, KeyColumn, KeyKind, KeyValue, Table, Tabular},
};

/// 已存在的資料表結構
///
/// 文字主鍵宣告為 `TEXT`，日期主鍵宣告為 `DATE`，數值欄位宣告為 `REAL`。
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSchema {
    pub keys: Vec<KeyColumn>,
    pub columns: Vec<String>,
}

impl StoredSchema {
    fn from_declared(declared: Vec<(String, String)>) -> Self {
        let mut keys = Vec::new();
        let mut columns = Vec::new();

        for (name, decl_type) in declared {
            match key_kind_of(&decl_type) {
                Some(KeyKind::Text) => keys.push(KeyColumn::text(&name)),
                Some(KeyKind::Date) => keys.push(KeyColumn::date(&name)),
                None => columns.push(name),
            }
        }

        StoredSchema { keys, columns }
    }

    /// append 前檢查：主鍵必須相同，新資料的數值欄位必須都已存在
    fn check_append(&self, table: &Table, table_name: &str) -> Result<()> {
        let mut stored_keys = self.keys.clone();
        let mut incoming_keys = table.keys().to_vec();
        stored_keys.sort_by(|a, b| a.name.cmp(&b.name));
        incoming_keys.sort_by(|a, b| a.name.cmp(&b.name));

        if stored_keys != incoming_keys {
            return Err(Error::schema_mismatch(
                table_name,
                format!(
                    "stored keys {:?} differ from incoming keys {:?}",
                    self.keys.iter().map(|k| &k.name).collect::<Vec<_>>(),
                    table.key_names()
                ),
            ));
        }

        let unknown: Vec<&String> = table
            .columns()
            .iter()
            .filter(|c| !self.columns.contains(c))
            .collect();

        if !unknown.is_empty() {
            return Err(Error::schema_mismatch(
                table_name,
                format!("columns {:?} do not exist in the stored table", unknown),
            ));
        }

        Ok(())
    }
}

fn key_kind_of(decl_type: &str) -> Option<KeyKind> {
    let upper = decl_type.trim().to_uppercase();
    if upper.contains("CHAR") || upper.contains("TEXT") || upper.contains("CLOB") {
        Some(KeyKind::Text)
    } else if upper.contains("DATE") || upper.contains("TIME") {
        Some(KeyKind::Date)
    } else {
        None
    }
}

fn declared_type(kind: KeyKind) -> &'static str {
    match kind {
        KeyKind::Text => "TEXT",
        KeyKind::Date => "DATE",
    }
}

/// 寫入資料表
///
/// 副檔名一律換成 `.db`，檔案不存在時建立。整個寫入在同一個 transaction 內完成，
/// 失敗時 rollback；不論成功與否連線都會在回傳前關閉。
///
/// * `Replace`：刪除舊表後以新資料的欄位重建。
/// * `Append`：資料表不存在時建立；存在時主鍵必須相同、新資料的欄位必須都已存在，
///   否則回傳 [`Error::SchemaMismatch`]。舊表多出來的欄位以 NULL 填入。
///
/// 傳入的不是表格（例如 `Fetched::NoData`）時回傳 [`Error::ContractViolation`]，
/// 不會碰到檔案。
pub async fn save_sql(
    data: &impl Tabular,
    path: impl AsRef<Path>,
    table_name: &str,
    mode: SaveMode,
) -> Result<()> {
    let table = require_table(data)?;
    if table_name.trim().is_empty() {
        return Err(Error::contract("table name can not be empty"));
    }

    let path = database::resolve_path(path.as_ref());
    let mut conn = database::connect(&path, true).await?;
    let written = write_table(&mut conn, table, table_name, mode).await;
    let closed = conn.close().await;

    written?;
    closed?;

    logging::info_file_async(format!(
        "Save {} rows into {}:{} ({})",
        table.len(),
        path.display(),
        table_name,
        mode
    ));

    Ok(())
}

/// 讀回整個資料表，依寫入順序排列
///
/// 主鍵與數值欄位依宣告型別還原，日期主鍵解析回不含時間的日期。
pub async fn load_sql(path: impl AsRef<Path>, table_name: &str) -> Result<Table> {
    let path = database::resolve_path(path.as_ref());
    let mut conn = database::connect(&path, false).await?;
    let loaded = read_table(&mut conn, table_name).await;
    let closed = conn.close().await;

    let table = loaded?;
    closed?;

    Ok(table)
}

/// 讀取資料表結構，資料表不存在時回傳 `None`
pub async fn stored_schema(
    conn: &mut SqliteConnection,
    table_name: &str,
) -> Result<Option<StoredSchema>> {
    let declared: Vec<(String, String)> =
        sqlx::query_as("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
            .bind(table_name)
            .fetch_all(&mut *conn)
            .await?;

    if declared.is_empty() {
        return Ok(None);
    }

    Ok(Some(StoredSchema::from_declared(declared)))
}

async fn write_table(
    conn: &mut SqliteConnection,
    table: &Table,
    table_name: &str,
    mode: SaveMode,
) -> Result<()> {
    let mut tx = conn.begin().await?;

    match mode {
        SaveMode::Replace => {
            sqlx::query(&format!(
                "DROP TABLE IF EXISTS {}",
                quote_identifier(table_name)
            ))
            .execute(&mut *tx)
            .await?;
            create_table(&mut *tx, table, table_name).await?;
        }
        SaveMode::Append => match stored_schema(&mut *tx, table_name).await? {
            Some(schema) => schema.check_append(table, table_name)?,
            None => create_table(&mut *tx, table, table_name).await?,
        },
    }

    insert_rows(&mut *tx, table, table_name).await?;
    tx.commit().await?;

    Ok(())
}

async fn create_table(
    conn: &mut SqliteConnection,
    table: &Table,
    table_name: &str,
) -> Result<()> {
    let definitions: Vec<String> = table
        .keys()
        .iter()
        .map(|k| format!("{} {}", quote_identifier(&k.name), declared_type(k.kind)))
        .chain(
            table
                .columns()
                .iter()
                .map(|c| format!("{} REAL", quote_identifier(c))),
        )
        .collect();

    sqlx::query(&format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table_name),
        definitions.join(", ")
    ))
    .execute(&mut *conn)
    .await?;

    let key_names = table.key_names();
    let index = index_name(table_name, &key_names);
    let index_columns: Vec<String> = key_names.iter().map(|k| quote_identifier(k)).collect();
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
        quote_identifier(&index),
        quote_identifier(table_name),
        index_columns.join(", ")
    ))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// 主鍵索引名稱，每段各自加引號，不同的資料表與主鍵組合不會得到相同名稱
fn index_name(table_name: &str, key_names: &[&str]) -> String {
    let parts: Vec<String> = std::iter::once(table_name)
        .chain(key_names.iter().copied())
        .map(quote_identifier)
        .collect();
    format!("ix_{}", parts.join("_"))
}

async fn insert_rows(conn: &mut SqliteConnection, table: &Table, table_name: &str) -> Result<()> {
    let names: Vec<String> = table
        .keys()
        .iter()
        .map(|k| quote_identifier(&k.name))
        .chain(table.columns().iter().map(|c| quote_identifier(c)))
        .collect();
    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table_name),
        names.join(", "),
        placeholders
    );

    for row in table.rows() {
        let mut query = sqlx::query(&sql);
        for key in &row.key {
            query = query.bind(key.to_string());
        }
        for value in &row.values {
            query = query.bind(*value);
        }
        query.execute(&mut *conn).await?;
    }

    Ok(())
}

async fn read_table(conn: &mut SqliteConnection, table_name: &str) -> Result<Table> {
    let schema = stored_schema(conn, table_name)
        .await?
        .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;

    // 以 CAST 取值，不受宣告型別影響
    let selected: Vec<String> = schema
        .keys
        .iter()
        .map(|k| {
            let name = quote_identifier(&k.name);
            format!("CAST({} AS TEXT) AS {}", name, name)
        })
        .chain(schema.columns.iter().map(|c| {
            let name = quote_identifier(c);
            format!("CAST({} AS REAL) AS {}", name, name)
        }))
        .collect();

    let rows = sqlx::query(&format!(
        "SELECT {} FROM {} ORDER BY rowid",
        selected.join(", "),
        quote_identifier(table_name)
    ))
    .fetch_all(&mut *conn)
    .await?;

    let key_count = schema.keys.len();
    let mut table = Table::new(schema.keys.clone(), schema.columns.clone())?;

    for row in rows {
        let mut key = Vec::with_capacity(key_count);
        for (i, column) in schema.keys.iter().enumerate() {
            let cell: Option<String> = row.try_get(i)?;
            let cell = cell.unwrap_or_default();
            key.push(match column.kind {
                KeyKind::Text => KeyValue::Text(cell),
                KeyKind::Date => KeyValue::Date(parse_stored_date(&cell)?),
            });
        }

        let mut values = Vec::with_capacity(schema.columns.len());
        for j in 0..schema.columns.len() {
            values.push(row.try_get::<Option<f64>, _>(key_count + j)?);
        }

        table.push_row(key, values)?;
    }

    Ok(table)
}

/// `2023-01-03` 或帶有時間的 `2023-01-03 00:00:00` 皆只取日期
fn parse_stored_date(text: &str) -> Result<NaiveDate> {
    let date_part = text.get(..10).unwrap_or(text);
    Ok(NaiveDate::parse_from_str(date_part, "%Y-%m-%d")?)
}

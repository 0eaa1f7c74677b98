use std::collections::HashSet;

use chrono::NaiveDate;

use crate::{
    error::{Error, Result},
    logging,
    table::{dedupe_names, KeyColumn, KeyValue, RawTable, Table},
    util::text,
};

/// 收盤行情上游的證券代號欄位
pub const STOCK_ID_SOURCE: &str = "證券代號";
/// 收盤行情整理後的主鍵
pub const STOCK_ID: &str = "stockID";
/// 收盤行情的日期主鍵
pub const DATE: &str = "date";
/// 月營收的公司代號
pub const COMPANY_ID: &str = "公司代號";
/// 月營收的公司名稱
pub const COMPANY_NAME: &str = "公司名稱";
/// 月營收欄名的分隔字元，只保留最後一段
pub const MONTHLY_COLUMN_SEPARATOR: char = '-';

/// 原始欄位對應到主鍵欄位
struct KeySource<'a> {
    source: &'a str,
    target: &'a str,
}

/// 整理每日收盤行情
///
/// `證券代號` 改名為 `stockID`，加上查詢日期當作 `date` 主鍵；其餘欄位轉成數值後，
/// 整欄都是缺值的欄位會被刪除。同一個 (stockID, date) 只保留第一列。
pub fn daily_price(raw: &RawTable, date: NaiveDate) -> Result<Table> {
    normalize(
        raw,
        &[KeySource {
            source: STOCK_ID_SOURCE,
            target: STOCK_ID,
        }],
        Some(date),
        |name| name.to_string(),
    )
}

/// 整理月營收
///
/// `公司代號`、`公司名稱` 原名保留為複合主鍵，數值欄名只保留最後一個 `-` 之後的部分。
pub fn monthly_report(raw: &RawTable) -> Result<Table> {
    normalize(
        raw,
        &[
            KeySource {
                source: COMPANY_ID,
                target: COMPANY_ID,
            },
            KeySource {
                source: COMPANY_NAME,
                target: COMPANY_NAME,
            },
        ],
        None,
        strip_column_prefix,
    )
}

/// `營業收入-當月營收` => `當月營收`
pub fn strip_column_prefix(name: &str) -> String {
    match name.rsplit_once(MONTHLY_COLUMN_SEPARATOR) {
        Some((_, tail)) => tail.to_string(),
        None => name.to_string(),
    }
}

fn normalize(
    raw: &RawTable,
    key_sources: &[KeySource<'_>],
    date: Option<NaiveDate>,
    rename: impl Fn(&str) -> String,
) -> Result<Table> {
    let names = raw.flatten_header();

    let mut key_positions = Vec::with_capacity(key_sources.len());
    for key in key_sources {
        let pos = names
            .iter()
            .position(|n| n == key.source)
            .ok_or_else(|| Error::MissingColumn(key.source.to_string()))?;
        key_positions.push(pos);
    }

    let mut keys: Vec<KeyColumn> = key_sources
        .iter()
        .map(|k| KeyColumn::text(k.target))
        .collect();
    if date.is_some() {
        keys.push(KeyColumn::date(DATE));
    }

    let value_positions: Vec<usize> = (0..names.len())
        .filter(|i| !key_positions.contains(i))
        .collect();
    let reserved: Vec<&str> = keys.iter().map(|k| k.name.as_str()).collect();
    let value_names = dedupe_names(
        value_positions
            .iter()
            .map(|i| match rename(&names[*i]) {
                renamed if renamed.is_empty() => format!("Unnamed: {}", i),
                renamed => renamed,
            })
            .collect(),
        &reserved,
    );

    let mut table = Table::new(keys, value_names)?;
    let mut seen = HashSet::with_capacity(raw.rows.len());
    let mut duplicated = 0;

    for row in &raw.rows {
        let mut key: Vec<KeyValue> = key_positions
            .iter()
            .map(|pos| KeyValue::Text(RawTable::cell(row, *pos).to_string()))
            .collect();

        // 分隔用的空白列沒有代號
        if key.iter().any(|k| matches!(k, KeyValue::Text(t) if t.is_empty())) {
            continue;
        }

        if let Some(day) = date {
            key.push(KeyValue::Date(day));
        }

        if !seen.insert(key.clone()) {
            duplicated += 1;
            continue;
        }

        let values = value_positions
            .iter()
            .map(|pos| text::parse_number(RawTable::cell(row, *pos)))
            .collect();

        table.push_row(key, values)?;
    }

    if duplicated > 0 {
        logging::warn_file_async(format!("Skip {} rows with a duplicated key", duplicated));
    }

    let dropped = table.drop_all_missing_columns();
    if !dropped.is_empty() {
        logging::debug_file_async(format!("Drop non-numeric columns: {:?}", dropped));
    }

    Ok(table)
}

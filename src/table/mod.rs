use std::{collections::HashSet, fmt};

use chrono::NaiveDate;

use crate::{
    declare::Fetched,
    error::{Error, Result},
};

/// 讀取 csv 文字
pub mod delimited;
/// 讀取 html 內的 table
pub mod html;
/// 欄位整理：表頭攤平、主鍵、數值轉換與空欄剔除
pub mod normalize;
/// 尚未整理的原始表格
pub mod raw;

pub use raw::RawTable;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyKind {
    Text,
    Date,
}

/// 主鍵欄位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub name: String,
    pub kind: KeyKind,
}

impl KeyColumn {
    pub fn text(name: &str) -> Self {
        KeyColumn {
            name: name.to_string(),
            kind: KeyKind::Text,
        }
    }

    pub fn date(name: &str) -> Self {
        KeyColumn {
            name: name.to_string(),
            kind: KeyKind::Date,
        }
    }
}

/// 主鍵欄位的值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Text(String),
    Date(NaiveDate),
}

impl KeyValue {
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyValue::Text(_) => KeyKind::Text,
            KeyValue::Date(_) => KeyKind::Date,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Text(text) => f.write_str(text),
            KeyValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(text: &str) -> Self {
        KeyValue::Text(text.to_string())
    }
}

impl From<NaiveDate> for KeyValue {
    fn from(date: NaiveDate) -> Self {
        KeyValue::Date(date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: Vec<KeyValue>,
    /// `None` 代表缺值
    pub values: Vec<Option<f64>>,
}

/// 整理後的表格：主鍵欄位加上數值欄位
///
/// 每一列的主鍵個數與數值個數一定等於表頭的欄位數，違反時 [`Table::push_row`] 會回傳
/// [`Error::ContractViolation`]。
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    keys: Vec<KeyColumn>,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// 建立空表格，主鍵至少一欄且所有欄位名稱不可重複
    pub fn new(keys: Vec<KeyColumn>, columns: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::contract("a table needs at least one key column"));
        }

        let mut seen = HashSet::with_capacity(keys.len() + columns.len());
        for name in keys.iter().map(|k| &k.name).chain(columns.iter()) {
            if name.is_empty() {
                return Err(Error::contract("column names can not be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::contract(format!("duplicate column {}", name)));
            }
        }

        Ok(Table {
            keys,
            columns,
            rows: Vec::new(),
        })
    }

    pub fn push_row(&mut self, key: Vec<KeyValue>, values: Vec<Option<f64>>) -> Result<()> {
        if key.len() != self.keys.len() {
            return Err(Error::contract(format!(
                "row has {} key cells but the table has {} key columns",
                key.len(),
                self.keys.len()
            )));
        }

        if values.len() != self.columns.len() {
            return Err(Error::contract(format!(
                "row has {} value cells but the table has {} value columns",
                values.len(),
                self.columns.len()
            )));
        }

        if let Some((column, cell)) = self
            .keys
            .iter()
            .zip(key.iter())
            .find(|(column, cell)| column.kind != cell.kind())
        {
            return Err(Error::contract(format!(
                "key {} expects {:?} but got {:?}",
                column.name, column.kind, cell
            )));
        }

        self.rows.push(Row { key, values });
        Ok(())
    }

    pub fn keys(&self) -> &[KeyColumn] {
        &self.keys
    }

    pub fn key_names(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 取出單一數值欄位
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(|row| row.values[pos]).collect())
    }

    /// 依主鍵找出一列
    pub fn find(&self, key: &[KeyValue]) -> Option<&Row> {
        self.rows.iter().find(|row| row.key == key)
    }

    /// 刪除所有值皆為缺值的欄位，回傳被刪除的欄位名稱
    pub fn drop_all_missing_columns(&mut self) -> Vec<String> {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| self.rows.iter().any(|row| row.values[i].is_some()))
            .collect();

        if keep.iter().all(|k| *k) {
            return Vec::new();
        }

        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.columns.len());
        for (name, k) in self.columns.drain(..).zip(keep.iter()) {
            if *k {
                kept.push(name);
            } else {
                dropped.push(name);
            }
        }
        self.columns = kept;

        for row in self.rows.iter_mut() {
            let mut flags = keep.iter();
            row.values.retain(|_| *flags.next().unwrap_or(&false));
        }

        dropped
    }
}

/// 可以交給存檔函式的資料
///
/// 只有真的拿到表格時才回傳 `Some`，`Fetched::NoData` 之類的結果會被存檔函式拒絕。
pub trait Tabular {
    fn as_table(&self) -> Option<&Table>;
}

impl Tabular for Table {
    fn as_table(&self) -> Option<&Table> {
        Some(self)
    }
}

impl Tabular for Fetched<Table> {
    fn as_table(&self) -> Option<&Table> {
        self.as_found()
    }
}

impl<T: Tabular> Tabular for Option<T> {
    fn as_table(&self) -> Option<&Table> {
        self.as_ref().and_then(Tabular::as_table)
    }
}

/// 取出表格，非表格輸入一律視為呼叫端錯誤
pub(crate) fn require_table(data: &impl Tabular) -> Result<&Table> {
    data.as_table()
        .ok_or_else(|| Error::contract("expected a table but got no data"))
}

/// 重複的欄位名稱依序加上 `.1`、`.2`
pub(crate) fn dedupe_names(names: Vec<String>, reserved: &[&str]) -> Vec<String> {
    let mut seen: HashSet<String> = reserved.iter().map(|r| r.to_string()).collect();
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", name, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

use csv::ReaderBuilder;

use crate::{error::Result, table::RawTable};

/// 讀取 csv 文字，第一列為表頭
///
/// 欄位數不一致的列照樣收下，整理時再補齊或截斷；全空白的列略過。
pub fn read_csv(text: &str) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let mut header = Vec::new();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();

        if cells.iter().all(String::is_empty) {
            continue;
        }

        if header.is_empty() {
            header.push(cells);
        } else {
            rows.push(cells);
        }
    }

    Ok(RawTable::new(header, rows))
}

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    error::Result,
    logging,
    table::{require_table, Table, Tabular},
};

/// 匯出檔案的副檔名，呼叫端給的副檔名一律被取代
pub const CSV_EXTENSION: &str = "csv";

const TMP_EXTENSION: &str = "csv.tmp";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 將表格寫成帶 BOM 的 utf-8 csv，回傳實際寫入的路徑
///
/// 欄位依序為主鍵、數值欄位；缺值輸出空字串，日期輸出 `%Y-%m-%d`。
/// 檔案已存在且 `overwrite` 為 false 時不寫入，直接回傳該路徑。
/// 內容先寫到同目錄的 `.csv.tmp`，完整寫完才換名成目標檔；失敗時既有的檔案保持原樣。
pub fn save_csv(data: &impl Tabular, path: impl AsRef<Path>, overwrite: bool) -> Result<PathBuf> {
    let table = require_table(data)?;
    let path = path.as_ref().with_extension(CSV_EXTENSION);

    if path.exists() && !overwrite {
        logging::info_file_async(format!("{} already exists, skip writing", path.display()));
        return Ok(path);
    }

    let tmp_path = path.with_extension(TMP_EXTENSION);
    let written = write_table(&tmp_path, table).and_then(|_| Ok(fs::rename(&tmp_path, &path)?));
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written?;

    Ok(path)
}

fn write_table(tmp_path: &Path, table: &Table) -> Result<()> {
    let mut file = File::create(tmp_path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    let header: Vec<&str> = table
        .key_names()
        .into_iter()
        .chain(table.columns().iter().map(String::as_str))
        .collect();
    writer.write_record(&header)?;

    for row in table.rows() {
        let record: Vec<String> = row
            .key
            .iter()
            .map(|k| k.to_string())
            .chain(
                row.values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            )
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{declare::Fetched, error::Error, table::KeyColumn};

    use super::*;

    fn sample() -> Table {
        let date = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
        let mut table = Table::new(
            vec![KeyColumn::text("stockID"), KeyColumn::date("date")],
            vec!["收盤價".to_string(), "本益比".to_string()],
        )
        .unwrap();
        table
            .push_row(vec!["2330".into(), date.into()], vec![Some(453.0), None])
            .unwrap();
        table
            .push_row(vec!["0050".into(), date.into()], vec![Some(109.75), Some(0.0)])
            .unwrap();
        table
    }

    #[test]
    fn test_save_csv_writes_bom_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let written = save_csv(&sample(), dir.path().join("daily.txt"), false).unwrap();

        assert_eq!(written, dir.path().join("daily.csv"));
        let bytes = fs::read(&written).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "stockID,date,收盤價,本益比");
        assert_eq!(lines[1], "2330,2023-01-03,453,");
        assert_eq!(lines[2], "0050,2023-01-03,109.75,0");
    }

    #[test]
    fn test_save_csv_keeps_existing_file_unless_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        fs::write(&path, "keep").unwrap();

        save_csv(&sample(), &path, false).unwrap();
        save_csv(&sample(), &path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");

        save_csv(&sample(), &path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("stockID"));
    }

    #[test]
    fn test_save_csv_overwrite_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        fs::write(&path, "old").unwrap();

        save_csv(&sample(), &path, true).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("daily.csv")]);
        assert!(!fs::read_to_string(&path).unwrap().contains("old"));
    }

    #[test]
    fn test_failed_write_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        fs::write(&path, "old").unwrap();
        // 暫存檔的位置被目錄佔住，寫入一定失敗
        fs::create_dir(path.with_extension(TMP_EXTENSION)).unwrap();

        assert!(matches!(save_csv(&sample(), &path, true), Err(Error::Io(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_save_csv_rejects_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");

        let result = save_csv(&Fetched::<Table>::NoData, &path, true);

        assert!(matches!(result, Err(Error::ContractViolation(_))));
        assert!(!path.exists());
    }
}

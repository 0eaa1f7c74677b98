use crate::table::dedupe_names;

/// 從 html 或 csv 讀出、尚未整理的表格
///
/// `header` 每個元素是一列表頭（多層表頭時有多列），合併儲存格已展開成完整寬度；
/// `rows` 為資料列，所有儲存格都是原始文字。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub header: Vec<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(header: Vec<Vec<String>>, rows: Vec<Vec<String>>) -> Self {
        RawTable { header, rows }
    }

    /// 表格寬度
    ///
    /// 有表頭時取最寬的一層表頭，資料列超出的儲存格不算；沒有表頭時取最寬的資料列。
    pub fn width(&self) -> usize {
        let widest = |rows: &[Vec<String>]| rows.iter().map(Vec::len).max().unwrap_or(0);
        if self.header.is_empty() {
            widest(&self.rows)
        } else {
            widest(&self.header)
        }
    }

    pub fn is_multi_level(&self) -> bool {
        self.header.len() > 1
    }

    /// 攤平表頭：多層表頭只保留最內層（最後一列）
    ///
    /// 空白的欄名補成 `Unnamed: <位置>`，重複的欄名依序加上 `.1`、`.2`；
    /// 沒有表頭時以欄位位置當作欄名。資料列超出表頭寬度的儲存格不會成為欄位。
    pub fn flatten_header(&self) -> Vec<String> {
        let width = self.width();
        let innermost = self.header.last();
        let names = (0..width)
            .map(|i| match innermost.and_then(|level| level.get(i)) {
                Some(name) if !name.trim().is_empty() => name.trim().to_string(),
                Some(_) => format!("Unnamed: {}", i),
                None if innermost.is_some() => format!("Unnamed: {}", i),
                None => i.to_string(),
            })
            .collect();

        dedupe_names(names, &[])
    }

    /// 取得資料列的某一格，超出寬度的位置視為空字串
    pub fn cell(row: &[String], index: usize) -> &str {
        row.get(index).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_flatten_two_level_header_keeps_innermost() {
        let raw = RawTable::new(
            vec![
                strings(&["每日收盤行情", "每日收盤行情", "每日收盤行情"]),
                strings(&["證券代號", "證券名稱", "收盤價"]),
            ],
            vec![strings(&["2330", "台積電", "520.00"])],
        );

        assert!(raw.is_multi_level());
        assert_eq!(raw.flatten_header(), vec!["證券代號", "證券名稱", "收盤價"]);
    }

    #[test]
    fn test_flatten_fills_blank_and_duplicate_names() {
        let raw = RawTable::new(
            vec![strings(&["代號", "", "備註", "備註"])],
            vec![strings(&["1101", "a", "b", "c"])],
        );

        assert_eq!(
            raw.flatten_header(),
            vec!["代號", "Unnamed: 1", "備註", "備註.1"]
        );
    }

    #[test]
    fn test_cells_beyond_header_width_are_ignored() {
        let raw = RawTable::new(
            vec![strings(&["證券代號", "收盤價"])],
            vec![strings(&["2330", "453", "999"])],
        );

        assert_eq!(raw.width(), 2);
        assert_eq!(raw.flatten_header(), vec!["證券代號", "收盤價"]);
    }

    #[test]
    fn test_flatten_without_header_uses_positions() {
        let raw = RawTable::new(vec![], vec![strings(&["a", "b"])]);
        assert_eq!(raw.flatten_header(), vec!["0", "1"]);
    }

    #[test]
    fn test_cell_pads_short_rows() {
        let row = strings(&["a"]);
        assert_eq!(RawTable::cell(&row, 0), "a");
        assert_eq!(RawTable::cell(&row, 3), "");
    }
}

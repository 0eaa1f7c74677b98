use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::{
    error::{Error, Result},
    table::RawTable,
};

/// 合併儲存格展開的上限，避免異常的 colspan/rowspan 撐爆記憶體
const MAX_SPAN: usize = 1000;

/// 依文件順序讀出所有 `<table>`
///
/// 每個表格只看自己的 `thead`、`tbody` 與直接的 `tr`，巢狀表格會另外成為一個表格。
/// 沒有 `thead` 時，開頭整列都是 `th` 的列視為表頭。`tfoot` 是註解，不列入資料。
pub fn read_tables(html: &str) -> Result<Vec<RawTable>> {
    let selector =
        Selector::parse("table").map_err(|why| Error::Selector(format!("{:?}", why)))?;
    let document = Html::parse_document(html);

    Ok(document.select(&selector).map(read_table).collect())
}

/// 文件中最後一個表格
pub fn read_last_table(html: &str) -> Result<Option<RawTable>> {
    Ok(read_tables(html)?.pop())
}

fn read_table(table: ElementRef<'_>) -> RawTable {
    let mut head_rows = Vec::new();
    let mut body_rows = Vec::new();

    for child in child_elements(table) {
        match child.value().name() {
            "thead" => head_rows.extend(child_elements(child).filter(|e| is_named(e, "tr"))),
            "tbody" => body_rows.extend(child_elements(child).filter(|e| is_named(e, "tr"))),
            "tr" => body_rows.push(child),
            _ => {}
        }
    }

    if head_rows.is_empty() {
        let leading = body_rows
            .iter()
            .take_while(|tr| {
                let mut cells = cells_of(**tr).peekable();
                cells.peek().is_some() && cells.all(|cell| is_named(&cell, "th"))
            })
            .count();
        head_rows = body_rows.drain(..leading).collect();
    }

    RawTable::new(expand_rows(&head_rows), expand_rows(&body_rows))
}

/// 將 `tr` 展開成文字網格，`colspan` 與 `rowspan` 會複製儲存格內容
///
/// 上一列延伸下來的儲存格優先佔住欄位，本列的儲存格往右排到下一個空位。
fn expand_rows(rows: &[ElementRef<'_>]) -> Vec<Vec<String>> {
    let mut grid = Vec::with_capacity(rows.len());
    // 欄位位置 -> (還要往下延伸的列數, 內容)
    let mut pending: BTreeMap<usize, (usize, String)> = BTreeMap::new();

    for tr in rows {
        let mut out = Vec::new();
        let mut next_pending = BTreeMap::new();
        let mut col = 0;

        for cell in cells_of(*tr) {
            let text = cell_text(cell);
            let colspan = span(cell, "colspan");
            let rowspan = span(cell, "rowspan");
            for _ in 0..colspan {
                fill_pending(&mut pending, &mut next_pending, &mut out, &mut col);
                if rowspan > 1 {
                    next_pending.insert(col, (rowspan - 1, text.clone()));
                }
                out.push(text.clone());
                col += 1;
            }
        }

        // 本列儲存格用完後，剩下延伸下來的儲存格依位置補上，中間的空位留白
        for (at, (left, text)) in std::mem::take(&mut pending) {
            if at < col {
                continue;
            }
            out.resize(at, String::new());
            col = at;
            carry_down(&mut next_pending, &mut out, &mut col, left, text);
        }

        pending = next_pending;

        if !out.is_empty() {
            grid.push(out);
        }
    }

    grid
}

/// 把 `col` 起連續被上一列佔住的欄位填上
fn fill_pending(
    pending: &mut BTreeMap<usize, (usize, String)>,
    next_pending: &mut BTreeMap<usize, (usize, String)>,
    out: &mut Vec<String>,
    col: &mut usize,
) {
    while let Some((left, text)) = pending.remove(col) {
        carry_down(next_pending, out, col, left, text);
    }
}

fn carry_down(
    next_pending: &mut BTreeMap<usize, (usize, String)>,
    out: &mut Vec<String>,
    col: &mut usize,
    left: usize,
    text: String,
) {
    if left > 1 {
        next_pending.insert(*col, (left - 1, text.clone()));
    }
    out.push(text);
    *col += 1;
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

fn cells_of<'a>(tr: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    child_elements(tr).filter(|e| is_named(e, "td") || is_named(e, "th"))
}

fn is_named(element: &ElementRef<'_>, name: &str) -> bool {
    element.value().name() == name
}

fn span(cell: ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// 儲存格文字，連續空白合併成一個空格
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

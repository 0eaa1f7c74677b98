use chrono::{Local, NaiveDate};

use crate::{
    crawler::twse::Fetcher,
    declare::{Fetched, QueryDay},
    error::Result,
    logging,
    table::{html, normalize, Table},
    util,
};

/// 抓取上市公司每日收盤行情 (全部，不含權證、牛熊證)
///
/// 頁面中最後一個表格才是個股行情；沒有表格或表格沒有資料列（休市日）時回傳
/// `Fetched::NoData`。`day` 為 `Today`/`Yesterday` 時以呼叫當下的本地日期換算。
pub async fn visit(fetcher: &Fetcher, day: QueryDay) -> Result<Fetched<Table>> {
    let date = day.resolve(Local::now().date_naive());
    let endpoint = &fetcher.endpoints().daily_price;
    let url = build_url(&endpoint.url, date);
    let text = util::http::get(fetcher.client(), &url, &endpoint.encoding).await?;

    parse(&text, date)
}

fn build_url(base: &str, date: NaiveDate) -> String {
    format!(
        "{}?response=html&date={}&type=ALLBUT0999",
        base,
        date.format("%Y%m%d")
    )
}

/// 將 MI_INDEX 的 html 整理成以 (stockID, date) 為主鍵的表格
pub fn parse(text: &str, date: NaiveDate) -> Result<Fetched<Table>> {
    let raw = match html::read_last_table(text)? {
        Some(raw) if !raw.rows.is_empty() => raw,
        _ => {
            logging::info_file_async(format!("No daily price table for {}", date));
            return Ok(Fetched::NoData);
        }
    };

    let table = normalize::daily_price(&raw, date)?;
    if table.is_empty() {
        return Ok(Fetched::NoData);
    }

    Ok(Fetched::Found(table))
}

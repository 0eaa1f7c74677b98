use crate::{
    crawler::twse::Fetcher,
    declare::Fetched,
    error::Result,
    table::{html, RawTable},
    util::{self, datetime::to_republic_of_china_year, text::parse_form_data},
};

/// 查詢合併財務報告 (REPORT_ID=C)
///
/// 回傳頁面中所有表格（依文件順序、未經整理），由呼叫端自行挑選；頁面沒有任何表格時
/// 回傳 `Fetched::NoData`。
pub async fn visit(
    fetcher: &Fetcher,
    stock_id: &str,
    year: i32,
    season: u32,
) -> Result<Fetched<Vec<RawTable>>> {
    let endpoint = &fetcher.endpoints().financial_report;
    let form = build_form(stock_id, year, season);
    let text =
        util::http::post_form(fetcher.client(), &endpoint.url, &form, &endpoint.encoding).await?;

    parse(&text)
}

fn build_form(stock_id: &str, year: i32, season: u32) -> Vec<(String, String)> {
    parse_form_data(&format!(
        "step=1&DEBUG=&CO_ID={}&SYEAR={}&SSEASON={}&REPORT_ID=C",
        stock_id,
        to_republic_of_china_year(year),
        season
    ))
}

pub fn parse(text: &str) -> Result<Fetched<Vec<RawTable>>> {
    let tables = html::read_tables(text)?;
    if tables.is_empty() {
        return Ok(Fetched::NoData);
    }

    Ok(Fetched::Found(tables))
}

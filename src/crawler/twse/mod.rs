use reqwest::Client;

use crate::{
    config::{self, Twse},
    declare::{Fetched, QueryDay},
    error::Result,
    table::{RawTable, Table},
    util,
};

/// 每日收盤行情
pub mod daily_price;
/// 財務報告
pub mod financial_report;
/// 月營收
pub mod monthly_report;

/// 對 TWSE / MOPS 發出請求的抓取器
///
/// 每個方法只送出一次請求，不重試；端點網址與回應編碼都來自 [`Twse`] 設定。
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    endpoints: Twse,
}

impl Fetcher {
    pub fn new(client: Client, endpoints: Twse) -> Self {
        Fetcher { client, endpoints }
    }

    /// 使用全域設定與共用的 http client
    pub fn from_settings() -> Result<Self> {
        Ok(Fetcher::new(
            util::http::get_client()?.clone(),
            config::SETTINGS.twse.clone(),
        ))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn endpoints(&self) -> &Twse {
        &self.endpoints
    }

    pub async fn daily_price(&self, day: QueryDay) -> Result<Fetched<Table>> {
        daily_price::visit(self, day).await
    }

    pub async fn monthly_report(&self, year: i32, month: u32) -> Result<Fetched<Table>> {
        monthly_report::visit(self, year, month).await
    }

    pub async fn financial_report(
        &self,
        stock_id: &str,
        year: i32,
        season: u32,
    ) -> Result<Fetched<Vec<RawTable>>> {
        financial_report::visit(self, stock_id, year, season).await
    }
}

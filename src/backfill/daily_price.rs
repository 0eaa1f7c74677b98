use std::{path::Path, time::Duration};

use chrono::NaiveDate;
use scopeguard::defer;

use crate::{
    crawler::twse::Fetcher,
    database::store,
    declare::{Fetched, QueryDay, SaveMode},
    error::{Error, Result},
    logging,
    table::Table,
};

/// 收盤行情在資料庫中的資料表名稱
pub const TABLE_NAME: &str = "daily_price";

/// 從 `start` 起一天一天往回抓收盤行情並 append 到資料庫，直到成功存入 `num_days` 天
///
/// 休市日（`Fetched::NoData`）不計入天數；其他任何錯誤都會中止並往上拋。
/// 每抓一天後暫停 `pause`。回傳最後一次抓到的結果，`num_days` 為 0 時回傳 `NoData`。
pub async fn get_many_days(
    fetcher: &Fetcher,
    store_path: impl AsRef<Path>,
    num_days: u32,
    start: NaiveDate,
    pause: Duration,
) -> Result<Fetched<Table>> {
    logging::info_file_async(format!("補抓收盤行情開始 {} 往回 {} 天", start, num_days));
    defer! {
        logging::info_file_async("補抓收盤行情結束");
    }

    let store_path = store_path.as_ref();
    let mut remaining = num_days;
    let mut day = start;
    let mut last = Fetched::NoData;

    while remaining > 0 {
        let fetched = fetcher.daily_price(QueryDay::Date(day)).await?;

        match &fetched {
            Fetched::Found(table) => {
                store::save_sql(table, store_path, TABLE_NAME, SaveMode::Append).await?;
                remaining -= 1;
                logging::info_file_async(format!(
                    "{} saved {} rows, {} days remaining",
                    day,
                    table.len(),
                    remaining
                ));
            }
            Fetched::NoData => {
                logging::info_file_async(format!("{} skipped", day));
            }
        }

        last = fetched;
        day = day
            .pred_opt()
            .ok_or_else(|| Error::contract(format!("no calendar day before {}", day)))?;

        tokio::time::sleep(pause).await;
    }

    Ok(last)
}

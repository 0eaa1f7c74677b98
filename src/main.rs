use std::{fs, path::Path, time::Duration};

use anyhow::Result;
use chrono::Local;
use scopeguard::defer;

use twse_spider::{backfill, config::SETTINGS, logging, Fetched, Fetcher};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::info_file_async("twse_spider 開始");
    defer! {
        logging::info_file_async("twse_spider 結束");
    }

    let crawl = &SETTINGS.crawl;
    if let Some(dir) = Path::new(&crawl.store_path).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let fetcher = Fetcher::from_settings()?;
    let last = backfill::daily_price::get_many_days(
        &fetcher,
        &crawl.store_path,
        crawl.days,
        Local::now().date_naive(),
        Duration::from_millis(crawl.pause_millis),
    )
    .await;

    match last {
        Ok(Fetched::Found(table)) => logging::info_file_async(format!(
            "最後一個交易日共 {} 筆收盤行情",
            table.len()
        )),
        Ok(Fetched::NoData) => logging::info_file_async("沒有抓到任何收盤行情"),
        Err(why) => {
            logging::error_file_async(format!("Failed to get_many_days because {:?}", why));
            return Err(why.into());
        }
    }

    Ok(())
}

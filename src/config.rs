use std::{env, path::PathBuf, str::FromStr};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::logging;

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub twse: Twse,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub crawl: Crawl,
}

/// 單一上游端點，網址與回應內容的編碼需明確設定
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: String,
    pub encoding: String,
}

impl Endpoint {
    pub fn new(url: &str, encoding: &str) -> Self {
        Endpoint {
            url: url.to_string(),
            encoding: encoding.to_string(),
        }
    }
}

const TWSE_DAILY_PRICE_URL: &str = "TWSE_DAILY_PRICE_URL";
const TWSE_DAILY_PRICE_ENCODING: &str = "TWSE_DAILY_PRICE_ENCODING";
const TWSE_MONTHLY_REPORT_URL: &str = "TWSE_MONTHLY_REPORT_URL";
const TWSE_MONTHLY_REPORT_ENCODING: &str = "TWSE_MONTHLY_REPORT_ENCODING";
const TWSE_FINANCIAL_REPORT_URL: &str = "TWSE_FINANCIAL_REPORT_URL";
const TWSE_FINANCIAL_REPORT_ENCODING: &str = "TWSE_FINANCIAL_REPORT_ENCODING";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Twse {
    /// 每日收盤行情 (MI_INDEX)
    #[serde(default = "Twse::default_daily_price")]
    pub daily_price: Endpoint,
    /// 月營收 CSV 下載
    #[serde(default = "Twse::default_monthly_report")]
    pub monthly_report: Endpoint,
    /// 財務報告 (t164sb01)
    #[serde(default = "Twse::default_financial_report")]
    pub financial_report: Endpoint,
}

impl Twse {
    fn default_daily_price() -> Endpoint {
        Endpoint::new("https://www.twse.com.tw/exchangeReport/MI_INDEX", "utf-8")
    }

    fn default_monthly_report() -> Endpoint {
        Endpoint::new("https://mops.twse.com.tw/server-java/FileDownLoad", "big5")
    }

    fn default_financial_report() -> Endpoint {
        Endpoint::new("https://mops.twse.com.tw/server-java/t164sb01", "big5")
    }
}

impl Default for Twse {
    fn default() -> Self {
        Twse {
            daily_price: Self::default_daily_price(),
            monthly_report: Self::default_monthly_report(),
            financial_report: Self::default_financial_report(),
        }
    }
}

const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
const HTTP_CONNECT_TIMEOUT_SECS: &str = "HTTP_CONNECT_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Http {
    #[serde(default = "Http::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "Http::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "Http::default_user_agent")]
    pub user_agent: String,
}

impl Http {
    fn default_timeout_secs() -> u64 {
        30
    }

    fn default_connect_timeout_secs() -> u64 {
        8
    }

    fn default_user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
    }
}

impl Default for Http {
    fn default() -> Self {
        Http {
            timeout_secs: Self::default_timeout_secs(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
            user_agent: Self::default_user_agent(),
        }
    }
}

const CRAWL_STORE_PATH: &str = "CRAWL_STORE_PATH";
const CRAWL_DAYS: &str = "CRAWL_DAYS";
const CRAWL_PAUSE_MILLIS: &str = "CRAWL_PAUSE_MILLIS";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Crawl {
    /// 收盤行情寫入的資料庫檔案
    #[serde(default = "Crawl::default_store_path")]
    pub store_path: String,
    /// 要成功抓取的交易日數
    #[serde(default = "Crawl::default_days")]
    pub days: u32,
    /// 每次抓取之間的停頓
    #[serde(default = "Crawl::default_pause_millis")]
    pub pause_millis: u64,
}

impl Crawl {
    fn default_store_path() -> String {
        "data/twse.db".to_string()
    }

    fn default_days() -> u32 {
        5
    }

    fn default_pause_millis() -> u64 {
        1000
    }
}

impl Default for Crawl {
    fn default() -> Self {
        Crawl {
            store_path: Self::default_store_path(),
            days: Self::default_days(),
            pause_millis: Self::default_pause_millis(),
        }
    }
}

pub static SETTINGS: Lazy<App> = Lazy::new(|| {
    App::get().unwrap_or_else(|why| {
        logging::error_file_async(format!(
            "I can't read the config context because {:?}",
            why
        ));
        App::default().override_with_env()
    })
});

impl App {
    fn get() -> Result<Self> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        override_string(&mut self.twse.daily_price.url, TWSE_DAILY_PRICE_URL);
        override_string(&mut self.twse.daily_price.encoding, TWSE_DAILY_PRICE_ENCODING);
        override_string(&mut self.twse.monthly_report.url, TWSE_MONTHLY_REPORT_URL);
        override_string(
            &mut self.twse.monthly_report.encoding,
            TWSE_MONTHLY_REPORT_ENCODING,
        );
        override_string(&mut self.twse.financial_report.url, TWSE_FINANCIAL_REPORT_URL);
        override_string(
            &mut self.twse.financial_report.encoding,
            TWSE_FINANCIAL_REPORT_ENCODING,
        );

        override_parsed(&mut self.http.timeout_secs, HTTP_TIMEOUT_SECS);
        override_parsed(&mut self.http.connect_timeout_secs, HTTP_CONNECT_TIMEOUT_SECS);

        override_string(&mut self.crawl.store_path, CRAWL_STORE_PATH);
        override_parsed(&mut self.crawl.days, CRAWL_DAYS);
        override_parsed(&mut self.crawl.pause_millis, CRAWL_PAUSE_MILLIS);

        self
    }
}

fn override_string(target: &mut String, key: &str) {
    if let Ok(val) = env::var(key) {
        *target = val;
    }
}

fn override_parsed<T: FromStr>(target: &mut T, key: &str) {
    if let Ok(val) = env::var(key) {
        match T::from_str(&val) {
            Ok(parsed) => *target = parsed,
            Err(_) => logging::error_file_async(format!("Ignore invalid {}: {}", key, val)),
        }
    }
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints_keep_their_own_encoding() {
        let twse = Twse::default();
        assert_eq!(twse.daily_price.encoding, "utf-8");
        assert_eq!(twse.monthly_report.encoding, "big5");
        assert_eq!(twse.financial_report.encoding, "big5");
        assert!(twse.daily_price.url.ends_with("/exchangeReport/MI_INDEX"));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let app: App = config_config::builder()
            .add_source(config::File::from_str(
                r#"{ "crawl": { "days": 3 }, "http": { "timeout_secs": 5 } }"#,
                config::FileFormat::Json,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(app.crawl.days, 3);
        assert_eq!(app.crawl.pause_millis, 1000);
        assert_eq!(app.http.timeout_secs, 5);
        assert_eq!(app.http.connect_timeout_secs, 8);
        assert_eq!(app.twse, Twse::default());
    }

    #[test]
    fn test_override_parsed_ignores_garbage() {
        let mut days = 7u32;
        env::set_var("TWSE_SPIDER_TEST_DAYS", "abc");
        override_parsed(&mut days, "TWSE_SPIDER_TEST_DAYS");
        assert_eq!(days, 7);

        env::set_var("TWSE_SPIDER_TEST_DAYS", "9");
        override_parsed(&mut days, "TWSE_SPIDER_TEST_DAYS");
        assert_eq!(days, 9);
        env::remove_var("TWSE_SPIDER_TEST_DAYS");
    }
}

pub mod backfill;
pub mod config;
pub mod crawler;
pub mod database;
pub mod declare;
pub mod error;
pub mod export;
pub mod logging;
pub mod table;
pub mod util;

pub use backfill::daily_price::get_many_days;
pub use crawler::twse::Fetcher;
pub use database::store::{load_sql, save_sql};
pub use declare::{Fetched, QueryDay, SaveMode};
pub use error::{Error, Result};
pub use export::save_csv;
pub use table::{RawTable, Table, Tabular};

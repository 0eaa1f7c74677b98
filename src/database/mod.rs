use std::{
    io,
    path::{Path, PathBuf},
};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    ConnectOptions, SqliteConnection,
};

use crate::error::{Error, Result};

/// 以資料表為單位存取 sqlite 檔案
pub mod store;

/// 資料庫檔案的副檔名，呼叫端給的副檔名一律被取代
pub const STORE_EXTENSION: &str = "db";

/// 換成資料庫檔案的副檔名
pub fn resolve_path(path: &Path) -> PathBuf {
    path.with_extension(STORE_EXTENSION)
}

/// 開啟 sqlite 檔案
///
/// 每次存取都開自己的連線、用完即關，檔案層級的鎖交給 sqlite 處理。
/// `create` 為 false 時檔案必須已存在。
pub async fn connect(path: &Path, create: bool) -> Result<SqliteConnection> {
    if !create && !path.exists() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("store file {} does not exist", path.display()),
        )));
    }

    let conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Delete)
        .connect()
        .await?;

    Ok(conn)
}

/// sqlite 識別字加上雙引號，內含的雙引號重複一次
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 抓取、整理與存檔過程中所有可回報的錯誤
///
/// 查無資料（例如休市日）不是錯誤，而是 [`crate::declare::Fetched::NoData`]。
#[derive(Debug, Error)]
pub enum Error {
    /// 連線失敗、逾時等傳輸層錯誤，原樣往上拋
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("{url} responded with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    /// 傳入的資料不是表格，或列的欄位數與表頭不符
    #[error("contract violation: {0}")]
    ContractViolation(String),
    /// append 模式下新資料的欄位與既有資料表不相容
    #[error("schema mismatch on table {table}: {detail}")]
    SchemaMismatch { table: String, detail: String },
    #[error("column {0} not found")]
    MissingColumn(String),
    #[error("table {0} not found")]
    TableNotFound(String),
    #[error("unknown encoding label {0}")]
    Encoding(String),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Date(#[from] chrono::ParseError),
}

impl Error {
    pub fn contract<T: Into<String>>(msg: T) -> Self {
        Error::ContractViolation(msg.into())
    }

    pub fn schema_mismatch<T: Into<String>, D: Into<String>>(table: T, detail: D) -> Self {
        Error::SchemaMismatch {
            table: table.into(),
            detail: detail.into(),
        }
    }
}

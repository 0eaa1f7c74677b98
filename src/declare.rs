use chrono::{Duration, NaiveDate};
use strum::{AsRefStr, Display, EnumString};

/// 一次抓取的結果
///
/// 傳輸成功但頁面沒有可解析的表格時為 `NoData`，與錯誤分開處理。
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    NoData,
}

impl<T> Fetched<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Fetched::Found(_))
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Fetched::NoData)
    }

    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(t) => Some(t),
            Fetched::NoData => None,
        }
    }

    pub fn as_found(&self) -> Option<&T> {
        match self {
            Fetched::Found(t) => Some(t),
            Fetched::NoData => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Fetched<U> {
        match self {
            Fetched::Found(t) => Fetched::Found(f(t)),
            Fetched::NoData => Fetched::NoData,
        }
    }
}

/// 收盤行情要查詢的日期
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueryDay {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl QueryDay {
    /// 以呼叫當下的日期換算成實際日期
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            QueryDay::Today => today,
            QueryDay::Yesterday => today - Duration::days(1),
            QueryDay::Date(date) => *date,
        }
    }
}

impl From<NaiveDate> for QueryDay {
    fn from(date: NaiveDate) -> Self {
        QueryDay::Date(date)
    }
}

/// 資料表已存在時的寫入方式
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SaveMode {
    /// 刪除舊表後以新資料的欄位重建
    Replace,
    /// 附加到既有資料表
    Append,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_resolve_symbolic_days() {
        let today = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        assert_eq!(QueryDay::Today.resolve(today), today);
        assert_eq!(
            QueryDay::Yesterday.resolve(today),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        let day = NaiveDate::from_ymd_opt(2022, 12, 30).unwrap();
        assert_eq!(QueryDay::from(day).resolve(today), day);
    }

    #[test]
    fn test_save_mode_from_str() {
        assert_eq!(SaveMode::from_str("replace").unwrap(), SaveMode::Replace);
        assert_eq!(SaveMode::from_str("append").unwrap(), SaveMode::Append);
        assert!(SaveMode::from_str("fail").is_err());
        assert_eq!(SaveMode::Append.to_string(), "append");
    }

    #[test]
    fn test_fetched_accessors() {
        let found = Fetched::Found(3);
        assert!(found.is_found());
        assert_eq!(found.as_found(), Some(&3));
        assert_eq!(found.map(|v| v * 2).found(), Some(6));
        assert!(Fetched::<i32>::NoData.is_no_data());
    }
}

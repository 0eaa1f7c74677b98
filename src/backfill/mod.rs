/// 往回補抓多日收盤行情
pub mod daily_price;

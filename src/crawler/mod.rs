/// 台灣證券交易所、公開資訊觀測站
pub mod twse;

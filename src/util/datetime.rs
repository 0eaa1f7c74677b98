/// 民國紀年與西元紀年的差距
const REPUBLIC_OF_CHINA_ERA_OFFSET: i32 = 1911;

/// Convert Gregorian year to ROC year.
pub fn to_republic_of_china_year(year: i32) -> i32 {
    year - REPUBLIC_OF_CHINA_ERA_OFFSET
}

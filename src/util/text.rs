use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// 數字中的千分位符號
const NUMBER_ESCAPE_CHAR: &[char] = &[','];

/// Looks up an encoding by its WHATWG label, e.g. `utf-8` or `big5`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| Error::Encoding(label.to_string()))
}

/// Decodes `data` with the encoding named by `label` into a UTF-8 `String`.
///
/// A leading byte order mark overrides the label and is stripped. Malformed
/// sequences are replaced with U+FFFD rather than failing, upstream pages
/// occasionally carry stray bytes in footnotes.
pub fn decode(data: &[u8], label: &str) -> Result<String> {
    let encoding = encoding_for_label(label)?;
    let (text, _, _) = encoding.decode(data);
    Ok(text.into_owned())
}

/// Parses a table cell into a number, returning `None` when the cell is not numeric.
///
/// Surrounding whitespace and thousands separators are removed first. Empty cells,
/// placeholders such as `--` or `X`, and non-finite values are all treated as missing.
///
/// # Example
///
/// ```
/// use twse_spider::util::text::parse_number;
///
/// assert_eq!(parse_number(" 1,234.5 "), Some(1234.5));
/// assert_eq!(parse_number("--"), None);
/// ```
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned = clean_escape_chars(s.trim());
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Splits a query-string style payload into ordered form fields.
///
/// `step=1&DEBUG=&CO_ID=2330` yields `[("step", "1"), ("DEBUG", ""), ("CO_ID", "2330")]`.
/// A segment without `=` becomes a field with an empty value; empty segments are skipped.
pub fn parse_form_data(src: &str) -> Vec<(String, String)> {
    src.split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (segment.to_string(), String::new()),
        })
        .collect()
}

/// Removes the thousands separators and other escape characters from a number cell.
pub(crate) fn clean_escape_chars(s: &str) -> String {
    s.chars().filter(|c| !NUMBER_ESCAPE_CHAR.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    // 注意這個慣用法：在 tests 模組中，從外部範疇匯入所有名字。
    use super::*;

    #[test]
    fn test_decode_big5() {
        let (bytes, _, unmappable) = encoding_rs::BIG5.encode("公司代號,公司名稱");
        assert!(!unmappable);
        assert_ne!(bytes.as_ref(), "公司代號,公司名稱".as_bytes());
        assert_eq!(decode(&bytes, "big5").unwrap(), "公司代號,公司名稱");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let bytes = "\u{feff}證券代號".as_bytes();
        assert_eq!(decode(bytes, "utf-8").unwrap(), "證券代號");
    }

    #[test]
    fn test_decode_unknown_label() {
        assert!(matches!(
            decode(b"abc", "no-such-charset"),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,234,567"), Some(1234567.0));
        assert_eq!(parse_number("-0.35"), Some(-0.35));
        assert_eq!(parse_number("+2"), Some(2.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("--"), None);
        assert_eq!(parse_number("X0.00"), None);
        assert_eq!(parse_number("台積電"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_parse_form_data() {
        let fields = parse_form_data("step=1&DEBUG=&CO_ID=2330&SYEAR=112&SSEASON=1&REPORT_ID=C");
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], ("step".to_string(), "1".to_string()));
        assert_eq!(fields[1], ("DEBUG".to_string(), String::new()));
        assert_eq!(fields[5], ("REPORT_ID".to_string(), "C".to_string()));

        assert_eq!(
            parse_form_data("a&&b=2"),
            vec![
                ("a".to_string(), String::new()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_clean_escape_chars() {
        assert_eq!(clean_escape_chars("1,000"), "1000");
    }
}

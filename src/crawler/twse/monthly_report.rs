use crate::{
    crawler::twse::Fetcher,
    declare::Fetched,
    error::Result,
    logging,
    table::{delimited, normalize, Table},
    util::{self, datetime::to_republic_of_china_year},
};

/// 上市公司月營收 csv 所在目錄
const FILE_PATH: &str = "/home/html/nas/t21/sii/";

/// 下載上市公司月營收
///
/// `year` 為西元年，送出前換算成民國年。檔案不存在時公開資訊觀測站回傳的是 html 頁面，
/// 視為 `Fetched::NoData`。
pub async fn visit(fetcher: &Fetcher, year: i32, month: u32) -> Result<Fetched<Table>> {
    let endpoint = &fetcher.endpoints().monthly_report;
    let form = build_form(year, month);
    let text =
        util::http::post_form(fetcher.client(), &endpoint.url, &form, &endpoint.encoding).await?;

    parse(&text)
}

fn build_form(year: i32, month: u32) -> Vec<(String, String)> {
    let file_name = format!(
        "t21sc03_{}_{}.csv",
        to_republic_of_china_year(year),
        month
    );

    vec![
        ("step".to_string(), "9".to_string()),
        ("functionName".to_string(), "show_file".to_string()),
        ("filePath".to_string(), FILE_PATH.to_string()),
        ("fileName".to_string(), file_name),
    ]
}

/// 將月營收 csv 整理成以 (公司代號, 公司名稱) 為主鍵的表格
pub fn parse(text: &str) -> Result<Fetched<Table>> {
    if text.trim_start().starts_with('<') {
        logging::info_file_async("Monthly report responded with a html page");
        return Ok(Fetched::NoData);
    }

    let raw = delimited::read_csv(text)?;
    if raw.rows.is_empty() {
        return Ok(Fetched::NoData);
    }

    let table = normalize::monthly_report(&raw)?;
    if table.is_empty() {
        return Ok(Fetched::NoData);
    }

    Ok(Fetched::Found(table))
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use crate::{
        config::{Endpoint, Http, Twse},
        table::KeyValue,
        util::http::build_client,
    };

    use super::*;

    const REPORT_CSV: &str = "出表日期,資料年月,公司代號,公司名稱,產業別,營業收入-當月營收,營業收入-上月營收,營業收入-去年當月營收,營業收入-上月比較增減(%),營業收入-去年同月增減(%),累計營業收入-當月累計營收,累計營業收入-去年累計營收,累計營業收入-前期比較增減(%),備註\n\
\"112/02/10\",\"112/1\",\"1101\",\"台泥\",\"水泥工業\",\"8123456\",\"9234567\",\"10345678\",\"-12.03\",\"-21.48\",\"8123456\",\"10345678\",\"-21.48\",\"-\"\n\
\"112/02/10\",\"112/1\",\"2330\",\"台積電\",\"半導體業\",\"200050544\",\"219088225\",\"172175000\",\"-8.68\",\"16.18\",\"200050544\",\"172175000\",\"16.18\",\"-\"\n";

    #[test]
    fn test_build_form_uses_republic_of_china_year() {
        let form = build_form(2023, 1);
        assert_eq!(form[0], ("step".to_string(), "9".to_string()));
        assert_eq!(form[2].1, "/home/html/nas/t21/sii/");
        assert_eq!(form[3], ("fileName".to_string(), "t21sc03_112_1.csv".to_string()));
    }

    #[test]
    fn test_parse() {
        let table = parse(REPORT_CSV).unwrap().found().unwrap();

        assert_eq!(table.key_names(), vec!["公司代號", "公司名稱"]);
        assert_eq!(
            table.columns(),
            &[
                "當月營收",
                "上月營收",
                "去年當月營收",
                "上月比較增減(%)",
                "去年同月增減(%)",
                "當月累計營收",
                "去年累計營收",
                "前期比較增減(%)"
            ]
        );

        let tsmc = table
            .find(&[KeyValue::from("2330"), KeyValue::from("台積電")])
            .unwrap();
        assert_eq!(tsmc.values[0], Some(200050544.0));
        assert_eq!(tsmc.values[3], Some(-8.68));
    }

    #[test]
    fn test_parse_html_page_is_no_data() {
        let html = "<html><body>檔案不存在!</body></html>";
        assert!(parse(html).unwrap().is_no_data());
        assert!(parse("公司代號,公司名稱\n").unwrap().is_no_data());
    }

    #[tokio::test]
    async fn test_visit_posts_form_and_decodes_big5() {
        let mut server = mockito::Server::new_async().await;
        let (body, _, _) = encoding_rs::BIG5.encode(REPORT_CSV);
        let mock = server
            .mock("POST", "/server-java/FileDownLoad")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("step".into(), "9".into()),
                Matcher::UrlEncoded("filePath".into(), FILE_PATH.into()),
                Matcher::UrlEncoded("fileName".into(), "t21sc03_112_1.csv".into()),
            ]))
            .with_status(200)
            .with_body(body.into_owned())
            .create_async()
            .await;

        let endpoints = Twse {
            monthly_report: Endpoint::new(
                &format!("{}/server-java/FileDownLoad", server.url()),
                "big5",
            ),
            ..Twse::default()
        };
        let fetcher = Fetcher::new(build_client(&Http::default()).unwrap(), endpoints);
        let table = fetcher.monthly_report(2023, 1).await.unwrap().found().unwrap();

        mock.assert_async().await;
        assert_eq!(table.len(), 2);
        assert!(table
            .find(&[KeyValue::from("1101"), KeyValue::from("台泥")])
            .is_some());
    }
}

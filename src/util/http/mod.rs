use std::time::{Duration, Instant};

use async_trait::async_trait;
use concat_string::concat_string;
use once_cell::sync::OnceCell;
use reqwest::{Client, Method, RequestBuilder, Response};

use crate::{
    config::{self, Http},
    error::{Error, Result},
    logging, util,
};

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

/// Decodes a response body with an explicitly chosen character encoding.
///
/// TWSE and MOPS do not agree on a charset and do not always declare the one they use,
/// so the caller names the encoding instead of trusting the `Content-Type` header.
#[async_trait]
pub trait TextWithEncoding {
    /// Reads the whole body and decodes it with the encoding named by `label`.
    async fn text_with_encoding(self, label: &str) -> Result<String>;
}

#[async_trait]
impl TextWithEncoding for Response {
    async fn text_with_encoding(self, label: &str) -> Result<String> {
        let bytes = self.bytes().await?;
        util::text::decode(bytes.as_ref(), label)
    }
}

/// Builds a client from the given settings.
///
/// Timeouts are always bounded; the upstream servers occasionally hold connections open
/// without answering.
pub fn build_client(settings: &Http) -> Result<Client> {
    util::ensure_rustls_crypto_provider();

    Ok(Client::builder()
        // ===== 壓縮 =====
        .brotli(true)
        .deflate(true)
        .gzip(true)
        // ===== 超時設置 =====
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .timeout(Duration::from_secs(settings.timeout_secs))
        // ===== TCP 優化 =====
        .tcp_nodelay(true)
        // ===== Cookie 和重定向 =====
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(5))
        // ===== Headers =====
        .referer(true)
        .user_agent(settings.user_agent.as_str())
        .build()?)
}

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
pub fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| build_client(&config::SETTINGS.http))
}

/// Performs an HTTP GET request and decodes the body with the encoding named by `encoding`.
pub async fn get(client: &Client, url: &str, encoding: &str) -> Result<String> {
    send(client, Method::GET, url, None::<fn(RequestBuilder) -> RequestBuilder>)
        .await?
        .text_with_encoding(encoding)
        .await
}

/// Performs an HTTP POST request with form fields and decodes the body with the encoding
/// named by `encoding`.
pub async fn post_form(
    client: &Client,
    url: &str,
    form: &[(String, String)],
    encoding: &str,
) -> Result<String> {
    send(
        client,
        Method::POST,
        url,
        Some(|rb: RequestBuilder| rb.form(form)),
    )
    .await?
    .text_with_encoding(encoding)
    .await
}

/// Sends one request. There is no retry: a transport failure is returned to the caller as is,
/// and a non-success status becomes [`Error::Status`].
async fn send(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<impl FnOnce(RequestBuilder) -> RequestBuilder>,
) -> Result<Response> {
    let visit_log = concat_string!(method.as_str(), ":", url);
    let mut rb = client.request(method, url);

    if let Some(body_fn) = body {
        rb = body_fn(rb);
    }

    let start = Instant::now();
    let res = rb.send().await;
    let elapsed = start.elapsed().as_millis();

    match res {
        Ok(response) => {
            let status = response.status();
            logging::info_file_async(format!("{} {} {} ms", visit_log, status, elapsed));
            if !status.is_success() {
                return Err(Error::Status {
                    url: url.to_string(),
                    status,
                });
            }

            Ok(response)
        }
        Err(why) => {
            logging::error_file_async(format!(
                "{} failed because {:?}. {} ms",
                visit_log, why, elapsed
            ));
            Err(Error::Transport(why))
        }
    }
}

use std::sync::Once;

pub mod datetime;
pub mod http;
pub mod text;

static RUSTLS_PROVIDER: Once = Once::new();

/// reqwest 使用 `rustls-no-provider`，建立 client 前需先安裝 ring 加密實作
pub fn ensure_rustls_crypto_provider() {
    RUSTLS_PROVIDER.call_once(|| {
        // 已由其他程式碼安裝過時會回傳 Err，可忽略
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

use crate::config;
use crate::logging::*;
use serde::Serialize;
use std::time::Duration;

/// Discord の webhook が受け付ける最大文字数
pub const MAX_CONTENT_LENGTH: usize = 2000;

#[derive(Debug, Serialize)]
struct WebhookMessage {
    content: String,
}

/// 文字単位で `max` に収める
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn format_error(err: &anyhow::Error) -> String {
    truncate(&format!("{:#}", err), MAX_CONTENT_LENGTH)
}

/// エラーを運用者に知らせる
///
/// ログに残し、`REPORTER_WEBHOOK_URL` が設定されていれば webhook にも送る。
/// 送信は別タスクで行い、失敗しても呼び出し側には返さない。
pub fn report_error(err: &anyhow::Error) {
    let log = DEFAULT.new(o!("function" => "reporter::report_error"));
    error!(log, "reported"; "error" => ?err);

    let Ok(url) = config::get("REPORTER_WEBHOOK_URL") else {
        return;
    };
    let message = WebhookMessage {
        content: format_error(err),
    };
    tokio::spawn(async move {
        if let Err(e) = post(&url, &message).await {
            warn!(log, "failed to deliver error report"; "error" => %e);
        }
    });
}

async fn post(url: &str, message: &WebhookMessage) -> reqwest::Result<()> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()?
        .post(url)
        .json(message)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

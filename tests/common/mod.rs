//! Shared helpers for the endpoint tests
#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};

pub const ENDPOINT_PATH: &str = "/upload-chunk";

/// Matches a multipart text field `name` holding exactly `value`
pub fn field(name: &str, value: &str) -> Matcher {
    Matcher::Regex(format!(r#"name="{}"\r\n\r\n{}\r\n"#, name, value))
}

/// Matches the binary chunk part of a file named `file_name` holding `payload`
pub fn payload(file_name: &str, payload: &str) -> Matcher {
    Matcher::Regex(format!(
        r#"name="chunk"; filename="{}"\r\nContent-Type: application/octet-stream\r\n\r\n{}\r\n"#,
        file_name, payload
    ))
}

pub fn endpoint(server: &ServerGuard) -> String {
    format!("{}{}", server.url(), ENDPOINT_PATH)
}

/// Mock answering chunk `index` of `total` with `status` and `body`
pub async fn chunk_mock(
    server: &mut ServerGuard,
    index: u64,
    total: u64,
    status: usize,
    body: &str,
    hits: usize,
) -> Mock {
    server
        .mock("POST", ENDPOINT_PATH)
        .match_body(Matcher::AllOf(vec![
            field("chunkIndex", &index.to_string()),
            field("totalChunks", &total.to_string()),
        ]))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

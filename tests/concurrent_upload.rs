//! Concurrent chunk dispatch

mod common;

use chunked_upload::{
    UploadError, UploadOptions, UploadProgress, UploadSource, UploadStrategy, Uploader,
    UploaderConfig,
};
use common::{chunk_mock, endpoint};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_upload_finishes_with_final_chunk() -> Result<(), Box<dyn std::error::Error>>
{
    let _ = env_logger::try_init();
    let mut server = mockito::Server::new_async().await;

    let mut mocks = Vec::new();
    for index in 0..5 {
        mocks.push(chunk_mock(&mut server, index, 6, 200, "{}", 1).await);
    }
    mocks.push(chunk_mock(&mut server, 5, 6, 200, r#"{"fileUrl":"books/book.pdf"}"#, 1).await);

    let config = UploaderConfig::new()
        .endpoint(endpoint(&server))
        .chunk_size(4)
        .concurrency(3);
    let uploader = Uploader::new(config)?;
    let source = UploadSource::from_bytes("book.pdf", vec![b'b'; 22]);

    let seen: Arc<Mutex<Vec<UploadProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let options = UploadOptions::new()
        .strategy(UploadStrategy::Auto)
        .on_progress(move |progress| sink.lock().unwrap().push(progress));

    let result = uploader.upload(&source, options).await?;

    for mock in &mocks {
        mock.assert_async().await;
    }
    assert_eq!(result.asset_uri.as_deref(), Some("books/book.pdf"));
    assert_eq!(result.chunks, 6);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 6);
    let acknowledged: Vec<u64> = seen.iter().map(|p| p.chunks_acknowledged).collect();
    assert_eq!(acknowledged, vec![1, 2, 3, 4, 5, 6]);
    let last = seen.last().unwrap();
    assert_eq!(last.chunk_index, 5);
    assert_eq!(last.percent, 100);
    assert_eq!(last.bytes_uploaded, 22);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_failure_never_sends_final_chunk() -> Result<(), Box<dyn std::error::Error>>
{
    let _ = env_logger::try_init();
    let mut server = mockito::Server::new_async().await;

    let _first = chunk_mock(&mut server, 0, 4, 200, "{}", 1).await;
    let _failing = chunk_mock(&mut server, 1, 4, 500, "bad chunk", 1).await;
    // May or may not be in flight when chunk 1 fails
    let _third = server
        .mock("POST", common::ENDPOINT_PATH)
        .match_body(common::field("chunkIndex", "2"))
        .with_status(200)
        .expect_at_most(1)
        .create_async()
        .await;
    let final_chunk = chunk_mock(&mut server, 3, 4, 200, r#"{"fileUrl":"x"}"#, 0).await;

    let config = UploaderConfig::new()
        .endpoint(endpoint(&server))
        .chunk_size(2)
        .concurrency(2);
    let uploader = Uploader::new(config)?;
    let source = UploadSource::from_bytes("sheet.pdf", b"aabbccdd".to_vec());

    let err = uploader
        .upload(
            &source,
            UploadOptions::new().strategy(UploadStrategy::Concurrent),
        )
        .await
        .unwrap_err();

    final_chunk.assert_async().await;
    assert!(matches!(err, UploadError::ServerStatus { index: 1, .. }));

    Ok(())
}

/// Request counters kept by the slow endpoint
#[derive(Default)]
struct Counters {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
    // (completed, in flight) when the final chunk arrived
    final_seen: Mutex<Option<(usize, usize)>>,
}

fn chunk_index_of(body: &str) -> Option<u64> {
    let marker = "name=\"chunkIndex\"\r\n\r\n";
    let rest = &body[body.find(marker)? + marker.len()..];
    rest[..rest.find("\r\n")?].parse().ok()
}

/// Answer one request after a delay, counting how many overlap
async fn serve_slowly(
    mut stream: TcpStream,
    counters: Arc<Counters>,
    final_index: u64,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut read = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut read).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&read[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length: usize = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut read).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&read[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).into_owned();
    let index = chunk_index_of(&body);
    let is_final = index == Some(final_index);

    if is_final {
        *counters.final_seen.lock().unwrap() = Some((
            counters.completed.load(Ordering::SeqCst),
            counters.in_flight.load(Ordering::SeqCst),
        ));
    }
    let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(100)).await;

    counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    counters.completed.fetch_add(1, Ordering::SeqCst);

    let reply = if is_final {
        r#"{"fileUrl":"books/slow.pdf"}"#
    } else {
        "{}"
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.len(),
        reply
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrency_limits_requests_in_flight() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::try_init();
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    let counters = Arc::new(Counters::default());

    let shared = counters.clone();
    let server = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let counters = shared.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_slowly(stream, counters, 5).await {
                    log::warn!("Slow endpoint connection failed: {}", e);
                }
            });
        }
    });

    let config = UploaderConfig::new()
        .endpoint(format!("http://{}/upload-chunk", address))
        .chunk_size(2)
        .concurrency(2);
    let uploader = Uploader::new(config)?;
    let source = UploadSource::from_bytes("slow.pdf", vec![b's'; 12]);

    let result = uploader
        .upload(
            &source,
            UploadOptions::new().strategy(UploadStrategy::Concurrent),
        )
        .await?;
    server.abort();

    assert_eq!(result.asset_uri.as_deref(), Some("books/slow.pdf"));
    assert_eq!(result.chunks, 6);
    assert_eq!(counters.completed.load(Ordering::SeqCst), 6);
    assert_eq!(counters.max_in_flight.load(Ordering::SeqCst), 2);
    // The final chunk only went out once the other five were answered
    assert_eq!(*counters.final_seen.lock().unwrap(), Some((5, 0)));

    Ok(())
}

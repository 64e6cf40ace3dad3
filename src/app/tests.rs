use super::LoadSession;
use crate::args::PositiveUsize;
use crate::config::{LoadSessionConfig, TargetSource};
use crate::error::{AppError, HttpError};
use crate::http::TlsMaterial;
use crate::metrics::AggregateReport;
use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const TASK_TIMEOUT: Duration = Duration::from_secs(10);
const BODY: &str = "ok";

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn session_config(target: TargetSource, concurrency: usize) -> Result<LoadSessionConfig, String> {
    Ok(LoadSessionConfig {
        duration: Duration::from_secs(30),
        concurrency: PositiveUsize::try_from(concurrency).map_err(|err| err.to_string())?,
        target,
        method: reqwest::Method::GET,
        body: String::new(),
        headers: BTreeMap::new(),
        host_header: None,
        request_timeout: Duration::from_millis(300),
        follow_redirects: false,
        disable_compression: false,
        disable_keepalive: false,
        insecure: false,
        tls: TlsMaterial::default(),
        http2: false,
        server_override: None,
    })
}

fn url_file_target(path: PathBuf, base_url: String, repeat: usize) -> Result<TargetSource, String> {
    Ok(TargetSource::UrlFile {
        path,
        base_url,
        repeat: PositiveUsize::try_from(repeat).map_err(|err| err.to_string())?,
    })
}

/// Keep-alive HTTP/1.1 server answering every request with `BODY` after `delay`.
async fn spawn_server(delay: Duration) -> Result<SocketAddr, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("local_addr failed: {}", err))?;
    let response = Arc::new(
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: text/plain\r\n\r\n{}",
            BODY.len(),
            BODY
        )
        .into_bytes(),
    );
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve_connection(stream, Arc::clone(&response), delay));
        }
    });
    Ok(addr)
}

async fn serve_connection(mut stream: TcpStream, response: Arc<Vec<u8>>, delay: Duration) {
    let mut pending = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let read = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(read) => read,
        };
        pending.extend_from_slice(chunk.get(..read).unwrap_or_default());
        while let Some(end) = pending
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|position| position.saturating_add(4))
        {
            pending.drain(..end);
            tokio::time::sleep(delay).await;
            if stream.write_all(&response).await.is_err() {
                return;
            }
        }
    }
}

/// Runs the session and stops it after `stop_after`, returning what `start`
/// produced.
async fn run_and_stop(
    session: &LoadSession,
    stop_after: Duration,
) -> Result<Result<AggregateReport, AppError>, String> {
    let stop = session.stop_handle();
    let stopper = async move {
        tokio::time::sleep(stop_after).await;
        stop.trigger();
    };
    let (result, ()) = tokio::time::timeout(TASK_TIMEOUT, async {
        tokio::join!(session.start(), stopper)
    })
    .await
    .map_err(|err| format!("Session ignored stop: {}", err))?;
    Ok(result)
}

fn check_bytes(report: &AggregateReport) -> Result<(), String> {
    let body_len = u64::try_from(BODY.len()).map_err(|err| err.to_string())?;
    if report.total_response_bytes != report.num_requests.saturating_mul(body_len) {
        return Err(format!(
            "Bytes {} do not match {} requests of {} bytes",
            report.total_response_bytes, report.num_requests, body_len
        ));
    }
    Ok(())
}

#[test]
fn stop_mid_run_collects_every_worker() -> Result<(), String> {
    run_async_test(async {
        let addr = spawn_server(Duration::ZERO).await?;
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let path = dir.path().join("urls.txt");
        let lines: Vec<String> = (0..300).map(|index| format!("/item/{}", index)).collect();
        std::fs::write(&path, lines.join("\n")).map_err(|err| format!("write failed: {}", err))?;

        let target = url_file_target(path, format!("http://{}", addr), 1_000)?;
        let session = LoadSession::new(session_config(target, 4)?);
        let report = run_and_stop(&session, Duration::from_millis(300))
            .await?
            .map_err(|err| format!("Session failed: {}", err))?;

        if report.records_received != 4 {
            return Err(format!("Expected 4 records, got {}", report.records_received));
        }
        if !report.interrupted {
            return Err("Stopped run should be marked interrupted".to_owned());
        }
        if report.num_requests == 0 || report.num_errors != 0 {
            return Err(format!(
                "Expected clean completed requests: {} ok / {} errors",
                report.num_requests, report.num_errors
            ));
        }
        check_bytes(&report)
    })
}

#[test]
fn cancel_before_any_response_gives_empty_report() -> Result<(), String> {
    run_async_test(async {
        let addr = spawn_server(Duration::from_secs(5)).await?;
        let target = TargetSource::Fixed(format!("http://{}/slow", addr));
        let session = LoadSession::new(session_config(target, 3)?);
        let report = run_and_stop(&session, Duration::from_millis(50))
            .await?
            .map_err(|err| format!("Session failed: {}", err))?;

        if !report.is_empty() {
            return Err(format!("No request should complete: {:?}", report));
        }
        if report.records_received != 3 || !report.interrupted {
            return Err(format!(
                "Expected 3 interrupted records, got {} (interrupted={})",
                report.records_received, report.interrupted
            ));
        }
        Ok(())
    })
}

#[test]
fn stop_before_start_sends_nothing() -> Result<(), String> {
    run_async_test(async {
        let target = TargetSource::Fixed("http://127.0.0.1:1/".to_owned());
        let session = LoadSession::new(session_config(target, 4)?);
        session.stop();
        session.stop();

        let report = tokio::time::timeout(TASK_TIMEOUT, session.start())
            .await
            .map_err(|err| format!("Stopped session hung: {}", err))?
            .map_err(|err| format!("Session failed: {}", err))?;

        if !report.is_empty() || report.num_errors != 0 {
            return Err(format!("Stopped session should be empty: {:?}", report));
        }
        if report.records_received != 4 || !report.interrupted {
            return Err(format!("Unexpected report: {:?}", report));
        }
        Ok(())
    })
}

#[test]
fn natural_finish_then_stop_is_harmless() -> Result<(), String> {
    run_async_test(async {
        let addr = spawn_server(Duration::ZERO).await?;
        let target = TargetSource::Fixed(format!("http://{}/", addr));
        let mut config = session_config(target, 2)?;
        config.duration = Duration::from_millis(200);
        let session = LoadSession::new(config);

        let report = tokio::time::timeout(TASK_TIMEOUT, session.start())
            .await
            .map_err(|err| format!("Session did not finish: {}", err))?
            .map_err(|err| format!("Session failed: {}", err))?;
        session.stop();
        session.stop();

        if report.interrupted {
            return Err("A run that reached its duration is not interrupted".to_owned());
        }
        if report.records_received != 2 || report.num_requests == 0 {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if report.elapsed < Duration::from_millis(200) {
            return Err(format!("Run ended early: {:?}", report.elapsed));
        }
        if !session.stop_handle().is_stopped() {
            return Err("Stop after finish should still flip the switch".to_owned());
        }
        check_bytes(&report)
    })
}

#[test]
fn supplier_failure_is_returned_from_start() -> Result<(), String> {
    run_async_test(async {
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let target = url_file_target(
            dir.path().join("missing.txt"),
            "http://127.0.0.1:1".to_owned(),
            1,
        )?;
        let session = LoadSession::new(session_config(target, 2)?);

        let result = tokio::time::timeout(TASK_TIMEOUT, session.start())
            .await
            .map_err(|err| format!("Session hung on supplier failure: {}", err))?;
        match result {
            Err(AppError::Http(HttpError::ReadUrlFile { .. })) => Ok(()),
            Err(err) => Err(format!("Unexpected error: {}", err)),
            Ok(report) => Err(format!("Expected supplier error, got {:?}", report)),
        }
    })
}

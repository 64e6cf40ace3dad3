use std::borrow::Cow;
use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};

use crate::args::PositiveUsize;
use crate::error::{AppError, AppResult, HttpError};
use crate::shutdown::StopSwitch;

/// Bounded single-producer, multi-consumer queue of target URLs.
///
/// Closing it wakes every worker blocked on [`UrlQueue::receiver`].
#[derive(Debug, Clone)]
pub struct UrlQueue {
    tx: async_channel::Sender<String>,
    rx: async_channel::Receiver<String>,
}

impl UrlQueue {
    #[must_use]
    pub fn bounded(capacity: PositiveUsize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity.get());
        Self { tx, rx }
    }

    #[must_use]
    pub fn receiver(&self) -> async_channel::Receiver<String> {
        self.rx.clone()
    }

    /// Closes the queue; entries already queued can still be drained.
    ///
    /// Returns `true` if this call closed it.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// List-file settings for the supplier.
#[derive(Debug, Clone)]
pub struct UrlFileSource {
    pub path: PathBuf,
    pub base_url: String,
    pub repeat: PositiveUsize,
}

/// Spawns the producer that streams `base_url + line` into the queue.
///
/// The queue is always closed when the task ends. A read failure flips the
/// stop switch so the pool winds down, and is returned from the task.
#[must_use]
pub fn setup_url_supplier(
    source: UrlFileSource,
    queue: &UrlQueue,
    stop: &StopSwitch,
) -> tokio::task::JoinHandle<AppResult<u64>> {
    let queue = queue.clone();
    let stop = stop.clone();
    tokio::spawn(async move {
        let result = supply_urls(&source, &queue, &stop).await;
        queue.close();
        match result {
            Ok(pushed) => {
                debug!("URL supplier finished after {} entries", pushed);
                Ok(pushed)
            }
            Err(err) => {
                error!("{}", err);
                stop.trigger();
                Err(AppError::http(err))
            }
        }
    })
}

async fn supply_urls(
    source: &UrlFileSource,
    queue: &UrlQueue,
    stop: &StopSwitch,
) -> Result<u64, HttpError> {
    let mut listener = stop.listener();
    let mut pushed: u64 = 0;
    let passes = source.repeat.get();

    for pass in 1..=passes {
        if stop.is_stopped() {
            return Ok(pushed);
        }
        let file = File::open(&source.path)
            .await
            .map_err(|err| read_error(source, err))?;
        let mut lines = BufReader::new(file).split(b'\n');

        loop {
            let next = tokio::select! {
                () = listener.wait() => return Ok(pushed),
                next = lines.next_segment() => next.map_err(|err| read_error(source, err))?,
            };
            let Some(line) = next else {
                break;
            };
            let url = format!("{}{}", source.base_url, decode_line(&line));
            tokio::select! {
                () = listener.wait() => return Ok(pushed),
                sent = queue.tx.send(url) => {
                    if sent.is_err() {
                        return Ok(pushed);
                    }
                }
            }
            pushed = pushed.saturating_add(1);
        }
        debug!("URL file pass {}/{} done", pass, passes);
    }

    Ok(pushed)
}

/// Strips a trailing `\r`; invalid UTF-8 becomes U+FFFD.
fn decode_line(line: &[u8]) -> Cow<'_, str> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line)
}

fn read_error(source: &UrlFileSource, err: std::io::Error) -> HttpError {
    HttpError::ReadUrlFile {
        path: source.path.clone(),
        source: err,
    }
}

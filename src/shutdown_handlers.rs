use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, poll, read};

use crate::shutdown::StopSwitch;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Keyboard polling interval for Ctrl+C detection in TTY mode.
const KEYBOARD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Watches the terminal for a Ctrl+C keypress when the terminal delivers it as
/// a key event instead of a signal.
pub fn setup_keyboard_shutdown_handler(stop: &StopSwitch) -> tokio::task::JoinHandle<()> {
    let stop = stop.clone();
    tokio::task::spawn_blocking(move || {
        while !stop.is_stopped() {
            let has_event = poll(KEYBOARD_POLL_INTERVAL).unwrap_or_default();

            if has_event
                && let Ok(Event::Key(KeyEvent {
                    code: KeyCode::Char('c'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                })) = read()
            {
                request_stop(&stop, "Ctrl+C");
                break;
            }
        }
    })
}

/// Bridges process signals into the session's stop switch.
///
/// Ctrl+C is handled everywhere; SIGTERM and SIGQUIT are handled on unix.
/// The task ends after the first signal or once the switch is flipped by
/// someone else.
pub fn setup_signal_shutdown_handler(stop: &StopSwitch) -> tokio::task::JoinHandle<()> {
    let stop = stop.clone();
    tokio::spawn(async move {
        let mut listener = stop.listener();

        #[cfg(unix)]
        let mut term_signal = register(SignalKind::terminate(), "SIGTERM");
        #[cfg(unix)]
        let mut quit_signal = register(SignalKind::quit(), "SIGQUIT");

        #[cfg(unix)]
        {
            tokio::select! {
                () = listener.wait() => {}
                _ = tokio::signal::ctrl_c() => {
                    request_stop(&stop, "interrupt");
                }
                () = recv_or_pending(term_signal.as_mut()) => {
                    request_stop(&stop, "SIGTERM");
                }
                () = recv_or_pending(quit_signal.as_mut()) => {
                    request_stop(&stop, "SIGQUIT");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                () = listener.wait() => {}
                _ = tokio::signal::ctrl_c() => {
                    request_stop(&stop, "interrupt");
                }
            }
        }
    })
}

fn request_stop(stop: &StopSwitch, reason: &str) {
    if stop.trigger() {
        tracing::info!("Received {}, stopping...", reason);
    }
}

#[cfg(unix)]
fn register(kind: SignalKind, name: &str) -> Option<tokio::signal::unix::Signal> {
    match signal(kind) {
        Ok(signal) => Some(signal),
        Err(err) => {
            tracing::warn!("Failed to register {} handler: {}", name, err);
            None
        }
    }
}

#[cfg(unix)]
async fn recv_or_pending(signal: Option<&mut tokio::signal::unix::Signal>) {
    if let Some(signal) = signal {
        signal.recv().await;
    } else {
        std::future::pending::<()>().await;
    }
}

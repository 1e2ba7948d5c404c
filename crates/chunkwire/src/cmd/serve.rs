use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chunkwire_session::{ChunkPump, ProtocolSession, SessionError, SessionEvent};
use chunkwire_transport::{IoTransport, UdsStream, UnixDomainSocket};
use tracing::{debug, info};

use crate::exit::{session_error, transport_error, CliError, CliResult, INTERNAL};

pub type UdsSession = ProtocolSession<IoTransport<UdsStream>>;

/// How often a blocked read wakes up to check for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub enum Flow {
    Continue,
    Stop,
}

/// Bind `path`, accept connections one at a time and hand every session event
/// to `on_event` until it returns [`Flow::Stop`] or Ctrl-C is pressed.
///
/// Each connection gets a fresh session, so sequence numbers restart at 0 and
/// no partial frame carries over between peers.
pub fn serve<F>(path: &Path, mut on_event: F) -> CliResult<()>
where
    F: FnMut(&mut UdsSession, SessionEvent) -> CliResult<Flow>,
{
    let listener =
        UnixDomainSocket::bind(path).map_err(|err| transport_error("bind failed", err))?;
    info!(path = %path.display(), "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    while running.load(Ordering::SeqCst) {
        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        stream
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(|err| transport_error("socket setup failed", err))?;
        let writer = stream
            .try_clone()
            .map_err(|err| transport_error("socket setup failed", err))?;

        let (mut session, mut events) = ProtocolSession::new(IoTransport::new(writer));
        let mut pump = ChunkPump::for_session(stream, &session)
            .map_err(|err| session_error("session setup failed", err))?;
        debug!("peer connected");

        while running.load(Ordering::SeqCst) {
            match pump.pump_once(&mut session) {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(SessionError::Io(err)) if is_poll_timeout(&err) => continue,
                Err(SessionError::Io(err)) if is_disconnect(&err) => break,
                Err(err) => return Err(session_error("receive failed", err)),
            }

            for event in events.drain() {
                if let Flow::Stop = on_event(&mut session, event)? {
                    return Ok(());
                }
            }
        }

        let stats = pump.stats();
        debug!(
            chunks = stats.chunks,
            bytes = stats.bytes,
            events = stats.events,
            "peer disconnected"
        );
    }

    Ok(())
}

fn is_poll_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof
    )
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_timeouts_are_polls_not_failures() {
        assert!(is_poll_timeout(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(is_poll_timeout(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(!is_poll_timeout(&io::Error::from(io::ErrorKind::BrokenPipe)));
    }

    #[test]
    fn reset_peer_ends_connection() {
        assert!(is_disconnect(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(!is_disconnect(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}

use std::io::{ErrorKind, Read};

use tracing::debug;

use crate::error::{Result, SessionError};
use crate::session::ProtocolSession;

/// Counters reported by [`ChunkPump::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Reads that returned data.
    pub chunks: u64,
    /// Bytes delivered to the session.
    pub bytes: u64,
    /// Events the session published while pumping.
    pub events: u64,
}

/// Moves bytes from a blocking `Read` source (serial port, socket) into a
/// session, one read at a time, in arrival order.
///
/// Chunk boundaries are whatever the source returns; the session does not
/// care where they fall.
pub struct ChunkPump<R> {
    inner: R,
    buf: Vec<u8>,
    stats: PumpStats,
}

impl<R: Read> ChunkPump<R> {
    /// Create a pump that reads up to `chunk_size` bytes at a time.
    pub fn new(inner: R, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SessionError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            inner,
            buf: vec![0u8; chunk_size],
            stats: PumpStats::default(),
        })
    }

    /// Create a pump sized from the session's `read_chunk_size`.
    pub fn for_session<T>(inner: R, session: &ProtocolSession<T>) -> Result<Self> {
        Self::new(inner, session.config().read_chunk_size)
    }

    /// Perform one read and feed it to the session.
    ///
    /// Returns the number of events published, or `None` at end of stream.
    /// `Interrupted` reads are retried; every other I/O error is returned,
    /// including read timeouts.
    pub fn pump_once<T>(&mut self, session: &mut ProtocolSession<T>) -> Result<Option<usize>> {
        let read = loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SessionError::Io(err)),
            }
        };

        if read == 0 {
            debug!(
                chunks = self.stats.chunks,
                bytes = self.stats.bytes,
                "source reached end of stream"
            );
            return Ok(None);
        }

        let published = session.on_chunk(&self.buf[..read]);
        self.stats.chunks += 1;
        self.stats.bytes += read as u64;
        self.stats.events += published as u64;
        Ok(Some(published))
    }

    /// Pump until end of stream.
    pub fn run<T>(&mut self, session: &mut ProtocolSession<T>) -> Result<PumpStats> {
        while self.pump_once(session)?.is_some() {}
        Ok(self.stats)
    }

    /// Counters so far.
    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the pump and return the source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

//! One client TCP connection.
//!
//! Reads never block: [`Session::receive_available`] drains whatever the
//! socket has ready and returns immediately. Bytes that do not yet form a
//! whole packet are handed back with [`Session::keep_remainder`] and are
//! prepended to the next read.

use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

const READ_CHUNK: usize = 4096;

/// Protocol state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Connected, waiting for PlayerIdentification.
    Unauthenticated,
    /// Identified and spawned.
    Active,
    /// Torn down; no further packets are processed.
    Disconnected,
}

pub struct Session {
    address: SocketAddr,
    reader: OwnedReadHalf,
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: Mutex<BytesMut>,
    state: Mutex<LoginState>,
    write_timeout: Duration,
}

impl Session {
    pub fn new(stream: TcpStream, write_timeout: Duration) -> io::Result<Self> {
        let address = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            address,
            reader,
            writer: tokio::sync::Mutex::new(writer),
            pending: Mutex::new(BytesMut::new()),
            state: Mutex::new(LoginState::Unauthenticated),
            write_timeout,
        })
    }

    /// Peer address; the key of this connection in every registry.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn state(&self) -> LoginState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_state(&self, state: LoginState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Drain every byte the socket has ready.
    ///
    /// Returns `Ok(None)` when nothing new arrived. Otherwise returns the new
    /// bytes preceded by any remainder kept from the previous batch. A closed
    /// peer is reported as [`io::ErrorKind::UnexpectedEof`], after any bytes
    /// it sent before closing have been returned.
    pub fn receive_available(&self) -> io::Result<Option<Bytes>> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let mut received = false;
        loop {
            match self.reader.try_read(&mut chunk) {
                // EOF repeats on the next poll.
                Ok(0) if received => break,
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by peer",
                    ))
                }
                Ok(n) => {
                    pending.extend_from_slice(&chunk[..n]);
                    received = true;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if !received {
            return Ok(None);
        }
        Ok(Some(pending.split().freeze()))
    }

    /// Keep the undecoded tail of a batch for the next read.
    pub fn keep_remainder(&self, remainder: &[u8]) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let newer = pending.split();
        pending.extend_from_slice(remainder);
        pending.unsplit(newer);
    }

    /// Write `data` in full. Concurrent callers are serialized so packets
    /// never interleave.
    pub async fn send(&self, data: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        match tokio::time::timeout(self.write_timeout, writer.write_all(data)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out")),
        }
    }

    /// Close the write side. Errors are ignored; the peer may already be gone.
    pub async fn shutdown(&self) {
        self.set_state(LoginState::Disconnected);
        let mut writer = self.writer.lock().await;
        let _ = tokio::time::timeout(self.write_timeout, writer.shutdown()).await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// A connected (server session, client stream) pair over loopback.
    pub(crate) async fn session_pair() -> (Session, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        (
            Session::new(stream, Duration::from_secs(5)).unwrap(),
            client,
        )
    }

    /// Poll until the session yields a batch.
    pub(crate) async fn receive(session: &Session) -> Bytes {
        for _ in 0..200 {
            if let Some(batch) = session.receive_available().unwrap() {
                return batch;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no data received");
    }

    #[tokio::test]
    async fn nothing_ready_returns_none() {
        let (session, _client) = session_pair().await;
        assert!(session.receive_available().unwrap().is_none());
        assert_eq!(session.state(), LoginState::Unauthenticated);
    }

    #[tokio::test]
    async fn receives_written_bytes() {
        let (session, mut client) = session_pair().await;
        client.write_all(&[1, 2, 3]).await.unwrap();
        assert_eq!(&receive(&session).await[..], &[1, 2, 3]);
    }

    #[tokio::test]
    async fn remainder_is_prepended() {
        let (session, mut client) = session_pair().await;
        session.keep_remainder(&[9, 9]);
        client.write_all(&[1]).await.unwrap();
        assert_eq!(&receive(&session).await[..], &[9, 9, 1]);
    }

    #[tokio::test]
    async fn peer_close_is_an_error() {
        let (session, client) = session_pair().await;
        drop(client);
        let mut result = Ok(None);
        for _ in 0..200 {
            result = session.receive_available();
            if result.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(
            result.unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[tokio::test]
    async fn bytes_before_close_are_delivered() {
        let (session, mut client) = session_pair().await;
        client.write_all(&[4, 5, 6]).await.unwrap();
        drop(client);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut data = Vec::new();
        let mut result = Ok(None);
        for _ in 0..200 {
            result = session.receive_available();
            match &result {
                Ok(Some(batch)) => data.extend_from_slice(batch),
                Ok(None) => tokio::time::sleep(Duration::from_millis(5)).await,
                Err(_) => break,
            }
        }
        assert_eq!(data, vec![4, 5, 6]);
        assert_eq!(
            result.unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[tokio::test]
    async fn send_reaches_peer() {
        let (session, mut client) = session_pair().await;
        session.send(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[tokio::test]
    async fn shutdown_marks_disconnected() {
        let (session, mut client) = session_pair().await;
        session.shutdown().await;
        assert_eq!(session.state(), LoginState::Disconnected);
        let mut buf = Vec::new();
        assert_eq!(client.read_to_end(&mut buf).await.unwrap(), 0);
    }
}

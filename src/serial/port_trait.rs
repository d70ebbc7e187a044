//! Trait abstraction for the sensor byte stream to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// Trait for reading the sensor byte stream
#[async_trait]
pub trait ByteSource: Send {
    /// Fill `buf` completely
    ///
    /// Fails with `UnexpectedEof` if the source closes first.
    async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Consume bytes until `marker` has been seen as a contiguous run
    ///
    /// Returns the number of bytes consumed, marker included.
    async fn read_until(&mut self, marker: &[u8]) -> io::Result<usize> {
        if marker.is_empty() {
            return Ok(0);
        }

        let mut window: Vec<u8> = Vec::with_capacity(marker.len());
        let mut consumed = 0usize;
        let mut byte = [0u8; 1];

        loop {
            self.read_exact(&mut byte).await?;
            consumed += 1;

            if window.len() == marker.len() {
                window.remove(0);
            }
            window.push(byte[0]);

            if window == marker {
                return Ok(consumed);
            }
        }
    }
}

/// Buffered wrapper around tokio_serial::SerialStream that implements ByteSource
pub struct SerialSource<R = tokio_serial::SerialStream> {
    port: BufReader<R>,
}

impl<R: AsyncRead + Unpin + Send> SerialSource<R> {
    pub fn new(port: R) -> Self {
        Self {
            port: BufReader::new(port),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ByteSource for SerialSource<R> {
    async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        AsyncReadExt::read_exact(&mut self.port, buf).await.map(|_| ())
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::pipeline::Shutdown;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock byte source for testing
    ///
    /// Serves a fixed byte buffer, then reports `UnexpectedEof`.
    #[derive(Clone)]
    pub struct MockByteSource {
        pub data: Arc<Mutex<VecDeque<u8>>>,
        pub consumed: Arc<Mutex<usize>>,
        pub read_error: Arc<Mutex<Option<io::ErrorKind>>>,
        pub shutdown_on_drain: Option<Shutdown>,
    }

    impl MockByteSource {
        pub fn new(data: &[u8]) -> Self {
            Self {
                data: Arc::new(Mutex::new(data.iter().copied().collect())),
                consumed: Arc::new(Mutex::new(0)),
                read_error: Arc::new(Mutex::new(None)),
                shutdown_on_drain: None,
            }
        }

        /// Request shutdown once the last buffered byte has been read
        pub fn with_shutdown_on_drain(mut self, shutdown: Shutdown) -> Self {
            self.shutdown_on_drain = Some(shutdown);
            self
        }

        pub fn consumed(&self) -> usize {
            *self.consumed.lock().unwrap()
        }

        pub fn remaining(&self) -> usize {
            self.data.lock().unwrap().len()
        }

        pub fn set_read_error(&self, error: io::ErrorKind) {
            *self.read_error.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl ByteSource for MockByteSource {
        async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
            if let Some(error) = *self.read_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock read error"));
            }

            let mut data = self.data.lock().unwrap();
            for slot in buf.iter_mut() {
                match data.pop_front() {
                    Some(byte) => {
                        *slot = byte;
                        *self.consumed.lock().unwrap() += 1;
                    }
                    None => {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "Mock source exhausted",
                        ));
                    }
                }
            }

            if data.is_empty() {
                if let Some(shutdown) = &self.shutdown_on_drain {
                    shutdown.trigger();
                }
            }
            Ok(())
        }
    }
}

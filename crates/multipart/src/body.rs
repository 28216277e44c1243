//! Stream adapter feeding the encoder into an HTTP request body.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;

use crate::MultipartError;
use crate::encoder::MultipartEncoder;

/// Bytes produced per poll of an [`EncoderBody`]: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Adapts a shared [`MultipartEncoder`] into a byte stream.
///
/// The encoder stays behind a mutex because the I/O reactor polls this
/// stream while the workflow thread may concurrently request `reset`
/// (retry) or `close` (cancellation) on the same encoder.
pub struct EncoderBody {
    encoder: Arc<Mutex<MultipartEncoder>>,
    chunk_size: usize,
}

impl EncoderBody {
    pub fn new(encoder: Arc<Mutex<MultipartEncoder>>) -> EncoderBody {
        EncoderBody {
            encoder,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    #[cfg(test)]
    fn with_chunk_size(mut self, chunk_size: usize) -> EncoderBody {
        self.chunk_size = chunk_size;
        self
    }
}

impl Stream for EncoderBody {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut guard = match self.encoder.lock() {
            Ok(guard) => guard,
            Err(_) => {
                return Poll::Ready(Some(Err(io::Error::other("multipart encoder poisoned"))));
            }
        };

        let mut buf = vec![0u8; self.chunk_size];
        match guard.read_chunk(&mut buf) {
            Ok(0) => Poll::Ready(None),
            Ok(n) => {
                buf.truncate(n);
                Poll::Ready(Some(Ok(Bytes::from(buf))))
            }
            Err(MultipartError::Io(e)) => Poll::Ready(Some(Err(e))),
            Err(MultipartError::Closed) => {
                Poll::Ready(Some(Err(io::Error::other("multipart encoder closed"))))
            }
        }
    }
}

/// Line-delimited message transport
///
/// One JSON document per line in each direction. Blank lines on input are
/// keep-alive padding and are skipped here, so the server never sees them.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Reads and writes newline-terminated messages
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    buffer: Vec<u8>,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            buffer: Vec::with_capacity(4096),
        }
    }

    /// Read the next non-blank line without its terminator
    ///
    /// Returns `Ok(None)` once the peer closes the stream. The bytes are
    /// returned raw; UTF-8 and JSON validity are the codec's concern.
    pub async fn read_message(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        loop {
            self.buffer.clear();
            let read = self.reader.read_until(b'\n', &mut self.buffer).await?;
            if read == 0 {
                return Ok(None);
            }

            if self.buffer.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let mut line = std::mem::take(&mut self.buffer);
            while matches!(line.last(), Some(b'\n' | b'\r')) {
                line.pop();
            }
            return Ok(Some(line));
        }
    }

    /// Write one message followed by a newline and flush
    pub async fn write_message(&mut self, message: &[u8]) -> std::io::Result<()> {
        debug_assert!(!message.contains(&b'\n'), "framed message contains a newline");

        self.writer.write_all(message).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

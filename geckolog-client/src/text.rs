//! Memory link over the Aroma text-command protocol.
//!
//! The plugin has no bulk binary read, so byte ranges are assembled from
//! 32-bit peeks. Every elementary peek validates its own range before
//! anything is written to the socket.

use crate::connection::{open_stream, slot_address, with_timeout, ConnectionConfig};
use crate::error::ClientError;
use crate::link::{MemoryLink, Variant};
use bytes::{Bytes, BytesMut};
use geckolog_protocol::text::{self, PeekType};
use geckolog_protocol::{address, Access, WORD_SIZE};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// A link speaking the text-command protocol.
pub struct TextLink<S> {
    stream: S,
    request_timeout: Duration,
    frames: u64,
}

impl TextLink<TcpStream> {
    /// Connects to the plugin.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, ClientError> {
        let stream = open_stream(config).await?;
        Ok(Self::new(stream, config.request_timeout))
    }
}

impl<S> TextLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established stream.
    pub fn new(stream: S, request_timeout: Duration) -> Self {
        Self {
            stream,
            request_timeout,
            frames: 0,
        }
    }

    /// Number of completed peeks.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Sends one peek command and returns the raw reply.
    async fn exchange(&mut self, peek: PeekType, wire_address: u32) -> Result<Vec<u8>, ClientError> {
        let command = text::command(peek, wire_address);
        let stream = &mut self.stream;

        tracing::debug!("Sending {:?}", command);

        let reply = with_timeout(self.request_timeout, async {
            stream.write_all(command.as_bytes()).await?;

            // One read into a fixed-size buffer; the plugin sends the whole
            // reply in a single segment.
            let mut buf = vec![0u8; peek.reply_capacity()];
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Err(ClientError::ConnectionClosed);
            }
            buf.truncate(n);
            Ok(buf)
        })
        .await?;

        self.frames += 1;
        Ok(reply)
    }

    /// Validates and performs an integer peek of the given type.
    async fn peek_integer(&mut self, peek: PeekType, address: u32) -> Result<u32, ClientError> {
        address::check(address, peek.width(), Access::Read)?;
        let wire_address = slot_address(address, peek.slot_offset(), peek.width())?;
        let reply = self.exchange(peek, wire_address).await?;
        Ok(text::parse_integer(peek, &reply)?)
    }

    /// Peeks the word at `address`, validating only the `kept` bytes the
    /// caller will use.
    async fn peek_word(&mut self, address: u32, kept: u32) -> Result<[u8; 4], ClientError> {
        address::check(address, kept, Access::Read)?;
        let reply = self.exchange(PeekType::U32, address).await?;
        Ok(text::parse_integer(PeekType::U32, &reply)?.to_be_bytes())
    }
}

impl<S> MemoryLink for TextLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn variant(&self) -> Variant {
        Variant::Text
    }

    async fn read_bytes(&mut self, address: u32, length: u32) -> Result<Bytes, ClientError> {
        address::check(address, length, Access::Read)?;

        let mut out = BytesMut::with_capacity(length as usize);
        let mut address = address;
        let mut remaining = length;

        while remaining > WORD_SIZE {
            let word = self.peek_word(address, WORD_SIZE).await?;
            out.extend_from_slice(&word);
            address += WORD_SIZE;
            remaining -= WORD_SIZE;
        }

        let word = self.peek_word(address, remaining).await?;
        out.extend_from_slice(&word[..remaining as usize]);

        Ok(out.freeze())
    }

    async fn peek8(&mut self, address: u32) -> Result<u8, ClientError> {
        Ok(self.peek_integer(PeekType::U8, address).await? as u8)
    }

    async fn peek16(&mut self, address: u32) -> Result<u16, ClientError> {
        Ok(self.peek_integer(PeekType::U16, address).await? as u16)
    }

    async fn peek32(&mut self, address: u32) -> Result<u32, ClientError> {
        self.peek_integer(PeekType::U32, address).await
    }

    async fn peek_float(&mut self, address: u32) -> Result<f32, ClientError> {
        address::check(address, WORD_SIZE, Access::Read)?;
        let reply = self.exchange(PeekType::F32, address).await?;
        Ok(text::parse_float(&reply)?)
    }
}

//! Memory link over the classic binary protocol.

use crate::connection::{open_stream, read_exact, slot_address, with_timeout, ConnectionConfig};
use crate::error::ClientError;
use crate::link::{MemoryLink, Variant};
use bytes::{Bytes, BytesMut};
use geckolog_protocol::classic::{self, ReadRequest, Status};
use geckolog_protocol::{address, Access, ProtocolError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// A link speaking the opcode protocol of the classic TCPGecko stub.
pub struct ClassicLink<S> {
    stream: S,
    request_timeout: Duration,
    frames: u64,
}

impl ClassicLink<TcpStream> {
    /// Connects to the stub.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, ClientError> {
        let stream = open_stream(config).await?;
        Ok(Self::new(stream, config.request_timeout))
    }
}

impl<S> ClassicLink<S>
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

    /// Number of completed wire frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Performs one request/response exchange, appending the chunk to `out`.
    async fn read_frame(&mut self, request: ReadRequest, out: &mut BytesMut) -> Result<(), ClientError> {
        let encoded = request.encode();
        let length = request.length as usize;
        let stream = &mut self.stream;

        tracing::debug!(
            "Reading {:#x} bytes at {:#010X}",
            request.length,
            request.address
        );

        with_timeout(self.request_timeout, async {
            stream.write_all(&encoded).await?;

            let mut status = [0u8; 1];
            read_exact(stream, &mut status).await?;

            let start = out.len();
            out.resize(start + length, 0);
            match Status::from_byte(status[0]) {
                Status::Data => read_exact(stream, &mut out[start..]).await,
                // Zero filled by the resize above.
                Status::Unmapped => {
                    tracing::debug!("Region at {:#010X} is unmapped", request.address);
                    Ok(())
                }
                Status::Unknown(byte) => Err(ProtocolError::UnexpectedStatus(byte).into()),
            }
        })
        .await?;

        self.frames += 1;
        Ok(())
    }
}

impl<S> MemoryLink for ClassicLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn variant(&self) -> Variant {
        Variant::Classic
    }

    async fn read_bytes(&mut self, address: u32, length: u32) -> Result<Bytes, ClientError> {
        // Validated once for the whole call; chunks inherit the result.
        address::check(address, length, Access::Read)?;

        let mut out = BytesMut::with_capacity(length as usize);
        for request in classic::chunks(address, length) {
            self.read_frame(request, &mut out).await?;
        }

        Ok(out.freeze())
    }

    async fn peek8(&mut self, address: u32) -> Result<u8, ClientError> {
        let bytes = self.read_bytes(slot_address(address, 3, 1)?, 1).await?;
        Ok(bytes[0])
    }

    async fn peek16(&mut self, address: u32) -> Result<u16, ClientError> {
        let bytes = self.read_bytes(slot_address(address, 2, 2)?, 2).await?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    async fn peek32(&mut self, address: u32) -> Result<u32, ClientError> {
        let bytes = self.read_bytes(address, 4).await?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    async fn peek_float(&mut self, address: u32) -> Result<f32, ClientError> {
        Ok(f32::from_bits(self.peek32(address).await?))
    }
}

use async_trait::async_trait;
use russh::{Channel, ChannelStream, client};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::session::SessionHandle;

// Internal Result type alias for convenience
type Result<T> = crate::EngineResult<T>;

/// Trait for sessions that can register remote listeners.
#[async_trait]
pub trait RemoteRegistrar {
    /// Ask the remote peer to listen on `bind_address:bind_port` and relay
    /// accepted connections back over the session. Returns the port the
    /// server actually bound, or 0 when it echoes the request.
    async fn request_tcpip_forward(&mut self, bind_address: String, bind_port: u16) -> Result<u32>;
}

/// Trait for channels carrying one accepted remote connection.
#[async_trait]
pub trait ForwardedChannel: Send {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;
    fn into_stream(self) -> Self::Stream;
    async fn close(self) -> Result<()>;
}

// Trait implementations for russh types

#[async_trait]
impl<H> RemoteRegistrar for SessionHandle<H>
where
    H: client::Handler + Send,
{
    async fn request_tcpip_forward(&mut self, bind_address: String, bind_port: u16) -> Result<u32> {
        let assigned = self.tcpip_forward(bind_address, bind_port.into()).await?;
        Ok(assigned)
    }
}

#[async_trait]
impl ForwardedChannel for Channel<client::Msg> {
    type Stream = ChannelStream<client::Msg>;

    fn into_stream(self) -> Self::Stream {
        Channel::into_stream(self)
    }

    async fn close(self) -> Result<()> {
        Channel::close(&self).await?;
        Ok(())
    }
}

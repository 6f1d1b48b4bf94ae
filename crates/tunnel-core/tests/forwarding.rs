//! Integration tests for reverse tunnel forwarding.
//!
//! These drive the tunnel registry with mock channels the way the SSH
//! handler does, against real loopback listeners, and verify the byte
//! relay end to end.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Result;
use async_trait::async_trait;
use tether_types::TunnelSpec;
use tokio::{
    io::{self, AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tunnel_core::{
    EngineError, EngineResult,
    forwarding::{ForwardedChannel, RemoteRegistrar, TunnelRegistry, relay_streams},
};

struct MockChannel {
    stream: io::DuplexStream,
    closed: Arc<AtomicBool>,
}

impl MockChannel {
    fn new(stream: io::DuplexStream) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                stream,
                closed: closed.clone(),
            },
            closed,
        )
    }
}

#[async_trait]
impl ForwardedChannel for MockChannel {
    type Stream = io::DuplexStream;

    fn into_stream(self) -> Self::Stream {
        self.stream
    }

    async fn close(self) -> EngineResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct MockRegistrar;

#[async_trait]
impl RemoteRegistrar for MockRegistrar {
    async fn request_tcpip_forward(
        &mut self,
        _bind_address: String,
        bind_port: u16,
    ) -> EngineResult<u32> {
        Ok(bind_port as u32)
    }
}

fn spec(local_port: u16, remote_port: u16) -> TunnelSpec {
    TunnelSpec {
        local_ip: "127.0.0.1".to_string(),
        local_port,
        remote_port,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forwarded_connection_echoes_through_local_target() -> Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let local_port = listener.local_addr()?.port();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        stream.write_all(&buf).await.unwrap();
    });

    let registry = TunnelRegistry::new(vec![spec(local_port, 9090)]);
    registry.register_all(&mut MockRegistrar).await?;

    let (mut remote, server_side) = io::duplex(4096);
    let (channel, _closed) = MockChannel::new(server_side);
    let registry_task = registry.clone();
    let forward = tokio::spawn(async move {
        registry_task
            .handle_forwarded_channel(channel, "localhost", 9090, "203.0.113.9:55000")
            .await
    });

    remote.write_all(b"PING").await?;
    let mut buf = [0u8; 4];
    remote.read_exact(&mut buf).await?;
    assert_eq!(&buf, b"PING");

    drop(remote);
    forward.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_local_target_drops_only_that_connection() -> Result<()> {
    // grab a port the OS just released so nothing listens behind it
    let dead_port = {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
        listener.local_addr()?.port()
    };

    let registry = TunnelRegistry::new(vec![spec(dead_port, 9090)]);
    registry.register_all(&mut MockRegistrar).await?;

    let (mut remote, server_side) = io::duplex(4096);
    let (channel, _closed) = MockChannel::new(server_side);
    let err = registry
        .handle_forwarded_channel(channel, "localhost", 9090, "203.0.113.9:55001")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::LocalDial { .. }));

    // the accepted connection is gone; the remote side sees EOF
    let mut buf = [0u8; 1];
    assert_eq!(remote.read(&mut buf).await?, 0);

    // the binding survives and later connections still resolve
    assert!(registry.resolve(9090).await.is_some());
    Ok(())
}

#[tokio::test]
async fn unmatched_port_closes_the_channel() -> Result<()> {
    let registry = TunnelRegistry::new(vec![spec(8080, 9090)]);
    registry.register_all(&mut MockRegistrar).await?;

    let (_remote, server_side) = io::duplex(4096);
    let (channel, closed) = MockChannel::new(server_side);
    registry
        .handle_forwarded_channel(channel, "localhost", 7777, "203.0.113.9:55002")
        .await?;

    assert!(closed.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn relay_moves_bytes_in_both_directions() -> Result<()> {
    let (mut near_a, far_a) = io::duplex(4096);
    let (mut near_b, far_b) = io::duplex(4096);
    let relay = tokio::spawn(relay_streams(far_a, far_b));

    near_a.write_all(b"hello").await?;
    let mut buf = [0u8; 5];
    near_b.read_exact(&mut buf).await?;
    assert_eq!(&buf, b"hello");

    near_b.write_all(b"world").await?;
    near_a.read_exact(&mut buf).await?;
    assert_eq!(&buf, b"world");

    // closing one side tears the whole pair down
    drop(near_a);
    let mut one = [0u8; 1];
    assert_eq!(near_b.read(&mut one).await?, 0);
    drop(near_b);
    relay.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn relay_preserves_ordering_under_load() -> Result<()> {
    let (mut near_a, far_a) = io::duplex(1024);
    let (mut near_b, far_b) = io::duplex(1024);
    let relay = tokio::spawn(relay_streams(far_a, far_b));

    let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();
    let writer = tokio::spawn(async move {
        near_a.write_all(&payload).await.unwrap();
        near_a.shutdown().await.unwrap();
        near_a
    });

    let mut received = Vec::with_capacity(expected.len());
    near_b.read_to_end(&mut received).await?;
    assert_eq!(received, expected);

    drop(writer.await?);
    drop(near_b);
    relay.await??;
    Ok(())
}

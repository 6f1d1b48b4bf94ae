use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, copy_bidirectional};

type Result<T> = crate::EngineResult<T>;

/// Relay bytes between two streams until either direction ends, then shut
/// both ends down. One forwarding pair lives exactly as long as this call;
/// half-duplex lingering is not supported.
pub async fn relay_streams<R, L>(mut remote_stream: R, mut local_stream: L) -> Result<()>
where
    R: AsyncRead + AsyncWrite + Unpin,
    L: AsyncRead + AsyncWrite + Unpin,
{
    let copy_result = copy_bidirectional(&mut local_stream, &mut remote_stream).await;
    let _ = remote_stream.shutdown().await;
    let _ = local_stream.shutdown().await;
    match copy_result {
        Ok(_) => {}
        Err(err)
            if err.kind() == std::io::ErrorKind::BrokenPipe
                || err.kind() == std::io::ErrorKind::NotConnected
                || err.kind() == std::io::ErrorKind::ConnectionReset =>
        {
            // Treat common half-close races as graceful termination.
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

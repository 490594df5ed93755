//! TCP echo service.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::net::{ConnectionPermit, ListenerError};
use crate::registry::ServiceDescriptor;
use crate::service::{ServiceContext, ServiceError, ServiceOption};

pub const NAME: &str = "echo";

/// Listen address used unless `[services.echo] listen` says otherwise.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:7007";

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(NAME, run)
        .with_registration_option(ServiceOption::Listen(DEFAULT_LISTEN.to_string()))
}

/// Echo every connection back to its peer until shutdown.
pub async fn run(mut ctx: ServiceContext) -> Result<(), ServiceError> {
    let listener = ctx
        .take_listener()
        .ok_or_else(|| ServiceError::failed("echo needs a listen address"))?;

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer, permit)) => {
                        tracing::debug!(peer_addr = %peer, "Echo connection opened");
                        tokio::spawn(echo(stream, permit));
                    }
                    Err(ListenerError::Closed) => {
                        return Err(ServiceError::failed("echo listener closed"));
                    }
                    Err(e) => accept_failed(&e).await,
                }
            }
            _ = ctx.shutdown_signal() => {
                tracing::info!("Echo stopping");
                return Ok(());
            }
        }
    }
}

async fn accept_failed(error: &ListenerError) {
    tracing::warn!(error = %error, backoff_ms = ACCEPT_BACKOFF.as_millis() as u64, "Echo accept failed");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

async fn echo(mut stream: TcpStream, _permit: ConnectionPermit) {
    let (mut reader, mut writer) = stream.split();
    match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(bytes) => tracing::debug!(bytes, "Echo connection closed"),
        Err(e) => tracing::debug!(error = %e, "Echo connection reset"),
    }
    let _ = writer.shutdown().await;
}

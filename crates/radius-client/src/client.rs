//! UDP RADIUS client
//!
//! [`RadiusClient::communicate`] runs one request/response exchange:
//!
//! 1. Encode the request and serialize it with the [`PacketCodec`]
//! 2. Register the exchange under `(server address, identifier)`
//! 3. Send, arming a retry timer after every send
//! 4. A background task routes each received datagram to its exchange,
//!    verifies it against the original request and settles the exchange
//!
//! Responses for unknown or already settled exchanges are dropped.
//!
//! A send checks the completion handle before writing to the socket, but a
//! response can settle the exchange between that check and the write. In
//! that case one extra datagram reaches the server after settlement; the
//! outcome is unaffected, and the retry timer armed after that write finds
//! the exchange settled and sends nothing.

use crate::completion::CompletionHandle;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::identifier::{IdentifierAllocator, SequentialIdentifiers};
use crate::retry::RetryScheduler;
use crate::timer::TimerService;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use radius_proto::{Datagram, Packet, PacketCodec, RadiusPacket};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// A RADIUS server and the secret shared with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: SocketAddr,
    pub secret: Vec<u8>,
}

impl Endpoint {
    pub fn new(address: SocketAddr, secret: impl Into<Vec<u8>>) -> Self {
        Endpoint {
            address,
            secret: secret.into(),
        }
    }
}

type ExchangeKey = (SocketAddr, u8);

/// State of one in-flight exchange shared with the receive task
struct PendingExchange {
    request: RadiusPacket,
    secret: Vec<u8>,
    handle: CompletionHandle<RadiusPacket>,
}

/// Send side of an exchange, re-run by the retry timer
struct Transmission {
    socket: Arc<UdpSocket>,
    scheduler: Arc<RetryScheduler>,
    datagram: Datagram,
    identifier: u8,
    handle: CompletionHandle<RadiusPacket>,
}

impl Transmission {
    fn send(self: Arc<Self>, attempt: u32) {
        // Best effort: settlement may still land before the write below
        if self.handle.is_settled() {
            return;
        }

        match self
            .socket
            .try_send_to(&self.datagram.payload, self.datagram.remote)
        {
            Ok(_) => {
                debug!(
                    identifier = self.identifier,
                    remote = %self.datagram.remote,
                    attempt,
                    "Request sent"
                );
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                warn!(
                    identifier = self.identifier,
                    remote = %self.datagram.remote,
                    attempt,
                    "Socket busy, waiting for retry"
                );
            }
            Err(e) => {
                warn!(
                    identifier = self.identifier,
                    remote = %self.datagram.remote,
                    error = %e,
                    "Send failed"
                );
                self.handle.try_fail(ClientError::Io(e));
                return;
            }
        }

        let next = Arc::clone(&self);
        self.scheduler
            .schedule_retry(move || next.send(attempt + 1), attempt, self.handle.clone());
    }
}

/// Removes the exchange and aborts it if the caller stops waiting
struct ExchangeGuard<'a> {
    pending: &'a DashMap<ExchangeKey, Arc<PendingExchange>>,
    key: ExchangeKey,
    handle: CompletionHandle<RadiusPacket>,
}

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        self.handle.cancel();
        self.pending.remove(&self.key);
    }
}

/// Asynchronous RADIUS client over a single UDP socket
pub struct RadiusClient {
    socket: Arc<UdpSocket>,
    codec: PacketCodec,
    scheduler: Arc<RetryScheduler>,
    identifiers: Arc<dyn IdentifierAllocator>,
    pending: Arc<DashMap<ExchangeKey, Arc<PendingExchange>>>,
    receiver: JoinHandle<()>,
}

impl RadiusClient {
    /// Bind the client socket and start routing responses.
    pub async fn bind(bind_addr: SocketAddr, scheduler: RetryScheduler) -> ClientResult<Self> {
        let socket = Arc::new(UdpSocket::bind(bind_addr).await?);
        info!(bind_addr = %socket.local_addr()?, "Client socket bound");

        let codec = PacketCodec::default();
        let pending: Arc<DashMap<ExchangeKey, Arc<PendingExchange>>> = Arc::new(DashMap::new());

        let receiver = tokio::spawn(receive_loop(
            Arc::clone(&socket),
            codec.clone(),
            Arc::clone(&pending),
        ));

        Ok(RadiusClient {
            socket,
            codec,
            scheduler: Arc::new(scheduler),
            identifiers: Arc::new(SequentialIdentifiers::new()),
            pending,
            receiver,
        })
    }

    /// Bind according to `config`, with a fresh timer service.
    pub async fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let scheduler = RetryScheduler::new(Arc::new(TimerService::spawn()), &config.retry);
        Self::bind(config.bind_addr()?, scheduler).await
    }

    /// Replace the identifier allocator.
    pub fn with_identifiers(mut self, identifiers: Arc<dyn IdentifierAllocator>) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn codec(&self) -> &PacketCodec {
        &self.codec
    }

    pub fn local_addr(&self) -> ClientResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Next identifier from this client's allocator
    pub fn next_identifier(&self) -> u8 {
        self.identifiers.next_identifier()
    }

    /// Number of exchanges awaiting a response
    pub fn pending_exchanges(&self) -> usize {
        self.pending.len()
    }

    /// Send `packet` to `endpoint` and wait for the verified response.
    ///
    /// The packet is encoded here; the caller's copy is not modified.
    /// Dropping the returned future aborts the exchange.
    pub async fn communicate(
        &self,
        packet: &RadiusPacket,
        endpoint: &Endpoint,
    ) -> ClientResult<RadiusPacket> {
        let request = packet.encode_request(&endpoint.secret)?;
        let datagram = self.codec.to_datagram(&request, endpoint.address)?;
        let identifier = request.identifier();
        let key = (endpoint.address, identifier);

        let (handle, completion) = CompletionHandle::new();
        match self.pending.entry(key) {
            Entry::Occupied(_) => return Err(ClientError::IdentifierInUse(identifier)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(PendingExchange {
                    request,
                    secret: endpoint.secret.clone(),
                    handle: handle.clone(),
                }));
            }
        }
        let _guard = ExchangeGuard {
            pending: &self.pending,
            key,
            handle: handle.clone(),
        };

        let transmission = Arc::new(Transmission {
            socket: Arc::clone(&self.socket),
            scheduler: Arc::clone(&self.scheduler),
            datagram,
            identifier,
            handle,
        });
        transmission.send(1);

        let result = completion.await;
        match &result {
            Ok(response) => debug!(
                identifier,
                remote = %endpoint.address,
                code = %response.code(),
                "Exchange completed"
            ),
            Err(e) => debug!(
                identifier,
                remote = %endpoint.address,
                error = %e,
                "Exchange failed"
            ),
        }
        result
    }
}

impl Drop for RadiusClient {
    fn drop(&mut self) {
        self.receiver.abort();
    }
}

impl std::fmt::Debug for RadiusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadiusClient")
            .field("local_addr", &self.socket.local_addr().ok())
            .field("scheduler", &self.scheduler)
            .field("pending", &self.pending.len())
            .finish()
    }
}

async fn receive_loop(
    socket: Arc<UdpSocket>,
    codec: PacketCodec,
    pending: Arc<DashMap<ExchangeKey, Arc<PendingExchange>>>,
) {
    // One octet of headroom so oversized datagrams are detected, not truncated
    let mut buf = vec![0u8; Packet::MAX_PACKET_SIZE + 1];

    loop {
        let (len, remote) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "Receive failed");
                continue;
            }
        };

        if len < Packet::HEADER_LENGTH {
            debug!(remote = %remote, len, "Short datagram dropped");
            continue;
        }

        let identifier = buf[1];
        let Some(exchange) = pending
            .get(&(remote, identifier))
            .map(|entry| Arc::clone(entry.value()))
        else {
            debug!(remote = %remote, identifier, "Unmatched response dropped");
            continue;
        };

        if exchange.handle.is_settled() {
            trace!(remote = %remote, identifier, "Late response dropped");
            continue;
        }

        let datagram = Datagram::new(remote, buf[..len].to_vec());
        match codec.decode_response(&datagram, &exchange.secret, &exchange.request) {
            Ok(response) => {
                if !exchange.handle.try_succeed(response) {
                    trace!(remote = %remote, identifier, "Duplicate response dropped");
                }
            }
            Err(e) => {
                warn!(
                    remote = %remote,
                    identifier,
                    error = %e,
                    "Response rejected"
                );
                exchange.handle.try_fail(ClientError::Packet(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use std::time::Duration;

    async fn transmission_to(
        peer: SocketAddr,
    ) -> (Arc<Transmission>, CompletionHandle<RadiusPacket>) {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let retry = RetryConfig {
            max_attempts: 3,
            retry_wait_ms: 20,
        };
        let scheduler = RetryScheduler::new(Arc::new(TimerService::spawn()), &retry);
        let (handle, _completion) = CompletionHandle::new();
        let transmission = Arc::new(Transmission {
            socket,
            scheduler: Arc::new(scheduler),
            datagram: Datagram::new(peer, vec![1, 7, 0, 20]),
            identifier: 7,
            handle: handle.clone(),
        });
        (transmission, handle)
    }

    #[tokio::test]
    async fn test_settled_exchange_sends_nothing() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let (transmission, handle) = transmission_to(peer.local_addr().unwrap()).await;

        assert!(handle.cancel());
        transmission.send(1);

        let mut buf = [0u8; 64];
        let received =
            tokio::time::timeout(Duration::from_millis(100), peer.recv_from(&mut buf)).await;
        assert!(received.is_err());
    }

    #[tokio::test]
    async fn test_settling_after_send_stops_retries() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let (transmission, handle) = transmission_to(peer.local_addr().unwrap()).await;

        transmission.send(1);
        let mut buf = [0u8; 64];
        peer.recv_from(&mut buf).await.unwrap();

        // Settled after the write: the armed retry must not send again
        assert!(handle.cancel());
        let received =
            tokio::time::timeout(Duration::from_millis(100), peer.recv_from(&mut buf)).await;
        assert!(received.is_err());
    }
}

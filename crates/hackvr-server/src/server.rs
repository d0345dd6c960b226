//! Multi-binding accept/poll server loop.
//!
//! A [`Server`] owns a set of [`Binding`]s (one listener per resolved
//! address per protocol) and the live connections accepted through
//! them. Scheduling is cooperative and single-threaded: each loop
//! iteration makes one non-blocking accept attempt per binding, one
//! non-blocking poll per connection, then sleeps briefly. Handshakes run
//! synchronously inside the accept attempt under their own short
//! deadline.

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use hackvr_net::{Binding, ConnectionToken, Deadline, Protocol, TlsServerCertificate};

use crate::{
    connection::{Connection, SessionHandler},
    error::ServerError,
};

/// Pause between loop iterations.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Application hook deciding what to do with accepted clients.
pub trait ServerHandler {
    /// Per-connection session state.
    type Session: SessionHandler;

    /// A handshake completed; build the session for this client.
    fn accept_client(&mut self, token: &ConnectionToken, peer_addr: SocketAddr)
    -> Self::Session;

    /// A connection went away; the session is handed back.
    fn handle_disconnect(&mut self, _session: Self::Session) {
        tracing::debug!("connection disconnected");
    }
}

/// Flag for stopping a running server from outside the loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the server loop to exit at its next iteration.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Accept/poll server over any set of protocol bindings.
pub struct Server<H: ServerHandler> {
    handler: H,
    bindings: Vec<Binding>,
    connections: Vec<Connection<H::Session>>,
    stop: StopHandle,
}

impl<H: ServerHandler> Server<H> {
    /// A server with no bindings yet.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self { handler, bindings: Vec::new(), connections: Vec::new(), stop: StopHandle::default() }
    }

    /// Listen for `protocol` on `hostname`.
    ///
    /// `*` binds both `0.0.0.0` and `::`; any other hostname is resolved
    /// and every distinct address gets its own listener. `port` defaults
    /// per protocol. TLS protocols require `certificate`, plain ones
    /// reject it. If any listener fails, those already created for this
    /// call are closed again and the error propagates.
    pub fn add_binding(
        &mut self,
        protocol: Protocol,
        hostname: &str,
        port: Option<u16>,
        certificate: Option<&TlsServerCertificate>,
    ) -> Result<(), ServerError> {
        let port = port.unwrap_or_else(|| protocol.default_port());
        if protocol.is_secure() && certificate.is_none() {
            return Err(ServerError::Config("TLS bindings require a certificate".to_string()));
        }
        if !protocol.is_secure() && certificate.is_some() {
            return Err(ServerError::Config(
                "non-TLS bindings do not use certificates".to_string(),
            ));
        }

        let addresses = resolve_addresses(hostname, port)?;
        let mut created = Vec::with_capacity(addresses.len());
        for address in addresses {
            match Binding::bind(protocol, &address.to_string(), port, certificate) {
                Ok(binding) => created.push(binding),
                Err(error) => {
                    for mut binding in created {
                        binding.close();
                    }
                    return Err(error.into());
                }
            }
        }
        for binding in &created {
            if let Ok(addr) = binding.local_addr() {
                tracing::info!(%protocol, %addr, "listening");
            }
        }
        self.bindings.extend(created);
        Ok(())
    }

    /// Local addresses of all bindings, in creation order.
    #[must_use]
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.bindings.iter().filter_map(|binding| binding.local_addr().ok()).collect()
    }

    /// Handle for stopping the loop from another thread or a session.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The application handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Currently live connections.
    pub fn connections_mut(&mut self) -> &mut [Connection<H::Session>] {
        &mut self.connections
    }

    /// Run until [`StopHandle::stop`] is called.
    pub fn serve_forever(&mut self) {
        while !self.stop.is_stopped() {
            self.poll_once();
            std::thread::sleep(POLL_INTERVAL);
        }
        self.shutdown();
    }

    /// One loop iteration: accept pass then poll pass.
    pub fn poll_once(&mut self) {
        self.accept_pass();
        self.poll_pass();
    }

    fn accept_pass(&mut self) {
        for binding in &mut self.bindings {
            match binding.accept(Deadline::INSTANT) {
                Ok(None) => {}
                Ok(Some((stream, peer_addr, token))) => {
                    let session = self.handler.accept_client(&token, peer_addr);
                    self.connections.push(Connection::new(stream, peer_addr, token, session));
                }
                // A failed handshake only kills that connection; keep
                // accepting.
                Err(error) => {
                    tracing::warn!(protocol = %binding.protocol(), %error, "handshake failed");
                }
            }
        }
    }

    fn poll_pass(&mut self) {
        let mut index = 0;
        while index < self.connections.len() {
            self.connections[index].poll();
            if self.connections[index].is_connected() {
                index += 1;
            } else {
                let connection = self.connections.remove(index);
                self.handler.handle_disconnect(connection.into_session());
            }
        }
    }

    /// Close all bindings and connections.
    pub fn shutdown(&mut self) {
        for binding in &mut self.bindings {
            binding.close();
        }
        for connection in &mut self.connections {
            connection.close();
        }
        while let Some(connection) = self.connections.pop() {
            self.handler.handle_disconnect(connection.into_session());
        }
    }
}

/// Resolve a binding hostname to its listen addresses.
///
/// `*` means both unspecified addresses; anything else goes through name
/// resolution, deduplicated and sorted for a stable binding order.
fn resolve_addresses(hostname: &str, port: u16) -> Result<Vec<IpAddr>, ServerError> {
    if hostname == "*" {
        return Ok(vec![IpAddr::V4(Ipv4Addr::UNSPECIFIED), IpAddr::V6(Ipv6Addr::UNSPECIFIED)]);
    }
    let mut addresses: Vec<IpAddr> = (hostname, port)
        .to_socket_addrs()
        .map_err(|error| ServerError::Config(format!("cannot resolve {hostname}: {error}")))?
        .map(|addr| addr.ip())
        .collect();
    addresses.sort_unstable();
    addresses.dedup();
    if addresses.is_empty() {
        return Err(ServerError::Config(format!("no addresses resolved for host {hostname}")));
    }
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_resolves_to_both_families() {
        let addresses = resolve_addresses("*", 1913).unwrap();
        assert_eq!(
            addresses,
            vec![IpAddr::V4(Ipv4Addr::UNSPECIFIED), IpAddr::V6(Ipv6Addr::UNSPECIFIED)]
        );
    }

    #[test]
    fn literal_addresses_resolve_to_themselves() {
        let addresses = resolve_addresses("127.0.0.1", 1913).unwrap();
        assert_eq!(addresses, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
    }

    #[test]
    fn unresolvable_hostnames_fail() {
        assert!(resolve_addresses("definitely-not-a-real-host.invalid", 1913).is_err());
    }
}

//! The session registry: every connected client, in join order.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is not thread-safe and does not need to be. It is
//! owned by the tick loop, which is the only task that touches client
//! roles or iterates the roster. The pump tasks reach it only through the
//! per-connection queues.

use stagehand_protocol::{ClientId, Frame, Recipient, Role};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{Client, Connection, SessionError};

/// Ordered collection of clients with sequential, never-reused ids.
///
/// ## Lifecycle
///
/// ```text
/// accept() ──→ [connected] ──(peer closes / I/O error)──→ [disconnected]
///                                                              │
///                                           remove_disconnected()
/// ```
///
/// A disconnected client stays registered (and is skipped by every send)
/// until the owner calls [`remove_disconnected`](Self::remove_disconnected).
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Clients in insertion order. Iteration order is the cross-connection
    /// processing order of the tick loop.
    clients: Vec<Client>,

    /// Next id to hand out. Only ever grows.
    next_id: usize,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raw stream as a new client and starts its pump.
    ///
    /// The client gets the next sequential id and [`Role::Unassigned`].
    ///
    /// # Errors
    /// [`SessionError::IdsExhausted`] once all one-byte ids are used.
    pub fn accept<S>(&mut self, stream: S) -> Result<ClientId, SessionError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        if self.next_id >= ClientId::MAX_CLIENTS {
            return Err(SessionError::IdsExhausted);
        }
        // Bounded by MAX_CLIENTS above.
        let id = ClientId(self.next_id as u8);
        self.next_id += 1;

        let connection = Connection::spawn(id, stream);
        self.clients.push(Client::new(id, connection));

        tracing::info!(%id, clients = self.clients.len(), "client registered");
        Ok(id)
    }

    /// Number of registered clients, connected or not.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id() == id)
    }

    /// Clients in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter()
    }

    /// Ids in join order.
    pub fn ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(Client::id).collect()
    }

    /// `(id, role)` for every client in join order.
    pub fn roster(&self) -> Vec<(ClientId, Role)> {
        self.clients.iter().map(|c| (c.id(), c.role())).collect()
    }

    pub fn role(&self, id: ClientId) -> Option<Role> {
        self.get(id).map(Client::role)
    }

    /// Sets a client's role and returns the one it replaced.
    pub fn set_role(&mut self, id: ClientId, role: Role) -> Result<Role, SessionError> {
        self.get_mut(id)
            .map(|c| c.set_role(role))
            .ok_or(SessionError::UnknownClient(id))
    }

    /// How many registered clients currently hold `role`.
    pub fn count_role(&self, role: Role) -> usize {
        self.clients.iter().filter(|c| c.role() == role).count()
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Queues `frame` for every live client not in `exclude`.
    ///
    /// Disconnected clients are skipped silently. Returns how many clients
    /// the frame was queued for.
    pub fn broadcast(&self, frame: &Frame, exclude: &[ClientId]) -> usize {
        self.clients
            .iter()
            .filter(|c| !exclude.contains(&c.id()))
            .filter(|c| c.send(frame.clone()))
            .count()
    }

    /// Queues `frame` for whoever `recipient` names.
    pub fn deliver(&self, recipient: Recipient, frame: &Frame) -> usize {
        match recipient {
            Recipient::All => self.broadcast(frame, &[]),
            Recipient::AllExcept(excluded) => self.broadcast(frame, &[excluded]),
            Recipient::Client(id) => match self.get(id) {
                Some(client) => usize::from(client.send(frame.clone())),
                None => {
                    tracing::debug!(%id, "frame for unknown client dropped");
                    0
                }
            },
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Drains every client's inbound queue without waiting.
    ///
    /// Frames keep their per-connection arrival order; connections are
    /// visited in join order.
    pub fn drain_inbound(&mut self) -> Vec<(ClientId, Frame)> {
        let mut frames = Vec::new();
        for client in &mut self.clients {
            let id = client.id();
            frames.extend(client.connection_mut().drain().into_iter().map(|f| (id, f)));
        }
        frames
    }

    // -----------------------------------------------------------------------
    // Cleanup
    // -----------------------------------------------------------------------

    /// Removes and returns every client whose connection has dropped.
    pub fn remove_disconnected(&mut self) -> Vec<Client> {
        let (gone, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.clients)
            .into_iter()
            .partition(|c| !c.is_connected());
        self.clients = live;
        for client in &gone {
            tracing::info!(id = %client.id(), role = %client.role(), "client removed");
        }
        gone
    }
}

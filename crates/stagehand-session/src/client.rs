//! A registered client: stable id, exclusively owned connection, role.

use stagehand_protocol::{ClientId, Frame, Role};

use crate::Connection;

/// One connected player as the tick loop sees it.
///
/// Owned by the [`SessionRegistry`](crate::SessionRegistry) and never shared
/// outside the tick loop's task.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    connection: Connection,
    role: Role,
}

impl Client {
    pub(crate) fn new(id: ClientId, connection: Connection) -> Self {
        Self {
            id,
            connection,
            role: Role::Unassigned,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Replaces the role, returning the previous one.
    pub fn set_role(&mut self, role: Role) -> Role {
        std::mem::replace(&mut self.role, role)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Queues a frame for this client. Returns `false` if it was dropped.
    pub fn send(&self, frame: Frame) -> bool {
        self.connection.send(frame)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }
}

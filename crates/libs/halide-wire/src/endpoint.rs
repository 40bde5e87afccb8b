use std::fmt;

/// Read-only context for the peer session a message is written to.
///
/// The connection itself (socket, reconnect policy, close authority) is
/// owned by the endpoint layer above this crate; writers borrow an
/// `EndpointRef` per call for diagnostics and header stamping and must not
/// extend its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRef {
    endpoint_id: u64,
    remote_addr: String,
    local_client_id: u64,
}

impl EndpointRef {
    pub fn new(endpoint_id: u64, remote_addr: impl Into<String>, local_client_id: u64) -> Self {
        Self {
            endpoint_id,
            remote_addr: remote_addr.into(),
            local_client_id,
        }
    }

    pub fn endpoint_id(&self) -> u64 {
        self.endpoint_id
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// Id under which this node is known to the remote peer. Writers stamp
    /// it into every outbound header as the sender id.
    pub fn local_client_id(&self) -> u64 {
        self.local_client_id
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint {} ({})", self.endpoint_id, self.remote_addr)
    }
}

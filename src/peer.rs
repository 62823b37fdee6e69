use std::fmt;
use std::net::SocketAddr;

use crate::id::NodeId;

/// Node id + its socket address.
///
/// `Eq`/`Hash` cover both fields, so search bookkeeping treats two
/// contacts with the same id but different addresses as distinct peers.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Peer {
  pub id: NodeId,
  pub addr: SocketAddr,
}

impl Peer {
  pub fn new(id: NodeId, addr: SocketAddr) -> Self {
    Self { id, addr }
  }
}

impl fmt::Debug for Peer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}@{:?}", self.id, self.addr)
  }
}

//! Routing collaborator seam.
//!
//! Bucket maintenance, liveness tracking and refresh schedules live in
//! the surrounding daemon; lookups only ever ask two things of a routing
//! table, captured by the [`Routing`] trait. [`ContactTable`] is the
//! smallest useful implementation: a flat contact set, good for seeding
//! lookups and for driving the engine in tests.

use std::collections::HashSet;

use crate::{id::NodeId, metric, peer::Peer};

/// What a lookup consumes from the routing table.
pub trait Routing {
  /// Id of the local node.
  fn node_id(&self) -> NodeId;

  /// Up to `k` known peers, ascending by XOR distance to `target`.
  fn closest_to(&self, target: NodeId, k: usize) -> Vec<Peer>;
}

/// Flat, unmaintained contact table.
pub struct ContactTable {
  node_id: NodeId,
  contacts: HashSet<Peer>,
}

impl ContactTable {
  /// Create an empty table with the given node id as our id.
  pub fn new(node_id: NodeId) -> Self {
    Self {
      node_id,
      contacts: HashSet::new(),
    }
  }

  /// Record a contact. Re-inserting an existing contact is a no-op.
  pub fn insert(&mut self, peer: Peer) {
    self.contacts.insert(peer);
  }

  pub fn len(&self) -> usize {
    self.contacts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.contacts.is_empty()
  }
}

impl Routing for ContactTable {
  fn node_id(&self) -> NodeId {
    self.node_id
  }

  fn closest_to(&self, target: NodeId, k: usize) -> Vec<Peer> {
    let contacts: Vec<Peer> = self.contacts.iter().copied().collect();
    metric::neighborhood(target, &contacts, k)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::id::{Id, ID_LEN};
  use pretty_assertions::assert_eq;

  fn peer(byte: u8) -> Peer {
    Peer::new(
      Id::from([byte; ID_LEN]),
      ([10, 0, 0, byte], 6881).into(),
    )
  }

  #[test]
  fn closest_to_orders_by_distance() {
    let mut table = ContactTable::new(rand::random());
    for byte in [9, 2, 5, 7] {
      table.insert(peer(byte));
    }
    // duplicate insert is a no-op
    table.insert(peer(5));
    assert_eq!(table.len(), 4);

    let closest = table.closest_to(Id::from([0; ID_LEN]), 2);
    assert_eq!(closest, vec![peer(2), peer(5)]);
  }
}

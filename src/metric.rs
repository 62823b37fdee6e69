//! XOR metric over the 256-bit id space.
//!
//! Kademlia orders peers by `d(a, b) = a xor b` interpreted as an
//! unsigned integer. The search engine only ever compares distances and
//! asks for the `k` peers closest to a target, so that is the whole
//! surface of this module.

use crate::{id::NodeId, peer::Peer};

/// XOR distance between two ids.
pub fn distance(a: NodeId, b: NodeId) -> NodeId {
  a ^ b
}

/// Up to `k` peers closest to `target`, ascending by XOR distance.
///
/// The sort is stable, so peers at equal distance keep their input order.
pub fn neighborhood(target: NodeId, peers: &[Peer], k: usize) -> Vec<Peer> {
  let mut peers = peers.to_vec();
  peers.sort_by_key(|peer| distance(target, peer.id));
  peers.truncate(k);
  peers
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::id::{Id, ID_LEN};
  use pretty_assertions::assert_eq;

  fn id(byte: u8) -> Id {
    Id::from([byte; ID_LEN])
  }

  // Big-endian 256-bit addition; `None` on overflow.
  fn checked_add(a: Id, b: Id) -> Option<[u8; ID_LEN]> {
    let (a, b): ([u8; ID_LEN], [u8; ID_LEN]) = (a.into(), b.into());
    let mut sum = [0u8; ID_LEN];
    let mut carry = 0u16;

    for i in (0..ID_LEN).rev() {
      let total = a[i] as u16 + b[i] as u16 + carry;
      sum[i] = total as u8;
      carry = total >> 8;
    }

    (carry == 0).then_some(sum)
  }

  #[test]
  fn distance_is_reflexive() {
    for _ in 0..64 {
      let x: Id = rand::random();
      assert_eq!(distance(x, x), id(0));
    }
  }

  #[test]
  fn distance_is_symmetric() {
    for _ in 0..64 {
      let (x, y): (Id, Id) = (rand::random(), rand::random());
      assert_eq!(distance(x, y), distance(y, x));
    }
  }

  #[test]
  fn distance_satisfies_triangle_inequality() {
    for _ in 0..64 {
      let (x, y, z): (Id, Id, Id) =
        (rand::random(), rand::random(), rand::random());

      // d(x, z) <= d(x, y) + d(y, z); an overflowing sum exceeds any id.
      if let Some(sum) = checked_add(distance(x, y), distance(y, z)) {
        assert!(distance(x, z) <= Id::from(sum));
      }
    }
  }

  #[test]
  fn neighborhood_returns_closest_first() {
    let target = id(0);
    let peers: Vec<Peer> = [3u8, 1, 7, 2]
      .into_iter()
      .map(|b| Peer::new(id(b), ([127, 0, 0, b], 1000 + b as u16).into()))
      .collect();

    let closest = neighborhood(target, &peers, 2);

    assert_eq!(closest.len(), 2);
    assert_eq!(closest[0].id, id(1));
    assert_eq!(closest[1].id, id(2));
  }

  #[test]
  fn neighborhood_caps_at_width() {
    let peers: Vec<Peer> = (0..10)
      .map(|b| Peer::new(id(b), ([10, 0, 0, b], 6881).into()))
      .collect();

    assert_eq!(neighborhood(id(0), &peers, 4).len(), 4);
    assert_eq!(neighborhood(id(0), &peers, 32).len(), 10);
    assert!(neighborhood(id(0), &[], 32).is_empty());
  }
}

//! Iterative parallel lookup over the XOR metric.
//!
//! A lookup starts from the closest seeds the routing table knows,
//! queries up to [`SEARCH_WIDTH`] peers concurrently per round, and
//! steers each following round toward whatever unqueried peers the
//! replies referenced. Progress is measured by XOR distance: as long as
//! the next work queue holds a peer strictly closer to the target than
//! anything that has answered so far, the retry budget stays full;
//! otherwise it burns down, and the lookup stops when it hits zero.
//!
//! Bookkeeping invariants the driver maintains between rounds:
//!
//! - every queried peer lands in `done`, responders also in `alive`;
//! - no peer is queried twice within one lookup;
//! - the accumulator only grows, and stays empty for find-node lookups.
//!
//! Workers cannot fail: the transport hands back every outcome as an
//! [`RpcReply`] value, and a peer that timed out or answered with an
//! error simply contributes nothing.

use std::collections::HashSet;
use std::net::SocketAddr;

use futures_util::future;

use crate::{
  id::NodeId,
  message::{Response, Token},
  metric,
  peer::Peer,
  routing::Routing,
  transport::{RpcReply, Transport},
};

/// Search width: peak concurrent RPCs per round, and the size cap of
/// every work queue.
pub const SEARCH_WIDTH: usize = 32;

/// Rounds a lookup survives without getting closer to the target.
const RETRY_BUDGET: u8 = 3;

/// Which find RPC a lookup issues.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LookupKind {
  Node,
  Value,
}

/// Outcome of [`Search::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupResult {
  /// Peers found alive, closest to the target first.
  Nodes(Vec<Peer>),
  Values(ValueLookup),
}

/// Outcome of a find-value lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueLookup {
  /// Every alive peer that issued a token, paired with that token.
  /// These are the candidates for a follow-up `Store`.
  pub store: Vec<(Peer, Token)>,
  /// Deduplicated union of all returned endpoints, first seen first.
  pub found: Vec<SocketAddr>,
  /// Peers that answered during the lookup.
  pub alive: HashSet<Peer>,
}

/// Per-lookup state, private to the driver and discarded on return.
#[derive(Default)]
struct LookupState {
  /// Peers queried so far, responsive or not.
  done: HashSet<Peer>,
  /// Peers that answered.
  alive: HashSet<Peer>,
  /// `(peer, token, endpoints)` rows from value-bearing replies.
  acc: Vec<(Peer, Token, Vec<SocketAddr>)>,
}

/// Lookup driver over a routing table and a transport.
pub struct Search<R, T> {
  routing: R,
  transport: T,
}

impl<R: Routing, T: Transport> Search<R, T> {
  pub fn new(routing: R, transport: T) -> Self {
    Self { routing, transport }
  }

  pub fn routing(&self) -> &R {
    &self.routing
  }

  /// Run a lookup of the given kind.
  pub async fn run(&self, kind: LookupKind, target: NodeId) -> LookupResult {
    match kind {
      LookupKind::Node => LookupResult::Nodes(self.find_node(target).await),
      LookupKind::Value => {
        LookupResult::Values(self.find_value(target).await)
      }
    }
  }

  /// Find the peers closest to `target`, sorted ascending by distance.
  pub async fn find_node(&self, target: NodeId) -> Vec<Peer> {
    let state = self.drive(LookupKind::Node, target).await;

    let mut alive: Vec<Peer> = state.alive.into_iter().collect();
    alive.sort_by_key(|peer| metric::distance(target, peer.id));
    alive
  }

  /// Find endpoints stored under `target`, together with the peers a
  /// follow-up `Store` could be sent to.
  pub async fn find_value(&self, target: NodeId) -> ValueLookup {
    let state = self.drive(LookupKind::Value, target).await;

    let mut store = Vec::with_capacity(state.acc.len());
    let mut found = Vec::new();
    let mut seen = HashSet::new();

    for (peer, token, values) in state.acc {
      store.push((peer, token));
      for value in values {
        if seen.insert(value) {
          found.push(value);
        }
      }
    }

    ValueLookup {
      store,
      found,
      alive: state.alive,
    }
  }

  async fn drive(&self, kind: LookupKind, target: NodeId) -> LookupState {
    let mut state = LookupState::default();
    let mut retries = RETRY_BUDGET;
    let mut todo = self.routing.closest_to(target, SEARCH_WIDTH);

    log::debug!(
      "starting {:?} lookup for {:x} with {} seed peers (local id {:x})",
      kind,
      target,
      todo.len(),
      self.routing.node_id(),
    );

    let mut round = 0u32;
    loop {
      round += 1;

      // One future per work-queue peer; the whole round is a single
      // barrier and all state merging happens after it.
      let replies = future::join_all(todo.iter().map(|peer| {
        let peer = *peer;
        async move {
          let reply = match kind {
            LookupKind::Node => {
              self.transport.find_node(peer.addr, target).await
            }
            LookupKind::Value => {
              self.transport.find_value(peer.addr, target).await
            }
          };
          (peer, reply)
        }
      }))
      .await;

      let mut discovered = Vec::new();
      for (peer, reply) in replies {
        state.done.insert(peer);

        let response = match reply {
          RpcReply::Response(response) => response,
          RpcReply::Timeout => {
            log::trace!("{:?} timed out", peer);
            continue;
          }
          RpcReply::Error { code, .. } => {
            log::debug!("{:?} answered with error code {}", peer, code);
            continue;
          }
        };

        state.alive.insert(peer);

        match response {
          Response::FindNode { token, nodes } => {
            if kind == LookupKind::Value {
              state.acc.push((peer, token, Vec::new()));
            }
            discovered.extend(nodes);
          }
          Response::FindValue { token, values } => {
            if kind == LookupKind::Value {
              state.acc.push((peer, token, values));
            }
          }
          // Alive, but the reply carries nothing a lookup can use.
          unexpected => {
            log::debug!(
              "{:?} answered a find query with {:?}",
              peer,
              unexpected,
            );
          }
        }
      }

      // Peers referenced this round that have not been queried yet,
      // each at most once.
      let mut fresh_seen = HashSet::new();
      let fresh: Vec<Peer> = discovered
        .into_iter()
        .filter(|peer| !state.done.contains(peer) && fresh_seen.insert(*peer))
        .collect();

      todo = metric::neighborhood(target, &fresh, SEARCH_WIDTH);

      // Still converging while the work queue holds a peer strictly
      // closer than anything alive; an empty queue cannot be closer
      // than anything.
      let min_todo = closest_distance(target, &todo);
      let min_alive = closest_distance(target, &state.alive);
      let converging = match (min_todo, min_alive) {
        (Some(work), Some(alive)) => work < alive,
        (Some(_), None) => true,
        (None, _) => false,
      };

      if converging {
        retries = RETRY_BUDGET;
      } else {
        retries -= 1;
      }

      log::trace!(
        "round {}: {} queried, {} alive, {} queued, retries {}",
        round,
        state.done.len(),
        state.alive.len(),
        todo.len(),
        retries,
      );

      if retries == 0 {
        break;
      }
    }

    log::debug!(
      "{:?} lookup for {:x} finished after {} rounds: {} queried, {} alive",
      kind,
      target,
      round,
      state.done.len(),
      state.alive.len(),
    );

    state
  }
}

/// Distance of the closest peer to `target`, `None` when there are no
/// peers (the infinity sentinel).
fn closest_distance<'a, I>(target: NodeId, peers: I) -> Option<NodeId>
where
  I: IntoIterator<Item = &'a Peer>,
{
  peers
    .into_iter()
    .map(|peer| metric::distance(target, peer.id))
    .min()
}

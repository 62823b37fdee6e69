//! Transport collaborator seam.
//!
//! The UDP socket, retransmission timers and datagram codec calls live
//! behind this trait. The transport normalizes every outcome into an
//! [`RpcReply`] value: a decoded response, a timeout, or an error reply
//! from the remote peer. Lookup workers therefore cannot fail; the
//! search engine partitions on the reply value alone.

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::{
  id::NodeId,
  message::{Response, Tag},
};

/// Outcome of a single find RPC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RpcReply {
  /// The peer answered with a well-formed response.
  Response(Response),
  /// No answer within the transport's deadline.
  Timeout,
  /// The peer answered with a wire-level error message.
  Error {
    tag: Tag,
    code: u16,
    message: Vec<u8>,
  },
}

/// The two RPCs a lookup issues.
#[async_trait]
pub trait Transport {
  /// Ask `addr` for the peers it knows closest to `target`.
  async fn find_node(&self, addr: SocketAddr, target: NodeId) -> RpcReply;

  /// Ask `addr` for endpoints stored under `target`.
  async fn find_value(&self, addr: SocketAddr, target: NodeId) -> RpcReply;
}

//! Core of a content-neutral Kademlia-style DHT peer.
//!
//! The crate maps opaque 256-bit identifiers to `{IP, port}` endpoints.
//! Callers pick the ids (typically content hashes) and layer their own
//! protocol on top of the endpoint sets a lookup returns.
//!
//! Two pieces carry the weight:
//!
//! - [`message`]: the wire codec, translating between message values and
//!   a byte-exact magic-prefixed datagram format;
//! - [`search`]: the iterative parallel lookup engine, fanning out
//!   find RPCs over a churning peer set until the result converges.
//!
//! The routing table and the UDP transport are collaborators behind the
//! [`routing::Routing`] and [`transport::Transport`] traits; the search
//! engine spawns no tasks and owns no sockets.

pub mod compact;
pub mod id;
pub mod message;
pub mod metric;
pub mod peer;
pub mod routing;
pub mod search;
pub mod transport;

pub use id::NodeId;
pub use message::{DecodeError, Message, Tag, Token};
pub use peer::Peer;
pub use routing::Routing;
pub use search::{LookupKind, LookupResult, Search, ValueLookup};
pub use transport::{RpcReply, Transport};

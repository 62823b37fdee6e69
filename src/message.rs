//! Wire protocol for DHT datagrams.
//!
//! ## Framing
//! Every datagram opens with the 8-byte magic prefix followed by the
//! envelope: a 2-byte big-endian correlation tag, the sender's 32-byte
//! node id, a kind byte (`'q'` query, `'r'` response, `'e'` error) and
//! the body.
//!
//! ## Bodies
//! Queries: `'p'` ping; `'f' 'n'`/`'f' 'v'` find-node/find-value with the
//! 32-byte target; `'s'` store with token, id and port.
//!
//! Responses: `'p'` ping; `'f' 'n'`/`'f' 'v'` with an 8-byte token, a
//! 1-byte record count and that many compact peer/endpoint records
//! (see [`crate::compact`]); `'s'` store acknowledgement.
//!
//! Errors: a 2-byte big-endian code and the remainder of the packet as
//! the message.
//!
//! Encoding is deterministic with no optional fields, so
//! `decode(encode(m)) == m` holds byte-for-byte over the whole value
//! domain.

use std::net::SocketAddr;

use crate::{
  compact::{self, Reader},
  id::NodeId,
  peer::Peer,
};

pub mod error;

pub use self::error::DecodeError;

/// 16-bit correlation token. Generated by the querying node and echoed
/// verbatim in the response so replies can be matched to outstanding
/// queries.
pub type Tag = u16;

/// Length of a store token.
pub const TOKEN_LEN: usize = 8;

/// Opaque 8-byte blob issued by a remote peer in find responses and
/// presented back on a subsequent `Store`.
pub type Token = [u8; TOKEN_LEN];

/// Magic prefix opening every datagram of the current protocol revision.
pub const MAGIC: [u8; 8] = [0xAF, 0x40, 0x0D, 0x34, 0xA7, 0x88, 0x37, 0x2D];

/// Prefix of the previous protocol revision. Recognized by the decoder
/// only so it can be reported as [`DecodeError::OldVersion`]; the payload
/// is never parsed.
pub const LEGACY_MAGIC: &[u8] = b"EDHT-KDM-\x00";

const KIND_QUERY: u8 = b'q';
const KIND_RESPONSE: u8 = b'r';
const KIND_ERROR: u8 = b'e';

const BODY_PING: u8 = b'p';
const BODY_FIND: u8 = b'f';
const BODY_STORE: u8 = b's';

const FIND_NODE: u8 = b'n';
const FIND_VALUE: u8 = b'v';

/// A framed DHT message.
///
/// The envelope id is the sender's node id: the querying node's id on
/// queries, the responding node's id on responses. A ping response in
/// particular has an empty body; the envelope id alone identifies the
/// responder.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Message {
  pub tag: Tag,
  pub id: NodeId,
  pub body: MessageBody,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum MessageBody {
  Query(Query),
  Response(Response),
  Error(Error),
}

/// Queries: ping / find_node / find_value / store.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Query {
  Ping,
  /// Ask for the peers closest to `target` in the id space.
  FindNode { target: NodeId },
  /// Ask for endpoints stored under `target`, or failing that the
  /// closest peers.
  FindValue { target: NodeId },
  /// Store the querying node's `{id, port}` under `id`, authenticated by
  /// a token from an earlier find response.
  Store {
    token: Token,
    id: NodeId,
    port: u16,
  },
}

/// Responses mirror the query set.
///
/// Both find responses carry a token, making every responding peer a
/// valid target for a follow-up `Store`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Response {
  Ping,
  /// The closest peers known to the responder.
  FindNode { token: Token, nodes: Vec<Peer> },
  /// Endpoints stored under the queried id.
  FindValue {
    token: Token,
    values: Vec<SocketAddr>,
  },
  Store,
}

/// Error reply: a numeric code and an arbitrary diagnostic blob.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Error {
  pub code: u16,
  pub message: Vec<u8>,
}

impl Message {
  /// Encode into the exact wire representation.
  pub fn encode(&self) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(64);

    buffer.extend_from_slice(&MAGIC);
    buffer.extend_from_slice(&self.tag.to_be_bytes());
    buffer.extend_from_slice(self.id.as_ref());

    match &self.body {
      MessageBody::Query(query) => {
        buffer.push(KIND_QUERY);
        query.encode(&mut buffer);
      }
      MessageBody::Response(response) => {
        buffer.push(KIND_RESPONSE);
        response.encode(&mut buffer);
      }
      MessageBody::Error(error) => {
        buffer.push(KIND_ERROR);
        error.encode(&mut buffer);
      }
    }

    buffer
  }

  /// Decode a datagram, reporting malformed input as a [`DecodeError`].
  pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
    let bytes = match bytes.strip_prefix(&MAGIC) {
      Some(rest) => rest,
      None if bytes.starts_with(LEGACY_MAGIC) => {
        return Err(DecodeError::OldVersion)
      }
      // A short packet that could still grow into the magic.
      None if MAGIC.starts_with(bytes) => return Err(DecodeError::Truncated),
      None => return Err(DecodeError::BadMagic),
    };

    let mut r = Reader::new(bytes);
    let tag = r.u16_be()?;
    let id = NodeId::from(r.array()?);

    let body = match r.u8()? {
      KIND_QUERY => MessageBody::Query(Query::decode(&mut r)?),
      KIND_RESPONSE => MessageBody::Response(Response::decode(&mut r)?),
      KIND_ERROR => MessageBody::Error(Error::decode(r)?),
      kind => return Err(DecodeError::UnknownKind(kind)),
    };

    Ok(Message { tag, id, body })
  }
}

impl Query {
  fn encode(&self, buffer: &mut Vec<u8>) {
    match self {
      Query::Ping => buffer.push(BODY_PING),
      Query::FindNode { target } => {
        buffer.push(BODY_FIND);
        buffer.push(FIND_NODE);
        buffer.extend_from_slice(target.as_ref());
      }
      Query::FindValue { target } => {
        buffer.push(BODY_FIND);
        buffer.push(FIND_VALUE);
        buffer.extend_from_slice(target.as_ref());
      }
      Query::Store { token, id, port } => {
        buffer.push(BODY_STORE);
        buffer.extend_from_slice(token);
        buffer.extend_from_slice(id.as_ref());
        buffer.extend_from_slice(&port.to_be_bytes());
      }
    }
  }

  fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
    match r.u8()? {
      BODY_PING => Ok(Query::Ping),
      BODY_FIND => match r.u8()? {
        FIND_NODE => Ok(Query::FindNode {
          target: NodeId::from(r.array()?),
        }),
        FIND_VALUE => Ok(Query::FindValue {
          target: NodeId::from(r.array()?),
        }),
        mode => Err(DecodeError::UnknownBody(mode)),
      },
      BODY_STORE => Ok(Query::Store {
        token: r.array()?,
        id: NodeId::from(r.array()?),
        port: r.u16_be()?,
      }),
      body => Err(DecodeError::UnknownBody(body)),
    }
  }
}

impl Response {
  fn encode(&self, buffer: &mut Vec<u8>) {
    match self {
      Response::Ping => buffer.push(BODY_PING),
      Response::FindNode { token, nodes } => {
        buffer.push(BODY_FIND);
        buffer.push(FIND_NODE);
        buffer.extend_from_slice(token);
        push_count(buffer, nodes.len());
        for peer in nodes {
          compact::write_peer(buffer, peer);
        }
      }
      Response::FindValue { token, values } => {
        buffer.push(BODY_FIND);
        buffer.push(FIND_VALUE);
        buffer.extend_from_slice(token);
        push_count(buffer, values.len());
        for addr in values {
          compact::write_endpoint(buffer, addr);
        }
      }
      Response::Store => buffer.push(BODY_STORE),
    }
  }

  fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
    match r.u8()? {
      BODY_PING => Ok(Response::Ping),
      BODY_FIND => match r.u8()? {
        FIND_NODE => {
          let token = r.array()?;
          let count = r.u8()?;
          let mut nodes = Vec::with_capacity(count as usize);
          for _ in 0..count {
            nodes.push(compact::read_peer(r)?);
          }
          Ok(Response::FindNode { token, nodes })
        }
        FIND_VALUE => {
          let token = r.array()?;
          let count = r.u8()?;
          let mut values = Vec::with_capacity(count as usize);
          for _ in 0..count {
            values.push(compact::read_endpoint(r)?);
          }
          Ok(Response::FindValue { token, values })
        }
        mode => Err(DecodeError::UnknownBody(mode)),
      },
      BODY_STORE => Ok(Response::Store),
      body => Err(DecodeError::UnknownBody(body)),
    }
  }
}

impl Error {
  fn encode(&self, buffer: &mut Vec<u8>) {
    buffer.extend_from_slice(&self.code.to_be_bytes());
    buffer.extend_from_slice(&self.message);
  }

  fn decode(mut r: Reader<'_>) -> Result<Self, DecodeError> {
    let code = r.u16_be()?;
    // The message is whatever remains of the packet.
    Ok(Error {
      code,
      message: r.rest().to_vec(),
    })
  }
}

// The count prefix is a single byte; a reply cannot carry more than 255
// records and lookups cap their fan-out well below that.
fn push_count(buffer: &mut Vec<u8>, len: usize) {
  debug_assert!(len <= u8::MAX as usize);
  buffer.push(len as u8);
}

/// The following table describes the possible error codes:
pub mod error_code {
  // some of these codes are not used in this crate but we still list them here for completeness.
  #![allow(unused)]

  pub const GENERIC_ERROR: u16 = 201;
  pub const SERVER_ERROR: u16 = 202;
  pub const PROTOCOL_ERROR: u16 = 203;
  pub const METHOD_UNKNOWN: u16 = 204;
}

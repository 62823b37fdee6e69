//! Compact wire records for peers and endpoints.
//!
//! Contact information is framed with a 1-byte address family tag:
//!
//! - `0x04`: IPv4, 4 address bytes;
//! - `0x06`: IPv6, 16 address bytes (eight big-endian u16 groups).
//!
//! A *peer record* is `family ‖ id(32) ‖ address ‖ port(2 BE)`: 39 bytes
//! for IPv4, 51 for IPv6. An *endpoint record* drops the id: 7 bytes for
//! IPv4, 19 for IPv6.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::{
  id::NodeId,
  message::error::DecodeError,
  peer::Peer,
};

pub const FAMILY_V4: u8 = 0x04;
pub const FAMILY_V6: u8 = 0x06;

/// Bounds-checked cursor over an incoming datagram.
///
/// Every read that runs past the end of the buffer is reported as
/// [`DecodeError::Truncated`]; the decoder never panics on short input.
pub(crate) struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    Self(bytes)
  }

  pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
    if len > self.0.len() {
      return Err(DecodeError::Truncated);
    }
    let (head, tail) = self.0.split_at(len);
    self.0 = tail;
    Ok(head)
  }

  pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
    // `take` already checked the length, the conversion cannot fail.
    Ok(self.take(N)?.try_into().unwrap())
  }

  pub fn u8(&mut self) -> Result<u8, DecodeError> {
    Ok(self.array::<1>()?[0])
  }

  pub fn u16_be(&mut self) -> Result<u16, DecodeError> {
    Ok(u16::from_be_bytes(self.array()?))
  }

  /// Consume whatever is left of the packet.
  pub fn rest(self) -> &'a [u8] {
    self.0
  }
}

pub(crate) fn write_peer(buffer: &mut Vec<u8>, peer: &Peer) {
  match peer.addr {
    SocketAddr::V4(addr) => {
      buffer.push(FAMILY_V4);
      buffer.extend_from_slice(peer.id.as_ref());
      buffer.extend_from_slice(&addr.ip().octets());
      buffer.extend_from_slice(&addr.port().to_be_bytes());
    }
    SocketAddr::V6(addr) => {
      buffer.push(FAMILY_V6);
      buffer.extend_from_slice(peer.id.as_ref());
      buffer.extend_from_slice(&addr.ip().octets());
      buffer.extend_from_slice(&addr.port().to_be_bytes());
    }
  }
}

pub(crate) fn read_peer(r: &mut Reader<'_>) -> Result<Peer, DecodeError> {
  match r.u8()? {
    FAMILY_V4 => {
      let id = NodeId::from(r.array()?);
      let ip = Ipv4Addr::from(r.array::<4>()?);
      let port = r.u16_be()?;
      Ok(Peer::new(id, (ip, port).into()))
    }
    FAMILY_V6 => {
      let id = NodeId::from(r.array()?);
      let ip = Ipv6Addr::from(r.array::<16>()?);
      let port = r.u16_be()?;
      Ok(Peer::new(id, (ip, port).into()))
    }
    family => Err(DecodeError::UnknownFamily(family)),
  }
}

pub(crate) fn write_endpoint(buffer: &mut Vec<u8>, addr: &SocketAddr) {
  match addr {
    SocketAddr::V4(addr) => {
      buffer.push(FAMILY_V4);
      buffer.extend_from_slice(&addr.ip().octets());
    }
    SocketAddr::V6(addr) => {
      buffer.push(FAMILY_V6);
      buffer.extend_from_slice(&addr.ip().octets());
    }
  }
  buffer.extend_from_slice(&addr.port().to_be_bytes());
}

pub(crate) fn read_endpoint(
  r: &mut Reader<'_>,
) -> Result<SocketAddr, DecodeError> {
  match r.u8()? {
    FAMILY_V4 => {
      let ip = Ipv4Addr::from(r.array::<4>()?);
      let port = r.u16_be()?;
      Ok((ip, port).into())
    }
    FAMILY_V6 => {
      let ip = Ipv6Addr::from(r.array::<16>()?);
      let port = r.u16_be()?;
      Ok((ip, port).into())
    }
    family => Err(DecodeError::UnknownFamily(family)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn peer_record_lengths() {
    let v4 = Peer::new(rand::random(), ([10, 0, 0, 1], 6881).into());
    let v6 = Peer::new(
      rand::random(),
      (Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1), 6881).into(),
    );

    let mut buffer = Vec::new();
    write_peer(&mut buffer, &v4);
    assert_eq!(buffer.len(), 39);

    buffer.clear();
    write_peer(&mut buffer, &v6);
    assert_eq!(buffer.len(), 51);
  }

  #[test]
  fn endpoint_record_lengths() {
    let mut buffer = Vec::new();
    write_endpoint(&mut buffer, &([10, 0, 0, 1], 6881).into());
    assert_eq!(buffer.len(), 7);

    buffer.clear();
    write_endpoint(
      &mut buffer,
      &(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1), 6881).into(),
    );
    assert_eq!(buffer.len(), 19);
  }

  #[test]
  fn unknown_family_is_rejected() {
    let mut r = Reader::new(&[0x05, 0, 0, 0, 0, 0, 0]);
    assert_eq!(read_endpoint(&mut r), Err(DecodeError::UnknownFamily(0x05)));
  }

  #[test]
  fn short_reads_are_truncation_errors() {
    let mut buffer = Vec::new();
    write_peer(
      &mut buffer,
      &Peer::new(rand::random(), ([10, 0, 0, 1], 6881).into()),
    );

    for len in 0..buffer.len() {
      let mut r = Reader::new(&buffer[..len]);
      match read_peer(&mut r) {
        Err(DecodeError::Truncated) => (),
        other => panic!("expected truncation at {}, got {:?}", len, other),
      }
    }
  }
}

use std::{fmt, ops::BitXor};

use rand::{distributions::Standard, prelude::Distribution};
use thiserror::Error;

pub const ID_LEN: usize = 32;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
// Ids are unsigned 256-bit integers stored big-endian, so the derived
// byte-wise `Ord` is numeric order. The wire format fixes this width;
// shorter legacy ids are rejected at construction.
pub struct Id([u8; ID_LEN]);

impl AsRef<[u8]> for Id {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl From<Id> for [u8; ID_LEN] {
  fn from(id: Id) -> Self {
    id.0
  }
}

impl From<[u8; ID_LEN]> for Id {
  fn from(value: [u8; ID_LEN]) -> Self {
    Self(value)
  }
}

#[derive(Debug, Error)]
#[error("invalid id length")]
pub struct LengthError;

impl<'a> TryFrom<&'a [u8]> for Id {
  type Error = LengthError;
  fn try_from(slice: &'a [u8]) -> Result<Self, Self::Error> {
    Ok(Id(slice.try_into().map_err(|_| LengthError)?))
  }
}

impl BitXor for Id {
  type Output = Self;

  fn bitxor(mut self, rhs: Self) -> Self::Output {
    for (src, dst) in rhs.0.iter().zip(self.0.iter_mut()) {
      *dst ^= *src;
    }
    self
  }
}

/// Used to create a random instance of `Id`.
impl Distribution<Id> for Standard {
  fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Id {
    Id(rng.gen())
  }
}

/// Format output in number hexadecimal.
impl fmt::LowerHex for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for b in &self.0 {
      write!(f, "{:02x}", b)?;
    }
    Ok(())
  }
}

impl fmt::Debug for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:x}", self)
  }
}

/// Identifier of a node in the DHT id space.
pub type NodeId = Id;

/// Length of a `NodeId`.
pub const NODE_ID_LEN: usize = ID_LEN;

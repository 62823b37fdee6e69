use thiserror::Error;

/// Reasons an incoming datagram failed to decode.
///
/// Malformed packets are reported as values and dropped by the caller;
/// the decoder never panics on untrusted input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
  /// The packet does not start with a known protocol magic.
  #[error("packet does not start with the protocol magic")]
  BadMagic,
  /// The packet carries the legacy protocol magic. The payload is not
  /// parsed; the sender speaks an older protocol revision.
  #[error("packet uses the legacy protocol magic")]
  OldVersion,
  /// The packet ended before a declared structure was complete.
  #[error("packet truncated")]
  Truncated,
  /// The envelope kind byte is not `'q'`, `'r'` or `'e'`.
  #[error("unknown message kind {0:#04x}")]
  UnknownKind(u8),
  /// The discriminator inside a query or response body is not part of
  /// the grammar.
  #[error("unknown message body discriminator {0:#04x}")]
  UnknownBody(u8),
  /// A peer or endpoint record carries an address family tag other than
  /// `0x04` or `0x06`.
  #[error("unknown address family tag {0:#04x}")]
  UnknownFamily(u8),
}

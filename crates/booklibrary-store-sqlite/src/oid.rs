//! Twelve-byte object identifiers, rendered as 24 lowercase hex characters.
//!
//! Layout: 4-byte big-endian Unix seconds, 5 bytes of per-process randomness,
//! 3-byte big-endian counter seeded randomly. Ids created by one process sort
//! roughly by creation time.

use std::{
  fmt,
  str::FromStr,
  sync::{
    LazyLock,
    atomic::{AtomicU32, Ordering},
  },
};

use chrono::Utc;
use rand_core::{OsRng, RngCore as _};

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| {
  let mut bytes = [0u8; 5];
  OsRng.fill_bytes(&mut bytes);
  bytes
});

static COUNTER: LazyLock<AtomicU32> =
  LazyLock::new(|| AtomicU32::new(OsRng.next_u32() & 0x00ff_ffff));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
  /// Generate a fresh id.
  pub fn new() -> Self {
    let mut bytes = [0u8; 12];
    let secs = Utc::now().timestamp() as u32;
    let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
    bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
    Self(bytes)
  }

  pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl Default for ObjectId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for ObjectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_hex())
  }
}

/// Accepts exactly 24 hex characters, upper- or lowercase.
impl FromStr for ObjectId {
  type Err = hex::FromHexError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut bytes = [0u8; 12];
    hex::decode_to_slice(s, &mut bytes)?;
    Ok(Self(bytes))
  }
}

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};

/// 32 bytes of OS entropy, well past the 128-bit unguessability floor.
const RESET_TOKEN_BYTES: usize = 32;

/// Reset tokens stop matching once this window has passed.
pub const RESET_TOKEN_TTL: Duration = Duration::minutes(15);

/// Mint an opaque reset token. URL-safe so it can ride in a query string.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

pub fn expiry_from(now: OffsetDateTime) -> OffsetDateTime {
    now + RESET_TOKEN_TTL
}

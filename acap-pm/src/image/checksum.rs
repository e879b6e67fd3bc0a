//! Header checksum verification
//!
//! A header of `byte_size` bytes is treated as `N = byte_size / 4` words.
//! The stored checksum is the word at index `N`, one past the nominal
//! structure, and covers words `0..N-1`. Word `N-1` is not summed.

use acap_api::view::ByteView;
use acap_api::{Error, Result};

/// Minimum number of words a checksummed header may have
pub const MIN_HEADER_WORDS: usize = 2;

/// One's complement of the wrapping sum of `words`
pub fn checksum<I>(words: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    !words.into_iter().fold(0u32, |sum, w| sum.wrapping_add(w))
}

/// Verify the checksum of a header of `byte_size` bytes at the start of
/// `bytes`
pub fn verify(bytes: &[u8], byte_size: usize) -> Result {
    let words = byte_size / 4;
    if words < MIN_HEADER_WORDS {
        return Err(Error::InvalidLength);
    }
    let view = ByteView::new(bytes);
    let stored = view.word(words)?;
    let summed = view.sub(0, (words - 1) * 4)?;
    let computed = checksum(summed.words());
    if computed == stored {
        Ok(())
    } else {
        log::debug!(
            "pm: checksum mismatch: stored {:#010x}, computed {:#010x}",
            stored,
            computed
        );
        Err(Error::InvalidChecksum)
    }
}

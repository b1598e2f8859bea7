//! Stream-aware UTF-8 decoding.
//!
//! Response bodies arrive as arbitrary byte chunks, so a multi-byte character
//! can straddle two chunks. [`Utf8StreamDecoder`] holds back the incomplete
//! tail of each chunk and prepends it to the next one instead of decoding
//! every chunk on its own.
//!
//! Invalid input never fails: each maximal invalid subpart becomes one
//! U+FFFD, the same substitution `String::from_utf8_lossy` performs.

/// Incremental UTF-8 decoder.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Bytes of a character whose remaining bytes have not arrived yet.
    /// Never longer than three bytes.
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Create a decoder with no buffered bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, returning all text completed by it.
    ///
    /// The result is empty when the chunk only extends a character that is
    /// still incomplete.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        if self.pending.is_empty() {
            let (text, rest) = decode_prefix(chunk);
            self.pending.extend_from_slice(rest);
            return text;
        }

        let mut joined = std::mem::take(&mut self.pending);
        joined.extend_from_slice(chunk);
        let (text, rest) = decode_prefix(&joined);
        self.pending = rest.to_vec();
        text
    }

    /// Flush the decoder at end of stream.
    ///
    /// A truncated trailing character decodes to a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    /// Whether bytes of an incomplete character are buffered.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Decode as much of `bytes` as possible.
///
/// Returns the decoded text and the trailing bytes that form the start of a
/// character which may still be completed by later input.
fn decode_prefix(bytes: &[u8]) -> (String, &[u8]) {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return (out, &[]);
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                // `valid_up_to` bytes are already checked
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[len..];
                    }
                    None => return (out, after),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_chunks_pass_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Hel"), "Hel");
        assert_eq!(decoder.decode(b"lo"), "lo");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        // "é" is 0xC3 0xA9
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"caf\xC3"), "caf");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(b"\xA9!"), "é!");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn four_byte_character_one_byte_at_a_time() {
        let bytes = "🦀".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for b in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(b)));
        }
        assert_eq!(out, "🦀");
    }

    #[test]
    fn every_split_point_matches_whole_decoding() {
        let text = "añb€c🦀d";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = Utf8StreamDecoder::new();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            out.push_str(&decoder.finish());
            assert_eq!(out, text, "split at {split}");
        }
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        let mut decoder = Utf8StreamDecoder::new();
        let out = decoder.decode(b"a\xFFb");
        assert_eq!(out, String::from_utf8_lossy(b"a\xFFb"));
    }

    #[test]
    fn truncated_tail_flushes_as_one_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"x\xE2\x82"), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(!decoder.has_pending());
    }
}

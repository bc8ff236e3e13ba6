//! Frame codec for the middleware stream.
//!
//! Every message on the wire is followed by a single `~` terminator:
//!
//! ```text
//! StartFromClient:SdkLLPY:2.0.0:TrackType1~{"type":"MW_GET_STATUS","ts":1700000000000}~
//! ```
//!
//! Reads may end anywhere, including between a payload and its terminator.
//! [`FrameCodec`] keeps the unterminated tail in the caller's `BytesMut` and
//! only yields a frame once its terminator has been seen.

// ============================================================================
// Imports
// ============================================================================

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Byte appended after every message.
pub const FRAME_TERMINATOR: u8 = b'~';

/// Default maximum payload length: 1 MiB.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

// ============================================================================
// FrameCodec
// ============================================================================

/// Splits a byte stream on [`FRAME_TERMINATOR`] and terminates outgoing payloads.
///
/// Oversized frames are skipped up to their terminator rather than buffered
/// without bound. Invalid UTF-8 is converted lossily; such frames fail to
/// decode further up and are dropped there.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Longest payload accepted, terminator excluded.
    max_length: usize,
    /// Bytes of the buffer already scanned without finding a terminator.
    next_index: usize,
    /// Skipping the rest of an oversized frame.
    discarding: bool,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Creates a codec with [`DEFAULT_MAX_FRAME_LENGTH`].
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_FRAME_LENGTH)
    }

    /// Creates a codec with a custom maximum payload length.
    #[inline]
    #[must_use]
    pub const fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    /// Returns the maximum payload length.
    #[inline]
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Drains every complete frame currently in `buf`.
    ///
    /// Whatever follows the last terminator stays in `buf` for the next read.
    pub fn decode_all(&mut self, buf: &mut BytesMut) -> Result<Vec<String>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.decode(buf)? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

/// Appends the terminator to `payload`.
///
/// # Errors
///
/// Returns [`Error::InvalidPayload`] if `payload` contains the terminator.
pub fn encode_frame(payload: &str) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(payload.len() + 1);
    FrameCodec::new().encode(payload, &mut dst)?;
    Ok(dst.freeze())
}

// ============================================================================
// Decoder / Encoder
// ============================================================================

impl Decoder for FrameCodec {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>> {
        loop {
            let search_from = self.next_index.min(buf.len());
            let terminator = buf[search_from..]
                .iter()
                .position(|b| *b == FRAME_TERMINATOR);

            let Some(offset) = terminator else {
                if self.discarding {
                    buf.clear();
                    self.next_index = 0;
                } else if buf.len() > self.max_length {
                    warn!(
                        buffered = buf.len(),
                        max = self.max_length,
                        "Frame exceeds maximum length, discarding"
                    );
                    buf.clear();
                    self.next_index = 0;
                    self.discarding = true;
                } else {
                    self.next_index = buf.len();
                }
                return Ok(None);
            };

            let end = search_from + offset;
            let frame = buf.split_to(end + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }

            let payload = &frame[..end];
            if payload.is_empty() {
                continue;
            }
            if payload.len() > self.max_length {
                warn!(
                    length = payload.len(),
                    max = self.max_length,
                    "Frame exceeds maximum length, discarding"
                );
                continue;
            }

            return Ok(Some(String::from_utf8_lossy(payload).into_owned()));
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        if !buf.is_empty() {
            debug!(remaining = buf.len(), "Dropping unterminated frame at end of stream");
            buf.clear();
        }
        self.next_index = 0;
        self.discarding = false;
        Ok(None)
    }
}

impl Encoder<&str> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, payload: &str, dst: &mut BytesMut) -> Result<()> {
        if payload.as_bytes().contains(&FRAME_TERMINATOR) {
            return Err(Error::invalid_payload(format!(
                "payload contains frame terminator '{}'",
                FRAME_TERMINATOR as char
            )));
        }
        dst.reserve(payload.len() + 1);
        dst.put_slice(payload.as_bytes());
        dst.put_u8(FRAME_TERMINATOR);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn feed(codec: &mut FrameCodec, buf: &mut BytesMut, chunk: &[u8]) -> Vec<String> {
        buf.extend_from_slice(chunk);
        codec.decode_all(buf).expect("decode")
    }

    #[test]
    fn test_encode_appends_terminator() {
        let frame = encode_frame("StopFromClient").unwrap();
        assert_eq!(frame.as_ref(), b"StopFromClient~");
    }

    #[test]
    fn test_encode_rejects_terminator_in_payload() {
        let result = encode_frame("bad~payload");
        assert!(matches!(result, Err(Error::InvalidPayload { .. })));
    }

    #[test]
    fn test_multiple_frames_in_one_read() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        let frames = feed(&mut codec, &mut buf, b"a:1~b:2~c:3~");
        assert_eq!(frames, vec!["a:1", "b:2", "c:3"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_frame_is_buffered() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        assert_eq!(feed(&mut codec, &mut buf, b"temperature:0.5:LE"), Vec::<String>::new());
        assert_eq!(buf.as_ref(), b"temperature:0.5:LE");

        let frames = feed(&mut codec, &mut buf, b"FT:INDEX~stopForce:");
        assert_eq!(frames, vec!["temperature:0.5:LEFT:INDEX"]);
        assert_eq!(buf.as_ref(), b"stopForce:");
    }

    #[test]
    fn test_terminator_alone_in_next_read() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        assert!(feed(&mut codec, &mut buf, b"StopCalibration").is_empty());
        assert_eq!(feed(&mut codec, &mut buf, b"~"), vec!["StopCalibration"]);
    }

    #[test]
    fn test_empty_frames_are_skipped() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        assert_eq!(feed(&mut codec, &mut buf, b"~~x~~"), vec!["x"]);
    }

    #[test]
    fn test_oversized_frame_is_discarded() {
        let mut codec = FrameCodec::with_max_length(4);
        let mut buf = BytesMut::new();

        assert!(feed(&mut codec, &mut buf, b"abcdefgh").is_empty());
        assert!(buf.is_empty());
        let frames = feed(&mut codec, &mut buf, b"ij~ok~");
        assert_eq!(frames, vec!["ok"]);
    }

    #[test]
    fn test_oversized_terminated_frame_is_discarded() {
        let mut codec = FrameCodec::with_max_length(3);
        let mut buf = BytesMut::new();
        assert_eq!(feed(&mut codec, &mut buf, b"long~abc~"), vec!["abc"]);
    }

    #[test]
    fn test_decode_eof_drops_partial_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"done~partial"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("done".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_invalid_utf8_does_not_fail() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        let frames = feed(&mut codec, &mut buf, &[0xff, 0xfe, b'~', b'o', b'k', b'~']);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], "ok");
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_frames(
            payloads in prop::collection::vec("[a-zA-Z0-9:.{}\",_]{1,40}", 1..20),
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..30),
        ) {
            let mut stream = Vec::new();
            for payload in &payloads {
                stream.extend_from_slice(&encode_frame(payload).unwrap());
            }

            let mut offsets: Vec<usize> = cuts.iter().map(|i| i.index(stream.len())).collect();
            offsets.push(0);
            offsets.push(stream.len());
            offsets.sort_unstable();
            offsets.dedup();

            let mut codec = FrameCodec::new();
            let mut buf = BytesMut::new();
            let mut decoded = Vec::new();
            for window in offsets.windows(2) {
                decoded.extend(feed(&mut codec, &mut buf, &stream[window[0]..window[1]]));
            }

            prop_assert_eq!(decoded, payloads);
            prop_assert!(buf.is_empty());
        }
    }
}

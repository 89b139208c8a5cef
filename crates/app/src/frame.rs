//! Frame assembler — turns the adapter's byte stream into complete replies.
//!
//! Replies look like `$<2800!<payload><ck>#`: an optional preamble, the
//! payload, two checksum characters and a `#` terminator. Bytes arrive in
//! arbitrary chunks; the assembler buffers them (up to a fixed capacity)
//! and emits one [`Frame`] per terminator.

/// Preamble the adapter puts in front of every reply.
pub const REPLY_PREAMBLE: &[u8] = b"$<2800!";

/// Reply sent when the adapter has nothing buffered.
pub const NULL_REPLY: &[u8] = b"$<2800!4B#";

/// Terminator byte closing every frame.
pub const FRAME_TERMINATOR: u8 = b'#';

/// Default assembler capacity in bytes.
pub const DEFAULT_FRAME_CAPACITY: usize = 512;

const CHECKSUM_LEN: usize = 2;

/// One complete reply, terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    raw: Vec<u8>,
}

impl Frame {
    /// Everything received for this frame, checksum and terminator included.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The frame without its checksum trailer and terminator.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.raw[..self.raw.len() - CHECKSUM_LEN - 1]
    }

    /// The two checksum characters preceding the terminator.
    #[must_use]
    pub fn checksum(&self) -> &[u8] {
        let end = self.raw.len() - 1;
        &self.raw[end - CHECKSUM_LEN..end]
    }

    /// The body with the reply preamble stripped, ready for decoding.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        let body = self.body();
        body.strip_prefix(REPLY_PREAMBLE).unwrap_or(body)
    }

    /// Whether this is the adapter's "nothing to report" reply.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.raw == NULL_REPLY
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.raw))
    }
}

/// Counters for discarded input, kept for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub malformed: u64,
    pub overflows: u64,
}

/// Accumulates transport bytes into [`Frame`]s.
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
    capacity: usize,
    resyncing: bool,
    stats: FrameStats,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_CAPACITY)
    }
}

impl FrameAssembler {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            resyncing: false,
            stats: FrameStats::default(),
        }
    }

    /// Feed a chunk of bytes and collect every frame it completes.
    ///
    /// Unterminated trailing bytes stay buffered for the next call.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for &byte in bytes {
            if self.resyncing {
                if byte == FRAME_TERMINATOR {
                    tracing::debug!("frame assembler resynchronised");
                    self.resyncing = false;
                }
                continue;
            }

            if byte == FRAME_TERMINATOR {
                if self.buffer.len() < CHECKSUM_LEN {
                    tracing::warn!(
                        discarded = self.buffer.len(),
                        "malformed frame: terminator without checksum"
                    );
                    self.stats.malformed += 1;
                    self.buffer.clear();
                    continue;
                }
                let mut raw = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.capacity));
                raw.push(byte);
                self.stats.frames += 1;
                frames.push(Frame { raw });
                continue;
            }

            if self.buffer.len() >= self.capacity {
                tracing::warn!(
                    capacity = self.capacity,
                    "ran out of frame buffer space, discarding input"
                );
                self.stats.overflows += 1;
                self.buffer.clear();
                self.resyncing = true;
                continue;
            }
            self.buffer.push(byte);
        }
        frames
    }

    /// Number of bytes waiting for a terminator.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Drop buffered bytes (used when the transport reconnects).
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.resyncing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_assemble_frame_split_across_reads() {
        let mut assembler = FrameAssembler::default();
        assert!(assembler.push(b"$<2800!A").is_empty());
        assert!(assembler.push(b"03ON4").is_empty());
        let frames = assembler.push(b"B#");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body(), b"$<2800!A03ON");
        assert_eq!(frames[0].payload(), b"A03ON");
        assert_eq!(frames[0].checksum(), b"4B");
        assert_eq!(frames[0].raw(), b"$<2800!A03ON4B#");
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn should_emit_each_frame_of_a_single_read() {
        let mut assembler = FrameAssembler::default();
        let frames = assembler.push(b"$<2800!A01ONxx#$<2800!B02OFFyy#$<28");

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload(), b"A01ON");
        assert_eq!(frames[1].payload(), b"B02OFF");
        assert_eq!(assembler.pending(), 4);
    }

    #[test]
    fn should_keep_payload_without_preamble_as_is() {
        let mut assembler = FrameAssembler::default();
        let frames = assembler.push(b"A03ON4B#");
        assert_eq!(frames[0].payload(), b"A03ON");
    }

    #[test]
    fn should_discard_frame_with_fewer_than_two_bytes_before_terminator() {
        let mut assembler = FrameAssembler::default();
        let frames = assembler.push(b"4#$<2800!A03ON4B#");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"A03ON");
        assert_eq!(assembler.stats().malformed, 1);
    }

    #[test]
    fn should_discard_lone_terminator() {
        let mut assembler = FrameAssembler::default();
        assert!(assembler.push(b"#").is_empty());
        assert_eq!(assembler.stats().malformed, 1);
    }

    #[test]
    fn should_emit_empty_payload_for_two_byte_frame() {
        let mut assembler = FrameAssembler::default();
        let frames = assembler.push(b"4B#");
        assert_eq!(frames.len(), 1);
        assert!(frames[0].payload().is_empty());
    }

    #[test]
    fn should_recognise_null_reply() {
        let mut assembler = FrameAssembler::default();
        let frames = assembler.push(NULL_REPLY);
        assert!(frames[0].is_null());
        assert!(frames[0].payload().is_empty());
    }

    #[test]
    fn should_resynchronise_on_next_terminator_after_overflow() {
        let mut assembler = FrameAssembler::new(8);
        let frames = assembler.push(b"0123456789abc#$<2800!A1ON");
        assert!(frames.is_empty());
        assert_eq!(assembler.stats().overflows, 1);

        let frames = assembler.push(b"zz#");
        assert!(frames.is_empty(), "still larger than capacity");
        assert_eq!(assembler.stats().overflows, 2);

        let frames = assembler.push(b"A2OFFzz#");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"A2OFF");
    }

    #[test]
    fn should_accept_frame_exactly_at_capacity() {
        let mut assembler = FrameAssembler::new(7);
        let frames = assembler.push(b"A1ONxyz#");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"A1ONx");
    }

    #[test]
    fn should_drop_buffered_bytes_on_reset() {
        let mut assembler = FrameAssembler::default();
        assembler.push(b"$<2800!A0");
        assembler.reset();
        let frames = assembler.push(b"B2ONcc#");
        assert_eq!(frames[0].payload(), b"B2ON");
    }
}

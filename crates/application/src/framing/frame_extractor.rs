use bytes::{Buf, BufMut, Bytes, BytesMut};
use ferrous_stub_domain::QueryError;

/// Size of the big-endian length prefix in front of every stream message.
pub const LENGTH_PREFIX_LEN: usize = 2;

pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractState {
    AwaitingLength,
    AwaitingBody(usize),
}

/// Reassembles length-prefixed DNS messages from arbitrarily split stream chunks.
///
/// A length prefix is consumed as soon as both of its bytes are present, so a
/// zero-length frame is yielded as an empty message.
#[derive(Debug)]
pub struct FrameExtractor {
    buffer: BytesMut,
    state: ExtractState,
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameExtractor {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(MAX_FRAME_LEN + LENGTH_PREFIX_LEN),
            state: ExtractState::AwaitingLength,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Frames completed by the bytes pushed so far, in stream order.
    ///
    /// The iterator is lazy: frames it does not reach stay buffered for the
    /// next call.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { extractor: self }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.push(chunk);
        self.frames()
    }

    pub fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            match self.state {
                ExtractState::AwaitingLength => {
                    if self.buffer.len() < LENGTH_PREFIX_LEN {
                        return None;
                    }
                    let len = self.buffer.get_u16() as usize;
                    self.state = ExtractState::AwaitingBody(len);
                }
                ExtractState::AwaitingBody(len) => {
                    if self.buffer.len() < len {
                        return None;
                    }
                    let frame = self.buffer.split_to(len).freeze();
                    self.state = ExtractState::AwaitingLength;
                    return Some(frame);
                }
            }
        }
    }

    pub fn state(&self) -> ExtractState {
        self.state
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drops any partial frame. Used when the connection goes away.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = ExtractState::AwaitingLength;
    }
}

pub struct Frames<'a> {
    extractor: &'a mut FrameExtractor,
}

impl Iterator for Frames<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        self.extractor.next_frame()
    }
}

/// Prefixes `message` with its length for transmission on a stream.
pub fn encode_frame(message: &[u8]) -> Result<Bytes, QueryError> {
    let len = u16::try_from(message.len()).map_err(|_| {
        QueryError::Encode(format!(
            "Message too large for stream framing: {} bytes (max {})",
            message.len(),
            MAX_FRAME_LEN
        ))
    })?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_LEN + message.len());
    frame.put_u16(len);
    frame.extend_from_slice(message);
    Ok(frame.freeze())
}

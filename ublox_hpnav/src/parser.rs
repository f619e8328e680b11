mod checksum;

pub use checksum::ubx_checksum;
pub(crate) use checksum::UbxChecksumCalc;

use crate::{
    constants::{
        MAX_PAYLOAD_LEN, PARSER_BUFFER_LEN, UBX_CHECKSUM_LEN, UBX_CLASS_OFFSET, UBX_FRAME_OVERHEAD,
        UBX_HEADER_LEN, UBX_LENGTH_OFFSET, UBX_MSG_ID_OFFSET, UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2,
    },
    error::ParserError,
    ubx_packets::{match_packet, PacketRef},
};

/// Streaming parser for the UBX protocol over a fixed, internal buffer.
///
/// Bytes are appended with [`Parser::consume`] and frames are taken out one
/// by one with [`Parser::next`]. Anything that is not a UBX frame (NMEA
/// sentences, line noise, frames cut in half by a bus error) is skipped.
pub struct Parser {
    buf: [u8; PARSER_BUFFER_LEN],
    len: usize,
    /// Size of the frame handed out by the last `next()`, dropped on the
    /// following call since the returned packet borrows it
    pending: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub const fn new() -> Self {
        Self {
            buf: [0; PARSER_BUFFER_LEN],
            len: 0,
            pending: 0,
        }
    }

    pub fn is_buffer_empty(&self) -> bool {
        self.buffer_len() == 0
    }

    pub fn buffer_len(&self) -> usize {
        self.len - self.pending
    }

    /// Number of bytes [`Parser::consume`] can take without losing data
    pub fn free_space(&self) -> usize {
        PARSER_BUFFER_LEN - self.buffer_len()
    }

    /// Drop everything buffered, e.g. after the bus was reset
    pub fn reset(&mut self) {
        self.len = 0;
        self.pending = 0;
    }

    /// Append `new_data` to the buffer. Returns the number of bytes that did
    /// not fit and were thrown away.
    pub fn consume(&mut self, new_data: &[u8]) -> usize {
        self.settle();
        if self.len + new_data.len() > PARSER_BUFFER_LEN {
            // make room by throwing away whatever precedes the next frame start
            self.skip_to_sync();
        }
        let to_copy = core::cmp::min(new_data.len(), PARSER_BUFFER_LEN - self.len);
        self.buf[self.len..self.len + to_copy].copy_from_slice(&new_data[..to_copy]);
        self.len += to_copy;
        new_data.len() - to_copy
    }

    #[allow(clippy::should_implement_trait)]
    /// Analog of `core::iter::Iterator::next`, the returned packet borrows
    /// the parser buffer so it cannot be a real iterator
    pub fn next(&mut self) -> Option<Result<PacketRef<'_>, ParserError>> {
        self.settle();
        loop {
            if !self.skip_to_sync() {
                return None;
            }
            if self.len < 2 {
                return None;
            }
            if self.buf[1] != UBX_SYNC_CHAR_2 {
                self.drain(1);
                continue;
            }
            if self.len < UBX_HEADER_LEN {
                return None;
            }

            let pack_len = usize::from(u16::from_le_bytes([
                self.buf[UBX_LENGTH_OFFSET],
                self.buf[UBX_LENGTH_OFFSET + 1],
            ]));
            if pack_len > MAX_PAYLOAD_LEN {
                self.drain(2);
                continue;
            }
            let frame_len = pack_len + UBX_FRAME_OVERHEAD;
            if self.len < frame_len {
                return None;
            }

            let mut checksummer = UbxChecksumCalc::new();
            checksummer.update(&self.buf[UBX_CLASS_OFFSET..UBX_HEADER_LEN + pack_len]);
            let ck = &self.buf[frame_len - UBX_CHECKSUM_LEN..frame_len];
            if let Err(e) = checksummer.validate_result(ck[0], ck[1]) {
                self.drain(2);
                return Some(Err(e));
            }

            self.pending = frame_len;
            let class = self.buf[UBX_CLASS_OFFSET];
            let msg_id = self.buf[UBX_MSG_ID_OFFSET];
            return Some(match_packet(
                class,
                msg_id,
                &self.buf[UBX_HEADER_LEN..UBX_HEADER_LEN + pack_len],
            ));
        }
    }

    fn settle(&mut self) {
        let pending = core::mem::take(&mut self.pending);
        self.drain(pending);
    }

    /// Moves the first sync char to the front, false if there is none
    fn skip_to_sync(&mut self) -> bool {
        match self.buf[..self.len].iter().position(|b| *b == UBX_SYNC_CHAR_1) {
            Some(pos) => {
                self.drain(pos);
                true
            },
            None => {
                self.len = 0;
                false
            },
        }
    }

    fn drain(&mut self, count: usize) {
        if count >= self.len {
            self.len = 0;
            return;
        }
        self.buf.copy_within(count..self.len, 0);
        self.len -= count;
    }
}

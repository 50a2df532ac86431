use std::collections::VecDeque;
use std::io::{self, BufRead};

use common::{NalUnitHeader, NAL_UNIT_TYPE_MASK, NAL_UNIT_TYPE_SEI, START_CODE_PREFIX};
use log::{debug, trace, warn};

/// How the header byte after a start code is recognised as an SEI NAL unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMatch {
    /// Compare only `nal_unit_type`, accepting any `nal_ref_idc`.
    #[default]
    NalUnitType,

    /// Compare the whole header byte to `0x06`. Only SEI units with `nal_ref_idc == 0` match.
    ExactByte,
}

impl HeaderMatch {
    pub fn matches(self, header_byte: u8) -> bool {
        match self {
            HeaderMatch::NalUnitType => header_byte & NAL_UNIT_TYPE_MASK == NAL_UNIT_TYPE_SEI,
            HeaderMatch::ExactByte => header_byte == NAL_UNIT_TYPE_SEI,
        }
    }
}

/// An SEI NAL unit found by `ByteStream::next_sei_unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeiUnit {
    /// Offset of the NAL header byte from the start of the byte stream.
    pub offset: u64,
    pub header: NalUnitHeader,
}

/// `ByteStream` is an encapsulation of a NAL unit stream containing `START_CODE_PREFIX` and NAL
/// units. It is read strictly forward, one byte at a time.
pub struct ByteStream<R> {
    reader: R,
    offset: u64,
    /// Bytes read from `reader` but not yet consumed.
    lookahead: VecDeque<u8>,
    /// Consecutive `0x00` bytes just scanned, capped at two.
    zeros: u8,
    header_match: HeaderMatch,
    nal_units: u64,
}

impl<R: BufRead> ByteStream<R> {
    /// `reader` must yield an ordered stream of bytes consisting of a sequence of byte stream
    /// NAL unit syntax structures.
    pub fn new(reader: R) -> Self {
        Self::with_header_match(reader, HeaderMatch::default())
    }

    pub fn with_header_match(reader: R, header_match: HeaderMatch) -> Self {
        Self {
            reader,
            offset: 0,
            lookahead: VecDeque::new(),
            zeros: 0,
            header_match,
            nal_units: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of NAL unit headers scanned so far, SEI or not.
    pub fn nal_units_seen(&self) -> u64 {
        self.nal_units
    }

    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.lookahead.pop_front() {
            Some(byte) => Some(byte),
            None => self.read_byte()?,
        };
        if byte.is_some() {
            self.offset += 1;
        }
        Ok(byte)
    }

    /// Returns the next byte without consuming it.
    pub fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        self.peek_at(0)
    }

    /// Returns the byte `index` positions ahead without consuming anything.
    pub fn peek_at(&mut self, index: usize) -> io::Result<Option<u8>> {
        while self.lookahead.len() <= index {
            match self.read_byte()? {
                Some(byte) => self.lookahead.push_back(byte),
                None => return Ok(None),
            }
        }
        Ok(self.lookahead.get(index).copied())
    }

    /// Advances past the next start code whose header byte marks an SEI NAL unit.
    ///
    /// On success the stream is positioned right after the NAL header byte. Returns `None` once
    /// the byte stream is exhausted.
    pub fn next_sei_unit(&mut self) -> io::Result<Option<SeiUnit>> {
        /*
        The match window slides one byte at a time:

            [0x00, 0x00, 0x01, header]

        A run of more than two zeros still ends in a start code (the four-byte form
        0x00000001), so the zero count saturates instead of resetting. Every byte, header bytes
        included, is fed back into the zero count so a failed prefix can begin the next one.
         */
        let [_, _, prefix_end] = START_CODE_PREFIX;

        while let Some(byte) = self.next_byte()? {
            if self.zeros < 2 || byte != prefix_end {
                self.zeros = match byte {
                    0x00 => (self.zeros + 1).min(2),
                    _ => 0,
                };
                continue;
            }

            self.zeros = 0;
            let offset = self.offset;
            let Some(header_byte) = self.next_byte()? else {
                break;
            };

            self.nal_units += 1;
            let header = NalUnitHeader::from_byte(header_byte);

            if self.header_match.matches(header_byte) {
                debug!("found a SEI NAL unit at offset {offset} (header {header_byte:#04x})");
                if header.forbidden_zero_bit {
                    warn!("SEI NAL unit at offset {offset} has forbidden_zero_bit set");
                }
                return Ok(Some(SeiUnit { offset, header }));
            }

            trace!("skipping {} NAL unit at offset {offset}", header.kind());
            if header_byte == 0x00 {
                self.zeros = 1;
            }
        }

        Ok(None)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            let byte = match self.reader.fill_buf() {
                Ok(buf) => buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if byte.is_some() {
                self.reader.consume(1);
            }
            return Ok(byte);
        }
    }
}

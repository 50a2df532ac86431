use std::io::BufRead;

use common::{EmulationPrevention, EMULATION_PREVENTION_BYTE};

use crate::byte_stream::ByteStream;
use crate::errors::{DecodingError, SeiError};
use crate::sei::SeiMessage;

/// Upper bound on the payload buffer reserved up front. `payload_size` comes straight from the
/// stream, so anything past this grows as bytes actually arrive.
const MAX_PAYLOAD_PREALLOCATION: usize = 4096;

/// `rbsp_stop_one_bit` followed by the alignment zero bits, on its own byte.
const RBSP_TRAILING_BYTE: u8 = 0x80;

/// Reads `sei_message()`s out of a `ByteStream` positioned after an SEI NAL unit header.
///
/// Emulation prevention spans the whole NAL unit, so one extractor must read every message of a
/// unit: the escape state carries over from one message to the next.
pub struct PayloadExtractor<'a, R> {
    byte_stream: &'a mut ByteStream<R>,
    epb: EmulationPrevention,
}

impl<'a, R: BufRead> PayloadExtractor<'a, R> {
    pub fn new(byte_stream: &'a mut ByteStream<R>) -> Self {
        Self {
            byte_stream,
            epb: EmulationPrevention::new(),
        }
    }

    // ITU-T H.264, 04/2017, 7.3.2.3.1
    pub fn extract(&mut self) -> Result<SeiMessage, DecodingError> {
        let payload_type = self.read_ff_coded()?;
        let payload_size = self.read_ff_coded()?;

        let expected = payload_size as usize;
        let mut payload = Vec::with_capacity(expected.min(MAX_PAYLOAD_PREALLOCATION));

        while payload.len() < expected {
            let Some(byte) = self.next_rbsp_byte()? else {
                return Err(SeiError::TruncatedPayload {
                    payload_type,
                    expected: payload_size,
                    received: payload.len() as u32,
                }
                .into());
            };
            payload.push(byte);
        }

        Ok(SeiMessage {
            payload_type,
            payload_size,
            payload,
        })
    }

    /// Checks whether the SEI RBSP ends here, consuming the trailing byte if so.
    ///
    /// A `0x80` only ends the RBSP when the NAL unit ends right after it, at the end of the byte
    /// stream or at zero bytes leading into the next start code. Otherwise it is the
    /// `payload_type` of another message.
    pub fn at_rbsp_trailing_bits(&mut self) -> Result<bool, DecodingError> {
        let Some(first) = self.byte_stream.peek_byte()? else {
            return Ok(true);
        };

        let index = match self.epb.is_escape(first) {
            true => 1,
            false => 0,
        };

        let at_end = match self.byte_stream.peek_at(index)? {
            None => true,
            Some(RBSP_TRAILING_BYTE) => self.nal_unit_ends_at(index + 1)?,
            Some(_) => false,
        };

        if at_end {
            self.next_rbsp_byte()?;
        }
        Ok(at_end)
    }

    /// True when no NAL unit byte is left from `index` on: the stream ends, or two zero bytes
    /// follow that are not escaped.
    fn nal_unit_ends_at(&mut self, index: usize) -> Result<bool, DecodingError> {
        let ahead = [
            self.byte_stream.peek_at(index)?,
            self.byte_stream.peek_at(index + 1)?,
            self.byte_stream.peek_at(index + 2)?,
        ];

        Ok(match ahead {
            [None, _, _] => true,
            [Some(0x00), None, _] => true,
            [Some(0x00), Some(0x00), next] => next != Some(EMULATION_PREVENTION_BYTE),
            _ => false,
        })
    }

    /// The next byte of the RBSP, with emulation prevention removed.
    fn next_rbsp_byte(&mut self) -> Result<Option<u8>, DecodingError> {
        while let Some(byte) = self.byte_stream.next_byte()? {
            if let Some(byte) = self.epb.filter(byte) {
                return Ok(Some(byte));
            }
        }
        Ok(None)
    }

    /// `payload_type` and `payload_size` are sums of bytes, continued while each byte is 0xFF.
    fn read_ff_coded(&mut self) -> Result<u32, DecodingError> {
        let mut value = 0u32;
        loop {
            let byte = self.next_rbsp_byte()?.ok_or(SeiError::TruncatedHeader)?;

            value = value.saturating_add(byte as u32);
            if byte != 0xff {
                return Ok(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn extract(data: &[u8]) -> Result<SeiMessage, DecodingError> {
        let mut bs = ByteStream::new(data);
        PayloadExtractor::new(&mut bs).extract()
    }

    #[test]
    fn test_extract_frame_packing_payload() -> Result<(), DecodingError> {
        let message = extract(&hex!("2d 06 81 86 a8 48 d2 ae 80"))?;

        assert_eq!(message.payload_type, 45);
        assert_eq!(message.payload_size, 6);
        assert_eq!(message.payload, hex!("81 86 a8 48 d2 ae"));
        assert!(message.is_frame_packing_arrangement());
        Ok(())
    }

    #[test]
    fn test_ff_coded_type_and_size() -> Result<(), DecodingError> {
        let mut data = hex!("ff 2e ff 01").to_vec();
        data.extend(std::iter::repeat(0x11).take(256));

        let message = extract(&data)?;
        assert_eq!(message.payload_type, 255 + 46);
        assert_eq!(message.payload_size, 256);
        assert_eq!(message.payload.len(), 256);
        Ok(())
    }

    #[test]
    fn test_zero_size_payload() -> Result<(), DecodingError> {
        let message = extract(&hex!("05 00"))?;
        assert_eq!(message.payload_type, 5);
        assert!(message.payload.is_empty());
        Ok(())
    }

    #[test]
    fn test_removes_emulation_prevention() -> Result<(), DecodingError> {
        let message = extract(&hex!("05 03 00 00 03 00"))?;
        assert_eq!(message.payload, hex!("00 00 00"));

        let message = extract(&hex!("05 07 00 00 03 01 00 00 03 02 ff"))?;
        assert_eq!(message.payload, hex!("00 00 01 00 00 02 ff"));
        Ok(())
    }

    #[test]
    fn test_escaped_bytes_do_not_count_towards_size() -> Result<(), DecodingError> {
        let data = hex!("05 03 00 00 03 00 aa");
        let mut bs = ByteStream::new(&data[..]);
        let message = PayloadExtractor::new(&mut bs).extract()?;

        assert_eq!(message.payload, hex!("00 00 00"));
        assert_eq!(bs.next_byte()?, Some(0xaa));
        Ok(())
    }

    #[test]
    fn test_truncated_payload() {
        let err = extract(&hex!("2d 0a 01 02 03 04 05 06")).unwrap_err();
        assert!(matches!(
            err,
            DecodingError::SeiError(SeiError::TruncatedPayload {
                payload_type: 45,
                expected: 10,
                received: 6,
            })
        ));
    }

    #[test]
    fn test_truncated_payload_counts_output_bytes() {
        let err = extract(&hex!("2d 04 00 00 03 00")).unwrap_err();
        assert!(matches!(
            err,
            DecodingError::SeiError(SeiError::TruncatedPayload { received: 3, .. })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let cases: [&[u8]; 4] = [&[], &hex!("ff"), &hex!("2d"), &hex!("2d ff ff")];
        for data in cases {
            let err = extract(data).unwrap_err();
            assert!(matches!(
                err,
                DecodingError::SeiError(SeiError::TruncatedHeader)
            ));
        }
    }

    #[test]
    fn test_rbsp_trailing_bits() -> Result<(), DecodingError> {
        let data = hex!("05 01 aa 06 01 bb 80");
        let mut bs = ByteStream::new(&data[..]);
        let mut extractor = PayloadExtractor::new(&mut bs);

        extractor.extract()?;
        assert!(!extractor.at_rbsp_trailing_bits()?);
        assert!(!extractor.at_rbsp_trailing_bits()?);

        let message = extractor.extract()?;
        assert_eq!(message.payload_type, 6);
        assert!(extractor.at_rbsp_trailing_bits()?);
        assert_eq!(bs.next_byte()?, None);
        Ok(())
    }

    #[test]
    fn test_trailing_bits_before_start_code() -> Result<(), DecodingError> {
        let data = hex!("05 01 aa 80 00 00 01 06");
        let mut bs = ByteStream::new(&data[..]);
        let mut extractor = PayloadExtractor::new(&mut bs);

        extractor.extract()?;
        assert!(extractor.at_rbsp_trailing_bits()?);
        assert_eq!(bs.offset(), 4);
        assert_eq!(bs.next_sei_unit()?.map(|unit| unit.offset), Some(7));
        Ok(())
    }

    #[test]
    fn test_payload_type_128_is_not_trailing_bits() -> Result<(), DecodingError> {
        let data = hex!("05 01 aa 80 01 bb 80 00 00 00 01");
        let mut bs = ByteStream::new(&data[..]);
        let mut extractor = PayloadExtractor::new(&mut bs);

        extractor.extract()?;
        assert!(!extractor.at_rbsp_trailing_bits()?);

        let message = extractor.extract()?;
        assert_eq!(message.payload_type, 128);
        assert_eq!(message.payload, hex!("bb"));
        assert!(extractor.at_rbsp_trailing_bits()?);
        Ok(())
    }

    #[test]
    fn test_escaped_zeros_after_trailing_byte_continue_the_unit() -> Result<(), DecodingError> {
        // type 128 with an empty payload, then type 0 whose size follows an escape
        let data = hex!("80 00 00 03 01 aa 80");
        let mut bs = ByteStream::new(&data[..]);
        let mut extractor = PayloadExtractor::new(&mut bs);

        assert!(!extractor.at_rbsp_trailing_bits()?);
        let message = extractor.extract()?;
        assert_eq!((message.payload_type, message.payload_size), (128, 0));

        assert!(!extractor.at_rbsp_trailing_bits()?);
        let message = extractor.extract()?;
        assert_eq!((message.payload_type, message.payload_size), (0, 1));
        assert_eq!(message.payload, hex!("aa"));
        assert!(extractor.at_rbsp_trailing_bits()?);
        Ok(())
    }

    #[test]
    fn test_emulation_prevention_spans_messages() -> Result<(), DecodingError> {
        // the escape sits between the first payload's zero and the second payload_type
        let data = hex!("05 01 00 00 03 02 aa bb 80");
        let mut bs = ByteStream::new(&data[..]);
        let mut extractor = PayloadExtractor::new(&mut bs);

        let first = extractor.extract()?;
        assert_eq!(first.payload, hex!("00"));
        assert!(!extractor.at_rbsp_trailing_bits()?);

        let second = extractor.extract()?;
        assert_eq!(second.payload_type, 0);
        assert_eq!(second.payload_size, 2);
        assert_eq!(second.payload, hex!("aa bb"));
        assert!(extractor.at_rbsp_trailing_bits()?);
        Ok(())
    }

    #[test]
    fn test_escaped_trailing_byte() -> Result<(), DecodingError> {
        let data = hex!("05 02 00 00 03 80");
        let mut bs = ByteStream::new(&data[..]);
        let mut extractor = PayloadExtractor::new(&mut bs);

        extractor.extract()?;
        assert!(extractor.at_rbsp_trailing_bits()?);
        assert_eq!(bs.next_byte()?, None);
        Ok(())
    }
}

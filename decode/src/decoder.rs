use std::fs::File;
use std::io::BufRead;
use std::path::Path;

use log::{debug, info, warn};
use memmap::Mmap;

use crate::byte_stream::{ByteStream, HeaderMatch, SeiUnit};
use crate::errors::{DecodingError, SeiError};
use crate::frame_packing::decode_frame_packing;
use crate::payload::PayloadExtractor;
use crate::sei::{SeiMessage, SeiOutcome, SeiReport, SeiSink};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderOptions {
    pub header_match: HeaderMatch,

    /// Read every `sei_message()` in an SEI NAL unit instead of only the first one.
    pub all_messages: bool,
}

/// Counters for one pass over a byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub nal_units: u64,
    pub sei_units: u64,
    pub sei_messages: u64,
    pub frame_packing: u64,
    pub failures: u64,
}

/// A byte stream file mapped into memory. Empty files cannot be mapped and read as an empty
/// stream instead.
pub struct MappedFile {
    data: Option<Mmap>,
}

impl MappedFile {
    pub fn from_file(file: File) -> Result<Self, DecodingError> {
        if file.metadata()?.len() == 0 {
            return Ok(Self { data: None });
        }

        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { data: Some(mmap) })
    }

    pub fn from_file_path<P: AsRef<Path>>(file_path: P) -> Result<Self, DecodingError> {
        let file = File::open(file_path)?;
        MappedFile::from_file(file)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}

pub struct H264Decoder<R> {
    byte_stream: ByteStream<R>,
    options: DecoderOptions,
}

impl<R: BufRead> H264Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecoderOptions::default())
    }

    pub fn with_options(reader: R, options: DecoderOptions) -> Self {
        Self {
            byte_stream: ByteStream::with_header_match(reader, options.header_match),
            options,
        }
    }

    /// Scans the whole byte stream, handing one `SeiReport` per SEI message to `sink`.
    ///
    /// A malformed or truncated SEI message is reported and the scan resumes at the next start
    /// code. Only a failure to read the underlying byte stream stops the pass.
    pub fn decode<S: SeiSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<DecodeSummary, DecodingError> {
        let mut summary = DecodeSummary::default();

        while let Some(unit) = self.byte_stream.next_sei_unit()? {
            summary.sei_units += 1;
            self.decode_sei_unit(unit, sink, &mut summary)?;
        }

        summary.nal_units = self.byte_stream.nal_units_seen();
        info!(
            "scanned {} bytes: {} NAL units, {} SEI units, {} SEI messages, {} frame packing arrangements, {} failures",
            self.byte_stream.offset(),
            summary.nal_units,
            summary.sei_units,
            summary.sei_messages,
            summary.frame_packing,
            summary.failures,
        );

        Ok(summary)
    }

    fn decode_sei_unit<S: SeiSink + ?Sized>(
        &mut self,
        unit: SeiUnit,
        sink: &mut S,
        summary: &mut DecodeSummary,
    ) -> Result<(), DecodingError> {
        let mut extractor = PayloadExtractor::new(&mut self.byte_stream);

        loop {
            let message = match extractor.extract() {
                Ok(message) => message,
                Err(DecodingError::SeiError(error)) => {
                    warn!("skipping SEI NAL unit at offset {}: {error}", unit.offset);
                    summary.failures += 1;
                    sink.report(SeiReport {
                        unit,
                        outcome: SeiOutcome::Failed(error),
                    });
                    return Ok(());
                }
                Err(error) => return Err(error),
            };

            summary.sei_messages += 1;
            report_message(unit, &message, sink, summary);

            if !self.options.all_messages || extractor.at_rbsp_trailing_bits()? {
                return Ok(());
            }
        }
    }
}

fn report_message<S: SeiSink + ?Sized>(
    unit: SeiUnit,
    message: &SeiMessage,
    sink: &mut S,
    summary: &mut DecodeSummary,
) {
    debug!(
        "SEI message at offset {}: payload_type = {}, payload_size = {}",
        unit.offset, message.payload_type, message.payload_size
    );

    if !message.is_frame_packing_arrangement() {
        sink.report(SeiReport {
            unit,
            outcome: SeiOutcome::Undecoded(message),
        });
        return;
    }

    let outcome = match decode_frame_packing(&message.payload) {
        Ok((arrangement, trailer)) => {
            summary.frame_packing += 1;
            SeiOutcome::FramePacking {
                message,
                arrangement,
                trailer,
            }
        }
        Err(malformed) => {
            warn!("SEI NAL unit at offset {}: {malformed}", unit.offset);
            summary.failures += 1;
            SeiOutcome::Failed(SeiError::MalformedSeiPayload(malformed))
        }
    };

    sink.report(SeiReport { unit, outcome });
}

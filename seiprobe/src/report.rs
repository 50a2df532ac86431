use std::io::{self, Write};

use decode::{DecodeSummary, SeiError, SeiOutcome, SeiReport, SeiSink};

/// Renders `SeiReport`s as `name = value` lines.
///
/// Write errors are accumulated: after the first one nothing more is written, and `finish`
/// hands it back.
pub struct TextReport<W: Write> {
    out: W,
    err: Option<io::Error>,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out, err: None }
    }

    pub fn summary(&mut self, summary: &DecodeSummary) {
        self.record(|out| {
            writeln!(
                out,
                "{} NAL units, {} SEI units, {} SEI messages, {} frame packing arrangements, {} failures",
                summary.nal_units,
                summary.sei_units,
                summary.sei_messages,
                summary.frame_packing,
                summary.failures
            )
        });
    }

    /// Flushes the output and returns the first write error, if any.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.err.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn record(&mut self, f: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.err.is_some() {
            return;
        }
        if let Err(e) = f(&mut self.out) {
            self.err = Some(e);
        }
    }
}

impl<W: Write> SeiSink for TextReport<W> {
    fn report(&mut self, report: SeiReport<'_>) {
        self.record(|out| write_report(out, report));
    }
}

fn write_report<W: Write>(out: &mut W, report: SeiReport<'_>) -> io::Result<()> {
    writeln!(
        out,
        "found a SEI NAL unit at offset {} (nal_ref_idc = {})",
        report.unit.offset, report.unit.header.nal_ref_idc
    )?;

    match report.outcome {
        SeiOutcome::FramePacking {
            message,
            arrangement,
            trailer,
        } => {
            writeln!(out, "payload_type = {}", message.payload_type)?;
            writeln!(out, "payload_size = {}", message.payload_size)?;
            for (name, value) in arrangement.syntax_elements() {
                writeln!(out, "{name} = {value}")?;
            }

            // a space closes every byte of the payload
            write!(out, "rbsp trailer: ")?;
            let mut position = trailer.position();
            for bit in trailer {
                write!(out, "{}", bit as u8)?;
                position += 1;
                if position % 8 == 0 {
                    write!(out, " ")?;
                }
            }
            writeln!(out)?;

            match &arrangement.details {
                Some(details) => writeln!(
                    out,
                    "=> {}, {}",
                    details.packing_type(),
                    details.content_interpretation()
                )?,
                None => writeln!(
                    out,
                    "=> arrangement {} cancelled",
                    arrangement.id
                )?,
            }
        }
        SeiOutcome::Undecoded(message) => {
            writeln!(out, "payload_type = {}", message.payload_type)?;
            writeln!(out, "payload_size = {}", message.payload_size)?;
            writeln!(out, "=> not a frame packing arrangement, skipped")?;
        }
        SeiOutcome::Failed(SeiError::MalformedSeiPayload(malformed)) => {
            writeln!(out, "payload_type = {}", decode::SEI_PAYLOAD_TYPE_FRAME_PACKING_ARRANGEMENT)?;
            writeln!(out, "payload_size = {}", malformed.payload_size)?;
            for (name, value) in &malformed.decoded {
                writeln!(out, "{name} = {value}")?;
            }
            writeln!(out, "error: {malformed}: {}", malformed.source)?;
        }
        SeiOutcome::Failed(SeiError::TruncatedPayload {
            payload_type,
            expected,
            received,
        }) => {
            writeln!(out, "payload_type = {payload_type}")?;
            writeln!(out, "payload_size = {expected}")?;
            writeln!(
                out,
                "error: EOF reached while reading SEI payload ({received} of {expected} bytes)"
            )?;
        }
        SeiOutcome::Failed(error @ SeiError::TruncatedHeader) => {
            writeln!(out, "error: {error}")?;
        }
    }

    Ok(())
}

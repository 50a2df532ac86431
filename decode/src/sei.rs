use crate::byte_stream::SeiUnit;
use crate::errors::SeiError;
use crate::frame_packing::{FramePackingArrangement, TrailerBits};

// ITU-T H.264, Annex D, D.1
pub const SEI_PAYLOAD_TYPE_FRAME_PACKING_ARRANGEMENT: u32 = 45;

/// One `sei_message()` with its payload already free of emulation prevention bytes.
///
/// `payload.len() == payload_size as usize` always holds; messages cut short by the end of the
/// byte stream are reported as `SeiError::TruncatedPayload` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeiMessage {
    pub payload_type: u32,
    pub payload_size: u32,
    pub payload: Vec<u8>,
}

impl SeiMessage {
    pub fn is_frame_packing_arrangement(&self) -> bool {
        self.payload_type == SEI_PAYLOAD_TYPE_FRAME_PACKING_ARRANGEMENT
    }
}

#[derive(Debug)]
pub enum SeiOutcome<'a> {
    /// A decoded frame packing arrangement. `trailer` yields the bits left after
    /// `frame_packing_arrangement_extension_flag`, once.
    FramePacking {
        message: &'a SeiMessage,
        arrangement: FramePackingArrangement,
        trailer: TrailerBits<'a>,
    },

    /// Extracted so the scan stays aligned, but not a frame packing arrangement.
    Undecoded(&'a SeiMessage),

    Failed(SeiError),
}

#[derive(Debug)]
pub struct SeiReport<'a> {
    pub unit: SeiUnit,
    pub outcome: SeiOutcome<'a>,
}

/// Receives one `SeiReport` per SEI message, in stream order.
pub trait SeiSink {
    fn report(&mut self, report: SeiReport<'_>);
}

impl<F> SeiSink for F
where
    F: FnMut(SeiReport<'_>),
{
    fn report(&mut self, report: SeiReport<'_>) {
        self(report)
    }
}

use std::fmt;

use crate::nal_unit::EMULATION_PREVENTION_BYTE;

/// Definitions of `RBSP` pulled from Table 7-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitKind {
    Unspecified,
    CodedSliceNonIDRPicture,
    CodedSliceDataPartitionA,
    CodedSliceDataPartitionB,
    CodedSliceDataPartitionC,
    CodedSliceIDRPicture,
    SupplementalEnhancementInformation,
    SequenceParameterSet,
    PictureParameterSet,
    AccessUnitDelimiter,
    SequenceEnd,
    StreamEnd,
    FillerData,
    SequenceParameterSetExtension,
    PrefixNALUnit,
    SubsetSequenceParameterSet,
    DepthParameterSet,
    Reserved,
    CodedSliceAuxiliaryCodedPictureNonPartitioning,
    CodedSliceExtension,
    CodedSliceExtensionDepthViewComponent,
}

impl NalUnitKind {
    /// Only the low five bits of `nal_unit_type` are considered.
    pub fn from_nal_unit_type(nal_unit_type: u8) -> Self {
        match nal_unit_type & 0x1f {
            1 => NalUnitKind::CodedSliceNonIDRPicture,
            2 => NalUnitKind::CodedSliceDataPartitionA,
            3 => NalUnitKind::CodedSliceDataPartitionB,
            4 => NalUnitKind::CodedSliceDataPartitionC,
            5 => NalUnitKind::CodedSliceIDRPicture,
            6 => NalUnitKind::SupplementalEnhancementInformation,
            7 => NalUnitKind::SequenceParameterSet,
            8 => NalUnitKind::PictureParameterSet,
            9 => NalUnitKind::AccessUnitDelimiter,
            10 => NalUnitKind::SequenceEnd,
            11 => NalUnitKind::StreamEnd,
            12 => NalUnitKind::FillerData,
            13 => NalUnitKind::SequenceParameterSetExtension,
            14 => NalUnitKind::PrefixNALUnit,
            15 => NalUnitKind::SubsetSequenceParameterSet,
            16 => NalUnitKind::DepthParameterSet,
            17 | 18 | 22 | 23 => NalUnitKind::Reserved,
            19 => NalUnitKind::CodedSliceAuxiliaryCodedPictureNonPartitioning,
            20 => NalUnitKind::CodedSliceExtension,
            21 => NalUnitKind::CodedSliceExtensionDepthViewComponent,
            _ => NalUnitKind::Unspecified,
        }
    }
}

impl fmt::Display for NalUnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NalUnitKind::Unspecified => "unspecified",
            NalUnitKind::CodedSliceNonIDRPicture => "coded slice of a non-IDR picture",
            NalUnitKind::CodedSliceDataPartitionA => "coded slice data partition A",
            NalUnitKind::CodedSliceDataPartitionB => "coded slice data partition B",
            NalUnitKind::CodedSliceDataPartitionC => "coded slice data partition C",
            NalUnitKind::CodedSliceIDRPicture => "coded slice of an IDR picture",
            NalUnitKind::SupplementalEnhancementInformation => "SEI",
            NalUnitKind::SequenceParameterSet => "sequence parameter set",
            NalUnitKind::PictureParameterSet => "picture parameter set",
            NalUnitKind::AccessUnitDelimiter => "access unit delimiter",
            NalUnitKind::SequenceEnd => "end of sequence",
            NalUnitKind::StreamEnd => "end of stream",
            NalUnitKind::FillerData => "filler data",
            NalUnitKind::SequenceParameterSetExtension => "sequence parameter set extension",
            NalUnitKind::PrefixNALUnit => "prefix NAL unit",
            NalUnitKind::SubsetSequenceParameterSet => "subset sequence parameter set",
            NalUnitKind::DepthParameterSet => "depth parameter set",
            NalUnitKind::Reserved => "reserved",
            NalUnitKind::CodedSliceAuxiliaryCodedPictureNonPartitioning => {
                "coded slice of an auxiliary coded picture"
            }
            NalUnitKind::CodedSliceExtension => "coded slice extension",
            NalUnitKind::CodedSliceExtensionDepthViewComponent => {
                "coded slice extension for a depth view component"
            }
        };
        f.write_str(name)
    }
}

/// Streaming removal of `EMULATION_PREVENTION_BYTE`s.
///
/// The only state is the number of `0x00` bytes emitted since the last removed byte, capped at
/// two. A `0x03` arriving while that count is two is dropped and the count starts over, so
/// `00 00 03 00 03` yields `00 00 00 03`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmulationPrevention {
    zeros: u8,
}

impl EmulationPrevention {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `filter` would drop `byte` in the current state.
    pub fn is_escape(&self, byte: u8) -> bool {
        self.zeros >= 2 && byte == EMULATION_PREVENTION_BYTE
    }

    /// Returns the byte to emit, or `None` when `byte` is an emulation prevention byte.
    pub fn filter(&mut self, byte: u8) -> Option<u8> {
        if self.is_escape(byte) {
            self.zeros = 0;
            return None;
        }

        self.zeros = match byte {
            0x00 => (self.zeros + 1).min(2),
            _ => 0,
        };

        Some(byte)
    }
}

use crate::rbsp::NalUnitKind;

/// A unique sequence of three bytes equal to `0x000001` embedded in the byte stream as a prefix
/// to each `NalUnit`. The location of a `START_CODE_PREFIX` can be used by a decoder to identify
/// the beginning of a new NAL unit and the end of a previous NAL unit. Emulation of start code
/// prefixes is prevented within NAL units by the inclusion of `EMULATION_PREVENTION_BYTE`s.
pub const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

/// A byte equal to 0x03 that may be present within a NAL unit.
/// The presence of this byte ensures no sequence of consecutive byte-aligned bytes in the
/// NAL unit contains a `START_CODE_PREFIX`.
pub const EMULATION_PREVENTION_BYTE: u8 = 0x03;

/// The first byte of each NAL unit contains its type. Mask it with this to get `nal_unit_type`.
pub const NAL_UNIT_TYPE_MASK: u8 = 0x1f;

pub const NAL_UNIT_TYPE_SEI: u8 = 6;

/// The one-byte header that follows every `START_CODE_PREFIX`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NalUnitHeader {
    /// `forbidden_zero_bit` shall be equal to 0.
    pub forbidden_zero_bit: bool,

    /// `nal_ref_idc` not equal to 0 specifies that the content of the NAL unit contains a
    /// parameter set or a slice (or slice data partition) of a reference picture.
    ///
    /// `nal_ref_idc` shall be equal to 0 for all NAL units having `nal_unit_type` equal to
    /// 6, 9, 10, 11, or 12. Encoders in the wild do not always honour this for SEI.
    pub nal_ref_idc: u8,

    /// `nal_unit_type` specifies the type of `RBSP` data structure contained in the NAL unit.
    pub nal_unit_type: u8,
}

impl NalUnitHeader {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            forbidden_zero_bit: byte >> 7 != 0,
            nal_ref_idc: (byte >> 5) & 0b11,
            nal_unit_type: byte & NAL_UNIT_TYPE_MASK,
        }
    }

    pub fn kind(&self) -> NalUnitKind {
        NalUnitKind::from_nal_unit_type(self.nal_unit_type)
    }

    pub fn is_sei(&self) -> bool {
        self.nal_unit_type == NAL_UNIT_TYPE_SEI
    }
}

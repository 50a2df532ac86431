use std::fmt;

use common::{BitCursor, BitCursorError};

use crate::errors::MalformedSeiPayload;

/// `frame_packing_arrangement_type` of a temporal interleaving arrangement, which carries no
/// grid positions.
pub const FRAME_PACKING_TYPE_FRAME_ALTERNATION: u8 = 5;

// ITU-T H.264, 04/2017, D.1.25
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePackingArrangement {
    pub id: u64,
    pub cancel_flag: bool,
    /// Present when `cancel_flag` is unset.
    pub details: Option<FramePackingDetails>,
    pub extension_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePackingDetails {
    pub arrangement_type: u8,
    pub quincunx_sampling_flag: bool,
    pub content_interpretation_type: u8,
    pub spatial_flipping_flag: bool,
    pub frame0_flipped_flag: bool,
    pub field_views_flag: bool,
    pub current_frame_is_frame0_flag: bool,
    pub frame0_self_contained_flag: bool,
    pub frame1_self_contained_flag: bool,
    // if( !quincunx_sampling_flag && frame_packing_arrangement_type != 5 )
    pub grid_positions: Option<GridPositions>,
    pub reserved_byte: u8,
    pub repetition_period: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPositions {
    pub frame0_x: u8,
    pub frame0_y: u8,
    pub frame1_x: u8,
    pub frame1_y: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePackingType {
    Checkerboard,
    ColumnInterleaving,
    RowInterleaving,
    SideBySide,
    TopBottom,
    FrameAlternation,
    TwoD,
    TileFormat,
    Reserved(u8),
}

impl From<u8> for FramePackingType {
    fn from(value: u8) -> Self {
        match value {
            0 => FramePackingType::Checkerboard,
            1 => FramePackingType::ColumnInterleaving,
            2 => FramePackingType::RowInterleaving,
            3 => FramePackingType::SideBySide,
            4 => FramePackingType::TopBottom,
            FRAME_PACKING_TYPE_FRAME_ALTERNATION => FramePackingType::FrameAlternation,
            6 => FramePackingType::TwoD,
            7 => FramePackingType::TileFormat,
            v => FramePackingType::Reserved(v),
        }
    }
}

impl fmt::Display for FramePackingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramePackingType::Checkerboard => f.write_str("checkerboard"),
            FramePackingType::ColumnInterleaving => f.write_str("column interleaving"),
            FramePackingType::RowInterleaving => f.write_str("row interleaving"),
            FramePackingType::SideBySide => f.write_str("side-by-side"),
            FramePackingType::TopBottom => f.write_str("top-bottom"),
            FramePackingType::FrameAlternation => f.write_str("frame alternation"),
            FramePackingType::TwoD => f.write_str("2D"),
            FramePackingType::TileFormat => f.write_str("tile format"),
            FramePackingType::Reserved(v) => write!(f, "reserved ({v})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentInterpretation {
    Unspecified,
    Frame0IsLeftView,
    Frame0IsRightView,
    Reserved(u8),
}

impl From<u8> for ContentInterpretation {
    fn from(value: u8) -> Self {
        match value {
            0 => ContentInterpretation::Unspecified,
            1 => ContentInterpretation::Frame0IsLeftView,
            2 => ContentInterpretation::Frame0IsRightView,
            v => ContentInterpretation::Reserved(v),
        }
    }
}

impl fmt::Display for ContentInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentInterpretation::Unspecified => f.write_str("unspecified"),
            ContentInterpretation::Frame0IsLeftView => f.write_str("frame 0 is the left view"),
            ContentInterpretation::Frame0IsRightView => f.write_str("frame 0 is the right view"),
            ContentInterpretation::Reserved(v) => write!(f, "reserved ({v})"),
        }
    }
}

impl FramePackingDetails {
    pub fn packing_type(&self) -> FramePackingType {
        FramePackingType::from(self.arrangement_type)
    }

    pub fn content_interpretation(&self) -> ContentInterpretation {
        ContentInterpretation::from(self.content_interpretation_type)
    }
}

impl FramePackingArrangement {
    /// The decoded syntax elements as `(name, value)` pairs, in bitstream order.
    pub fn syntax_elements(&self) -> Vec<(&'static str, u64)> {
        let mut elements = vec![
            ("frame_packing_arrangement_id", self.id),
            (
                "frame_packing_arrangement_cancel_flag",
                self.cancel_flag as u64,
            ),
        ];

        if let Some(d) = &self.details {
            elements.extend([
                ("frame_packing_arrangement_type", d.arrangement_type as u64),
                ("quincunx_sampling_flag", d.quincunx_sampling_flag as u64),
                (
                    "content_interpretation_type",
                    d.content_interpretation_type as u64,
                ),
                ("spatial_flipping_flag", d.spatial_flipping_flag as u64),
                ("frame0_flipped_flag", d.frame0_flipped_flag as u64),
                ("field_views_flag", d.field_views_flag as u64),
                (
                    "current_frame_is_frame0_flag",
                    d.current_frame_is_frame0_flag as u64,
                ),
                (
                    "frame0_self_contained_flag",
                    d.frame0_self_contained_flag as u64,
                ),
                (
                    "frame1_self_contained_flag",
                    d.frame1_self_contained_flag as u64,
                ),
            ]);
            if let Some(g) = d.grid_positions {
                elements.extend([
                    ("frame0_grid_position_x", g.frame0_x as u64),
                    ("frame0_grid_position_y", g.frame0_y as u64),
                    ("frame1_grid_position_x", g.frame1_x as u64),
                    ("frame1_grid_position_y", g.frame1_y as u64),
                ]);
            }
            elements.extend([
                (
                    "frame_packing_arrangement_reserved_byte",
                    d.reserved_byte as u64,
                ),
                (
                    "frame_packing_arrangement_repetition_period",
                    d.repetition_period,
                ),
            ]);
        }

        elements.push((
            "frame_packing_arrangement_extension_flag",
            self.extension_flag as u64,
        ));
        elements
    }
}

/// The bits of a payload after `frame_packing_arrangement_extension_flag`, reported verbatim.
///
/// Normally this is the payload's `bit_equal_to_one` followed by zero bits up to the byte
/// boundary. The iterator is finite and cannot be rewound.
#[derive(Debug)]
pub struct TrailerBits<'a> {
    cursor: BitCursor<'a>,
}

impl<'a> TrailerBits<'a> {
    /// Bit offset into the payload of the next trailer bit.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }
}

impl<'a> Iterator for TrailerBits<'a> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.read_bit().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cursor.bits_remaining();
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for TrailerBits<'a> {}

/// Reads syntax elements while keeping a record of every element read, so a failure can still
/// report what was decoded before it.
struct FieldReader<'a> {
    cursor: BitCursor<'a>,
    decoded: Vec<(&'static str, u64)>,
}

impl<'a> FieldReader<'a> {
    fn flag(&mut self, name: &'static str) -> Result<bool, BitCursorError> {
        let value = self.cursor.read_bit()?;
        self.decoded.push((name, value as u64));
        Ok(value)
    }

    fn unsigned(&mut self, name: &'static str, width: u32) -> Result<u8, BitCursorError> {
        let value = self.cursor.read_unsigned(width)?;
        self.decoded.push((name, value as u64));
        Ok(value as u8)
    }

    fn exp_golomb(&mut self, name: &'static str) -> Result<u64, BitCursorError> {
        let value = self.cursor.read_exp_golomb()?;
        self.decoded.push((name, value));
        Ok(value)
    }

    fn arrangement(&mut self) -> Result<FramePackingArrangement, BitCursorError> {
        let id = self.exp_golomb("frame_packing_arrangement_id")?;
        let cancel_flag = self.flag("frame_packing_arrangement_cancel_flag")?;

        let details = match cancel_flag {
            true => None,
            false => Some(self.details()?),
        };

        let extension_flag = self.flag("frame_packing_arrangement_extension_flag")?;

        Ok(FramePackingArrangement {
            id,
            cancel_flag,
            details,
            extension_flag,
        })
    }

    fn details(&mut self) -> Result<FramePackingDetails, BitCursorError> {
        let arrangement_type = self.unsigned("frame_packing_arrangement_type", 7)?;
        let quincunx_sampling_flag = self.flag("quincunx_sampling_flag")?;
        let content_interpretation_type = self.unsigned("content_interpretation_type", 6)?;
        let spatial_flipping_flag = self.flag("spatial_flipping_flag")?;
        let frame0_flipped_flag = self.flag("frame0_flipped_flag")?;
        let field_views_flag = self.flag("field_views_flag")?;
        let current_frame_is_frame0_flag = self.flag("current_frame_is_frame0_flag")?;
        let frame0_self_contained_flag = self.flag("frame0_self_contained_flag")?;
        let frame1_self_contained_flag = self.flag("frame1_self_contained_flag")?;

        let grid_positions = match !quincunx_sampling_flag
            && arrangement_type != FRAME_PACKING_TYPE_FRAME_ALTERNATION
        {
            true => Some(GridPositions {
                frame0_x: self.unsigned("frame0_grid_position_x", 4)?,
                frame0_y: self.unsigned("frame0_grid_position_y", 4)?,
                frame1_x: self.unsigned("frame1_grid_position_x", 4)?,
                frame1_y: self.unsigned("frame1_grid_position_y", 4)?,
            }),
            false => None,
        };

        let reserved_byte = self.unsigned("frame_packing_arrangement_reserved_byte", 8)?;
        let repetition_period = self.exp_golomb("frame_packing_arrangement_repetition_period")?;

        Ok(FramePackingDetails {
            arrangement_type,
            quincunx_sampling_flag,
            content_interpretation_type,
            spatial_flipping_flag,
            frame0_flipped_flag,
            field_views_flag,
            current_frame_is_frame0_flag,
            frame0_self_contained_flag,
            frame1_self_contained_flag,
            grid_positions,
            reserved_byte,
            repetition_period,
        })
    }
}

/// Decodes a `frame_packing_arrangement()` SEI payload.
///
/// `payload` must be exactly `payload_size` bytes with emulation prevention already removed.
pub fn decode_frame_packing(
    payload: &[u8],
) -> Result<(FramePackingArrangement, TrailerBits<'_>), MalformedSeiPayload> {
    let mut fields = FieldReader {
        cursor: BitCursor::new(payload),
        decoded: vec![],
    };

    match fields.arrangement() {
        Ok(arrangement) => Ok((
            arrangement,
            TrailerBits {
                cursor: fields.cursor,
            },
        )),
        Err(source) => Err(MalformedSeiPayload {
            payload_size: payload.len() as u32,
            decoded: fields.decoded,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_side_by_side_with_grid() -> Result<(), MalformedSeiPayload> {
        // id=0, cancel=0, type=3, quincunx=0, content=6, flags 1 0 1 0 1 0,
        // grid (1, 2, 3, 4), reserved=0xab, repetition=0, extension=0
        let payload = hex!("81 86 a8 48 d2 ae");
        let (arrangement, trailer) = decode_frame_packing(&payload)?;

        assert_eq!(
            arrangement,
            FramePackingArrangement {
                id: 0,
                cancel_flag: false,
                details: Some(FramePackingDetails {
                    arrangement_type: 3,
                    quincunx_sampling_flag: false,
                    content_interpretation_type: 6,
                    spatial_flipping_flag: true,
                    frame0_flipped_flag: false,
                    field_views_flag: true,
                    current_frame_is_frame0_flag: false,
                    frame0_self_contained_flag: true,
                    frame1_self_contained_flag: false,
                    grid_positions: Some(GridPositions {
                        frame0_x: 1,
                        frame0_y: 2,
                        frame1_x: 3,
                        frame1_y: 4,
                    }),
                    reserved_byte: 0xab,
                    repetition_period: 0,
                }),
                extension_flag: false,
            }
        );
        assert_eq!(trailer.len(), 0);
        assert_eq!(trailer.count(), 0);
        Ok(())
    }

    #[test]
    fn test_frame_alternation_has_no_grid() -> Result<(), MalformedSeiPayload> {
        // id=0, cancel=0, type=5, quincunx=0, content=1, flags all 0, reserved=0,
        // repetition=1, extension=0, then `1 00000`
        let payload = hex!("82 81 00 01 20");
        let (arrangement, trailer) = decode_frame_packing(&payload)?;

        let details = arrangement.details.as_ref().expect("details");
        assert_eq!(details.packing_type(), FramePackingType::FrameAlternation);
        assert_eq!(
            details.content_interpretation(),
            ContentInterpretation::Frame0IsLeftView
        );
        assert_eq!(details.grid_positions, None);
        assert_eq!(details.reserved_byte, 0);
        assert_eq!(details.repetition_period, 1);
        assert!(!arrangement.extension_flag);
        assert_eq!(
            trailer.collect::<Vec<_>>(),
            vec![true, false, false, false, false, false]
        );
        Ok(())
    }

    #[test]
    fn test_quincunx_has_no_grid() -> Result<(), MalformedSeiPayload> {
        // id=2, cancel=0, type=0, quincunx=1, content=2, flags all 0, reserved=0,
        // repetition=0, extension=1, then `1 00000`
        let payload = hex!("60 10 80 00 e0");
        let (arrangement, trailer) = decode_frame_packing(&payload)?;

        assert_eq!(arrangement.id, 2);
        let details = arrangement.details.as_ref().expect("details");
        assert_eq!(details.packing_type(), FramePackingType::Checkerboard);
        assert!(details.quincunx_sampling_flag);
        assert_eq!(
            details.content_interpretation(),
            ContentInterpretation::Frame0IsRightView
        );
        assert_eq!(details.grid_positions, None);
        assert!(arrangement.extension_flag);
        assert_eq!(trailer.len(), 6);
        Ok(())
    }

    #[test]
    fn test_cancelled_arrangement() -> Result<(), MalformedSeiPayload> {
        // id=0, cancel=1, extension=0, then `1 0000`
        let payload = hex!("d0");
        let (arrangement, trailer) = decode_frame_packing(&payload)?;

        assert_eq!(
            arrangement,
            FramePackingArrangement {
                id: 0,
                cancel_flag: true,
                details: None,
                extension_flag: false,
            }
        );
        assert_eq!(trailer.position(), 3);
        assert_eq!(
            trailer.collect::<Vec<_>>(),
            vec![true, false, false, false, false]
        );
        Ok(())
    }

    #[test]
    fn test_syntax_elements_follow_bitstream_order() -> Result<(), MalformedSeiPayload> {
        let payload = hex!("81 86 a8 48 d2 ae");
        let (arrangement, _) = decode_frame_packing(&payload)?;

        let elements = arrangement.syntax_elements();
        assert_eq!(elements.len(), 18);
        assert_eq!(elements[0], ("frame_packing_arrangement_id", 0));
        assert_eq!(elements[2], ("frame_packing_arrangement_type", 3));
        assert_eq!(elements[11], ("frame0_grid_position_x", 1));
        assert_eq!(
            elements[16],
            ("frame_packing_arrangement_repetition_period", 0)
        );
        assert_eq!(
            elements[17],
            ("frame_packing_arrangement_extension_flag", 0)
        );

        let (cancelled, _) = decode_frame_packing(&hex!("d0"))?;
        assert_eq!(cancelled.syntax_elements().len(), 3);
        Ok(())
    }

    #[test]
    fn test_truncated_payload_keeps_partial_fields() {
        // the grid positions and everything after them are missing
        let payload = hex!("81 86 a8");
        let err = decode_frame_packing(&payload).unwrap_err();

        assert_eq!(err.payload_size, 3);
        assert!(matches!(err.source, BitCursorError::OutOfRange { .. }));
        assert_eq!(err.decoded.len(), 11);
        assert_eq!(err.decoded[2], ("frame_packing_arrangement_type", 3));
        assert_eq!(err.decoded[4], ("content_interpretation_type", 6));
        assert_eq!(err.decoded[10], ("frame1_self_contained_flag", 0));

        // the record matches what a complete payload decodes to, up to the failure
        let (full, _) = decode_frame_packing(&hex!("81 86 a8 48 d2 ae")).unwrap();
        assert_eq!(&err.decoded[..], &full.syntax_elements()[..11]);
    }

    #[test]
    fn test_empty_payload() {
        let err = decode_frame_packing(&[]).unwrap_err();
        assert!(err.decoded.is_empty());
        assert_eq!(
            err.source,
            BitCursorError::OutOfRange {
                position: 0,
                len: 0
            }
        );
    }

    #[test]
    fn test_corrupt_exp_golomb_id() {
        let payload = [0u8; 5];
        let err = decode_frame_packing(&payload).unwrap_err();
        assert!(err.decoded.is_empty());
        assert_eq!(
            err.source,
            BitCursorError::MalformedGolombCode { leading_zeros: 32 }
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(FramePackingType::from(3).to_string(), "side-by-side");
        assert_eq!(FramePackingType::from(4), FramePackingType::TopBottom);
        assert_eq!(FramePackingType::from(9), FramePackingType::Reserved(9));
        assert_eq!(ContentInterpretation::from(0), ContentInterpretation::Unspecified);
        assert_eq!(
            ContentInterpretation::from(7).to_string(),
            "reserved (7)"
        );
    }
}

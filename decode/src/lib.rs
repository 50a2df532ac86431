pub mod byte_stream;
pub mod decoder;
pub mod errors;
pub mod frame_packing;
pub mod payload;
pub mod sei;

pub use byte_stream::{ByteStream, HeaderMatch, SeiUnit};
pub use decoder::{DecodeSummary, DecoderOptions, H264Decoder, MappedFile};
pub use errors::{DecodingError, MalformedSeiPayload, SeiError};
pub use frame_packing::{
    decode_frame_packing, ContentInterpretation, FramePackingArrangement, FramePackingDetails,
    FramePackingType, GridPositions, TrailerBits,
};
pub use payload::PayloadExtractor;
pub use sei::{
    SeiMessage, SeiOutcome, SeiReport, SeiSink, SEI_PAYLOAD_TYPE_FRAME_PACKING_ARRANGEMENT,
};

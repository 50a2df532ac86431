use std::io;

use common::BitCursorError;
use thiserror::Error;

/// Failures local to one SEI message. The scan reports them and moves on to the next start code.
#[derive(Error, Debug)]
pub enum SeiError {
    #[error("byte stream ended inside the SEI payload type or payload size")]
    TruncatedHeader,

    #[error("byte stream ended after {received} of {expected} payload bytes (payload type {payload_type})")]
    TruncatedPayload {
        payload_type: u32,
        expected: u32,
        received: u32,
    },

    #[error(transparent)]
    MalformedSeiPayload(#[from] MalformedSeiPayload),
}

/// A frame packing arrangement payload that ran out of bits or held a corrupt exp-golomb code.
///
/// `decoded` lists the syntax elements read before the failure, in bitstream order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed frame packing arrangement payload of {payload_size} bytes after {} fields", .decoded.len())]
pub struct MalformedSeiPayload {
    pub payload_size: u32,
    pub decoded: Vec<(&'static str, u64)>,
    #[source]
    pub source: BitCursorError,
}

#[derive(Error, Debug)]
pub enum DecodingError {
    #[error("An error occurred when opening or reading the byte stream")]
    FileError(#[from] io::Error),

    #[error("An error occurred decoding a SEI NAL unit")]
    SeiError(#[from] SeiError),
}

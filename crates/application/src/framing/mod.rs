mod frame_extractor;

pub use frame_extractor::{
    encode_frame, ExtractState, FrameExtractor, Frames, LENGTH_PREFIX_LEN, MAX_FRAME_LEN,
};

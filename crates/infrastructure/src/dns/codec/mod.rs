mod hickory_codec;
mod message_builder;

pub use hickory_codec::HickoryCodec;
pub use message_builder::MessageBuilder;

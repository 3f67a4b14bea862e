//! DSP stages: packet formatting, channelization, and the per-channel
//! filter/demod/resample/pack chain (spec §4.2-4.4).

pub mod channelizer;
pub mod demod;
pub mod filters;
pub mod packet_formatter;
pub mod pcm;
pub mod resample;

pub use channelizer::{Channelizer, ChannelizedFrame};
pub use packet_formatter::{IqFrame, PacketFormatter};
pub use pcm::{PcmChunk, PcmPacker};

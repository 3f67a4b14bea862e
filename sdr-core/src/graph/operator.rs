//! The small `{setup, initialize, compute}` interface every pipeline stage
//! implements, generalized from the teacher's single-threaded node-graph
//! `Node` trait to typed, in-process ports rather than JSON-serialized
//! WASM boundary values (spec §4.7, REDESIGN FLAGS).

use crate::channel_chain::ChannelChain;
use crate::dsp::{ChannelizedFrame, Channelizer, IqFrame, PacketFormatter};
use crate::ingest::{Burst, BurstReader};

/// One stage of the fan-out graph. Unlike the teacher's dynamically-typed
/// node trait, `Input`/`Output` are concrete associated types: the graph's
/// shape is static and known at build time (spec §4.7), so there is no
/// runtime port-compatibility check to perform.
pub trait Operator: Send {
    type Input;
    type Output;

    /// One-time resource acquisition (sockets, filter design). Most
    /// operators perform this in their constructor instead; the hook
    /// exists for symmetry with the teacher's node lifecycle.
    fn setup(&mut self) {}

    /// Called once the upstream sample rate is known.
    fn initialize(&mut self, _sample_rate_hz: f64) {}

    fn compute(&mut self, input: Self::Input) -> Option<Self::Output>;
}

impl Operator for BurstReader {
    type Input = ();
    type Output = Burst;

    fn compute(&mut self, _input: ()) -> Option<Burst> {
        BurstReader::compute(self)
    }
}

impl Operator for PacketFormatter {
    type Input = Burst;
    type Output = IqFrame;

    fn compute(&mut self, input: Burst) -> Option<IqFrame> {
        Some(PacketFormatter::compute(self, &input))
    }
}

impl Operator for Channelizer {
    type Input = IqFrame;
    type Output = ChannelizedFrame;

    fn compute(&mut self, input: IqFrame) -> Option<ChannelizedFrame> {
        match Channelizer::process(self, &input) {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::error!("channelizer: {e}, dropping tick");
                None
            }
        }
    }
}

impl Operator for ChannelChain {
    type Input = ChannelizedFrame;
    type Output = ();

    fn compute(&mut self, input: ChannelizedFrame) -> Option<()> {
        ChannelChain::compute(self, &input);
        Some(())
    }
}

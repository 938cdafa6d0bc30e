use crate::graph::unison::UnisonSlotParams;
use crate::param::ParamPool;

/// Factory for the generator behind each unison slot
///
/// This is the "instrument design" layer - you describe one copy of the
/// sound, wired to the slot's phase and detune params, and `Unison` builds
/// as many copies as it has slots. Runs at construction only, so it may
/// allocate params and nodes freely.
pub trait VoiceFactory<N> {
    fn build(&mut self, params: &mut ParamPool, slot: &UnisonSlotParams) -> N;
}

impl<F, N> VoiceFactory<N> for F
where
    F: FnMut(&mut ParamPool, &UnisonSlotParams) -> N,
{
    fn build(&mut self, params: &mut ParamPool, slot: &UnisonSlotParams) -> N {
        self(params, slot)
    }
}

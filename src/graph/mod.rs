//! Composable audio graph nodes.
//!
//! Every node renders one [`Block`](crate::Block) per cycle and caches it, so
//! a node shared by several readers still runs once per block.

pub mod delay;
pub mod extensions;
pub mod filter;
pub mod mix;
pub mod node;
pub mod oscillator;
pub mod unison;
pub mod vca;

pub use delay::{DelayParams, FeedbackDelay};
pub use extensions::NodeExt;
pub use filter::LowPass;
pub use mix::{Mixer, MixerInput};
pub use node::{Node, RenderCtx};
pub use oscillator::Oscillator;
pub use unison::{Unison, UnisonControls, UnisonSlotParams};
pub use vca::Vca;

//! Audio decoding, concatenation and export

mod codec;
mod encoder;
mod resample;
mod segment;

pub use codec::{decode, AudioEncoding};
pub use encoder::AudioEncoder;
pub use resample::resample;
pub use segment::{AudioSegment, CombinedTrack};

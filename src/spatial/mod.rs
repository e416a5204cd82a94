// Spatial audio module
//
// Distance attenuation and a level-only binaural cue applied to the mixed
// stereo buffer, driven by the listener position and each 3D voice.

mod binaural;
mod processor;

// Public API
pub use binaural::{BinauralCue, MAX_INTERAURAL_DELAY_SECONDS, apply_gain};
pub use processor::{
    CULL_THRESHOLD, DISTANCE_ROLLOFF, SpatialEntry, SpatialReport, Spatializer,
    distance_attenuation, validate_max_distance,
};

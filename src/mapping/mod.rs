//! Note, scale and trigger mapping
//!
//! Pure functions turning note names, trigger positions and velocities into
//! pitches and gains.

mod linear;
mod mapper;
mod note;
mod quantize;
mod trigger;

pub use linear::LinearMapper;
pub use mapper::{inverse_lerp, lerp, Mapper};
pub use note::{Note, A4_HZ, MAX_OCTAVE, MIN_OCTAVE, NOTE_NAMES};
pub use quantize::{Scale, ScaleKind, ScaleMapper};
pub use trigger::TriggerMapper;

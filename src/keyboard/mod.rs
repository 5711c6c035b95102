pub mod layout;
pub mod notes;
pub mod octave;

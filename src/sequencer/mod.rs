// Sequencer module - Transport, subdivision patterns and lookahead scheduling

pub mod metronome;
pub mod pattern;
pub mod scheduler;
pub mod timeline;
pub mod transport;

pub use metronome::{Metronome, MetronomeHandle};
pub use pattern::{Subdivision, SubdivisionPattern};
pub use scheduler::Scheduler;
pub use timeline::Tempo;
pub use transport::{SilentMode, TempoRamp, TransportSnapshot, TransportState};

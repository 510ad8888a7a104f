// Messaging - Click queue to the audio thread, beat events to listeners

pub mod beat_bus;
pub mod channels;

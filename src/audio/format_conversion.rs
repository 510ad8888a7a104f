// Sample format conversion for the output stream
//
// The click mix is mono f32; each device frame gets the same value on every
// channel, converted to the stream's native type with cpal's `FromSample`.

use cpal::{FromSample, Sample};

/// Copy one mono sample, converted to `T`, to every channel of `frame`
#[inline]
pub fn write_frame<T>(frame: &mut [T], mono: f32)
where
    T: Sample + FromSample<f32>,
{
    frame.fill(T::from_sample(mono));
}

/// Fill an interleaved device buffer, pulling one mono sample per frame
///
/// Returns the number of frames written, which is what the sample clock
/// advances by. Allocation-free.
#[inline]
pub fn fill_interleaved<T, F>(data: &mut [T], channels: usize, mut next_sample: F) -> usize
where
    T: Sample + FromSample<f32>,
    F: FnMut() -> f32,
{
    let mut frames = 0;
    for frame in data.chunks_mut(channels.max(1)) {
        write_frame(frame, next_sample());
        frames += 1;
    }
    frames
}

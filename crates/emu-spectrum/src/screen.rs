//! Screen rendering seam.
//!
//! The engine does not paint pixels; it reports which ULA tact ranges
//! have elapsed and lets a sink turn them into a picture. A renderer,
//! a test probe, or nothing at all can sit behind this trait.

/// Receives the tact ranges the beam has swept.
pub trait ScreenSink {
    /// The range `from..=to` of frame tacts has elapsed. Ranges within a
    /// frame are contiguous and never overlap.
    fn render_range(&mut self, from: u32, to: u32);

    /// The current frame is done: either its full tact count elapsed or
    /// a debug stop froze it mid-flight.
    fn frame_completed(&mut self);
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullScreen;

impl ScreenSink for NullScreen {
    fn render_range(&mut self, _from: u32, _to: u32) {}

    fn frame_completed(&mut self) {}
}

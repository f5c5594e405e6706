//! Host environment abstraction.
//!
//! The bootstrapper never talks to a window system or document directly; it
//! asks a [`HostEnvironment`] for a display surface and hands it the frame
//! and resize callbacks. The production host wraps a winit window (see
//! [`crate::app`]); tests drive the same flow with a scripted fake.

use instant::Duration;

/// Whether a frame callback wants to stay scheduled.
///
/// Hosts invoke the callback once per refresh tick for as long as it
/// answers [`FramePulse::Continue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePulse {
    Continue,
    Stop,
}

/// A sized region of the host the renderer output attaches to.
pub trait DisplaySurface {
    /// Current pixel dimensions, re-read on every use.
    fn dimensions(&self) -> (u32, u32);

    /// Attach the renderer's output, sized `width` x `height`.
    ///
    /// Called exactly once per bootstrap, right after the renderer exists.
    /// On the web this is where the canvas joins the container element;
    /// natively the window itself is the output and nothing moves.
    fn attach_output(&mut self, width: u32, height: u32);
}

/// The slice of the host an initialization run needs: surface lookup and
/// callback registration for resize events and refresh ticks.
pub trait HostEnvironment {
    type Surface: DisplaySurface;

    /// Look up the display surface, `None` when the host page lacks it.
    fn find_surface(&mut self, id: &str) -> Option<Self::Surface>;

    /// Register the listener invoked with the new dimensions on each
    /// resize event. A second registration replaces the first.
    fn set_resize_listener(&mut self, listener: Box<dyn FnMut(u32, u32)>);

    /// Register the per-refresh-tick callback, invoked with the elapsed
    /// time since the previous tick until it returns [`FramePulse::Stop`].
    fn schedule_frames(&mut self, callback: Box<dyn FnMut(Duration) -> FramePulse>);
}

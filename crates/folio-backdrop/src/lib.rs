//! Animated gradient background.
//!
//! A software rendition of the portfolio backdrop: drifting radial blobs,
//! blurred bezier bands and a soft central light over `#FAFAFA`, finished with
//! a faint overlay grain. [`Backdrop`] owns the surface and drives the
//! animation at a capped frame rate.

pub mod backdrop;
pub mod clock;
pub mod color;
pub mod error;
pub mod noise;
pub mod raster;
pub mod resize;
pub mod scene;
pub mod surface;

pub use backdrop::{Backdrop, TickOutcome, TICK_PERIOD};
pub use clock::{FrameClock, DEFAULT_FPS};
pub use color::{ColorStop, Rgba};
pub use error::{BackdropError, Result};
pub use noise::NoiseTexture;
pub use resize::{ResizeDebouncer, DEFAULT_RESIZE_DELAY};
pub use scene::{Scene, DEFAULT_INTENSITY};
pub use surface::Surface;

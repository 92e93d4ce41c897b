use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::clock::FrameClock;
use crate::error::{BackdropError, Result};
use crate::noise::NoiseTexture;
use crate::raster::{fill_radial, flatten, stroke_band, LinearGradient};
use crate::resize::ResizeDebouncer;
use crate::scene::{Point, Scene, BACKGROUND, HALO_SCALE, NOISE_ALPHA};
use crate::surface::Surface;

/// How often [`Backdrop::run`] offers a tick; the frame clock decides which
/// ones are drawn.
pub const TICK_PERIOD: Duration = Duration::from_millis(16);

/// What happened on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The animation is not running.
    Stopped,
    /// Too soon after the last frame.
    Skipped,
    Drawn,
}

/// The animated background: surface, noise texture, frame clock and
/// pending resize, owned together.
#[derive(Debug)]
pub struct Backdrop {
    scene: Scene,
    surface: Surface,
    noise: NoiseTexture,
    noise_seed: Option<u64>,
    clock: FrameClock,
    resize: ResizeDebouncer,
    running: bool,
    frames_drawn: u64,
}

impl Backdrop {
    pub fn new(width: u32, height: u32, intensity: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&intensity) {
            return Err(BackdropError::InvalidIntensity(intensity));
        }
        Ok(Self {
            scene: Scene::new(intensity),
            surface: Surface::new(width, height)?,
            noise: NoiseTexture::generate(width, height)?,
            noise_seed: None,
            clock: FrameClock::default(),
            resize: ResizeDebouncer::default(),
            running: false,
            frames_drawn: 0,
        })
    }

    /// Use a fixed seed for the noise texture, now and after every resize.
    pub fn with_noise_seed(mut self, seed: u64) -> Result<Self> {
        self.noise_seed = Some(seed);
        self.noise = self.make_noise(self.surface.width(), self.surface.height())?;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_resize_delay(mut self, delay: Duration) -> Self {
        self.resize = ResizeDebouncer::new(delay);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn noise(&self) -> &NoiseTexture {
        &self.noise
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        log::info!(
            "Starting backdrop animation at {}x{}",
            self.surface.width(),
            self.surface.height()
        );
        self.clock.reset();
        self.running = true;
    }

    /// Stop animating; a pending resize is dropped.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        log::info!("Stopping backdrop after {} frames", self.frames_drawn);
        self.running = false;
        self.resize.cancel();
    }

    /// Queue a new size; applied once no other request arrives for the
    /// debounce delay.
    pub fn request_resize(&mut self, width: u32, height: u32, now: Instant) {
        log::debug!("Resize requested to {}x{}", width, height);
        self.resize.request(width, height, now);
    }

    /// Recreate the surface and noise texture at a new size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let surface = Surface::new(width, height)?;
        let noise = self.make_noise(width, height)?;
        self.surface = surface;
        self.noise = noise;
        log::debug!("Backdrop resized to {}x{}", width, height);
        Ok(())
    }

    /// Advance the animation to `time_ms`, drawing a frame unless the rate
    /// cap says otherwise. Due resizes are applied first.
    pub fn on_tick(&mut self, time_ms: f64, now: Instant) -> Result<TickOutcome> {
        if !self.running {
            return Ok(TickOutcome::Stopped);
        }

        if let Some((width, height)) = self.resize.poll(now) {
            self.resize(width, height)?;
        }

        if !self.clock.tick(time_ms) {
            return Ok(TickOutcome::Skipped);
        }

        self.render(time_ms)?;
        Ok(TickOutcome::Drawn)
    }

    /// Draw the frame for `time_ms` regardless of the rate cap.
    pub fn render(&mut self, time_ms: f64) -> Result<()> {
        let t = time_ms as f32;
        let (w, h) = (self.surface.width() as f32, self.surface.height() as f32);
        let px = |p: Point| p.to_pixels(w, h);

        self.surface.fill(BACKGROUND);

        for blob in &self.scene.blobs {
            fill_radial(&mut self.surface, px(blob.center(t)), blob.radius, &blob.stops);
        }

        let halo_alpha = self.scene.halo_alpha();
        for band in &self.scene.bands {
            let pose = band.pose(t);
            let segments = pose
                .segments()
                .map(|(p0, c1, c2, p3)| (px(p0), px(c1), px(c2), px(p3)));
            let points = flatten(&segments);
            let gradient = LinearGradient::new(
                px(pose.gradient_start),
                px(pose.gradient_end),
                &band.stops,
            );

            stroke_band(
                &mut self.surface,
                &points,
                band.line_width,
                band.blur,
                &gradient,
                1.0,
            );
            stroke_band(
                &mut self.surface,
                &points,
                band.line_width * HALO_SCALE,
                band.blur * HALO_SCALE,
                &gradient,
                halo_alpha,
            );
        }

        let light = &self.scene.light;
        fill_radial(&mut self.surface, px(light.center), light.radius, &light.stops);

        self.surface.overlay(&self.noise, NOISE_ALPHA)?;
        self.frames_drawn += 1;
        Ok(())
    }

    /// Animate until `token` is cancelled, calling `on_frame` with each drawn
    /// frame and its time in milliseconds since the loop started.
    ///
    /// Sizes received on `resizes` go through the debounce.
    pub async fn run<F>(
        &mut self,
        token: CancellationToken,
        mut resizes: mpsc::UnboundedReceiver<(u32, u32)>,
        mut on_frame: F,
    ) -> Result<u64>
    where
        F: FnMut(&Surface, f64),
    {
        let origin = Instant::now();
        let first_frame = self.frames_drawn;
        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        self.start();
        let result = loop {
            tokio::select! {
                _ = token.cancelled() => break Ok(()),
                Some((width, height)) = resizes.recv() => {
                    self.request_resize(width, height, Instant::now());
                }
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let time_ms = now.duration_since(origin).as_secs_f64() * 1000.0;
                    match self.on_tick(time_ms, now) {
                        Ok(TickOutcome::Drawn) => on_frame(&self.surface, time_ms),
                        Ok(_) => {}
                        Err(e) => break Err(e),
                    }
                }
            }
        };
        self.stop();

        result.map(|()| self.frames_drawn - first_frame)
    }

    fn make_noise(&self, width: u32, height: u32) -> Result<NoiseTexture> {
        match self.noise_seed {
            Some(seed) => NoiseTexture::seeded(width, height, seed),
            None => NoiseTexture::generate(width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_60HZ: f64 = 1000.0 / 60.0;

    fn small() -> Backdrop {
        Backdrop::new(32, 18, 0.7).unwrap().with_noise_seed(1).unwrap()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            Backdrop::new(32, 18, 1.5),
            Err(BackdropError::InvalidIntensity(_))
        ));
        assert!(matches!(
            Backdrop::new(32, 18, f32::NAN),
            Err(BackdropError::InvalidIntensity(_))
        ));
        assert!(matches!(
            Backdrop::new(0, 18, 0.7),
            Err(BackdropError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_stopped_backdrop_does_not_draw() {
        let mut backdrop = small();
        let now = Instant::now();
        assert_eq!(backdrop.on_tick(100.0, now).unwrap(), TickOutcome::Stopped);
        assert_eq!(backdrop.frames_drawn(), 0);

        backdrop.start();
        assert_eq!(backdrop.on_tick(100.0, now).unwrap(), TickOutcome::Drawn);
        backdrop.stop();
        assert!(!backdrop.is_running());
        assert_eq!(backdrop.on_tick(200.0, now).unwrap(), TickOutcome::Stopped);
        assert_eq!(backdrop.frames_drawn(), 1);
    }

    #[test]
    fn test_frame_rate_is_capped() {
        let mut backdrop = small();
        backdrop.start();
        let now = Instant::now();

        let mut drawn = 0;
        for i in 1..=60 {
            if backdrop.on_tick(i as f64 * FRAME_60HZ, now).unwrap() == TickOutcome::Drawn {
                drawn += 1;
            }
        }
        assert!(drawn <= 30);
        assert!(drawn >= 29);
    }

    #[test]
    fn test_resize_mid_animation_regenerates_noise() {
        let mut backdrop = small();
        backdrop.start();
        let origin = Instant::now();
        let at = |ms: u64| origin + Duration::from_millis(ms);

        for i in 1..=10u64 {
            backdrop.on_tick(i as f64 * FRAME_60HZ, at(i * 16)).unwrap();
        }
        let old_noise = backdrop.noise().values().to_vec();

        backdrop.request_resize(40, 30, at(170));
        backdrop.request_resize(48, 27, at(200));

        backdrop.on_tick(11.0 * FRAME_60HZ, at(340)).unwrap();
        assert_eq!(backdrop.size(), (32, 18));

        let drawn_before = backdrop.frames_drawn();
        let mut drawn = 0;
        for i in 12..=71u64 {
            if backdrop.on_tick(i as f64 * FRAME_60HZ, at(350 + (i - 12) * 16)).unwrap()
                == TickOutcome::Drawn
            {
                drawn += 1;
            }
        }

        assert_eq!(backdrop.size(), (48, 27));
        assert_eq!(backdrop.noise().width(), 48);
        assert_eq!(backdrop.noise().height(), 27);
        assert_eq!(backdrop.noise().values().len(), 48 * 27);
        assert_ne!(backdrop.noise().values().len(), old_noise.len());
        assert_eq!(backdrop.surface().len(), 48 * 27);

        // Sixty 60Hz ticks after the resize still yield at most 30 frames.
        assert!(drawn <= 30);
        assert!(drawn >= 29);
        assert_eq!(backdrop.frames_drawn() - drawn_before, drawn);
    }

    #[test]
    fn test_stop_drops_pending_resize() {
        let mut backdrop = small();
        backdrop.start();
        let now = Instant::now();
        backdrop.request_resize(64, 64, now);
        backdrop.stop();
        backdrop.start();
        backdrop
            .on_tick(1000.0, now + Duration::from_secs(1))
            .unwrap();
        assert_eq!(backdrop.size(), (32, 18));
    }

    #[test]
    fn test_render_is_deterministic_for_a_seed() {
        let mut a = small();
        let mut b = small();
        a.render(1234.0).unwrap();
        b.render(1234.0).unwrap();
        assert_eq!(a.surface().to_rgb8(), b.surface().to_rgb8());

        b.render(6000.0).unwrap();
        assert_ne!(a.surface().to_rgb8(), b.surface().to_rgb8());
    }

    #[test]
    fn test_render_tints_the_background() {
        let mut backdrop = small();
        backdrop.render(0.0).unwrap();

        let bytes = backdrop.surface().to_rgb8();
        assert_eq!(bytes.len(), 32 * 18 * 3);
        // Blobs pull every pixel away from the flat #FAFAFA base.
        assert!(bytes.chunks(3).all(|p| p != [250, 250, 250]));
    }

    #[test]
    fn test_zero_intensity_leaves_base_and_grain() {
        let mut backdrop = Backdrop::new(16, 9, 0.0)
            .unwrap()
            .with_noise_seed(3)
            .unwrap();
        backdrop.render(500.0).unwrap();

        // Only the grain remains, which moves a channel by at most one step.
        assert!(backdrop
            .surface()
            .to_rgb8()
            .iter()
            .all(|&c| (249..=251).contains(&c)));
    }
}

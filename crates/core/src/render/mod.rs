use crate::{mapping::AnimationParameters, Result};

/// Seam to the external avatar renderer.
///
/// The core only requires that the sink accepts one parameter snapshot per
/// tick and exposes a capturable frame stream with a fixed output rate once
/// recording begins; how the avatar is actually drawn is out of scope.
pub trait VisualSurface {
    /// Fixed output rate of the capturable frame stream.
    fn frame_rate(&self) -> u32;

    /// Applies one tick's parameter set to the rendered scene.
    fn apply(&mut self, params: &AnimationParameters);

    /// Returns the encoded bytes of the most recently rendered frame.
    fn capture_frame(&mut self) -> Result<Vec<u8>>;
}

/// Minimal software surface used by the command line demo and the test
/// suite. Each captured frame packs the applied parameters and a frame
/// counter into a small fixed-size payload.
#[derive(Debug)]
pub struct SoftwareSurface {
    frame_rate: u32,
    latest: AnimationParameters,
    frames_rendered: u64,
}

impl SoftwareSurface {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame_rate,
            latest: AnimationParameters::rest(),
            frames_rendered: 0,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl VisualSurface for SoftwareSurface {
    fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    fn apply(&mut self, params: &AnimationParameters) {
        self.latest = *params;
        self.frames_rendered += 1;
    }

    fn capture_frame(&mut self) -> Result<Vec<u8>> {
        let mut frame = Vec::with_capacity(32);
        frame.extend_from_slice(&self.frames_rendered.to_le_bytes());
        for value in [
            self.latest.mouth,
            self.latest.jaw,
            self.latest.brow,
            self.latest.hand,
            self.latest.gaze_x,
            self.latest.gaze_y,
        ] {
            frame.extend_from_slice(&value.to_le_bytes());
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_reflect_the_applied_parameters() {
        let mut surface = SoftwareSurface::new(60);
        surface.apply(&AnimationParameters {
            mouth: 0.5,
            ..AnimationParameters::rest()
        });

        let frame = surface.capture_frame().unwrap();
        assert_eq!(frame.len(), 32);
        assert_eq!(surface.frames_rendered(), 1);

        let mouth = f32::from_le_bytes(frame[8..12].try_into().unwrap());
        assert!((mouth - 0.5).abs() < f32::EPSILON);
    }
}

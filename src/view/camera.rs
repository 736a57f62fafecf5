// src/view/camera.rs
//! User-controlled bearing and pitch

pub const MIN_PITCH: f64 = 0.0;
pub const MAX_PITCH: f64 = 85.0;

/// Bearing change per rotate-button press, degrees
pub const BEARING_STEP: f64 = 10.0;
/// Pitch change per tilt-button press, degrees
pub const PITCH_STEP: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Degrees, unbounded; the engine wraps it
    pub bearing: f64,
    /// Degrees, always within `MIN_PITCH..=MAX_PITCH`
    pub pitch: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            bearing: -20.0,
            pitch: 60.0,
        }
    }
}

impl CameraState {
    pub fn new(bearing: f64, pitch: f64) -> Self {
        Self {
            bearing,
            pitch: pitch.clamp(MIN_PITCH, MAX_PITCH),
        }
    }

    /// Add deltas, clamping pitch
    pub fn pan(&mut self, delta_bearing: f64, delta_pitch: f64) {
        self.bearing += delta_bearing;
        self.pitch = (self.pitch + delta_pitch).clamp(MIN_PITCH, MAX_PITCH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let state = CameraState::default();
        assert_eq!(state.bearing, -20.0);
        assert_eq!(state.pitch, 60.0);
    }

    #[test]
    fn test_new_clamps_pitch() {
        assert_eq!(CameraState::new(0.0, 120.0).pitch, MAX_PITCH);
        assert_eq!(CameraState::new(0.0, -3.0).pitch, MIN_PITCH);
    }

    #[test]
    fn test_pan_keeps_pitch_in_range() {
        let mut state = CameraState::default();
        let deltas = [25.0, 1000.0, -5.0, -1e9, 0.5, 84.0, 3.0, -0.1, f64::MAX, -f64::MAX];
        for delta in deltas {
            state.pan(BEARING_STEP, delta);
            assert!((MIN_PITCH..=MAX_PITCH).contains(&state.pitch), "pitch {} after {}", state.pitch, delta);
        }
    }

    #[test]
    fn test_bearing_is_unclamped() {
        let mut state = CameraState::default();
        for _ in 0..40 {
            state.pan(BEARING_STEP, 0.0);
        }
        assert_eq!(state.bearing, -20.0 + 400.0);
    }
}

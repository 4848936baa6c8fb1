use std::io::Write;
use std::time::Duration;

use thiserror::Error;

/// Why a haptic pulse could not be played. Always recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HapticError {
    #[error("haptics are not supported on this output")]
    Unsupported,
    #[error("invalid haptic pattern: {0}")]
    Pattern(String),
    #[error("haptic playback failed: {0}")]
    Playback(String),
}

/// One continuous haptic burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticEvent {
    pub intensity: f64,
    pub sharpness: f64,
    pub duration: Duration,
}

impl HapticEvent {
    /// A continuous burst whose strength and sharpness both track `intensity`
    pub fn continuous(intensity: f64, duration: Duration) -> Result<Self, HapticError> {
        if !(0.0..=1.0).contains(&intensity) {
            return Err(HapticError::Pattern(format!(
                "intensity {intensity} outside [0, 1]"
            )));
        }
        if duration.is_zero() {
            return Err(HapticError::Pattern("zero-length event".to_string()));
        }
        Ok(Self {
            intensity,
            sharpness: intensity,
            duration,
        })
    }
}

/// Anything that can render a continuous haptic event
pub trait HapticSink {
    fn play(&mut self, event: &HapticEvent) -> Result<(), HapticError>;
}

/// Fixed hit confirmation; best-effort, never reports failure
pub trait SuccessSignal {
    fn fire(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActivePulse {
    event: HapticEvent,
    remaining: Duration,
}

/// Haptic sink for a terminal: holds the active pulse so the UI can draw it
/// as a rumble meter until the pulse runs out.
#[derive(Debug, Clone, Default)]
pub struct TerminalHaptics {
    supported: bool,
    active: Option<ActivePulse>,
    played: u64,
}

impl TerminalHaptics {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            active: None,
            played: 0,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Run the active pulse down by `dt`
    pub fn advance(&mut self, dt: Duration) {
        if let Some(pulse) = self.active.as_mut() {
            pulse.remaining = pulse.remaining.saturating_sub(dt);
            if pulse.remaining.is_zero() {
                self.active = None;
            }
        }
    }

    /// Strength of the pulse currently playing, 0 when idle
    pub fn level(&self) -> f64 {
        self.active.map(|p| p.event.intensity).unwrap_or(0.0)
    }

    pub fn sharpness(&self) -> f64 {
        self.active.map(|p| p.event.sharpness).unwrap_or(0.0)
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn played(&self) -> u64 {
        self.played
    }
}

impl HapticSink for TerminalHaptics {
    fn play(&mut self, event: &HapticEvent) -> Result<(), HapticError> {
        if !self.supported {
            return Err(HapticError::Unsupported);
        }
        // a newer pulse supersedes whatever is still ringing
        self.active = Some(ActivePulse {
            event: *event,
            remaining: event.duration,
        });
        self.played += 1;
        Ok(())
    }
}

/// Hit confirmation for a terminal: rings the bell and queues a visual burst
/// for the front-end to pick up.
#[derive(Debug)]
pub struct TerminalChime<W: Write> {
    bell: bool,
    out: W,
    fired: u32,
}

impl<W: Write> TerminalChime<W> {
    pub fn new(bell: bool, out: W) -> Self {
        Self {
            bell,
            out,
            fired: 0,
        }
    }

    /// Number of bursts requested since the last call
    pub fn take_fired(&mut self) -> u32 {
        std::mem::take(&mut self.fired)
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> SuccessSignal for TerminalChime<W> {
    fn fire(&mut self) {
        if self.bell {
            if let Err(err) = self.out.write_all(b"\x07").and_then(|_| self.out.flush()) {
                log::debug!("bell failed: {err}");
            }
        }
        self.fired += 1;
    }
}

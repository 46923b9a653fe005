//! Sound cues
//!
//! The simulation never plays audio itself; the UI layer maps outbound
//! events to cues and plays the matching asset.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Robot starts walking or takes a turn
    RobotWalk,
    /// Run cancelled by pressing start again
    RobotReset,
    /// Level complete
    Success,
}

impl SoundCue {
    /// Cue for an event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::RunStarted { .. } | GameEvent::JunctionConsumed { .. } => {
                Some(SoundCue::RobotWalk)
            }
            GameEvent::RunCancelled => Some(SoundCue::RobotReset),
            GameEvent::LevelComplete { .. } => Some(SoundCue::Success),
            _ => None,
        }
    }

    pub fn asset(&self) -> &'static str {
        match self {
            SoundCue::RobotWalk => "directions/sounds/sfx-robot-walk.wav",
            SoundCue::RobotReset => "directions/sounds/sfx-robot-reset.mp3",
            SoundCue::Success => "directions/sounds/sfx-success.wav",
        }
    }

    /// Fire-and-forget playback through an `<audio>` element
    #[cfg(target_arch = "wasm32")]
    pub fn play(&self, volume: f64) {
        match web_sys::HtmlAudioElement::new_with_src(self.asset()) {
            Ok(el) => {
                el.set_volume(volume.clamp(0.0, 1.0));
                // Autoplay may be refused before the first user gesture
                let _ = el.play();
            }
            Err(_) => log::warn!("Failed to create audio element for {:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cues() {
        assert_eq!(
            SoundCue::for_event(&GameEvent::RunStarted { run_id: 1 }),
            Some(SoundCue::RobotWalk)
        );
        assert_eq!(SoundCue::for_event(&GameEvent::RunCancelled), Some(SoundCue::RobotReset));
        assert_eq!(
            SoundCue::for_event(&GameEvent::LevelComplete {
                level: 0,
                points: 3,
                recorded: 3,
                next: Some(1),
            }),
            Some(SoundCue::Success)
        );
        assert_eq!(SoundCue::for_event(&GameEvent::FellOff), None);
    }
}

use room_for_change_core::SoundCue;
use tracing::info;

/// Destination for sound cues raised by the game systems.
pub(crate) trait AudioSink {
    /// Plays `cue` once.
    fn play(&mut self, cue: SoundCue);
}

/// Sink that records cues in the log instead of playing them. The macroquad
/// backend is built without its audio stack.
#[derive(Debug, Default)]
pub(crate) struct TracingAudioSink;

impl AudioSink for TracingAudioSink {
    fn play(&mut self, cue: SoundCue) {
        info!(
            effect = ?cue.effect,
            volume = cue.volume,
            pitch = cue.pitch,
            "sound_cue"
        );
    }
}

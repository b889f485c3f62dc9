use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub hz: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Stop,
    Start { hz: u32, source: PathBuf },
}

/// Single-track player: starting a frequency stops whatever was playing, and
/// pressing the playing one again stops it.
#[derive(Debug, Clone, Default)]
pub struct FrequencyPlayer {
    current: Option<NowPlaying>,
    playing: bool,
}

impl FrequencyPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(
        &mut self,
        hz: u32,
        title: &str,
        source: Option<PathBuf>,
    ) -> Vec<PlayerCommand> {
        if self.is_playing(hz) {
            self.stop();
            return vec![PlayerCommand::Stop];
        }

        self.stop();
        let Some(source) = source else {
            log::warn!("No media found for {} Hz", hz);
            return vec![PlayerCommand::Stop];
        };

        self.current = Some(NowPlaying {
            hz,
            title: title.to_string(),
        });
        vec![PlayerCommand::Stop, PlayerCommand::Start { hz, source }]
    }

    pub fn started(&mut self, hz: u32) {
        if self.current.as_ref().is_some_and(|c| c.hz == hz) {
            self.playing = true;
        }
    }

    pub fn failed(&mut self) {
        self.stop();
    }

    pub fn ended(&mut self) {
        self.stop();
    }

    pub fn stop(&mut self) {
        self.current = None;
        self.playing = false;
    }

    pub fn is_playing(&self, hz: u32) -> bool {
        self.playing && self.current.as_ref().is_some_and(|c| c.hz == hz)
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.current.as_ref().filter(|_| self.playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(hz: u32) -> Option<PathBuf> {
        Some(PathBuf::from(format!("/tmp/{}.mp3", hz)))
    }

    #[test]
    fn test_toggle_same_frequency_stops() {
        let mut p = FrequencyPlayer::new();
        let cmds = p.toggle(396, "396 Hz", src(396));
        assert_eq!(
            cmds.last(),
            Some(&PlayerCommand::Start {
                hz: 396,
                source: PathBuf::from("/tmp/396.mp3")
            })
        );
        p.started(396);
        assert!(p.is_playing(396));

        assert_eq!(p.toggle(396, "396 Hz", src(396)), vec![PlayerCommand::Stop]);
        assert!(p.now_playing().is_none());
    }

    #[test]
    fn test_switching_tracks() {
        let mut p = FrequencyPlayer::new();
        p.toggle(396, "a", src(396));
        p.started(396);
        let cmds = p.toggle(528, "b", src(528));
        assert_eq!(cmds[0], PlayerCommand::Stop);
        assert!(!p.is_playing(396));
        p.started(528);
        assert_eq!(p.now_playing().map(|n| n.hz), Some(528));
        p.ended();
        assert!(p.now_playing().is_none());
    }

    #[test]
    fn test_missing_media_and_failures() {
        let mut p = FrequencyPlayer::new();
        assert_eq!(p.toggle(174, "x", None), vec![PlayerCommand::Stop]);
        assert!(p.now_playing().is_none());

        p.toggle(174, "x", src(174));
        p.failed();
        p.started(174);
        assert!(!p.is_playing(174));
    }
}

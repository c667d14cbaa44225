//! Sound playback with an external command line player

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io,
    path::PathBuf,
    process::{Child, Command, Stdio},
};

use crate::hw::{HwError, SoundPlayer};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundParams {
    /// Program used to play a sound file, called with the path to the file as its only argument
    pub player_cmd: String,

    /// Directory holding the sound files, relative to the software root
    pub media_dir: String,
}

/// Plays sound files found in a media directory by spawning one player process per playback.
///
/// The directory is read on construction, and again when asked to play a file it has not seen.
/// Playbacks still running when the player is dropped are killed.
pub struct CmdSoundPlayer {
    player_cmd: String,
    media_dir: PathBuf,
    available: Vec<String>,
    playbacks: Vec<Playback>,
}

struct Playback {
    name: String,
    child: Child,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SoundParams {
    fn default() -> Self {
        Self {
            player_cmd: String::from("aplay"),
            media_dir: String::from("media"),
        }
    }
}

impl CmdSoundPlayer {
    pub fn new(player_cmd: &str, media_dir: PathBuf) -> Self {
        let mut player = Self {
            player_cmd: player_cmd.to_string(),
            media_dir,
            available: Vec::new(),
            playbacks: Vec::new(),
        };

        if let Err(e) = player.refresh() {
            warn!("Could not read the sound files in {:?}: {}", player.media_dir, e);
        }

        player
    }

    fn scan_media_dir(&self) -> Result<Vec<String>, HwError> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.media_dir)? {
            let entry = entry?;

            if entry.file_type()?.is_file() {
                if let Some(n) = entry.file_name().to_str() {
                    names.push(n.to_string());
                }
            }
        }

        names.sort();

        Ok(names)
    }

    fn is_available(&self, name: &str) -> bool {
        self.available.iter().any(|n| n == name)
    }
}

impl SoundPlayer for CmdSoundPlayer {
    fn play(&mut self, name: &str) -> Result<(), HwError> {
        // Only names listed in the media directory are accepted, so no other paths can be played
        if !self.is_available(name) {
            self.refresh()?;

            if !self.is_available(name) {
                return Err(HwError::UnknownSound(name.to_string()))
            }
        }

        let child = Command::new(&self.player_cmd)
            .arg(self.media_dir.join(name))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        debug!("Playing {} (pid {})", name, child.id());

        self.playbacks.push(Playback {
            name: name.to_string(),
            child,
        });

        Ok(())
    }

    fn stop(&mut self, name: &str) -> Result<(), HwError> {
        let mut result = Ok(());

        for p in self.playbacks.iter_mut().filter(|p| p.name == name) {
            if let Err(e) = p.kill() {
                result = Err(e.into());
            }
        }

        self.playbacks.retain(|p| p.name != name);

        result
    }

    fn list_available(&self) -> Vec<String> {
        self.available.clone()
    }

    fn refresh(&mut self) -> Result<(), HwError> {
        let result = self.scan_media_dir();

        // A directory which can't be read has nothing to play
        self.available = match result {
            Ok(ref names) => names.clone(),
            Err(_) => Vec::new()
        };

        result.map(|_| ())
    }

    fn list_playing(&self) -> Vec<String> {
        self.playbacks.iter().map(|p| p.name.clone()).collect()
    }

    fn poll(&mut self) -> Result<(), HwError> {
        self.playbacks.retain_mut(|p| match p.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!("{} finished ({})", p.name, status);
                false
            },
            Err(e) => {
                warn!("Could not check playback of {}: {}", p.name, e);
                false
            }
        });

        Ok(())
    }
}

impl Drop for CmdSoundPlayer {
    fn drop(&mut self) {
        for p in self.playbacks.iter_mut() {
            if let Err(e) = p.kill() {
                warn!("Could not stop playback of {}: {}", p.name, e);
            }
        }
    }
}

impl Playback {
    /// Kill the player process and reap it.
    fn kill(&mut self) -> io::Result<()> {
        match self.child.kill() {
            Ok(()) => (),
            // Already exited
            Err(ref e) if e.kind() == io::ErrorKind::InvalidInput => (),
            Err(e) => return Err(e)
        }

        self.child.wait().map(|_| ())
    }
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use std::time::{Duration, Instant};

    fn media_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("carbot_sound_{}_{}", name, std::process::id()));
        fs::create_dir_all(dir.join("subdir")).unwrap();
        fs::write(dir.join("siren.wav"), b"").unwrap();
        fs::write(dir.join("horn.wav"), b"").unwrap();
        dir
    }

    #[test]
    fn test_list_and_play() {
        let dir = media_dir("play");
        let mut player = CmdSoundPlayer::new("true", dir.clone());

        assert_eq!(player.list_available(), vec!["horn.wav", "siren.wav"]);

        assert!(matches!(player.play("missing.wav"), Err(HwError::UnknownSound(_))));
        assert!(matches!(player.play("../horn.wav"), Err(HwError::UnknownSound(_))));

        player.play("horn.wav").unwrap();
        assert_eq!(player.list_playing(), vec!["horn.wav"]);

        // `true` exits straight away, so the playback is reaped by poll
        let start = Instant::now();
        while !player.list_playing().is_empty() {
            assert!(start.elapsed() < Duration::from_secs(5));
            player.poll().unwrap();
            std::thread::sleep(Duration::from_millis(10));
        }

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_stop() {
        let dir = media_dir("stop");
        let mut player = CmdSoundPlayer::new("sleep", dir.clone());

        // `sleep <path>` fails immediately, stopping it must still succeed
        player.play("siren.wav").unwrap();
        player.stop("siren.wav").unwrap();
        assert!(player.list_playing().is_empty());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_available_list_cached() {
        let dir = media_dir("cache");
        let mut player = CmdSoundPlayer::new("true", dir.clone());

        // Listing does not touch the directory
        fs::remove_file(dir.join("horn.wav")).unwrap();
        assert_eq!(player.list_available(), vec!["horn.wav", "siren.wav"]);

        // A file added later is found when first played
        fs::write(dir.join("bell.wav"), b"").unwrap();
        player.play("bell.wav").unwrap();
        assert_eq!(player.list_available(), vec!["bell.wav", "siren.wav"]);

        player.stop("bell.wav").unwrap();
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_media_dir() {
        let mut player = CmdSoundPlayer::new("true", PathBuf::from("/nonexistent/carbot/media"));
        assert!(player.list_available().is_empty());
        assert!(player.refresh().is_err());
        assert!(player.play("horn.wav").is_err());
    }
}

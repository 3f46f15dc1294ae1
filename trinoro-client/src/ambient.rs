//! Ambient sound mixer state
//!
//! Holds the list of looping preview clips and their playback controls.
//! Audio output itself belongs to the front end; this is the state it renders.

use tracing::{debug, warn};

use crate::client::TrinoroClient;

pub const DEFAULT_VOLUME: f32 = 0.5;
pub const DEFAULT_TAGS: &[&str] = &["forest"];

#[derive(Debug, Clone, PartialEq)]
pub struct AmbientSound {
    /// The search tag the sound was found with
    pub name: String,
    pub preview: String,
    /// 0.0 ..= 1.0
    pub volume: f32,
    pub is_playing: bool,
}

#[derive(Debug)]
pub struct AmbientMixer {
    sounds: Vec<AmbientSound>,
    /// False while binaural beats play; sounds keep their settings
    enabled: bool,
}

impl Default for AmbientMixer {
    fn default() -> Self {
        Self {
            sounds: Vec::new(),
            enabled: true,
        }
    }
}

impl AmbientMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sounds that should currently be heard
    pub fn audible(&self) -> impl Iterator<Item = &AmbientSound> {
        let enabled = self.enabled;
        self.sounds.iter().filter(move |s| enabled && s.is_playing)
    }

    pub fn sounds(&self) -> &[AmbientSound] {
        &self.sounds
    }

    pub fn get(&self, name: &str) -> Option<&AmbientSound> {
        self.sounds.iter().find(|s| s.name == name)
    }

    /// Replace the mixer contents with one sound per tag (`["forest"]` if empty)
    pub async fn init(&mut self, client: &TrinoroClient, tags: &[String]) {
        self.sounds.clear();
        if tags.is_empty() {
            for tag in DEFAULT_TAGS {
                self.add_sound(client, tag).await;
            }
        } else {
            for tag in tags {
                self.add_sound(client, tag).await;
            }
        }
    }

    /// Look up `tag` and add it paused. Returns whether a sound was added.
    pub async fn add_sound(&mut self, client: &TrinoroClient, tag: &str) -> bool {
        if self.get(tag).is_some() {
            debug!(tag = tag, "Ambient sound already loaded");
            return false;
        }

        match client.search_sound(tag).await {
            Ok(Some(sound)) => {
                self.sounds.push(AmbientSound {
                    name: tag.to_string(),
                    preview: sound.preview,
                    volume: DEFAULT_VOLUME,
                    is_playing: false,
                });
                true
            }
            Ok(None) => {
                debug!(tag = tag, "No ambient sound found");
                false
            }
            Err(e) => {
                warn!(tag = tag, "Ambient sound lookup failed: {}", e);
                false
            }
        }
    }

    /// Flip playing state; returns the new state, or `None` for an unknown
    /// name or while the mixer is disabled
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        if !self.enabled {
            return None;
        }
        let sound = self.sounds.iter_mut().find(|s| s.name == name)?;
        sound.is_playing = !sound.is_playing;
        Some(sound.is_playing)
    }

    pub fn set_volume(&mut self, name: &str, volume: f32) {
        if let Some(sound) = self.sounds.iter_mut().find(|s| s.name == name) {
            sound.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.sounds.retain(|s| s.name != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    async fn sound_server() -> mockito::ServerGuard {
        let mut server = mockito::Server::new_async().await;
        for (tag, id) in [("forest", 1), ("rain", 2)] {
            server
                .mock("GET", "/api/sounds")
                .match_query(Matcher::UrlEncoded("query".into(), tag.into()))
                .with_status(200)
                .with_body(format!(
                    r#"{{"success": true, "data": {{"id": {id}, "name": "{tag} loop", "preview": "https://cdn/{id}.mp3"}}}}"#
                ))
                .create_async()
                .await;
        }
        server
            .mock("GET", "/api/sounds")
            .match_query(Matcher::UrlEncoded("query".into(), "void".into()))
            .with_status(404)
            .with_body(r#"{"success": false, "error": "No sound found"}"#)
            .create_async()
            .await;
        server
    }

    #[tokio::test]
    async fn test_init_defaults_to_forest() {
        let server = sound_server().await;
        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");

        let mut mixer = AmbientMixer::new();
        mixer.init(&client, &[]).await;

        assert_eq!(mixer.sounds().len(), 1);
        let forest = mixer.get("forest").unwrap();
        assert_eq!(forest.preview, "https://cdn/1.mp3");
        assert_eq!(forest.volume, DEFAULT_VOLUME);
        assert!(!forest.is_playing);
    }

    #[tokio::test]
    async fn test_add_sound_skips_duplicates_and_misses() {
        let server = sound_server().await;
        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");

        let mut mixer = AmbientMixer::new();
        assert!(mixer.add_sound(&client, "rain").await);
        assert!(!mixer.add_sound(&client, "rain").await);
        assert!(!mixer.add_sound(&client, "void").await);
        assert_eq!(mixer.sounds().len(), 1);
    }

    #[tokio::test]
    async fn test_controls() {
        let server = sound_server().await;
        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");

        let mut mixer = AmbientMixer::new();
        mixer.init(&client, &["forest".to_string(), "rain".to_string()]).await;

        assert_eq!(mixer.toggle("rain"), Some(true));
        assert_eq!(mixer.toggle("rain"), Some(false));
        assert_eq!(mixer.toggle("ocean"), None);

        mixer.set_volume("forest", 1.7);
        assert_eq!(mixer.get("forest").unwrap().volume, 1.0);
        mixer.set_volume("forest", -0.2);
        assert_eq!(mixer.get("forest").unwrap().volume, 0.0);

        mixer.remove("forest");
        assert!(mixer.get("forest").is_none());
        assert_eq!(mixer.sounds().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_mixer_is_silent() {
        let server = sound_server().await;
        let client = TrinoroClient::new(server.url()).unwrap().with_token("tok");

        let mut mixer = AmbientMixer::new();
        mixer.init(&client, &[]).await;
        mixer.toggle("forest");
        assert_eq!(mixer.audible().count(), 1);

        mixer.set_enabled(false);
        assert_eq!(mixer.audible().count(), 0);
        assert_eq!(mixer.toggle("forest"), None);

        mixer.set_enabled(true);
        assert_eq!(mixer.audible().count(), 1);
    }
}

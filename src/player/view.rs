use anyhow::Result;
use tracing::{debug, info};

use super::media::{MediaElement, MediaEvent};
use super::store::PlayerStore;

/// Which transport buttons the player bar offers for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransportControls {
    pub(crate) shuffle: bool,
    pub(crate) previous: bool,
    pub(crate) play: bool,
    pub(crate) next: bool,
    pub(crate) repeat: bool,
}

impl TransportControls {
    pub(crate) fn for_store(store: &PlayerStore) -> Self {
        let has_episode = store.current_episode().is_some();
        Self {
            shuffle: has_episode && store.episode_list().len() > 1,
            previous: has_episode && store.has_previous(),
            play: has_episode,
            next: has_episode && store.has_next(),
            repeat: has_episode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadedSource {
    index: usize,
    url: String,
}

/// Owns the single media element and keeps it in step with the store.
///
/// `sync` pushes store state into the element; `pump` pulls element events
/// back into the store and re-syncs.
pub(crate) struct PlayerView<M: MediaElement> {
    element: M,
    loaded: Option<LoadedSource>,
    applied_playing: Option<bool>,
    applied_looping: Option<bool>,
    following_time: bool,
    progress: u64,
}

impl<M: MediaElement> PlayerView<M> {
    pub(crate) fn new(element: M) -> Self {
        Self {
            element,
            loaded: None,
            applied_playing: None,
            applied_looping: None,
            following_time: false,
            progress: 0,
        }
    }

    /// Displayed elapsed time, whole seconds.
    pub(crate) fn progress(&self) -> u64 {
        self.progress
    }

    #[cfg(test)]
    pub(crate) fn element(&self) -> &M {
        &self.element
    }

    pub(crate) fn sync(&mut self, store: &PlayerStore) -> Result<()> {
        let wanted = store.current_episode().map(|episode| LoadedSource {
            index: store.current_index(),
            url: episode.url.clone(),
        });

        if wanted != self.loaded {
            match &wanted {
                Some(source) => {
                    info!(url = %source.url, index = source.index, "loading episode audio");
                    self.element.load(&source.url)?;
                    // loading autoplays
                    self.applied_playing = Some(true);
                    self.applied_looping = None;
                }
                None => {
                    info!("queue emptied, stopping playback");
                    self.element.stop()?;
                    self.applied_playing = None;
                    self.applied_looping = None;
                }
            }
            self.loaded = wanted;
            self.following_time = false;
            self.progress = 0;
        }

        if self.loaded.is_none() {
            return Ok(());
        }

        if self.applied_looping != Some(store.is_looping()) {
            self.element.set_looping(store.is_looping())?;
            self.applied_looping = Some(store.is_looping());
        }

        if self.applied_playing != Some(store.is_playing()) {
            if store.is_playing() {
                self.element.play()?;
            } else {
                self.element.pause()?;
            }
            self.applied_playing = Some(store.is_playing());
        }
        Ok(())
    }

    pub(crate) fn handle_event(&mut self, event: MediaEvent, store: &mut PlayerStore) -> Result<()> {
        match event {
            MediaEvent::LoadedMetadata => {
                self.element.set_position(0.0)?;
                self.progress = 0;
                self.following_time = true;
            }
            MediaEvent::TimeUpdate(position) => {
                if self.following_time {
                    self.progress = position.max(0.0).floor() as u64;
                }
            }
            // until the current source reports its metadata, lifecycle
            // events still belong to the previous source or an idle element
            MediaEvent::Play | MediaEvent::Pause | MediaEvent::Ended if !self.following_time => {
                debug!(?event, "ignoring event from a previous source");
            }
            MediaEvent::Play => {
                store.set_playing_state(true);
                self.applied_playing = Some(true);
            }
            MediaEvent::Pause => {
                store.set_playing_state(false);
                self.applied_playing = Some(false);
            }
            MediaEvent::Ended => {
                debug!(has_next = store.has_next(), "episode ended");
                if store.has_next() {
                    store.play_next();
                } else {
                    store.clear_player_state();
                }
            }
        }
        Ok(())
    }

    /// Drains pending element events into the store, then re-syncs.
    pub(crate) fn pump(&mut self, store: &mut PlayerStore) -> Result<()> {
        for event in self.element.poll_events() {
            self.handle_event(event, store)?;
        }
        self.sync(store)
    }

    pub(crate) fn seek(&mut self, seconds: u64, store: &PlayerStore) -> Result<()> {
        let Some(episode) = store.current_episode() else {
            return Ok(());
        };
        let target = seconds.min(episode.duration);
        self.element.set_position(target as f64)?;
        self.progress = target;
        Ok(())
    }

    pub(crate) fn seek_by(&mut self, delta: i64, store: &PlayerStore) -> Result<()> {
        let target = self.progress.saturating_add_signed(delta);
        self.seek(target, store)
    }
}

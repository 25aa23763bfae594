use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::catalog::Episode;

use super::error::PlayerError;

/// Shared player state: the queued episodes, which one is current, and the
/// playback flags. Pages write into it, the player view reads from it and
/// reports media events back.
pub(crate) struct PlayerStore {
    episode_list: Vec<Episode>,
    current_index: usize,
    is_playing: bool,
    is_looping: bool,
    is_shuffling: bool,
    rng: StdRng,
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl PlayerStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_rng(rng: StdRng) -> Self {
        Self {
            episode_list: Vec::new(),
            current_index: 0,
            is_playing: false,
            is_looping: false,
            is_shuffling: false,
            rng,
        }
    }

    #[cfg(test)]
    pub(crate) fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub(crate) fn episode_list(&self) -> &[Episode] {
        &self.episode_list
    }

    pub(crate) fn current_index(&self) -> usize {
        self.current_index
    }

    pub(crate) fn current_episode(&self) -> Option<&Episode> {
        self.episode_list.get(self.current_index)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.episode_list.is_empty()
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub(crate) fn is_looping(&self) -> bool {
        self.is_looping
    }

    pub(crate) fn is_shuffling(&self) -> bool {
        self.is_shuffling
    }

    pub(crate) fn has_next(&self) -> bool {
        (self.is_shuffling && self.episode_list.len() > 1)
            || self.current_index + 1 < self.episode_list.len()
    }

    pub(crate) fn has_previous(&self) -> bool {
        self.current_index > 0
    }

    pub(crate) fn play(&mut self, episode: Episode) {
        debug!(episode = %episode.id, "play single episode");
        self.episode_list = vec![episode];
        self.current_index = 0;
        self.is_playing = true;
    }

    pub(crate) fn play_list(&mut self, list: Vec<Episode>, index: usize) -> Result<(), PlayerError> {
        if list.is_empty() {
            self.clear_player_state();
            return Ok(());
        }
        if index >= list.len() {
            return Err(PlayerError::IndexOutOfBounds {
                index,
                len: list.len(),
            });
        }
        debug!(len = list.len(), index, "play episode list");
        self.episode_list = list;
        self.current_index = index;
        self.is_playing = true;
        Ok(())
    }

    /// Appends to the queue. An episode added to an empty queue becomes
    /// current but does not start playing.
    pub(crate) fn enqueue(&mut self, episode: Episode) {
        debug!(episode = %episode.id, "enqueue episode");
        if self.episode_list.is_empty() {
            self.current_index = 0;
        }
        self.episode_list.push(episode);
    }

    pub(crate) fn toggle_play(&mut self) {
        self.is_playing = !self.is_playing;
    }

    pub(crate) fn toggle_loop(&mut self) {
        self.is_looping = !self.is_looping;
    }

    pub(crate) fn toggle_shuffle(&mut self) {
        self.is_shuffling = !self.is_shuffling;
    }

    pub(crate) fn set_playing_state(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub(crate) fn play_next(&mut self) {
        if self.is_shuffling && self.episode_list.len() > 1 {
            self.current_index = self.random_other_index();
        } else if self.current_index + 1 < self.episode_list.len() {
            self.current_index += 1;
        } else {
            debug!("no next episode, clearing player");
            self.clear_player_state();
            return;
        }
        debug!(index = self.current_index, "advanced to next episode");
    }

    pub(crate) fn play_previous(&mut self) {
        if !self.has_previous() {
            return;
        }
        if self.is_shuffling && self.episode_list.len() > 1 {
            self.current_index = self.random_other_index();
        } else {
            self.current_index -= 1;
        }
        debug!(index = self.current_index, "moved to previous episode");
    }

    pub(crate) fn clear_player_state(&mut self) {
        self.episode_list.clear();
        self.current_index = 0;
        self.is_playing = false;
        self.is_looping = false;
        self.is_shuffling = false;
    }

    // Uniform over every index except the current one; needs len > 1.
    fn random_other_index(&mut self) -> usize {
        let len = self.episode_list.len();
        let offset = self.rng.gen_range(1..len);
        (self.current_index + offset) % len
    }
}

//! Player state and the single media element it drives.
//!
//! [`PlayerStore`] holds the queue and flags; [`PlayerView`] reconciles a
//! [`MediaElement`] with the store and feeds media events back into it.

mod error;
mod media;
mod mpv;
mod store;
mod view;


pub(crate) use self::mpv::MpvElement;
pub(crate) use self::store::PlayerStore;
pub(crate) use self::view::{PlayerView, TransportControls};

#[cfg(test)]
use self::error::{MediaError, PlayerError};
#[cfg(test)]
use self::media::{MediaElement, MediaEvent};

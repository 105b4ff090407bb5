//! Live event distribution.
//!
//! Events are keyed by bout. The [`EventDistributor`] keeps a replayable
//! [`LiveBoutState`] per active bout so spectators who join mid-bout see the
//! same prefix as everyone else before any new live event.

mod distributor;
mod subscription;
mod types;

pub use distributor::EventDistributor;
pub use subscription::{FeedItem, Subscription};
pub use types::{
    EndEvent, EventKind, LiveBoutState, LiveEvent, ProgressEvent, Stage, StartEvent, TurnEvent,
};

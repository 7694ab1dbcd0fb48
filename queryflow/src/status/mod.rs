//! Status broadcasting for live progress observation.

pub mod broadcaster;

pub use broadcaster::{CollectingSubscriber, StatusBroadcaster, StatusSubscriber, SubscriptionId};

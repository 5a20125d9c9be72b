#[cfg(feature = "twitch")]
pub mod twitch;
#[cfg(feature = "twitch")]
pub use self::twitch::{Chat as TwitchChat, ChatEvent as TwitchChatEvent, MessageSegment as TwitchMessageSegment, TwitchIdentity};

#[cfg(feature = "youtube")]
pub mod youtube;

#[cfg(all(feature = "twitch", feature = "youtube"))]
pub mod multicast;
#[cfg(all(feature = "twitch", feature = "youtube"))]
pub use self::multicast::{Multicast, MulticastError, VariantChat};

pub mod error;
pub use self::error::Error;

pub mod flags;
pub use self::flags::MessageFlag;

pub mod message;
pub use self::message::{Element, Message, MessageBuilder};

pub mod history;
pub use self::history::{Channel, History, Snapshot};

#[cfg(feature = "image-cache")]
pub mod image;
#[cfg(feature = "image-cache")]
pub use self::image::{Handle as ImageHandle, ImageCache, ImageResource};

pub mod layout;
pub use self::layout::{Generations, GlyphMetrics, LayoutEntry, MonospaceMetrics};

#[cfg(feature = "eventapi")]
pub mod eventclient;
#[cfg(feature = "eventapi")]
pub use self::eventclient::{EventClient, EventClientConfig};

#[cfg(feature = "eventapi")]
pub mod submux;
#[cfg(feature = "eventapi")]
pub use self::submux::SubscriptionMultiplexer;

pub mod chatters;
pub use self::chatters::{ChatterIndex, Prefix};

pub mod completion;

pub(crate) mod util;

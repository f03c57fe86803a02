//! Message type constants.

/// Plain text message.
pub const TEXT: &str = "m.text";
/// Bot-style notice.
pub const NOTICE: &str = "m.notice";
/// Emote (`/me`) message.
pub const EMOTE: &str = "m.emote";
/// Image message.
pub const IMAGE: &str = "m.image";

/// Synthetic message type given to sticker events.
///
/// Stickers are an event type rather than a message type, but for filtering
/// purposes they behave like images.
pub const STICKER: &str = "m.sticker";

/// Message types allowed when a protection does not configure its own list.
pub const DEFAULT_ALLOWED: [&str; 3] = [TEXT, NOTICE, EMOTE];

//! Identifier newtypes.

use serde::{Deserialize, Serialize};

/// A user identifier such as `@alice:example.org`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the home server, the part after the first `:`.
    ///
    /// ```
    /// use bulwark_core::UserId;
    ///
    /// let user = UserId::new("@alice:example.org:8448");
    /// assert_eq!(user.home_server(), Some("example.org:8448"));
    /// assert_eq!(UserId::new("@nodomain").home_server(), None);
    /// ```
    pub fn home_server(&self) -> Option<&str> {
        self.0
            .split_once(':')
            .map(|(_, server)| server)
            .filter(|server| !server.is_empty())
    }

    /// Returns the home server as a [`ServerName`].
    pub fn server_name(&self) -> Option<ServerName> {
        self.home_server().map(ServerName::new)
    }

    /// Returns the `matrix.to` link for this user.
    pub fn matrix_to_url(&self) -> String {
        format!("https://matrix.to/#/{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A room identifier such as `!abc:example.org`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a room identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `matrix.to` link for this room.
    pub fn matrix_to_url(&self) -> String {
        format!("https://matrix.to/#/{}", self.0)
    }

    /// Returns the `matrix.to` link for an event in this room.
    pub fn event_matrix_to_url(&self, event: &EventId) -> String {
        format!("https://matrix.to/#/{}/{}", self.0, event)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An event identifier such as `$xyz`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates an event identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A server name such as `example.org` or `example.org:8448`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ServerName(String);

impl ServerName {
    /// Creates a server name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServerName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for ServerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

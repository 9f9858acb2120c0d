//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Room name value object.
///
/// ルーム名。作成時に一意性が強制される（Room Directory 側の責務）。
/// ここでは形式のみ検証する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    pub const MAX_LEN: usize = 64;

    /// Create a new RoomName.
    ///
    /// Leading/trailing whitespace is trimmed before validation.
    ///
    /// # Returns
    ///
    /// A Result containing the RoomName or an error if validation fails
    pub fn new(name: impl Into<String>) -> Result<Self, ValueObjectError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::RoomNameEmpty);
        }
        let len = trimmed.chars().count();
        if len > Self::MAX_LEN {
            return Err(ValueObjectError::RoomNameTooLong {
                max: Self::MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message content value object.
///
/// メッセージ本文。前後の空白を取り除いた上で空でないことのみ検証する。
/// フレーム長の上限はトランスポート層が持つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent(String);

impl MessageContent {
    /// Create a new MessageContent.
    ///
    /// # Returns
    ///
    /// A Result containing the trimmed MessageContent, or
    /// `ValueObjectError::MessageContentEmpty` when the content is blank.
    pub fn new(content: impl Into<String>) -> Result<Self, ValueObjectError> {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::MessageContentEmpty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

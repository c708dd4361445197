//! Visit identifier.
//!
//! Visits live in an external document store whose keys are opaque strings,
//! so unlike numeric database ids this wraps a `String`. The identifier is
//! not secret: it travels in plain sight in redemption URLs next to the
//! check-in token.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`VisitId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VisitIdError {
    /// The input is empty or only whitespace.
    #[error("visit id cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("visit id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a control character.
    #[error("visit id cannot contain control characters")]
    ControlCharacter,
}

/// Identifier of the visit a check-in token is bound to.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length: 1-128 characters after trimming
/// - No control characters
///
/// ## Examples
///
/// ```
/// use checkin_core::VisitId;
///
/// assert!(VisitId::parse("aB3xYz9").is_ok());
/// assert_eq!(VisitId::parse("  visit-1 ").unwrap().as_str(), "visit-1");
///
/// assert!(VisitId::parse("").is_err());
/// assert!(VisitId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct VisitId(String);

impl VisitId {
    /// Maximum length of a visit id.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `VisitId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`] characters, or contains control characters.
    pub fn parse(s: &str) -> Result<Self, VisitIdError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(VisitIdError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(VisitIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(char::is_control) {
            return Err(VisitIdError::ControlCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `VisitId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for VisitId {
    type Err = VisitIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VisitId {
    type Error = VisitIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VisitId> for String {
    fn from(id: VisitId) -> Self {
        id.0
    }
}

impl AsRef<str> for VisitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

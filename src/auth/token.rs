//! The session token stored, encrypted, in the auth cookie.

use std::cmp::max;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::auth::UserID;

/// Proof that a user logged in, valid until `expires_at`.
///
/// The expiry is stored as a Unix timestamp, so it only has whole second precision.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Token {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// When the token stops being valid.
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Create a token for `user_id` that expires at `expires_at`, rounded down to the second.
    pub fn new(user_id: UserID, expires_at: OffsetDateTime) -> Self {
        let subsecond = Duration::nanoseconds(i64::from(expires_at.nanosecond()));

        Self {
            user_id,
            expires_at: expires_at - subsecond,
        }
    }

    /// Whether the token is no longer valid at `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    /// A copy of the token that expires at `expires_at`, unless it already expires later.
    pub fn extended_to(&self, expires_at: OffsetDateTime) -> Self {
        Self::new(self.user_id, max(self.expires_at, expires_at))
    }
}

#[cfg(test)]
mod token_tests {
    use time::{UtcOffset, macros::datetime};

    use crate::auth::{UserID, token::Token};

    #[test]
    fn serializes_expiry_as_timestamp() {
        let token = Token::new(UserID::new(7), datetime!(2024-01-01 00:00:00 UTC));

        let json = serde_json::to_string(&token).unwrap();

        assert_eq!(json, r#"{"user_id":7,"expires_at":1704067200}"#);
        assert_eq!(serde_json::from_str::<Token>(&json).unwrap(), token);
    }

    #[test]
    fn drops_subseconds() {
        let token = Token::new(UserID::new(1), datetime!(2024-03-15 12:30:45.999 UTC));

        assert_eq!(token.expires_at, datetime!(2024-03-15 12:30:45 UTC));
    }

    #[test]
    fn expiry_is_independent_of_offset() {
        let utc = datetime!(2024-03-15 12:00:00 UTC);
        let sao_paulo = utc.to_offset(UtcOffset::from_hms(-3, 0, 0).unwrap());

        let token = Token::new(UserID::new(1), sao_paulo);

        assert!(token.is_expired_at(utc));
        assert!(!token.is_expired_at(datetime!(2024-03-15 11:59:59 UTC)));
    }

    #[test]
    fn extension_never_shortens_expiry() {
        let token = Token::new(UserID::new(1), datetime!(2024-03-15 12:00:00 UTC));

        let shorter = token.extended_to(datetime!(2024-03-15 11:00:00 UTC));
        let longer = token.extended_to(datetime!(2024-03-15 13:00:00 UTC));

        assert_eq!(shorter.expires_at, token.expires_at);
        assert_eq!(longer.expires_at, datetime!(2024-03-15 13:00:00 UTC));
        assert_eq!(longer.user_id, token.user_id);
    }
}

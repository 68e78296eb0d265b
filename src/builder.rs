//! Role-based token issuing
//!
//! A pure policy layer over [`AccessToken`]: every role may join the channel,
//! and publishing roles additionally get the three media-publish privileges.
//! All privileges share the caller's expiry timestamp.

use crate::privilege::Privilege;
use crate::token::{AccessToken, TokenError};

/// Caller role determining which privileges a token carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Role {
    Attendee = 0,
    Publisher = 1,
    Subscriber = 2,
    Admin = 101,
}

impl Role {
    /// Whether this role may publish audio, video, and data streams
    pub fn can_publish(self) -> bool {
        matches!(self, Role::Attendee | Role::Publisher | Role::Admin)
    }
}

/// Build a token for a numeric uid. Uid 0 means "no specific user" and is
/// bound as the empty string.
pub fn build_token_with_uid(
    app_id: &str,
    app_certificate: &str,
    channel_name: &str,
    uid: u32,
    role: Role,
    privilege_expired_ts: u32,
) -> Result<String, TokenError> {
    let account = if uid == 0 {
        String::new()
    } else {
        uid.to_string()
    };
    build_token_with_account(
        app_id,
        app_certificate,
        channel_name,
        &account,
        role,
        privilege_expired_ts,
    )
}

/// Build a token for a string account identifier.
pub fn build_token_with_account(
    app_id: &str,
    app_certificate: &str,
    channel_name: &str,
    account: &str,
    role: Role,
    privilege_expired_ts: u32,
) -> Result<String, TokenError> {
    let mut token = AccessToken::new(app_id, app_certificate, channel_name, account);
    token.add_privilege(Privilege::JoinChannel, privilege_expired_ts);
    if role.can_publish() {
        token.add_privilege(Privilege::PublishAudioStream, privilege_expired_ts);
        token.add_privilege(Privilege::PublishVideoStream, privilege_expired_ts);
        token.add_privilege(Privilege::PublishDataStream, privilege_expired_ts);
    }
    token.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_APP_ID: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const TEST_CERT: &str = "secret";
    const EXPIRE_TS: u32 = 1_700_003_600;

    #[test]
    fn test_subscriber_gets_join_only() {
        let s = build_token_with_uid(TEST_APP_ID, TEST_CERT, "room1", 7, Role::Subscriber, EXPIRE_TS)
            .unwrap();
        let parsed = AccessToken::from_string(&s).unwrap();

        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(parsed.messages.expiry(Privilege::JoinChannel), Some(EXPIRE_TS));
        assert!(!parsed.messages.contains(Privilege::PublishAudioStream));
    }

    #[test]
    fn test_publisher_gets_all_four() {
        let s = build_token_with_uid(TEST_APP_ID, TEST_CERT, "room1", 7, Role::Publisher, EXPIRE_TS)
            .unwrap();
        let parsed = AccessToken::from_string(&s).unwrap();

        assert_eq!(parsed.messages.len(), 4);
        for privilege in [
            Privilege::JoinChannel,
            Privilege::PublishAudioStream,
            Privilege::PublishVideoStream,
            Privilege::PublishDataStream,
        ] {
            assert_eq!(parsed.messages.expiry(privilege), Some(EXPIRE_TS));
        }
    }

    #[test]
    fn test_attendee_and_admin_can_publish() {
        assert!(Role::Attendee.can_publish());
        assert!(Role::Admin.can_publish());
        assert!(Role::Publisher.can_publish());
        assert!(!Role::Subscriber.can_publish());
    }

    #[test]
    fn test_uid_zero_binds_empty_account() {
        let s = build_token_with_uid(TEST_APP_ID, TEST_CERT, "room1", 0, Role::Publisher, EXPIRE_TS)
            .unwrap();
        let parsed = AccessToken::from_string(&s).unwrap();

        // CRC32 of the empty string is zero
        assert_eq!(parsed.crc_uid, 0);
        assert!(parsed.verify(TEST_CERT, "room1", ""));
    }

    #[test]
    fn test_account_token_binds_account_string() {
        let s = build_token_with_account(
            TEST_APP_ID,
            TEST_CERT,
            "room1",
            "alice@example",
            Role::Subscriber,
            EXPIRE_TS,
        )
        .unwrap();
        let parsed = AccessToken::from_string(&s).unwrap();

        assert_eq!(parsed.crc_uid, crc32fast::hash(b"alice@example"));
        assert!(parsed.verify(TEST_CERT, "room1", "alice@example"));
    }
}

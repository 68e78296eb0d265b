//! Compact signed access tokens for real-time channel authorization
//!
//! Generates and parses versioned token strings that grant a client
//! time-limited privileges (join, publish audio/video/data, RTM login) in a
//! named channel. A token is `version ++ appID ++ base64(content)`, where the
//! content carries an HMAC-SHA256 signature keyed by the app certificate and
//! CRC32 bindings of the channel name and uid.
//!
//! # Example
//!
//! ```
//! use rtc_token::{build_token_with_uid, AccessToken, Privilege, Role};
//!
//! let app_id = "a".repeat(32);
//! let token = build_token_with_uid(
//!     &app_id,
//!     "app-certificate",
//!     "room1",
//!     2882341273,
//!     Role::Publisher,
//!     1_700_003_600,
//! )
//! .unwrap();
//! assert!(token.starts_with("006"));
//!
//! // Inspecting a token does not require the certificate
//! let parsed = AccessToken::from_string(&token).unwrap();
//! assert_eq!(parsed.messages.expiry(Privilege::JoinChannel), Some(1_700_003_600));
//!
//! // Verifying it does
//! assert!(parsed.verify("app-certificate", "room1", "2882341273"));
//! ```

pub mod builder;
pub mod codec;
pub mod privilege;
pub mod token;

pub use builder::{build_token_with_account, build_token_with_uid, Role};
pub use codec::{ByteBuf, CodecError, ReadByteBuf};
pub use privilege::{Privilege, PrivilegeMap};
pub use token::{AccessToken, AccessTokenContent, Message, TokenError, VERSION};

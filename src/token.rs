//! Access token structures, signing, and parsing
//!
//! Wire format of the token string:
//! `version (3 chars) ++ appID (32 chars) ++ base64(content)`
//!
//! The content blob carries the HMAC-SHA256 signature, CRC32 bindings of the
//! channel name and uid, and the packed message (salt, issue timestamp,
//! privilege map). Parsing reconstructs the structure without the
//! certificate; signature verification is a separate step.

use crate::codec::{ByteBuf, CodecError, ReadByteBuf};
use crate::privilege::{Privilege, PrivilegeMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Current token version tag
pub const VERSION: &str = "006";
pub const VERSION_LENGTH: usize = 3;
/// App IDs are embedded unencoded at a fixed offset, so they must be
/// exactly this many bytes
pub const APP_ID_LENGTH: usize = 32;

/// Issue timestamps are set this far past the build time
const TOKEN_ISSUE_OFFSET_SECS: u32 = 24 * 3600;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    /// The token's version prefix does not match the supported version
    #[error("unsupported token version: expected '{expected}', got '{got}'")]
    UnsupportedVersion { expected: &'static str, got: String },

    /// Invalid base64 or a structurally inconsistent token string
    #[error("malformed token encoding: {0}")]
    MalformedEncoding(String),

    /// The app ID is not exactly 32 bytes
    #[error("app ID must be exactly 32 bytes, got {0}")]
    InvalidAppId(usize),

    /// A binary field failed to encode or decode
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The signed inner payload: salt, issue timestamp, privilege map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub salt: u32,
    pub ts: u32,
    pub messages: PrivilegeMap,
}

impl Message {
    pub fn pack(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = ByteBuf::new();
        buf.put_uint32(self.salt);
        buf.put_uint32(self.ts);
        buf.put_privilege_map(&self.messages)?;
        Ok(buf.pack())
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut rd = ReadByteBuf::new(bytes);
        Ok(Self {
            salt: rd.get_uint32()?,
            ts: rd.get_uint32()?,
            messages: rd.get_privilege_map()?,
        })
    }
}

/// The base64-encoded portion of the token string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenContent {
    /// Raw HMAC-SHA256 digest over appID, channel name, uid, and the
    /// packed message
    pub signature: Vec<u8>,
    /// CRC32 of the channel name
    pub crc_channel: u32,
    /// CRC32 of the uid string
    pub crc_uid: u32,
    /// Packed [`Message`]
    pub m: Vec<u8>,
}

impl AccessTokenContent {
    pub fn pack(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = ByteBuf::new();
        buf.put_bytes(&self.signature)?;
        buf.put_uint32(self.crc_channel);
        buf.put_uint32(self.crc_uid);
        buf.put_bytes(&self.m)?;
        Ok(buf.pack())
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut rd = ReadByteBuf::new(bytes);
        Ok(Self {
            signature: rd.get_bytes()?,
            crc_channel: rd.get_uint32()?,
            crc_uid: rd.get_uint32()?,
            m: rd.get_bytes()?,
        })
    }
}

/// A channel access token.
///
/// Build path: construct with [`AccessToken::new`], grant privileges with
/// [`AccessToken::add_privilege`], then call [`AccessToken::build`]. The salt
/// is randomized at construction, so repeated builds on the same instance are
/// deterministic.
///
/// Parse path: [`AccessToken::from_string`] reconstructs the token without
/// the certificate. The signature and CRCs come from the wire and are not
/// re-checked by parsing; call [`AccessToken::verify`] with the certificate
/// to authenticate them.
#[derive(Clone)]
pub struct AccessToken {
    pub app_id: String,
    app_certificate: String,
    pub channel_name: String,
    /// Empty string means "no specific user"
    pub uid: String,
    pub salt: u32,
    pub ts: u32,
    pub messages: PrivilegeMap,
    /// Populated by [`AccessToken::from_string`]
    pub signature: Vec<u8>,
    pub crc_channel: u32,
    pub crc_uid: u32,
}

impl AccessToken {
    pub fn new(
        app_id: impl Into<String>,
        app_certificate: impl Into<String>,
        channel_name: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_certificate: app_certificate.into(),
            channel_name: channel_name.into(),
            uid: uid.into(),
            salt: rand::rng().random(),
            ts: unix_now().wrapping_add(TOKEN_ISSUE_OFFSET_SECS),
            messages: PrivilegeMap::new(),
            signature: Vec::new(),
            crc_channel: 0,
            crc_uid: 0,
        }
    }

    /// Grant a privilege until the given expiry timestamp
    pub fn add_privilege(&mut self, privilege: Privilege, expire_ts: u32) {
        self.messages.grant(privilege, expire_ts);
    }

    /// Sign the current state and produce the final token string
    pub fn build(&self) -> Result<String, TokenError> {
        if self.app_id.len() != APP_ID_LENGTH {
            return Err(TokenError::InvalidAppId(self.app_id.len()));
        }

        let m = Message {
            salt: self.salt,
            ts: self.ts,
            messages: self.messages.clone(),
        }
        .pack()?;

        let signature = sign(
            &self.app_certificate,
            &self.app_id,
            &self.channel_name,
            &self.uid,
            &m,
        );

        let content = AccessTokenContent {
            signature,
            crc_channel: crc32fast::hash(self.channel_name.as_bytes()),
            crc_uid: crc32fast::hash(self.uid.as_bytes()),
            m,
        }
        .pack()?;

        tracing::debug!(
            channel = %self.channel_name,
            uid = %self.uid,
            privileges = self.messages.len(),
            "issuing access token"
        );

        Ok(format!("{}{}{}", VERSION, self.app_id, STANDARD.encode(content)))
    }

    /// Parse a token string, populating every field except the certificate.
    ///
    /// All decode failures surface as a [`TokenError`]; nothing panics past
    /// this boundary.
    pub fn from_string(token: &str) -> Result<Self, TokenError> {
        let bytes = token.as_bytes();
        if bytes.len() < VERSION_LENGTH {
            return Err(TokenError::MalformedEncoding(
                "token shorter than the version tag".to_string(),
            ));
        }

        let version = &bytes[..VERSION_LENGTH];
        if version != VERSION.as_bytes() {
            return Err(TokenError::UnsupportedVersion {
                expected: VERSION,
                got: String::from_utf8_lossy(version).into_owned(),
            });
        }

        if bytes.len() < VERSION_LENGTH + APP_ID_LENGTH {
            return Err(TokenError::MalformedEncoding(
                "token shorter than the version tag and app ID".to_string(),
            ));
        }

        let app_id = std::str::from_utf8(&bytes[VERSION_LENGTH..VERSION_LENGTH + APP_ID_LENGTH])
            .map_err(|_| TokenError::MalformedEncoding("app ID is not valid UTF-8".to_string()))?
            .to_string();

        let content_bytes = STANDARD
            .decode(&bytes[VERSION_LENGTH + APP_ID_LENGTH..])
            .map_err(|e| TokenError::MalformedEncoding(e.to_string()))?;

        let content = AccessTokenContent::unpack(&content_bytes)?;
        let message = Message::unpack(&content.m)?;

        Ok(Self {
            app_id,
            app_certificate: String::new(),
            channel_name: String::new(),
            uid: String::new(),
            salt: message.salt,
            ts: message.ts,
            messages: message.messages,
            signature: content.signature,
            crc_channel: content.crc_channel,
            crc_uid: content.crc_uid,
        })
    }

    /// Verify a parsed token against the certificate and the presented
    /// channel/uid pair.
    ///
    /// Checks the CRC bindings first (cheap), then recomputes the HMAC over
    /// the canonically repacked message and compares it to the embedded
    /// signature in constant time.
    pub fn verify(&self, app_certificate: &str, channel_name: &str, uid: &str) -> bool {
        if crc32fast::hash(channel_name.as_bytes()) != self.crc_channel {
            return false;
        }
        if crc32fast::hash(uid.as_bytes()) != self.crc_uid {
            return false;
        }

        let m = match (Message {
            salt: self.salt,
            ts: self.ts,
            messages: self.messages.clone(),
        })
        .pack()
        {
            Ok(m) => m,
            Err(_) => return false,
        };

        let mut mac = HmacSha256::new_from_slice(app_certificate.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(self.app_id.as_bytes());
        mac.update(channel_name.as_bytes());
        mac.update(uid.as_bytes());
        mac.update(&m);
        mac.verify_slice(&self.signature).is_ok()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("app_id", &self.app_id)
            .field("app_certificate", &"[REDACTED]")
            .field("channel_name", &self.channel_name)
            .field("uid", &self.uid)
            .field("salt", &self.salt)
            .field("ts", &self.ts)
            .field("messages", &self.messages)
            .field("crc_channel", &self.crc_channel)
            .field("crc_uid", &self.crc_uid)
            .finish()
    }
}

/// HMAC-SHA256 over appID, channel name, uid, and the packed message,
/// keyed by the app certificate
fn sign(certificate: &str, app_id: &str, channel_name: &str, uid: &str, message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(certificate.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(app_id.as_bytes());
    mac.update(channel_name.as_bytes());
    mac.update(uid.as_bytes());
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

//! Privileges and their expiry timestamps
//!
//! Privilege IDs are protocol-stable and must never be renumbered. The map
//! keeps entries sorted by numeric ID so serialization is byte-identical
//! across implementations regardless of insertion order.

use std::collections::BTreeMap;

/// An action a token may authorize, each with its own expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum Privilege {
    JoinChannel = 1,
    PublishAudioStream = 2,
    PublishVideoStream = 3,
    PublishDataStream = 4,
    RtmLogin = 1000,
}

impl Privilege {
    /// The wire ID of this privilege
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Look up a privilege by its wire ID
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            1 => Some(Privilege::JoinChannel),
            2 => Some(Privilege::PublishAudioStream),
            3 => Some(Privilege::PublishVideoStream),
            4 => Some(Privilege::PublishDataStream),
            1000 => Some(Privilege::RtmLogin),
            _ => None,
        }
    }
}

/// Mapping from privilege ID to a 32-bit expiry timestamp (seconds since
/// epoch).
///
/// Keys are raw wire IDs so tokens carrying privileges this build does not
/// know about still round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeMap {
    entries: BTreeMap<u16, u32>,
}

impl PrivilegeMap {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Grant a privilege until the given expiry, replacing any earlier grant
    pub fn grant(&mut self, privilege: Privilege, expire_ts: u32) {
        self.entries.insert(privilege.id(), expire_ts);
    }

    /// Insert an entry by raw wire ID (used when decoding)
    pub fn insert_raw(&mut self, id: u16, expire_ts: u32) {
        self.entries.insert(id, expire_ts);
    }

    /// Expiry of a granted privilege, or `None` if not granted
    pub fn expiry(&self, privilege: Privilege) -> Option<u32> {
        self.entries.get(&privilege.id()).copied()
    }

    pub fn contains(&self, privilege: Privilege) -> bool {
        self.entries.contains_key(&privilege.id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries as (id, expiry) pairs in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (u16, u32)> + '_ {
        self.entries.iter().map(|(&id, &ts)| (id, ts))
    }
}

impl FromIterator<(Privilege, u32)> for PrivilegeMap {
    fn from_iter<T: IntoIterator<Item = (Privilege, u32)>>(iter: T) -> Self {
        let mut map = PrivilegeMap::new();
        for (privilege, expire_ts) in iter {
            map.grant(privilege, expire_ts);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ids() {
        assert_eq!(Privilege::JoinChannel.id(), 1);
        assert_eq!(Privilege::PublishAudioStream.id(), 2);
        assert_eq!(Privilege::PublishVideoStream.id(), 3);
        assert_eq!(Privilege::PublishDataStream.id(), 4);
        assert_eq!(Privilege::RtmLogin.id(), 1000);
    }

    #[test]
    fn test_from_id() {
        assert_eq!(Privilege::from_id(1), Some(Privilege::JoinChannel));
        assert_eq!(Privilege::from_id(1000), Some(Privilege::RtmLogin));
        assert_eq!(Privilege::from_id(0), None);
        assert_eq!(Privilege::from_id(999), None);
    }

    #[test]
    fn test_grant_and_expiry() {
        let mut map = PrivilegeMap::new();
        assert!(map.is_empty());

        map.grant(Privilege::JoinChannel, 100);
        assert_eq!(map.expiry(Privilege::JoinChannel), Some(100));
        assert_eq!(map.expiry(Privilege::RtmLogin), None);

        // Re-granting replaces the expiry
        map.grant(Privilege::JoinChannel, 200);
        assert_eq!(map.expiry(Privilege::JoinChannel), Some(200));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_iteration_order_independent_of_insertion() {
        let mut map = PrivilegeMap::new();
        map.grant(Privilege::RtmLogin, 5);
        map.grant(Privilege::PublishDataStream, 4);
        map.grant(Privilege::JoinChannel, 1);

        let ids: Vec<u16> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 4, 1000]);
    }

    #[test]
    fn test_unknown_raw_id_preserved() {
        let mut map = PrivilegeMap::new();
        map.insert_raw(77, 123);
        assert_eq!(map.len(), 1);
        let entries: Vec<(u16, u32)> = map.iter().collect();
        assert_eq!(entries, vec![(77, 123)]);
    }
}

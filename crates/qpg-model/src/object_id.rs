use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::ObjectKind;

/// `ObjectId` is a deterministic, content-addressed, human-pastable
/// identifier for a [`crate::DbObject`]. It is a fixed 8-byte payload
/// derived from `(source_name, kind, fqname)` and rendered as lowercase
/// hex.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 8]);

impl ObjectId {
    /// Derive the stable identifier for the identity tuple
    /// `(source_name, kind, fqname)`. Identical inputs always produce an
    /// identical id; the tuple is the sole input, so reindexing never
    /// changes it unless identity itself changes.
    pub fn derive(source_name: &str, kind: ObjectKind, fqname: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source_name.as_bytes());
        hasher.update(b"\0");
        hasher.update(kind.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(fqname.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        ObjectId(bytes)
    }

    pub fn as_bytes(&self) -> [u8; 8] {
        self.0
    }

    pub fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        let exact: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(ObjectId(exact))
    }

    /// Parse either a bare hex fragment or a `#`-prefixed fragment, the
    /// two object identifier shapes a caller may pass to `get`.
    pub fn from_fragment(fragment: &str) -> Result<Self, hex::FromHexError> {
        Self::from_hex(fragment.trim_start_matches('#'))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as fmt::Display>::fmt(self, f)
    }
}

impl FromStr for ObjectId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fragment(s)
    }
}

impl serde::Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        format!("{self}").serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let raw = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
        ObjectId::from_hex(raw.as_ref())
            .map_err(|err| D::Error::custom(format!("invalid object_id: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let a = ObjectId::derive("work", ObjectKind::Table, "public.orders");
        let b = ObjectId::derive("work", ObjectKind::Table, "public.orders");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_identity_distinct_id() {
        let a = ObjectId::derive("work", ObjectKind::Table, "public.orders");
        let b = ObjectId::derive("work", ObjectKind::View, "public.orders");
        let c = ObjectId::derive("work", ObjectKind::Table, "public.refunds");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fragment_round_trips() {
        let id = ObjectId::derive("work", ObjectKind::Column, "public.orders.id");
        let text = format!("#{id}");
        assert_eq!(ObjectId::from_fragment(&text).unwrap(), id);
        assert_eq!(ObjectId::from_fragment(&id.to_string()).unwrap(), id);
    }
}

//! Opaque key material.
//!
//! Actual key generation, signing and verification are the job of an
//! external cryptographic collaborator (§1, §6); this crate only stores and
//! compares the opaque byte forms it is handed.

use std::fmt;

macro_rules! opaque_key {
    ($name:ident) => {
        #[derive(Clone, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub Vec<u8>);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({} bytes)", stringify!($name), self.0.len())
            }
        }
    };
}

opaque_key!(NodeKey);
opaque_key!(DiscoKey);
opaque_key!(KeySignature);
opaque_key!(PrivateNodeKey);
opaque_key!(MachinePublicKey);

/// Key expiry timestamp. `None` means the key never expires.
pub type KeyExpiry = Option<chrono::DateTime<chrono::Utc>>;

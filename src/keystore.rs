//! Private key lookup for the signer

use std::collections::HashMap;

use secp256k1::{All, PublicKey, Secp256k1, SecretKey};

use crate::hash::hash160;
use crate::script::push_data;
use crate::types::*;

/// Source of signing keys, addressed by Hash160 of the serialized public key
pub trait KeyStore {
    /// Private key for `key_id`, if held
    fn private_key(&self, key_id: &KeyId) -> Option<SecretKey>;

    /// Serialized public key for `key_id`, in the form its key id was
    /// derived from (33-byte compressed or 65-byte uncompressed)
    fn public_key(&self, key_id: &KeyId) -> Option<ByteString>;

    /// Push the serialized public key onto `script`.
    ///
    /// Returns false, leaving `script` untouched, when the key is unknown.
    fn append_public_key(&self, key_id: &KeyId, script: &mut ByteString) -> bool {
        match self.public_key(key_id) {
            Some(pubkey) => {
                push_data(script, &pubkey);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredKey {
    secret: SecretKey,
    public: PublicKey,
    compressed: bool,
}

impl StoredKey {
    fn serialized_public_key(&self) -> ByteString {
        if self.compressed {
            self.public.serialize().to_vec()
        } else {
            self.public.serialize_uncompressed().to_vec()
        }
    }
}

/// In-memory [`KeyStore`]
pub struct MemoryKeyStore {
    secp: Secp256k1<All>,
    keys: HashMap<KeyId, StoredKey>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
            keys: HashMap::new(),
        }
    }

    /// Add a key and return its key id.
    ///
    /// `compressed` selects the public key serialization, and with it the
    /// key id, since the two forms hash differently.
    pub fn add_key(&mut self, secret: SecretKey, compressed: bool) -> KeyId {
        let stored = StoredKey {
            secret,
            public: PublicKey::from_secret_key(&self.secp, &secret),
            compressed,
        };
        let key_id = hash160(&stored.serialized_public_key());
        self.keys.insert(key_id, stored);
        key_id
    }

    pub fn contains(&self, key_id: &KeyId) -> bool {
        self.keys.contains_key(key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for MemoryKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for MemoryKeyStore {
    fn private_key(&self, key_id: &KeyId) -> Option<SecretKey> {
        self.keys.get(key_id).map(|key| key.secret)
    }

    fn public_key(&self, key_id: &KeyId) -> Option<ByteString> {
        self.keys.get(key_id).map(StoredKey::serialized_public_key)
    }
}

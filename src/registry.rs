//! In-memory key store. A public/private pair shares one `key_id` and is
//! stored as two independent records; deletion removes both roles
//! atomically.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::SystemTime;


/// Role of one stored key record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyRole {
    /// Public half of a pair.
    Public,
    /// Private half of a pair.
    Private,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Public => f.write_str("PUBLIC"),
            KeyRole::Private => f.write_str("PRIVATE"),
        }
    }
}


/// Permitted uses of a stored key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyUsage {
    /// Encapsulation against this key.
    Encrypt,
    /// Decapsulation with this key.
    Decrypt,
    /// Signature generation with this key.
    Sign,
    /// Signature verification against this key.
    Verify,
}

/// Descriptive metadata attached to every stored key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    /// NIST-style security category of the generating algorithm.
    pub security_level: u8,
    /// Whether the algorithm is believed quantum-resistant.
    pub quantum_safe: bool,
    /// Operations this record may participate in.
    pub allowed_usages: BTreeSet<KeyUsage>,
}

/// One stored key record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptographicKey {
    /// Generating algorithm name.
    pub algorithm: String,
    /// Public or private half.
    pub role: KeyRole,
    /// Packed key material; length always matches the catalog-declared size
    /// for (algorithm, role).
    pub bytes: Vec<u8>,
    /// Opaque pair identifier.
    pub key_id: String,
    /// Creation instant.
    pub created_at: SystemTime,
    /// Declared expiry; recorded but never enforced, there is no background
    /// sweep.
    pub expires_at: Option<SystemTime>,
    /// Descriptive metadata.
    pub metadata: KeyMetadata,
}


#[derive(Default)]
struct PairEntry {
    public: Option<CryptographicKey>,
    private: Option<CryptographicKey>,
}

impl PairEntry {
    fn slot(&self, role: KeyRole) -> &Option<CryptographicKey> {
        match role {
            KeyRole::Public => &self.public,
            KeyRole::Private => &self.private,
        }
    }

    fn slot_mut(&mut self, role: KeyRole) -> &mut Option<CryptographicKey> {
        match role {
            KeyRole::Public => &mut self.public,
            KeyRole::Private => &mut self.private,
        }
    }

    fn roles(&self) -> usize {
        usize::from(self.public.is_some()) + usize::from(self.private.is_some())
    }
}


/// Process-scoped key store, guarded for concurrent façade callers.
#[derive(Default)]
pub struct KeyRegistry {
    keys: Mutex<HashMap<String, PairEntry>>,
}

impl KeyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Inserts one key record under its `(key_id, role)` slot, replacing any
    /// previous occupant.
    pub fn store(&self, key: CryptographicKey) {
        let mut keys = self.keys.lock();
        let entry = keys.entry(key.key_id.clone()).or_default();
        let role = key.role;
        *entry.slot_mut(role) = Some(key);
    }

    /// Fetches a clone of one stored record.
    #[must_use]
    pub fn get(&self, key_id: &str, role: KeyRole) -> Option<CryptographicKey> {
        self.keys.lock().get(key_id).and_then(|e| e.slot(role).clone())
    }

    /// All stored records, public halves before private for each pair,
    /// ordered by key id for stable listings.
    #[must_use]
    pub fn list_all(&self) -> Vec<CryptographicKey> {
        let keys = self.keys.lock();
        let mut ids: Vec<&String> = keys.keys().collect();
        ids.sort();
        let mut out = Vec::new();
        for id in ids {
            let entry = &keys[id];
            out.extend(entry.public.iter().cloned());
            out.extend(entry.private.iter().cloned());
        }
        out
    }

    /// Removes both roles of a pair. Returns whether anything was removed.
    pub fn delete(&self, key_id: &str) -> bool {
        self.keys.lock().remove(key_id).map_or(0, |e| e.roles()) > 0
    }

    /// Total number of stored records (roles, not pairs).
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.lock().values().map(PairEntry::roles).sum()
    }

    /// Whether the registry holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Stored-record count per algorithm name.
    #[must_use]
    pub fn usage_breakdown(&self) -> BTreeMap<String, u64> {
        let keys = self.keys.lock();
        let mut breakdown = BTreeMap::new();
        for entry in keys.values() {
            for key in entry.public.iter().chain(entry.private.iter()) {
                *breakdown.entry(key.algorithm.clone()).or_insert(0) += 1;
            }
        }
        breakdown
    }
}

use lasso::{Spur, ThreadedRodeo};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for object IDs — fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Alphabet for generated ids (lowercase base-36).
const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a generated id.
const ID_LEN: usize = 9;

/// A lightweight, interned identifier for canvas objects (seats, backgrounds,
/// decorations). Internally a `Spur` index — 4 bytes, Copy, Eq, Hash in O(1).
///
/// The empty string is the "no id" value; documents may omit `id` entirely
/// and the reconciliation pass fills it in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(Spur);

impl ObjectId {
    /// Intern a new string as an ObjectId, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        ObjectId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The "no id" value.
    pub fn empty() -> Self {
        Self::intern("")
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Generate a random 9-character base-36 id.
    ///
    /// Not a cryptographic identifier: callers that need uniqueness within a
    /// canvas must check against their own index (see [`ObjectId::generate_unique`]).
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let s: String = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self::intern(&s)
    }

    /// Generate an id for which `taken` returns false.
    pub fn generate_unique(taken: impl Fn(ObjectId) -> bool) -> Self {
        loop {
            let id = Self::generate();
            if !taken(id) {
                return id;
            }
            log::debug!("generated id {id} collided, retrying");
        }
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Seat ids written by older editors are sometimes numeric.
        let s = crate::model::StringOrNumber::deserialize(deserializer)?;
        Ok(ObjectId::intern(&s.into_string()))
    }
}

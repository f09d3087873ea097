//! Stem - compact string type for DOM content.

use compact_str::CompactString;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use tendril::StrTendril;

/// Compact owned string used for text content, comments, and attribute values.
///
/// Short values (up to 24 bytes on 64-bit targets) are stored inline, which
/// covers most attribute values and keys.
#[derive(Clone, Default)]
pub struct Stem(CompactString);

impl Stem {
    pub fn new() -> Self {
        Self(CompactString::default())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push_str(&mut self, s: &str) {
        self.0.push_str(s);
    }

    pub fn push_tendril(&mut self, t: &StrTendril) {
        self.push_str(t.as_ref());
    }
}

impl Deref for Stem {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for Stem {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Stem {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for Stem {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Stem {}

impl PartialEq<str> for Stem {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Stem {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Hash for Stem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl From<&str> for Stem {
    fn from(s: &str) -> Self {
        Self(CompactString::new(s))
    }
}

impl From<String> for Stem {
    fn from(s: String) -> Self {
        Self(CompactString::from(s))
    }
}

impl From<CompactString> for Stem {
    fn from(s: CompactString) -> Self {
        Self(s)
    }
}

impl From<StrTendril> for Stem {
    fn from(t: StrTendril) -> Self {
        Self(CompactString::new(t.as_ref()))
    }
}

impl From<&StrTendril> for Stem {
    fn from(t: &StrTendril) -> Self {
        Self(CompactString::new(t.as_ref()))
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<Stem>();
    assert_sync::<Stem>();
};

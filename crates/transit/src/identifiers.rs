//! Type-safe, efficient identifiers for freight entities.
//!
//! All identifiers use Arc<str> for cheap cloning and minimal memory overhead.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

// A platform's `site` code, unique across the network.
impl_identifier!(SiteIdentifier);
impl_identifier!(ServiceIdentifier);
impl_identifier!(OperatorIdentifier);

/// Ordered origin/destination pair, the unit routes and rail geometry are keyed by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SitePair {
    pub origin: SiteIdentifier,
    pub destination: SiteIdentifier,
}

impl SitePair {
    pub fn new(origin: SiteIdentifier, destination: SiteIdentifier) -> Self {
        Self { origin, destination }
    }

    pub fn reversed(&self) -> Self {
        Self {
            origin: self.destination.clone(),
            destination: self.origin.clone(),
        }
    }
}

impl fmt::Display for SitePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}||{}", self.origin, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_equality() {
        let id1 = SiteIdentifier::new("LYON-VENISSIEUX");
        let id2 = SiteIdentifier::new("LYON-VENISSIEUX");
        let id3 = id1.clone();

        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
        assert!(Arc::ptr_eq(&id1.0, &id3.0)); // Clone shares Arc
    }

    #[test]
    fn test_identifier_hash() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(SiteIdentifier::new("test"), 42);

        assert_eq!(map.get(&SiteIdentifier::new("test")), Some(&42));
    }

    #[test]
    fn test_identifier_display() {
        let id = OperatorIdentifier::new("Naviland Cargo");
        assert_eq!(format!("{}", id), "Naviland Cargo");
    }

    #[test]
    fn test_site_pair_key() {
        let pair = SitePair::new("A".into(), "B".into());
        assert_eq!(pair.to_string(), "A||B");
        assert_eq!(pair.reversed().to_string(), "B||A");
        assert_eq!(pair.reversed().reversed(), pair);
    }
}

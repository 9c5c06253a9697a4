use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = relay_common::id::prefixed_ulid("conn");
/// assert!(id.starts_with("conn_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Marker trait for types identified by a prefixed ULID.
pub trait PrefixedId {
    const PREFIX: &'static str;

    fn generate() -> String {
        prefixed_ulid(Self::PREFIX)
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    /// Live WebSocket connections registered with the hub.
    pub const CONNECTION: &str = "conn";
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl PrefixedId for Probe {
        const PREFIX: &'static str = "probe";
    }

    #[test]
    fn prefixed_ulid_format() {
        let id = prefixed_ulid(prefix::CONNECTION);
        assert!(id.starts_with("conn_"));
        // ULID is 26 chars, plus prefix + underscore
        assert_eq!(id.len(), 5 + 26);
    }

    #[test]
    fn ids_are_unique() {
        let a = prefixed_ulid(prefix::CONNECTION);
        let b = prefixed_ulid(prefix::CONNECTION);
        assert_ne!(a, b);
    }

    #[test]
    fn trait_generate_uses_prefix() {
        let id = Probe::generate();
        assert!(id.starts_with("probe_"));
        assert!(Ulid::from_string(&id["probe_".len()..]).is_ok());
    }
}

//! Domain model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Restriction class assigned to new domains.
pub const DEFAULT_RCLASS: &str = "DEFAULT";

/// Unique identifier for a domain row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainId(pub i64);

impl DomainId {
    /// Create a new domain ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Postfix address class a domain is routed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DomainClass {
    /// Not handled locally; delivered over the network.
    #[default]
    Internet,
    /// `mydestination` domain delivered by the local agent.
    Local,
    /// `relay_domains` domain forwarded to another host.
    Relay,
    /// Virtual alias domain.
    Virtual,
    /// Virtual mailbox domain delivered by dovecot.
    VirtualMailbox,
}

impl DomainClass {
    /// Parse from the database integer representation.
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        match value {
            1 => Self::Local,
            2 => Self::Relay,
            3 => Self::Virtual,
            4 => Self::VirtualMailbox,
            _ => Self::Internet,
        }
    }

    /// Convert to the database integer representation.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Internet => 0,
            Self::Local => 1,
            Self::Relay => 2,
            Self::Virtual => 3,
            Self::VirtualMailbox => 4,
        }
    }
}

/// A persisted mail domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Row identifier.
    pub id: DomainId,
    /// Domain name, unique.
    pub name: String,
    /// Routing class.
    pub class: DomainClass,
    /// Transport override for this domain.
    pub transport: Option<String>,
    /// Access policy.
    pub access: Option<String>,
    /// Virtual mailbox uid.
    pub vuid: Option<i64>,
    /// Virtual mailbox gid.
    pub vgid: Option<i64>,
    /// Restriction class.
    pub rclass: String,
}

impl Domain {
    /// Returns every column in a single line, `<NULL>` for unset values.
    #[must_use]
    pub fn dump(&self) -> String {
        format!(
            "id={}, name={}, class={}, transport={}, access={}, vuid={}, vgid={}, rclass={}.",
            self.id,
            self.name,
            self.class.as_i64(),
            or_null(self.transport.as_deref()),
            or_null(self.access.as_deref()),
            or_null(self.vuid),
            or_null(self.vgid),
            self.rclass,
        )
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn or_null<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "<NULL>".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(name: &str) -> Domain {
        Domain {
            id: DomainId::new(1),
            name: name.to_string(),
            class: DomainClass::default(),
            transport: None,
            access: None,
            vuid: None,
            vgid: None,
            rclass: DEFAULT_RCLASS.to_string(),
        }
    }

    #[test]
    fn test_dump_defaults() {
        assert_eq!(
            domain("foo").dump(),
            "id=1, name=foo, class=0, transport=<NULL>, access=<NULL>, vuid=<NULL>, vgid=<NULL>, rclass=DEFAULT."
        );
    }

    #[test]
    fn test_dump_with_values() {
        let mut d = domain("example.org");
        d.class = DomainClass::VirtualMailbox;
        d.transport = Some("lmtp:unix:private/dovecot-lmtp".into());
        d.vuid = Some(5000);
        d.vgid = Some(5000);
        assert_eq!(
            d.dump(),
            "id=1, name=example.org, class=4, transport=lmtp:unix:private/dovecot-lmtp, access=<NULL>, vuid=5000, vgid=5000, rclass=DEFAULT."
        );
    }

    #[test]
    fn test_class_round_trip() {
        for class in [
            DomainClass::Internet,
            DomainClass::Local,
            DomainClass::Relay,
            DomainClass::Virtual,
            DomainClass::VirtualMailbox,
        ] {
            assert_eq!(DomainClass::from_i64(class.as_i64()), class);
        }
        assert_eq!(DomainClass::from_i64(99), DomainClass::Internet);
    }
}

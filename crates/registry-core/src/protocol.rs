//! Supported protocols, annotation variants, and the marker grammar table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidProtocol;

/// A VPN protocol the registry accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Vmess,
    Vless,
    Trojan,
}

impl Protocol {
    /// All protocols the registry knows about.
    pub const ALL: [Protocol; 3] = [Protocol::Vmess, Protocol::Vless, Protocol::Trojan];

    /// Canonical lowercase name, as used in file paths and inbound blocks.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Vmess => "vmess",
            Protocol::Vless => "vless",
            Protocol::Trojan => "trojan",
        }
    }

    /// Whether an inbound block's `protocol` field satisfies this protocol.
    ///
    /// Trojan users live in inbounds named either `trojan` or `trojanws`;
    /// vmess/vless match exactly.
    pub fn matches_inbound(self, inbound_protocol: &str) -> bool {
        match self {
            Protocol::Trojan => matches!(inbound_protocol, "trojan" | "trojanws"),
            _ => inbound_protocol == self.as_str(),
        }
    }

    /// Record-line marker glyph for this protocol.
    pub fn glyph(self) -> &'static str {
        match self {
            Protocol::Vmess => "###",
            Protocol::Vless => "#&",
            Protocol::Trojan => "#!",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = InvalidProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vmess" => Ok(Protocol::Vmess),
            "vless" => Ok(Protocol::Vless),
            "trojan" => Ok(Protocol::Trojan),
            _ => Err(InvalidProtocol(s.to_string())),
        }
    }
}

/// Transport sub-mode an annotated record belongs to.
///
/// The same logical user may be annotated under both variants; the
/// standard entry takes precedence when de-duplicating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    Grpc,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Standard => f.write_str("standard"),
            Variant::Grpc => f.write_str("grpc"),
        }
    }
}

/// One row of the marker grammar: where a protocol/variant section begins
/// (`anchor`) and how its record lines start (`glyph`).
#[derive(Debug, Clone, Copy)]
pub struct MarkerRule {
    pub protocol: Protocol,
    pub variant: Variant,
    /// Comment line (trimmed, exact) that opens the section and marks the
    /// insertion point for new records.
    pub anchor: &'static str,
    /// First token of a record line: `<glyph> <username> <YYYY-MM-DD>`.
    pub glyph: &'static str,
}

/// The full marker grammar, one row per protocol/variant combination.
///
/// This table is the single source of truth for both scanning and
/// appending.
pub const MARKER_RULES: [MarkerRule; 6] = [
    MarkerRule {
        protocol: Protocol::Vmess,
        variant: Variant::Standard,
        anchor: "#vmess",
        glyph: "###",
    },
    MarkerRule {
        protocol: Protocol::Vmess,
        variant: Variant::Grpc,
        anchor: "#vmessgrpc",
        glyph: "###",
    },
    MarkerRule {
        protocol: Protocol::Vless,
        variant: Variant::Standard,
        anchor: "#vless",
        glyph: "#&",
    },
    MarkerRule {
        protocol: Protocol::Vless,
        variant: Variant::Grpc,
        anchor: "#vlessgrpc",
        glyph: "#&",
    },
    MarkerRule {
        protocol: Protocol::Trojan,
        variant: Variant::Standard,
        anchor: "#trojanws",
        glyph: "#!",
    },
    MarkerRule {
        protocol: Protocol::Trojan,
        variant: Variant::Grpc,
        anchor: "#trojangrpc",
        glyph: "#!",
    },
];

/// Look up the grammar row for a protocol/variant pair.
pub fn marker_rule(protocol: Protocol, variant: Variant) -> MarkerRule {
    // Exhaustive over the closed (protocol, variant) product; the
    // indices mirror the MARKER_RULES order.
    let idx = match (protocol, variant) {
        (Protocol::Vmess, Variant::Standard) => 0,
        (Protocol::Vmess, Variant::Grpc) => 1,
        (Protocol::Vless, Variant::Standard) => 2,
        (Protocol::Vless, Variant::Grpc) => 3,
        (Protocol::Trojan, Variant::Standard) => 4,
        (Protocol::Trojan, Variant::Grpc) => 5,
    };
    MARKER_RULES[idx]
}

/// Find the grammar row whose anchor matches a trimmed comment line.
pub fn rule_for_anchor(line: &str) -> Option<MarkerRule> {
    MARKER_RULES.iter().copied().find(|r| r.anchor == line)
}

/// Protocol owning a record-line glyph.
pub fn protocol_for_glyph(glyph: &str) -> Option<Protocol> {
    match glyph {
        "###" => Some(Protocol::Vmess),
        "#&" => Some(Protocol::Vless),
        "#!" => Some(Protocol::Trojan),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_from_str_accepts_case_insensitive_names() {
        assert_eq!("vmess".parse::<Protocol>().unwrap(), Protocol::Vmess);
        assert_eq!("VLESS".parse::<Protocol>().unwrap(), Protocol::Vless);
        assert_eq!("Trojan".parse::<Protocol>().unwrap(), Protocol::Trojan);
        assert!("ssh".parse::<Protocol>().is_err());
        assert!("".parse::<Protocol>().is_err());
    }

    #[test]
    fn trojan_matches_both_inbound_names() {
        assert!(Protocol::Trojan.matches_inbound("trojan"));
        assert!(Protocol::Trojan.matches_inbound("trojanws"));
        assert!(!Protocol::Trojan.matches_inbound("vmess"));
        assert!(Protocol::Vmess.matches_inbound("vmess"));
        assert!(!Protocol::Vmess.matches_inbound("vmessgrpc"));
    }

    #[test]
    fn grammar_covers_every_protocol_variant_pair() {
        for protocol in Protocol::ALL {
            for variant in [Variant::Standard, Variant::Grpc] {
                let rule = marker_rule(protocol, variant);
                assert_eq!(rule.protocol, protocol);
                assert_eq!(rule.variant, variant);
                assert_eq!(rule.glyph, protocol.glyph());
            }
        }
    }

    #[test]
    fn anchors_are_unique() {
        for (i, a) in MARKER_RULES.iter().enumerate() {
            for b in &MARKER_RULES[i + 1..] {
                assert_ne!(a.anchor, b.anchor);
            }
        }
    }
}

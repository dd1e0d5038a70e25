//! Two-pass codec for the comment-marker + JSON hybrid document.
//!
//! Pass one scans comment lines against the marker grammar
//! ([`MARKER_RULES`](crate::protocol::MARKER_RULES)) and recovers
//! [`AnnotatedRecord`]s. Pass two strips every comment line and hands the
//! residue to a JSON parser (see [`ClientIndex`](crate::index::ClientIndex)).
//!
//! Anchor lines open a section; record lines take their protocol from the
//! glyph and their variant from the enclosing section. Records duplicated
//! across variants collapse to the standard entry.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::json;

use crate::error::CodecError;
use crate::protocol::{marker_rule, protocol_for_glyph, rule_for_anchor, Protocol, Variant};
use crate::record::{AnnotatedRecord, Credential};

/// Date format used by record marker lines.
pub const MARKER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Scan the document for record marker lines.
///
/// Malformed marker lines are skipped. Duplicates on `(protocol, username)`
/// are collapsed: the standard variant wins over grpc, and within a variant
/// the first occurrence wins. The result preserves document order of first
/// occurrence.
pub fn extract_records(document: &str) -> Vec<AnnotatedRecord> {
    let mut records: Vec<AnnotatedRecord> = Vec::new();
    let mut seen: HashMap<(Protocol, String), usize> = HashMap::new();
    let mut section = None;

    for line in document.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('#') {
            continue;
        }
        if let Some(rule) = rule_for_anchor(trimmed) {
            section = Some(rule);
            continue;
        }
        let Some(record) = parse_record_line(trimmed, section) else {
            continue;
        };

        let key = (record.protocol, record.username.clone());
        match seen.get(&key) {
            None => {
                seen.insert(key, records.len());
                records.push(record);
            }
            Some(&idx) => {
                // Standard entry supersedes a previously seen grpc duplicate.
                if records[idx].variant == Variant::Grpc && record.variant == Variant::Standard {
                    records[idx] = record;
                }
            }
        }
    }

    records
}

/// Parse a single trimmed comment line as `<glyph> <username> <date>`.
fn parse_record_line(
    line: &str,
    section: Option<crate::protocol::MarkerRule>,
) -> Option<AnnotatedRecord> {
    let mut tokens = line.split_whitespace();
    let glyph = tokens.next()?;
    let protocol = protocol_for_glyph(glyph)?;
    let username = tokens.next()?;
    let date = tokens.next()?;
    // Trailing tokens (e.g. a time-of-day suffix written by legacy
    // tooling) are tolerated and ignored.
    let expiry = NaiveDate::parse_from_str(date, MARKER_DATE_FORMAT).ok()?;

    // The glyph decides the protocol; the enclosing section decides the
    // variant, but only when it belongs to the same protocol.
    let variant = match section {
        Some(rule) if rule.protocol == protocol => rule.variant,
        _ => Variant::Standard,
    };

    Some(AnnotatedRecord {
        username: username.to_string(),
        protocol,
        variant,
        expiry_date: Some(expiry),
    })
}

/// Remove every comment line, returning the JSON residue.
///
/// A line is a comment when its first non-whitespace character is `#`.
pub fn strip_comments(document: &str) -> String {
    let mut out = String::with_capacity(document.len());
    for line in document.split_inclusive('\n') {
        if !line.trim_start().starts_with('#') {
            out.push_str(line);
        }
    }
    out
}

/// Build the single-line client JSON fragment for a new record.
///
/// vmess clients carry `alterId: 0` alongside the id, matching the layout
/// external tooling expects.
pub fn client_fragment(protocol: Protocol, username: &str, credential: &Credential) -> String {
    let value = match (protocol, credential) {
        (Protocol::Vmess, cred) => json!({
            "id": cred.secret(),
            "alterId": 0,
            "email": username,
        }),
        (Protocol::Vless, cred) => json!({
            "id": cred.secret(),
            "email": username,
        }),
        (Protocol::Trojan, cred) => json!({
            "password": cred.secret(),
            "email": username,
        }),
    };
    value.to_string()
}

/// Insert a record after the anchor of the given protocol/variant section.
///
/// The marker line goes immediately after the anchor line and the JSON
/// fragment immediately after the marker line; all other content is
/// preserved byte-for-byte. A trailing comma is appended to the fragment
/// when more client objects follow in the array, so the stripped body
/// remains valid JSON.
pub fn append_record(
    document: &str,
    protocol: Protocol,
    variant: Variant,
    username: &str,
    expiry: NaiveDate,
    fragment: &str,
) -> Result<String, CodecError> {
    let rule = marker_rule(protocol, variant);
    let segments: Vec<&str> = document.split_inclusive('\n').collect();
    let anchor_idx = segments
        .iter()
        .position(|seg| seg.trim() == rule.anchor)
        .ok_or(CodecError::AnchorNotFound(rule.anchor))?;

    let needs_comma = segments[anchor_idx + 1..]
        .iter()
        .map(|seg| seg.trim())
        .find(|t| !t.is_empty() && !t.starts_with('#'))
        .is_some_and(|t| !t.starts_with(']') && !t.starts_with('}'));

    let mut out = String::with_capacity(document.len() + fragment.len() + 64);
    for seg in &segments[..=anchor_idx] {
        out.push_str(seg);
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(rule.glyph);
    out.push(' ');
    out.push_str(username);
    out.push(' ');
    out.push_str(&expiry.format(MARKER_DATE_FORMAT).to_string());
    out.push('\n');
    out.push_str(fragment);
    if needs_comma {
        out.push(',');
    }
    out.push('\n');
    for seg in &segments[anchor_idx + 1..] {
        out.push_str(seg);
    }
    Ok(out)
}

//! Index over the client lists in the document's JSON body.

use serde::Deserialize;

use crate::codec::strip_comments;
use crate::error::CodecError;
use crate::protocol::Protocol;
use crate::record::{ClientEntry, Credential};

#[derive(Debug, Deserialize, Default)]
struct Document {
    #[serde(default)]
    inbounds: Vec<Inbound>,
}

#[derive(Debug, Deserialize)]
struct Inbound {
    #[serde(default)]
    protocol: String,
    #[serde(default)]
    settings: InboundSettings,
}

#[derive(Debug, Deserialize, Default)]
struct InboundSettings {
    #[serde(default)]
    clients: Vec<RawClient>,
}

#[derive(Debug, Deserialize)]
struct RawClient {
    email: Option<String>,
    id: Option<String>,
    password: Option<String>,
}

/// Parsed view of the document's inbound blocks, resolving identities to
/// their structured client records.
///
/// Parse once per document revision; resolution is a walk over the inbound
/// blocks with first-match semantics.
#[derive(Debug)]
pub struct ClientIndex {
    document: Document,
}

impl ClientIndex {
    /// Strip comment lines and parse the residue.
    ///
    /// Fails with [`CodecError::MalformedDocument`] when the residue is not
    /// valid JSON, e.g. when the document was observed mid-write. Callers
    /// on query paths treat that as "zero records".
    pub fn parse(document_text: &str) -> Result<Self, CodecError> {
        let body = strip_comments(document_text);
        let document = serde_json::from_str(&body)?;
        Ok(ClientIndex { document })
    }

    /// Find the client record for `email` under a compatible inbound.
    ///
    /// Returns the first match in document order. Clients lacking the
    /// credential field the protocol requires are skipped, so a
    /// half-deleted record reads as absent rather than crashing.
    pub fn resolve(&self, email: &str, protocol: Protocol) -> Option<ClientEntry> {
        for inbound in &self.document.inbounds {
            if !protocol.matches_inbound(&inbound.protocol) {
                continue;
            }
            for client in &inbound.settings.clients {
                if client.email.as_deref() != Some(email) {
                    continue;
                }
                let credential = match protocol {
                    Protocol::Trojan => client.password.clone().map(Credential::Password),
                    _ => client.id.clone().map(Credential::Uuid),
                };
                if let Some(credential) = credential {
                    return Some(ClientEntry {
                        email: email.to_string(),
                        credential,
                    });
                }
            }
        }
        None
    }
}

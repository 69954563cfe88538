//! Construction of the request lines sent during negotiation, and selection
//! of the capabilities echoed back to the server.
//!
//! The wire surface here must match the server byte for byte; see the v1
//! request parsing in `gix-upload-pack` for the receiving side.

use bstr::BString;
use gix_fetch_core::CapabilitySet;
use gix_hash::ObjectId;

use crate::url::DaemonUrl;

/// The terminal request line ending negotiation.
pub const DONE: &str = "done";

/// The service request opening the conversation:
/// `git-upload-pack <path>\0host=<host>\0`.
pub fn service_request(url: &DaemonUrl) -> BString {
    let mut line = Vec::with_capacity(b"git-upload-pack \0host=\0".len() + url.path.len() + url.host.len());
    line.extend_from_slice(b"git-upload-pack ");
    line.extend_from_slice(&url.path);
    line.extend_from_slice(b"\0host=");
    line.extend_from_slice(url.host.as_bytes());
    line.push(0);
    line.into()
}

/// Intersect the client's wishes with what the server advertised.
///
/// When sideband is requested and both variants are offered, the
/// higher-bandwidth `side-band-64k` wins over `side-band`.
pub fn choose_capabilities(advertised: &CapabilitySet, sideband: bool) -> Vec<&'static str> {
    let mut chosen = Vec::new();
    if sideband {
        if advertised.contains("side-band-64k") {
            chosen.push("side-band-64k");
        } else if advertised.contains("side-band") {
            chosen.push("side-band");
        }
    }
    chosen
}

/// The `want <hex40> (<capability>)*\n` request line.
pub fn want_line(id: &ObjectId, capabilities: &[&str]) -> BString {
    let mut line = format!("want {id}");
    for capability in capabilities {
        line.push(' ');
        line.push_str(capability);
    }
    line.push('\n');
    line.into()
}

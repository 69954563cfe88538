//! Decoding of a single ref-advertisement or negotiation line.
//!
//! Input is the payload of one line-channel frame with the pkt-line length
//! prefix already stripped, e.g.
//! `<hex40> HEAD\0side-band-64k agent=git/2.46.0`.

use bstr::{BStr, BString, ByteSlice};

use crate::capabilities::CapabilitySet;

/// The error returned when a decoded line lacks a field the caller asked for.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error("line carries no {field} field: {line:?}")]
    MissingField { field: &'static str, line: BString },
    #[error("{hex:?} is not a 40 character hexadecimal object id")]
    InvalidHash { hex: BString },
}

/// One decoded line of the advertisement/negotiation phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    /// Space-separated positional fields of the primary segment. In
    /// ref-advertisement usage field 0 is the object id and field 1 the ref
    /// name.
    pub fields: Vec<BString>,
    /// The capability segment following the first NUL, parsed into a set.
    ///
    /// `None` when the line had no NUL separator at all; `Some` with an
    /// empty set when the separator was present but no capability followed,
    /// as servers may send on the first ref line.
    pub capabilities: Option<CapabilitySet>,
    /// `true` when the line ended in a NUL byte, marking a request line.
    pub request: bool,
}

impl DecodedLine {
    /// Decode `line` into positional fields, an optional capability set and
    /// the request flag.
    pub fn parse(line: &[u8]) -> Self {
        let mut line = line;
        let request = line.last() == Some(&0);
        if request {
            line = &line[..line.len() - 1];
        }
        let line = trim_trailing_whitespace(line);
        let (primary, capabilities) = match line.find_byte(b'\0') {
            Some(pos) => (
                &line[..pos],
                Some(CapabilitySet::parse(line[pos + 1..].as_bstr())),
            ),
            None => (line, None),
        };
        let fields = if primary.is_empty() {
            Vec::new()
        } else {
            primary.split_str(b" ").map(BString::from).collect()
        };
        DecodedLine {
            fields,
            capabilities,
            request,
        }
    }

    /// The object id field of a ref-advertisement line, validated to be 40
    /// hexadecimal characters.
    pub fn hash(&self) -> Result<&BStr, Error> {
        let hex = self.fields.first().ok_or_else(|| Error::MissingField {
            field: "hash",
            line: self.to_bstring(),
        })?;
        if hex.len() == 40 && hex.iter().all(u8::is_ascii_hexdigit) {
            Ok(hex.as_bstr())
        } else {
            Err(Error::InvalidHash { hex: hex.clone() })
        }
    }

    /// The ref-name field of a ref-advertisement line.
    pub fn ref_name(&self) -> Result<&BStr, Error> {
        self.fields
            .get(1)
            .map(|name| name.as_bstr())
            .ok_or_else(|| Error::MissingField {
                field: "ref name",
                line: self.to_bstring(),
            })
    }

    fn to_bstring(&self) -> BString {
        bstr::join(" ", self.fields.iter()).into()
    }
}

fn trim_trailing_whitespace(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "9ec967f164af38b7ddeb8f126cfba166ae5fab71";

    #[test]
    fn first_advertisement_line_with_capabilities() {
        let line = DecodedLine::parse(
            format!("{HASH} HEAD\0side-band-64k agent=git/2.46.0\n").as_bytes(),
        );
        assert_eq!(line.hash().unwrap(), HASH);
        assert_eq!(line.ref_name().unwrap(), "HEAD");
        assert!(!line.request);
        let caps = line.capabilities.expect("capability segment present");
        assert!(caps.contains("side-band-64k"));
        assert_eq!(caps.value_of("agent").unwrap(), "git/2.46.0");
    }

    #[test]
    fn later_lines_have_no_capability_segment() {
        let line = DecodedLine::parse(format!("{HASH} refs/heads/main\n").as_bytes());
        assert_eq!(line.ref_name().unwrap(), "refs/heads/main");
        assert_eq!(line.capabilities, None);
    }

    #[test]
    fn empty_capability_segment_is_present_but_empty() {
        let line = DecodedLine::parse(format!("{HASH} HEAD\0").as_bytes());
        // The trailing NUL marks a request line, not a capability separator.
        assert!(line.request);
        assert_eq!(line.capabilities, None);
        let line = DecodedLine::parse(format!("{HASH} HEAD\0\n").as_bytes());
        assert!(!line.request);
        assert!(line.capabilities.expect("segment present").is_empty());
    }

    #[test]
    fn trailing_nul_marks_a_request_and_is_stripped() {
        let line = DecodedLine::parse(b"git-upload-pack /x.git\0host=localhost\0");
        assert!(line.request);
        assert_eq!(line.fields, ["git-upload-pack", "/x.git"]);
        assert_eq!(
            line.capabilities.expect("segment present").value_of("host").unwrap(),
            "localhost"
        );
    }

    #[test]
    fn missing_fields_are_reported() {
        let line = DecodedLine::parse(b"");
        assert!(matches!(line.hash(), Err(Error::MissingField { field: "hash", .. })));
        assert!(matches!(line.ref_name(), Err(Error::MissingField { .. })));
        let line = DecodedLine::parse(b"nothex HEAD");
        assert!(matches!(line.hash(), Err(Error::InvalidHash { .. })));
    }
}

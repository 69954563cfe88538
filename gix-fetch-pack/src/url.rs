//! Parsing of anonymous git daemon URLs of the form `git://host[:port]/path`.

use crate::error::Error;
use bstr::BString;

/// The default port of `git-daemon`.
pub const DEFAULT_PORT: u16 = 9418;

/// The location of a repository served by an anonymous git daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonUrl {
    /// The host to connect to, also sent in the `host=` parameter of the
    /// service request.
    pub host: String,
    /// The TCP port, [`DEFAULT_PORT`] unless the URL names one.
    pub port: u16,
    /// The absolute repository path on the server, including the leading
    /// slash.
    pub path: BString,
}

impl std::str::FromStr for DaemonUrl {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedUrl { url: url.into() };
        let rest = url.strip_prefix("git://").ok_or_else(malformed)?;
        let (authority, path) = rest.split_at(rest.find('/').ok_or_else(malformed)?);
        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| malformed())?),
            None => (authority, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(malformed());
        }
        Ok(DaemonUrl {
            host: host.into(),
            port,
            path: path.into(),
        })
    }
}

impl std::fmt::Display for DaemonUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "git://{}", self.host)?;
        if self.port != DEFAULT_PORT {
            write!(f, ":{}", self.port)?;
        }
        write!(f, "{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_host_uses_the_daemon_default_port() {
        let url: DaemonUrl = "git://github.com/creationix/conquest.git".parse().unwrap();
        assert_eq!(url.host, "github.com");
        assert_eq!(url.port, 9418);
        assert_eq!(url.path, "/creationix/conquest.git");
    }

    #[test]
    fn explicit_port_is_honored() {
        let url: DaemonUrl = "git://localhost:9419/repo.git".parse().unwrap();
        assert_eq!(url.port, 9419);
        assert_eq!(url.to_string(), "git://localhost:9419/repo.git");
    }

    #[test]
    fn display_omits_the_default_port() {
        let url: DaemonUrl = "git://localhost:9418/repo.git".parse().unwrap();
        assert_eq!(url.to_string(), "git://localhost/repo.git");
    }

    #[test]
    fn rejects_other_schemes_and_shapes() {
        for bad in [
            "https://github.com/x.git",
            "git://",
            "git:///no-host.git",
            "git://host-only",
            "git://host:notaport/x.git",
            "ssh://git@host/x.git",
        ] {
            assert!(
                matches!(bad.parse::<DaemonUrl>(), Err(Error::MalformedUrl { .. })),
                "{bad} should be rejected"
            );
        }
    }
}

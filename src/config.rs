//! Connection and sampler settings.

use crate::analysis::DEFAULT_TOP_OFFENDERS;

/// Default Oracle listener port.
pub const DEFAULT_PORT: u16 = 1521;

/// Error type for building a connection.
#[derive(Debug)]
pub enum ConnectError {
    /// Neither host/port/service nor a connect string was given.
    MissingConnectString,
    /// The driver refused the connection.
    Driver(String),
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectError::MissingConnectString => {
                write!(f, "Connection string is missing or incomplete.")
            }
            ConnectError::Driver(msg) => write!(f, "Oracle: {}", msg),
        }
    }
}

impl std::error::Error for ConnectError {}

/// How to reach and authenticate against an Oracle instance.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionDetails {
    pub user: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub service_name: Option<String>,
    /// Raw connect string (EZConnect or TNS alias), used when host/port/service is incomplete.
    pub connect_string: Option<String>,
}

impl ConnectionDetails {
    /// Reads connection settings from environment variables:
    /// - ORACLE_USER
    /// - ORACLE_PASSWORD (default: empty)
    /// - ORACLE_HOST
    /// - ORACLE_PORT (default: 1521 when ORACLE_HOST is set)
    /// - ORACLE_SERVICE
    /// - ORACLE_CONNECT_STRING
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let host = var("ORACLE_HOST");
        let port = var("ORACLE_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .or(host.as_ref().map(|_| DEFAULT_PORT));

        Self {
            user: var("ORACLE_USER").unwrap_or_default(),
            password: var("ORACLE_PASSWORD").unwrap_or_default(),
            host,
            port,
            service_name: var("ORACLE_SERVICE"),
            connect_string: var("ORACLE_CONNECT_STRING"),
        }
    }

    /// `host:port/service` when all three parts are present, otherwise the raw connect string.
    pub fn resolve_connect_string(&self) -> Result<String, ConnectError> {
        match (&self.host, self.port, &self.service_name) {
            (Some(host), Some(port), Some(service)) if !host.is_empty() && !service.is_empty() => {
                Ok(format!("{}:{}/{}", host, port, service))
            }
            _ => self
                .connect_string
                .clone()
                .filter(|s| !s.trim().is_empty())
                .ok_or(ConnectError::MissingConnectString),
        }
    }
}

impl std::fmt::Debug for ConnectionDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDetails")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service_name", &self.service_name)
            .field("connect_string", &self.connect_string)
            .finish()
    }
}

/// Tuning of the sampling driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// How many sessions to list as top offenders.
    pub top_offenders: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            top_offenders: DEFAULT_TOP_OFFENDERS,
        }
    }
}

impl SamplerConfig {
    pub fn with_top_offenders(mut self, n: usize) -> Self {
        self.top_offenders = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ConnectionDetails {
        ConnectionDetails {
            user: "system".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn host_triple_builds_ezconnect() {
        let d = ConnectionDetails {
            host: Some("db.local".to_string()),
            port: Some(1522),
            service_name: Some("ORCLPDB1".to_string()),
            connect_string: Some("ignored".to_string()),
            ..details()
        };
        assert_eq!(d.resolve_connect_string().unwrap(), "db.local:1522/ORCLPDB1");
    }

    #[test]
    fn incomplete_triple_uses_connect_string() {
        let d = ConnectionDetails {
            host: Some("db.local".to_string()),
            connect_string: Some("PRODTNS".to_string()),
            ..details()
        };
        assert_eq!(d.resolve_connect_string().unwrap(), "PRODTNS");
    }

    #[test]
    fn nothing_to_connect_to() {
        assert!(matches!(
            details().resolve_connect_string(),
            Err(ConnectError::MissingConnectString)
        ));
        let blank = ConnectionDetails {
            connect_string: Some("  ".to_string()),
            ..details()
        };
        assert!(blank.resolve_connect_string().is_err());
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", details());
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn default_top_offenders_is_five() {
        assert_eq!(SamplerConfig::default().top_offenders, 5);
        assert_eq!(SamplerConfig::default().with_top_offenders(3).top_offenders, 3);
    }
}

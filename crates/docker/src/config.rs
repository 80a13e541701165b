//! Docker daemon connection settings resolved from the environment.

/// Connection configuration for one Docker daemon.
///
/// All fields have defaults suitable for a local daemon with the TCP
/// socket enabled. Override via environment variables.
#[derive(Debug, Clone)]
pub struct DockerConfig {
    /// Base HTTP URL of the daemon (default: `http://localhost:2375`).
    pub endpoint: String,
    /// Engine API version path segment (default: `v1.43`).
    pub api_version: String,
}

impl DockerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                  |
    /// |----------------------|--------------------------|
    /// | `DOCKER_HOST`        | `http://localhost:2375`  |
    /// | `DOCKER_API_VERSION` | `v1.43`                  |
    ///
    /// `DOCKER_HOST` accepts the conventional `tcp://host:port` form and
    /// maps it to `http://`. Unix-socket daemons are not reachable over
    /// this transport; expose a TCP socket instead.
    pub fn from_env() -> Self {
        let endpoint = std::env::var("DOCKER_HOST")
            .map(|raw| endpoint_from_host(&raw))
            .unwrap_or_else(|_| "http://localhost:2375".into());

        let api_version =
            std::env::var("DOCKER_API_VERSION").unwrap_or_else(|_| "v1.43".into());

        Self {
            endpoint,
            api_version,
        }
    }
}

/// Map a `DOCKER_HOST` value to an HTTP base URL.
pub(crate) fn endpoint_from_host(raw: &str) -> String {
    let mapped = if let Some(rest) = raw.strip_prefix("tcp://") {
        format!("http://{rest}")
    } else {
        raw.to_string()
    };
    mapped.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_scheme_maps_to_http() {
        assert_eq!(
            endpoint_from_host("tcp://10.0.0.5:2375"),
            "http://10.0.0.5:2375",
        );
    }

    #[test]
    fn http_scheme_passes_through() {
        assert_eq!(
            endpoint_from_host("http://daemon.internal:2376"),
            "http://daemon.internal:2376",
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        assert_eq!(endpoint_from_host("tcp://host:2375/"), "http://host:2375");
    }
}

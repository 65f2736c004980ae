//! Typed view of the environment-variable configuration surface.
//!
//! The whole surface is read exactly once at startup into [`BootConfig`];
//! stages receive it by reference. Activation gates are resolved here into
//! real types instead of being re-parsed as strings at each check site.

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Activation state of one optional service, decided at load time.
///
/// `Malformed` keeps the parse failure local to its service: a bad value
/// must produce a descriptive per-service failure, never abort the load or
/// affect the other three activators.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceConfig<T> {
    /// Gating variable(s) absent — the activator performs no launch.
    Disabled,
    Enabled(T),
    Malformed { reason: String },
}

impl<T> ServiceConfig<T> {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ServiceConfig::Enabled(_))
    }
}

// ---------------------------------------------------------------------------
// Per-service configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_WEB_TERMINAL_PORT: u16 = 7681;
pub const DEFAULT_TS_HOSTNAME: &str = "claude-yolo";

#[derive(Debug, Clone, PartialEq)]
pub struct BasicAuth {
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebTerminalConfig {
    pub port: u16,
    pub auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TailscaleConfig {
    pub auth_key: String,
    pub hostname: String,
    pub accept_dns: bool,
    /// Raw extra arguments appended to the join command, whitespace-split.
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenVpnConfig {
    /// Profile file name relative to the VPN config mount directory.
    pub config_name: String,
    pub auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TunnelSource {
    Token(String),
    ConfigFile(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloudflaredConfig {
    pub source: TunnelSource,
    pub metrics_port: Option<u16>,
}

// ---------------------------------------------------------------------------
// BootConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BootConfig {
    pub web_terminal: ServiceConfig<WebTerminalConfig>,
    pub tailscale: ServiceConfig<TailscaleConfig>,
    pub openvpn: ServiceConfig<OpenVpnConfig>,
    pub cloudflared: ServiceConfig<CloudflaredConfig>,
    pub command_logging: bool,
}

impl BootConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Parse failures are captured
    /// per service as `Malformed`, never returned as a load error.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            web_terminal: parse_web_terminal(&get),
            tailscale: parse_tailscale(&get),
            openvpn: parse_openvpn(&get),
            cloudflared: parse_cloudflared(&get),
            command_logging: bool_like(get("ENABLE_COMMAND_LOGGING").as_deref()),
        }
    }

    pub fn web_terminal_enabled(&self) -> bool {
        self.web_terminal.is_enabled()
    }
}

/// Bool-like string: only the literal "true" (case-insensitive) enables.
fn bool_like(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn parse_auth(raw: &str, var: &str) -> Result<BasicAuth, String> {
    match raw.split_once(':') {
        Some((user, pass)) if !user.is_empty() && !pass.is_empty() => Ok(BasicAuth {
            user: user.to_string(),
            pass: pass.to_string(),
        }),
        _ => Err(format!("{var} must be in user:pass form")),
    }
}

fn parse_port(raw: &str, var: &str) -> Result<u16, String> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| format!("{var} is not a valid port: {raw:?}"))
}

fn parse_web_terminal<F>(get: &F) -> ServiceConfig<WebTerminalConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if !bool_like(get("WEBTERMINAL_ENABLED").as_deref()) {
        return ServiceConfig::Disabled;
    }
    let port = match get("WEBTERMINAL_PORT") {
        None => DEFAULT_WEB_TERMINAL_PORT,
        Some(raw) => match parse_port(&raw, "WEBTERMINAL_PORT") {
            Ok(p) => p,
            Err(reason) => return ServiceConfig::Malformed { reason },
        },
    };
    let auth = match get("WEBTERMINAL_AUTH") {
        None => None,
        Some(raw) => match parse_auth(&raw, "WEBTERMINAL_AUTH") {
            Ok(a) => Some(a),
            Err(reason) => return ServiceConfig::Malformed { reason },
        },
    };
    ServiceConfig::Enabled(WebTerminalConfig { port, auth })
}

fn parse_tailscale<F>(get: &F) -> ServiceConfig<TailscaleConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(auth_key) = get("TS_AUTHKEY") else {
        return ServiceConfig::Disabled;
    };
    if auth_key.trim().is_empty() {
        return ServiceConfig::Malformed {
            reason: "TS_AUTHKEY is set but empty".to_string(),
        };
    }
    let hostname = get("TS_HOSTNAME")
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TS_HOSTNAME.to_string());
    let accept_dns = bool_like(get("TS_ACCEPT_DNS").as_deref());
    let extra_args = get("TS_EXTRA_ARGS")
        .map(|raw| raw.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    ServiceConfig::Enabled(TailscaleConfig {
        auth_key: auth_key.trim().to_string(),
        hostname,
        accept_dns,
        extra_args,
    })
}

fn parse_openvpn<F>(get: &F) -> ServiceConfig<OpenVpnConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(config_name) = get("OPENVPN_CONFIG") else {
        return ServiceConfig::Disabled;
    };
    let config_name = config_name.trim().to_string();
    if config_name.is_empty() {
        return ServiceConfig::Malformed {
            reason: "OPENVPN_CONFIG is set but empty".to_string(),
        };
    }
    // The value is a file name inside the mount, not a path.
    if config_name.contains('/') {
        return ServiceConfig::Malformed {
            reason: format!("OPENVPN_CONFIG must be a bare file name, got {config_name:?}"),
        };
    }
    let auth = match (get("OPENVPN_AUTH_USER"), get("OPENVPN_AUTH_PASS")) {
        (None, None) => None,
        (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
            Some(BasicAuth { user, pass })
        }
        _ => {
            return ServiceConfig::Malformed {
                reason: "OPENVPN_AUTH_USER and OPENVPN_AUTH_PASS must be set together"
                    .to_string(),
            }
        }
    };
    ServiceConfig::Enabled(OpenVpnConfig { config_name, auth })
}

fn parse_cloudflared<F>(get: &F) -> ServiceConfig<CloudflaredConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let token = get("CLOUDFLARED_TUNNEL_TOKEN").filter(|t| !t.trim().is_empty());
    let config = get("CLOUDFLARED_CONFIG").filter(|c| !c.trim().is_empty());
    // Token wins when both are provided.
    let source = match (token, config) {
        (Some(t), _) => TunnelSource::Token(t.trim().to_string()),
        (None, Some(c)) => TunnelSource::ConfigFile(c.trim().to_string()),
        (None, None) => {
            if get("CLOUDFLARED_TUNNEL_TOKEN").is_some() || get("CLOUDFLARED_CONFIG").is_some() {
                return ServiceConfig::Malformed {
                    reason: "CLOUDFLARED_TUNNEL_TOKEN / CLOUDFLARED_CONFIG set but empty"
                        .to_string(),
                };
            }
            return ServiceConfig::Disabled;
        }
    };
    let metrics_port = match get("CLOUDFLARED_METRICS_PORT") {
        None => None,
        Some(raw) => match parse_port(&raw, "CLOUDFLARED_METRICS_PORT") {
            Ok(p) => Some(p),
            Err(reason) => return ServiceConfig::Malformed { reason },
        },
    };
    ServiceConfig::Enabled(CloudflaredConfig {
        source,
        metrics_port,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> BootConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BootConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn everything_disabled_by_default() {
        let cfg = config(&[]);
        assert_eq!(cfg.web_terminal, ServiceConfig::Disabled);
        assert_eq!(cfg.tailscale, ServiceConfig::Disabled);
        assert_eq!(cfg.openvpn, ServiceConfig::Disabled);
        assert_eq!(cfg.cloudflared, ServiceConfig::Disabled);
        assert!(!cfg.command_logging);
    }

    #[test]
    fn web_terminal_defaults_and_auth() {
        let cfg = config(&[("WEBTERMINAL_ENABLED", "true")]);
        assert_eq!(
            cfg.web_terminal,
            ServiceConfig::Enabled(WebTerminalConfig {
                port: 7681,
                auth: None
            })
        );

        let cfg = config(&[
            ("WEBTERMINAL_ENABLED", "true"),
            ("WEBTERMINAL_PORT", "9000"),
            ("WEBTERMINAL_AUTH", "admin:secret"),
        ]);
        let ServiceConfig::Enabled(wt) = cfg.web_terminal else {
            panic!("expected enabled");
        };
        assert_eq!(wt.port, 9000);
        assert_eq!(wt.auth.unwrap().user, "admin");
    }

    #[test]
    fn web_terminal_not_gated_by_other_values() {
        for value in ["false", "1", "yes", ""] {
            let cfg = config(&[("WEBTERMINAL_ENABLED", value)]);
            assert_eq!(cfg.web_terminal, ServiceConfig::Disabled, "value {value:?}");
        }
    }

    #[test]
    fn web_terminal_bad_port_is_malformed_not_fatal() {
        let cfg = config(&[
            ("WEBTERMINAL_ENABLED", "true"),
            ("WEBTERMINAL_PORT", "lots"),
            ("TS_AUTHKEY", "tskey-abc"),
        ]);
        assert!(matches!(
            cfg.web_terminal,
            ServiceConfig::Malformed { .. }
        ));
        // Independence: the bad web-terminal value leaves tailscale enabled.
        assert!(cfg.tailscale.is_enabled());
    }

    #[test]
    fn web_terminal_auth_without_colon_is_malformed() {
        let cfg = config(&[
            ("WEBTERMINAL_ENABLED", "true"),
            ("WEBTERMINAL_AUTH", "adminsecret"),
        ]);
        let ServiceConfig::Malformed { reason } = cfg.web_terminal else {
            panic!("expected malformed");
        };
        assert!(reason.contains("user:pass"));
    }

    #[test]
    fn tailscale_defaults() {
        let cfg = config(&[("TS_AUTHKEY", "tskey-abc")]);
        let ServiceConfig::Enabled(ts) = cfg.tailscale else {
            panic!("expected enabled");
        };
        assert_eq!(ts.hostname, "claude-yolo");
        assert!(!ts.accept_dns);
        assert!(ts.extra_args.is_empty());
    }

    #[test]
    fn tailscale_extra_args_split() {
        let cfg = config(&[
            ("TS_AUTHKEY", "tskey-abc"),
            ("TS_HOSTNAME", "devbox"),
            ("TS_ACCEPT_DNS", "TRUE"),
            ("TS_EXTRA_ARGS", "--ssh --advertise-tags=tag:dev"),
        ]);
        let ServiceConfig::Enabled(ts) = cfg.tailscale else {
            panic!("expected enabled");
        };
        assert_eq!(ts.hostname, "devbox");
        assert!(ts.accept_dns);
        assert_eq!(ts.extra_args, vec!["--ssh", "--advertise-tags=tag:dev"]);
    }

    #[test]
    fn openvpn_rejects_paths_and_half_credentials() {
        let cfg = config(&[("OPENVPN_CONFIG", "../escape.ovpn")]);
        assert!(matches!(cfg.openvpn, ServiceConfig::Malformed { .. }));

        let cfg = config(&[
            ("OPENVPN_CONFIG", "office.ovpn"),
            ("OPENVPN_AUTH_USER", "alice"),
        ]);
        let ServiceConfig::Malformed { reason } = cfg.openvpn else {
            panic!("expected malformed");
        };
        assert!(reason.contains("together"));
    }

    #[test]
    fn cloudflared_token_wins_over_config() {
        let cfg = config(&[
            ("CLOUDFLARED_TUNNEL_TOKEN", "tok-123"),
            ("CLOUDFLARED_CONFIG", "tunnel.yml"),
        ]);
        let ServiceConfig::Enabled(cf) = cfg.cloudflared else {
            panic!("expected enabled");
        };
        assert_eq!(cf.source, TunnelSource::Token("tok-123".to_string()));
    }

    #[test]
    fn cloudflared_config_file_form() {
        let cfg = config(&[
            ("CLOUDFLARED_CONFIG", "tunnel.yml"),
            ("CLOUDFLARED_METRICS_PORT", "2000"),
        ]);
        let ServiceConfig::Enabled(cf) = cfg.cloudflared else {
            panic!("expected enabled");
        };
        assert_eq!(cf.source, TunnelSource::ConfigFile("tunnel.yml".to_string()));
        assert_eq!(cf.metrics_port, Some(2000));
    }

    #[test]
    fn command_logging_flag() {
        assert!(config(&[("ENABLE_COMMAND_LOGGING", "true")]).command_logging);
        assert!(!config(&[("ENABLE_COMMAND_LOGGING", "false")]).command_logging);
    }
}

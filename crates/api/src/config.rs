//! Process configuration, read from the environment (and `.env` when present).

use std::env;
use std::fmt::{self, Display};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use url::Url;

use smartquota_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret-smartquota";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(anyhow!("unknown environment `{other}`")),
        }
    }
}

/// Fixed-window request quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    pub max: u32,
    pub window: Duration,
}

impl RateQuota {
    pub const fn new(max: u32, window: Duration) -> Self {
        Self { max, window }
    }
}

/// Per-route quotas, keyed by client IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub register: RateQuota,
    pub login: RateQuota,
    pub forgot: RateQuota,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            register: RateQuota::new(20, Duration::from_secs(15 * 60)),
            login: RateQuota::new(50, Duration::from_secs(15 * 60)),
            forgot: RateQuota::new(6, Duration::from_secs(60 * 60)),
        }
    }
}

/// SMTP delivery settings (`EMAIL_*`).
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS when true, STARTTLS otherwise.
    pub secure: bool,
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

impl SmtpConfig {
    /// `None` unless both `EMAIL_USER` and `EMAIL_PASS` are set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Option<Self>> {
        let (Some(user), Some(pass)) = (lookup("EMAIL_USER"), lookup("EMAIL_PASS")) else {
            return Ok(None);
        };

        Ok(Some(Self {
            host: lookup("EMAIL_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: parse_raw("EMAIL_PORT", lookup("EMAIL_PORT"), 465)?,
            secure: parse_raw("EMAIL_SECURE", lookup("EMAIL_SECURE"), true)?,
            user,
            pass,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub environment: Environment,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// Base of the links this API hands out (email confirmation).
    pub public_base_url: Url,
    /// Frontend origin users land on after confirming.
    pub frontend_base: Url,
    /// Frontend origin hosting the password reset page.
    pub frontend_url: Url,
    /// Absent means emails are only logged.
    pub smtp: Option<SmtpConfig>,
    pub log_format: LogFormat,
    pub rate_limits: RateLimits,
}

impl ApiConfig {
    /// Local defaults; also what the black-box tests run against.
    pub fn development() -> Self {
        let port = 3001;
        Self {
            port,
            environment: Environment::Development,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: chrono::Duration::hours(1),
            public_base_url: base_url(&format!("http://localhost:{port}")).expect("static url"),
            frontend_base: base_url("http://localhost:3000").expect("static url"),
            frontend_url: base_url("http://localhost:8080").expect("static url"),
            smtp: None,
            log_format: LogFormat::Pretty,
            rate_limits: RateLimits::default(),
        }
    }

    /// Load `.env` (if any) and read the configuration from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        // Runs before logging is installed, so nothing here can log.
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("failed to read .env"),
        }

        let port: u16 = parse_var("PORT", 3001)?;
        let environment: Environment = parse_var("APP_ENV", Environment::Development)?;

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let token_ttl = match var("JWT_EXPIRES_IN") {
            Some(raw) => parse_ttl(&raw).with_context(|| format!("invalid JWT_EXPIRES_IN `{raw}`"))?,
            None => chrono::Duration::hours(1),
        };

        let public_base_url = url_var("PUBLIC_BASE_URL", &format!("http://localhost:{port}"))?;
        let frontend_base = url_var("FRONTEND_BASE", "http://localhost:3000")?;
        let frontend_url = url_var("FRONTEND_URL", "http://localhost:8080")?;

        let default_format = if environment.is_development() { LogFormat::Pretty } else { LogFormat::Json };
        let log_format = parse_var("LOG_FORMAT", default_format)?;

        Ok(Self {
            port,
            environment,
            jwt_secret,
            token_ttl,
            public_base_url,
            frontend_base,
            frontend_url,
            smtp: SmtpConfig::from_lookup(var)?,
            log_format,
            rate_limits: RateLimits::default(),
        })
    }

    /// True when tokens are signed with the built-in development secret.
    pub fn uses_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_raw(key, var(key), default)
}

fn parse_raw<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e| anyhow!("invalid {key} `{raw}`: {e}")),
        None => Ok(default),
    }
}

fn url_var(key: &str, default: &str) -> anyhow::Result<Url> {
    let raw = var(key).unwrap_or_else(|| default.to_string());
    base_url(&raw).with_context(|| format!("invalid {key} `{raw}`"))
}

/// Parse an absolute base URL, normalized to end with `/` so relative joins append.
pub fn base_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        bail!("not a base url");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Token lifetime: `<n>` (seconds) or `<n>s|m|h|d`.
pub fn parse_ttl(raw: &str) -> anyhow::Result<chrono::Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let n: i64 = digits.parse().context("expected a number")?;
    if n <= 0 {
        bail!("lifetime must be positive");
    }

    let ttl = match unit.trim() {
        "" | "s" => chrono::Duration::try_seconds(n),
        "m" => chrono::Duration::try_minutes(n),
        "h" => chrono::Duration::try_hours(n),
        "d" => chrono::Duration::try_days(n),
        other => bail!("unknown unit `{other}`"),
    };
    ttl.ok_or_else(|| anyhow!("lifetime out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_accepts_units_and_bare_seconds() {
        assert_eq!(parse_ttl("1h").unwrap(), chrono::Duration::hours(1));
        assert_eq!(parse_ttl("30m").unwrap(), chrono::Duration::minutes(30));
        assert_eq!(parse_ttl("7d").unwrap(), chrono::Duration::days(7));
        assert_eq!(parse_ttl("90").unwrap(), chrono::Duration::seconds(90));
        assert_eq!(parse_ttl("15s").unwrap(), chrono::Duration::seconds(15));
    }

    #[test]
    fn ttl_rejects_garbage() {
        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("h").is_err());
        assert!(parse_ttl("0h").is_err());
        assert!(parse_ttl("3w").is_err());
    }

    #[test]
    fn base_urls_gain_a_trailing_slash() {
        let url = base_url("http://localhost:3000").unwrap();
        assert_eq!(url.join("login.html").unwrap().as_str(), "http://localhost:3000/login.html");

        let url = base_url("https://example.com/app").unwrap();
        assert_eq!(url.join("reset.html").unwrap().as_str(), "https://example.com/app/reset.html");

        assert!(base_url("mailto:a@b.com").is_err());
    }

    #[test]
    fn environment_names() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("DEV".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
    }

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn smtp_requires_user_and_password() {
        assert_eq!(SmtpConfig::from_lookup(lookup(&[])).unwrap(), None);
        assert_eq!(SmtpConfig::from_lookup(lookup(&[("EMAIL_USER", "a@b.com")])).unwrap(), None);
        assert_eq!(SmtpConfig::from_lookup(lookup(&[("EMAIL_PASS", "x")])).unwrap(), None);
    }

    #[test]
    fn smtp_defaults_to_implicit_tls_on_gmail() {
        let smtp = SmtpConfig::from_lookup(lookup(&[("EMAIL_USER", "a@b.com"), ("EMAIL_PASS", "pw")]))
            .unwrap()
            .unwrap();
        assert_eq!(smtp.host, "smtp.gmail.com");
        assert_eq!(smtp.port, 465);
        assert!(smtp.secure);
        assert!(!format!("{smtp:?}").contains("pw"));
    }

    #[test]
    fn smtp_overrides_and_bad_values() {
        let smtp = SmtpConfig::from_lookup(lookup(&[
            ("EMAIL_USER", "a@b.com"),
            ("EMAIL_PASS", "pw"),
            ("EMAIL_HOST", "mail.example.com"),
            ("EMAIL_PORT", "587"),
            ("EMAIL_SECURE", "false"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!((smtp.host.as_str(), smtp.port, smtp.secure), ("mail.example.com", 587, false));

        let bad = SmtpConfig::from_lookup(lookup(&[("EMAIL_USER", "a@b.com"), ("EMAIL_PASS", "pw"), ("EMAIL_PORT", "smtp")]));
        assert!(bad.is_err());
    }

    #[test]
    fn default_quotas() {
        let limits = RateLimits::default();
        assert_eq!(limits.register.max, 20);
        assert_eq!(limits.login.window, Duration::from_secs(900));
        assert_eq!(limits.forgot, RateQuota::new(6, Duration::from_secs(3600)));
    }
}

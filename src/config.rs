use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Signing material for both token domains.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let jwt = JwtConfig {
            secret: required_secret(&var, "JWT_SECRET")?,
            refresh_secret: required_secret(&var, "JWT_REFRESH_SECRET")?,
            access_ttl: parse_ttl(&var("JWT_ACCESS_TTL").unwrap_or_else(|| "15m".into()))
                .context("JWT_ACCESS_TTL")?,
            refresh_ttl: parse_ttl(&var("JWT_REFRESH_TTL").unwrap_or_else(|| "7d".into()))
                .context("JWT_REFRESH_TTL")?,
        };
        if jwt.secret == jwt.refresh_secret {
            bail!("JWT_SECRET and JWT_REFRESH_SECRET must differ");
        }

        let port = match var("APP_PORT") {
            Some(p) => p.parse::<u16>().context("APP_PORT is not a valid port")?,
            None => 4000,
        };

        Ok(Self {
            database_url,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            jwt,
        })
    }
}

fn required_secret<F>(var: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("{key} is not configured or is empty"),
    }
}

/// Longest accepted credential lifetime.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Parses a relative duration such as `900`, `45s`, `15m`, `12h` or `7d`.
/// A bare number is seconds. Zero and anything above [`MAX_TTL`] are rejected.
pub fn parse_ttl(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    if digits.is_empty() {
        bail!("invalid duration {raw:?}");
    }
    let n: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration {raw:?}"))?;
    let unit_secs: u64 = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        _ => bail!("unknown duration unit {unit:?} in {raw:?}"),
    };
    let secs = n
        .checked_mul(unit_secs)
        .with_context(|| format!("duration {raw:?} is too large"))?;
    if secs == 0 {
        bail!("duration must be positive");
    }
    let ttl = Duration::from_secs(secs);
    if ttl > MAX_TTL {
        bail!("duration {raw:?} exceeds the maximum of 365d");
    }
    Ok(ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/itinera"),
        ("JWT_SECRET", "access-secret"),
        ("JWT_REFRESH_SECRET", "refresh-secret"),
    ];

    #[test]
    fn parses_ttl_units() {
        assert_eq!(parse_ttl("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(parse_ttl("2h").unwrap(), Duration::from_secs(7_200));
        assert_eq!(parse_ttl("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_ttl("120").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn rejects_bad_ttl() {
        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("m").is_err());
        assert!(parse_ttl("10w").is_err());
        assert!(parse_ttl("0m").is_err());
        assert!(parse_ttl("-5m").is_err());
    }

    #[test]
    fn ttl_is_bounded() {
        assert_eq!(parse_ttl("365d").unwrap(), MAX_TTL);
        assert!(parse_ttl("366d").is_err());
        assert!(parse_ttl("100000000000d").is_err());
        assert!(parse_ttl("18446744073709551615").is_err());
        assert!(parse_ttl("99999999999999999999999").is_err());
    }

    #[test]
    fn oversized_ttl_fails_fast() {
        for (key, value) in [
            ("JWT_REFRESH_TTL", "100000000000d"),
            ("JWT_ACCESS_TTL", "18446744073709551615"),
        ] {
            let mut pairs = BASE.to_vec();
            pairs.push((key, value));
            let err = AppConfig::from_lookup(vars(&pairs)).unwrap_err();
            assert!(err.to_string().contains(key), "{err:#}");
        }
    }

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(vars(BASE)).expect("config");
        assert_eq!(cfg.jwt.access_ttl, Duration::from_secs(15 * 60));
        assert_eq!(cfg.jwt.refresh_ttl, Duration::from_secs(7 * 86_400));
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.frontend_url, "http://localhost:3000");
    }

    #[test]
    fn empty_secret_fails_fast() {
        let err = AppConfig::from_lookup(vars(&[
            ("DATABASE_URL", "postgres://localhost/itinera"),
            ("JWT_SECRET", "   "),
            ("JWT_REFRESH_SECRET", "refresh-secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = AppConfig::from_lookup(vars(&[
            ("DATABASE_URL", "postgres://localhost/itinera"),
            ("JWT_SECRET", "access-secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_REFRESH_SECRET"));
    }

    #[test]
    fn shared_secret_is_rejected() {
        let err = AppConfig::from_lookup(vars(&[
            ("DATABASE_URL", "postgres://localhost/itinera"),
            ("JWT_SECRET", "same"),
            ("JWT_REFRESH_SECRET", "same"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn overrides_are_read() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("JWT_ACCESS_TTL", "5m"),
            ("JWT_REFRESH_TTL", "1d"),
            ("APP_PORT", "8080"),
        ]);
        let cfg = AppConfig::from_lookup(vars(&pairs)).expect("config");
        assert_eq!(cfg.jwt.access_ttl, Duration::from_secs(300));
        assert_eq!(cfg.jwt.refresh_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.port, 8080);
    }
}

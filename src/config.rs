use serde::Deserialize;
use std::time::Duration;

use crate::logging::LogSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Detailed logging. Replaces any environment-gated global switch.
    pub verbose: bool,
    /// Pause after sign-up before touching the new profile row.
    pub profile_settle_delay_ms: u64,
    /// When set, poll for the profile row (every settle delay) up to this long
    /// instead of sleeping once.
    pub profile_poll_timeout_ms: Option<u64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            supabase_url: std::env::var("SUPABASE_URL")
                .or_else(|_| std::env::var("VITE_SUPABASE_URL"))
                .map_err(|_| anyhow::anyhow!("SUPABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("SUPABASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("SUPABASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })?,
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY")
                .or_else(|_| std::env::var("VITE_SUPABASE_ANON_KEY"))
                .map_err(|_| anyhow::anyhow!("SUPABASE_ANON_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("SUPABASE_ANON_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            verbose: std::env::var("VERBOSE")
                .map(|v| parse_flag(&v))
                .unwrap_or(Ok(false))?,
            profile_settle_delay_ms: std::env::var("PROFILE_SETTLE_DELAY_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("PROFILE_SETTLE_DELAY_MS must be a whole number of milliseconds")
                })?,
            profile_poll_timeout_ms: std::env::var("PROFILE_POLL_TIMEOUT_MS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .map_err(|_| {
                    anyhow::anyhow!("PROFILE_POLL_TIMEOUT_MS must be a whole number of milliseconds")
                })?,
        })
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            verbose: self.verbose,
        }
    }

    pub fn profile_wait(&self) -> ProfileWait {
        let delay = Duration::from_millis(self.profile_settle_delay_ms);
        match self.profile_poll_timeout_ms {
            Some(timeout) => ProfileWait::Poll {
                interval: delay,
                timeout: Duration::from_millis(timeout),
            },
            None => ProfileWait::FixedDelay(delay),
        }
    }
}

/// How provisioning waits for the backend to create the base profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileWait {
    /// Sleep once, then carry on.
    FixedDelay(Duration),
    /// Look for the row every `interval` until it exists or `timeout` passes.
    Poll { interval: Duration, timeout: Duration },
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("VERBOSE must be true or false, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            port: 3000,
            supabase_url: "https://example.supabase.co".to_string(),
            supabase_anon_key: "anon".to_string(),
            verbose: false,
            profile_settle_delay_ms: 1000,
            profile_poll_timeout_ms: None,
        }
    }

    #[test]
    fn fixed_delay_by_default() {
        assert_eq!(
            base().profile_wait(),
            ProfileWait::FixedDelay(Duration::from_secs(1))
        );
    }

    #[test]
    fn poll_when_timeout_set() {
        let config = Config {
            profile_settle_delay_ms: 200,
            profile_poll_timeout_ms: Some(5000),
            ..base()
        };
        assert_eq!(
            config.profile_wait(),
            ProfileWait::Poll {
                interval: Duration::from_millis(200),
                timeout: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn verbose_flag_values() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}

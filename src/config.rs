use std::{env, time::Duration};
use anyhow::{anyhow, Context, Result};
use crate::receiver::ACK_TIMEOUT;

pub struct Config {
    pub signing_secret: String,
    pub ack_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let signing_secret = env::var("SLACK_SIGNING_SECRET")
            .context("SLACK_SIGNING_SECRET environment variable should exist")?;

        if signing_secret.is_empty() {
            return Err(anyhow!("SLACK_SIGNING_SECRET must not be empty"));
        }

        let ack_timeout = match env::var("SLACK_ACK_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(ms.trim().parse::<u64>()
                .with_context(|| format!("SLACK_ACK_TIMEOUT_MS is not a number of milliseconds: {}", ms))?),
            Err(_) => ACK_TIMEOUT,
        };

        Ok(Config { signing_secret, ack_timeout })
    }
}

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use packetmux_core::{Codec, JsonCodec, MuxError, Result};

use crate::listeners::Expiry;

const MAX_REPLY_TIMEOUT_MS: u64 = 3_600_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MuxConfig {
    pub version: u32,

    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub codec: CodecSection,
}

impl MuxConfig {
    /// Default config for a client called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            version: 1,
            client: ClientSection {
                name: Some(name.into()),
                ..ClientSection::default()
            },
            codec: CodecSection::default(),
        }
    }

    /// Same settings under a different client name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        let mut cfg = self.clone();
        cfg.client.name = Some(name.into());
        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MuxError::UnsupportedVersion);
        }
        self.client.validate()?;
        Ok(())
    }

    /// Configured name, else `<hostname>-<suffix>` with a fresh random
    /// suffix per call, so clients on one host never share an inbound topic.
    pub fn client_name(&self) -> String {
        match &self.client.name {
            Some(name) => name.clone(),
            None => generated_name(),
        }
    }

    pub fn reply_expiry(&self) -> Expiry {
        Expiry::from_millis(self.client.reply_timeout_ms)
    }

    pub fn default_codec(&self) -> Arc<dyn Codec> {
        if self.codec.pretty {
            Arc::new(JsonCodec::pretty())
        } else {
            Arc::new(JsonCodec::compact())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    #[serde(default)]
    pub name: Option<String>,

    /// 0 disables reply expiry.
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            name: None,
            reply_timeout_ms: default_reply_timeout_ms(),
        }
    }
}

impl ClientSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(MuxError::BadConfig("client.name must not be empty".into()));
            }
        }
        if self.reply_timeout_ms > MAX_REPLY_TIMEOUT_MS {
            return Err(MuxError::BadConfig(format!(
                "client.reply_timeout_ms must be at most {MAX_REPLY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

fn generated_name() -> String {
    let host = gethostname::gethostname().to_string_lossy().trim().to_string();
    let host = if host.is_empty() { "packetmux".to_string() } else { host };
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{host}-{}", &suffix[..8])
}

fn default_reply_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecSection {
    #[serde(default)]
    pub pretty: bool,
}

//! Client config loader (strict parsing).

pub mod schema;

use std::fs;

use packetmux_core::{MuxError, Result};

pub use schema::{ClientSection, CodecSection, MuxConfig};

pub fn load_from_file(path: &str) -> Result<MuxConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MuxError::BadConfig(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<MuxConfig> {
    let cfg: MuxConfig = serde_yaml::from_str(s)
        .map_err(|e| MuxError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

//! Command line and table configuration.
//!
//! The table is described by an optional YAML file (see `Settings` in the
//! engine for the fields); command line flags override individual fields.

use anyhow::Context;
use clap::Parser;
use hexboard_engine::{LayoutKind, Settings};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 39333;

#[derive(Debug, Parser)]
#[command(name = "hexboard-server", about = "Host a shared hex board game table")]
pub struct Args {
    /// Address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite journal. Defaults to ~/.hexboard/hexboard.db.
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// YAML table settings.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Board size in rings around the center tile.
    #[arg(long)]
    pub rings: Option<u32>,

    /// Board shape: hexagon or diamond.
    #[arg(long)]
    pub layout: Option<LayoutKind>,

    /// Seed for reproducible boards and dice.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Accept peers outside loopback and the Tailscale range.
    #[arg(long)]
    pub open: bool,

    /// Start a new table instead of resuming the saved one.
    #[arg(long)]
    pub fresh: bool,
}

impl Args {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_db_path)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => load_settings(path)?,
            None => Settings::default(),
        };
        if let Some(rings) = self.rings {
            settings.rings = rings;
        }
        if let Some(layout) = self.layout {
            settings.layout = layout;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        settings.validate()?;
        Ok(settings)
    }
}

pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hexboard")
        .join("hexboard.db")
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    parse_settings(&raw).with_context(|| format!("parse config: {}", path.display()))
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    if raw.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

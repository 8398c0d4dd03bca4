#![allow(dead_code)]

use anyhow::{bail, Result};
use assert_cmd::cargo;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const TRANSACTIONS_JSON: &str = r#"[
    {
        "source": "CSFloat",
        "type": "BUY",
        "tx_id": "cf-1",
        "item_name": "AK-47 | Redline (Field-Tested)",
        "price": "10.00",
        "currency": "USD",
        "created_at": "2024-02-10T10:00:00Z",
        "float_val": 0.25,
        "pattern": 661
    },
    {
        "source": "DMarket",
        "type": "BUY",
        "tx_id": "dm-1",
        "asset_id": "asset-42",
        "item_name": "Sticker | Crown (Foil)",
        "price": "100.00",
        "currency": "USD",
        "created_at": "2024-01-05T10:00:00Z"
    },
    {
        "source": "Buff163",
        "type": "SELL",
        "tx_id": "bf-1",
        "item_name": "AK-47 | Redline (Field-Tested)",
        "price": "15.00",
        "currency": "USD",
        "created_at": "2024-03-01T10:00:00Z",
        "verified_at": "2024-03-08T10:00:00Z",
        "float_val": 0.25,
        "pattern": 661
    },
    {
        "source": "DMarket",
        "type": "SELL",
        "tx_id": "dm-2",
        "asset_id": "asset-42",
        "item_name": "Sticker | Crown (Foil)",
        "price": "120.00",
        "currency": "USD",
        "created_at": "2024-03-10T10:00:00Z"
    },
    {
        "source": "Skinport",
        "type": "SELL",
        "tx_id": "sp-1",
        "item_name": "AWP | Asiimov (Battle-Scarred)",
        "price": "40.00",
        "currency": "USD",
        "created_at": "2024-03-12T10:00:00Z"
    }
]"#;

pub const INVENTORY_JSON: &str = r#"[
    {
        "source": "CSFloat",
        "asset_id": "inv-1",
        "item_name": "AK-47 | Redline (Field-Tested)",
        "float_val": 0.25,
        "pattern": 661
    },
    {
        "source": "Steam",
        "asset_id": "inv-2",
        "item_name": "Glock-18 | Fade (Factory New)",
        "float_val": 0.01,
        "pattern": 12,
        "is_tradable": false
    }
]"#;

pub fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("failed to write fixture");
    path
}

pub fn config_root_for_home(home: &TempDir) -> PathBuf {
    home.path().join(".config")
}

/// Command isolated from the user's config, with colors disabled.
pub fn base_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("skinledger"));
    cmd.env("HOME", home.path());
    cmd.env("XDG_CONFIG_HOME", config_root_for_home(home));
    cmd.env_remove("SKINLEDGER_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--no-color");
    cmd
}

pub fn run_cmd(home: &TempDir, args: &[&str]) -> Result<Output> {
    let mut cmd = base_cmd(home);
    cmd.args(args);
    let output = cmd.output()?;
    if !output.status.success() {
        bail!(
            "command failed: {:?}\nstdout: {}\nstderr: {}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(output)
}

pub fn run_cmd_json(home: &TempDir, args: &[&str]) -> Result<Value> {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = run_cmd(home, &full)?;
    let stdout = String::from_utf8(output.stdout)?;
    Ok(serde_json::from_str(&stdout)?)
}

pub fn path_arg(path: &Path) -> &str {
    path.to_str().expect("fixture path is not UTF-8")
}

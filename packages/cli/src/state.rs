//! The simulator's persistent chain: a genesis JSON file loaded into a
//! `MemoryStorage` for one command and exported back afterwards.

use std::{fs, path::{Path, PathBuf}};

use anyhow::{anyhow, Context, Result};
use cosmwasm_std::{BlockInfo, MemoryStorage, Timestamp};
use osmo_core::{
    bank::{BankKeeper, StoreBank},
    constants::MINT_MODULE,
    export_genesis, init_genesis, App, Coins, GenesisState, Msg, MsgResponse, QueryMsg, QueryResponse,
};

pub const CHAIN_ID: &str = "osmo-sim";

pub fn block(height: u64, time_secs: u64) -> BlockInfo {
    BlockInfo { height, time: Timestamp::from_seconds(time_secs), chain_id: CHAIN_ID.into() }
}

pub struct Sim {
    path: PathBuf,
    store: MemoryStorage,
    app: App,
}

impl Sim {
    /// Writes `genesis` to `path`. Refuses to clobber an existing file unless
    /// `force` is set.
    pub fn init(path: &Path, genesis: &GenesisState, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(anyhow!("State file '{}' already exists. Pass --force to overwrite it.", path.display()));
        }
        genesis.validate().context("invalid initial genesis")?;
        write_genesis(path, genesis)
    }

    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| {
            format!("Cannot read state file '{}'. Run `osmo-sim init` first.", path.display())
        })?;
        let genesis: GenesisState =
            serde_json::from_slice(&raw).with_context(|| format!("'{}' is not a valid state file", path.display()))?;
        let mut store = MemoryStorage::new();
        init_genesis(&mut store, &genesis).context("state file failed genesis validation")?;
        tracing::debug!(path = %path.display(), "state loaded");
        Ok(Sim { path: path.to_path_buf(), store, app: App::new() })
    }

    pub fn save(&self) -> Result<()> {
        write_genesis(&self.path, &self.export()?)
    }

    pub fn export(&self) -> Result<GenesisState> {
        export_genesis(&self.store).context("export failed")
    }

    pub fn execute(&mut self, block: &BlockInfo, msg: Msg) -> Result<MsgResponse> {
        Ok(self.app.execute(&mut self.store, block, msg)?)
    }

    pub fn query(&self, block: &BlockInfo, query: &QueryMsg) -> Result<QueryResponse> {
        Ok(self.app.query(&self.store, block, query)?)
    }

    pub fn begin_block(&mut self, block: &BlockInfo) -> Result<()> {
        Ok(self.app.begin_block(&mut self.store, block)?)
    }

    /// Mints `coins` out of thin air into `address`.
    pub fn fund(&mut self, address: &str, coins: &Coins) -> Result<()> {
        osmo_core::address::validate_address(address)?;
        StoreBank.mint_coins(&mut self.store, MINT_MODULE, coins)?;
        StoreBank.send_coins_from_module_to_account(&mut self.store, MINT_MODULE, address, coins)?;
        tracing::info!(%address, %coins, "account funded");
        Ok(())
    }

    pub fn balances(&self, address: &str) -> Result<Coins> {
        Ok(StoreBank.get_all_balances(&self.store, address)?)
    }
}

fn write_genesis(path: &Path, genesis: &GenesisState) -> Result<()> {
    let json = serde_json::to_vec_pretty(genesis)?;
    fs::write(path, json).with_context(|| format!("Cannot write state file '{}'", path.display()))
}

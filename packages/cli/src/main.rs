mod state;

use std::{path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use cosmwasm_std::{BlockInfo, Decimal256, Timestamp, Uint256};
use osmo_core::{
    gamm::{Params as GammParams, PoolAsset, PoolParams, SmoothWeightChangeParams},
    pool_yield::{DistrRecord, Params as PoolYieldParams},
    Coin, Coins, GenesisState, Msg, MsgResponse, QueryMsg, QueryResponse,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::state::{block, Sim};

// ─── CLI definition ───────────────────────────────────────────────────────────

/// osmo-sim: run gamm pools, farms and pool-yield distribution against a
/// local JSON state file.
///
/// Every command supports --json for machine-readable output.
#[derive(Parser)]
#[command(
    name    = "osmo-sim",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Balancer pools, LBP weight schedules and farm rewards, simulated from a JSON state file.",
    after_help = "\
ENVIRONMENT:
  OSMO_SIM_STATE   Path to the state file            [default: osmo-sim.json]
  OSMO_SIM_HEIGHT  Block height used by the command   [default: 1]
  OSMO_SIM_TIME    Block time, unix seconds           [default: 0]
  OSMO_SIM_LOG     tracing filter, e.g. osmo_core=info [default: warn]

QUICK START:
  osmo-sim init
  osmo-sim fund        --address <ADDR> --coins 10000000uatom,10000000uosmo
  osmo-sim create-pool --sender <ADDR> --assets 1000000uatom:1,1000000uosmo:1 --swap-fee 0.003
  osmo-sim swap-in     --sender <ADDR> --pool-id 1 --token-in 1000uosmo --out-denom uatom"
)]
struct Cli {
    /// Path to the JSON state file
    #[arg(long, global = true, value_name = "PATH", default_value = "osmo-sim.json", env = "OSMO_SIM_STATE")]
    state: PathBuf,

    /// Block height the command executes at
    #[arg(long, global = true, value_name = "HEIGHT", default_value_t = 1, env = "OSMO_SIM_HEIGHT")]
    height: u64,

    /// Block time the command executes at (unix seconds)
    #[arg(long, global = true, value_name = "SECONDS", default_value_t = 0, env = "OSMO_SIM_TIME")]
    time: u64,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty state file
    Init {
        /// Overwrite an existing state file
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Fee charged for every pool creation, e.g. 1000uosmo
        #[arg(long, value_name = "COINS")]
        pool_creation_fee: Option<String>,

        /// Denom the pool-yield module hands out each block
        #[arg(long, value_name = "DENOM", default_value = "uosmo")]
        minted_denom: String,

        /// Share of the fee collector's balance allocated per block
        #[arg(long, value_name = "DEC", default_value = "0.2")]
        allocation_ratio: String,
    },

    /// Mint coins into an account
    Fund {
        #[arg(long, value_name = "ADDR")]
        address: String,

        /// Comma-separated coins, e.g. 1000uatom,1000uosmo
        #[arg(long, value_name = "COINS")]
        coins: String,
    },

    /// Create a weighted pool from the sender's funds
    #[command(
        after_help = "\
EXAMPLES:
  # 50/50 pool with a 0.3% swap fee
  osmo-sim create-pool --sender <ADDR> --assets 1000000uatom:1,1000000uosmo:1 --swap-fee 0.003

  # Liquidity bootstrapping: move from 1:1 to 3:1 over two days, starting now
  osmo-sim create-pool --sender <ADDR> --assets 1000000uatom:1,1000000uosmo:1 \\
    --target-weights uatom:3,uosmo:1 --duration 48h

NOTES:
  Weights are user weights (below 2^20); the pool stores them scaled by 2^30."
    )]
    CreatePool {
        #[arg(long, value_name = "ADDR")]
        sender: String,

        /// Comma-separated <coin>:<weight> pairs
        #[arg(long, value_name = "ASSETS")]
        assets: String,

        #[arg(long, value_name = "DEC", default_value = "0")]
        swap_fee: String,

        #[arg(long, value_name = "DEC", default_value = "0")]
        exit_fee: String,

        /// Comma-separated <denom>:<weight> targets of a weight schedule
        #[arg(long, value_name = "WEIGHTS", requires = "duration")]
        target_weights: Option<String>,

        /// Length of the weight schedule, e.g. 48h
        #[arg(long, value_name = "DURATION", requires = "target_weights")]
        duration: Option<String>,

        /// Schedule start (unix seconds); 0 starts at the creation block
        #[arg(long, value_name = "SECONDS", default_value_t = 0)]
        start_time: u64,

        #[arg(long, value_name = "GOVERNOR", default_value = "")]
        governor: String,
    },

    /// Join a pool for an exact share amount, paying every asset
    Join {
        #[arg(long, value_name = "ADDR")]
        sender: String,
        #[arg(long, value_name = "ID")]
        pool_id: u64,
        #[arg(long, value_name = "SHARES")]
        shares: u128,
        /// Per-denom upper bounds, e.g. 1000uatom
        #[arg(long, value_name = "COINS")]
        max_in: Option<String>,
    },

    /// Burn shares for a proportional share of every asset
    Exit {
        #[arg(long, value_name = "ADDR")]
        sender: String,
        #[arg(long, value_name = "ID")]
        pool_id: u64,
        #[arg(long, value_name = "SHARES")]
        shares: u128,
        /// Per-denom lower bounds
        #[arg(long, value_name = "COINS")]
        min_out: Option<String>,
    },

    /// Sell an exact amount of one asset
    SwapIn {
        #[arg(long, value_name = "ADDR")]
        sender: String,
        #[arg(long, value_name = "ID")]
        pool_id: u64,
        #[arg(long, value_name = "COIN")]
        token_in: String,
        #[arg(long, value_name = "DENOM")]
        out_denom: String,
        #[arg(long, value_name = "AMOUNT", default_value_t = 1)]
        min_out: u128,
    },

    /// Buy an exact amount of one asset
    SwapOut {
        #[arg(long, value_name = "ADDR")]
        sender: String,
        #[arg(long, value_name = "ID")]
        pool_id: u64,
        #[arg(long, value_name = "DENOM")]
        in_denom: String,
        #[arg(long, value_name = "AMOUNT")]
        max_in: u128,
        #[arg(long, value_name = "COIN")]
        token_out: String,
    },

    /// Price of one base asset in quote assets
    SpotPrice {
        #[arg(long, value_name = "ID")]
        pool_id: u64,
        #[arg(long, value_name = "DENOM")]
        quote: String,
        #[arg(long, value_name = "DENOM")]
        base: String,
    },

    /// Move a pool's weights along its schedule to the current block time
    Poke {
        #[arg(long, value_name = "ID")]
        pool_id: u64,
    },

    /// Show a pool as of the current block time
    Pool {
        #[arg(long, value_name = "ID")]
        pool_id: u64,
    },

    /// Create an empty farm
    NewFarm,

    /// Add share to a farmer, paying out rewards settled so far
    Deposit {
        #[arg(long, value_name = "ID")]
        farm_id: u64,
        #[arg(long, value_name = "ADDR")]
        address: String,
        #[arg(long, value_name = "SHARE")]
        share: u128,
    },

    /// Remove share from a farmer, paying out rewards settled so far
    Withdraw {
        #[arg(long, value_name = "ID")]
        farm_id: u64,
        #[arg(long, value_name = "ADDR")]
        address: String,
        #[arg(long, value_name = "SHARE")]
        share: u128,
    },

    /// Pay out a farmer's pending rewards
    Claim {
        #[arg(long, value_name = "ID")]
        farm_id: u64,
        #[arg(long, value_name = "ADDR")]
        address: String,
    },

    /// Fund a farm's rewards from an account
    Allocate {
        #[arg(long, value_name = "ID")]
        farm_id: u64,
        #[arg(long, value_name = "ADDR")]
        sender: String,
        #[arg(long, value_name = "COINS")]
        assets: String,
    },

    /// Rewards a farmer would receive now, with decimals
    Pending {
        #[arg(long, value_name = "ID")]
        farm_id: u64,
        #[arg(long, value_name = "ADDR")]
        address: String,
    },

    /// Append pool-yield distribution records
    AddDistr {
        /// Comma-separated <farm id>:<weight> pairs
        #[arg(long, value_name = "RECORDS")]
        records: String,
    },

    /// Remove pool-yield distribution records by index
    RemoveDistr {
        /// Comma-separated record indexes
        #[arg(long, value_name = "INDEXES", value_delimiter = ',')]
        indexes: Vec<usize>,
    },

    /// Run begin-block: poke scheduled pools, then allocate collected fees
    BeginBlock,

    /// Every balance of an account
    Balance {
        #[arg(long, value_name = "ADDR")]
        address: String,
    },

    /// Print the whole state as genesis JSON
    Export,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("OSMO_SIM_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    if std::env::args().len() == 1 {
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    let at = block(cli.height, cli.time);

    if let Commands::Init { force, pool_creation_fee, minted_denom, allocation_ratio } = &cli.command {
        return cmd_init(&cli, *force, pool_creation_fee.as_deref(), minted_denom, allocation_ratio);
    }

    let mut sim = Sim::open(&cli.state)?;
    match &cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Fund { address, coins } => {
            let coins = parse_coins(coins)?;
            sim.fund(address, &coins)?;
            sim.save()?;
            print_result(&cli, "fund", json!({ "address": address, "coins": coins }), &[
                ("Account", address.clone()),
                ("Funded", coins.to_string()),
            ])?;
        }
        Commands::CreatePool { sender, assets, swap_fee, exit_fee, target_weights, duration, start_time, governor } => {
            let mut pool_params = PoolParams::new(parse_dec(swap_fee, "--swap-fee")?, parse_dec(exit_fee, "--exit-fee")?);
            if let (Some(targets), Some(duration)) = (target_weights, duration) {
                pool_params.smooth_weight_change_params = Some(SmoothWeightChangeParams {
                    start_time: Timestamp::from_seconds(*start_time),
                    duration: humantime::parse_duration(duration)
                        .with_context(|| format!("--duration '{duration}' is not a duration, e.g. 48h"))?,
                    initial_pool_weights: vec![],
                    target_pool_weights: parse_weights(targets)?,
                });
            }
            let msg = Msg::CreatePool {
                sender: sender.clone(),
                pool_params,
                pool_assets: parse_pool_assets(assets)?,
                future_pool_governor: governor.clone(),
            };
            run_msg(&cli, &mut sim, &at, "create-pool", msg)?;
        }
        Commands::Join { sender, pool_id, shares, max_in } => {
            let msg = Msg::JoinPool {
                sender: sender.clone(),
                pool_id: *pool_id,
                share_out_amount: Uint256::from(*shares),
                token_in_maxs: parse_optional_coins(max_in.as_deref())?,
            };
            run_msg(&cli, &mut sim, &at, "join", msg)?;
        }
        Commands::Exit { sender, pool_id, shares, min_out } => {
            let msg = Msg::ExitPool {
                sender: sender.clone(),
                pool_id: *pool_id,
                share_in_amount: Uint256::from(*shares),
                token_out_mins: parse_optional_coins(min_out.as_deref())?,
            };
            run_msg(&cli, &mut sim, &at, "exit", msg)?;
        }
        Commands::SwapIn { sender, pool_id, token_in, out_denom, min_out } => {
            let msg = Msg::SwapExactAmountIn {
                sender: sender.clone(),
                pool_id: *pool_id,
                token_in: parse_coin(token_in)?,
                token_out_denom: out_denom.clone(),
                token_out_min_amount: Uint256::from(*min_out),
            };
            run_msg(&cli, &mut sim, &at, "swap-in", msg)?;
        }
        Commands::SwapOut { sender, pool_id, in_denom, max_in, token_out } => {
            let msg = Msg::SwapExactAmountOut {
                sender: sender.clone(),
                pool_id: *pool_id,
                token_in_denom: in_denom.clone(),
                token_in_max_amount: Uint256::from(*max_in),
                token_out: parse_coin(token_out)?,
            };
            run_msg(&cli, &mut sim, &at, "swap-out", msg)?;
        }
        Commands::SpotPrice { pool_id, quote, base } => {
            let query = QueryMsg::SpotPrice { pool_id: *pool_id, quote_denom: quote.clone(), base_denom: base.clone() };
            run_query(&cli, &sim, &at, "spot-price", &query)?;
        }
        Commands::Poke { pool_id } => {
            run_msg(&cli, &mut sim, &at, "poke", Msg::PokePool { pool_id: *pool_id })?;
        }
        Commands::Pool { pool_id } => {
            run_query(&cli, &sim, &at, "pool", &QueryMsg::Pool { pool_id: *pool_id })?;
        }
        Commands::NewFarm => {
            run_msg(&cli, &mut sim, &at, "new-farm", Msg::NewFarm {})?;
        }
        Commands::Deposit { farm_id, address, share } => {
            let msg = Msg::DepositShare { farm_id: *farm_id, address: address.clone(), share: Uint256::from(*share) };
            run_msg(&cli, &mut sim, &at, "deposit", msg)?;
        }
        Commands::Withdraw { farm_id, address, share } => {
            let msg = Msg::WithdrawShare { farm_id: *farm_id, address: address.clone(), share: Uint256::from(*share) };
            run_msg(&cli, &mut sim, &at, "withdraw", msg)?;
        }
        Commands::Claim { farm_id, address } => {
            let msg = Msg::WithdrawRewards { farm_id: *farm_id, address: address.clone() };
            run_msg(&cli, &mut sim, &at, "claim", msg)?;
        }
        Commands::Allocate { farm_id, sender, assets } => {
            let msg = Msg::AllocateToFarm { sender: sender.clone(), farm_id: *farm_id, assets: parse_coins(assets)? };
            run_msg(&cli, &mut sim, &at, "allocate", msg)?;
        }
        Commands::Pending { farm_id, address } => {
            let query = QueryMsg::PendingRewards { farm_id: *farm_id, address: address.clone() };
            run_query(&cli, &sim, &at, "pending", &query)?;
        }
        Commands::AddDistr { records } => {
            run_msg(&cli, &mut sim, &at, "add-distr", Msg::AddDistrRecords { records: parse_records(records)? })?;
        }
        Commands::RemoveDistr { indexes } => {
            run_msg(&cli, &mut sim, &at, "remove-distr", Msg::RemoveDistrRecords { indexes: indexes.clone() })?;
        }
        Commands::BeginBlock => {
            sim.begin_block(&at)?;
            sim.save()?;
            let distr_info = sim.query(&at, &QueryMsg::DistrInfo {})?;
            print_result(&cli, "begin-block", json!({ "height": at.height, "distr_info": distr_info }), &[
                ("Height", at.height.to_string()),
                ("Time", at.time.seconds().to_string()),
            ])?;
        }
        Commands::Balance { address } => {
            let coins = sim.balances(address)?;
            print_result(&cli, "balance", json!({ "address": address, "coins": coins }), &[
                ("Account", address.clone()),
                ("Balance", display_or_dash(&coins.to_string())),
            ])?;
        }
        Commands::Export => {
            println!("{}", serde_json::to_string_pretty(&sim.export()?)?);
        }
    }

    Ok(())
}

// ─── init ─────────────────────────────────────────────────────────────────────

fn cmd_init(
    cli: &Cli,
    force: bool,
    pool_creation_fee: Option<&str>,
    minted_denom: &str,
    allocation_ratio: &str,
) -> Result<()> {
    let mut genesis = GenesisState::default();
    genesis.gamm.params = GammParams { pool_creation_fee: parse_optional_coins(pool_creation_fee)? };
    genesis.pool_yield.params = PoolYieldParams {
        minted_denom: minted_denom.to_string(),
        allocation_ratio: parse_dec(allocation_ratio, "--allocation-ratio")?,
    };
    Sim::init(&cli.state, &genesis, force)?;

    print_result(cli, "init", json!({ "state": cli.state.display().to_string() }), &[
        ("State file", cli.state.display().to_string()),
        ("Creation fee", display_or_dash(&genesis.gamm.params.pool_creation_fee.to_string())),
        ("Yield", format!("{} of the fee collector's {} per block", allocation_ratio, minted_denom)),
    ])
}

// ─── Execution helpers ────────────────────────────────────────────────────────

fn run_msg(cli: &Cli, sim: &mut Sim, at: &BlockInfo, command: &str, msg: Msg) -> Result<()> {
    let response = sim.execute(at, msg).with_context(|| format!("{command} failed"))?;
    sim.save()?;

    let lines = match &response {
        MsgResponse::PoolCreated { pool_id } => vec![("Pool id", pool_id.to_string())],
        MsgResponse::FarmCreated { farm_id } => vec![("Farm id", farm_id.to_string())],
        MsgResponse::Coins { coins } => vec![("Coins", display_or_dash(&coins.to_string()))],
        MsgResponse::Amount { amount } => vec![("Amount", amount.to_string())],
        MsgResponse::Pool { pool } => pool_lines(pool),
        MsgResponse::Empty {} => vec![],
    };
    print_result(cli, command, serde_json::to_value(&response)?, &lines)
}

fn run_query(cli: &Cli, sim: &Sim, at: &BlockInfo, command: &str, query: &QueryMsg) -> Result<()> {
    let response = sim.query(at, query)?;
    let lines = match &response {
        QueryResponse::Pool { pool } => pool_lines(pool),
        QueryResponse::SpotPrice { spot_price } => vec![("Spot price", spot_price.to_string())],
        QueryResponse::PendingRewards { rewards } => vec![("Pending", display_or_dash(&rewards.to_string()))],
        other => vec![("Result", serde_json::to_string(other)?)],
    };
    print_result(cli, command, serde_json::to_value(&response)?, &lines)
}

fn pool_lines(pool: &osmo_core::gamm::Pool) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("Pool id", pool.id.to_string()),
        ("Address", pool.address.clone()),
        ("Shares", pool.total_shares.to_string()),
        ("Swap fee", pool.pool_params.swap_fee.to_string()),
        ("Exit fee", pool.pool_params.exit_fee.to_string()),
    ];
    for asset in &pool.pool_assets {
        lines.push(("Asset", format!("{}  weight {}", asset.token, asset.weight)));
    }
    if let Some(schedule) = &pool.pool_params.smooth_weight_change_params {
        lines.push(("Schedule ends", schedule.end_time().seconds().to_string()));
    }
    lines
}

fn print_result(cli: &Cli, command: &str, result: serde_json::Value, lines: &[(&str, String)]) -> Result<()> {
    if cli.json {
        println!("{}", json!({ "status": "ok", "command": command, "result": result }));
    } else {
        println!("─── {command} ───────────────────────────────────────────────────");
        for (label, value) in lines {
            println!("  {label:<16} {value}");
        }
    }
    Ok(())
}

fn display_or_dash(s: &str) -> String {
    if s.is_empty() { "—".to_string() } else { s.to_string() }
}

// ─── Argument parsing ─────────────────────────────────────────────────────────

fn parse_coin(s: &str) -> Result<Coin> {
    Coin::from_str(s).map_err(|e| anyhow!("'{s}' is not a coin, e.g. 1000uosmo: {e}"))
}

fn parse_coins(s: &str) -> Result<Coins> {
    Coins::from_str(s).map_err(|e| anyhow!("'{s}' is not a coin list, e.g. 10uatom,20uosmo: {e}"))
}

fn parse_optional_coins(s: Option<&str>) -> Result<Coins> {
    s.map(parse_coins).transpose().map(Option::unwrap_or_default)
}

fn parse_dec(s: &str, flag: &str) -> Result<Decimal256> {
    Decimal256::from_str(s).map_err(|_| anyhow!("{flag} '{s}' is not a decimal, e.g. 0.003"))
}

/// `1000uatom:1,1000uosmo:3`
fn parse_pool_assets(s: &str) -> Result<Vec<PoolAsset>> {
    s.split(',')
        .map(|part| {
            let (coin, weight) = part
                .split_once(':')
                .ok_or_else(|| anyhow!("pool asset '{part}' must look like <coin>:<weight>"))?;
            Ok(PoolAsset::new(parse_coin(coin)?, parse_weight(weight)?))
        })
        .collect()
}

/// `uatom:3,uosmo:1`
fn parse_weights(s: &str) -> Result<Vec<PoolAsset>> {
    s.split(',')
        .map(|part| {
            let (denom, weight) = part
                .split_once(':')
                .ok_or_else(|| anyhow!("target weight '{part}' must look like <denom>:<weight>"))?;
            Ok(PoolAsset::new(Coin::new(0, denom.trim()), parse_weight(weight)?))
        })
        .collect()
}

/// `1:10,2:5`
fn parse_records(s: &str) -> Result<Vec<DistrRecord>> {
    s.split(',')
        .map(|part| {
            let (farm_id, weight) = part
                .split_once(':')
                .ok_or_else(|| anyhow!("record '{part}' must look like <farm id>:<weight>"))?;
            Ok(DistrRecord {
                farm_id: farm_id.trim().parse().with_context(|| format!("bad farm id in '{part}'"))?,
                weight: Uint256::from(parse_weight(weight)?),
            })
        })
        .collect()
}

fn parse_weight(s: &str) -> Result<u128> {
    s.trim().parse().with_context(|| format!("weight '{s}' is not an integer"))
}

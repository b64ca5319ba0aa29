use anyhow::{bail, Context};
use celo_cip64::cip64::parse_quantity;
use celo_cip64::utils::logging::{self, LogLevel};
use celo_cip64::{
    log_info, log_warn, to_checksum_address, ChainConfig, Cip64Error, Cip64Transaction, Hardfork,
    TxOptions,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(name = "cip64", version, about = "Inspect, build and sign Celo CIP-64 transactions")]
struct Cli {
    /// Named chain preset: celo (mainnet) or alfajores (testnet)
    #[arg(long, global = true, conflicts_with = "chain_config")]
    chain: Option<String>,

    /// Chain id the transaction must carry
    #[arg(long, global = true)]
    chain_id: Option<u64>,

    /// Hardfork for gas accounting and signature rules
    #[arg(long, global = true)]
    hardfork: Option<Hardfork>,

    /// JSON chain config file: {"name", "chainId", "hardfork"}
    #[arg(long, global = true)]
    chain_config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Decode a serialized transaction to JSON
    Decode { tx: String },
    /// Transaction hash of a signed transaction
    Hash { tx: String },
    /// Recover the sender address
    Sender { tx: String },
    /// Upfront cost and intrinsic gas
    Cost {
        tx: String,
        /// Block base fee per gas (hex or decimal)
        #[arg(long, default_value = "0")]
        base_fee: String,
    },
    /// Serialize a JSON request (file path or `-` for stdin)
    Encode { input: String },
    /// Message to sign for a JSON request
    Message {
        input: String,
        /// Print the unhashed signing payload
        #[arg(long)]
        raw: bool,
    },
    /// Sign a JSON request
    Sign {
        input: String,
        /// 32-byte hex private key
        #[arg(long, env = "CIP64_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        logging::set_min_level(LogLevel::Debug);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<Cip64Error>() {
                Some(cip64_err) => match serde_json::to_string(&cip64_err.report()) {
                    Ok(report) => eprintln!("{}", report),
                    Err(_) => eprintln!("error: {}", cip64_err),
                },
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let opts = tx_options(&cli)?;

    match cli.cmd {
        Cmd::Decode { tx } => {
            let tx = Cip64Transaction::decode_hex(&tx, opts)?;
            println!("{}", serde_json::to_string_pretty(&tx.to_json())?);
        }
        Cmd::Hash { tx } => {
            let tx = Cip64Transaction::decode_hex(&tx, opts)?;
            println!("0x{}", hex::encode(tx.hash()?));
        }
        Cmd::Sender { tx } => {
            let tx = Cip64Transaction::decode_hex(&tx, opts)?;
            println!("{}", to_checksum_address(&tx.sender_address()?));
        }
        Cmd::Cost { tx, base_fee } => {
            let base_fee = parse_quantity(&base_fee)
                .map_err(anyhow::Error::msg)
                .context("invalid --base-fee")?;
            let tx = Cip64Transaction::decode_hex(&tx, opts)?;
            let problems = tx.validate();
            if !problems.is_empty() {
                log_warn!("cli", "transaction would be rejected", problems = problems.join("; "));
            }
            let report = serde_json::json!({
                "upfrontCost": tx.estimate_fee(base_fee).map(|cost| cost.to_string()),
                "intrinsicGas": tx.base_fee().to_string(),
                "dataFee": tx.data_fee().to_string(),
                "problems": problems,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::Encode { input } => {
            let tx = read_request(&input, opts)?;
            println!("{}", tx.encode_hex());
        }
        Cmd::Message { input, raw } => {
            let tx = read_request(&input, opts)?;
            println!("0x{}", hex::encode(tx.message_to_sign(!raw)));
        }
        Cmd::Sign { input, private_key } => {
            let private_key = Zeroizing::new(private_key);
            let key_hex = private_key.trim();
            let key = Zeroizing::new(
                hex::decode(key_hex.strip_prefix("0x").unwrap_or(key_hex))
                    .map_err(|e| Cip64Error::InvalidPrivateKey(e.to_string()))?,
            );

            let signed = read_request(&input, opts)?.sign(&key)?;
            let hash = format!("0x{}", hex::encode(signed.hash()?));
            log_info!("cli", "signed transaction", tx_hash = hash);

            let out = serde_json::json!({
                "raw": signed.encode_hex(),
                "hash": hash,
                "sender": to_checksum_address(&signed.sender_address()?),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}

/// Resolve the global chain flags into construction options
fn tx_options(cli: &Cli) -> anyhow::Result<TxOptions> {
    let base = match (&cli.chain_config, &cli.chain) {
        (Some(path), _) => Some(ChainConfig::from_json_file(path)?),
        (None, Some(name)) => match ChainConfig::preset(name) {
            Some(config) => Some(config),
            None => bail!("unknown chain preset: {} (expected celo or alfajores)", name),
        },
        (None, None) => None,
    };

    let chain = match (base, cli.chain_id) {
        (Some(mut config), Some(id)) => {
            if id != config.chain_id {
                log_warn!("cli", "--chain-id overrides configured chain", config_chain_id = config.chain_id, chain_id = id);
            }
            config.chain_id = id;
            Some(config)
        }
        (None, Some(id)) => Some(ChainConfig::custom(id)),
        (base, None) => base,
    };

    let chain = match (chain, cli.hardfork) {
        (Some(config), Some(hardfork)) => Some(config.with_hardfork(hardfork)),
        (None, Some(_)) => bail!("--hardfork requires --chain, --chain-id or --chain-config"),
        (chain, None) => chain,
    };

    Ok(match chain {
        Some(config) => TxOptions::with_chain(config),
        None => TxOptions::default(),
    })
}

fn read_request(input: &str, opts: TxOptions) -> anyhow::Result<Cip64Transaction> {
    let payload = if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {}", input))?
    };

    Ok(Cip64Transaction::from_json_str(&payload, opts)?)
}

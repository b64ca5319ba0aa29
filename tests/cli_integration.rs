use celo_cip64::utils::crypto::private_key_to_public_key;
use celo_cip64::{public_key_to_address, to_checksum_address};
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output, Stdio};

const SIGNED_TX: &str = "0x7bf88282ad5a8063630a94588e4b68193001e4d10928660ab4165b813717c0880de0b6b3a764000083abcdefc094cd2a3d9f938e13cd947ec05abc7fe734df8dd82680a091b5504a59e529e7efa42dbb97fbc3311a91d035c873a94ab0789441fc989f84a02e8254d6b3101b63417e5d496833bc84f4832d4a8bf8a2b83e291d8f38c0f62d";
const SIGNED_TX_HASH: &str = "0x645afc1d19fe805c0c0956e70d5415487bf073741d7b297ccb7e7040c6ce5df6";
const PRIVATE_KEY1: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

const REQUEST: &str = r#"{
    "chainId": "0xad5a",
    "nonce": 0,
    "maxPriorityFeePerGas": "99",
    "maxFeePerGas": "99",
    "gas": "10",
    "to": "0x588e4b68193001e4d10928660ab4165b813717c0",
    "value": "1000000000000000000",
    "data": "0xabcdef",
    "feeCurrency": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
}"#;

fn cip64() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cip64"));
    cmd.env_remove("CIP64_PRIVATE_KEY");
    cmd
}

fn run(args: &[&str]) -> Output {
    cip64().args(args).output().expect("cli runs")
}

fn run_with_stdin(mut cmd: Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("cli spawns");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("write request");
    child.wait_with_output().expect("cli exits")
}

fn stdout(output: &Output) -> String {
    assert!(output.status.success(), "cli exited unsuccessfully: {:?}", output);
    String::from_utf8(output.stdout.clone()).expect("stdout is utf8")
}

fn error_report(output: &Output) -> Value {
    assert!(!output.status.success(), "cli unexpectedly succeeded: {:?}", output);
    let stderr = String::from_utf8(output.stderr.clone()).expect("stderr is utf8");
    let line = stderr.lines().last().expect("stderr has a report");
    serde_json::from_str(line).expect("stderr report is json")
}

fn sender_of(key_hex: &str) -> String {
    let key = hex::decode(key_hex.trim_start_matches("0x")).unwrap();
    to_checksum_address(&public_key_to_address(&private_key_to_public_key(&key).unwrap()))
}

#[test]
fn decode_prints_hex_json() {
    let json: Value = serde_json::from_str(&stdout(&run(&["decode", SIGNED_TX]))).unwrap();

    assert_eq!(json["chainId"], "0xad5a");
    assert_eq!(json["gasLimit"], "0xa");
    assert_eq!(json["feeCurrency"], "0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826");
    assert_eq!(json["v"], "0x0");
}

#[test]
fn hash_and_sender_of_known_transaction() {
    assert_eq!(stdout(&run(&["hash", SIGNED_TX])).trim(), SIGNED_TX_HASH);
    assert_eq!(
        stdout(&run(&["sender", SIGNED_TX])).trim(),
        sender_of(PRIVATE_KEY1)
    );
}

#[test]
fn cost_reports_upfront_cost() {
    let json: Value =
        serde_json::from_str(&stdout(&run(&["cost", SIGNED_TX, "--base-fee", "0x1"]))).unwrap();

    assert_eq!(json["upfrontCost"], "1000000000000000990");
    assert_eq!(json["intrinsicGas"], "21048");
    assert_eq!(json["problems"].as_array().map(Vec::len), Some(1));
}

#[test]
fn sign_request_from_stdin() {
    let mut cmd = cip64();
    cmd.args(["sign", "-", "--chain-id", "44378"])
        .env("CIP64_PRIVATE_KEY", PRIVATE_KEY1);
    let json: Value = serde_json::from_str(&stdout(&run_with_stdin(cmd, REQUEST))).unwrap();

    assert_eq!(json["raw"], SIGNED_TX);
    assert_eq!(json["hash"], SIGNED_TX_HASH);
    assert_eq!(json["sender"], sender_of(PRIVATE_KEY1).as_str());
}

#[test]
fn encode_request_is_unsigned() {
    let mut cmd = cip64();
    cmd.args(["encode", "-"]);
    let encoded = stdout(&run_with_stdin(cmd, REQUEST));

    let mut cmd = cip64();
    cmd.args(["message", "-", "--raw"]);
    let message = stdout(&run_with_stdin(cmd, REQUEST));

    assert!(encoded.trim().starts_with("0x7b"));
    assert_eq!(encoded.trim(), message.trim());

    let hash_err = error_report(&run(&["hash", encoded.trim()]));
    assert_eq!(hash_err["code"], "not_signed");
}

#[test]
fn wrong_type_reports_json_error() {
    let eip1559 = format!("0x02{}", &SIGNED_TX[4..]);
    let report = error_report(&run(&["decode", &eip1559]));

    assert_eq!(report["code"], "wrong_transaction_type");
    let message = report["message"].as_str().unwrap();
    assert!(message.contains("expected: 0x7b"));
    assert!(message.contains("received: 0x02"));
}

#[test]
fn chain_id_flag_is_enforced() {
    let report = error_report(&run(&["decode", SIGNED_TX, "--chain-id", "42220"]));
    assert_eq!(report["code"], "chain_id_mismatch");

    assert!(run(&["decode", SIGNED_TX, "--chain-id", "44378", "--hardfork", "shanghai"])
        .status
        .success());
}

#[test]
fn chain_preset_flag_selects_chain() {
    let report = error_report(&run(&["decode", SIGNED_TX, "--chain", "celo"]));
    assert_eq!(report["code"], "chain_id_mismatch");
    assert!(report["message"].as_str().unwrap().contains("42220"));

    let alfajores = run(&["hash", SIGNED_TX, "--chain", "alfajores", "--chain-id", "44378"]);
    assert_eq!(stdout(&alfajores).trim(), SIGNED_TX_HASH);

    let unknown = run(&["decode", SIGNED_TX, "--chain", "goerli"]);
    assert!(!unknown.status.success());
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("unknown chain preset"));
}

#[test]
fn sign_rejects_bad_private_key() {
    let mut cmd = cip64();
    cmd.args(["sign", "-", "--private-key", "0x1234"]);
    let report = error_report(&run_with_stdin(cmd, REQUEST));
    assert_eq!(report["code"], "invalid_private_key");
}

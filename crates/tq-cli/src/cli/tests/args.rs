//! Parsing of each subcommand and the global flag.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_status() {
    match parse(&["tq", "status"]) {
        CliCommand::Status { json } => assert!(!json),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_status_json() {
    match parse(&["tq", "status", "--json"]) {
        CliCommand::Status { json } => assert!(json),
        _ => panic!("expected Status with --json"),
    }
}

#[test]
fn cli_parse_cancel() {
    match parse(&["tq", "cancel", "album_302127_9"]) {
        CliCommand::Cancel { uuid } => assert_eq!(uuid, "album_302127_9"),
        _ => panic!("expected Cancel"),
    }
}

#[test]
fn cli_parse_cancel_requires_uuid() {
    assert!(Cli::try_parse_from(["tq", "cancel"]).is_err());
}

#[test]
fn cli_parse_clear_and_clean() {
    assert!(matches!(parse(&["tq", "clear"]), CliCommand::Clear));
    assert!(matches!(parse(&["tq", "clean"]), CliCommand::Clean));
}

#[test]
fn cli_parse_parse() {
    match parse(&["tq", "parse", "https://www.deezer.com/album/302127"]) {
        CliCommand::Parse { link } => assert_eq!(link, "https://www.deezer.com/album/302127"),
        _ => panic!("expected Parse"),
    }
}

#[test]
fn cli_parse_config() {
    assert!(matches!(parse(&["tq", "config"]), CliCommand::Config));
}

#[test]
fn cli_queue_dir_is_global() {
    let cli = Cli::try_parse_from(["tq", "status", "--queue-dir", "/tmp/q"]).unwrap();
    assert_eq!(cli.queue_dir, Some(PathBuf::from("/tmp/q")));

    let cli = Cli::try_parse_from(["tq", "--queue-dir", "/tmp/q", "clean"]).unwrap();
    assert_eq!(cli.queue_dir, Some(PathBuf::from("/tmp/q")));
    assert!(matches!(cli.command, CliCommand::Clean));
}

#[test]
fn cli_unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["tq", "download"]).is_err());
}

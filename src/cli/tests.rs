use super::{Cli, Commands};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_serve_defaults() {
    let cli = Cli::try_parse_from(["crudhook", "serve"]).unwrap();
    match cli.command {
        Commands::Serve { root, addr } => {
            assert_eq!(root, PathBuf::from("."));
            assert_eq!(addr, None);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_serve_with_root_and_addr() {
    let cli = Cli::try_parse_from([
        "crudhook",
        "serve",
        "--root",
        "demos",
        "--addr",
        "127.0.0.1:3000",
    ])
    .unwrap();
    match cli.command {
        Commands::Serve { root, addr } => {
            assert_eq!(root, PathBuf::from("demos"));
            assert_eq!(addr.as_deref(), Some("127.0.0.1:3000"));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_routes_command() {
    let cli = Cli::try_parse_from(["crudhook", "routes", "-r", "svc"]).unwrap();
    assert!(matches!(cli.command, Commands::Routes { root } if root == PathBuf::from("svc")));
}

#[test]
fn test_unknown_command_rejected() {
    assert!(Cli::try_parse_from(["crudhook", "generate"]).is_err());
}

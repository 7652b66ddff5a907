use clap::Parser;
use kira_binmatrix::cli::{AnchorArg, Cli, Commands, ViewCommand};
use kira_binmatrix::geometry::{Anchor, BinGeometry};
use kira_binmatrix::store::ViewRequest;

#[test]
fn bin_geometry_defaults() {
    let cli = Cli::parse_from([
        "kira-binmatrix",
        "bin",
        "--features",
        "f.bed",
        "--ambiguous",
        "t.bw",
        "--out",
        "m.matrix",
    ]);
    match cli.command {
        Commands::Bin(args) => {
            assert_eq!(args.geometry.geometry(), BinGeometry::default());
            assert!(!args.unstranded_features);
        }
        _ => panic!("expected bin command"),
    }
}

#[test]
fn bin_accepts_negative_start_and_anchor() {
    let cli = Cli::parse_from([
        "kira-binmatrix",
        "bin",
        "--features",
        "f.bed",
        "--plus",
        "p.bw",
        "--minus",
        "m.bw",
        "--anchor",
        "end",
        "--bin-start",
        "-1000",
        "--out",
        "m.matrix",
    ]);
    match cli.command {
        Commands::Bin(args) => {
            assert!(matches!(args.geometry.anchor, AnchorArg::End));
            let g = args.geometry.geometry();
            assert_eq!(g.anchor, Anchor::End);
            assert_eq!(g.bin_start, -1000);
        }
        _ => panic!("expected bin command"),
    }
}

#[test]
fn plus_track_requires_minus() {
    let parsed = Cli::try_parse_from([
        "kira-binmatrix",
        "bin",
        "--features",
        "f.bed",
        "--plus",
        "p.bw",
        "--out",
        "m.matrix",
    ]);
    assert!(parsed.is_err());
}

#[test]
fn view_subcommands_map_to_requests() {
    let cli = Cli::parse_from([
        "kira-binmatrix",
        "view",
        "--artifact",
        "a.json",
        "ks",
        "--matrix-id",
        "3",
    ]);
    match cli.command {
        Commands::View(args) => {
            assert!(matches!(args.view, ViewCommand::Ks { .. }));
            assert_eq!(
                ViewRequest::from(args.view),
                ViewRequest::Ks {
                    matrix_id: 3,
                    vector_id: 0,
                    quantiles: 4,
                }
            );
        }
        _ => panic!("expected view command"),
    }
}

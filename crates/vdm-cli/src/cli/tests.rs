use super::*;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_download() {
    match parse(&["vdm", "download", "https://example.com/watch?v=abc"]) {
        CliCommand::Download { url, dir } => {
            assert_eq!(url, "https://example.com/watch?v=abc");
            assert!(dir.is_none());
        }
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_download_with_dir() {
    match parse(&["vdm", "download", "https://example.com/v", "--dir", "/media"]) {
        CliCommand::Download { dir, .. } => {
            assert_eq!(dir, Some(PathBuf::from("/media")));
        }
        _ => panic!("expected Download with dir"),
    }
}

#[test]
fn cli_parse_playlist() {
    match parse(&["vdm", "playlist", "https://example.com/playlist?list=x"]) {
        CliCommand::Playlist { url, dir } => {
            assert_eq!(url, "https://example.com/playlist?list=x");
            assert!(dir.is_none());
        }
        _ => panic!("expected Playlist"),
    }
}

#[test]
fn cli_parse_metadata() {
    match parse(&["vdm", "metadata", "https://example.com/watch?v=abc"]) {
        CliCommand::Metadata { url } => {
            assert_eq!(url, "https://example.com/watch?v=abc");
        }
        _ => panic!("expected Metadata"),
    }
}

#[test]
fn cli_rejects_missing_url() {
    assert!(Cli::try_parse_from(["vdm", "download"]).is_err());
    assert!(Cli::try_parse_from(["vdm", "metadata"]).is_err());
}

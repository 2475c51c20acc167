use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use fusion_reconcile::{RemovalRequest, Session};
use fusion_store::{PruneConfig, SheetsClient};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("fusion-prune")
        .version(fusion_reconcile::VERSION)
        .about("Remove a contributor's sprites and renumber their siblings")
        .arg(
            Arg::new("username")
                .required(true)
                .help("Name as it appears in the credits ledger"),
        )
        .arg(
            Arg::new("collabs")
                .short('c')
                .long("collabs")
                .action(ArgAction::SetTrue)
                .help("Also remove sprites made together with others"),
        )
        .arg(
            Arg::new("only")
                .short('o')
                .long("only")
                .num_args(1..)
                .action(ArgAction::Append)
                .help("Remove only these identifiers"),
        )
        .arg(
            Arg::new("backup")
                .short('b')
                .long("backup")
                .action(ArgAction::SetTrue)
                .help("Copy files and ledger rows to the removed directory first"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .default_value("fusion-prune.toml")
                .help("Configuration file"),
        )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = cli().get_matches();
    let username = matches
        .get_one::<String>("username")
        .context("username is required")?;
    let config_path = matches
        .get_one::<String>("config")
        .context("config path is required")?;

    let mut request = RemovalRequest::new(username.as_str())
        .with_collabs(matches.get_flag("collabs"))
        .with_backup(matches.get_flag("backup"));
    if let Some(only) = matches.get_many::<String>("only") {
        request = request.with_only(only.cloned());
    }

    let config = PruneConfig::load(config_path)
        .with_context(|| format!("loading {config_path}"))?;
    let client = SheetsClient::from_settings(&config.sheets).context("creating sheets client")?;

    let report = Session::new(config, client)
        .run(&request)
        .await
        .context("removal stopped")?;

    println!("Removed {} artifact(s)", report.removed.len());
    for (id, reason) in &report.skipped {
        println!("Skipped {id}: {reason}");
    }
    for warning in &report.warnings {
        println!("Warning: {warning}");
    }
    if !report.divergences.is_empty() {
        println!(
            "{} store snapshot(s) changed underneath this run; check the sheets",
            report.divergences.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_flags_and_ids() {
        let matches = cli()
            .try_get_matches_from(["fusion-prune", "alice", "-c", "-o", "1.1", "1.2a"])
            .unwrap();
        assert!(matches.get_flag("collabs"));
        assert!(!matches.get_flag("backup"));
        let only: Vec<&String> = matches.get_many::<String>("only").unwrap().collect();
        assert_eq!(only, ["1.1", "1.2a"]);
    }
}

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use colored::*;

use procwatch::commands;
use procwatch::platform::elevation_hint;

fn pid_arg() -> Arg {
    Arg::new("pid")
        .value_name("PID")
        .help("Process id")
        .required(true)
        .value_parser(clap::value_parser!(u32))
}

fn top_arg(default: Option<&'static str>) -> Arg {
    let arg = Arg::new("top")
        .short('t')
        .long("top")
        .value_name("N")
        .help("Only show the N busiest processes")
        .value_parser(clap::value_parser!(usize));
    match default {
        Some(value) => arg.default_value(value),
        None => arg,
    }
}

fn cli() -> Command {
    Command::new("procwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and control running processes")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("list")
                .about("List running processes, busiest first")
                .arg(top_arg(None)),
        )
        .subcommand(
            Command::new("stats")
                .about("Show system-wide CPU, memory and process totals")
                .arg(
                    Arg::new("alerts")
                        .short('a')
                        .long("alerts")
                        .help("Also report threshold alerts")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("detail")
                .about("Show one process, including its owner")
                .arg(pid_arg()),
        )
        .subcommand(
            Command::new("kill")
                .about("Terminate a process")
                .arg(pid_arg())
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help("Do not ask for confirmation")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("priority")
                .about("Change the scheduling priority of a process")
                .arg(pid_arg())
                .arg(
                    Arg::new("level")
                        .value_name("LEVEL")
                        .help("idle, below-normal, normal, above-normal, high or realtime")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Live view refreshed in the background")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Refresh interval in milliseconds")
                        .default_value("2000")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(top_arg(Some("20"))),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    procwatch::init_logging();

    let matches = cli().get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    if let Some((name, _)) = matches.subcommand() {
        if name != "version" {
            if let Some(hint) = elevation_hint() {
                eprintln!("{}", hint.dimmed());
            }
        }
    }

    match matches.subcommand() {
        Some(("list", sub_matches)) => commands::list(sub_matches),
        Some(("stats", sub_matches)) => commands::stats(sub_matches),
        Some(("detail", sub_matches)) => commands::detail(sub_matches),
        Some(("kill", sub_matches)) => commands::kill(sub_matches),
        Some(("priority", sub_matches)) => commands::priority(sub_matches),
        Some(("watch", sub_matches)) => commands::watch(sub_matches),
        Some(("version", _)) => commands::version(),
        _ => {
            println!("Use 'procwatch --help' for more information.");
            Ok(())
        }
    }
}

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

pub fn build_cli() -> Command {
    Command::new("gc")
        .about("Run grammar correct events against a local data directory")
        .version(gc_core::VERSION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("data_dir")
                .long("data-dir")
                .help("Directory holding request records and artifacts (default: ~/.grammar-correct/data)")
                .action(ArgAction::Set)
                .global(true)
                .num_args(1),
        )
        .subcommand(
            Command::new("invoke")
                .about("Classify and dispatch an event read from a JSON file ('-' for stdin)")
                .arg(
                    Arg::new("event")
                        .help("Path to the event JSON")
                        .required(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("store_corrected_audio")
                        .long("store-corrected-audio")
                        .help("Write corrected artifacts on run events")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("ttl_secs")
                        .long("ttl-secs")
                        .help("Lifetime of new request records, in seconds")
                        .value_parser(value_parser!(u64))
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("put-artifact")
                .about("Store a corrected artifact for a request")
                .arg(Arg::new("email").required(true).num_args(1))
                .arg(Arg::new("request_id").required(true).num_args(1))
                .arg(
                    Arg::new("file")
                        .help("File whose content becomes the artifact")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Print the stored record of a request")
                .arg(Arg::new("email").required(true).num_args(1))
                .arg(Arg::new("request_id").required(true).num_args(1)),
        )
}

pub fn match_cli_input() -> ArgMatches {
    build_cli().get_matches()
}

use clap::{crate_authors, crate_description, crate_version, Arg, ArgAction, ArgMatches, Command};
use pretty_env_logger::env_logger::Builder;
use std::env;
use std::io::Write;
use std::process::exit;
use std::thread;
use std::time::Duration;

use crate::common::{ConfigSnafu, Result};
use crate::Config;

fn set_logger_level(b: &mut Builder) {
    let mut b = b;
    if env::var("RUST_LOG").is_err() {
        b = b.filter_level(log::LevelFilter::Info)
    }
    b.init();
}

fn setup_logger() {
    // Adapted from env_logger examples. <3 Systemd support
    match std::env::var("RUST_LOG_STYLE") {
        Ok(s) if s == "SYSTEMD" => {
            let builder = &mut pretty_env_logger::env_logger::builder();
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "<{}>{}: {}",
                    match record.level() {
                        log::Level::Error => 3,
                        log::Level::Warn => 4,
                        log::Level::Info => 6,
                        log::Level::Debug => 7,
                        log::Level::Trace => 7,
                    },
                    record.target(),
                    record.args()
                )
            });
            set_logger_level(builder);
        }
        _ => {
            let builder = &mut pretty_env_logger::formatted_builder();
            set_logger_level(builder);
        }
    };
}

fn challenge_args() -> Vec<Arg> {
    vec![
        Arg::new("domain")
            .long("domain")
            .help("Domain being validated (defaults to $CERTBOT_DOMAIN)"),
        Arg::new("validation")
            .long("validation")
            .help("Challenge value to publish (defaults to $CERTBOT_VALIDATION)"),
        Arg::new("ttl")
            .long("ttl")
            .value_parser(clap::value_parser!(u32))
            .help("TTL applied to every pushed record in the zone"),
    ]
}

/// The issuance tool exports the challenge through the environment when
/// it invokes a hook, so flags are optional when those variables exist.
fn challenge_from_args(args: &ArgMatches) -> Result<(String, String)> {
    let domain = args
        .get_one::<String>("domain")
        .cloned()
        .or_else(|| env::var("CERTBOT_DOMAIN").ok());
    let validation = args
        .get_one::<String>("validation")
        .cloned()
        .or_else(|| env::var("CERTBOT_VALIDATION").ok());

    match (domain, validation) {
        (Some(domain), Some(validation)) => Ok((domain, validation)),
        _ => ConfigSnafu {
            message: "A domain and a validation value are required, either as flags \
                      or through the CERTBOT_DOMAIN/CERTBOT_VALIDATION environment variables",
        }
        .fail(),
    }
}

fn run_perform(mut config: Config, args: &ArgMatches) -> i32 {
    if let Some(ttl) = args.get_one::<u32>("ttl") {
        config.ttl = *ttl;
    }
    let wait = args
        .get_one::<u64>("propagation-seconds")
        .copied()
        .unwrap_or(config.propagation_seconds);

    let (domain, validation) = match challenge_from_args(args) {
        Ok(challenge) => challenge,
        Err(err) => {
            println!("{err}");
            return 2;
        }
    };

    let mut authenticator = config.get_authenticator();
    if let Err(err) = authenticator.perform(&domain, &validation) {
        tracing::error!(domain = domain.as_str(), "{err}");
        return 1;
    }

    tracing::info!(
        domain = domain.as_str(),
        seconds = wait,
        "Waiting for DNS propagation"
    );
    thread::sleep(Duration::from_secs(wait));
    0
}

fn run_cleanup(mut config: Config, args: &ArgMatches) -> i32 {
    if let Some(ttl) = args.get_one::<u32>("ttl") {
        config.ttl = *ttl;
    }

    let (domain, validation) = match challenge_from_args(args) {
        Ok(challenge) => challenge,
        Err(err) => {
            println!("{err}");
            return 2;
        }
    };

    let mut authenticator = config.get_authenticator();
    if let Err(err) = authenticator.cleanup(&domain, &validation) {
        // A failed cleanup leaves a stale TXT record behind but must not
        // invalidate a certificate that was already issued.
        tracing::warn!(
            domain = domain.as_str(),
            "Cleanup failed, a stale validation record may remain: {err}"
        );
        return 1;
    }
    0
}

pub(crate) fn main() {
    let cli = Command::new("dns01-vimexx")
        .about(format!(
            "{}\n{} {}",
            crate_description!(),
            "Publishes and removes DNS-01 validation records through the Vimexx API.",
            "Intended to run as an authentication hook of a certificate-issuance tool.",
        ))
        .arg(
            Arg::new("credentials")
                .short('c')
                .long("credentials")
                .global(true)
                .help("Path to the Vimexx credentials file"),
        )
        .arg(
            Arg::new("check")
                .action(ArgAction::SetTrue)
                .short('t')
                .long("test")
                .help("Check the configuration"),
        )
        .subcommand(
            Command::new("perform")
                .about("Publish the validation TXT record and wait for propagation")
                .args(challenge_args())
                .arg(
                    Arg::new("propagation-seconds")
                        .long("propagation-seconds")
                        .value_parser(clap::value_parser!(u64))
                        .help("Seconds to wait for DNS propagation after the push"),
                ),
        )
        .subcommand(
            Command::new("cleanup")
                .about("Remove the validation TXT record")
                .args(challenge_args()),
        )
        .version(crate_version!())
        .author(crate_authors!("\n"));

    let args = cli.get_matches();

    setup_logger();

    let Some(credentials_path) = args.get_one::<String>("credentials") else {
        println!("The --credentials flag is required");
        exit(2);
    };

    let config = match Config::load(credentials_path) {
        Ok(config) => config,
        Err(err) => {
            println!("{err}");
            exit(2);
        }
    };

    if args.get_flag("check") {
        tracing::info!(
            ttl = config.ttl,
            propagation_seconds = config.propagation_seconds,
            "Configuration is valid."
        );
        exit(0);
    }

    let code = match args.subcommand() {
        Some(("perform", sub)) => run_perform(config, sub),
        Some(("cleanup", sub)) => run_cleanup(config, sub),
        _ => {
            println!("A subcommand is required: perform or cleanup");
            2
        }
    };
    exit(code);
}

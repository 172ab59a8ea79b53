use clap::{Arg, ArgAction, ArgGroup, Command};
use colored::*;
use std::process;
use std::time::Duration;

use erebus::{
    baseline::Baseline,
    config::{AddressSource, FileConfig, Protocol, ScanConfig},
    output::{self, OutputConfig, OutputFormat, OutputManager},
    ranges,
    scanner::ScanEngine,
};

fn print_banner() {
    println!("{}", r" _____ ____  _____ ____  _   _ ____  ".truecolor(148, 87, 235).bold());
    println!("{}", r"| ____|  _ \| ____| __ )| | | / ___| ".truecolor(148, 87, 235).bold());
    println!("{}", r"|  _| | |_) |  _| |  _ \| | | \___ \ ".truecolor(148, 87, 235).bold());
    println!("{}", r"| |___|  _ <| |___| |_) | |_| |___) |".truecolor(148, 87, 235).bold());
    println!("{}", r"|_____|_| \_\_____|____/ \___/|____/ ".truecolor(148, 87, 235).bold());
    println!();
    println!("{}", "Erebus – the darkness behind the cloud ⚡".truecolor(255, 215, 0).bold());
    println!();
    println!("{}", "---------------------------------------------".bright_blue());
    println!("{}", ": 🔗 `https://github.com/erebus-sec/erebus` :".bright_blue());
    println!("{}", ": ⚡ finds the origin the CDN is hiding     :".bright_blue());
    println!("{}", "---------------------------------------------".bright_blue());
    println!();
}

/// Print a fatal diagnostic and stop before anything is scanned
fn fatal(message: &str) -> ! {
    eprintln!("{} {}", "[!]".bright_red().bold(), message.bright_red());
    process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = Command::new("erebus")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Erebus: find the origin server hiding behind a CDN")
        .arg(
            Arg::new("domain")
                .value_name("DOMAIN")
                .help("Target domain behind the CDN")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("proto")
                .short('p')
                .long("proto")
                .value_name("PROTOCOL")
                .help("Protocol used by the site behind the CDN (http or https)"),
        )
        .arg(
            Arg::new("subnet")
                .short('s')
                .long("subnet")
                .value_name("CIDR")
                .help("CIDR block to scan (e.g. 203.0.113.0/24)"),
        )
        .arg(
            Arg::new("region")
                .short('r')
                .long("region")
                .value_name("REGION")
                .help("Scan the registry prefixes tagged with this region (e.g. eu-west-1)"),
        )
        .group(
            ArgGroup::new("source")
                .args(["subnet", "region"])
                .required(true),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Number of parallel probes")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("MS")
                .help("Per-probe timeout in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("max-addresses")
                .long("max-addresses")
                .value_name("N")
                .help("Refuse to expand a block into more addresses than this")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("registry-url")
                .long("registry-url")
                .value_name("URL")
                .help("Range registry document URL (with --region)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FORMAT")
                .help("Write a final report in this format (text, json)"),
        )
        .arg(
            Arg::new("output-file")
                .long("output-file")
                .value_name("FILE")
                .help("Write the final report to a file instead of stdout"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Load option defaults from a TOML file (default: ~/.erebus.toml)"),
        )
        .arg(
            Arg::new("no-banner")
                .long("no-banner")
                .help("Hide the banner")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if !matches.get_flag("no-banner") {
        print_banner();
    }

    // Defaults < config file < explicit flags.
    let file_config = match matches.get_one::<String>("config") {
        Some(path) => match FileConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => fatal(&e.to_string()),
        },
        None => FileConfig::load_default_config(),
    };

    let domain = matches
        .get_one::<String>("domain")
        .expect("domain is required")
        .clone();
    let source = if let Some(cidr) = matches.get_one::<String>("subnet") {
        AddressSource::Cidr(cidr.clone())
    } else if let Some(region) = matches.get_one::<String>("region") {
        AddressSource::Region(region.clone())
    } else {
        fatal("Either --subnet or --region is required");
    };

    let mut config = file_config.apply(ScanConfig::new(domain, source));

    if let Some(proto) = matches.get_one::<String>("proto") {
        match proto.parse::<Protocol>() {
            Ok(protocol) => config.protocol = protocol,
            Err(e) => fatal(&e),
        }
    }
    if let Some(&jobs) = matches.get_one::<usize>("jobs") {
        config.jobs = jobs;
    }
    if let Some(&timeout) = matches.get_one::<u64>("timeout") {
        config.timeout = timeout;
    }
    if let Some(&max_addresses) = matches.get_one::<usize>("max-addresses") {
        config.max_addresses = max_addresses;
    }
    if let Some(url) = matches.get_one::<String>("registry-url") {
        config.registry_url = url.clone();
    }

    if let Err(e) = config.validate() {
        fatal(&e.to_string());
    }

    output::print_status("Analyzing Domain:", &config.domain);

    // Baseline capture happens-before any probe starts; failure here means
    // there is nothing to compare against.
    let baseline =
        match Baseline::capture(config.protocol, &config.domain, config.timeout_duration()).await {
            Ok(baseline) => baseline,
            Err(e) => fatal(&e.to_string()),
        };

    match &baseline.fingerprint.title {
        Some(title) => output::print_status("Baseline title:", title),
        None => output::print_status(
            "Baseline body length:",
            &format!("{} bytes", baseline.fingerprint.body_len),
        ),
    }

    let addresses = match &config.source {
        AddressSource::Cidr(cidr) => match ranges::expand_cidr(cidr, config.max_addresses) {
            Ok(addresses) => addresses,
            Err(e) => fatal(&e.to_string()),
        },
        AddressSource::Region(region) => {
            // The registry document runs to several megabytes; do not let
            // the per-probe timeout bound its download.
            let registry_timeout = config.timeout_duration().max(Duration::from_secs(30));
            match ranges::registry::region_addresses(
                &config.registry_url,
                region,
                config.max_addresses,
                registry_timeout,
            )
            .await
            {
                Ok(addresses) => addresses,
                Err(e) => fatal(&e.to_string()),
            }
        }
    };

    output::print_status("Number of IPs to scan:", &addresses.len().to_string());

    let engine = match ScanEngine::new(config.clone(), baseline) {
        Ok(engine) => engine,
        Err(e) => fatal(&e.to_string()),
    };

    let report = match engine.scan(addresses).await {
        Ok(report) => report,
        Err(e) => fatal(&e.to_string()),
    };

    output::print_summary(&report);

    // A report is only written out when explicitly requested.
    let format = matches.get_one::<String>("output");
    let file = matches.get_one::<String>("output-file");
    if format.is_some() || file.is_some() {
        let format = match format.map(|f| f.parse::<OutputFormat>()).transpose() {
            Ok(format) => format.unwrap_or(OutputFormat::Text),
            Err(e) => fatal(&e),
        };
        let manager = OutputManager::new(OutputConfig {
            format,
            file: file.cloned(),
        });
        manager.write_report(&report)?;
    }

    Ok(())
}

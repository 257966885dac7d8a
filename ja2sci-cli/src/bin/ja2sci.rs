use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use ja2sci::{Ja2SciError, NameMapping, RedirectMode, ResolverConfig, Translator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("ja2sci")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate a Japanese name into its scientific name")
        .arg(
            Arg::new("name")
                .help("Japanese name to translate (matched exactly as given)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .help("Log lookup diagnostics (page found, body, redirects, matched field) to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .help("Only consult the offline dictionary")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("blocking")
                .long("blocking")
                .help("Use the blocking HTTP client instead of the async one")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Exit with status 1 when no scientific name is found")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dictionary")
                .long("dictionary")
                .value_name("PATH")
                .help("Dictionary JSON file (default: $JA2SCI_DICTIONARY or the bundled one)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .value_name("URL")
                .help("MediaWiki api.php endpoint"),
        )
        .arg(
            Arg::new("redirect-mode")
                .long("redirect-mode")
                .value_name("MODE")
                .help("Follow redirects on the server or client")
                .value_parser(["server", "client"]),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("Per-request timeout in seconds, 0 disables it")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("max-redirects")
                .long("max-redirects")
                .value_name("N")
                .help("Maximum redirect hops to follow")
                .value_parser(value_parser!(usize)),
        )
}

fn init_tracing(debug: bool) {
    let default_directives = if debug { "warn,ja2sci=info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_mapping(matches: &ArgMatches) -> ja2sci::Result<NameMapping> {
    let path = matches
        .get_one::<PathBuf>("dictionary")
        .cloned()
        .or_else(|| std::env::var_os("JA2SCI_DICTIONARY").map(PathBuf::from));
    match path {
        Some(path) => NameMapping::from_file(&path),
        None => NameMapping::bundled(),
    }
}

fn resolver_config(matches: &ArgMatches) -> ja2sci::Result<ResolverConfig> {
    let mut config = ResolverConfig::from_env()?;
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config = config.with_endpoint(endpoint.as_str());
    }
    if let Some(mode) = matches.get_one::<String>("redirect-mode") {
        config = config.with_redirect_mode(mode.parse::<RedirectMode>()?);
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config = config.with_timeout((*secs > 0).then(|| Duration::from_secs(*secs)));
    }
    if let Some(hops) = matches.get_one::<usize>("max-redirects") {
        config = config.with_max_redirects(*hops);
    }
    config.validate()?;
    Ok(config)
}

fn run(matches: &ArgMatches, debug: bool) -> ja2sci::Result<Option<String>> {
    let name = matches
        .get_one::<String>("name")
        .ok_or_else(|| Ja2SciError::Config("missing NAME argument".to_string()))?;

    // The dictionary is required even for online lookups
    let mapping = load_mapping(matches)?;

    if matches.get_flag("offline") {
        return Ok(mapping.lookup(name).map(str::to_string));
    }

    let config = resolver_config(matches)?;

    if matches.get_flag("blocking") {
        return Translator::with_blocking_wikipedia(mapping, config)?.translate(name, debug);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Ja2SciError::Config(format!("Failed to start async runtime: {}", e)))?;
    runtime.block_on(async {
        Translator::with_wikipedia(mapping, config)?
            .translate_async(name, debug)
            .await
    })
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    let debug = matches.get_flag("debug");
    init_tracing(debug);

    match run(&matches, debug) {
        Ok(Some(scientific_name)) => {
            println!("{}", scientific_name);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("None");
            if matches.get_flag("strict") {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("ja2sci: {}", e);
            ExitCode::from(2)
        }
    }
}

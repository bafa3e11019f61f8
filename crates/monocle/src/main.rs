use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use monocle::http::{build_router, AppState};
use monocle::{BundleKey, MonocleService, RootConfig, RootError, RootResult};
use monocle_jwe::{key::public_key_from_pem, seal, SealOptions};

/// Exit status of `check` when the session is anonymized.
const EXIT_ANONYMIZED: i32 = 2;

/// Monocle: threat-bundle verification
///
/// Opens encrypted session bundles and decides whether the session is
/// anonymized.
#[derive(Parser, Debug)]
#[command(name = "monocle", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Verify one bundle and print the verdict as JSON
    Check {
        /// Client address the bundle is checked against
        #[arg(long)]
        ip: String,

        /// File holding the bundle; stdin when omitted
        #[arg(long)]
        bundle: Option<PathBuf>,
    },

    /// Generate a new P-256 private key
    Keygen {
        /// Destination for the PKCS#8 PEM private key
        #[arg(long)]
        out: PathBuf,
    },

    /// Encrypt a JSON payload into a bundle
    Seal {
        /// Recipient public key (SPKI PEM)
        #[arg(long)]
        public_key: PathBuf,

        /// File holding the JSON payload; stdin when omitted
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Compress the payload with DEFLATE
        #[arg(long)]
        deflate: bool,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("monocle=debug,monocle_jwe=debug,monocle_eval=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("monocle=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> RootResult<RootConfig> {
    let config = match path {
        Some(p) => RootConfig::load(p)?,
        None => {
            let default_path = RootConfig::default_config_path();
            RootConfig::load(&default_path)?
        }
    };
    let config = config.apply_env();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> RootResult<i32> {
    match cli.command {
        Commands::Serve { bind, port } => cmd_serve(cli.config.as_ref(), bind, port).await,
        Commands::Check { ip, bundle } => cmd_check(cli.config.as_ref(), &ip, bundle.as_deref()),
        Commands::Keygen { out } => cmd_keygen(&out),
        Commands::Seal {
            public_key,
            payload,
            deflate,
        } => cmd_seal(&public_key, payload.as_deref(), deflate),
    }
}

async fn cmd_serve(
    config_path: Option<&PathBuf>,
    bind: Option<String>,
    port: Option<u16>,
) -> RootResult<i32> {
    let mut config = load_config(config_path)?;
    if let Some(bind) = bind {
        config.http.bind = bind;
    }
    if let Some(port) = port {
        config.http.port = port;
    }
    let addr = config.http.socket_addr()?;

    let service = MonocleService::from_config(&config)?;
    let state = Arc::new(AppState {
        service,
        trust_forwarded_for: config.http.trust_forwarded_for,
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        addr = %addr,
        trust_forwarded_for = config.http.trust_forwarded_for,
        "monocle HTTP server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(0)
}

fn cmd_check(config_path: Option<&PathBuf>, ip: &str, bundle: Option<&Path>) -> RootResult<i32> {
    let config = load_config(config_path)?;
    let service = MonocleService::from_config(&config)?;

    let bundle = read_input(bundle)?;
    let result = service.verify_anon_mode(bundle.trim(), ip)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(if result.is_anonymized() {
        EXIT_ANONYMIZED
    } else {
        0
    })
}

fn cmd_keygen(out: &Path) -> RootResult<i32> {
    let key = BundleKey::generate();
    let pem = key.to_pkcs8_pem()?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(out).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => {
            RootError::Validation(format!("{} already exists, refusing to overwrite", out.display()))
        }
        _ => RootError::Io(e),
    })?;
    file.write_all(pem.as_bytes())?;

    info!(key_id = %key.key_id(), path = %out.display(), "generated private key");
    println!("Private key written to {}", out.display());
    println!("Key id: {}", key.key_id());
    print!("{}", key.public_key_pem()?);
    Ok(0)
}

fn cmd_seal(public_key: &Path, payload: Option<&Path>, deflate: bool) -> RootResult<i32> {
    let pem = std::fs::read_to_string(public_key)?;
    let recipient = public_key_from_pem(&pem)?;

    let payload = read_input(payload)?;
    // Collector payloads are always JSON objects.
    let value: serde_json::Value = serde_json::from_str(&payload)?;
    if !value.is_object() {
        return Err(RootError::Validation("payload must be a JSON object".into()));
    }
    let plaintext = serde_json::to_vec(&value)?;

    let options = SealOptions {
        deflate,
        ..SealOptions::default()
    };
    println!("{}", seal(&plaintext, &recipient, &options)?);
    Ok(0)
}

fn read_input(path: Option<&Path>) -> RootResult<String> {
    match path {
        Some(p) => Ok(std::fs::read_to_string(p)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

//! Runs the front end, the back end, or both, over one shared store.
//!
//! ```text
//! TESSERA_SECRET=change-me two-services --user ada:lovelace
//! curl -c jar -H 'content-type: application/json' \
//!      -d '{"username":"ada","password":"lovelace"}' localhost:3000/login
//! curl -b jar localhost:3000/
//! ```
//!
//! Running the roles as separate processes needs a store both can reach,
//! e.g. `--store file:/tmp/tessera-sessions`.

use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tessera::prelude::*;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};

type Services = JoinSet<Result<(), TesseraError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    Both,
    Frontend,
    Backend,
}

#[derive(Debug, Parser)]
#[command(version, about = "Signed session propagation demo")]
struct Args {
    /// Which service(s) this process runs.
    #[arg(long, value_enum, default_value_t = Role::Both)]
    role: Role,

    /// Secret both services sign and verify session ids with.
    #[arg(long, env = "TESSERA_SECRET", hide_env_values = true)]
    secret: String,

    #[arg(long, env = "TESSERA_COOKIE_NAME", default_value = "connect.sid")]
    cookie_name: String,

    /// `memory` or `file:<dir>`.
    #[arg(long, env = "TESSERA_STORE", default_value = "memory")]
    store: StoreTarget,

    /// Idle lifetime of a session, in seconds.
    #[arg(long, env = "TESSERA_TTL_SECS", default_value_t = 300)]
    ttl_secs: u64,

    #[arg(long, env = "TESSERA_FRONTEND_ADDR", default_value = "127.0.0.1:3000")]
    frontend_addr: String,

    #[arg(long, env = "TESSERA_BACKEND_ADDR", default_value = "127.0.0.1:3001")]
    backend_addr: String,

    /// Where the front end reaches the back end.
    #[arg(long, env = "TESSERA_BACKEND_URL", default_value = "http://127.0.0.1:3001")]
    backend_url: String,

    #[arg(long, env = "TESSERA_UPSTREAM_TIMEOUT_MS", default_value_t = 5000)]
    upstream_timeout_ms: u64,

    /// A login the front end accepts, as `name:password`. Repeatable.
    #[arg(long = "user", value_parser = parse_user)]
    users: Vec<(String, String)>,
}

impl Args {
    fn config(&self) -> TesseraConfig {
        TesseraConfig::new(self.secret.clone())
            .cookie_name(self.cookie_name.clone())
            .ttl(Duration::from_secs(self.ttl_secs))
            .store(self.store.clone())
            .frontend_addr(self.frontend_addr.clone())
            .backend_addr(self.backend_addr.clone())
            .backend_url(self.backend_url.clone())
            .upstream_timeout(Duration::from_millis(self.upstream_timeout_ms))
    }

    fn authenticator(&self) -> StaticAuthenticator {
        self.users
            .iter()
            .fold(StaticAuthenticator::new(), |auth, (name, password)| {
                auth.with_user(name.clone(), password.clone())
            })
    }
}

fn parse_user(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((name, password)) if !name.is_empty() => {
            Ok((name.to_string(), password.to_string()))
        }
        _ => Err(format!("expected name:password, got {s:?}")),
    }
}

fn outcome(joined: Result<Result<(), TesseraError>, JoinError>) -> Result<(), Box<dyn Error>> {
    Ok(joined??)
}

/// Runs until `shutdown` resolves or any service exits on its own,
/// whichever comes first, then stops the rest and waits for them.
///
/// A service exiting before shutdown was asked for is an error even if it
/// returned `Ok`.
async fn supervise(
    mut services: Services,
    shutdown: impl Future<Output = std::io::Result<()>>,
    stop: watch::Sender<bool>,
) -> Result<(), Box<dyn Error>> {
    let early = tokio::select! {
        signal = shutdown => {
            signal?;
            tracing::info!("shutting down");
            None
        }
        Some(joined) = services.join_next() => Some(joined),
    };

    let mut result = match early {
        Some(joined) => {
            let result = outcome(joined);
            match &result {
                Err(e) => tracing::error!(error = %e, "service failed; stopping the rest"),
                Ok(()) => tracing::error!("service exited unexpectedly; stopping the rest"),
            }
            result.and_then(|()| Err("service exited before shutdown".into()))
        }
        None => Ok(()),
    };

    let _ = stop.send(true);
    while let Some(joined) = services.join_next().await {
        let finished = outcome(joined);
        if result.is_ok() {
            result = finished;
        }
    }
    result
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let args = Args::parse();
    let config = Arc::new(args.config());
    config.validate()?;

    if args.role != Role::Both && config.store == StoreTarget::Memory {
        tracing::warn!(
            role = ?args.role,
            "memory store is private to this process; the other service won't see its sessions"
        );
    }
    let auth = args.authenticator();
    if args.role != Role::Backend && auth.is_empty() {
        tracing::warn!("no --user given; every login will be rejected");
    }

    let store = config.open_store().await?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let stopped = move || {
        let mut rx = stop_rx.clone();
        async move {
            let _ = rx.wait_for(|stop| *stop).await;
        }
    };

    let mut services = Services::new();
    if args.role != Role::Frontend {
        let backend = Service::backend(Arc::clone(&config), Arc::clone(&store)).await?;
        services.spawn(backend.run_with_shutdown(stopped()));
    }
    if args.role != Role::Backend {
        let frontend = Service::frontend(Arc::clone(&config), store, auth).await?;
        services.spawn(frontend.run_with_shutdown(stopped()));
    }

    supervise(services, tokio::signal::ctrl_c(), stop_tx).await
}

//! `l3flow run`: drive the reactive loop until Ctrl-C.

use tokio_util::sync::CancellationToken;
use tracing::info;

use l3flow_core::{ReactiveConfig, ReactiveLoop};

use crate::cli::RunArgs;
use crate::config::Resolved;
use crate::error::CliError;

pub async fn handle(args: RunArgs, resolved: Resolved) -> Result<(), CliError> {
    let reactive = apply_run_args(resolved.reactive, &args);
    let client = l3flow_core::connect(&resolved.controller)?;
    let mut reactive_loop = ReactiveLoop::new(client, reactive)?;

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            stopper.cancel();
        }
    });

    info!(controller = %resolved.controller.url, "starting reactive loop");
    let stats = reactive_loop.run(&cancel).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{stats}");
    }
    Ok(())
}

fn apply_run_args(mut reactive: ReactiveConfig, args: &RunArgs) -> ReactiveConfig {
    if let Some(fallback) = args.fallback {
        reactive.fallback = fallback.into();
    }
    if let Some(ip) = args.controller_ip {
        reactive.controller_ip = Some(ip);
    }
    if let Some(n) = args.refresh_every {
        reactive.refresh_every = n;
    }
    reactive
}

//! `l3flow clear`: one-shot removal of flow rules.

use l3flow_core::{ControllerClient, DeviceId, clear_devices};

use crate::cli::ClearArgs;
use crate::config::Resolved;
use crate::error::CliError;

pub async fn handle(args: ClearArgs, resolved: &Resolved) -> Result<(), CliError> {
    let client = l3flow_core::connect(&resolved.controller)?;

    let devices: Vec<DeviceId> = if args.devices.is_empty() {
        ControllerClient::list_devices(&client)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect()
    } else {
        args.devices.into_iter().map(DeviceId::from).collect()
    };

    if devices.is_empty() {
        println!("no devices to clear");
        return Ok(());
    }

    let report = clear_devices(&client, &devices).await;
    for id in &report.cleared {
        println!("cleared {id}");
    }

    if report.is_complete() {
        return Ok(());
    }

    let devices = report
        .failed
        .iter()
        .map(|(id, err)| format!("{id} ({err})"))
        .collect::<Vec<_>>()
        .join(", ");
    Err(CliError::PartialClear {
        failed: report.failed.len(),
        attempted: report.attempted(),
        devices,
    })
}

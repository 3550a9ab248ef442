use std::{
    io::{self, BufWriter, Write},
    sync::Arc,
};

use anyhow::{Context, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use slotflake::{
    CoordinationStore, FileStore, KeySpace, LeaseKeeper, SlotCoordinator, SlotflakeId, SystemClock,
};
use tokio::{signal, task};

use super::config::{CliConfig, Command};

type Coordinator = SlotCoordinator<FileStore, SystemClock>;

pub async fn run(config: CliConfig) -> anyhow::Result<()> {
    match config.command {
        Command::Mint { count } => mint(&config, count),
        Command::Decode { id } => decode(&config, id),
        Command::Leases => leases(&config),
        Command::Hold => hold(&config).await,
    }
}

fn open_store(config: &CliConfig) -> anyhow::Result<FileStore> {
    FileStore::open(config.store_dir.clone()).with_context(|| {
        format!(
            "failed to open lease store at {}",
            config.store_dir.display()
        )
    })
}

fn coordinator(config: &CliConfig) -> anyhow::Result<Coordinator> {
    Ok(SlotCoordinator::new(
        open_store(config)?,
        config.coordinator.clone(),
        SystemClock,
    )?)
}

fn mint(config: &CliConfig, count: u64) -> anyhow::Result<()> {
    let coordinator = coordinator(config)?;
    let slot = coordinator
        .acquire_slot()
        .context("failed to lease a slot")?;
    tracing::info!(%slot, count, "minting IDs");

    let minted = write_ids(&coordinator, count, &mut BufWriter::new(io::stdout().lock()));
    if let Err(e) = coordinator.release_slot() {
        tracing::warn!(%slot, error = %e, "failed to release slot");
    }
    minted
}

fn write_ids(coordinator: &Coordinator, count: u64, out: &mut impl Write) -> anyhow::Result<()> {
    for _ in 0..count {
        writeln!(out, "{}", coordinator.next_id()?)?;
    }
    out.flush()?;
    Ok(())
}

fn decode(config: &CliConfig, raw: u64) -> anyhow::Result<()> {
    let text = describe(raw, config.coordinator.epoch_millis)?;
    io::stdout().lock().write_all(text.as_bytes())?;
    Ok(())
}

fn describe(raw: u64, epoch_millis: u64) -> anyhow::Result<String> {
    let id = SlotflakeId::from_raw(raw);
    if !id.is_valid() {
        bail!("{raw} has the reserved top bit set and was not minted by slotflake");
    }
    let generated = id.generation_time(epoch_millis);
    let when = i64::try_from(generated)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(
            || "out of range".to_owned(),
            |t| t.to_rfc3339_opts(SecondsFormat::Millis, true),
        );

    Ok(format!(
        "id:           {id}\n\
         generated:    {when} ({generated} ms)\n\
         timestamp:    {} ms after epoch {epoch_millis}\n\
         datacenter:   {}\n\
         worker:       {}\n\
         sequence:     {}\n",
        id.timestamp(),
        id.datacenter_id(),
        id.worker_id(),
        id.sequence(),
    ))
}

fn leases(config: &CliConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let listed = write_leases(
        &store,
        &config.coordinator.key_space(),
        &mut BufWriter::new(io::stdout().lock()),
    )?;
    tracing::info!(leases = listed, dir = %store.dir().display(), "listed leases");
    Ok(())
}

fn write_leases(
    store: &impl CoordinationStore,
    keys: &KeySpace,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let mut listed = 0;
    for key in store.list_keys(&keys.scan_prefix())? {
        // May have expired since it was listed.
        let Some(value) = store.get(&key)? else {
            continue;
        };
        writeln!(out, "{key}\t{value}")?;
        listed += 1;
    }
    out.flush()?;
    Ok(listed)
}

async fn hold(config: &CliConfig) -> anyhow::Result<()> {
    let coordinator = Arc::new(coordinator(config)?);

    // Acquisition sleeps between retries.
    let slot = task::spawn_blocking({
        let coordinator = Arc::clone(&coordinator);
        move || coordinator.acquire_slot()
    })
    .await?
    .context("failed to lease a slot")?;
    coordinator
        .verify_lease()
        .context("lease was overwritten right after acquisition")?;

    let keeper = LeaseKeeper::spawn(Arc::clone(&coordinator))
        .context("failed to start lease renewal")?;
    writeln!(io::stdout().lock(), "{slot}")?;
    tracing::info!(
        %slot,
        schedule = %coordinator.schedule(),
        "holding slot, press Ctrl+C to release"
    );

    shutdown_signal().await?;

    task::spawn_blocking(move || keeper.stop()).await?;
    let released = coordinator
        .release_slot()
        .context("failed to release slot")?;
    tracing::info!(%slot, released, "shut down");
    Ok(())
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())?
            .recv()
            .await;
        Ok::<_, io::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<io::Result<()>>();

    tokio::select! {
        res = signal::ctrl_c() => {
            res.context("failed to install Ctrl+C handler")?;
            tracing::info!("Received Ctrl+C signal");
        },
        res = terminate => {
            res.context("failed to install SIGTERM handler")?;
            tracing::info!("Received SIGTERM signal");
        },
    }
    Ok(())
}

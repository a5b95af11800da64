use crate::config::{AppConfig, Command};
use anyhow::{Context, bail};
use nodeflake::{
    DecodedId, IdGenerator, IdentitySource, NodeIdentity, SystemClock, identity::worker_id,
};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct DecodeReport {
    id: i64,
    #[serde(flatten)]
    fields: DecodedId,
    unix_millis: i64,
}

pub fn run(config: &AppConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match &config.command {
        Command::Next { count } => next(config, *count, out),
        Command::Decode { ids } => decode(config, ids, out),
        Command::Identity => identity(config, out),
    }
}

fn next(config: &AppConfig, count: usize, out: &mut impl Write) -> anyhow::Result<()> {
    let identity = resolve_identity(config);
    let generator = IdGenerator::new(config.generator, identity, SystemClock)
        .context("failed to build the ID generator")?;

    tracing::info!(
        datacenter_id = generator.identity().datacenter_id,
        worker_id = generator.identity().worker_id,
        count,
        "generating IDs"
    );

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(generator.next_id().context("failed to generate an ID")?);
    }

    if config.json {
        serde_json::to_writer(&mut *out, &ids)?;
        writeln!(out)?;
    } else {
        for id in ids {
            writeln!(out, "{id}")?;
        }
    }
    Ok(())
}

fn decode(config: &AppConfig, ids: &[i64], out: &mut impl Write) -> anyhow::Result<()> {
    let layout = config.generator.layout;
    let epoch = config.generator.epoch;

    let mut reports = Vec::with_capacity(ids.len());
    for &id in ids {
        if id < 0 {
            bail!("{id} is not a valid ID: the sign bit is always clear");
        }
        let fields = layout.decode(id);
        reports.push(DecodeReport {
            id,
            fields,
            unix_millis: fields.unix_millis(epoch),
        });
    }

    if config.json {
        serde_json::to_writer(&mut *out, &reports)?;
        writeln!(out)?;
    } else {
        for report in reports {
            writeln!(
                out,
                "{} {} unix_millis={}",
                report.id, report.fields, report.unix_millis
            )?;
        }
    }
    Ok(())
}

fn identity(config: &AppConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let identity = resolve_identity(config);

    if config.json {
        serde_json::to_writer(&mut *out, &identity)?;
        writeln!(out)?;
    } else {
        let source = match &identity.source {
            IdentitySource::HardwareAddress { interface } => format!("hardware-address({interface})"),
            IdentitySource::Fallback => "fallback".to_owned(),
            IdentitySource::Configured => "configured".to_owned(),
        };
        writeln!(
            out,
            "datacenter_id={} worker_id={} source={source}",
            identity.datacenter_id, identity.worker_id
        )?;
    }
    Ok(())
}

/// Applies any pinned IDs on top of the host-derived identity.
///
/// A pinned datacenter ID still feeds the worker ID hash, so pinning only the
/// datacenter keeps processes on one host apart.
fn resolve_identity(config: &AppConfig) -> NodeIdentity {
    let layout = &config.generator.layout;

    let identity = match (config.datacenter_id, config.worker_id) {
        (Some(datacenter_id), Some(worker_id)) => NodeIdentity::fixed(datacenter_id, worker_id),
        (Some(datacenter_id), None) => NodeIdentity::fixed(
            datacenter_id,
            worker_id(datacenter_id, std::process::id(), layout.max_worker_id()),
        ),
        (None, pinned_worker) => {
            let mut identity = NodeIdentity::resolve(layout);
            if let Some(worker_id) = pinned_worker {
                identity.worker_id = worker_id;
            }
            identity
        }
    };

    if identity.is_fallback() {
        tracing::warn!(
            datacenter_id = identity.datacenter_id,
            "no usable network interface found; instances sharing this fallback datacenter ID \
             rely on the process id alone to keep their IDs apart"
        );
    }
    identity
}

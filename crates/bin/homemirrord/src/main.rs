//! # homemirrord: homemirror daemon
//!
//! Composition root that wires the mirror engine to its subscribers and the
//! wire adapter, then replays a recorded session through it.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialise logging
//! - Construct the mirror, the capability bridge, the room aggregator and
//!   the card board, and subscribe them
//! - Declare the configured bindings against logging targets
//! - Feed each session line through the wire session driver
//! - Print outbound wire lines to stdout
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod targets;

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use homemirror_adapter_wire_json::{ChannelSink, Session};
use homemirror_app::bridge::ObjectBridge;
use homemirror_app::capability::target_for;
use homemirror_app::mirror::{DeviceMirror, SharedMirror};
use homemirror_app::subscribers::{CardBoard, RoomAggregator};

use crate::config::Config;
use crate::targets::LoggingTarget;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Outbound lines
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = ChannelSink::new(tx.clone());

    // Subscribers
    let bridge = Arc::new(ObjectBridge::new(sink.clone()));
    for spec in config.binding_specs()? {
        let target = target_for(
            &Arc::new(LoggingTarget::new(spec.name.clone())),
            &spec.capabilities,
        );
        bridge.bind(spec.name, target)?;
    }
    let rooms = Arc::new(RoomAggregator::new());
    let cards = Arc::new(CardBoard::new());

    // Engine
    let mirror = DeviceMirror::new(sink).with_snapshot_mode(config.snapshot_mode());
    let _subscriptions = [
        mirror.subscribe(bridge.clone()),
        mirror.subscribe(rooms.clone()),
        mirror.subscribe(cards.clone()),
    ];
    let mirror = SharedMirror::new(mirror);
    let session = Session::new(mirror.clone(), tx, config.credentials());

    let reader: Box<dyn AsyncBufRead + Unpin> = if config.reads_stdin() {
        Box::new(BufReader::new(tokio::io::stdin()))
    } else {
        Box::new(BufReader::new(
            tokio::fs::File::open(&config.session.path).await?,
        ))
    };
    tracing::info!(
        session = %config.session.path,
        bindings = config.bindings.len(),
        "replaying session"
    );

    let mut lines = reader.lines();
    let mut handled = 0usize;
    let mut rejected = 0usize;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match session.handle_line(&line) {
            Ok(outcome) => {
                handled += 1;
                tracing::debug!(?outcome, "line handled");
            }
            Err(err) => {
                rejected += 1;
                tracing::warn!(error = %err, "line rejected");
            }
        }
        while let Ok(wire) = rx.try_recv() {
            println!("{wire}");
        }
    }

    let (devices, room_labels, active) = mirror.with(|mirror| {
        (
            mirror.get_all_devices().len(),
            mirror.rooms(),
            mirror.active_count(),
        )
    });
    let lit = rooms
        .rooms()
        .iter()
        .filter(|room| room.lighting.lit)
        .count();
    let resolution = bridge.last_resolution();
    tracing::info!(
        handled,
        rejected,
        devices,
        rooms = ?room_labels,
        active,
        lit_rooms = lit,
        cards = cards.cards().len(),
        armed = resolution.armed.len(),
        inert = resolution.inert.len(),
        "session replay finished"
    );

    Ok(())
}

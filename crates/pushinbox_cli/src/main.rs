//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `pushinbox_core` linkage and drive one inbox session end to end.
//! - Keep output readable for quick local sanity checks.
//!
//! Usage: `pushinbox_cli [db_path]`. Without a path the session is in-memory.

use pushinbox_core::{
    ChannelPayload, InboxService, MemoryGateway, NotificationRecord, PersistenceGateway,
    SimulationPreset, SqliteGateway, StoreConfig,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("pushinbox_core ping={}", pushinbox_core::ping());
    println!("pushinbox_core version={}", pushinbox_core::core_version());

    let gateway: Box<dyn PersistenceGateway> = match std::env::args().nth(1) {
        Some(path) => match SqliteGateway::open(&path) {
            Ok(gateway) => Box::new(gateway),
            Err(err) => {
                eprintln!("failed to open {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(MemoryGateway::new()),
    };

    let mut inbox = match InboxService::start(gateway, StoreConfig::default(), None) {
        Ok(inbox) => inbox,
        Err(err) => {
            eprintln!("failed to start inbox: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("restored={} badge={}", inbox.records().len(), inbox.badge_count());

    for preset in [
        SimulationPreset::Text,
        SimulationPreset::Voice,
        SimulationPreset::Video,
    ] {
        inbox.simulate(preset);
    }

    let event = r#"{"title":"Server notice","body":"Maintenance at midnight"}"#;
    match ChannelPayload::event_from_json(event) {
        Ok(payload) => {
            if let Some(alert) = inbox.deliver(payload).and_then(|ingested| ingested.alert) {
                println!("alert: {} / {}", alert.title, alert.body);
            }
        }
        Err(err) => eprintln!("event payload rejected: {err}"),
    }

    print_inbox(inbox.records(), inbox.badge_count());

    if let Some(id) = inbox.dismiss_latest() {
        println!("dismissed banner id={id} badge={}", inbox.badge_count());
    }
    inbox.mark_all_read();
    println!("after mark_all_read badge={}", inbox.badge_count());

    inbox.shutdown();
    ExitCode::SUCCESS
}

fn print_inbox(records: &[NotificationRecord], badge: usize) {
    println!("inbox len={} badge={badge}", records.len());
    for record in records {
        println!(
            "  [{}] {} {} | {} ({})",
            if record.is_read() { "x" } else { " " },
            record.id(),
            record.kind().as_str(),
            record.title(),
            record.timestamp()
        );
    }
}

//! Terminal progress output.
//!
//! Consumes delivery events and renders them on stdout. Progress updates
//! redraw a single line in place; everything else gets its own line. Logs
//! go to stderr, so the progress line stays intact.

use std::io::Write;

use mailpack_delivery::DeliveryEvent;
use tokio::sync::mpsc;

/// Prints events until the channel closes.
pub async fn print_events(mut events: mpsc::Receiver<DeliveryEvent>) {
    let mut line_open = false;
    while let Some(event) = events.recv().await {
        match event {
            DeliveryEvent::FileStarted {
                file_name,
                total_bytes,
                estimated_messages,
            } => {
                finish_line(&mut line_open);
                println!(
                    "sending {file_name} ({}, about {estimated_messages} {})",
                    human_bytes(total_bytes),
                    plural(estimated_messages, "message")
                );
            }
            DeliveryEvent::Progress {
                total_bytes,
                sent_bytes,
                status,
            } => {
                let percent = if total_bytes == 0 {
                    100
                } else {
                    sent_bytes * 100 / total_bytes
                };
                print!(
                    "\r{status}  {} / {} ({percent}%)    ",
                    human_bytes(sent_bytes),
                    human_bytes(total_bytes)
                );
                let _ = std::io::stdout().flush();
                line_open = true;
            }
            DeliveryEvent::MessageDelivered { .. } => {}
            DeliveryEvent::AttemptFailed {
                subject,
                attempt,
                max_attempts,
                error,
            } => {
                finish_line(&mut line_open);
                println!("attempt {attempt}/{max_attempts} failed for {subject}: {error}");
            }
            DeliveryEvent::FileCompleted { file_name, messages } => {
                finish_line(&mut line_open);
                println!(
                    "{file_name}: delivered in {messages} {}",
                    plural(u64::from(messages), "message")
                );
            }
            DeliveryEvent::FileFailed { file_name, error } => {
                finish_line(&mut line_open);
                println!("{file_name}: failed: {error}");
            }
        }
    }
    finish_line(&mut line_open);
}

fn finish_line(line_open: &mut bool) {
    if *line_open {
        println!();
        *line_open = false;
    }
}

fn plural(count: u64, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

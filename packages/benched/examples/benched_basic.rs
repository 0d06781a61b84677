//! Simulated render loop demonstrating the key `benched` types working together.
//!
//! This example shows how to:
//! - time nested phases of each frame with `Session::benchmark()`
//! - attach custom metrics to frames
//! - track activities that take several frames to complete
//! - print a phase summary and export the report tables as CSV files
//!
//! Run with: `cargo run --example benched_basic`.
#![expect(
    clippy::arithmetic_side_effects,
    clippy::cast_precision_loss,
    reason = "this is example code that does not need production-level safety"
)]

use std::env;
use std::hint::black_box;

use benched::{ReportOptions, Session};

const FRAME_COUNT: u64 = 300;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut session = Session::new("benched_basic");

    for frame in 0..FRAME_COUNT {
        session.start_frame(frame);

        session.benchmark("update", |_| simulate_work(2_000));

        session.benchmark("render", |session| {
            session.benchmark("shadows", |_| simulate_work(1_000));
            session.benchmark("geometry", |_| simulate_work(3_000));
        });

        // Every 50 frames the user opens a menu that takes 7 frames to appear.
        if frame % 50 == 0 {
            session.start_activity("open_menu", format!("menu-{frame}"));
        }

        if frame % 50 == 7 {
            session.complete_activity(&format!("menu-{}", frame - 7));
        }

        session.update_metric("objects", 0.0, |objects| objects + 1.0);
        session.set_metric("draw_calls", (frame % 17) as f64);

        session.end_frame();
    }

    session.phase_summary().print_to_stdout();

    let report = session.to_report(&ReportOptions::default());
    println!("{}", report.activities().to_delimited(';'));
    println!();

    match session.export_csv(env::temp_dir(), &ReportOptions::default()) {
        Some(export) => println!(
            "{} report tables written to {}",
            export.outcome().written(),
            export.directory().display()
        ),
        None => println!("Report could not be written, see the log for details"),
    }
}

fn simulate_work(rounds: u64) {
    let mut accumulator = 0_u64;

    for round in 0..rounds {
        accumulator = accumulator.wrapping_mul(31).wrapping_add(round);
    }

    black_box(accumulator);
}

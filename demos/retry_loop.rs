//! A flaky connection driven by a paced runner.
//!
//! Run with `RUST_LOG=debug cargo run --example retry_loop` to see every
//! transition.

use cadence_fsm::{state_enum, RunnerBuilder};
use std::io;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Link {
        Connect,
        Backoff,
        Streaming,
        Closed,
    }
    final: [Closed]
}

/// Pretend peer: refuses the first few attempts, then streams some frames.
struct Peer {
    failures_left: u32,
    frames_left: u32,
}

fn connect(peer: &mut Peer) -> Result<&'static str, io::Error> {
    if peer.failures_left > 0 {
        peer.failures_left -= 1;
        return Err(io::Error::new(io::ErrorKind::TimedOut, "peer did not answer"));
    }
    Ok("connected")
}

fn stream(peer: &mut Peer) -> Result<&'static str, io::Error> {
    if peer.frames_left == 0 {
        return Ok("eof");
    }
    peer.frames_left -= 1;
    tracing::info!(remaining = peer.frames_left, "frame received");
    Ok("frame")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut runner = RunnerBuilder::with_context(Peer {
        failures_left: 2,
        frames_left: 3,
    })
    .initial(Link::Connect)
    .loop_period(Duration::from_millis(200))
    .stop_on_final(true)
    .handler(Link::Connect, connect)
    .handler(Link::Backoff, |_| Ok("retry"))
    .handler(Link::Streaming, stream)
    .handler(Link::Closed, |_| Ok("closed"))
    .on_value(Link::Connect, "connected", Link::Streaming)
    .on_failure(Link::Connect, io::ErrorKind::TimedOut, Link::Backoff)
    .on_value(Link::Backoff, "retry", Link::Connect)
    .on_value(Link::Streaming, "eof", Link::Closed)
    .build()?;

    runner.run()?;

    let checkpoint = runner.checkpoint();
    tracing::info!(
        iterations = runner.iterations(),
        transitions = runner.history().len(),
        "link closed"
    );
    println!("{}", checkpoint.to_json()?);

    Ok(())
}

//! Rewind Sim demo entry point
//!
//! Runs a seeded break shot, injects a late impulse in the past and prints
//! the replayed timeline as JSON.
//!
//! Usage: `rewind-sim [config.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(e) = demo::run(std::env::args().skip(1).collect()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on the web; hosts drive `System` directly
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::DVec2;
    use serde::Serialize;

    use rewind_sim::sim::{PayloadArena, Snapshot, System, scenario};
    use rewind_sim::{Result, SimConfig, SimError, Timestamp};

    const DEFAULT_SEED: u64 = 0x5EED;
    const RACK_SIZE: usize = 10;
    const TABLE_SIZE: f64 = 30.0;
    const IMPULSE_AT: Timestamp = 0.25;
    const END_TIME: Timestamp = 20.0;

    #[derive(Serialize)]
    struct FrameReport<'a> {
        time: Timestamp,
        bodies: Vec<BodyReport<'a>>,
    }

    #[derive(Serialize)]
    struct BodyReport<'a> {
        id: u32,
        label: &'a str,
        pos: DVec2,
        vel: DVec2,
    }

    fn report<'a>(time: Timestamp, snapshot: &Snapshot, labels: &'a PayloadArena<String>) -> FrameReport<'a> {
        let bodies = snapshot
            .iter()
            .map(|b| BodyReport {
                id: b.id,
                label: b.payload.and_then(|h| labels.get(h)).map_or("", String::as_str),
                pos: b.position(),
                vel: b.velocity(),
            })
            .collect();
        FrameReport { time, bodies }
    }

    pub fn run(args: Vec<String>) -> Result<()> {
        let config = match args.first() {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| SimError::config(format!("{}: {}", path, e)))?;
                SimConfig::from_json(&json)?
            }
            None => SimConfig::default(),
        };
        let seed = match args.get(1) {
            Some(s) => s
                .parse()
                .map_err(|e| SimError::config(format!("bad seed {:?}: {}", s, e)))?,
            None => DEFAULT_SEED,
        };

        let (mut bodies, fixtures) = scenario::random_break(seed, RACK_SIZE, TABLE_SIZE)?;
        let mut labels = PayloadArena::new();
        let ids: Vec<u32> = bodies.iter().map(|b| b.id).collect();
        for id in ids {
            let label = if id == 0 { "cue".to_string() } else { format!("ball-{}", id) };
            let handle = labels.insert(label);
            if let Some(body) = bodies.get_mut(id) {
                body.payload = Some(handle);
            }
        }

        let mut system = System::starting_at(0.0, bodies, fixtures, config)?;
        let first = system.calculate_to_time(END_TIME)?;
        log::info!("Initial run: {} transitions up to t={}", first, END_TIME);

        // Nudge ball 1 after the fact; everything from IMPULSE_AT on is replayed
        system.add_impulse_event(IMPULSE_AT, 1, DVec2::new(0.0, 3.0))?;
        let replayed = system.calculate_to_time(END_TIME)?;
        log::info!(
            "Replayed {} transitions after impulse at t={}",
            replayed,
            IMPULSE_AT
        );

        let mut frames: Vec<FrameReport> = system
            .timeline()
            .map(|(t, snapshot)| report(t, snapshot, &labels))
            .collect();
        let end = system.snapshot_at(END_TIME)?;
        frames.push(report(END_TIME, &end, &labels));

        let json = serde_json::to_string_pretty(&frames)?;
        println!("{}", json);
        Ok(())
    }
}

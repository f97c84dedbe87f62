//! # Round Face Simulator
//!
//! Runs the watch face against the software framebuffer on a tokio timer
//! loop. Device events can be replayed from a JSON script:
//!
//! ```json
//! [
//!   { "at_ms": 2000, "event": { "type": "pointer", "content": { "x": 90, "y": 90, "pressed": true } } },
//!   { "at_ms": 2100, "event": { "type": "pointer", "content": { "x": 90, "y": 90, "pressed": false } } }
//! ]
//! ```
//!
//! `at_ms` is relative to simulator start. With `--stdout` every frame is
//! dumped as ASCII art.

use anyhow::Context;
use chrono::{Local, Utc};
use log::{info, warn};
use round_face_lib::{
    config::{FaceOptions, OPTIONS_FILE},
    framebuffer::{HEIGHT, WIDTH},
    Event, FrameBuffer, Host, Options, TomlFile, Watch,
};
use serde::Deserialize;
use std::{
    collections::VecDeque,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// A scripted device event.
#[derive(Debug, Deserialize)]
struct Step {
    at_ms: i64,
    event: Event,
}

/// Stands in for the vibration motor and the backlight.
struct LogHost;

impl Host for LogHost {
    fn buzz(&mut self, ms: u32) {
        info!("buzz {ms}ms");
    }

    fn set_display_power(&mut self, on: bool) {
        info!("display power {}", if on { "on" } else { "off" });
    }
}

struct Args {
    stdout: bool,
    script: Option<PathBuf>,
    seconds: u64,
    options: PathBuf,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = Args {
            stdout: false,
            script: None,
            seconds: 10,
            options: PathBuf::from(OPTIONS_FILE),
        };
        let mut iter = env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--stdout" => args.stdout = true,
                "--script" => args.script = Some(iter.next().context("--script needs a path")?.into()),
                "--options" => args.options = iter.next().context("--options needs a path")?.into(),
                "--seconds" => {
                    args.seconds = iter
                        .next()
                        .context("--seconds needs a value")?
                        .parse()
                        .context("--seconds must be a whole number")?;
                }
                other => warn!("ignoring unknown argument {other}"),
            }
        }
        Ok(args)
    }
}

fn load_script(path: &Path) -> anyhow::Result<VecDeque<Step>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut steps: Vec<Step> =
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    steps.sort_by_key(|step| step.at_ms);
    Ok(steps.into())
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse()?;

    let mut script = match &args.script {
        Some(path) => load_script(path)?,
        None => VecDeque::new(),
    };

    let options = Options::new(
        FaceOptions::load_from_path(&args.options),
        TomlFile::new(&args.options),
    );
    let offset = *Local::now().offset();
    let mut watch = Watch::new(
        FrameBuffer::new(WIDTH, HEIGHT),
        LogHost,
        options,
        offset,
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    rt.block_on(async {
        let started = now_ms();
        let until = started + args.seconds as i64 * 1_000;
        watch.start(started);
        if args.stdout {
            print!("{}", watch.canvas().to_ascii());
        }

        loop {
            let scripted = script.front().map(|step| started + step.at_ms);
            let wake = [watch.next_deadline(), scripted, Some(until)]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(until);
            let delay = (wake - now_ms()).max(0) as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let now = now_ms();
            if now >= until {
                break;
            }
            let redraws = watch.scheduler().redraw_count();
            while script.front().is_some_and(|step| started + step.at_ms <= now) {
                if let Some(step) = script.pop_front() {
                    info!("event {:?}", step.event);
                    watch.handle(step.event, now);
                }
            }
            watch.on_timer(now);
            if args.stdout && watch.scheduler().redraw_count() != redraws {
                print!("{}", watch.canvas().to_ascii());
            }
        }
    });

    if let Err(e) = watch.options_mut().flush() {
        warn!("could not save options: {e}");
    }
    info!("simulator done");
    Ok(())
}

// src/main.rs
// Headless demo: simulated 50 Hz-contaminated signal, live notch, PNG snapshots.
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use anyhow::{Context, Result};
use biosignal_scope::drivers::{
    render_overlay_png, render_spectrum_png, render_sweep_png, PlotStyle, SimulatedSource,
};
use biosignal_scope::signal::{FilterParams, FilterPurpose};
use biosignal_scope::tick::FixedRateTicker;
use biosignal_scope::{
    latest_snapshot, spawn_engine, ChannelId, ScopeCommand, ScopeConfig, ScopePipeline,
    ScopeSnapshot,
};
const RUN_FOR: Duration = Duration::from_secs(3);
// 用法: biosignal-scope [config.json] [png 输出目录]
fn main() -> Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ScopeConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => ScopeConfig::default(),
    };
    let out_dir = args.next().map(PathBuf::from);
    let source = SimulatedSource::new(config.sample_rate_hz, config.channel_count as u8, 7)
        .realtime();
    let ticker = FixedRateTicker::from_hz(config.tick_hz);
    let sample_rate_hz = config.sample_rate_hz;
    let pipeline = ScopePipeline::new(source, config).context("building pipeline")?;
    let (tx, rx) = mpsc::channel();
    let (tx_cmd, rx_cmd) = mpsc::channel();
    let engine = spawn_engine(pipeline, ticker, tx, rx_cmd);
    // 实时去除工频干扰
    tx_cmd
        .send(ScopeCommand::SetFilter {
            channel: ChannelId(0),
            purpose: FilterPurpose::Mains,
            params: FilterParams::notch(50.0, 30.0, sample_rate_hz),
        })
        .context("engine exited early")?;
    let started = Instant::now();
    let mut last = None;
    while started.elapsed() < RUN_FOR {
        if let Some(snapshot) = latest_snapshot(&rx) {
            log::debug!("snapshot at {:?}", snapshot.latest_time);
            last = Some(snapshot);
        }
        thread::sleep(Duration::from_millis(100));
    }
    tx_cmd.send(ScopeCommand::Shutdown).ok();
    engine
        .join()
        .map_err(|_| anyhow::anyhow!("engine thread panicked"))?;
    if let Some(snapshot) = latest_snapshot(&rx).or(last) {
        log::info!("final stats: {:?}", snapshot.stats);
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot.stats).context("encoding stats")?
        );
        if let Some(dir) = out_dir {
            write_pngs(&snapshot, &dir)?;
        }
    } else {
        log::warn!("engine produced no snapshot");
    }
    Ok(())
}
fn write_pngs(snapshot: &ScopeSnapshot, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let style = PlotStyle::default();
    for entry in &snapshot.sweeps {
        if entry.sweep.is_empty() {
            continue;
        }
        let png = render_sweep_png(&entry.sweep, &style)?;
        save(dir.join(format!("sweep_{}.png", entry.channel)), &png)?;
    }
    for spectrum in snapshot.spectra.iter().filter(|s| !s.magnitudes.is_empty()) {
        let png = render_spectrum_png(spectrum, &style)?;
        save(dir.join(format!("spectrum_{}.png", spectrum.channel)), &png)?;
    }
    if !snapshot.overlay.is_empty() {
        let png = render_overlay_png(&snapshot.overlay, &style)?;
        save(dir.join("overlay.png"), &png)?;
    }
    Ok(())
}
fn save(path: PathBuf, png: &[u8]) -> Result<()> {
    std::fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

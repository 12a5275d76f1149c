use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use polyemu_common::{FrameContext, PixelFormat, SimpleCommand, SoundBuffer, Surface};
use polyemu_driver::config::default_config_path;
use polyemu_driver::{
    Console, HostConfig, HostFrontend, ImageDiscOpener, ModuleRegistry, Session, StepReport,
};
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Parser)]
struct Args {
    /// Content path: a ROM file, archive, CUE sheet, or M3U playlist of discs
    #[arg(short = 'f', long, required_unless_present_any = ["list_modules", "dump_modules"])]
    file_path: Option<String>,

    /// Skip probing and load with the module that has this short name
    #[arg(long)]
    force_module: Option<String>,

    /// Number of steps to run before exiting
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Output sample rate in Hz; 0 disables sound
    #[arg(long, default_value_t = 48000.0)]
    sound_rate: f64,

    /// Send a "select disk" command at this step
    #[arg(long)]
    select_disk_at: Option<u64>,

    /// Print every available module and exit if no file is given
    #[arg(long, default_value_t)]
    list_modules: bool,

    /// Write module definitions (short name, full name, nominal width, nominal height) to a file
    #[arg(long)]
    dump_modules: Option<PathBuf>,

    /// Host config file path; defaults to the per-user config directory
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Frontend with no window or audio device; only tallies what the pipeline hands it.
#[derive(Debug, Default)]
struct HeadlessFrontend {
    resample_buffer_frames: usize,
    mid_sync_frames: usize,
    mid_sync_cycles: u64,
}

impl HostFrontend for HeadlessFrontend {
    fn display_message(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn resize_resample_buffer(&mut self, frames: usize) {
        log::debug!("Resample buffer resized to {frames} frames");
        self.resample_buffer_frames = frames;
    }

    fn mid_sync(&mut self, ctx: &FrameContext, new_frames: Range<usize>) {
        self.mid_sync_frames += new_frames.len();
        self.mid_sync_cycles += ctx.master_cycles.saturating_sub(ctx.master_cycles_synced);
    }
}

#[derive(Debug, Default)]
struct RunStats {
    steps: u64,
    sound_frames: usize,
    master_cycles: u64,
    contract_violations: u64,
}

impl RunStats {
    fn record(&mut self, report: &StepReport) {
        self.steps += 1;
        self.sound_frames += report.sound_frames.len();
        self.master_cycles += report.master_cycles;
        if report.contract_violation.is_some() {
            self.contract_violations += 1;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let console = Console::stdout();
    let registry = ModuleRegistry::with_builtin_modules();
    registry.announce(&console);

    if args.list_modules {
        for module in registry.iter() {
            let descriptor = module.descriptor();
            console.println(format!(
                "{:<12}{} (priority {})",
                descriptor.short_name, descriptor.full_name, descriptor.priority
            ));
        }
    }

    if let Some(dump_path) = &args.dump_modules {
        let file = File::create(dump_path)
            .with_context(|| format!("Unable to create '{}'", dump_path.display()))?;
        registry.write_modules_def(BufWriter::new(file))?;
        log::info!("Wrote module definitions to '{}'", dump_path.display());
    }

    let Some(file_path) = &args.file_path else {
        return Ok(());
    };

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    log::info!("Reading host config from '{}'", config_path.display());
    let config = HostConfig::from_file(&config_path);

    let mut session = Session::new(registry, config, Box::new(ImageDiscOpener), console);
    session.load(Path::new(file_path), args.force_module.as_deref())?;

    run(&mut session, &args)
}

fn run(session: &mut Session, args: &Args) -> anyhow::Result<()> {
    let Some(active) = session.active() else {
        return Ok(());
    };
    let descriptor = active.descriptor();
    log::info!("Running '{}' for {} steps", active.name(), args.frames);

    // Double height leaves room for weaving interlaced fields
    let surface = Surface::new(
        descriptor.nominal_width,
        2 * descriptor.nominal_height,
        PixelFormat::default(),
    );
    let sound_rate = args.sound_rate.max(0.0);
    let sound_capacity = if sound_rate > 0.0 { (sound_rate / 20.0).ceil() as usize } else { 0 };
    let sound = SoundBuffer::new(descriptor.sound_channels.max(1), sound_capacity);
    let mut ctx = FrameContext::new(surface, sound, sound_rate);

    let mut frontend = HeadlessFrontend::default();
    let mut stats = RunStats::default();
    for step in 0..args.frames {
        if args.select_disk_at == Some(step) {
            session.simple_command(SimpleCommand::SelectDisk)?;
        }

        let report = session.step(&mut ctx, &mut frontend)?;
        stats.record(&report);
    }

    log::info!(
        "Ran {} steps: {} sound frames ({} via mid-step sync), {} master cycles, {} contract violations",
        stats.steps,
        stats.sound_frames + frontend.mid_sync_frames,
        frontend.mid_sync_frames,
        stats.master_cycles + frontend.mid_sync_cycles,
        stats.contract_violations
    );

    log::debug!("Final resample buffer size: {} frames", frontend.resample_buffer_frames);

    session.close();

    Ok(())
}

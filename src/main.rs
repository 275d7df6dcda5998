use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::{error, info, warn};

use sensor_analysis::calibration;
use sensor_analysis::config::AppConfig;
use sensor_analysis::logger;
use sensor_analysis::playback;
use sensor_analysis::plotter;
use sensor_analysis::spectrum::{self, SAMPLE_RATE_HZ};
use sensor_analysis::Result;

#[derive(Parser)]
#[command(name = "sensor-analysis", version, about = "Accelerometer calibration and object area spectra")]
struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true, env = "SENSOR_ANALYSIS_CONFIG")]
    config: Option<PathBuf>,

    /// 输出 debug 级别日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve accelerometer bias and scale, write them as JSON
    Calibrate {
        output_file: PathBuf,
        /// Solve bias only, scale fixed at 1
        #[arg(long)]
        bias_only: bool,
        /// Local gravity magnitude (m/s²)
        #[arg(long)]
        gravity: Option<f64>,
    },
    /// Windowed spectra of one object's area from a recording
    Spectrum {
        recording: PathBuf,
        /// wf or nf
        #[arg(long)]
        sensor: Option<String>,
        #[arg(long)]
        object: Option<usize>,
        /// heatmap, animation or none
        #[arg(long)]
        mode: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        /// position or timestamp
        #[arg(long)]
        align: Option<String>,
    },
    /// Write the default configuration to a file
    InitConfig { path: PathBuf },
}

fn main() {
    dotenv().ok(); // 加载 .env 文件
    let cli = Cli::parse();
    logger::init_logger(if cli.verbose { "debug" } else { "info" });

    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            AppConfig::load_from_file(path)?
        }
        None => AppConfig::default(),
    };

    match cli.command {
        Command::Calibrate {
            output_file,
            bias_only,
            gravity,
        } => {
            if bias_only {
                config.calibration.variant = "bias-only".to_string();
            }
            if let Some(g) = gravity {
                config.calibration.gravity = g;
            }
            config.validate()?;
            run_calibrate(&config, &output_file)
        }
        Command::Spectrum {
            recording,
            sensor,
            object,
            mode,
            output,
            align,
        } => {
            if let Some(sensor) = sensor {
                config.spectrum.sensor = sensor;
            }
            if let Some(object) = object {
                config.spectrum.object_id = object;
            }
            if let Some(mode) = mode {
                config.render.mode = mode;
            }
            if let Some(align) = align {
                config.spectrum.tag_alignment = align;
            }
            if output.is_some() {
                config.render.output = output;
            }
            config.validate()?;
            run_spectrum(&config, &recording)
        }
        Command::InitConfig { path } => {
            AppConfig::default().save_to_file(&path)?;
            info!("Default configuration written to {:?}", path);
            Ok(())
        }
    }
}

fn run_calibrate(config: &AppConfig, output_file: &Path) -> Result<()> {
    let result = calibration::calibrate_from_config(&config.calibration)?;

    let solution = result.to_map();
    for (name, value) in &solution {
        info!("{} = {:.8}", name, value);
    }
    println!("{}", serde_json::to_string(&solution)?);

    result.save_to_file(output_file)?;
    info!("Calibration saved to {:?}", output_file);
    Ok(())
}

fn run_spectrum(config: &AppConfig, recording_path: &Path) -> Result<()> {
    let sensor = config.spectrum.sensor()?;
    let alignment = config.spectrum.tag_alignment()?;

    let recording = playback::read_file(recording_path)?;
    if let Some(rate) = recording.header.sample_rate_hz {
        if (rate - SAMPLE_RATE_HZ).abs() > f64::EPSILON {
            warn!(
                "Recording reports {} Hz, spectra assume {} Hz",
                rate, SAMPLE_RATE_HZ
            );
        }
    }

    let extraction = playback::extract(&recording.packets, sensor, config.spectrum.object_id)?;
    let spectrogram = spectrum::analyze(&extraction, alignment)?;
    info!(
        "{} Object {}: {} windows ({} alignment)",
        sensor.to_string().to_uppercase(),
        config.spectrum.object_id,
        spectrogram.frames.len(),
        alignment
    );

    plotter::render(&spectrogram, &config.render)?;
    Ok(())
}

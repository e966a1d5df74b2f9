use argh::FromArgs;
use std::collections::HashMap;
use std::path::PathBuf;

use petanque::calibration::backend::DEFAULT_CALIBRATION_KEY;
use petanque::calibration::{
    current_timestamp, AccuracyCheck, CalibrationConfig, CalibrationSample, CalibrationStore,
    Calibrator, JsonFileBackend, ReferenceObjectKind,
};
use petanque::distance::{score_by_proximity, DistanceEngine, FallbackCalibration, FrameObservation};

#[derive(FromArgs)]
/// Calibrate a camera and measure petanque frames produced by a ball detector
struct Args {
    /// directory holding the calibration files
    #[argh(option, short = 's', default = "PathBuf::from(\".\")")]
    store_dir: PathBuf,

    /// identifier of the camera
    #[argh(option, short = 'k', default = "DEFAULT_CALIBRATION_KEY.to_string()")]
    key: String,

    /// path to a JSON validation policy
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Calibrate(CalibrateArgs),
    Status(StatusArgs),
    Validate(ValidateArgs),
    Clear(ClearArgs),
    Measure(MeasureArgs),
}

#[derive(FromArgs)]
/// Calibrate from a reference object imaged at a known pixel size
#[argh(subcommand, name = "calibrate")]
struct CalibrateArgs {
    /// reference object: cochonnet, boule or custom
    #[argh(option, short = 'r', default = "ReferenceObjectKind::Custom")]
    reference: ReferenceObjectKind,

    /// physical size of a custom reference object, in meters
    #[argh(option)]
    known_size: Option<f64>,

    /// observed size in pixels, repeat for multi-sample calibration
    #[argh(option, short = 'p')]
    pixels: Vec<f64>,
}

#[derive(FromArgs)]
/// Print the calibration state
#[argh(subcommand, name = "status")]
struct StatusArgs {}

#[derive(FromArgs)]
/// Validate the active calibration, optionally against a measured length
#[argh(subcommand, name = "validate")]
struct ValidateArgs {
    /// true length of a reference segment, in meters
    #[argh(option)]
    expected_distance: Option<f64>,

    /// length of the same segment in the image, in pixels
    #[argh(option)]
    observed_pixels: Option<f64>,
}

#[derive(FromArgs)]
/// Remove the active calibration
#[argh(subcommand, name = "clear")]
struct ClearArgs {}

#[derive(FromArgs)]
/// Rank and score the balls of a detector frame
#[argh(subcommand, name = "measure")]
struct MeasureArgs {
    /// path to the frame JSON from the detector
    #[argh(option, short = 'f')]
    frame: PathBuf,

    /// path to a JSON map from ball id to team
    #[argh(option, short = 't')]
    teams: Option<PathBuf>,

    /// scale in meters per pixel to use when uncalibrated
    #[argh(option)]
    fallback_scale: Option<f64>,

    /// use the approximate scale of one millimeter per pixel when uncalibrated
    #[argh(switch)]
    approximate: bool,
}

fn calibrate(
    store: &CalibrationStore<JsonFileBackend>,
    args: CalibrateArgs,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let calibrator = Calibrator::new();

    let record = match (args.pixels.as_slice(), args.reference.nominal_diameter()) {
        ([], _) => return Err("at least one --pixels value is required".into()),
        ([pixels], Some(_)) => calibrator.calibrate_reference_into(store, args.reference, *pixels)?,
        (pixels, nominal) => {
            let known_size = nominal
                .or(args.known_size)
                .ok_or("--known-size is required for a custom reference")?;
            let samples = pixels
                .iter()
                .map(|&p| CalibrationSample::new(known_size, p))
                .collect::<Vec<_>>();
            calibrator.calibrate_samples_into(store, &samples)?
        }
    };

    Ok(serde_json::to_value(record)?)
}

fn measure(
    store: &CalibrationStore<JsonFileBackend>,
    args: MeasureArgs,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let frame = std::fs::read_to_string(&args.frame)?;
    let observation: FrameObservation = serde_json::from_str(&frame)?;

    let fallback = match (args.fallback_scale, args.approximate) {
        (Some(scale), _) => Some(FallbackCalibration::new(scale)?),
        (None, true) => Some(FallbackCalibration::approximate()),
        (None, false) => None,
    };

    let mut engine = DistanceEngine::new(store);
    if let Some(fallback) = fallback {
        engine = engine.with_fallback(fallback);
    }

    let measurement = engine.measure_frame(&observation)?;

    let score = match args.teams {
        Some(path) => {
            let teams: HashMap<u32, String> =
                serde_json::from_str(&std::fs::read_to_string(path)?)?;
            score_by_proximity(&measurement.ranking, |id| teams.get(&id.0).cloned())
        }
        None => None,
    };

    Ok(serde_json::json!({
        "measurement": measurement,
        "score": score,
    }))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => CalibrationConfig::from_json_file(path)?,
        None => CalibrationConfig::default(),
    };
    let store =
        CalibrationStore::with_config(JsonFileBackend::new(&args.store_dir, &args.key), config)?;

    log::debug!("Using calibration file {}", store.backend().path().display());

    let output = match args.command {
        Command::Calibrate(calibrate_args) => calibrate(&store, calibrate_args)?,
        Command::Status(_) => serde_json::json!({
            "state": store.status(current_timestamp())?,
            "record": store.load()?,
        }),
        Command::Validate(validate_args) => {
            let check = match (validate_args.expected_distance, validate_args.observed_pixels) {
                (Some(expected_distance_meters), Some(observed_pixels)) => Some(AccuracyCheck {
                    expected_distance_meters,
                    observed_pixels,
                }),
                (None, None) => None,
                _ => {
                    return Err(
                        "--expected-distance and --observed-pixels must be given together".into(),
                    )
                }
            };
            serde_json::to_value(store.validate(check)?)?
        }
        Command::Clear(_) => {
            store.clear()?;
            serde_json::json!({ "cleared": true })
        }
        Command::Measure(measure_args) => measure(&store, measure_args)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

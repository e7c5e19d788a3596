use crossbeam_channel::{bounded, Receiver};
use gaze_core::{CameraCalibration, PixelSelection};
use gaze_dispatch::{GoalConfig, GoalDispatcher, HandshakeConfig, SimController};
use gaze_pinhole::IntrinsicsStore;
use log::*;
use std::process;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use structopt::StructOpt;

/// Arbitrary forward distance for deprojected targets. Only the direction
/// matters to the head controller, not the absolute distance.
const ASSUMED_DEPTH: f64 = 1.0;

#[derive(StructOpt, Clone)]
#[structopt(
    name = "gaze-sandbox",
    about = "Replay pixel clicks through the gaze pipeline against a simulated head controller"
)]
struct Opt {
    /// The x focal length reported by the simulated calibration feed
    #[structopt(long, default_value = "525.0")]
    x_focal: f64,
    /// The y focal length reported by the simulated calibration feed
    #[structopt(long, default_value = "525.0")]
    y_focal: f64,
    /// The x principal point coordinate
    #[structopt(long, default_value = "320.0")]
    x_center: f64,
    /// The y principal point coordinate
    #[structopt(long, default_value = "240.0")]
    y_center: f64,
    /// Seconds before the calibration feed delivers the intrinsics
    #[structopt(long, default_value = "0.2")]
    calibration_delay: f64,
    /// Seconds between replayed clicks
    #[structopt(long, default_value = "0.1")]
    click_gap: f64,
    /// Seconds before the simulated controller starts accepting goals
    #[structopt(long, default_value = "0.0")]
    controller_delay: f64,
    /// Seconds the simulated controller takes to finish one motion
    #[structopt(long, default_value = "3.0")]
    execution_time: f64,
    /// Handshake wait per attempt, in seconds
    #[structopt(long, default_value = "2.0")]
    handshake_timeout: f64,
    /// Maximum handshake attempts before startup is aborted
    #[structopt(long, default_value = "3")]
    handshake_attempts: u32,
    /// Bounded wait for a valid wall clock, in seconds
    #[structopt(long, default_value = "5.0")]
    clock_timeout: f64,
    /// Minimum motion duration per goal, in seconds
    #[structopt(long, default_value = "0.5")]
    min_duration: f64,
    /// Maximum angular velocity per goal, in radians per second
    #[structopt(long, default_value = "1.0")]
    max_velocity: f64,
    /// Optical frame id of the camera
    #[structopt(long, default_value = "stereo_optical_frame")]
    camera_frame: String,
    /// Pixel clicks to replay, as `u,v` (append `,aux` for a
    /// non-primary-button click, which is ignored)
    #[structopt(parse(try_from_str = parse_click))]
    clicks: Vec<ClickSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Button {
    Primary,
    Other,
}

/// One user-interaction event from the (simulated) display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClickSpec {
    button: Button,
    u: u32,
    v: u32,
}

fn parse_click(s: &str) -> Result<ClickSpec, String> {
    let mut parts = s.split(',');
    let mut coord = |axis: &str| {
        parts
            .next()
            .ok_or_else(|| format!("missing {} coordinate in `{}`", axis, s))?
            .parse::<u32>()
            .map_err(|e| format!("bad {} coordinate in `{}`: {}", axis, s, e))
    };
    let u = coord("u")?;
    let v = coord("v")?;
    let button = match parts.next() {
        None => Button::Primary,
        Some("aux") => Button::Other,
        Some(other) => return Err(format!("unknown button `{}`", other)),
    };
    if parts.next().is_some() {
        return Err(format!("trailing fields in `{}`", s));
    }
    Ok(ClickSpec { button, u, v })
}

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

/// Whether the wall clock has become valid (nonzero and after the epoch).
/// Trivially true on a live host; present because the pipeline must not
/// stamp goals before a time source exists.
fn wall_clock_valid() -> bool {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|age| !age.is_zero())
        .unwrap_or(false)
}

fn wait_for_valid_time(valid: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if valid() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

/// Simulated calibration feed: delivers the intrinsic matrix once after a
/// delay, then closes, like a latched one-shot topic.
fn spawn_calibration_feed(
    calibration: CameraCalibration,
    delay: Duration,
) -> Receiver<CameraCalibration> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = tx.send(calibration);
    });
    rx
}

/// Simulated user-interaction feed: replays the CLI clicks with a gap
/// between them, then closes, which shuts the pipeline down.
fn spawn_click_feed(clicks: Vec<ClickSpec>, gap: Duration) -> Receiver<ClickSpec> {
    let (tx, rx) = bounded(16);
    thread::spawn(move || {
        for click in clicks {
            thread::sleep(gap);
            if tx.send(click).is_err() {
                break;
            }
        }
    });
    rx
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    info!("starting gaze sandbox");

    // Precondition: valid clock, waited for with a bound so startup can
    // never hang.
    if !wait_for_valid_time(wall_clock_valid, secs(opt.clock_timeout)) {
        error!("timed out waiting for a valid wall clock");
        process::exit(1);
    }

    let calibration = CameraCalibration::from_pinhole(
        opt.x_focal,
        opt.y_focal,
        opt.x_center,
        opt.y_center,
    );
    let calibration_feed = spawn_calibration_feed(calibration, secs(opt.calibration_delay));

    info!("waiting for camera intrinsics");
    let mut store = IntrinsicsStore::new();
    while !store.is_ready() {
        match calibration_feed.recv() {
            Ok(message) => store.update(&message),
            Err(_) => {
                error!("calibration feed closed before delivering intrinsics");
                process::exit(1);
            }
        }
    }
    // One-shot consumption: detach the feed now that intrinsics are in.
    drop(calibration_feed);
    let intrinsics = store.get().expect("store just became ready");
    info!(
        "camera intrinsics received: focals ({}, {}), principal point ({}, {})",
        intrinsics.focals.x,
        intrinsics.focals.y,
        intrinsics.principal_point.x,
        intrinsics.principal_point.y
    );

    // Precondition: head controller handshake, bounded per attempt.
    let (controller, link) = SimController::spawn(
        "head_controller",
        secs(opt.controller_delay),
        secs(opt.execution_time),
    );
    let mut dispatcher = GoalDispatcher::new(
        link,
        HandshakeConfig {
            attempt_timeout: secs(opt.handshake_timeout),
            max_attempts: opt.handshake_attempts,
        },
    );
    if let Err(err) = dispatcher.connect() {
        error!("{}", err);
        process::exit(1);
    }

    let goals = GoalConfig {
        camera_frame: opt.camera_frame.clone(),
        min_duration: secs(opt.min_duration),
        max_velocity: opt.max_velocity,
    };
    let clicks = spawn_click_feed(opt.clicks.clone(), secs(opt.click_gap));

    // Single-threaded dispatch loop: each click is processed to completion
    // before the next is received. Per-event failures drop that click
    // only; the loop itself never fails.
    while let Ok(click) = clicks.recv() {
        if click.button != Button::Primary {
            debug!("ignoring non-primary click at ({}, {})", click.u, click.v);
            continue;
        }
        info!(
            "pixel selected ({}, {}), pointing the head in that direction",
            click.u, click.v
        );
        let selection = PixelSelection::from_click(click.u, click.v);
        match intrinsics.deproject(selection, ASSUMED_DEPTH) {
            Ok(target) => {
                if let Err(err) = dispatcher.send_goal(goals.goal(target)) {
                    warn!("dropping goal for ({}, {}): {}", click.u, click.v, err);
                }
            }
            Err(err) => warn!("dropping click ({}, {}): {}", click.u, click.v, err),
        }
    }

    info!("click feed closed, shutting down");
    drop(dispatcher);
    let accepted = controller.join();
    info!("controller accepted {} goal(s)", accepted);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primary_and_aux_clicks() {
        assert_eq!(
            parse_click("320,240").unwrap(),
            ClickSpec {
                button: Button::Primary,
                u: 320,
                v: 240
            }
        );
        assert_eq!(
            parse_click("10,20,aux").unwrap().button,
            Button::Other
        );
        assert!(parse_click("320").is_err());
        assert!(parse_click("320,240,middle").is_err());
        assert!(parse_click("320,240,aux,1").is_err());
        assert!(parse_click("-3,240").is_err());
    }

    #[test]
    fn valid_time_wait_is_bounded() {
        assert!(wait_for_valid_time(|| true, Duration::from_millis(10)));
        let start = Instant::now();
        assert!(!wait_for_valid_time(|| false, Duration::from_millis(60)));
        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}

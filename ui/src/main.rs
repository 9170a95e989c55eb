#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod app;
mod command;
mod services;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use structopt::StructOpt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use model::{AnimatorConfig, Coordinate};
use provider::{HttpTransport, ProviderConfig, ProviderError, ReqwestTransport};

use self::app::{App, Settings};
use self::command::{Command, USAGE};
use self::services::{Found, Services, Trip};

#[derive(StructOpt)]
#[structopt(
    name = "route-chase",
    about = "Finds driving routes between places and follows the best one with a camera"
)]
struct Args {
    /// Token for the geocoding and directions services
    #[structopt(long, env = "MAPBOX_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    /// Defaults to the public Mapbox API
    #[structopt(long)]
    base_url: Option<String>,
    /// Give up on any one request after this long
    #[structopt(long, default_value = "20")]
    timeout_secs: u64,
    /// How fast the marker drives
    #[structopt(long, default_value = "30")]
    speed_kmh: f64,
    /// Routes are resampled so no two consecutive points are further apart than this
    #[structopt(long, default_value = "5")]
    max_segment_meters: f64,
    /// Display refreshes per second
    #[structopt(long, default_value = "60")]
    fps: f64,
    /// Where the map starts, as "longitude,latitude"
    #[structopt(long, default_value = "0,0", parse(try_from_str = Coordinate::parse))]
    center: Coordinate,
    #[structopt(long, default_value = "2")]
    zoom: f64,
    /// Keep the distance left over after passing a point, instead of stopping on it
    #[structopt(long)]
    carry_remainder: bool,
    /// With --to, drive one trip and exit instead of reading commands
    #[structopt(long, requires = "to")]
    from: Option<String>,
    #[structopt(long, requires = "from")]
    to: Option<String>,
}

impl Args {
    fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            bail!("--fps must be positive, not {}", self.fps);
        }
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            bail!("--speed-kmh must be positive, not {}", self.speed_kmh);
        }
        if !(self.max_segment_meters.is_finite() && self.max_segment_meters > 0.0) {
            bail!(
                "--max-segment-meters must be positive, not {}",
                self.max_segment_meters
            );
        }
        Ok(())
    }
}

/// Network results, handed back to the frame loop
enum Outcome {
    Nearest(Coordinate, Result<Option<String>, ProviderError>),
    Found(Result<Found, ProviderError>),
    Trip(u64, Result<Trip, ProviderError>),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::from_args();
    args.validate()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let mut config = ProviderConfig::new(args.access_token.clone());
    if let Some(ref base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }
    config.timeout = Duration::from_secs(args.timeout_secs);
    // Fail before sending anything
    config.access_token()?;
    let transport = ReqwestTransport::new(config.timeout)?;
    let services = Arc::new(Services::new(config, transport));

    let mut app = App::new(
        args.center,
        args.zoom,
        Settings {
            speed_kmh: args.speed_kmh,
            max_segment_meters: args.max_segment_meters,
        },
        AnimatorConfig {
            carry_remainder: args.carry_remainder,
            ..Default::default()
        },
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut in_flight = 0;

    {
        let services = services.clone();
        let tx = tx.clone();
        let center = args.center;
        tokio::spawn(async move {
            let name = services.geocoder.reverse_resolve(center).await;
            let _ = tx.send(Outcome::Nearest(center, name));
        });
        in_flight += 1;
    }

    let one_shot = match (args.from, args.to) {
        (Some(from), Some(to)) => {
            spawn_trip(&services, &tx, app.begin_trip(), from, to);
            in_flight += 1;
            true
        }
        _ => {
            println!("{USAGE}");
            false
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = !one_shot;
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / args.fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let clock = Instant::now();

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let line = match line? {
                    Some(line) => line,
                    None => {
                        debug!("No more commands");
                        stdin_open = false;
                        continue;
                    }
                };
                match Command::parse(&line) {
                    Ok(Some(Command::Search(place))) => {
                        let services = services.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let _ = tx.send(Outcome::Found(services.search(place).await));
                        });
                        in_flight += 1;
                    }
                    Ok(Some(Command::Route { from, to })) => {
                        spawn_trip(&services, &tx, app.begin_trip(), from, to);
                        in_flight += 1;
                    }
                    Ok(Some(Command::Stop)) => {
                        app.stop();
                    }
                    Ok(Some(Command::Help)) => {
                        println!("{USAGE}");
                    }
                    Ok(Some(Command::Quit)) => {
                        break;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        println!("{err}");
                    }
                }
            }
            Some(outcome) = rx.recv() => {
                in_flight -= 1;
                match outcome {
                    Outcome::Trip(id, Err(err)) if !app.is_current_trip(id) => {
                        debug!("Ignoring a failure from an outdated trip: {err}");
                    }
                    Outcome::Nearest(center, Ok(Some(name))) => {
                        info!("Map starts at {center}, near {name}");
                    }
                    Outcome::Nearest(center, Ok(None)) => {
                        info!("Map starts at {center}, with nothing named nearby");
                    }
                    Outcome::Nearest(_, Err(err))
                    | Outcome::Found(Err(err))
                    | Outcome::Trip(_, Err(err)) => {
                        report(err, one_shot)?;
                    }
                    Outcome::Found(Ok(found)) => {
                        app.show_place(&found);
                    }
                    Outcome::Trip(id, Ok(trip)) => {
                        app.show_trip(id, trip);
                    }
                }
            }
            now = ticker.tick(), if app.animator.is_running() => {
                app.tick(now.duration_since(clock));
            }
        }

        if !stdin_open && in_flight == 0 && !app.animator.is_running() {
            if app.is_complete() {
                info!("Arrived");
            }
            break;
        }
    }

    app.stop();
    Ok(())
}

fn spawn_trip<T: HttpTransport + 'static>(
    services: &Arc<Services<T>>,
    tx: &mpsc::UnboundedSender<Outcome>,
    id: u64,
    from: String,
    to: String,
) {
    let services = services.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(Outcome::Trip(id, services.plan_trip(from, to).await));
    });
}

/// Configuration problems end the program, as does anything going wrong with a one-shot trip.
/// Otherwise the user can just try again.
fn report(err: ProviderError, one_shot: bool) -> Result<()> {
    if one_shot || !err.is_recoverable() {
        return Err(err.into());
    }
    warn!("{err}");
    println!("{err}");
    Ok(())
}

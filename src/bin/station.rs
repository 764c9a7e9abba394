use clap::{App, Arg, ArgMatches};
use colored::*;
use tracing::{debug, info};
use weather_station::config::{parse_interval, parse_port, parse_seed, ConfigError, ConfigOverrides};
use weather_station::{
    LogPublisher, MqttPublisher, RngSource, StationConfig, StationError, StationStats,
    SystemClock, TelemetryPublisher, WeatherStation,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("weather-station")
        .version("0.1.0")
        .about("🌦️  Weather Station Simulator - publishes simulated readings over MQTT")
        .arg(
            Arg::with_name("station-id")
                .short("s")
                .long("station-id")
                .value_name("ID")
                .help("Station identifier (overrides STATION_ID)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("interval")
                .short("i")
                .long("interval")
                .value_name("SECONDS")
                .help("Seconds between readings (overrides INTERVAL)")
                .takes_value(true)
                .validator(|v| parse_interval(&v).map(|_| ()).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::with_name("broker")
                .short("b")
                .long("broker")
                .value_name("HOST")
                .help("MQTT broker host (overrides MQTT_BROKER)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("MQTT broker port (overrides MQTT_PORT)")
                .takes_value(true)
                .validator(|v| parse_port(&v).map(|_| ()).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed the random source for a reproducible run (overrides SIM_SEED)")
                .takes_value(true)
                .validator(|v| parse_seed(&v).map(|_| ()).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::with_name("dry-run")
                .long("dry-run")
                .help("Log readings instead of publishing them to the broker"),
        )
        .get_matches();

    tracing_subscriber::fmt::init();

    let config = resolve_config(&matches)?;
    print_banner(&config, matches.is_present("dry-run"));
    debug!("Resolved configuration: {}", serde_json::to_string(&config)?);

    let stats = if matches.is_present("dry-run") {
        simulate(config, LogPublisher).await?
    } else {
        let publisher = MqttPublisher::connect(&config.broker);
        simulate(config, publisher).await?
    };

    println!(
        "{} Station offline after {} cycles ({} published, {} sensor faults)",
        "🛑".red(),
        stats.cycles,
        stats.readings_published,
        stats.sensor_faults
    );

    Ok(())
}

fn resolve_config(matches: &ArgMatches<'_>) -> Result<StationConfig, ConfigError> {
    let overrides = ConfigOverrides {
        station_id: matches.value_of("station-id").map(str::to_string),
        interval: matches.value_of("interval").map(str::to_string),
        broker_host: matches.value_of("broker").map(str::to_string),
        broker_port: matches.value_of("port").map(str::to_string),
        seed: matches.value_of("seed").map(str::to_string),
    };

    let mut config = StationConfig::from_env()?;
    config.apply_overrides(&overrides)?;
    Ok(config)
}

async fn simulate<P: TelemetryPublisher>(
    config: StationConfig,
    publisher: P,
) -> Result<StationStats, StationError> {
    let rng = match config.seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    };

    let mut station = WeatherStation::new(config, publisher, SystemClock, rng);
    let stats = station.run().await?;

    if let Err(e) = station.publisher_mut().close().await {
        info!("Publisher did not close cleanly: {}", e);
    }

    Ok(stats)
}

fn print_banner(config: &StationConfig, dry_run: bool) {
    println!("{}", "🌦️  Weather Station Simulator".bright_blue().bold());
    println!("{}", "=============================".bright_blue());
    println!("{} {}", "Station:".bright_white(), config.station_id.as_str().bright_cyan());
    println!("{} {}s", "Interval:".bright_white(), config.interval.as_secs());
    println!("{} {}", "Topic:".bright_white(), config.topic);
    if dry_run {
        println!("{} {}", "Broker:".bright_white(), "dry run, nothing is sent".yellow());
    } else {
        println!("{} {}", "Broker:".bright_white(), config.broker_address());
    }
    if let Some(seed) = config.seed {
        println!("{} {}", "Seed:".bright_white(), seed);
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use route_radar_transit::FeedFormat;

/// CTA bus stop / transfer listing
pub const CTA_FEED_URL: &str = "https://www.transitchicago.com/downloads/sch_data/CTA_STOP_XFERS.txt";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Default radius must be a positive number of meters, got {0}")]
    InvalidRadius(f64),

    #[error("Feed columns must be distinct: {0}")]
    OverlappingColumns(String),
}

/// Serve nearby transit routes from a periodically refreshed stop feed
#[derive(Debug, Clone, Parser)]
#[command(name = "route-radar", version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "ROUTE_RADAR_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Stop feed URL
    #[arg(long, env = "ROUTE_RADAR_FEED_URL", default_value = CTA_FEED_URL)]
    pub feed_url: String,

    /// Read the feed from a local file instead of the URL
    #[arg(long, env = "ROUTE_RADAR_FEED_FILE")]
    pub feed_file: Option<PathBuf>,

    #[arg(long, env = "ROUTE_RADAR_FETCH_TIMEOUT_SECS", default_value_t = 15)]
    pub fetch_timeout_secs: u64,

    /// Age after which the index is refreshed in the background
    #[arg(long, env = "ROUTE_RADAR_MAX_STALENESS_SECS", default_value_t = 3600)]
    pub max_staleness_secs: u64,

    /// How long a query may wait for the very first load
    #[arg(long, env = "ROUTE_RADAR_FIRST_LOAD_TIMEOUT_SECS", default_value_t = 30)]
    pub first_load_timeout_secs: u64,

    #[arg(long, env = "ROUTE_RADAR_DEFAULT_RADIUS_METERS", default_value_t = 500.0)]
    pub default_radius_meters: f64,

    /// Start loading the feed at startup rather than on the first query
    #[arg(long, env = "ROUTE_RADAR_WARM_UP", default_value_t = true, action = ArgAction::Set)]
    pub warm_up: bool,

    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    #[arg(long, default_value_t = 0)]
    pub route_column: usize,

    #[arg(long, default_value = "3")]
    pub stop_column: Option<usize>,

    /// The feed has no stop id column
    #[arg(long, env = "ROUTE_RADAR_NO_STOP_COLUMN", conflicts_with = "stop_column")]
    pub no_stop_column: bool,

    #[arg(long, default_value_t = 4)]
    pub latitude_column: usize,

    #[arg(long, default_value_t = 5)]
    pub longitude_column: usize,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("fetch timeout", self.fetch_timeout_secs),
            ("first load timeout", self.first_load_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }

        if self.default_radius_meters <= 0.0 || !self.default_radius_meters.is_finite() {
            return Err(ConfigError::InvalidRadius(self.default_radius_meters));
        }

        let format = self.feed_format();
        let mut columns = vec![
            ("route", format.route_column),
            ("latitude", format.latitude_column),
            ("longitude", format.longitude_column),
        ];
        columns.extend(format.stop_column.map(|c| ("stop", c)));
        for (i, (a, ca)) in columns.iter().enumerate() {
            if let Some((b, _)) = columns[i + 1..].iter().find(|(_, cb)| cb == ca) {
                return Err(ConfigError::OverlappingColumns(format!(
                    "{a} and {b} both use column {ca}"
                )));
            }
        }

        Ok(())
    }

    pub fn feed_format(&self) -> FeedFormat {
        FeedFormat {
            delimiter: self.delimiter,
            route_column: self.route_column,
            stop_column: self.stop_column.filter(|_| !self.no_stop_column),
            latitude_column: self.latitude_column,
            longitude_column: self.longitude_column,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn max_staleness(&self) -> Duration {
        Duration::from_secs(self.max_staleness_secs)
    }

    pub fn first_load_timeout(&self) -> Duration {
        Duration::from_secs(self.first_load_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_radar_transit::parse_line;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("route-radar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_match_cta_feed() {
        let config = parse(&[]);

        assert_eq!(config.feed_url, CTA_FEED_URL);
        assert_eq!(config.feed_format(), FeedFormat::CTA_STOP_TRANSFERS);
        assert_eq!(config.default_radius_meters, 500.0);
        assert!(config.warm_up);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--bind",
            "0.0.0.0:9000",
            "--feed-file",
            "/tmp/stops.txt",
            "--latitude-column",
            "3",
            "--longitude-column",
            "4",
            "--stop-column",
            "7",
            "--warm-up",
            "false",
            "--max-staleness-secs",
            "60",
        ]);

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.feed_file, Some(PathBuf::from("/tmp/stops.txt")));
        assert_eq!(config.feed_format().latitude_column, 3);
        assert_eq!(config.feed_format().stop_column, Some(7));
        assert_eq!(config.max_staleness(), Duration::from_secs(60));
        assert!(!config.warm_up);
    }

    #[test]
    fn test_validation() {
        let config = parse(&["--fetch-timeout-secs", "0"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("fetch timeout"))
        );

        let config = parse(&["--default-radius-meters=-1"]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRadius(_))));

        let config = parse(&["--latitude-column", "3"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OverlappingColumns(_))
        ));
    }

    #[test]
    fn test_feed_without_stop_column() {
        let config = parse(&[
            "--latitude-column",
            "3",
            "--longitude-column",
            "4",
            "--no-stop-column",
        ]);

        let format = config.feed_format();
        assert_eq!(format.stop_column, None);
        assert_eq!(config.validate(), Ok(()));

        let record = parse_line("146,X,Y,41.8800,-87.6300", &format).unwrap();
        assert_eq!(record.route_id.as_str(), "146");
        assert_eq!(record.stop_id, None);
        assert_eq!(record.coordinate.latitude(), 41.88);
    }

    #[test]
    fn test_stop_column_flags_conflict() {
        let result = Config::try_parse_from([
            "route-radar",
            "--stop-column",
            "2",
            "--no-stop-column",
        ]);
        assert!(result.is_err());
    }
}

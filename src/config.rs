/*
 *  config.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  YAML configuration layered under command line overrides
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::display::brightness::{DEFAULT_HUE, DEFAULT_LEVEL};
use crate::display::frame::{LOGO_LEDS, MATRIX_HEIGHT, MATRIX_WIDTH};

pub const DEFAULT_BANNER_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_BANNER_SPEED: f64 = 0.005;
pub const DEFAULT_WEATHER_INTERVAL_SECS: u64 = 1200;
pub const DEFAULT_WEATHER_DURATION_SECS: u64 = 10;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration. Every field is optional so files and CLI
/// flags can be layered; accessors fill in the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub display: Option<DisplayConfig>,
    pub banner: Option<BannerConfig>,
    pub weather: Option<WeatherConfig>,
    /// drive now-playing and weather from synthetic feeds
    pub demo: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    pub driver: Option<DriverKind>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub logo_leds: Option<u32>,
    pub brightness: Option<u8>,     // 0-255
    pub hue: Option<u8>,            // 0 warm .. 255 white
    pub time_of_day: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BannerConfig {
    pub timeout_secs: Option<u64>,
    pub speed: Option<f64>,         // pixels per millisecond
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WeatherConfig {
    pub interval_secs: Option<u64>,
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// headless, records frames
    Mock,
    /// ANSI true colour emulation in the terminal
    #[default]
    Console,
}

impl DisplayConfig {
    /// (width, height, logo LEDs) with defaults applied.
    pub fn geometry(&self) -> (u32, u32, u32) {
        (
            self.width.unwrap_or(MATRIX_WIDTH),
            self.height.unwrap_or(MATRIX_HEIGHT),
            self.logo_leds.unwrap_or(LOGO_LEDS),
        )
    }

    pub fn brightness(&self) -> u8 { self.brightness.unwrap_or(DEFAULT_LEVEL) }
    pub fn hue(&self) -> u8 { self.hue.unwrap_or(DEFAULT_HUE) }
    pub fn time_of_day(&self) -> bool { self.time_of_day.unwrap_or(true) }
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn display(&self) -> DisplayConfig {
        self.display.clone().unwrap_or_default()
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_secs(
            self.banner.as_ref().and_then(|b| b.timeout_secs).unwrap_or(DEFAULT_BANNER_TIMEOUT_SECS),
        )
    }

    pub fn banner_speed(&self) -> f64 {
        self.banner.as_ref().and_then(|b| b.speed).unwrap_or(DEFAULT_BANNER_SPEED)
    }

    pub fn weather_interval(&self) -> Duration {
        Duration::from_secs(
            self.weather.as_ref().and_then(|w| w.interval_secs).unwrap_or(DEFAULT_WEATHER_INTERVAL_SECS),
        )
    }

    pub fn weather_duration(&self) -> Duration {
        Duration::from_secs(
            self.weather.as_ref().and_then(|w| w.duration_secs).unwrap_or(DEFAULT_WEATHER_DURATION_SECS),
        )
    }

    pub fn demo(&self) -> bool {
        self.demo.unwrap_or(false)
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "spotiled", about = "SpotiLED matrix driver", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long, value_enum)]
    pub driver: Option<DriverKind>,
    #[arg(long)]
    pub brightness: Option<u8>,
    #[arg(long)]
    pub hue: Option<u8>,
    /// banner shown at start, may be repeated
    #[arg(long = "text", value_name = "TEXT")]
    pub text: Vec<String>,
    /// synthetic now-playing and weather feeds
    #[arg(long, action = ArgAction::SetTrue)]
    pub demo: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge, apply `cli`, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of the effective config (for --dump-config).
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/spotiled/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/spotiled/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/spotiled.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["spotiled.yaml", "config.yaml", "config/spotiled.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.demo.is_some()           { dst.demo = src.demo; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
    match (&mut dst.banner, src.banner) {
        (None, Some(c)) => dst.banner = Some(c),
        (Some(d), Some(s)) => {
            if s.timeout_secs.is_some() { d.timeout_secs = s.timeout_secs; }
            if s.speed.is_some()        { d.speed = s.speed; }
        }
        _ => {}
    }
    match (&mut dst.weather, src.weather) {
        (None, Some(c)) => dst.weather = Some(c),
        (Some(d), Some(s)) => {
            if s.interval_secs.is_some() { d.interval_secs = s.interval_secs; }
            if s.duration_secs.is_some() { d.duration_secs = s.duration_secs; }
        }
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.driver.is_some()      { dst.driver = src.driver; }
    if src.width.is_some()       { dst.width = src.width; }
    if src.height.is_some()      { dst.height = src.height; }
    if src.logo_leds.is_some()   { dst.logo_leds = src.logo_leds; }
    if src.brightness.is_some()  { dst.brightness = src.brightness; }
    if src.hue.is_some()         { dst.hue = src.hue; }
    if src.time_of_day.is_some() { dst.time_of_day = src.time_of_day; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()  { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                { cfg.log_level = Some("debug".to_string()); }
    if cli.demo                 { cfg.demo = Some(true); }

    let any_display = cli.driver.is_some() || cli.brightness.is_some() || cli.hue.is_some();
    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplayConfig::default());
    }
    if let Some(display) = cfg.display.as_mut() {
        if cli.driver.is_some()      { display.driver = cli.driver; }
        if cli.brightness.is_some()  { display.brightness = cli.brightness; }
        if cli.hue.is_some()         { display.hue = cli.hue; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        let (w, h, logo) = display.geometry();
        if !(1..=256).contains(&w) || !(1..=256).contains(&h) {
            return Err(ConfigError::Validation("display width/height must be 1..=256".into()));
        }
        if logo > 256 {
            return Err(ConfigError::Validation("display logo_leds must be <= 256".into()));
        }
    }
    if let Some(speed) = cfg.banner.as_ref().and_then(|b| b.speed) {
        if !(speed > 0.0) {
            return Err(ConfigError::Validation("banner speed must be > 0".into()));
        }
    }
    if cfg.weather.as_ref().and_then(|w| w.duration_secs) == Some(0) {
        return Err(ConfigError::Validation("weather duration_secs must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn yaml_file(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    fn cli_for(file: &tempfile::NamedTempFile) -> Cli {
        Cli { config: Some(file.path().to_path_buf()), ..Default::default() }
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.log_level(), "info");
        assert_eq!(cfg.display().geometry(), (23, 16, 19));
        assert_eq!(cfg.display().brightness(), 0x3F);
        assert_eq!(cfg.display().hue(), 0xFF);
        assert!(cfg.display().time_of_day());
        assert_eq!(cfg.banner_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.banner_speed(), 0.005);
        assert_eq!(cfg.weather_interval(), Duration::from_secs(1200));
        assert!(!cfg.demo());
    }

    #[test]
    fn test_yaml_then_cli() {
        let file = yaml_file(
            "log_level: warn\ndisplay:\n  driver: mock\n  brightness: 10\n  time_of_day: false\nbanner:\n  timeout_secs: 9\n",
        );
        let mut cli = cli_for(&file);
        cli.brightness = Some(200);
        cli.debug = true;

        let cfg = load(&cli).unwrap();
        assert_eq!(cfg.log_level(), "debug");
        let display = cfg.display();
        assert_eq!(display.driver, Some(DriverKind::Mock));
        assert_eq!(display.brightness(), 200);
        assert!(!display.time_of_day());
        assert_eq!(cfg.banner_timeout(), Duration::from_secs(9));
        assert_eq!(cfg.banner_speed(), DEFAULT_BANNER_SPEED);
    }

    #[test]
    fn test_missing_explicit_file() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/spotiled.yaml")), ..Default::default() };
        assert!(matches!(load(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_bad_yaml() {
        let file = yaml_file("display: [1, 2");
        assert!(matches!(load(&cli_for(&file)), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_validation() {
        let file = yaml_file("display:\n  width: 0\n");
        assert!(matches!(load(&cli_for(&file)), Err(ConfigError::Validation(_))));
        let file = yaml_file("banner:\n  speed: 0\n");
        assert!(load(&cli_for(&file)).is_err());
        let file = yaml_file("weather:\n  duration_secs: 0\n");
        assert!(load(&cli_for(&file)).is_err());
    }

    #[test]
    fn test_merge_is_option_by_option() {
        let mut dst = Config {
            display: Some(DisplayConfig { width: Some(30), hue: Some(1), ..Default::default() }),
            ..Default::default()
        };
        merge(&mut dst, Config {
            display: Some(DisplayConfig { hue: Some(2), ..Default::default() }),
            demo: Some(true),
            ..Default::default()
        });
        let display = dst.display();
        assert_eq!(display.width, Some(30));
        assert_eq!(display.hue, Some(2));
        assert!(dst.demo());
    }

    #[test]
    fn test_cli_parse_and_dump() {
        let cli = Cli::parse_from(["spotiled", "--driver", "mock", "--text", "a", "--text", "b", "--demo"]);
        assert_eq!(cli.text, vec!["a", "b"]);
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.display().driver, Some(DriverKind::Mock));
        assert!(cfg.demo());
        let yaml = dump(&cfg).unwrap();
        assert!(yaml.contains("driver: mock"));
    }
}

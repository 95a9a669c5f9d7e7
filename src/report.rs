//! Console and JSON rendering of tick outcomes.

use crate::controller::{TickOutcome, TickReporter};
use crate::ranker::Alert;
use crate::satellite::{SatelliteSnapshot, SatelliteStatus};
use arrayvec::ArrayString;
use colored::{ColoredString, Colorize};
use std::str::FromStr;
use tracing::warn;

pub const BAR_WIDTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Compact,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "compact" => Ok(OutputFormat::Compact),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format `{other}`")),
        }
    }
}

/// One `#` per percent of capacity, padded with `.` to [`BAR_WIDTH`].
pub fn progress_bar(energy_percent: f64) -> ArrayString<BAR_WIDTH> {
    let filled = energy_percent.clamp(0.0, 100.0) as usize;
    let mut bar = ArrayString::new();
    for i in 0..BAR_WIDTH {
        bar.push(if i < filled { '#' } else { '.' });
    }
    bar
}

/// Human-readable status; shortage notices are expressed in simulated seconds.
pub fn status_label(status: SatelliteStatus, tick_seconds: f64) -> String {
    match status {
        SatelliteStatus::Waiting { steps_until_failure } => format!(
            "energy shortage in approx. {} sec",
            f64::from(steps_until_failure) * tick_seconds
        ),
        other => other.to_string(),
    }
}

fn colorize_status(status: SatelliteStatus, label: &str) -> ColoredString {
    match status {
        SatelliteStatus::Critical | SatelliteStatus::Alert => label.bright_red().bold(),
        SatelliteStatus::Waiting { .. } => label.yellow(),
        SatelliteStatus::TravelingToDock => label.cyan(),
        SatelliteStatus::Charging => label.bright_blue(),
        SatelliteStatus::Charged => label.green(),
        SatelliteStatus::Idle => label.white(),
    }
}

pub fn alert_line(alert: &Alert, tick_seconds: f64) -> String {
    let sat = &alert.satellite;
    format!(
        "ALERT: {} energy={:.1}% | status={} | distance={} km | priority={}",
        sat.id,
        sat.energy_percent(),
        status_label(sat.status, tick_seconds),
        sat.distance_to_station,
        alert.priority
    )
}

pub fn satellite_line(sat: &SatelliteSnapshot, tick_seconds: f64) -> String {
    format!(
        "{} [{}] {:.1}% | {} | distance={} km",
        sat.id,
        progress_bar(sat.energy_percent()),
        sat.energy_percent(),
        status_label(sat.status, tick_seconds),
        sat.distance_to_station
    )
}

pub fn compact_line(outcome: &TickOutcome) -> String {
    let dock = outcome.dock_occupant.as_deref().unwrap_or("free");
    let fleet: Vec<String> = outcome
        .snapshot
        .iter()
        .map(|s| format!("{} {:.0}% {}", s.id, s.energy_percent(), s.status))
        .collect();
    format!(
        "tick {} | dock={} | alerts={} | {}",
        outcome.tick,
        dock,
        outcome.alerts.len(),
        fleet.join(" | ")
    )
}

/// Prints each tick to stdout in the chosen format.
#[derive(Debug)]
pub struct ConsoleReporter {
    format: OutputFormat,
    tick_seconds: f64,
}

impl ConsoleReporter {
    pub fn new(format: OutputFormat, tick_seconds: f64) -> Self {
        Self {
            format,
            tick_seconds,
        }
    }

    fn print_table(&self, outcome: &TickOutcome) {
        let when = outcome
            .timestamp
            .map_or_else(|| "no telemetry".to_string(), |t| format!("t={t}"));
        println!(
            "\n{}",
            format!("=== TICK #{} ({}) ===", outcome.tick, when).bright_blue().bold()
        );

        println!("{}", "ALERTS:".bright_white().bold());
        for alert in &outcome.alerts {
            let line = alert_line(alert, self.tick_seconds);
            println!("  {}", colorize_status(alert.satellite.status, &line));
        }

        println!("{}", "OPERATIONS:".bright_white().bold());
        for transition in &outcome.transitions {
            println!(
                "  {} {}: {} -> {}",
                "⚓".bright_cyan(),
                transition.satellite_id.bright_white(),
                transition.from,
                colorize_status(transition.to, &transition.to.to_string())
            );
            if transition.is_release() {
                println!("  {} is leaving the dock!", transition.satellite_id.bright_green());
            }
        }
        for waiting in &outcome.waiting {
            println!(
                "  {} | waiting for docking (energy={:.1}%)",
                waiting.id,
                waiting.energy_percent()
            );
        }
        for skipped in &outcome.skipped {
            println!("  {} skipped {} at t={}: {}", "⚠".yellow(), skipped.id, skipped.time, skipped.reason);
        }

        for sat in &outcome.snapshot {
            let line = satellite_line(sat, self.tick_seconds);
            println!("{}", colorize_status(sat.status, &line));
        }
        println!("{}", "-".repeat(65));
    }
}

impl TickReporter for ConsoleReporter {
    fn report(&mut self, outcome: &TickOutcome) {
        match self.format {
            OutputFormat::Table => self.print_table(outcome),
            OutputFormat::Compact => println!("{}", compact_line(outcome)),
            OutputFormat::Json => match serde_json::to_string(outcome) {
                Ok(json) => println!("{json}"),
                Err(e) => warn!("Failed to encode tick {}: {}", outcome.tick, e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, energy: f64, status: SatelliteStatus) -> SatelliteSnapshot {
        SatelliteSnapshot {
            id: id.to_string(),
            energy,
            capacity: 100.0,
            distance_to_station: 20.0,
            status,
            priority: 1,
        }
    }

    #[test]
    fn test_progress_bar_width_and_fill() {
        let bar = progress_bar(42.7);
        assert_eq!(bar.len(), BAR_WIDTH);
        assert_eq!(bar.chars().filter(|c| *c == '#').count(), 42);

        assert_eq!(progress_bar(150.0).chars().filter(|c| *c == '#').count(), BAR_WIDTH);
        assert_eq!(progress_bar(-3.0).chars().filter(|c| *c == '#').count(), 0);
    }

    #[test]
    fn test_shortage_label_in_seconds() {
        let label = status_label(SatelliteStatus::Waiting { steps_until_failure: 3 }, 2.0);
        assert_eq!(label, "energy shortage in approx. 6 sec");
        assert_eq!(status_label(SatelliteStatus::Charging, 1.0), "charging");
    }

    #[test]
    fn test_alert_line_contents() {
        let alert = Alert {
            priority: 1,
            satellite: snapshot("SAT-7", 12.5, SatelliteStatus::Alert),
        };
        let line = alert_line(&alert, 1.0);
        assert!(line.starts_with("ALERT: SAT-7 energy=12.5%"));
        assert!(line.contains("status=ALERT"));
        assert!(line.contains("distance=20 km"));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_compact_line() {
        let outcome = TickOutcome {
            tick: 4,
            timestamp: Some(9),
            alerts: Vec::new(),
            snapshot: vec![snapshot("A", 50.0, SatelliteStatus::Charging)],
            transitions: Vec::new(),
            waiting: Vec::new(),
            skipped: Vec::new(),
            dock_occupant: Some("A".to_string()),
        };
        assert_eq!(compact_line(&outcome), "tick 4 | dock=A | alerts=0 | A 50% charging");
    }
}

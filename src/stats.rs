//! Connection statistics
//!
//! Records when each client connected and dumps an aligned table at shutdown.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

const HEADERS: [&str; 4] = ["Serial No", "Client Address", "Connection Time", "Uptime (s)"];

#[derive(Debug, Clone, Copy)]
struct ConnectionInfo {
    connected_at: SystemTime,
    since: Instant,
}

/// Per-address connection registry
///
/// Entries are added on accept. The server never removes them, so the
/// shutdown table lists every client seen since startup.
#[derive(Debug, Default)]
pub struct Statistics {
    connections: RwLock<HashMap<String, ConnectionInfo>>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection from `address`, stamped with the current time
    pub fn add_connection(&self, address: &str) {
        let info = ConnectionInfo {
            connected_at: SystemTime::now(),
            since: Instant::now(),
        };
        self.connections.write().insert(address.to_string(), info);
    }

    /// Forget a connection; returns whether it was known
    pub fn remove_connection(&self, address: &str) -> bool {
        self.connections.write().remove(address).is_some()
    }

    /// Time since `address` connected
    pub fn uptime(&self, address: &str) -> Option<Duration> {
        self.connections
            .read()
            .get(address)
            .map(|info| info.since.elapsed())
    }

    /// Number of recorded connections
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Recorded connections, oldest first
    pub fn connections(&self) -> Vec<(String, SystemTime)> {
        let mut connections: Vec<(String, SystemTime)> = self
            .connections
            .read()
            .iter()
            .map(|(address, info)| (address.clone(), info.connected_at))
            .collect();
        connections.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        connections
    }

    /// Render the statistics table to `out`
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let rows = self.rows();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let border = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        let border = format!("+{}+", border);

        writeln!(out, "{}", border)?;
        write_row(out, &HEADERS.map(str::to_string), &widths)?;
        writeln!(out, "{}", border)?;
        for row in &rows {
            write_row(out, row, &widths)?;
        }
        writeln!(out, "{}", border)?;
        out.flush()
    }

    /// Dump the table to standard output
    pub fn display(&self) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = self.render(&mut out) {
            tracing::warn!("Failed to write statistics table: {}", e);
        }
    }

    fn rows(&self) -> Vec<[String; 4]> {
        let guard = self.connections.read();
        let mut entries: Vec<(&String, &ConnectionInfo)> = guard.iter().collect();
        entries.sort_by(|a, b| a.1.connected_at.cmp(&b.1.connected_at).then_with(|| a.0.cmp(b.0)));

        entries
            .into_iter()
            .enumerate()
            .map(|(serial, (address, info))| {
                [
                    serial.to_string(),
                    address.clone(),
                    format_rfc3339(info.connected_at),
                    format!("{:.2}", info.since.elapsed().as_secs_f64()),
                ]
            })
            .collect()
    }
}

/// Format a timestamp as RFC 3339 in UTC, to whole seconds
///
/// Times before the Unix epoch are clamped to it.
pub fn format_rfc3339(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

// Days since 1970-01-01 to (year, month, day) in the proleptic Gregorian calendar
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn write_row<W: Write>(out: &mut W, cells: &[String; 4], widths: &[usize; 4]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
        .collect::<Vec<_>>()
        .join("|");
    writeln!(out, "|{}|", line)
}

//! Output formatting for shell commands.
//!
//! Every view renders either as a human-readable table or as JSON. Progress
//! bars only appear in table output.

use std::io::Write;

use claw_probe::{CpuInfo, Interfaces, RamUsage, WorkLoad};
use serde::Serialize;

use crate::cli::Format;
use crate::error::ShellError;

/// Progress bar rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarStyle {
    /// Character used for the filled part.
    pub fill: char,
    /// Width of the bar between the brackets.
    pub width: usize,
}

impl BarStyle {
    /// Create a bar style.
    #[must_use]
    pub const fn new(fill: char, width: usize) -> Self {
        Self { fill, width }
    }
}

impl Default for BarStyle {
    fn default() -> Self {
        Self::new('#', 50)
    }
}

/// Render a percentage as `[###   ] `.
///
/// # Errors
///
/// Returns [`ShellError::Format`] if `percent` is not a finite value in
/// `[0, 100]`.
pub fn progress_bar(percent: f64, style: BarStyle) -> Result<String, ShellError> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ShellError::Format(format!(
            "percentage out of range: {percent}"
        )));
    }
    let filled = ((percent * style.width as f64 / 100.0).round() as usize).min(style.width);
    let mut bar = String::with_capacity(style.width + 3);
    bar.push('[');
    bar.extend(std::iter::repeat_n(style.fill, filled));
    bar.extend(std::iter::repeat_n(' ', style.width - filled));
    bar.push_str("] ");
    Ok(bar)
}

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormat {
    format: Format,
    bar: BarStyle,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format, bar: BarStyle) -> Self {
        Self { format, bar }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), ShellError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer(&mut *writer, value)
                    .map_err(|e| ShellError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer, self.bar)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, ShellError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| ShellError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table, BarStyle::default())
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as human-readable text.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or a bar cannot be rendered.
    fn write_table<W: Write>(&self, writer: &mut W, bar: BarStyle) -> Result<(), ShellError>;
}

/// A single line of text.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W, _bar: BarStyle) -> Result<(), ShellError> {
        writeln!(writer, "{}", self.message)?;
        Ok(())
    }
}

/// One row of `list-nodes`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRow {
    /// Display name.
    pub name: String,
    /// Node ID.
    pub id: String,
    /// Operating system.
    pub os: String,
    /// Total cores.
    pub cores: u32,
}

/// All known nodes.
#[derive(Debug, Clone, Serialize)]
pub struct NodeList {
    /// Nodes in ascending ID order.
    pub nodes: Vec<NodeRow>,
}

impl TableDisplay for NodeList {
    fn write_table<W: Write>(&self, writer: &mut W, _bar: BarStyle) -> Result<(), ShellError> {
        if self.nodes.is_empty() {
            writeln!(writer, "no nodes available")?;
            return Ok(());
        }

        for node in &self.nodes {
            writeln!(
                writer,
                "{:<24}  {:<12}  {:>5}  {}",
                truncate(&node.name, 24),
                truncate(&node.os, 12),
                node.cores,
                node.id
            )?;
        }
        Ok(())
    }
}

/// Current node.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    /// Display name.
    pub name: String,
    /// Node ID.
    pub id: String,
}

impl TableDisplay for Location {
    fn write_table<W: Write>(&self, writer: &mut W, _bar: BarStyle) -> Result<(), ShellError> {
        writeln!(writer, "{}", self.name)?;
        Ok(())
    }
}

/// Load of one node.
#[derive(Debug, Clone, Serialize)]
pub struct WorkLoadView {
    /// Running processes.
    pub num_processes: u32,
    /// Running actors.
    pub num_actors: u32,
    /// CPU load in percent.
    pub cpu_load_percent: f64,
}

impl From<WorkLoad> for WorkLoadView {
    fn from(wl: WorkLoad) -> Self {
        Self {
            num_processes: wl.num_processes,
            num_actors: wl.num_actors,
            cpu_load_percent: wl.cpu_load_percent,
        }
    }
}

impl TableDisplay for WorkLoadView {
    fn write_table<W: Write>(&self, writer: &mut W, bar: BarStyle) -> Result<(), ShellError> {
        let gauge = progress_bar(self.cpu_load_percent, bar)?;
        writeln!(writer, "{:>20}{:>3}", "Processes: ", self.num_processes)?;
        writeln!(writer, "{:>20}{:>3}", "Actors: ", self.num_actors)?;
        writeln!(writer, "CPU: {gauge}{:.0}%", self.cpu_load_percent)?;
        Ok(())
    }
}

/// Memory usage of one node.
#[derive(Debug, Clone, Serialize)]
pub struct RamUsageView {
    /// Bytes in use.
    pub bytes_in_use: u64,
    /// Bytes available in total.
    pub bytes_available: u64,
    /// Share in use; absent when nothing is available.
    pub used_percent: Option<f64>,
}

impl From<RamUsage> for RamUsageView {
    fn from(ru: RamUsage) -> Self {
        Self {
            bytes_in_use: ru.bytes_in_use,
            bytes_available: ru.bytes_available,
            used_percent: ru.used_percent(),
        }
    }
}

impl TableDisplay for RamUsageView {
    fn write_table<W: Write>(&self, writer: &mut W, bar: BarStyle) -> Result<(), ShellError> {
        let gauge = match self.used_percent {
            Some(percent) => progress_bar(percent, bar)?,
            None => "n/a ".to_string(),
        };
        writeln!(
            writer,
            "RAM: {gauge}{}/{}",
            self.bytes_in_use, self.bytes_available
        )?;
        Ok(())
    }
}

/// Node info plus whatever telemetry is available.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatistics {
    /// Node ID.
    pub id: String,
    /// Host name.
    pub hostname: String,
    /// Operating system.
    pub os: String,
    /// CPU packages.
    pub cpu: Vec<CpuInfo>,
    /// Load, if reported yet.
    pub work_load: Option<WorkLoadView>,
    /// Memory usage, if reported yet.
    pub ram_usage: Option<RamUsageView>,
}

impl TableDisplay for NodeStatistics {
    fn write_table<W: Write>(&self, writer: &mut W, bar: BarStyle) -> Result<(), ShellError> {
        writeln!(writer, "{:>21}{}", "Node-ID:  ", self.id)?;
        writeln!(writer, "{:>21}{}", "Hostname:  ", self.hostname)?;
        writeln!(writer, "{:>21}{}", "Operating system:  ", self.os)?;
        writeln!(
            writer,
            "{:>20}{:>3}{:>10}{:>12}",
            "CPU statistics: ", "#", "Core No", "MHz/Core"
        )?;
        for (idx, cpu) in self.cpu.iter().enumerate() {
            writeln!(
                writer,
                "{idx:>23}{:>10}{:>12}",
                cpu.core_count, cpu.mhz_per_core
            )?;
        }

        match &self.work_load {
            Some(wl) => write_field(writer, "work load", wl, bar)?,
            None => writeln!(writer, "No work load statistics available for node")?,
        }
        match &self.ram_usage {
            Some(ru) => write_field(writer, "ram usage", ru, bar)?,
            None => writeln!(writer, "No ram usage statistics available for node")?,
        }
        Ok(())
    }
}

/// Render one field of a composite view. A field that cannot be rendered is
/// replaced by its error line; only write failures propagate.
fn write_field<W: Write, T: TableDisplay>(
    writer: &mut W,
    label: &str,
    field: &T,
    bar: BarStyle,
) -> Result<(), ShellError> {
    let mut buf = Vec::new();
    match field.write_table(&mut buf, bar) {
        Ok(()) => writer.write_all(&buf)?,
        Err(e @ ShellError::Io(_)) => return Err(e),
        Err(e) => writeln!(writer, "{label}: {e}")?,
    }
    Ok(())
}

/// Network interfaces of one node.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceList {
    /// Interface name, protocol and addresses.
    pub interfaces: Interfaces,
}

impl TableDisplay for InterfaceList {
    fn write_table<W: Write>(&self, writer: &mut W, _bar: BarStyle) -> Result<(), ShellError> {
        if self.interfaces.is_empty() {
            writeln!(writer, "no interfaces known")?;
            return Ok(());
        }
        for (name, protocols) in &self.interfaces {
            writeln!(writer, "{name}:")?;
            for (protocol, addresses) in protocols {
                for address in addresses {
                    writeln!(writer, "    {protocol} {address}")?;
                }
            }
        }
        Ok(())
    }
}

/// Direct routes of one node.
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    /// Display name of the reporting node.
    pub node: String,
    /// Display names of its neighbours.
    pub neighbours: Vec<String>,
}

/// Direct routes of several nodes.
#[derive(Debug, Clone, Serialize)]
pub struct RouteList {
    /// One entry per node.
    pub routes: Vec<RouteEntry>,
}

impl TableDisplay for RouteList {
    fn write_table<W: Write>(&self, writer: &mut W, _bar: BarStyle) -> Result<(), ShellError> {
        if self.routes.is_empty() {
            writeln!(writer, "no routes known")?;
            return Ok(());
        }
        for entry in &self.routes {
            writeln!(writer, "{} ->", entry.node)?;
            for neighbour in &entry.neighbours {
                writeln!(writer, " {neighbour}")?;
            }
        }
        Ok(())
    }
}

/// One known actor.
#[derive(Debug, Clone, Serialize)]
pub struct ActorEntry {
    /// Actor ID.
    pub id: String,
    /// Actor name.
    pub name: String,
}

/// Known actors of one node.
#[derive(Debug, Clone, Serialize)]
pub struct ActorList {
    /// Actors sorted by ID.
    pub actors: Vec<ActorEntry>,
}

impl ActorList {
    /// Parse a `<id> <name>` listing.
    #[must_use]
    pub fn from_listing(listing: &str) -> Self {
        let actors = listing
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let (id, name) = line.split_once(' ').unwrap_or((line, ""));
                ActorEntry {
                    id: id.to_string(),
                    name: name.to_string(),
                }
            })
            .collect();
        Self { actors }
    }
}

impl TableDisplay for ActorList {
    fn write_table<W: Write>(&self, writer: &mut W, _bar: BarStyle) -> Result<(), ShellError> {
        if self.actors.is_empty() {
            writeln!(writer, "list-actors: no actors known on this host")?;
            return Ok(());
        }
        for actor in &self.actors {
            writeln!(writer, "{:>6} {}", actor.id, actor.name)?;
        }
        Ok(())
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

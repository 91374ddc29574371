//! Conversion of event files into tables of observables
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;

use crate::classify::{ClassifiedEvent, Role};
use crate::data::{EventRecord, RunInfo};
use crate::observables::{SpinCorrelations, SpinObservables};
use crate::reader::{EventBlock, EventParseError, ReadError, Reader};
use crate::reconstruct::{IncompleteTopology, TopPair};
use crate::row::EventRow;
use crate::writer::{WriteError, Writer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of events between progress reports
pub const PROGRESS_INTERVAL: usize = 1000;

const COMPRESSED_EXTENSION: &str = "gz";

/// Input and output of a conversion run
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Event file in LHEF format, not compressed
    pub input: PathBuf,
    /// Where the table is written
    pub output: PathBuf,
    /// Name of the output table
    pub table: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("random.lhe"),
            output: PathBuf::from("test.tsv"),
            table: String::from("test"),
        }
    }
}

/// Errors that end a conversion run
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open input file {path:?}")]
    Open { path: PathBuf, source: io::Error },
    #[error("Failed to create output file {path:?}")]
    Create { path: PathBuf, source: io::Error },
    #[error("Failed to read events")]
    Read(#[from] ReadError),
    #[error("Failed to write table")]
    Write(#[from] WriteError),
}

/// Reasons to skip a single event
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EventError {
    #[error(transparent)]
    Parse(#[from] EventParseError),
    #[error(transparent)]
    Topology(#[from] IncompleteTopology),
}

/// Event counts of a finished run
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Event blocks read
    pub events: usize,
    /// Rows written
    pub written: usize,
    /// Events skipped because they could not be parsed
    pub malformed: usize,
    /// Events skipped because a top quark could not be reconstructed
    pub incomplete: usize,
    /// Written events with the top along the beam axis
    pub degenerate_basis: usize,
    /// Averages of the cosines over the dileptonic events
    pub spin_correlations: SpinCorrelations,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn skipped(&self) -> usize {
        self.malformed + self.incomplete
    }
}

/// Compute the output row of a single event
pub fn process_event(
    event: &EventRecord,
    run_info: Option<&RunInfo>,
) -> Result<EventRow, IncompleteTopology> {
    let classified = ClassifiedEvent::new(event);
    for role in Role::ALL {
        let n = classified.multiplicity(role);
        if n > 1 {
            debug!("Found {n} particles with role {role}, keeping the first");
        }
    }
    if !classified.is_final_state() {
        debug!("Event contains intermediate particles with a role in the decay chain");
    }
    let tops = TopPair::reconstruct(&classified)?;
    let leptons = (
        classified.get(Role::LeptonPlus),
        classified.get(Role::LeptonMinus),
    );
    let spin = match leptons {
        (Some(lp), Some(lm)) => Some(SpinObservables::compute(
            &tops.top.p,
            &tops.anti_top.p,
            &lp.four_momentum(),
            &lm.four_momentum(),
        )),
        _ => None,
    };
    Ok(EventRow::new(event, &classified, tops, spin, run_info))
}

/// Parse an event block and compute its output row
pub fn process_block(
    block: EventBlock,
    run_info: Option<&RunInfo>,
) -> Result<EventRow, EventError> {
    let event = block.parse()?;
    Ok(process_event(&event, run_info)?)
}

/// Write one row for each event that can be processed
///
/// Events that cannot be processed are logged and skipped. Errors from
/// the underlying streams end the conversion.
pub fn convert<R: BufRead, W: Write>(
    reader: &mut Reader<R>,
    writer: &mut Writer<W>,
) -> Result<RunSummary, Error> {
    let start = Instant::now();
    let mut summary = RunSummary::default();
    while let Some(block) = reader.next_block()? {
        summary.events += 1;
        match process_block(block, Some(reader.run_info())) {
            Ok(row) => {
                if let Some(spin) = &row.spin {
                    if spin.degenerate_basis {
                        summary.degenerate_basis += 1;
                    }
                    summary.spin_correlations.add(spin);
                }
                writer.write_row(&row)?;
                summary.written += 1;
            }
            Err(err) => {
                warn!("Skipping event {}: {err}", summary.events);
                match err {
                    EventError::Parse(_) => summary.malformed += 1,
                    EventError::Topology(_) => summary.incomplete += 1,
                }
            }
        }
        if summary.events % PROGRESS_INTERVAL == 0 {
            info!(
                "Processed {} events in {:.1?}",
                summary.events,
                start.elapsed()
            );
        }
    }
    summary.elapsed = start.elapsed();
    info!(
        "Processed {} events in {:.1?}: {} written, {} malformed, {} incomplete",
        summary.events, summary.elapsed, summary.written, summary.malformed, summary.incomplete
    );
    if summary.degenerate_basis > 0 {
        info!(
            "{} events with top quarks along the beam axis",
            summary.degenerate_basis
        );
    }
    if let Some(c) = summary.spin_correlations.coefficients() {
        info!(
            "Spin correlations from {} events: C_kk = {:.4}, C_nn = {:.4}, C_rr = {:.4}",
            summary.spin_correlations.events(),
            c.c_kk,
            c.c_nn,
            c.c_rr
        );
    }
    Ok(summary)
}

/// Convert the input file of `config` into a table
pub fn run(config: &Config) -> Result<RunSummary, Error> {
    if config
        .input
        .extension()
        .map_or(false, |ext| ext == COMPRESSED_EXTENSION)
    {
        return Err(ReadError::Compressed.into());
    }
    info!("Reading events from {:?}", config.input);
    let input = File::open(&config.input).map_err(|source| Error::Open {
        path: config.input.clone(),
        source,
    })?;
    let mut reader = Reader::new(BufReader::new(input))?;
    let output = File::create(&config.output).map_err(|source| Error::Create {
        path: config.output.clone(),
        source,
    })?;
    let mut writer = Writer::new(BufWriter::new(output), &config.table)?;
    let summary = convert(&mut reader, &mut writer)?;
    writer.finish()?;
    info!("Wrote table '{}' to {:?}", config.table, config.output);
    Ok(summary)
}

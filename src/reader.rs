use std::fmt::Display;
use std::io::BufRead;
use std::str::FromStr;

use log::{debug, warn};
use thiserror::Error;

use crate::data::*;
use crate::tags::*;

pub type XmlTree = xmltree::Element;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const SUPPORTED_VERSIONS: [&str; 3] = ["1.0", "2.0", "3.0"];
const PARTICLE_LINE_ENTRIES: usize = 13;

/// Reader for the LHEF format
#[derive(Debug)]
pub struct Reader<T> {
    stream: T,
    version: &'static str,
    header: String,
    xml_header: Option<XmlTree>,
    run_info: RunInfo,
}

/// Errors that make the remaining input unreadable
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Input is gzip-compressed, decompress it first")]
    Compressed,
    #[error("First line '{0}' in input does not start with '{}'", LHEF_TAG_OPEN)]
    BadFirstLine(String),
    #[error(
        "Encountered unrecognized line '{0}', expected a header starting with '{}', '{}', \
         or the init block starting with '{}'",
        COMMENT_START, HEADER_START, INIT_START
    )]
    BadHeaderStart(String),
    #[error("Encountered malformed xml tag: '{0}'")]
    BadXmlTag(String),
    #[error("Missing entry '{0}'")]
    MissingEntry(String),
    #[error("Failed to convert '{entry}' to a number for {name}")]
    ConversionError { name: String, entry: String },
    #[error("Unsupported version {0}, only 1.0, 2.0, 3.0 are supported")]
    UnsupportedVersion(String),
    #[error("Version information missing")]
    MissingVersion,
    #[error("Encountered '{0}' block without closing tag")]
    EndOfFile(&'static str),
    #[error("Failed to read input")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Event(#[from] EventParseError),
}

/// Errors confined to a single event block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("Event block contains no data")]
    Empty,
    #[error("Malformed event tag '{0}'")]
    MalformedTag(String),
    #[error("Event block is not valid UTF-8 after byte {0}")]
    InvalidUtf8(usize),
    #[error("Malformed event header '{line}': {reason}")]
    MalformedHeader { line: String, reason: String },
    #[error("Malformed particle line '{line}': {reason}")]
    MalformedParticleLine { line: String, reason: String },
}

/// Raw contents of one `<event>` block
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct EventBlock {
    /// The opening `<event>` tag
    pub tag: String,
    /// Everything between the opening and closing tags
    pub text: Vec<u8>,
}

impl EventBlock {
    /// Decode the block into an event record
    pub fn parse(self) -> Result<EventRecord, EventParseError> {
        let attr = extract_xml_attr(&self.tag)
            .map_err(|_| EventParseError::MalformedTag(self.tag.trim().to_owned()))?;
        let text = String::from_utf8(self.text)
            .map_err(|err| EventParseError::InvalidUtf8(err.utf8_error().valid_up_to()))?;
        let mut event = parse_event(&text)?;
        event.attr = attr;
        Ok(event)
    }
}

impl<T: BufRead> Reader<T> {
    /// Create a new LHEF reader
    ///
    /// Reads everything up to and including the `<init>` block.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// let file = std::fs::File::open("events.lhe").unwrap();
    /// let file = std::io::BufReader::new(file);
    /// let reader = lhespin::Reader::new(file).unwrap();
    /// ```
    pub fn new(mut stream: T) -> Result<Reader<T>, ReadError> {
        if stream.fill_buf()?.starts_with(&GZIP_MAGIC) {
            return Err(ReadError::Compressed);
        }
        let version = parse_version(&mut stream)?;
        let (header, xml_header, init_start) = parse_header(&mut stream)?;
        let run_info = parse_init(&init_start, &mut stream)?;
        Ok(Reader { stream, version, header, xml_header, run_info })
    }

    /// Get the LHEF version
    pub fn version(&self) -> &str {
        self.version
    }

    /// Get the raw LHEF header
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Get the LHEF header, if it is well-formed xml
    pub fn xml_header(&self) -> Option<&XmlTree> {
        self.xml_header.as_ref()
    }

    /// Get the run information from the `<init>` block
    pub fn run_info(&self) -> &RunInfo {
        &self.run_info
    }

    /// Get the raw text of the next event block
    ///
    /// The block is consumed from the stream completely and decoded only
    /// in [EventBlock::parse], so a block that fails to parse does not
    /// affect the following ones. Unexpected lines between blocks are
    /// skipped with a warning. Returns `None` at the end of the event file.
    pub fn next_block(&mut self) -> Result<Option<EventBlock>, ReadError> {
        let mut buf = Vec::new();
        let tag = loop {
            buf.clear();
            if self.stream.read_until(b'\n', &mut buf)? == 0 {
                warn!("Input ended without closing '{LHEF_LAST_LINE}' tag");
                return Ok(None);
            }
            let line = String::from_utf8_lossy(&buf);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with(EVENT_START) {
                break line.into_owned();
            }
            if trimmed == LHEF_LAST_LINE {
                return Ok(None);
            }
            if trimmed.starts_with(COMMENT_START) {
                if !trimmed.contains(COMMENT_END) {
                    let mut comment = String::new();
                    read_lines_until(&mut self.stream, &mut comment, COMMENT_END, "comment")?;
                }
                continue;
            }
            warn!("Skipping unexpected line '{trimmed}' before next '{EVENT_START}'");
        };
        let mut text = Vec::new();
        loop {
            let start = text.len();
            if self.stream.read_until(b'\n', &mut text)? == 0 {
                return Err(ReadError::EndOfFile("event"));
            }
            if String::from_utf8_lossy(&text[start..]).trim() == EVENT_END {
                text.truncate(start);
                break;
            }
        }
        Ok(Some(EventBlock { tag, text }))
    }

    /// Get the next decoded event
    ///
    /// Unlike [Reader::next_block] followed by [EventBlock::parse], a
    /// malformed event is reported as an error.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// let file = std::fs::File::open("events.lhe").unwrap();
    /// let file = std::io::BufReader::new(file);
    /// let mut reader = lhespin::Reader::new(file).unwrap();
    ///
    /// match reader.event().unwrap() {
    ///    Some(event) => println!("Found an event with weight {}", event.weight()),
    ///    None => println!("Reached end of event file."),
    /// }
    /// ```
    pub fn event(&mut self) -> Result<Option<EventRecord>, ReadError> {
        match self.next_block()? {
            Some(block) => Ok(Some(block.parse()?)),
            None => Ok(None),
        }
    }
}

fn parse_version<T: BufRead>(stream: &mut T) -> Result<&'static str, ReadError> {
    use self::ReadError::*;
    let mut first_line = String::new();
    loop {
        first_line.clear();
        if stream.read_line(&mut first_line)? == 0 {
            return Err(BadFirstLine(first_line));
        }
        let trimmed = first_line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with(XML_PROLOG_START) {
            break;
        }
    }
    if !first_line.trim_start().starts_with(LHEF_TAG_OPEN) {
        return Err(BadFirstLine(first_line));
    }
    let attr = extract_xml_attr(&first_line)?;
    let version = attr.get("version").ok_or(MissingVersion)?;
    SUPPORTED_VERSIONS
        .into_iter()
        .find(|v| *v == version.as_str())
        .ok_or_else(|| UnsupportedVersion(version.to_owned()))
}

fn parse_header<T: BufRead>(
    stream: &mut T,
) -> Result<(String, Option<XmlTree>, String), ReadError> {
    use self::ReadError::BadHeaderStart;
    let mut header = String::new();
    let mut xml_header = None;
    loop {
        let mut header_text = String::new();
        if stream.read_line(&mut header_text)? == 0 {
            return Err(ReadError::EndOfFile("header"));
        }
        let trimmed = header_text.trim_start();
        if trimmed.trim_end().is_empty() {
            continue;
        } else if trimmed.starts_with(COMMENT_START) {
            if !trimmed.contains(COMMENT_END) {
                read_lines_until(stream, &mut header_text, COMMENT_END, "comment")?;
            }
            header.push_str(&header_text);
        } else if trimmed.starts_with(HEADER_START) {
            read_lines_until(stream, &mut header_text, HEADER_END, "header")?;
            match XmlTree::parse(header_text.as_bytes()) {
                Ok(tree) => xml_header = Some(tree),
                Err(err) => warn!("Header is not well-formed xml, keeping raw text: {err}"),
            }
            header.push_str(&header_text);
        } else if trimmed.starts_with(INIT_START) {
            return Ok((header, xml_header, header_text));
        } else {
            return Err(BadHeaderStart(header_text));
        }
    }
}

fn read_lines_until<T: BufRead>(
    stream: &mut T,
    text: &mut String,
    end: &str,
    block: &'static str,
) -> Result<(), ReadError> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if stream.read_until(b'\n', &mut buf)? == 0 {
            return Err(ReadError::EndOfFile(block));
        }
        let line = String::from_utf8_lossy(&buf);
        text.push_str(&line);
        if line.contains(end) {
            return Ok(());
        }
    }
}

fn parse<T: FromStr>(name: &str, text: Option<&str>) -> Result<T, ReadError> {
    use self::ReadError::*;
    let text = text.ok_or_else(|| MissingEntry(name.to_owned()))?;
    text.parse::<T>().map_err(|_| ConversionError {
        name: name.to_owned(),
        entry: text.to_owned(),
    })
}

fn parse_f64(name: &str, text: Option<&str>) -> Result<f64, ReadError> {
    use self::ReadError::*;
    let text = text.ok_or_else(|| MissingEntry(name.to_owned()))?;
    parse_float(text).map_err(|_| ConversionError {
        name: name.to_owned(),
        entry: text.to_owned(),
    })
}

fn extract_xml_attr_str(xml_tag: &str) -> Result<&str, ReadError> {
    let tag = xml_tag.trim();
    let Some(tag) = tag.strip_suffix('>') else {
        return Err(ReadError::BadXmlTag(xml_tag.to_owned()));
    };
    let tag = tag.strip_suffix('/').unwrap_or(tag);
    match tag.find(char::is_whitespace) {
        None => Ok(""),
        Some(idx) => Ok(tag[idx + 1..].trim_start()),
    }
}

struct Attr<'a> {
    name: &'a str,
    value: &'a str,
}

fn next_attr(attr_str: &str) -> Result<(Option<Attr<'_>>, &str), ReadError> {
    use self::ReadError::BadXmlTag;
    let bad_tag = || BadXmlTag(attr_str.to_owned());
    let rem = attr_str.trim_start();
    if rem.is_empty() {
        return Ok((None, rem));
    }
    let name_end = rem
        .find(|c: char| c.is_whitespace() || c == '=')
        .ok_or_else(bad_tag)?;
    let name = &rem[..name_end];
    let rem = rem[name_end..].trim_start().strip_prefix('=').ok_or_else(bad_tag)?;
    let rem = rem.trim_start();
    let quote = rem.chars().next().filter(|&c| c == '\'' || c == '"').ok_or_else(bad_tag)?;
    let rem = &rem[1..];
    let value_end = rem.find(quote).ok_or_else(bad_tag)?;
    let value = &rem[..value_end];
    Ok((Some(Attr { name, value }), rem[value_end + 1..].trim_start()))
}

fn extract_xml_attr(xml_tag: &str) -> Result<XmlAttr, ReadError> {
    let mut attr_str = extract_xml_attr_str(xml_tag)?;
    let mut attr = XmlAttr::new();
    loop {
        let (parsed, rem) = next_attr(attr_str)?;
        match parsed {
            None => return Ok(attr),
            Some(next_attr) => {
                attr.insert(next_attr.name.to_owned(), next_attr.value.to_owned());
            }
        }
        attr_str = rem;
    }
}

fn parse_init<T: BufRead>(init_open: &str, stream: &mut T) -> Result<RunInfo, ReadError> {
    let mut line = String::new();
    stream.read_line(&mut line)?;
    let mut entries = line.split_whitespace();
    let beam_ids = [
        parse::<i32>("IDBMUP(1)", entries.next())?,
        parse::<i32>("IDBMUP(2)", entries.next())?,
    ];
    let beam_energies = [
        parse_f64("EBMUP(1)", entries.next())?,
        parse_f64("EBMUP(2)", entries.next())?,
    ];
    let pdf_groups = [
        parse::<i32>("PDFGUP(1)", entries.next())?,
        parse::<i32>("PDFGUP(2)", entries.next())?,
    ];
    let pdf_sets = [
        parse::<i32>("PDFSUP(1)", entries.next())?,
        parse::<i32>("PDFSUP(2)", entries.next())?,
    ];
    let weight_strategy = parse::<i32>("IDWTUP", entries.next())?;
    let nsub = parse::<usize>("NPRUP", entries.next())?;
    let mut subprocesses = Vec::new();
    for i in 1..=nsub {
        let mut line = String::new();
        stream.read_line(&mut line)?;
        let mut entries = line.split_whitespace();
        subprocesses.push(Subprocess {
            xs: parse_f64(&format!("XSECUP({i})"), entries.next())?,
            xs_err: parse_f64(&format!("XERRUP({i})"), entries.next())?,
            max_weight: parse_f64(&format!("XMAXUP({i})"), entries.next())?,
            id: parse::<i32>(&format!("LPRUP({i})"), entries.next())?,
        });
    }
    let mut info = String::new();
    loop {
        let start = info.len();
        if stream.read_line(&mut info)? == 0 {
            return Err(ReadError::EndOfFile("init"));
        }
        if info[start..].trim() == INIT_END {
            info.truncate(start);
            break;
        }
    }
    let attr = extract_xml_attr(init_open)?;
    Ok(RunInfo {
        beam_ids,
        beam_energies,
        pdf_groups,
        pdf_sets,
        weight_strategy,
        subprocesses,
        info,
        attr,
    })
}

fn is_generator_metadata(line: &str) -> bool {
    line.contains(PDF_MARKER) || line.contains(AMCATNLO_MARKER)
}

/// Decode the text between `<event>` and `</event>`
///
/// The first non-empty line is the event header, every following line
/// up to the first xml tag describes one particle. Lines with generator
/// bookkeeping (PDF information, aMC@NLO comments) are skipped and do not
/// count towards the particle indices.
pub fn parse_event(text: &str) -> Result<EventRecord, EventParseError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next().ok_or(EventParseError::Empty)?;
    let header = parse_event_header(header_line)?;
    let mut particles = Vec::new();
    let mut info = String::new();
    while let Some(line) = lines.next() {
        if line.trim_start().starts_with('<') {
            for line in std::iter::once(line).chain(lines.by_ref()) {
                info.push_str(line);
                info.push('\n');
            }
            break;
        }
        if is_generator_metadata(line) {
            continue;
        }
        let particle = parse_particle_line(line)?;
        particles.push(ParticleRecord::new(particles.len(), particle));
    }
    if usize::try_from(header.nparticles) != Ok(particles.len()) {
        warn!(
            "Event header announces {} particles, found {}",
            header.nparticles,
            particles.len()
        );
    }
    let reweights = parse_reweights(&info);
    Ok(EventRecord {
        header,
        particles,
        reweights,
        info,
        attr: XmlAttr::new(),
    })
}

fn parse_event_header(line: &str) -> Result<EventHeader, EventParseError> {
    let malformed = |reason: String| EventParseError::MalformedHeader {
        line: line.to_owned(),
        reason,
    };
    let entries: Vec<_> = line.split_whitespace().collect();
    if entries.len() < 6 {
        return Err(malformed(format!("expected 6 entries, found {}", entries.len())));
    }
    Ok(EventHeader {
        nparticles: parse_entry(&entries, 0, "particle number").map_err(malformed)?,
        process_id: parse_entry(&entries, 1, "process id").map_err(malformed)?,
        weight: parse_float_entry(&entries, 2, "weight").map_err(malformed)?,
        scale: parse_float_entry(&entries, 3, "scale").map_err(malformed)?,
        alpha_qed: parse_float_entry(&entries, 4, "QED coupling").map_err(malformed)?,
        alpha_qcd: parse_float_entry(&entries, 5, "QCD coupling").map_err(malformed)?,
    })
}

/// Parse one particle line
///
/// Exactly thirteen entries are required: id, status, two mothers, two
/// colours, px, py, pz, E, mass, lifetime, spin.
pub fn parse_particle_line(line: &str) -> Result<ParticleLine, EventParseError> {
    let malformed = |reason: String| EventParseError::MalformedParticleLine {
        line: line.to_owned(),
        reason,
    };
    let e: Vec<_> = line.split_whitespace().collect();
    if e.len() != PARTICLE_LINE_ENTRIES {
        return Err(malformed(format!(
            "expected {PARTICLE_LINE_ENTRIES} entries, found {}",
            e.len()
        )));
    }
    let int = |idx, name| parse_entry::<i32>(&e, idx, name).map_err(malformed);
    let float = |idx, name| parse_float_entry(&e, idx, name).map_err(malformed);
    Ok(ParticleLine {
        id: int(0, "id")?,
        status: int(1, "status")?,
        mothers: [int(2, "first mother")?, int(3, "second mother")?],
        colour: [int(4, "first colour")?, int(5, "second colour")?],
        p: [float(6, "px")?, float(7, "py")?, float(8, "pz")?, float(9, "energy")?],
        m: float(10, "mass")?,
        lifetime: float(11, "lifetime")?,
        spin: float(12, "spin")?,
    })
}

fn conversion_failure(name: &str, entry: &str, err: impl Display) -> String {
    format!("failed to convert {name} '{entry}': {err}")
}

fn parse_entry<T>(entries: &[&str], idx: usize, name: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    let entry = entries[idx];
    entry.parse().map_err(|err| conversion_failure(name, entry, err))
}

fn parse_float_entry(entries: &[&str], idx: usize, name: &str) -> Result<f64, String> {
    let entry = entries[idx];
    parse_float(entry).map_err(|err| conversion_failure(name, entry, err))
}

fn parse_float(text: &str) -> Result<f64, fast_float::Error> {
    fast_float::parse(text.strip_prefix('+').unwrap_or(text))
}

/// Extract the named weights from the `<rwgt>` block of the event information
fn parse_reweights(info: &str) -> Vec<Reweight> {
    if !info.contains(REWEIGHT_TAG) {
        return Vec::new();
    }
    // the information can consist of several sibling tags
    let wrapped = format!("<info>{info}</info>");
    let tree = match XmlTree::parse(wrapped.as_bytes()) {
        Ok(tree) => tree,
        Err(err) => {
            warn!("Failed to parse event information, ignoring reweights: {err}");
            return Vec::new();
        }
    };
    let Some(rwgt) = tree.get_child(REWEIGHT_TAG) else {
        return Vec::new();
    };
    let mut reweights = Vec::new();
    for wgt in rwgt.children.iter().filter(|c| c.name == WEIGHT_TAG) {
        let id = wgt.attributes.get(WEIGHT_ID_ATTR).cloned().unwrap_or_default();
        let text = wgt.text.as_deref().unwrap_or("");
        match parse_float(text.trim()) {
            Ok(weight) => reweights.push(Reweight { id, weight }),
            Err(_) => debug!("Ignoring weight '{id}' with value '{}'", text.trim()),
        }
    }
    reweights
}

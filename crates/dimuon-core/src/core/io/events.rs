use crate::core::models::event::{Event, TriggerDecisions};
use crate::core::models::particle::Particle;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventReadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed trigger entry '{entry}' in event {event}")]
    MalformedTrigger { event: u64, entry: String },
    #[error("Incomplete muon record in event {event}: column '{column}' is empty")]
    IncompleteMuon { event: u64, column: &'static str },
    #[error("Event {event} is split across non-consecutive rows")]
    NonContiguousEvent { event: u64 },
    #[error("Muon in event {event} has charge {charge}, expected -1 or +1")]
    InvalidCharge { event: u64, charge: i8 },
    #[error("Muon in event {event} has a non-finite '{column}' value")]
    NonFiniteValue { event: u64, column: &'static str },
}

/// One CSV row: event-level columns plus at most one muon.
#[derive(Debug, Deserialize)]
struct EventRow {
    event: u64,
    gen_weight: f64,
    pileup: u32,
    #[serde(default)]
    triggers: String,
    pt: Option<f64>,
    eta: Option<f64>,
    phi: Option<f64>,
    mass: Option<f64>,
    charge: Option<i8>,
    tight_id: Option<bool>,
    id_tier: Option<u8>,
    pf_rel_iso: Option<f64>,
    n_tracker_layers: Option<u32>,
}

impl EventRow {
    fn has_muon(&self) -> bool {
        self.pt.is_some()
            || self.eta.is_some()
            || self.phi.is_some()
            || self.mass.is_some()
            || self.charge.is_some()
    }

    fn muon(&self) -> Result<Option<Particle>, EventReadError> {
        if !self.has_muon() {
            return Ok(None);
        }
        let event = self.event;
        let present = |column: &'static str| EventReadError::IncompleteMuon { event, column };
        let finite = |value: Option<f64>, column: &'static str| {
            let value = value.ok_or_else(|| present(column))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(EventReadError::NonFiniteValue { event, column })
            }
        };

        let charge = self.charge.ok_or_else(|| present("charge"))?;
        if charge != 1 && charge != -1 {
            return Err(EventReadError::InvalidCharge { event, charge });
        }
        Ok(Some(Particle {
            pt: finite(self.pt, "pt")?,
            eta: finite(self.eta, "eta")?,
            phi: finite(self.phi, "phi")?,
            mass: finite(self.mass, "mass")?,
            charge,
            tight_id: self.tight_id.ok_or_else(|| present("tight_id"))?,
            id_tier: self.id_tier.ok_or_else(|| present("id_tier"))?,
            pf_rel_iso: finite(self.pf_rel_iso, "pf_rel_iso")?,
            n_tracker_layers: self
                .n_tracker_layers
                .ok_or_else(|| present("n_tracker_layers"))?,
        }))
    }

    fn trigger_decisions(&self) -> Result<TriggerDecisions, EventReadError> {
        self.triggers
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| -> Result<(String, bool), EventReadError> {
                let malformed = || EventReadError::MalformedTrigger {
                    event: self.event,
                    entry: entry.to_string(),
                };
                let (name, value) = entry.split_once(':').ok_or_else(&malformed)?;
                let fired = match value.trim() {
                    "1" | "true" => true,
                    "0" | "false" => false,
                    _ => return Err(malformed()),
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(malformed());
                }
                Ok((name.to_string(), fired))
            })
            .collect()
    }
}

/// Streams [`Event`]s from a flat CSV file with one row per muon.
///
/// Rows sharing the same `event` number must be consecutive; they are merged
/// into a single event whose particle list keeps the row order. A row with
/// empty muon columns contributes an event without particles; a muon row must
/// fill every muon column, carry a charge of `-1` or `+1`, and hold finite
/// kinematics and isolation. Event-level
/// columns (`gen_weight`, `pileup`, `triggers`) are taken from the first row
/// of each event.
///
/// The expected header is
/// `event,gen_weight,pileup,triggers,pt,eta,phi,mass,charge,tight_id,id_tier,pf_rel_iso,n_tracker_layers`,
/// where `triggers` holds `NAME:1` / `NAME:0` entries separated by `;`.
///
/// Split events are detected by remembering every event number already read,
/// so the reader holds one `u64` per event of the file. Readers are opened per
/// file, which bounds that set by the file size.
pub struct EventCsvReader<R: Read> {
    rows: csv::DeserializeRecordsIntoIter<R, EventRow>,
    pending: Option<EventRow>,
    seen: HashSet<u64>,
}

impl EventCsvReader<File> {
    pub fn from_path(path: &Path) -> Result<Self, EventReadError> {
        let file = File::open(path).map_err(|e| EventReadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> EventCsvReader<R> {
    pub fn from_reader(reader: R) -> Self {
        let rows = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader)
            .into_deserialize();
        Self {
            rows,
            pending: None,
            seen: HashSet::new(),
        }
    }

    fn next_row(&mut self) -> Option<Result<EventRow, EventReadError>> {
        if let Some(row) = self.pending.take() {
            return Some(Ok(row));
        }
        self.rows.next().map(|r| r.map_err(EventReadError::from))
    }

    fn read_event(&mut self, first: EventRow) -> Result<Event, EventReadError> {
        if !self.seen.insert(first.event) {
            return Err(EventReadError::NonContiguousEvent { event: first.event });
        }

        let mut event = Event {
            number: first.event,
            particles: Vec::new(),
            gen_weight: first.gen_weight,
            pileup: first.pileup,
            triggers: first.trigger_decisions()?,
        };
        event.particles.extend(first.muon()?);

        while let Some(row) = self.rows.next() {
            let row = row?;
            if row.event != event.number {
                self.pending = Some(row);
                break;
            }
            event.particles.extend(row.muon()?);
        }
        Ok(event)
    }
}

impl<R: Read> Iterator for EventCsvReader<R> {
    type Item = Result<Event, EventReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = match self.next_row()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(self.read_event(first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str =
        "event,gen_weight,pileup,triggers,pt,eta,phi,mass,charge,tight_id,id_tier,pf_rel_iso,n_tracker_layers\n";

    fn read_all(content: &str) -> Vec<Result<Event, EventReadError>> {
        EventCsvReader::from_reader(content.as_bytes()).collect()
    }

    #[test]
    fn consecutive_rows_are_merged_into_one_event() {
        let csv = format!(
            "{HEADER}\
             1,1.5,20,HLT_IsoMu24:1;HLT_IsoMu27:0,50.0,0.1,0.2,0.1057,1,true,2,0.05,12\n\
             1,1.5,20,HLT_IsoMu24:1;HLT_IsoMu27:0,40.0,-0.3,2.9,0.1057,-1,false,1,0.30,9\n\
             2,-0.7,31,,,,,,,,,,\n"
        );
        let events: Vec<Event> = read_all(&csv).into_iter().map(Result::unwrap).collect();

        assert_eq!(events.len(), 2);
        let first = &events[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.particles.len(), 2);
        assert_eq!(first.particles[0].pt, 50.0);
        assert_eq!(first.particles[1].charge, -1);
        assert!(first.particles[0].tight_id);
        assert_eq!(first.particles[1].id_tier, 1);
        assert_eq!(first.pileup, 20);
        assert!(first.triggers.fired("HLT_IsoMu24"));
        assert_eq!(first.triggers.get("HLT_IsoMu27"), Some(false));

        let second = &events[1];
        assert!(second.particles.is_empty());
        assert_eq!(second.gen_weight, -0.7);
        assert!(second.triggers.is_empty());
    }

    #[test]
    fn incomplete_muon_row_is_rejected() {
        let csv = format!("{HEADER}3,1.0,10,,30.0,0.1,,0.1057,1,true,1,0.1,10\n");
        let results = read_all(&csv);
        assert!(matches!(
            results[0],
            Err(EventReadError::IncompleteMuon {
                event: 3,
                column: "phi"
            })
        ));
    }

    #[test]
    fn empty_identification_columns_are_incomplete() {
        let csv = format!(
            "{HEADER}3,1.0,10,,30.0,0.1,0.2,0.1057,1,,1,0.1,10\n\
             4,1.0,10,,30.0,0.1,0.2,0.1057,1,true,1,0.1,\n"
        );
        let results = read_all(&csv);
        assert!(matches!(
            results[0],
            Err(EventReadError::IncompleteMuon {
                event: 3,
                column: "tight_id"
            })
        ));
        assert!(matches!(
            results[1],
            Err(EventReadError::IncompleteMuon {
                event: 4,
                column: "n_tracker_layers"
            })
        ));
    }

    #[test]
    fn neutral_muon_is_rejected() {
        let csv = format!(
            "{HEADER}\
             8,1.0,10,HLT_IsoMu24:1,100.0,3.0,0.0,0.1057,0,true,3,0.01,10\n\
             8,1.0,10,HLT_IsoMu24:1,45.6,0.2,0.5,0.1057,1,true,3,0.01,10\n\
             8,1.0,10,HLT_IsoMu24:1,45.6,-0.2,-2.6,0.1057,-1,true,3,0.01,10\n"
        );
        let results = read_all(&csv);
        assert!(matches!(
            results[0],
            Err(EventReadError::InvalidCharge {
                event: 8,
                charge: 0
            })
        ));

        let csv = format!("{HEADER}9,1.0,10,,30.0,0.1,0.2,0.1057,2,true,1,0.1,10\n");
        assert!(matches!(
            read_all(&csv)[0],
            Err(EventReadError::InvalidCharge { charge: 2, .. })
        ));
    }

    #[test]
    fn non_finite_kinematics_are_rejected() {
        let csv = format!(
            "{HEADER}\
             10,1.0,10,,NaN,0.1,0.2,0.1057,1,true,1,0.1,10\n\
             11,1.0,10,,30.0,inf,0.2,0.1057,1,true,1,0.1,10\n"
        );
        let results = read_all(&csv);
        assert!(matches!(
            results[0],
            Err(EventReadError::NonFiniteValue {
                event: 10,
                column: "pt"
            })
        ));
        assert!(matches!(
            results[1],
            Err(EventReadError::NonFiniteValue {
                event: 11,
                column: "eta"
            })
        ));
    }

    #[test]
    fn malformed_trigger_entry_is_rejected() {
        let csv = format!("{HEADER}4,1.0,10,HLT_IsoMu24=1,,,,,,,,,\n");
        let results = read_all(&csv);
        assert!(matches!(
            results[0],
            Err(EventReadError::MalformedTrigger { event: 4, .. })
        ));
    }

    #[test]
    fn split_event_is_rejected() {
        let csv = format!("{HEADER}5,1,0,,,,,,,,,,\n6,1,0,,,,,,,,,,\n5,1,0,,,,,,,,,,\n");
        let results = read_all(&csv);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(
            results[2],
            Err(EventReadError::NonContiguousEvent { event: 5 })
        ));
    }

    #[test]
    fn negative_pileup_is_a_csv_error() {
        let csv = format!("{HEADER}7,1,-3,,,,,,,,,,\n");
        assert!(matches!(read_all(&csv)[0], Err(EventReadError::Csv(_))));
    }

    #[test]
    fn from_path_reports_missing_file() {
        let dir = tempdir().unwrap();
        let result = EventCsvReader::from_path(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(EventReadError::Io { .. })));
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.csv");
        fs::write(&path, format!("{HEADER}9,2.0,5,HLT_IsoMu24:1,,,,,,,,,\n")).unwrap();

        let events: Vec<_> = EventCsvReader::from_path(&path).unwrap().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().number, 9);
    }
}

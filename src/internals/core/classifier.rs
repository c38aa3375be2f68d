use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{coarse_state::CoarseState, status_bits::StatusBits};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatusError {
    /// A set status bit has no known description.
    #[error("Status bit {0} has no description.")]
    UnmappedBit(u8),
}

/// Human readable description of each status bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTable {
    descriptions: BTreeMap<u8, String>,
}

impl StatusTable {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (u8, S)>) -> Self {
        Self {
            descriptions: entries
                .into_iter()
                .map(|(bit, text)| (bit, text.into()))
                .collect(),
        }
    }

    /// Descriptions reported by the nEXT pump controller.
    /// Bit 5 has no documented meaning.
    pub fn next() -> Self {
        Self::new([
            (0, "Fail status condition active"),
            (1, "Below stopped speed"),
            (2, "Above normal speed"),
            (3, "Vent valve energised"),
            (4, "Start command active"),
            (6, "Serial enable active"),
            (7, "Above 50% rotational speed"),
            (8, "Exclusive control mode selection"),
            (9, "Exclusive control mode selection"),
            (10, "Controller internal software mismatch"),
            (11, "Controller failed internal configuration"),
            (12, "Timer expired"),
            (13, "Overspeed or Overcurrent trip activated"),
            (14, "Thermistor error"),
            (15, "Serial enable become inactivate following a serial Start command"),
        ])
    }

    pub fn describe(&self, bit: u8) -> Option<&str> {
        self.descriptions.get(&bit).map(String::as_str)
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::next()
    }
}

/// Map a status word to a coarse state. Rules are applied in order and a
/// later matching rule replaces the earlier result.
pub fn classify(status: StatusBits) -> CoarseState {
    let mut state = CoarseState::Unknown;
    if status.contains(0) {
        state = CoarseState::Init;
    }
    if status.contains(4) || status.contains(5) {
        state = CoarseState::Moving;
    }
    if status.contains(2) {
        state = CoarseState::Running;
    }
    if status.contains(11) {
        state = CoarseState::On;
    }
    if status.contains(13) || status.contains(14) {
        state = CoarseState::Alarm;
    }
    // NOTE: Shadows the Init rule above whenever bit 0 is set, so Init is
    // never returned.
    // TODO: Confirm against the nEXT manual whether bit 0 means Init or Fault.
    if status.contains(0) {
        state = CoarseState::Fault;
    }
    state
}

/// Describe every set bit, ascending, one per line.
pub fn status_text(table: &StatusTable, status: StatusBits) -> Result<String, StatusError> {
    let lines = status
        .iter()
        .map(|bit| table.describe(bit).ok_or(StatusError::UnmappedBit(bit)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

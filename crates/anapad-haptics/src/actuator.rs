//! Actuator identity and placement.

use std::fmt;
use std::str::FromStr;

use anapad_errors::ConfigurationError;
use anapad_geometry::Location;
use serde::{Deserialize, Serialize};

/// Grid column, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    /// Column A
    A,
    /// Column B
    B,
    /// Column C
    C,
    /// Column D
    D,
    /// Column E
    E,
    /// Column F
    F,
    /// Column G
    G,
    /// Column H
    H,
    /// Column I
    I,
    /// Column J
    J,
    /// Column K
    K,
    /// Column L
    L,
    /// Column M
    M,
}

impl Column {
    /// Every column, left to right.
    pub const ALL: [Column; 13] = [
        Column::A,
        Column::B,
        Column::C,
        Column::D,
        Column::E,
        Column::F,
        Column::G,
        Column::H,
        Column::I,
        Column::J,
        Column::K,
        Column::L,
        Column::M,
    ];

    /// Zero-based position.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Column letter.
    pub fn letter(self) -> char {
        char::from(b'A'.wrapping_add(self.index()))
    }

    fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.letter() == letter)
    }
}

/// Grid row, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Row {
    /// Row 1
    R1,
    /// Row 2
    R2,
    /// Row 3
    R3,
    /// Row 4
    R4,
    /// Row 5
    R5,
}

impl Row {
    /// Every row, top to bottom.
    pub const ALL: [Row; 5] = [Row::R1, Row::R2, Row::R3, Row::R4, Row::R5];

    /// Zero-based position.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// One-based row number as printed on the board.
    pub const fn number(self) -> u8 {
        self.index() + 1
    }

    fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.number() == number)
    }
}

/// Actuator reference such as `C3`: column letter then row number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference {
    /// Column
    pub column: Column,
    /// Row
    pub row: Row,
}

impl Reference {
    /// Reference at `column`, `row`.
    pub const fn new(column: Column, row: Row) -> Self {
        Self { column, row }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column.letter(), self.row.number())
    }
}

impl FromStr for Reference {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ConfigurationError::invalid("actuator.reference", format!("{s:?} is not like \"C3\""))
        };
        let mut chars = s.chars();
        let column = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .and_then(Column::from_letter)
            .ok_or_else(invalid)?;
        let row = chars
            .as_str()
            .parse::<u8>()
            .ok()
            .and_then(Row::from_number)
            .ok_or_else(invalid)?;
        Ok(Self { column, row })
    }
}

impl TryFrom<String> for Reference {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        reference.to_string()
    }
}

/// One LRA actuator and the expander port gating it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Actuator {
    /// Board reference
    pub reference: Reference,
    /// Centre, in view pixels
    pub location: Location,
    /// Expander index
    pub expander: usize,
    /// Expander port, 0..=7
    pub port: u8,
    /// Whether the port is currently driven
    pub enabled: bool,
}

impl Actuator {
    /// Whether this actuator lies within `radius` of `location`, boundary
    /// included.
    #[inline]
    pub fn is_within(&self, location: &Location, radius: f64) -> bool {
        self.location.is_within(location, radius)
    }
}

//! Column-name registry.
//!
//! Every column the classifier reads or writes is addressed by a [`Field`];
//! [`ColumnNames`] maps fields to the header text used by a particular
//! workbook. The defaults match the ERA submission template.

use serde::{Deserialize, Serialize};

/// Classification cycle a FOR column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Year {
    /// ERA 2015 codes (read-only carry-forward source).
    Era2015,
    /// ERA 2018 codes (write target).
    Era2018,
}

/// One of the four FOR code/percentage slots. `Fourth` is the clawback slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    First,
    Second,
    Third,
    Fourth,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::First, Slot::Second, Slot::Third, Slot::Fourth];

    /// The three weighted slots whose percentages sum to 100.
    pub const WEIGHTED: [Slot; 3] = [Slot::First, Slot::Second, Slot::Third];

    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
            Slot::Third => 2,
            Slot::Fourth => 3,
        }
    }

    /// 1-based slot number, as used in column names and messages.
    pub fn number(self) -> usize {
        self.index() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Authors,
    Venue,
    Title,
    Discipline,
    Status,
    ForCode(Year, Slot),
    ForPct(Year, Slot),
    ClawbackJustification,
    ForcString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub authors: String,
    pub venue: String,
    pub title: String,
    pub discipline: String,
    pub status: String,
    pub clawback_justification: String,
    pub forc_string: String,
    pub for_code_2015: [String; 4],
    pub for_pct_2015: [String; 4],
    pub for_code_2018: [String; 4],
    pub for_pct_2018: [String; 4],
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            authors: "AUTHORS".into(),
            venue: "PARENT_DOC".into(),
            title: "TITLE".into(),
            discipline: "DISCIPLINE".into(),
            status: "HANDLED".into(),
            clawback_justification: "ERA_18_FOR4_ClawBack_Justify".into(),
            forc_string: "FORC_STRING".into(),
            for_code_2015: slot_names(|n| format!("FOR{n}_E15")),
            for_pct_2015: slot_names(|n| format!("FOR{n}PERC_E15")),
            for_code_2018: slot_names(|n| format!("ERA_18_FOR{n}")),
            for_pct_2018: slot_names(|n| format!("ERA_18_FOR{n}%")),
        }
    }
}

fn slot_names(name: impl Fn(usize) -> String) -> [String; 4] {
    Slot::ALL.map(|slot| name(slot.number()))
}

impl ColumnNames {
    pub fn name(&self, field: Field) -> &str {
        match field {
            Field::Authors => &self.authors,
            Field::Venue => &self.venue,
            Field::Title => &self.title,
            Field::Discipline => &self.discipline,
            Field::Status => &self.status,
            Field::ClawbackJustification => &self.clawback_justification,
            Field::ForcString => &self.forc_string,
            Field::ForCode(Year::Era2015, slot) => &self.for_code_2015[slot.index()],
            Field::ForPct(Year::Era2015, slot) => &self.for_pct_2015[slot.index()],
            Field::ForCode(Year::Era2018, slot) => &self.for_code_2018[slot.index()],
            Field::ForPct(Year::Era2018, slot) => &self.for_pct_2018[slot.index()],
        }
    }

    /// All registered column names, in a stable order.
    pub fn all(&self) -> Vec<&str> {
        let mut names = vec![
            self.authors.as_str(),
            self.venue.as_str(),
            self.title.as_str(),
            self.discipline.as_str(),
            self.status.as_str(),
            self.clawback_justification.as_str(),
            self.forc_string.as_str(),
        ];
        for group in [&self.for_code_2015, &self.for_pct_2015, &self.for_code_2018, &self.for_pct_2018] {
            names.extend(group.iter().map(String::as_str));
        }
        names
    }
}

//! The closed set of work-history fields and their value kinds.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The shape of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    TextSet,
    NumberSet,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::TextSet => "text set",
            FieldKind::NumberSet => "number set",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field of a work-history draft.
///
/// The wire name (camelCase) is what appears in stored payloads, in
/// validation issues and in touched-field tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ProjectName,
    StartDate,
    EndDate,
    Industry,
    CompanyName,
    ProjectOverview,
    Responsibilities,
    Achievements,
    Notes,
    TeamSize,
    Role,
    Processes,
    ProgrammingLanguages,
    ServersDatabases,
    Tools,
}

impl Field {
    /// Every field, in form order.
    pub const ALL: [Field; 15] = [
        Field::ProjectName,
        Field::StartDate,
        Field::EndDate,
        Field::Industry,
        Field::CompanyName,
        Field::ProjectOverview,
        Field::Responsibilities,
        Field::Achievements,
        Field::Notes,
        Field::TeamSize,
        Field::Role,
        Field::Processes,
        Field::ProgrammingLanguages,
        Field::ServersDatabases,
        Field::Tools,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::ProjectName => "projectName",
            Field::StartDate => "startDate",
            Field::EndDate => "endDate",
            Field::Industry => "industry",
            Field::CompanyName => "companyName",
            Field::ProjectOverview => "projectOverview",
            Field::Responsibilities => "responsibilities",
            Field::Achievements => "achievements",
            Field::Notes => "notes",
            Field::TeamSize => "teamSize",
            Field::Role => "role",
            Field::Processes => "processes",
            Field::ProgrammingLanguages => "programmingLanguages",
            Field::ServersDatabases => "serversDatabases",
            Field::Tools => "tools",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::ProjectName
            | Field::CompanyName
            | Field::ProjectOverview
            | Field::Responsibilities
            | Field::Achievements
            | Field::Notes
            | Field::Role => FieldKind::Text,
            Field::StartDate | Field::EndDate => FieldKind::Date,
            Field::Industry | Field::TeamSize => FieldKind::Number,
            Field::Processes => FieldKind::NumberSet,
            Field::ProgrammingLanguages | Field::ServersDatabases | Field::Tools => {
                FieldKind::TextSet
            }
        }
    }

    /// Resolve a wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Field::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown field '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_name() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(Field::from_name("salary"), None);
        assert_eq!(Field::from_name(""), None);
        // wire names are case-sensitive
        assert_eq!(Field::from_name("ProjectName"), None);
    }

    #[test]
    fn kinds_match_the_form_layout() {
        assert_eq!(Field::StartDate.kind(), FieldKind::Date);
        assert_eq!(Field::TeamSize.kind(), FieldKind::Number);
        assert_eq!(Field::Processes.kind(), FieldKind::NumberSet);
        assert_eq!(Field::Tools.kind(), FieldKind::TextSet);
        assert_eq!(Field::Notes.kind(), FieldKind::Text);
    }

    #[test]
    fn deserialize_rejects_unknown_field() {
        let ok: Field = serde_json::from_str("\"endDate\"").unwrap();
        assert_eq!(ok, Field::EndDate);
        assert!(serde_json::from_str::<Field>("\"end_date\"").is_err());
    }
}

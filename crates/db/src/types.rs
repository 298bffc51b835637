use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Stored task status. OVERDUE is never stored; see `DisplayStatus` in services.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    #[sea_orm(string_value = "backlog")]
    Backlog,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "under_review")]
    UnderReview,
    #[sea_orm(string_value = "done")]
    Done,
}

/// Who may compete for a task.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    #[default]
    #[sea_orm(string_value = "individual")]
    Individual,
    #[sea_orm(string_value = "unit")]
    Unit,
    #[sea_orm(string_value = "department")]
    Department,
}

impl TaskType {
    pub fn is_auctioned(self) -> bool {
        !matches!(self, TaskType::Individual)
    }
}

/// What bidders compete on.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionMode {
    #[default]
    #[sea_orm(string_value = "money")]
    Money,
    #[sea_orm(string_value = "time")]
    Time,
}

/// Competency tier, D < C < B < A.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Grade {
    #[default]
    #[sea_orm(string_value = "D")]
    D,
    #[sea_orm(string_value = "C")]
    C,
    #[sea_orm(string_value = "B")]
    B,
    #[sea_orm(string_value = "A")]
    A,
}

impl Grade {
    pub const ASCENDING: [Grade; 4] = [Grade::D, Grade::C, Grade::B, Grade::A];

    pub fn priority(self) -> u8 {
        match self {
            Grade::D => 1,
            Grade::C => 2,
            Grade::B => 3,
            Grade::A => 4,
        }
    }

    pub fn next(self) -> Option<Grade> {
        match self {
            Grade::D => Some(Grade::C),
            Grade::C => Some(Grade::B),
            Grade::B => Some(Grade::A),
            Grade::A => None,
        }
    }

    pub fn at_least(self, required: Grade) -> bool {
        self.priority() >= required.priority()
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "director")]
    Director,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "senior")]
    Senior,
    #[default]
    #[sea_orm(string_value = "employee")]
    Employee,
}

/// Hundredths per currency unit.
pub const MINOR_UNITS: i64 = 100;

/// A money amount held in hundredths of the currency unit. On the wire it is a
/// JSON number of whole units (`950000` or `950000.5`); storage keeps the
/// hundredths as an integer column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[ts(type = "number")]
pub struct Money(i64);

impl Money {
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(MINOR_UNITS).map(Self)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Accepts finite values with at most two decimal places.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = value * MINOR_UNITS as f64;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 || rounded.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self(rounded as i64))
    }

    /// Parses a plain decimal such as `950000`, `950000.5` or `-12.25`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |part: &str| part.chars().all(|ch| ch.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty())
            || fraction.len() > 2
            || !all_digits(whole)
            || !all_digits(fraction)
        {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let hundredths: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().ok()? * 10,
            _ => fraction.parse().ok()?,
        };
        let minor = whole.checked_mul(MINOR_UNITS)?.checked_add(hundredths)?;
        Some(Self(if negative { -minor } else { minor }))
    }

    pub fn whole_units(self) -> u64 {
        self.0.unsigned_abs() / MINOR_UNITS as u64
    }

    pub fn hundredths(self) -> u64 {
        self.0.unsigned_abs() % MINOR_UNITS as u64
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            f.write_str("-")?;
        }
        match self.hundredths() {
            0 => write!(f, "{}", self.whole_units()),
            cents => write!(f, "{}.{cents:02}", self.whole_units()),
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_UNITS == 0 {
            serializer.serialize_i64(self.0 / MINOR_UNITS)
        } else {
            serializer.serialize_f64(self.0 as f64 / MINOR_UNITS as f64)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Integer(i64),
            Float(f64),
            Text(String),
        }

        let parsed = match Wire::deserialize(deserializer)? {
            Wire::Integer(units) => Money::from_units(units),
            Wire::Float(value) => Money::from_f64(value),
            Wire::Text(text) => Money::parse(&text),
        };
        parsed.ok_or_else(|| de::Error::custom("expected an amount with at most two decimal places"))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn grade_priority_is_ordered() {
        let priorities: Vec<u8> = Grade::ASCENDING.iter().map(|g| g.priority()).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
        assert!(Grade::B.at_least(Grade::C));
        assert!(Grade::C.at_least(Grade::C));
        assert!(!Grade::D.at_least(Grade::C));
        assert_eq!(Grade::A.next(), None);
    }

    #[test]
    fn enums_parse_from_wire_names() {
        assert_eq!(TaskStatus::from_str("IN_PROGRESS").unwrap(), TaskStatus::InProgress);
        assert_eq!(TaskType::from_str("UNIT").unwrap(), TaskType::Unit);
        assert_eq!(UserRole::from_str("senior").unwrap(), UserRole::Senior);
        assert_eq!(Grade::from_str("B").unwrap(), Grade::B);
        assert_eq!(
            serde_json::to_string(&TaskStatus::UnderReview).unwrap(),
            "\"UNDER_REVIEW\""
        );
    }

    #[test]
    fn money_keeps_hundredths() {
        assert_eq!(Money::parse("950000.50"), Money::from_f64(950_000.5));
        assert_eq!(Money::parse("950000.5").map(Money::minor), Some(95_000_050));
        assert_eq!(Money::parse(".25").map(Money::minor), Some(25));
        assert_eq!(Money::parse("-12.05").map(Money::minor), Some(-1_205));
        assert_eq!(Money::parse("1.005"), None);
        assert_eq!(Money::parse("1 000"), None);
        assert_eq!(Money::parse(""), None);
        assert_eq!(Money::from_f64(0.29).map(Money::minor), Some(29));
        assert_eq!(Money::from_f64(10.125), None);
        assert_eq!(Money::from_f64(f64::INFINITY), None);
        assert_eq!(Money::from_units(i64::MAX), None);

        assert_eq!(Money::from_minor(95_000_050).to_string(), "950000.50");
        assert_eq!(Money::from_minor(-1_205).to_string(), "-12.05");
        assert_eq!(Money::from_minor(90_000_000).to_string(), "900000");
    }

    #[test]
    fn money_is_a_json_number_of_units() {
        let whole = Money::from_units(900_000).unwrap();
        assert_eq!(serde_json::to_value(whole).unwrap(), serde_json::json!(900000));
        let fractional = Money::from_minor(95_000_050);
        assert_eq!(
            serde_json::to_value(fractional).unwrap(),
            serde_json::json!(950000.5)
        );

        let parsed: Money = serde_json::from_value(serde_json::json!(900000)).unwrap();
        assert_eq!(parsed, whole);
        let parsed: Money = serde_json::from_value(serde_json::json!(950000.5)).unwrap();
        assert_eq!(parsed, fractional);
        let parsed: Money = serde_json::from_value(serde_json::json!("950000.50")).unwrap();
        assert_eq!(parsed, fractional);
        assert!(serde_json::from_value::<Money>(serde_json::json!(1.234)).is_err());
    }
}

use crate::blast_date::normalize_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A column of a blast record. Source keys (CSV headers or JSON object keys)
/// are mapped onto this closed set; anything else is ignored.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Field {
    Date,
    MineName,
    PitName,
    ZoneName,
    BenchName,
    RockName,
    Measure(Measure),
}

impl Field {
    /// Resolve a source key. Keys are compared trimmed and lower-cased with
    /// spaces, underscores and hyphens removed, so `"Mine Name"`,
    /// `"mine_name"` and `"minename"` all resolve to [`Field::MineName`].
    pub fn from_key(key: &str) -> Option<Field> {
        let compact: String = key
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();
        let field = match compact.as_str() {
            "date" | "blastdate" | "blastingdate" => Field::Date,
            "minename" | "mine" => Field::MineName,
            "pitname" | "pit" => Field::PitName,
            "zonename" | "zone" => Field::ZoneName,
            "benchname" | "bench" => Field::BenchName,
            "rockname" | "rocktype" | "rock" => Field::RockName,
            "totalcost" | "cost" | "blastcost" => Field::Measure(Measure::TotalCost),
            "costperton" | "costpertonne" => Field::Measure(Measure::CostPerTon),
            "powderfactor" | "pf" => Field::Measure(Measure::PowderFactor),
            "flyrock" | "flyrockdistance" => Field::Measure(Measure::FlyRock),
            "ppv" | "peakparticlevelocity" => Field::Measure(Measure::Ppv),
            "airblast" | "airoverpressure" => Field::Measure(Measure::AirBlast),
            _ => return None,
        };
        Some(field)
    }
}

/// A numeric field that can be aggregated per time bucket.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Total blast cost. Also the eligibility denominator: records without a
    /// strictly positive total cost are never aggregated.
    TotalCost,
    CostPerTon,
    PowderFactor,
    /// Fly-rock throw distance in metres.
    FlyRock,
    /// Peak particle velocity in mm/s.
    Ppv,
    /// Air overpressure in dB(L).
    AirBlast,
}

impl Measure {
    pub const ALL: [Measure; 6] = [
        Measure::TotalCost,
        Measure::CostPerTon,
        Measure::PowderFactor,
        Measure::FlyRock,
        Measure::Ppv,
        Measure::AirBlast,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Measure::TotalCost => "total_cost",
            Measure::CostPerTon => "cost_per_ton",
            Measure::PowderFactor => "powder_factor",
            Measure::FlyRock => "fly_rock",
            Measure::Ppv => "ppv",
            Measure::AirBlast => "air_blast",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Field::from_key(s) {
            Some(Field::Measure(measure)) => Ok(measure),
            _ => Err(format!("unknown measure: {}", s)),
        }
    }
}

/// A single blast as delivered by either upstream source.
///
/// The date is kept as raw text; use [`BlastRecord::parsed_date`] to get the
/// normalized calendar date.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct BlastRecord {
    pub date: Option<String>,
    pub mine_name: Option<String>,
    pub pit_name: Option<String>,
    pub zone_name: Option<String>,
    pub bench_name: Option<String>,
    pub rock_name: Option<String>,
    pub total_cost: Option<f64>,
    pub cost_per_ton: Option<f64>,
    pub powder_factor: Option<f64>,
    pub fly_rock: Option<f64>,
    pub ppv: Option<f64>,
    pub air_blast: Option<f64>,
}

impl BlastRecord {
    /// The record's date, if it parses in either accepted format.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(normalize_date)
    }

    pub fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::TotalCost => self.total_cost,
            Measure::CostPerTon => self.cost_per_ton,
            Measure::PowderFactor => self.powder_factor,
            Measure::FlyRock => self.fly_rock,
            Measure::Ppv => self.ppv,
            Measure::AirBlast => self.air_blast,
        }
    }

    fn measure_mut(&mut self, measure: Measure) -> &mut Option<f64> {
        match measure {
            Measure::TotalCost => &mut self.total_cost,
            Measure::CostPerTon => &mut self.cost_per_ton,
            Measure::PowderFactor => &mut self.powder_factor,
            Measure::FlyRock => &mut self.fly_rock,
            Measure::Ppv => &mut self.ppv,
            Measure::AirBlast => &mut self.air_blast,
        }
    }

    /// Builder-style setter for a measure, handy when assembling records by hand.
    pub fn with_measure(mut self, measure: Measure, value: f64) -> Self {
        *self.measure_mut(measure) = Some(value);
        self
    }

    /// Whether `field` already holds a value.
    pub fn is_set(&self, field: Field) -> bool {
        match field {
            Field::Date => self.date.is_some(),
            Field::MineName => self.mine_name.is_some(),
            Field::PitName => self.pit_name.is_some(),
            Field::ZoneName => self.zone_name.is_some(),
            Field::BenchName => self.bench_name.is_some(),
            Field::RockName => self.rock_name.is_some(),
            Field::Measure(measure) => self.measure(measure).is_some(),
        }
    }

    /// Store a text cell, trimmed. Blank text leaves the field unset; numeric
    /// fields that do not parse are left unset as well.
    pub fn set_text(&mut self, field: Field, text: &str) {
        let text = text.trim();
        let owned = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        match field {
            Field::Date => self.date = owned,
            Field::MineName => self.mine_name = owned,
            Field::PitName => self.pit_name = owned,
            Field::ZoneName => self.zone_name = owned,
            Field::BenchName => self.bench_name = owned,
            Field::RockName => self.rock_name = owned,
            Field::Measure(measure) => *self.measure_mut(measure) = parse_number(text),
        }
    }

    /// Store a JSON value. Numbers and numeric strings are both accepted for
    /// measures; numbers are stringified for text fields.
    pub fn set_json(&mut self, field: Field, value: &Value) {
        match value {
            Value::String(s) => self.set_text(field, s),
            Value::Number(n) => match field {
                Field::Measure(measure) => *self.measure_mut(measure) = n.as_f64(),
                _ => self.set_text(field, &n.to_string()),
            },
            _ => {}
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_aliases() {
        assert_eq!(Field::from_key(" Mine Name "), Some(Field::MineName));
        assert_eq!(Field::from_key("rock_type"), Some(Field::RockName));
        assert_eq!(
            Field::from_key("FlyRock"),
            Some(Field::Measure(Measure::FlyRock))
        );
        assert_eq!(Field::from_key("operator"), None);
    }

    #[test]
    fn test_measure_from_str() {
        assert_eq!("cost_per_ton".parse::<Measure>(), Ok(Measure::CostPerTon));
        assert_eq!("ppv".parse::<Measure>(), Ok(Measure::Ppv));
        assert!("mine_name".parse::<Measure>().is_err());
    }

    #[test]
    fn test_set_text() {
        let mut record = BlastRecord::default();
        record.set_text(Field::MineName, "North");
        record.set_text(Field::PitName, "");
        record.set_text(Field::Measure(Measure::TotalCost), " 1500.5 ");
        record.set_text(Field::Measure(Measure::Ppv), "n/a");
        assert_eq!(record.mine_name.as_deref(), Some("North"));
        assert_eq!(record.pit_name, None);
        assert_eq!(record.total_cost, Some(1500.5));
        assert_eq!(record.ppv, None);
    }

    #[test]
    fn test_set_text_trims() {
        let mut record = BlastRecord::default();
        record.set_text(Field::MineName, " North ");
        record.set_text(Field::ZoneName, "   ");
        assert_eq!(record.mine_name.as_deref(), Some("North"));
        assert_eq!(record.zone_name, None);
        assert!(record.is_set(Field::MineName));
        assert!(!record.is_set(Field::ZoneName));
    }

    #[test]
    fn test_set_json() {
        let mut record = BlastRecord::default();
        record.set_json(Field::Measure(Measure::TotalCost), &json!(200));
        record.set_json(Field::Measure(Measure::FlyRock), &json!("35.5"));
        record.set_json(Field::BenchName, &json!(1040));
        record.set_json(Field::ZoneName, &json!(null));
        assert_eq!(record.total_cost, Some(200.0));
        assert_eq!(record.fly_rock, Some(35.5));
        assert_eq!(record.bench_name.as_deref(), Some("1040"));
        assert_eq!(record.zone_name, None);
    }

    #[test]
    fn test_parsed_date() {
        let record = BlastRecord {
            date: Some("15-03-2024".to_string()),
            ..Default::default()
        };
        assert_eq!(
            record.parsed_date(),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }
}

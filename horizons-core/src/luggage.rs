use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Luggage categories a booking can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Luggage {
    SmallBag,
    CabinBag,
    Cargo20kg,
    Cargo30kg,
    SportsEquipment,
    BabyCarrier,
}

impl Luggage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Luggage::SmallBag => "SmallBag",
            Luggage::CabinBag => "CabinBag",
            Luggage::Cargo20kg => "Cargo20kg",
            Luggage::Cargo30kg => "Cargo30kg",
            Luggage::SportsEquipment => "SportsEquipment",
            Luggage::BabyCarrier => "BabyCarrier",
        }
    }
}

impl fmt::Display for Luggage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Luggage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SmallBag" => Ok(Luggage::SmallBag),
            "CabinBag" => Ok(Luggage::CabinBag),
            "Cargo20kg" => Ok(Luggage::Cargo20kg),
            "Cargo30kg" => Ok(Luggage::Cargo30kg),
            "SportsEquipment" => Ok(Luggage::SportsEquipment),
            "BabyCarrier" => Ok(Luggage::BabyCarrier),
            other => Err(other.to_string()),
        }
    }
}

/// The luggage selected for a booking.
///
/// Behaves as a set (a tag appears at most once) but keeps insertion order, because it is
/// serialized as an ordered JSON array of string tags, both on the wire and in the `luggage`
/// text column.
///
/// Unknown tags are dropped when decoding. Other services already send this shape, so decoding
/// stays lenient; the drop is logged at `warn` so a stricter validation can be introduced later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LuggageSet(Vec<Luggage>);

impl LuggageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag. Returns `false` if it was already present.
    pub fn insert(&mut self, luggage: Luggage) -> bool {
        if self.0.contains(&luggage) {
            return false;
        }
        self.0.push(luggage);
        true
    }

    pub fn contains(&self, luggage: Luggage) -> bool {
        self.0.contains(&luggage)
    }

    pub fn as_slice(&self) -> &[Luggage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds a set from raw tags, skipping the ones that are not known luggage categories.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = LuggageSet::new();
        for tag in tags {
            match tag.as_ref().parse::<Luggage>() {
                Ok(luggage) => {
                    set.insert(luggage);
                }
                Err(unknown) => {
                    tracing::warn!(tag = %unknown, "Dropping unknown luggage tag");
                }
            }
        }
        set
    }

    /// Canonical storage form: a JSON array of string tags.
    pub fn to_json_string(&self) -> String {
        let tags: Vec<&str> = self.0.iter().map(Luggage::as_str).collect();
        serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parses the storage form. A column that is not a JSON string array yields an empty set.
    pub fn from_json_string(raw: &str) -> Self {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(tags) => Self::from_tags(tags),
            Err(e) => {
                tracing::warn!(error = %e, "Luggage column is not a JSON array, treating as empty");
                LuggageSet::new()
            }
        }
    }
}

impl FromIterator<Luggage> for LuggageSet {
    fn from_iter<I: IntoIterator<Item = Luggage>>(iter: I) -> Self {
        let mut set = LuggageSet::new();
        for luggage in iter {
            set.insert(luggage);
        }
        set
    }
}

impl Serialize for LuggageSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().map(Luggage::as_str))
    }
}

impl<'de> Deserialize<'de> for LuggageSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tags = Vec::<String>::deserialize(deserializer)?;
        Ok(LuggageSet::from_tags(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse_and_order_is_kept() {
        let set = LuggageSet::from_tags(["Cargo20kg", "SmallBag", "Cargo20kg"]);
        assert_eq!(set.as_slice(), &[Luggage::Cargo20kg, Luggage::SmallBag]);
        assert_eq!(set.to_json_string(), r#"["Cargo20kg","SmallBag"]"#);
    }

    #[test]
    fn unknown_tags_are_dropped() {
        let set: LuggageSet =
            serde_json::from_str(r#"["SmallBag","Surfboard","BabyCarrier"]"#).unwrap();
        assert_eq!(set.as_slice(), &[Luggage::SmallBag, Luggage::BabyCarrier]);
    }

    #[test]
    fn malformed_storage_column_is_empty() {
        assert!(LuggageSet::from_json_string("SmallBag,CabinBag").is_empty());
        assert!(LuggageSet::from_json_string("[]").is_empty());
    }

    #[test]
    fn storage_form_round_trips() {
        let set: LuggageSet = [Luggage::SportsEquipment, Luggage::Cargo30kg].into_iter().collect();
        let back = LuggageSet::from_json_string(&set.to_json_string());
        assert_eq!(back, set);
        assert!(back.contains(Luggage::Cargo30kg));
        assert!(!back.contains(Luggage::CabinBag));
    }
}

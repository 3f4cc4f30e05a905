/**
 * FILTER / PROJECTION ENGINE - Vue filtrée du journal des infractions
 *
 * RÔLE :
 * Calcule, à chaque rendu, le sous-ensemble d'infractions visibles à partir
 * du stock immuable et de l'état des filtres de la vue.
 *
 * FONCTIONNEMENT :
 * - FilterState = date sélectionnée (optionnelle) + tranche de vitesse
 * - SpeedBucket = tranches fermées : all, 20-25, 25-30, 30+ (bornes incluses)
 * - project() = fonction pure, ET logique des deux prédicats, ordre conservé
 * - Projection = résultat + issue explicite (matches / no_matches)
 *
 * SAISIES UTILISATEUR :
 * Une date invalide est ignorée (= pas de filtre de date), une tranche
 * inconnue vaut `all`.
 */

use crate::records::{parse_iso_date, ViolationRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

/// Tranche de vitesse (km/h) utilisée comme filtre grossier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum SpeedBucket {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "20-25")]
    From20To25,
    #[serde(rename = "25-30")]
    From25To30,
    #[serde(rename = "30+")]
    From30,
}

impl SpeedBucket {
    pub const ALL: [SpeedBucket; 4] = [
        SpeedBucket::All,
        SpeedBucket::From20To25,
        SpeedBucket::From25To30,
        SpeedBucket::From30,
    ];

    /// Saisie tolérante : toute valeur inconnue retombe sur `All`
    pub fn parse_lenient(input: &str) -> Self {
        match input.trim() {
            "20-25" => SpeedBucket::From20To25,
            "25-30" => SpeedBucket::From25To30,
            "30+" => SpeedBucket::From30,
            _ => SpeedBucket::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeedBucket::All => "all",
            SpeedBucket::From20To25 => "20-25",
            SpeedBucket::From25To30 => "25-30",
            SpeedBucket::From30 => "30+",
        }
    }

    /// Bornes incluses (min, max) ; `None` pour `All`, max absent pour `30+`
    pub fn bounds(self) -> Option<(u32, Option<u32>)> {
        match self {
            SpeedBucket::All => None,
            SpeedBucket::From20To25 => Some((20, Some(25))),
            SpeedBucket::From25To30 => Some((25, Some(30))),
            SpeedBucket::From30 => Some((30, None)),
        }
    }

    pub fn contains(self, speed_kmh: u32) -> bool {
        match self.bounds() {
            None => true,
            Some((min, Some(max))) => (min..=max).contains(&speed_kmh),
            Some((min, None)) => speed_kmh >= min,
        }
    }
}

impl From<String> for SpeedBucket {
    fn from(value: String) -> Self {
        SpeedBucket::parse_lenient(&value)
    }
}

impl fmt::Display for SpeedBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Date optionnelle : invalide ou vide => absente
mod lenient_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&crate::records::format_iso_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Date>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(crate::records::parse_iso_date))
    }
}

/// État des filtres de la vue "Violation Log".
/// Créé avec les valeurs par défaut au montage, modifié uniquement par l'utilisateur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default, with = "lenient_date")]
    pub selected_date: Option<Date>,
    #[serde(default)]
    pub speed_bucket: SpeedBucket,
}

/// Saisies brutes des contrôles de filtre (sélecteur de date, liste de tranches)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterInput {
    pub date: Option<String>,
    pub speed: Option<String>,
}

impl FilterState {
    pub fn new(selected_date: Option<Date>, speed_bucket: SpeedBucket) -> Self {
        Self {
            selected_date,
            speed_bucket,
        }
    }

    /// Construit un état complet depuis des saisies brutes
    pub fn from_input(input: &FilterInput) -> Self {
        Self {
            selected_date: input.date.as_deref().and_then(parse_iso_date),
            speed_bucket: input
                .speed
                .as_deref()
                .map(SpeedBucket::parse_lenient)
                .unwrap_or_default(),
        }
    }

    /// Applique uniquement les champs présents dans la saisie
    pub fn overridden_by(&self, input: &FilterInput) -> Self {
        let mut next = *self;
        if let Some(raw) = input.date.as_deref() {
            next.select_date_input(raw);
        }
        if let Some(raw) = input.speed.as_deref() {
            next.speed_bucket = SpeedBucket::parse_lenient(raw);
        }
        next
    }

    pub fn select_date(&mut self, date: Option<Date>) {
        self.selected_date = date;
    }

    /// Sélection depuis du texte ; une date invalide efface le filtre
    pub fn select_date_input(&mut self, raw: &str) {
        self.selected_date = parse_iso_date(raw);
    }

    pub fn clear_date(&mut self) {
        self.selected_date = None;
    }

    pub fn select_bucket(&mut self, bucket: SpeedBucket) {
        self.speed_bucket = bucket;
    }

    pub fn date_matches(&self, record: &ViolationRecord) -> bool {
        self.selected_date.map_or(true, |date| record.date() == date)
    }

    pub fn speed_matches(&self, record: &ViolationRecord) -> bool {
        self.speed_bucket.contains(record.speed_kmh())
    }

    pub fn matches(&self, record: &ViolationRecord) -> bool {
        self.date_matches(record) && self.speed_matches(record)
    }

    pub fn is_default(&self) -> bool {
        *self == FilterState::default()
    }
}

/// Issue d'une projection : "aucun résultat" est un état à part entière
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Matches,
    NoMatches,
}

/// Sous-séquence ordonnée des infractions visibles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection<'a> {
    records: Vec<&'a ViolationRecord>,
}

impl<'a> Projection<'a> {
    pub fn records(&self) -> &[&'a ViolationRecord] {
        &self.records
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn outcome(&self) -> Outcome {
        if self.records.is_empty() {
            Outcome::NoMatches
        } else {
            Outcome::Matches
        }
    }

    pub fn to_owned_records(&self) -> Vec<ViolationRecord> {
        self.records.iter().map(|r| (*r).clone()).collect()
    }
}

/// Projection pure : (stock × filtres) -> infractions visibles, ordre d'origine conservé
pub fn project<'a>(records: &'a [ViolationRecord], filters: &FilterState) -> Projection<'a> {
    Projection {
        records: records.iter().filter(|r| filters.matches(r)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockViolationSource;
    use crate::ports::ViolationSource;
    use crate::records::Lane;
    use proptest::prelude::*;
    use time::macros::date;

    fn sample() -> Vec<ViolationRecord> {
        MockViolationSource.records()
    }

    #[test]
    fn test_default_state_matches_everything() {
        let records = sample();
        let view = project(&records, &FilterState::default());
        assert_eq!(view.count(), records.len());
        assert_eq!(view.outcome(), Outcome::Matches);
    }

    #[test]
    fn test_date_filter_sample() {
        let records = sample();
        let filters = FilterState::new(Some(date!(2023 - 03 - 15)), SpeedBucket::All);
        let view = project(&records, &filters);
        let plates: Vec<&str> = view.records().iter().map(|r| r.plate()).collect();
        assert_eq!(plates, vec!["KA-01-AB-1234", "KA-02-CD-5678", "KA-03-EF-9012"]);
    }

    #[test]
    fn test_over_30_bucket_sample() {
        let records = sample();
        let filters = FilterState::new(None, SpeedBucket::From30);
        let view = project(&records, &filters);
        assert!(view.records().iter().all(|r| r.speed_kmh() >= 30));
        let expected = records.iter().filter(|r| r.speed_kmh() >= 30).count();
        assert_eq!(view.count(), expected);
        assert_eq!(view.count(), 3);
    }

    #[test]
    fn test_bucket_bounds_are_inclusive() {
        assert!(SpeedBucket::From20To25.contains(20));
        assert!(SpeedBucket::From20To25.contains(25));
        assert!(!SpeedBucket::From20To25.contains(26));
        assert!(SpeedBucket::From25To30.contains(25));
        assert!(SpeedBucket::From25To30.contains(30));
        assert!(!SpeedBucket::From25To30.contains(24));
        assert!(SpeedBucket::From30.contains(30));
        assert!(!SpeedBucket::From30.contains(29));
        assert!(SpeedBucket::All.contains(0));
    }

    #[test]
    fn test_combined_filters_no_matches() {
        let records = sample();
        // 2023-03-13 : 32 km/h et 25 km/h
        let filters = FilterState::new(Some(date!(2023 - 03 - 13)), SpeedBucket::From20To25);
        let view = project(&records, &filters);
        assert_eq!(view.count(), 1);
        assert_eq!(view.records()[0].plate(), "KA-08-OP-9012");

        let filters = FilterState::new(Some(date!(2023 - 03 - 16)), SpeedBucket::All);
        let view = project(&records, &filters);
        assert!(view.is_empty());
        assert_eq!(view.outcome(), Outcome::NoMatches);
    }

    #[test]
    fn test_lenient_inputs() {
        assert_eq!(SpeedBucket::parse_lenient("30+"), SpeedBucket::From30);
        assert_eq!(SpeedBucket::parse_lenient("40-50"), SpeedBucket::All);
        assert_eq!(SpeedBucket::parse_lenient(""), SpeedBucket::All);

        let mut filters = FilterState::default();
        filters.select_date_input("2023-03-14");
        assert_eq!(filters.selected_date, Some(date!(2023 - 03 - 14)));
        filters.select_date_input("not-a-date");
        assert_eq!(filters.selected_date, None);
    }

    #[test]
    fn test_override_keeps_missing_fields() {
        let base = FilterState::new(Some(date!(2023 - 03 - 14)), SpeedBucket::From25To30);
        let input = FilterInput { date: None, speed: Some("30+".into()) };
        let next = base.overridden_by(&input);
        assert_eq!(next.selected_date, Some(date!(2023 - 03 - 14)));
        assert_eq!(next.speed_bucket, SpeedBucket::From30);

        let replaced = FilterState::from_input(&input);
        assert_eq!(replaced.selected_date, None);
    }

    #[test]
    fn test_filter_state_json() {
        let state: FilterState =
            serde_json::from_str(r#"{"selected_date":"2023-13-40","speed_bucket":"10-15"}"#).unwrap();
        assert!(state.is_default());

        let state = FilterState::new(Some(date!(2023 - 03 - 15)), SpeedBucket::From20To25);
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["selected_date"], "2023-03-15");
        assert_eq!(json["speed_bucket"], "20-25");
    }

    fn arb_lane() -> impl Strategy<Value = Lane> {
        prop::sample::select(Lane::ALL.to_vec())
    }

    fn arb_record() -> impl Strategy<Value = ViolationRecord> {
        ("[A-Z]{2}-[0-9]{2}", 0u32..60, 10u8..20, arb_lane()).prop_map(|(plate, speed, day, lane)| {
            let date = Date::from_calendar_date(2023, time::Month::March, day).unwrap();
            ViolationRecord::new(plate, speed, "10:00 AM", date, lane)
        })
    }

    fn arb_filters() -> impl Strategy<Value = FilterState> {
        (
            prop::option::of(10u8..20),
            prop::sample::select(SpeedBucket::ALL.to_vec()),
        )
            .prop_map(|(day, bucket)| {
                let date = day.map(|d| Date::from_calendar_date(2023, time::Month::March, d).unwrap());
                FilterState::new(date, bucket)
            })
    }

    proptest! {
        #[test]
        fn projection_is_ordered_subsequence(records in prop::collection::vec(arb_record(), 0..40), filters in arb_filters()) {
            let view = project(&records, &filters);
            let mut cursor = records.iter();
            for kept in view.records() {
                prop_assert!(cursor.any(|r| std::ptr::eq(r, *kept)));
            }
        }

        #[test]
        fn projection_respects_predicates(records in prop::collection::vec(arb_record(), 0..40), filters in arb_filters()) {
            let view = project(&records, &filters);
            for r in view.records() {
                prop_assert!(filters.speed_bucket.contains(r.speed_kmh()));
                if let Some(date) = filters.selected_date {
                    prop_assert_eq!(r.date(), date);
                }
            }
            let rejected = records.iter().filter(|r| !filters.matches(r)).count();
            prop_assert_eq!(view.count() + rejected, records.len());
        }

        #[test]
        fn projection_is_idempotent(records in prop::collection::vec(arb_record(), 0..40), filters in arb_filters()) {
            let once = project(&records, &filters).to_owned_records();
            let twice = project(&once, &filters).to_owned_records();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn predicate_order_does_not_matter(records in prop::collection::vec(arb_record(), 0..40), filters in arb_filters()) {
            let by_date: Vec<&ViolationRecord> = records.iter()
                .filter(|r| filters.date_matches(r))
                .filter(|r| filters.speed_matches(r))
                .collect();
            let by_speed: Vec<&ViolationRecord> = records.iter()
                .filter(|r| filters.speed_matches(r))
                .filter(|r| filters.date_matches(r))
                .collect();
            prop_assert_eq!(&by_date, &by_speed);
            let view = project(&records, &filters);
            prop_assert_eq!(view.records(), by_date.as_slice());
        }
    }
}

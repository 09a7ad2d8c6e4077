use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TriageError;

/// Intensity scale per symptom: 0 = absent, 10 = as severe as it gets.
pub const MAX_INTENSITY: u8 = 10;

/// A record needs at least this many symptoms with non-zero intensity
/// before it is classifiable.
pub const MIN_REPORTED_SYMPTOMS: usize = 3;

/// Fixed symptom vocabulary. Names match the intake form, so serde uses
/// them verbatim as log keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Fiebre,
    DolorCabeza,
    Nausea,
    Fatiga,
    DolorPecho,
    DificultadRespirar,
    DolorAbdominal,
    Mareos,
    PerdidaPeso,
    Tos,
    CongestionNasal,
    DolorGarganta,
    DolorMuscular,
    DolorArticular,
    ErupcionCutanea,
    Sangrado,
    CambiosVision,
    Confusion,
    Convulsiones,
    DolorEspalda,
}

impl Symptom {
    pub const ALL: [Symptom; 20] = [
        Symptom::Fiebre,
        Symptom::DolorCabeza,
        Symptom::Nausea,
        Symptom::Fatiga,
        Symptom::DolorPecho,
        Symptom::DificultadRespirar,
        Symptom::DolorAbdominal,
        Symptom::Mareos,
        Symptom::PerdidaPeso,
        Symptom::Tos,
        Symptom::CongestionNasal,
        Symptom::DolorGarganta,
        Symptom::DolorMuscular,
        Symptom::DolorArticular,
        Symptom::ErupcionCutanea,
        Symptom::Sangrado,
        Symptom::CambiosVision,
        Symptom::Confusion,
        Symptom::Convulsiones,
        Symptom::DolorEspalda,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn name(self) -> &'static str {
        match self {
            Symptom::Fiebre => "fiebre",
            Symptom::DolorCabeza => "dolor_cabeza",
            Symptom::Nausea => "nausea",
            Symptom::Fatiga => "fatiga",
            Symptom::DolorPecho => "dolor_pecho",
            Symptom::DificultadRespirar => "dificultad_respirar",
            Symptom::DolorAbdominal => "dolor_abdominal",
            Symptom::Mareos => "mareos",
            Symptom::PerdidaPeso => "perdida_peso",
            Symptom::Tos => "tos",
            Symptom::CongestionNasal => "congestion_nasal",
            Symptom::DolorGarganta => "dolor_garganta",
            Symptom::DolorMuscular => "dolor_muscular",
            Symptom::DolorArticular => "dolor_articular",
            Symptom::ErupcionCutanea => "erupcion_cutanea",
            Symptom::Sangrado => "sangrado",
            Symptom::CambiosVision => "cambios_vision",
            Symptom::Confusion => "confusion",
            Symptom::Convulsiones => "convulsiones",
            Symptom::DolorEspalda => "dolor_espalda",
        }
    }
}

impl FromStr for Symptom {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|symptom| symptom.name() == s)
            .ok_or_else(|| TriageError::UnknownSymptom(s.to_string()))
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity bands in increasing order. The label set and ordering are part
/// of the external contract and match the persisted log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    NotSick,
    Mild,
    Acute,
    Chronic,
    Terminal,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::NotSick,
        Severity::Mild,
        Severity::Acute,
        Severity::Chronic,
        Severity::Terminal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Severity::NotSick => "NOT_SICK",
            Severity::Mild => "MILD",
            Severity::Acute => "ACUTE",
            Severity::Chronic => "CHRONIC",
            Severity::Terminal => "TERMINAL",
        }
    }

    /// Care guidance shown to the caller alongside the diagnosis, keyed on
    /// the band alone so identical diagnoses always carry identical advice.
    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            Severity::NotSick => &[
                "No current signs of severity",
                "Rest adequately and keep well hydrated",
                "Watch for new symptoms or any that worsen",
            ],
            Severity::Mild => &[
                "Symptoms consistent with a mild picture: rest and good hydration",
                "Monitor temperature and breathing",
                "See a professional if symptoms persist beyond 48-72 hours or worsen",
            ],
            Severity::Acute => &[
                "Medical attention recommended",
                "Seek evaluation within the next 24 hours",
                "Monitor vital signs (high fever, breathing difficulty)",
                "Avoid self-medication without professional advice",
            ],
            Severity::Chronic => &[
                "Urgent medical attention needed",
                "Seek specialized care immediately",
                "Possible need for hospital intervention",
                "Ongoing medical follow-up recommended",
            ],
            Severity::Terminal => &[
                "Emergency care required immediately",
                "Call emergency services or go to the nearest emergency department",
                "Do not delay treatment for any reason",
            ],
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validated patient input: symptom intensities keyed by vocabulary entry.
/// A BTreeMap keeps iteration deterministic, so classification does not
/// depend on the order symptoms were entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymptomRecord(BTreeMap<Symptom, u8>);

impl SymptomRecord {
    /// Builds a record from raw (name, intensity) pairs. Unknown names and
    /// intensities above the scale are rejected here, before any scoring.
    pub fn from_named<S>(pairs: impl IntoIterator<Item = (S, u8)>) -> Result<Self, TriageError>
    where
        S: AsRef<str>,
    {
        let mut symptoms = BTreeMap::new();
        for (name, intensity) in pairs {
            let symptom = name.as_ref().parse::<Symptom>()?;
            if intensity > MAX_INTENSITY {
                return Err(TriageError::Validation(format!(
                    "intensity for {symptom} must be between 0 and {MAX_INTENSITY}, got {intensity}"
                )));
            }
            if symptoms.insert(symptom, intensity).is_some() {
                return Err(TriageError::Validation(format!(
                    "symptom {symptom} was reported more than once"
                )));
            }
        }
        Ok(Self(symptoms))
    }

    /// Number of symptoms reported with intensity above zero.
    pub fn reported_count(&self) -> usize {
        self.0.values().filter(|intensity| **intensity > 0).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symptom, u8)> + '_ {
        self.0.iter().map(|(symptom, intensity)| (*symptom, *intensity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of one classification. Created once by the classifier, never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub severity: Severity,
    pub score: f64,
    pub recorded_at: DateTime<Utc>,
    pub symptoms: SymptomRecord,
    pub age: Option<u32>,
}

/// Persisted projection of a result: one JSON object per log line. The
/// field set is stable for the log's lifetime; `age` stays present (null
/// when unknown) so historical and current entries parse uniformly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    pub symptoms: SymptomRecord,
    pub age: Option<u32>,
    pub severity: Severity,
    pub score: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<&ClassificationResult> for PredictionLogEntry {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            symptoms: result.symptoms.clone(),
            age: result.age,
            severity: result.severity,
            score: result.score,
            recorded_at: result.recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_names_round_trip() {
        for symptom in Symptom::ALL {
            assert_eq!(symptom.name().parse::<Symptom>().unwrap(), symptom);
        }
    }

    #[test]
    fn severity_labels_follow_the_contract() {
        let labels: Vec<&str> = Severity::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, ["NOT_SICK", "MILD", "ACUTE", "CHRONIC", "TERMINAL"]);
        assert!(Severity::NotSick < Severity::Mild);
        assert!(Severity::Chronic < Severity::Terminal);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = SymptomRecord::from_named([("resfriado", 4u8)]).unwrap_err();
        assert!(matches!(err, TriageError::UnknownSymptom(name) if name == "resfriado"));
    }

    #[test]
    fn repeated_symptom_is_rejected_not_masked() {
        let err = SymptomRecord::from_named([("fiebre", 3u8), ("fiebre", 9u8)]).unwrap_err();
        assert!(matches!(err, TriageError::Validation(message) if message.contains("fiebre")));
    }

    #[test]
    fn every_band_carries_recommendations() {
        for severity in Severity::ALL {
            assert!(!severity.recommendations().is_empty());
        }
        // guidance escalates with the band, so the lists must differ
        assert_ne!(
            Severity::NotSick.recommendations(),
            Severity::Terminal.recommendations()
        );
        assert!(Severity::Chronic.recommendations()[0].contains("Urgent"));
    }

    #[test]
    fn intensity_above_scale_is_rejected() {
        let err = SymptomRecord::from_named([("fiebre", 11u8)]).unwrap_err();
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[test]
    fn reported_count_ignores_zero_intensity() {
        let record =
            SymptomRecord::from_named([("fiebre", 8u8), ("tos", 0u8), ("mareos", 2u8)]).unwrap();
        assert!(!record.is_empty());
        assert_eq!(record.len(), 3);
        assert_eq!(record.reported_count(), 2);
    }

    #[test]
    fn symptom_keys_serialize_as_vocabulary_names() {
        let record = SymptomRecord::from_named([("dolor_cabeza", 6u8)]).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"dolor_cabeza":6}"#);
    }
}

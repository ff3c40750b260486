//! Feature derivation: one raw report in, one named numeric feature vector out.
//!
//! The same [`derive`] runs for every historical training row and every
//! inference request. Callers only differ in how they obtain the symptom
//! flags (dataset `has_` columns vs free text).

use super::encoder::{normalize_body_part, CategoryEncoder};
use super::vocabulary::{SymptomFlags, SymptomVocabulary};

pub const SEVERITY_LEVEL: &str = "Severity_Level";
pub const AFFECTED_BODY_PARTS: &str = "Affected_Body_Parts";
pub const SLEEP_HOURS: &str = "Sleep_Hours";
pub const RECENT_TRAVEL_HISTORY: &str = "Recent_Travel_History";
pub const EXPOSURE_TO_SICK_PEOPLE: &str = "Exposure_to_Sick_People";

pub const SYMPTOM_COUNT: &str = "symptom_count";
pub const HIGH_RISK_FLAG: &str = "High_Risk_Flag";
pub const RESPIRATORY_ISSUE: &str = "respiratory_issue";
pub const GASTRO_ISSUE: &str = "gastro_issue";
pub const NEURO_ISSUE: &str = "neuro_issue";
pub const SYMPTOM_SEVERITY_SCORE: &str = "symptom_severity_score";
pub const SYMPTOM_CATEGORY_COUNT: &str = "symptom_category_count";

/// Base columns, in schema order.
pub const BASE_COLUMNS: [&str; 5] = [
    SEVERITY_LEVEL,
    AFFECTED_BODY_PARTS,
    SLEEP_HOURS,
    RECENT_TRAVEL_HISTORY,
    EXPOSURE_TO_SICK_PEOPLE,
];

/// Engineered columns, in schema order. They follow the symptom flags.
pub const ENGINEERED_COLUMNS: [&str; 7] = [
    SYMPTOM_COUNT,
    HIGH_RISK_FLAG,
    RESPIRATORY_ISSUE,
    GASTRO_ISSUE,
    NEURO_ISSUE,
    SYMPTOM_SEVERITY_SCORE,
    SYMPTOM_CATEGORY_COUNT,
];

/// Ordinal severity scale.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl Severity {
    /// Case-insensitive parse. Anything unrecognised is `Medium`.
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            _ => Severity::Medium,
        }
    }

    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

/// Keyword groups that feed the `*_issue` flags.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SymptomGroup {
    Respiratory,
    Gastro,
    Neuro,
}

impl SymptomGroup {
    pub const ALL: [SymptomGroup; 3] = [
        SymptomGroup::Respiratory,
        SymptomGroup::Gastro,
        SymptomGroup::Neuro,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            SymptomGroup::Respiratory => &[
                "cough",
                "fever",
                "chest_pain",
                "wheezing",
                "shortness_of_breath",
            ],
            SymptomGroup::Gastro => &["nausea", "vomiting", "diarrhea", "stomach_ache", "dehydration"],
            SymptomGroup::Neuro => &["headache", "dizziness", "confusion", "light_sensitivity"],
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SymptomGroup::Respiratory => RESPIRATORY_ISSUE,
            SymptomGroup::Gastro => GASTRO_ISSUE,
            SymptomGroup::Neuro => NEURO_ISSUE,
        }
    }

    /// 1 iff any keyword of the group is a flagged vocabulary symptom.
    pub fn issue_flag(self, vocabulary: &SymptomVocabulary, flags: &SymptomFlags) -> u32 {
        let hit = self
            .keywords()
            .iter()
            .filter_map(|kw| vocabulary.position(kw))
            .any(|pos| flags.get(pos) == 1);
        u32::from(hit)
    }
}

/// Raw report fields after the source-specific step of building symptom flags.
#[derive(Clone, Debug)]
pub struct ReportFields {
    pub symptoms: SymptomFlags,
    pub severity: String,
    pub body_part: String,
    pub sleep_hours: f64,
    pub travel_history: Option<String>,
    pub exposure: Option<String>,
}

/// Fitted artefacts derivation depends on. Borrowed, never mutated.
#[derive(Copy, Clone, Debug)]
pub struct FeatureContext<'a> {
    pub vocabulary: &'a SymptomVocabulary,
    pub body_parts: &'a CategoryEncoder,
    pub severities: &'a CategoryEncoder,
}

/// Named numeric features in derivation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: Vec::with_capacity(cap),
        }
    }

    /// Set `name`, replacing an earlier value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    fn push(&mut self, name: impl Into<String>, value: f64) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 1 iff the text says "yes" (any case). Missing or anything else is 0.
pub fn yes_flag(text: Option<&str>) -> u32 {
    u32::from(text.map_or(false, |t| t.trim().eq_ignore_ascii_case("yes")))
}

/// Column names produced by [`derive`] for a vocabulary, in order.
pub fn feature_columns(vocabulary: &SymptomVocabulary) -> Vec<String> {
    BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(vocabulary.column_names())
        .chain(ENGINEERED_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

/// Derive the full feature vector for one report.
pub fn derive(report: &ReportFields, ctx: FeatureContext<'_>) -> FeatureVector {
    let vocabulary = ctx.vocabulary;
    let flags = &report.symptoms;

    let severity_key = report.severity.trim().to_lowercase();
    if !ctx.severities.is_empty() && !ctx.severities.contains(&severity_key) {
        tracing::warn!(
            "unseen severity '{}'; treating as medium",
            report.severity.trim()
        );
    }
    let severity = Severity::from_text(&report.severity).ordinal();

    let body_code = ctx
        .body_parts
        .encode_or_default(&normalize_body_part(&report.body_part));

    let travel = yes_flag(report.travel_history.as_deref());
    let exposure = yes_flag(report.exposure.as_deref());

    let symptom_count = flags.count();
    let high_risk = u32::from(severity == Severity::High.ordinal() && symptom_count > 2);
    let issues: Vec<u32> = SymptomGroup::ALL
        .iter()
        .map(|g| g.issue_flag(vocabulary, flags))
        .collect();
    let severity_score = symptom_count * severity;
    let category_count: u32 = issues.iter().sum();

    let width = BASE_COLUMNS.len() + vocabulary.len() + ENGINEERED_COLUMNS.len();
    let mut fv = FeatureVector::with_capacity(width);
    fv.push(SEVERITY_LEVEL, f64::from(severity));
    fv.push(AFFECTED_BODY_PARTS, f64::from(body_code));
    fv.push(SLEEP_HOURS, report.sleep_hours);
    fv.push(RECENT_TRAVEL_HISTORY, f64::from(travel));
    fv.push(EXPOSURE_TO_SICK_PEOPLE, f64::from(exposure));

    for (pos, column) in vocabulary.column_names().enumerate() {
        fv.push(column, f64::from(flags.get(pos)));
    }

    fv.push(SYMPTOM_COUNT, f64::from(symptom_count));
    fv.push(HIGH_RISK_FLAG, f64::from(high_risk));
    for (group, flag) in SymptomGroup::ALL.iter().zip(&issues) {
        fv.push(group.column(), f64::from(*flag));
    }
    fv.push(SYMPTOM_SEVERITY_SCORE, f64::from(severity_score));
    fv.push(SYMPTOM_CATEGORY_COUNT, f64::from(category_count));
    fv
}

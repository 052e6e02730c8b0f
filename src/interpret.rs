//! Turns the model's free text into display-ready sections.
//!
//! Nothing here can fail: a section the model skipped or mangled becomes
//! [`NOT_PROVIDED`], and a confidence without a number gets the neutral
//! colour.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::prompt;

pub const NOT_PROVIDED: &str = "Not provided";

/// One of the four result sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Confidence,
    Organism,
    Features,
    Uncertainty,
}

impl Section {
    /// Extraction and display order.
    pub const ALL: [Section; 4] = [
        Section::Confidence,
        Section::Organism,
        Section::Features,
        Section::Uncertainty,
    ];

    /// The label the model is asked to emit.
    pub fn label(self) -> &'static str {
        match self {
            Section::Confidence => prompt::CONFIDENCE,
            Section::Organism => prompt::LIKELY_ORGANISM,
            Section::Features => prompt::KEY_VISUAL_FEATURES,
            Section::Uncertainty => prompt::UNCERTAINTY_NOTES,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Section::Confidence => "confidence",
            Section::Organism => "organism",
            Section::Features => "features",
            Section::Uncertainty => "uncertainty",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown section {0:?} (expected confidence, organism, features or uncertainty)")]
pub struct UnknownSection(pub String);

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Section::ALL
            .into_iter()
            .find(|section| section.key() == wanted || section.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

fn section_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        Section::ALL.map(|section| {
            let pattern = format!(r"(?s){}:(.*?)(?:\n\n|\z)", regex::escape(section.label()));
            Regex::new(&pattern).expect("section regex is valid")
        })
    })
}

/// The four fields pulled out of a model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAnalysis {
    pub organism: String,
    pub features: String,
    pub confidence: String,
    pub uncertainty: String,
}

impl ParsedAnalysis {
    pub fn parse(text: &str) -> Self {
        let text = text.replace("\r\n", "\n");
        let extract = |section: Section| {
            section_patterns()[section.index()]
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim())
                .filter(|value| !value.is_empty())
                .unwrap_or(NOT_PROVIDED)
                .to_string()
        };

        ParsedAnalysis {
            confidence: extract(Section::Confidence),
            organism: extract(Section::Organism),
            features: extract(Section::Features),
            uncertainty: extract(Section::Uncertainty),
        }
    }

    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Confidence => &self.confidence,
            Section::Organism => &self.organism,
            Section::Features => &self.features,
            Section::Uncertainty => &self.uncertainty,
        }
    }

    pub fn is_provided(&self, section: Section) -> bool {
        self.get(section) != NOT_PROVIDED
    }
}

/// Confidence bucket derived from the numeric part of the confidence field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    /// No number found.
    Unknown,
}

impl ConfidenceTier {
    pub fn from_field(confidence: &str) -> Self {
        let Some(value) = leading_number(confidence) else {
            return ConfidenceTier::Unknown;
        };
        let value = if value > 1.0 { value / 100.0 } else { value };

        if value >= 0.8 {
            ConfidenceTier::High
        } else if value >= 0.5 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ConfidenceTier::High => "#16a34a",
            ConfidenceTier::Medium => "#eab308",
            ConfidenceTier::Low => "#dc2626",
            ConfidenceTier::Unknown => "#fef3c7",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            ConfidenceTier::High => "AI is very confident in this assessment.",
            ConfidenceTier::Medium => "AI suggests this, but some uncertainty remains.",
            ConfidenceTier::Low => "AI is unsure; treat this as tentative.",
            ConfidenceTier::Unknown => "Confidence Measure",
        }
    }
}

/// Hex colour for a confidence field.
pub fn confidence_color(confidence: &str) -> &'static str {
    ConfidenceTier::from_field(confidence).color()
}

/// One-line reading of a confidence field.
pub fn confidence_blurb(confidence: &str) -> &'static str {
    ConfidenceTier::from_field(confidence).blurb()
}

/// Parses the longest numeric prefix after leading whitespace, the way a
/// browser's `parseFloat` does: `"85%"` is 85, `"Infinity"` and `"1e999"` are
/// infinite, `"abc"` is nothing.
fn leading_number(text: &str) -> Option<f64> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("number regex is valid")
    });
    re.find(text.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDisplay {
    pub tier: ConfidenceTier,
    pub color: String,
    pub blurb: String,
}

/// Parsed fields plus everything the UI derives from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    #[serde(flatten)]
    pub fields: ParsedAnalysis,
    pub confidence_display: ConfidenceDisplay,
}

impl Interpretation {
    pub fn from_text(text: &str) -> Self {
        let fields = ParsedAnalysis::parse(text);
        let tier = ConfidenceTier::from_field(&fields.confidence);
        Interpretation {
            fields,
            confidence_display: ConfidenceDisplay {
                tier,
                color: tier.color().to_string(),
                blurb: tier.blurb().to_string(),
            },
        }
    }
}

/// Which sections are expanded. Every section starts closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionVisibility(BTreeMap<Section, bool>);

impl Default for SectionVisibility {
    fn default() -> Self {
        Self(Section::ALL.into_iter().map(|s| (s, false)).collect())
    }
}

impl SectionVisibility {
    pub fn is_open(&self, section: Section) -> bool {
        self.0.get(&section).copied().unwrap_or(false)
    }

    /// Flips one section and returns its new state.
    pub fn toggle(&mut self, section: Section) -> bool {
        let open = self.0.entry(section).or_insert(false);
        *open = !*open;
        *open
    }

    pub fn set(&mut self, section: Section, open: bool) {
        self.0.insert(section, open);
    }

    pub fn open_all(&mut self) {
        for section in Section::ALL {
            self.set(section, true);
        }
    }
}

/// Client-side view state, owned by whichever front end drives the analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub selected_file: Option<String>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
    pub sections: SectionVisibility,
}

impl ViewState {
    /// Submission is allowed only with a file selected and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.selected_file.is_some() && !self.loading
    }

    pub fn begin_request(&mut self) {
        self.loading = true;
        self.result = None;
        self.error = None;
    }

    /// Ends the in-flight request whatever its outcome.
    pub fn finish_request(&mut self, outcome: Result<String, String>) {
        self.loading = false;
        match outcome {
            Ok(text) => self.result = Some(text),
            Err(message) => self.error = Some(message),
        }
    }

    /// Recomputed from the raw text on every call.
    pub fn interpretation(&self) -> Option<Interpretation> {
        self.result.as_deref().map(Interpretation::from_text)
    }
}

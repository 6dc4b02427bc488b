//! The five canonical compliance sections and how arbitrary model keys map onto them.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::models::compliance::SectionScores;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    PublicFile,
    Technical,
    Ownership,
    Eas,
    RfExposure,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::PublicFile,
        Section::Technical,
        Section::Ownership,
        Section::Eas,
        Section::RfExposure,
    ];

    /// The exact key the dashboard expects.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Section::PublicFile => "Public File Requirements",
            Section::Technical => "Technical Compliance",
            Section::Ownership => "Ownership Disclosure",
            Section::Eas => "EAS Compliance",
            Section::RfExposure => "RF Exposure",
        }
    }

    /// Typical score range used when the model gives no usable value.
    pub fn default_range(self) -> RangeInclusive<u8> {
        match self {
            Section::PublicFile => 70..=100,
            Section::Technical => 80..=100,
            Section::Ownership => 60..=100,
            Section::Eas => 75..=100,
            Section::RfExposure => 85..=100,
        }
    }

    /// Alternative names, already in folded form (see [`fold_key`]).
    fn synonyms(self) -> &'static [&'static str] {
        match self {
            Section::PublicFile => &[
                "public file",
                "public files",
                "public inspection file",
                "public inspection",
                "online public file",
                "opif",
                "pif",
            ],
            Section::Technical => &[
                "technical",
                "technical standards",
                "technical requirements",
                "technical operations",
                "engineering",
                "engineering standards",
            ],
            Section::Ownership => &[
                "ownership",
                "ownership report",
                "ownership reports",
                "ownership disclosures",
                "ownership reporting",
            ],
            Section::Eas => &[
                "eas",
                "emergency alert",
                "emergency alerts",
                "emergency alert system",
                "emergency alert system compliance",
            ],
            Section::RfExposure => &[
                "rf",
                "rf safety",
                "radio frequency",
                "radio frequency exposure",
                "radiofrequency exposure",
                "rf radiation",
            ],
        }
    }
}

/// Lower-cases and folds `_`, `-` and whitespace runs into single spaces.
pub fn fold_key(key: &str) -> String {
    key.to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// How strongly a model key matched a section. Lower is stronger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    Synonym,
}

/// Resolves a model-supplied key to a canonical section, or `None` to drop it.
pub fn match_section(key: &str) -> Option<(Section, MatchTier)> {
    if let Some(section) = Section::ALL.iter().find(|s| s.canonical_name() == key) {
        return Some((*section, MatchTier::Exact));
    }

    let folded = fold_key(key);
    if let Some(section) = Section::ALL
        .iter()
        .find(|s| fold_key(s.canonical_name()) == folded)
    {
        return Some((*section, MatchTier::CaseInsensitive));
    }

    Section::ALL
        .iter()
        .find(|s| s.synonyms().contains(&folded.as_str()))
        .map(|s| (*s, MatchTier::Synonym))
}

/// Section scores under construction; unset slots are filled at the end.
#[derive(Debug, Default, Clone)]
pub struct PartialScores {
    slots: [Option<(u8, MatchTier)>; 5],
}

impl PartialScores {
    /// Records a score unless a stronger (or equally strong, earlier) match already holds the slot.
    pub fn offer(&mut self, section: Section, tier: MatchTier, score: u8) {
        let slot = &mut self.slots[section as usize];
        if slot.map_or(true, |(_, held)| tier < held) {
            *slot = Some((score, tier));
        }
    }

    pub fn get(&self, section: Section) -> Option<u8> {
        self.slots[section as usize].map(|(score, _)| score)
    }

    /// Completes the set, drawing missing sections from their default ranges.
    pub fn fill<R: Rng + ?Sized>(self, rng: &mut R) -> SectionScores {
        let mut pick = |section: Section| {
            self.get(section)
                .unwrap_or_else(|| rng.gen_range(section.default_range()))
        };
        SectionScores {
            public_file_requirements: pick(Section::PublicFile),
            technical_compliance: pick(Section::Technical),
            ownership_disclosure: pick(Section::Ownership),
            eas_compliance: pick(Section::Eas),
            rf_exposure: pick(Section::RfExposure),
        }
    }
}

/// A full set of section scores drawn entirely from the default ranges.
pub fn random_scores<R: Rng + ?Sized>(rng: &mut R) -> SectionScores {
    PartialScores::default().fill(rng)
}

impl SectionScores {
    pub fn get(&self, section: Section) -> u8 {
        match section {
            Section::PublicFile => self.public_file_requirements,
            Section::Technical => self.technical_compliance,
            Section::Ownership => self.ownership_disclosure,
            Section::Eas => self.eas_compliance,
            Section::RfExposure => self.rf_exposure,
        }
    }
}

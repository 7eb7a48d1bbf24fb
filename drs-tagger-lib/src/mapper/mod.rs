use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::types::{DrsSchema, Facet, FactSet};
use crate::vocabulary::{Ambiguity, Pin, Resolution, Term, TermSource, VocabularyResolver};

/// How deep to follow platform -> programme -> group.
const PLATFORM_HIERARCHY_DEPTH: usize = 2;

/// Component for a platform value that stands for a whole programme.
const MULTI_PLATFORM: &str = "multi-platform";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetState {
    Mapped(Term),
    Unmapped,
    Ambiguous(Ambiguity),
    /// Never sent to the vocabulary; the reason is kept for the error report.
    Invalid(String),
    /// Facet without a vocabulary; the raw value is used as is.
    Literal,
    /// A platform value that names a programme or group rather than a
    /// single platform.
    Broader(Term),
}

impl From<Resolution> for FacetState {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Canonical(term) => FacetState::Mapped(term),
            Resolution::Unmapped => FacetState::Unmapped,
            Resolution::Ambiguous(ambiguity) => FacetState::Ambiguous(ambiguity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetValue {
    pub facet: Facet,
    pub raw: String,
    pub state: FacetState,
}

/// The single DRS component a facet settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledTerm {
    pub label: String,
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetOutcome {
    Settled(SettledTerm),
    Missing,
    /// Distinct terms competing for one slot.
    Conflict(Vec<String>),
    /// Raw values exist but none resolved.
    Unresolved(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetIssue {
    pub facet: Facet,
    pub kind: ErrorKind,
    pub message: String,
}

/// Everything the mapper learned about one dataset's facts.
#[derive(Debug, Clone, Default)]
pub struct MappedFacets {
    pub values: Vec<FacetValue>,
    pub outcomes: BTreeMap<Facet, FacetOutcome>,
    /// Tag URLs in discovery order, without duplicates.
    pub tag_uris: Vec<String>,
    pub issues: Vec<FacetIssue>,
}

impl MappedFacets {
    pub fn outcome(&self, facet: Facet) -> &FacetOutcome {
        self.outcomes.get(&facet).unwrap_or(&FacetOutcome::Missing)
    }

    fn issue(&mut self, facet: Facet, kind: ErrorKind, message: String) {
        self.issues.push(FacetIssue {
            facet,
            kind,
            message,
        });
    }

    fn tag(&mut self, uri: &str) {
        if !self.tag_uris.iter().any(|u| u == uri) {
            self.tag_uris.push(uri.to_string());
        }
    }
}

/// Turns raw facts into vocabulary terms and reconciles them per facet.
pub struct FacetMapper {
    resolver: Arc<VocabularyResolver>,
    schema: Arc<DrsSchema>,
    pins: Vec<Pin>,
}

impl FacetMapper {
    pub fn new(resolver: Arc<VocabularyResolver>, schema: Arc<DrsSchema>, pins: Vec<Pin>) -> Self {
        Self {
            resolver,
            schema,
            pins,
        }
    }

    /// Resolve every (facet, raw value) pair.
    pub fn map(&self, facts: &FactSet) -> Vec<FacetValue> {
        facts
            .iter()
            .map(|(facet, raw)| FacetValue {
                facet,
                raw: raw.to_string(),
                state: self.state_of(facet, raw),
            })
            .collect()
    }

    fn state_of(&self, facet: Facet, raw: &str) -> FacetState {
        if let Some(reason) = invalid_reason(raw) {
            return FacetState::Invalid(reason.to_string());
        }
        if !facet.is_controlled() {
            return FacetState::Literal;
        }
        let raw = raw.trim();
        match self.resolver.resolve(facet, raw) {
            Resolution::Unmapped if facet == Facet::Platform => self.platform_as_programme(raw),
            resolution => resolution.into(),
        }
    }

    /// Platform values such as "ESA" or "NOAA" name a whole programme.
    fn platform_as_programme(&self, raw: &str) -> FacetState {
        for broader in [Facet::PlatformProgramme, Facet::PlatformGroup] {
            if let Resolution::Canonical(term) = self.resolver.resolve(broader, raw) {
                tracing::debug!("platform \"{}\" is the {} {}", raw, broader, term.uri);
                return FacetState::Broader(term);
            }
        }
        FacetState::Unmapped
    }

    /// Map the union of a dataset's facts and settle each facet.
    pub fn map_dataset(&self, facts: &FactSet) -> MappedFacets {
        let mut mapped = MappedFacets {
            values: self.map(facts),
            ..MappedFacets::default()
        };

        self.report_values(&mut mapped);
        self.collect_tags(&mut mapped);

        let facets: Vec<Facet> = facts
            .facets()
            .chain(self.schema.facets.iter().copied())
            .collect();
        for facet in facets {
            if mapped.outcomes.contains_key(&facet) {
                continue;
            }
            let outcome = self.settle(facet, &mut mapped);
            mapped.outcomes.insert(facet, outcome);
        }
        mapped
    }

    fn report_values(&self, mapped: &mut MappedFacets) {
        let mut issues = Vec::new();
        for value in &mapped.values {
            let message = match &value.state {
                FacetState::Unmapped => format!(
                    "invalid value \"{}\" for {}: not in the vocabulary",
                    value.raw, value.facet
                ),
                FacetState::Invalid(reason) => {
                    format!("invalid value {:?} for {}: {}", value.raw, value.facet, reason)
                }
                FacetState::Ambiguous(Ambiguity::Candidates(uris)) => format!(
                    "invalid value \"{}\" for {}: matches several terms {:?}",
                    value.raw, value.facet, uris
                ),
                FacetState::Ambiguous(Ambiguity::Unavailable(e)) => {
                    issues.push((
                        value.facet,
                        ErrorKind::VocabularyUnavailable,
                        format!("could not resolve {} \"{}\": {}", value.facet, value.raw, e),
                    ));
                    continue;
                }
                FacetState::Mapped(_) | FacetState::Literal | FacetState::Broader(_) => continue,
            };
            issues.push((value.facet, ErrorKind::InvalidValue, message));
        }
        for (facet, kind, message) in issues {
            mapped.issue(facet, kind, message);
        }
    }

    fn collect_tags(&self, mapped: &mut MappedFacets) {
        let terms: Vec<(Facet, String)> = mapped
            .values
            .iter()
            .filter_map(|v| match &v.state {
                FacetState::Mapped(term) | FacetState::Broader(term) => {
                    Some((v.facet, term.uri.clone()))
                }
                _ => None,
            })
            .collect();

        for (facet, uri) in terms {
            mapped.tag(&uri);
            if facet != Facet::Platform {
                continue;
            }
            match self.resolver.broader_chain(&uri, PLATFORM_HIERARCHY_DEPTH) {
                Ok(chain) => chain.iter().for_each(|concept| mapped.tag(&concept.uri)),
                Err(e) => mapped.issue(
                    facet,
                    ErrorKind::VocabularyUnavailable,
                    format!("could not find the programme of platform {}: {}", uri, e),
                ),
            }
        }
    }

    fn settle(&self, facet: Facet, mapped: &mut MappedFacets) -> FacetOutcome {
        let values: Vec<&FacetValue> = mapped.values.iter().filter(|v| v.facet == facet).collect();
        if values.is_empty() {
            return FacetOutcome::Missing;
        }

        if !facet.is_controlled() {
            let literals: Vec<String> = values
                .iter()
                .filter(|v| v.state == FacetState::Literal)
                .map(|v| v.raw.trim().to_string())
                .collect();
            return match literals.as_slice() {
                [] => FacetOutcome::Unresolved(values.iter().map(|v| v.raw.clone()).collect()),
                [single] => FacetOutcome::Settled(SettledTerm {
                    label: single.clone(),
                    uris: Vec::new(),
                }),
                _ => {
                    let candidates: Vec<String> =
                        literals.iter().map(|l| format!("\"{}\"", l)).collect();
                    self.report_conflict(facet, &candidates, mapped);
                    FacetOutcome::Conflict(literals)
                }
            };
        }

        if values.iter().any(|v| matches!(v.state, FacetState::Broader(_))) {
            let mut uris: Vec<String> = Vec::new();
            for value in &values {
                if let FacetState::Mapped(term) | FacetState::Broader(term) = &value.state {
                    if !uris.contains(&term.uri) {
                        uris.push(term.uri.clone());
                    }
                }
            }
            let label = self.schema.multi_label(facet).unwrap_or(MULTI_PLATFORM);
            return FacetOutcome::Settled(SettledTerm {
                label: label.to_string(),
                uris,
            });
        }

        let mut terms: Vec<&Term> = Vec::new();
        for value in &values {
            if let FacetState::Mapped(term) = &value.state {
                match terms.iter().find(|t| t.uri == term.uri) {
                    Some(existing) if existing.source != term.source => {
                        tracing::warn!(
                            "{} \"{}\" reaches {} through a {} mapping as well; using the local override",
                            facet,
                            value.raw,
                            term.uri,
                            if term.source == TermSource::Override { "local" } else { "vocabulary" }
                        );
                    }
                    Some(_) => {}
                    None => terms.push(term),
                }
            }
        }
        // Overrides take precedence when both paths reach the same term.
        let terms: Vec<Term> = terms
            .into_iter()
            .map(|t| {
                values
                    .iter()
                    .find_map(|v| match &v.state {
                        FacetState::Mapped(o) if o.uri == t.uri && o.source == TermSource::Override => {
                            Some(o.clone())
                        }
                        _ => None,
                    })
                    .unwrap_or_else(|| t.clone())
            })
            .collect();

        match terms.as_slice() {
            [] => FacetOutcome::Unresolved(values.iter().map(|v| v.raw.clone()).collect()),
            [term] => FacetOutcome::Settled(SettledTerm {
                label: term.label.clone(),
                uris: vec![term.uri.clone()],
            }),
            _ => self.settle_many(facet, &terms, mapped),
        }
    }

    fn settle_many(&self, facet: Facet, terms: &[Term], mapped: &mut MappedFacets) -> FacetOutcome {
        let uris: Vec<String> = terms.iter().map(|t| t.uri.clone()).collect();

        if let Some(label) = self.schema.multi_label(facet) {
            return FacetOutcome::Settled(SettledTerm {
                label: label.to_string(),
                uris,
            });
        }

        if self.resolver.uses_overrides() {
            let pinned = self
                .pins
                .iter()
                .filter(|pin| pin.facet == facet)
                .find_map(|pin| terms.iter().find(|t| t.uri == pin.uri));
            if let Some(term) = pinned {
                tracing::warn!(
                    "{} has conflicting terms {:?}; pinned to {}",
                    facet,
                    uris,
                    term.uri
                );
                return FacetOutcome::Settled(SettledTerm {
                    label: term.label.clone(),
                    uris: vec![term.uri.clone()],
                });
            }
        }

        let candidates = values_for(mapped, facet);
        self.report_conflict(facet, &candidates, mapped);
        FacetOutcome::Conflict(uris)
    }

    /// Conflicts outside the DRS still reach the error log, as warnings.
    fn report_conflict(&self, facet: Facet, candidates: &[String], mapped: &mut MappedFacets) {
        let kind = if self.schema.requires(facet) {
            ErrorKind::FacetConflict
        } else {
            ErrorKind::OptionalFacetConflict
        };
        mapped.issue(
            facet,
            kind,
            format!("conflicting values for {}: {}", facet, candidates.join(", ")),
        );
    }
}

/// "raw -> uri" for every mapped value of the facet.
fn values_for(mapped: &MappedFacets, facet: Facet) -> Vec<String> {
    mapped
        .values
        .iter()
        .filter(|v| v.facet == facet)
        .filter_map(|v| match &v.state {
            FacetState::Mapped(term) => Some(format!("\"{}\" -> {}", v.raw, term.uri)),
            _ => None,
        })
        .collect()
}

fn invalid_reason(raw: &str) -> Option<&'static str> {
    if raw.trim().is_empty() {
        Some("empty value")
    } else if raw.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    }
}

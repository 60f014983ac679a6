use super::domain::{CompetencyId, CriterionId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionDefinition {
    pub id: CriterionId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyDefinition {
    pub id: CompetencyId,
    pub label: String,
    pub criteria: Vec<CriterionDefinition>,
}

/// Ordered competency and criterion catalogue for one subject and level.
///
/// Order is significant: reports enumerate competencies and criteria in the
/// order they are declared here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectTaxonomy {
    pub subject: String,
    pub level: String,
    pub competencies: Vec<CompetencyDefinition>,
}

impl SubjectTaxonomy {
    /// Rejects duplicate competency ids and duplicate criteria inside a competency.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut competencies = HashSet::new();
        for competency in &self.competencies {
            if !competencies.insert(&competency.id) {
                return Err(SchemaError::DuplicateCompetency {
                    subject: self.subject.clone(),
                    competency: competency.id.to_string(),
                });
            }

            let mut criteria = HashSet::new();
            for criterion in &competency.criteria {
                if !criteria.insert(&criterion.id) {
                    return Err(SchemaError::DuplicateCriterion {
                        subject: self.subject.clone(),
                        competency: competency.id.to_string(),
                        criterion: criterion.id.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn competency(&self, id: &CompetencyId) -> Option<&CompetencyDefinition> {
        self.competencies.iter().find(|competency| &competency.id == id)
    }

    pub fn contains(&self, competency: &CompetencyId) -> bool {
        self.competency(competency).is_some()
    }

    /// Checks a (competency, criterion) pair against the catalogue.
    pub fn criterion_ref(
        &self,
        competency: impl Into<CompetencyId>,
        criterion: impl Into<CriterionId>,
    ) -> Result<CriterionRef, SchemaError> {
        let competency = competency.into();
        let criterion = criterion.into();
        let definition = self
            .competency(&competency)
            .ok_or_else(|| SchemaError::UnknownCompetency {
                subject: self.subject.clone(),
                competency: competency.to_string(),
            })?;

        if !definition.criteria.iter().any(|entry| entry.id == criterion) {
            return Err(SchemaError::UnknownCriterion {
                subject: self.subject.clone(),
                competency: competency.to_string(),
                criterion: criterion.to_string(),
            });
        }

        Ok(CriterionRef {
            competency,
            criterion,
        })
    }

    /// Every criterion of the subject, in declaration order.
    pub fn all_criteria(&self) -> CriterionSet {
        CriterionSet(
            self.competencies
                .iter()
                .flat_map(|competency| {
                    competency.criteria.iter().map(|criterion| CriterionRef {
                        competency: competency.id.clone(),
                        criterion: criterion.id.clone(),
                    })
                })
                .collect(),
        )
    }

    pub fn competency_criteria(&self, id: &CompetencyId) -> Result<CriterionSet, SchemaError> {
        let definition = self
            .competency(id)
            .ok_or_else(|| SchemaError::UnknownCompetency {
                subject: self.subject.clone(),
                competency: id.to_string(),
            })?;

        Ok(CriterionSet(
            definition
                .criteria
                .iter()
                .map(|criterion| CriterionRef {
                    competency: definition.id.clone(),
                    criterion: criterion.id.clone(),
                })
                .collect(),
        ))
    }

    /// Resolves a declarative selection into a checked criterion set.
    pub fn select(&self, selection: &[CriterionSelector]) -> Result<CriterionSet, SchemaError> {
        let mut refs = Vec::new();
        for selector in selection {
            match &selector.criteria {
                Some(criteria) => {
                    for criterion in criteria {
                        refs.push(self.criterion_ref(selector.competency.clone(), criterion.clone())?);
                    }
                }
                None => refs.extend(self.competency_criteria(&selector.competency)?.0),
            }
        }

        Ok(CriterionSet(refs))
    }
}

/// A (competency, criterion) pair known to exist in a taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CriterionRef {
    pub competency: CompetencyId,
    pub criterion: CriterionId,
}

/// Declarative selection used in profile definitions: a whole competency when
/// `criteria` is omitted, otherwise the listed criteria of that competency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionSelector {
    pub competency: CompetencyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Vec<CriterionId>>,
}

impl CriterionSelector {
    pub fn competency(id: impl Into<CompetencyId>) -> Self {
        Self {
            competency: id.into(),
            criteria: None,
        }
    }

    pub fn criteria<I, C>(id: impl Into<CompetencyId>, criteria: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CriterionId>,
    {
        Self {
            competency: id.into(),
            criteria: Some(criteria.into_iter().map(Into::into).collect()),
        }
    }
}

/// Ordered list of checked criterion references fed to the scorers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CriterionSet(Vec<CriterionRef>);

impl CriterionSet {
    pub fn iter(&self) -> std::slice::Iter<'_, CriterionRef> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a CriterionSet {
    type Item = &'a CriterionRef;
    type IntoIter = std::slice::Iter<'a, CriterionRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Configuration does not match the data model. Always a bug in the profile
/// or taxonomy, never an empty-data condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("subject '{subject}' has no competency '{competency}'")]
    UnknownCompetency { subject: String, competency: String },
    #[error("competency '{competency}' of subject '{subject}' has no criterion '{criterion}'")]
    UnknownCriterion {
        subject: String,
        competency: String,
        criterion: String,
    },
    #[error("subject '{subject}' declares competency '{competency}' more than once")]
    DuplicateCompetency { subject: String, competency: String },
    #[error("competency '{competency}' of subject '{subject}' declares criterion '{criterion}' more than once")]
    DuplicateCriterion {
        subject: String,
        competency: String,
        criterion: String,
    },
    #[error("no profile registered for subject '{0}'")]
    UnknownSubject(String),
    #[error("profile for subject '{subject}' is invalid: {detail}")]
    InvalidProfile { subject: String, detail: String },
}

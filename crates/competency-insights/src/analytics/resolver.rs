use super::domain::{CompetencyId, CriterionId, Grade, Student};
use super::taxonomy::{CriterionRef, CriterionSet};

/// Looks up the grade a student holds on one criterion.
///
/// `None` means ungraded: the competency is missing, the criterion is missing,
/// or the stored cell was not a valid letter. Absence is valid domain state.
pub fn resolve(
    student: &Student,
    competency: &CompetencyId,
    criterion: &CriterionId,
) -> Option<Grade> {
    student.results.get(competency, criterion)
}

pub fn resolve_ref(student: &Student, criterion: &CriterionRef) -> Option<Grade> {
    resolve(student, &criterion.competency, &criterion.criterion)
}

/// Grades a student actually holds within a criterion set, in set order.
pub fn graded<'a>(
    student: &'a Student,
    criteria: &'a CriterionSet,
) -> impl Iterator<Item = Grade> + 'a {
    criteria
        .iter()
        .filter_map(move |criterion| resolve_ref(student, criterion))
}

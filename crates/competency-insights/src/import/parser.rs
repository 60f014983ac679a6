use super::normalizer::{normalize_header, normalize_name};
use crate::analytics::domain::{ClassRecord, Student};
use csv::StringRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// One grade cell in long format.
#[derive(Debug, Deserialize)]
struct GradeRow {
    school: String,
    class: String,
    #[serde(default)]
    level: String,
    subject: String,
    student: String,
    #[serde(default)]
    competency: String,
    #[serde(default)]
    criterion: String,
    #[serde(default)]
    grade: String,
}

/// Groups long-format rows into class records, keeping first-seen order for
/// classes and for students inside a class.
pub(crate) fn parse_csv<R: Read>(reader: R) -> Result<Vec<ClassRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: StringRecord = csv_reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();
    csv_reader.set_headers(headers);

    let mut records: Vec<ClassRecord> = Vec::new();
    let mut classes: HashMap<(String, String, String), usize> = HashMap::new();
    let mut students: HashMap<(usize, String), usize> = HashMap::new();

    for row in csv_reader.deserialize::<GradeRow>() {
        let row = row?;
        let school = normalize_name(&row.school);
        let class_name = normalize_name(&row.class);
        let subject = normalize_name(&row.subject);
        let full_name = normalize_name(&row.student);
        if full_name.is_empty() {
            continue;
        }

        let class_index = *classes
            .entry((school.clone(), class_name.clone(), subject.clone()))
            .or_insert_with(|| {
                records.push(ClassRecord {
                    school,
                    class_name,
                    level: String::new(),
                    subject,
                    students: Vec::new(),
                });
                records.len() - 1
            });
        let record = &mut records[class_index];
        if record.level.is_empty() {
            record.level = normalize_name(&row.level);
        }

        let student_index = *students
            .entry((class_index, full_name.clone()))
            .or_insert_with(|| {
                record.students.push(Student::new(full_name));
                record.students.len() - 1
            });

        if !row.competency.is_empty() && !row.criterion.is_empty() {
            record.students[student_index].results.record(
                row.competency.as_str(),
                row.criterion.as_str(),
                &row.grade,
            );
        }
    }

    Ok(records)
}

pub(crate) fn parse_json<R: Read>(reader: R) -> Result<Vec<ClassRecord>, serde_json::Error> {
    serde_json::from_reader(reader)
}

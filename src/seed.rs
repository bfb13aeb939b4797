//! Semester catalogue loading.
//!
//! A semester data set lists departments, teachers and subjects with their
//! classes. Loading is idempotent: rows are matched on their natural keys
//! and inserted only when missing, so a data set can be applied on every
//! startup.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::domain::models::{Department, Semester};

#[derive(Debug, Clone, Deserialize)]
pub struct SemesterData {
    pub semester: Semester,
    pub departments: Vec<Department>,
    pub teachers: Vec<TeacherSeed>,
    pub subjects: Vec<SubjectSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeacherSeed {
    pub name: String,
    pub department_code: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectSeed {
    pub code: String,
    pub name: String,
    pub department_code: i64,
    #[serde(default)]
    pub classes: Vec<ClassSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassSeed {
    pub code: String,
    pub teacher: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub filled_seats: i64,
    #[serde(default)]
    pub total_seats: i64,
}

/// Where semester data sets come from.
#[async_trait]
pub trait SemesterSource: Send + Sync {
    async fn load(&self, semester: Semester) -> Result<SemesterData>;
}

/// Data sets compiled into the binary.
pub struct EmbeddedSemesters;

const EMBEDDED: &[(Semester, &str)] = &[
    (Semester { year: 2022, number: 1 }, include_str!("../seed/2022.1.json")),
    (Semester { year: 2022, number: 2 }, include_str!("../seed/2022.2.json")),
    (Semester { year: 2023, number: 1 }, include_str!("../seed/2023.1.json")),
];

impl EmbeddedSemesters {
    pub fn available() -> Vec<Semester> {
        EMBEDDED.iter().map(|(semester, _)| *semester).collect()
    }
}

#[async_trait]
impl SemesterSource for EmbeddedSemesters {
    async fn load(&self, semester: Semester) -> Result<SemesterData> {
        let (_, raw) = EMBEDDED
            .iter()
            .find(|(s, _)| *s == semester)
            .ok_or_else(|| anyhow!("no built-in data for semester {semester}"))?;
        parse_semester(semester, raw)
    }
}

/// `<dir>/<year>.<number>.json` files.
pub struct DirectorySemesters {
    dir: PathBuf,
}

impl DirectorySemesters {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SemesterSource for DirectorySemesters {
    async fn load(&self, semester: Semester) -> Result<SemesterData> {
        let path = self.dir.join(format!("{semester}.json"));
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_semester(semester, &raw)
    }
}

fn parse_semester(semester: Semester, raw: &str) -> Result<SemesterData> {
    let data: SemesterData = serde_json::from_str(raw)
        .with_context(|| format!("invalid data set for semester {semester}"))?;
    if data.semester != semester {
        return Err(anyhow!(
            "data set declares semester {} but {} was requested",
            data.semester,
            semester
        ));
    }
    Ok(data)
}

/// Row counts of one applied data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub semester: Semester,
    pub departments: usize,
    pub teachers: usize,
    pub subjects: usize,
    /// Classes in the data set.
    pub classes: usize,
    /// Classes that were not stored yet.
    pub classes_added: usize,
}

pub async fn seed_semesters(
    pool: &SqlitePool,
    source: &dyn SemesterSource,
    semesters: &[Semester],
) -> Result<Vec<SeedReport>> {
    let mut reports = Vec::with_capacity(semesters.len());
    for semester in semesters {
        tracing::info!("Loading data for semester {}", semester);
        let data = source.load(*semester).await?;
        let report = seed_semester(pool, &data)
            .await
            .with_context(|| format!("failed to load semester {semester}"))?;
        tracing::info!(
            "Semester {} loaded: {} subjects, {} classes ({} new), {} teachers",
            semester,
            report.subjects,
            report.classes,
            report.classes_added,
            report.teachers
        );
        reports.push(report);
    }
    Ok(reports)
}

/// Applies one data set inside a single transaction.
pub async fn seed_semester(pool: &SqlitePool, data: &SemesterData) -> Result<SeedReport> {
    let mut tx = pool.begin().await?;

    for department in &data.departments {
        sqlx::query("INSERT OR IGNORE INTO departments (code, name) VALUES (?, ?)")
            .bind(department.code)
            .bind(&department.name)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("INSERT OR IGNORE INTO semesters (year, number) VALUES (?, ?)")
        .bind(data.semester.year)
        .bind(data.semester.number)
        .execute(&mut *tx)
        .await?;
    let semester_id: i64 =
        sqlx::query_scalar("SELECT id FROM semesters WHERE year = ? AND number = ?")
            .bind(data.semester.year)
            .bind(data.semester.number)
            .fetch_one(&mut *tx)
            .await?;

    let mut teacher_ids: HashMap<&str, i64> = HashMap::new();
    for teacher in &data.teachers {
        let id = upsert_teacher(&mut tx, &teacher.name, teacher.department_code).await?;
        teacher_ids.insert(teacher.name.as_str(), id);
    }

    let mut classes = 0;
    let mut classes_added = 0;
    for subject in &data.subjects {
        sqlx::query(
            "INSERT OR IGNORE INTO subjects (code, name, department_code, semester_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&subject.code)
        .bind(&subject.name)
        .bind(subject.department_code)
        .bind(semester_id)
        .execute(&mut *tx)
        .await?;
        let subject_id: i64 =
            sqlx::query_scalar("SELECT id FROM subjects WHERE code = ? AND semester_id = ?")
                .bind(&subject.code)
                .bind(semester_id)
                .fetch_one(&mut *tx)
                .await?;

        for class in &subject.classes {
            // Teachers missing from the list are assumed to belong to the
            // subject's department.
            let teacher_id = match class.teacher.as_deref() {
                Some(name) => match teacher_ids.get(name) {
                    Some(id) => Some(*id),
                    None => {
                        let id = upsert_teacher(&mut tx, name, subject.department_code).await?;
                        teacher_ids.insert(name, id);
                        Some(id)
                    }
                },
                None => None,
            };

            let inserted = sqlx::query(
                r#"
                INSERT OR IGNORE INTO classes (
                    code, subject_id, teacher_id, schedule, location, filled_seats, total_seats
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&class.code)
            .bind(subject_id)
            .bind(teacher_id)
            .bind(&class.schedule)
            .bind(&class.location)
            .bind(class.filled_seats)
            .bind(class.total_seats)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            classes += 1;
            classes_added += inserted as usize;
        }
    }

    tx.commit().await?;

    Ok(SeedReport {
        semester: data.semester,
        departments: data.departments.len(),
        teachers: teacher_ids.len(),
        subjects: data.subjects.len(),
        classes,
        classes_added,
    })
}

async fn upsert_teacher(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    department_code: i64,
) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO teachers (name, department_code) VALUES (?, ?)")
        .bind(name)
        .bind(department_code)
        .execute(&mut **tx)
        .await?;
    let id = sqlx::query_scalar("SELECT id FROM teachers WHERE name = ? AND department_code = ?")
        .bind(name)
        .bind(department_code)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{ClassDao, SubjectDao, TeacherDao};
    use crate::test_utils::fixtures;

    #[tokio::test]
    async fn test_embedded_semesters_parse() {
        for semester in EmbeddedSemesters::available() {
            let data = EmbeddedSemesters.load(semester).await.unwrap();
            assert_eq!(data.semester, semester);
            assert!(!data.subjects.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_embedded_semester() {
        let result = EmbeddedSemesters.load(Semester::new(1999, 1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let pool = fixtures::setup_test_db().await;
        let semesters = EmbeddedSemesters::available();

        let first = seed_semesters(&pool, &EmbeddedSemesters, &semesters).await.unwrap();
        let classes_once = ClassDao::new(pool.clone()).get_all_classes().await.unwrap().len();
        let teachers_once = TeacherDao::new(pool.clone()).get_all_teachers().await.unwrap().len();

        let second = seed_semesters(&pool, &EmbeddedSemesters, &semesters).await.unwrap();
        let classes_twice = ClassDao::new(pool.clone()).get_all_classes().await.unwrap().len();
        let teachers_twice = TeacherDao::new(pool.clone()).get_all_teachers().await.unwrap().len();

        assert!(classes_once > 0);
        assert_eq!(classes_once, classes_twice);
        assert_eq!(teachers_once, teachers_twice);
        assert_eq!(first.iter().map(|r| r.classes_added).sum::<usize>(), classes_once);
        assert!(second.iter().all(|r| r.classes_added == 0 && r.classes > 0));
    }

    #[tokio::test]
    async fn test_same_subject_code_per_semester() {
        let pool = fixtures::setup_test_db().await;
        seed_semesters(&pool, &EmbeddedSemesters, &EmbeddedSemesters::available())
            .await
            .unwrap();

        let subjects = SubjectDao::new(pool).get_all_subjects().await.unwrap();
        let offerings = subjects.iter().filter(|s| s.code == "CIC0004").count();
        assert_eq!(offerings, EmbeddedSemesters::available().len());
        // Newest semester first
        assert_eq!(subjects[0].semester, Semester::new(2023, 1));
    }

    #[tokio::test]
    async fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        let raw = r#"{
            "semester": { "year": 2024, "number": 2 },
            "departments": [{ "code": 113, "name": "Departamento de Matemática" }],
            "teachers": [],
            "subjects": [{
                "code": "MAT0025",
                "name": "CÁLCULO 1",
                "department_code": 113,
                "classes": [{ "code": "A", "teacher": "ANA LIMA", "schedule": "246M12" }]
            }]
        }"#;
        std::fs::write(dir.path().join("2024.2.json"), raw).unwrap();

        let pool = fixtures::setup_test_db().await;
        let source = DirectorySemesters::new(dir.path());
        let reports = seed_semesters(&pool, &source, &[Semester::new(2024, 2)])
            .await
            .unwrap();
        assert_eq!(reports[0].classes, 1);
        assert_eq!(reports[0].teachers, 1);

        let classes = ClassDao::new(pool).get_all_classes().await.unwrap();
        assert_eq!(classes[0].teacher_name.as_deref(), Some("ANA LIMA"));
        assert_eq!(classes[0].filled_seats, 0);
    }

    #[tokio::test]
    async fn test_directory_source_rejects_mismatched_semester() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("2024.1.json"),
            r#"{ "semester": { "year": 2020, "number": 1 }, "departments": [], "teachers": [], "subjects": [] }"#,
        )
        .unwrap();

        let source = DirectorySemesters::new(dir.path());
        assert!(source.load(Semester::new(2024, 1)).await.is_err());
    }
}

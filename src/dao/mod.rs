//! Data access objects, one per table.
//!
//! Every query is parameterized; single-row lookups go through
//! `fetch_optional` so a missing row surfaces as `None`.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::{Class, Review, ReviewTarget, Semester, Subject, Teacher};

mod class_dao;
mod report_dao;
mod review_dao;
mod subject_dao;
mod teacher_dao;
mod user_dao;

pub use class_dao::ClassDao;
pub use report_dao::ReportDao;
pub use review_dao::ReviewDao;
pub use subject_dao::SubjectDao;
pub use teacher_dao::TeacherDao;
pub use user_dao::UserDao;

const CLASS_SELECT: &str = r#"
    SELECT
        c.id, c.code, c.subject_id,
        s.code AS subject_code, s.name AS subject_name, s.department_code,
        c.teacher_id, t.name AS teacher_name,
        c.schedule, c.location, c.filled_seats, c.total_seats,
        se.year AS semester_year, se.number AS semester_number,
        (SELECT AVG(r.rating) FROM reviews r WHERE r.class_id = c.id) AS score,
        (SELECT COUNT(*) FROM reviews r WHERE r.class_id = c.id) AS review_count
    FROM classes c
    JOIN subjects s ON s.id = c.subject_id
    JOIN semesters se ON se.id = s.semester_id
    LEFT JOIN teachers t ON t.id = c.teacher_id
"#;

const TEACHER_SELECT: &str = r#"
    SELECT
        t.id, t.name, t.department_code, d.name AS department_name, t.profile_picture,
        (SELECT AVG(r.rating) FROM reviews r WHERE r.teacher_id = t.id) AS score,
        (SELECT COUNT(*) FROM reviews r WHERE r.teacher_id = t.id) AS review_count
    FROM teachers t
    JOIN departments d ON d.code = t.department_code
"#;

const SUBJECT_SELECT: &str = r#"
    SELECT
        s.id, s.code, s.name, s.department_code, d.name AS department_name,
        se.year AS semester_year, se.number AS semester_number,
        (SELECT AVG(r.rating) FROM reviews r
            JOIN classes c ON c.id = r.class_id
            WHERE c.subject_id = s.id) AS score,
        (SELECT COUNT(*) FROM reviews r
            JOIN classes c ON c.id = r.class_id
            WHERE c.subject_id = s.id) AS review_count
    FROM subjects s
    JOIN departments d ON d.code = s.department_code
    JOIN semesters se ON se.id = s.semester_id
"#;

const REVIEW_SELECT: &str = r#"
    SELECT
        r.id, r.class_id, r.teacher_id, r.rating, r.comment,
        r.user_registration_number, u.name AS user_name
    FROM reviews r
    JOIN users u ON u.registration_number = r.user_registration_number
"#;

// Helper functions to convert rows to domain types

fn row_to_semester(row: &SqliteRow) -> Semester {
    Semester {
        year: row.get("semester_year"),
        number: row.get("semester_number"),
    }
}

fn row_to_class(row: &SqliteRow) -> Class {
    Class {
        id: row.get("id"),
        code: row.get("code"),
        subject_id: row.get("subject_id"),
        subject_code: row.get("subject_code"),
        subject_name: row.get("subject_name"),
        department_code: row.get("department_code"),
        teacher_id: row.get("teacher_id"),
        teacher_name: row.get("teacher_name"),
        schedule: row.get("schedule"),
        location: row.get("location"),
        filled_seats: row.get("filled_seats"),
        total_seats: row.get("total_seats"),
        semester: row_to_semester(row),
        score: row.get("score"),
        review_count: row.get("review_count"),
    }
}

fn row_to_teacher(row: &SqliteRow) -> Teacher {
    Teacher {
        id: row.get("id"),
        name: row.get("name"),
        department_code: row.get("department_code"),
        department_name: row.get("department_name"),
        profile_picture: row.get("profile_picture"),
        score: row.get("score"),
        review_count: row.get("review_count"),
    }
}

fn row_to_subject(row: &SqliteRow) -> Subject {
    Subject {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        department_code: row.get("department_code"),
        department_name: row.get("department_name"),
        semester: row_to_semester(row),
        score: row.get("score"),
        review_count: row.get("review_count"),
    }
}

fn row_to_review(row: &SqliteRow) -> Review {
    // The CHECK constraint guarantees exactly one of the two is set.
    let target = match row.get::<Option<i64>, _>("class_id") {
        Some(class_id) => ReviewTarget::Class(class_id),
        None => ReviewTarget::Teacher(row.get("teacher_id")),
    };

    Review {
        id: row.get("id"),
        target,
        rating: row.get("rating"),
        comment: row.get("comment"),
        user_registration_number: row.get("user_registration_number"),
        user_name: row.get("user_name"),
    }
}

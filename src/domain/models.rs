//! Domain records shared by the data layer and the screen snapshots.
//!
//! Every record is a plain value: DAOs build them from rows, view models copy
//! them into snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};

/// Registration numbers are exactly this many digits.
pub const REGISTRATION_NUMBER_LENGTH: usize = 9;

/// Upper bound for free-text user fields.
pub const FIELD_MAX_LENGTH: usize = 100;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

// ====== Catalogue ======

/// Academic semester, displayed as `2022.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Semester {
    pub year: i64,
    pub number: i64,
}

impl Semester {
    pub fn new(year: i64, number: i64) -> Self {
        Self { year, number }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.year, self.number)
    }
}

impl FromStr for Semester {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, number) = s
            .split_once('.')
            .ok_or_else(|| anyhow!("semester must look like YEAR.NUMBER, got {s:?}"))?;
        Ok(Self {
            year: year.trim().parse().context("invalid semester year")?,
            number: number.trim().parse().context("invalid semester number")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub code: i64,
    pub name: String,
}

/// Average rating and number of reviews of one review target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreSummary {
    /// `None` when the target has no reviews.
    pub score: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub department_code: i64,
    pub department_name: String,
    pub semester: Semester,
    pub score: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub id: i64,
    pub code: String,
    pub subject_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    pub department_code: i64,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub filled_seats: i64,
    pub total_seats: i64,
    pub semester: Semester,
    pub score: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub department_code: i64,
    pub department_name: String,
    pub profile_picture: Option<Vec<u8>>,
    pub score: Option<f64>,
    pub review_count: i64,
}

// ====== Accounts ======

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub registration_number: String,
    pub name: String,
    pub course: Option<String>,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<Vec<u8>>,
    pub is_administrator: bool,
}

impl User {
    /// A regular (non-administrator) account without a picture.
    pub fn new(
        registration_number: impl Into<String>,
        name: impl Into<String>,
        course: Option<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            registration_number: registration_number.into(),
            name: name.into(),
            course,
            email: email.into(),
            password: password.into(),
            profile_picture: None,
            is_administrator: false,
        }
    }
}

// ====== Reviews ======

/// What a review is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReviewTarget {
    Class(i64),
    Teacher(i64),
}

impl ReviewTarget {
    pub fn class_id(&self) -> Option<i64> {
        match self {
            ReviewTarget::Class(id) => Some(*id),
            ReviewTarget::Teacher(_) => None,
        }
    }

    pub fn teacher_id(&self) -> Option<i64> {
        match self {
            ReviewTarget::Teacher(id) => Some(*id),
            ReviewTarget::Class(_) => None,
        }
    }
}

impl fmt::Display for ReviewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewTarget::Class(id) => write!(f, "class {id}"),
            ReviewTarget::Teacher(id) => write!(f, "teacher {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: i64,
    pub target: ReviewTarget,
    pub rating: i64,
    pub comment: String,
    pub user_registration_number: String,
    pub user_name: String,
}

/// A review that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub target: ReviewTarget,
    pub rating: i64,
    pub comment: String,
    pub user_registration_number: String,
}

pub fn is_valid_rating(rating: i64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

// ====== Moderation ======

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub review_id: i64,
    pub user_registration_number: String,
    pub description: String,
}

/// A review together with every report filed against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedReview {
    pub review: Review,
    pub reports: Vec<Report>,
}

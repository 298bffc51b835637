use db::types::Grade;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_GRADE_C_MIN_POINTS: i64 = 50;
pub const DEFAULT_GRADE_B_MIN_POINTS: i64 = 75;
pub const DEFAULT_GRADE_A_MIN_POINTS: i64 = 100;

/// Lowest point totals graded C, B and A. D is the floor below `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct GradeThresholds {
    pub c: i64,
    pub b: i64,
    pub a: i64,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            c: DEFAULT_GRADE_C_MIN_POINTS,
            b: DEFAULT_GRADE_B_MIN_POINTS,
            a: DEFAULT_GRADE_A_MIN_POINTS,
        }
    }
}

impl GradeThresholds {
    /// Returns `None` unless `0 < c < b < a`.
    pub fn new(c: i64, b: i64, a: i64) -> Option<Self> {
        (0 < c && c < b && b < a).then_some(Self { c, b, a })
    }

    pub fn min_points(&self, grade: Grade) -> i64 {
        match grade {
            Grade::D => 0,
            Grade::C => self.c,
            Grade::B => self.b,
            Grade::A => self.a,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct GradeProgress {
    pub grade: Grade,
    pub next_grade: Option<Grade>,
    pub points_to_next: Option<i64>,
}

/// Clamps negative and non-finite inputs to zero and drops fractions.
pub fn normalize_points(points: f64) -> i64 {
    if !points.is_finite() || points <= 0.0 {
        return 0;
    }
    if points >= i64::MAX as f64 {
        return i64::MAX;
    }
    points.floor() as i64
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GradeLedger {
    thresholds: GradeThresholds,
}

impl GradeLedger {
    pub fn new(thresholds: GradeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> GradeThresholds {
        self.thresholds
    }

    pub fn grade_of(&self, points: f64) -> Grade {
        let points = normalize_points(points);
        Grade::ASCENDING
            .into_iter()
            .rev()
            .find(|grade| points >= self.thresholds.min_points(*grade))
            .unwrap_or(Grade::D)
    }

    pub fn progress(&self, points: f64) -> GradeProgress {
        let grade = self.grade_of(points);
        let next_grade = grade.next();
        let points_to_next = next_grade
            .map(|next| (self.thresholds.min_points(next) - normalize_points(points)).max(0));
        GradeProgress {
            grade,
            next_grade,
            points_to_next,
        }
    }
}

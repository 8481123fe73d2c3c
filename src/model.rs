//! Data structures describing a student's degree-progress report.
//!
//! The types in this module mirror the JSON payload served by the report
//! endpoint and stored in the report cache.  They intentionally avoid
//! referencing the layout or PDF layers so the values can be fetched, cached,
//! and exchanged without pulling in rendering concerns.
//!
//! Numeric and optional fields are parsed leniently: a missing or malformed
//! value becomes `None` and is rendered as a placeholder instead of failing the
//! whole report.

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder rendered for absent or malformed values.
pub const MISSING_VALUE: &str = "-";

/// Placeholder rendered for courses without a published grade.
pub const GRADE_NOT_RELEASED: &str = "Not Released";

/// Semester label that sorts ahead of every other label within a year.
pub const ODD_SEMESTER: &str = "Odd Sem";

/// Column titles of the per-category course table.
pub const COURSE_TABLE_HEAD: [&str; 6] = [
    "Year",
    "Semester",
    "Course Code",
    "Name",
    "Credits",
    "Result",
];

/// Academic-progress payload for one student.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Display name of the student.
    #[serde(default, deserialize_with = "lenient_string")]
    pub student_name: String,
    /// University identifier of the student.
    #[serde(default, deserialize_with = "lenient_string")]
    pub student_id: String,
    /// Number of courses the student registered for across all categories.
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_registered_courses: Option<i64>,
    /// Number of credits the student registered for across all categories.
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_registered_credits: Option<i64>,
    /// Requirement categories in the order the server returned them.
    #[serde(default, deserialize_with = "lenient_list")]
    pub categories: Vec<Category>,
}

impl Report {
    /// Parses a report from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the report into the JSON representation used by the cache.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns the "Total Registered Courses" summary line.
    pub fn total_courses_line(&self) -> String {
        format!(
            "Total Registered Courses: {}",
            count_label(self.total_registered_courses)
        )
    }

    /// Returns the "Total Registered Credits" summary line.
    pub fn total_credits_line(&self) -> String {
        format!(
            "Total Registered Credits: {}",
            count_label(self.total_registered_credits)
        )
    }
}

/// A degree requirement grouping, such as "Humanities".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Title of the requirement.
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_name: String,
    /// Courses needed to satisfy the requirement.
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_required_courses: Option<i64>,
    /// Courses the student registered for in this category.
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub registered_courses: Option<i64>,
    /// Course records, possibly empty.
    #[serde(default, deserialize_with = "lenient_list")]
    pub courses: Vec<Course>,
}

impl Category {
    /// Returns the "Required courses" detail line.
    pub fn required_line(&self) -> String {
        format!("Required courses: {}", count_label(self.min_required_courses))
    }

    /// Returns the "Completed courses" detail line.
    pub fn completed_line(&self) -> String {
        format!("Completed courses: {}", count_label(self.registered_courses))
    }

    /// Returns the courses in display order without modifying the category.
    pub fn sorted_courses(&self) -> Vec<&Course> {
        let mut courses: Vec<&Course> = self.courses.iter().collect();
        courses.sort_by(|a, b| a.display_order(b));
        courses
    }

    /// Sorts the courses in place into display order.
    pub fn sort_courses(&mut self) {
        self.courses.sort_by(Course::display_order);
    }

    /// Returns the table body rows in display order.
    pub fn table_rows(&self) -> Vec<[String; 6]> {
        self.sorted_courses()
            .into_iter()
            .map(Course::table_row)
            .collect()
    }
}

/// One course record together with its completion status.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Academic year, e.g. `2022-2023`.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<String>,
    /// Semester label, typically `Odd Sem` or `Even Sem`.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub semester: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub course_code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub course_name: String,
    /// Credit weight, absent when the server has none on record.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub credits: Option<f64>,
    /// Published grade, absent until results are released.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub grade: Option<String>,
}

impl Course {
    /// Orders courses by year, then puts `Odd Sem` ahead of any other semester.
    ///
    /// Every label other than `Odd Sem` shares one bucket, so two such labels
    /// compare equal and a stable sort keeps their received order.
    pub fn display_order(&self, other: &Self) -> Ordering {
        let year = self.year_key().cmp(other.year_key());
        year.then_with(|| self.is_odd_semester().cmp(&other.is_odd_semester()).reverse())
    }

    fn year_key(&self) -> &str {
        self.year.as_deref().unwrap_or_default()
    }

    fn is_odd_semester(&self) -> bool {
        self.semester.as_deref() == Some(ODD_SEMESTER)
    }

    pub fn year_label(&self) -> &str {
        non_empty(self.year.as_deref()).unwrap_or(MISSING_VALUE)
    }

    pub fn semester_label(&self) -> &str {
        non_empty(self.semester.as_deref()).unwrap_or(MISSING_VALUE)
    }

    /// Formats the credits, dropping the fractional part of whole numbers.
    pub fn credits_label(&self) -> String {
        match self.credits {
            Some(credits) if credits.is_finite() => {
                if credits.fract() == 0.0 && credits.abs() < 1e15 {
                    format!("{}", credits as i64)
                } else {
                    format!("{}", credits)
                }
            }
            _ => MISSING_VALUE.to_string(),
        }
    }

    pub fn grade_label(&self) -> &str {
        non_empty(self.grade.as_deref()).unwrap_or(GRADE_NOT_RELEASED)
    }

    /// Returns the table cells in [`COURSE_TABLE_HEAD`] order.
    pub fn table_row(&self) -> [String; 6] {
        [
            self.year_label().to_string(),
            self.semester_label().to_string(),
            self.course_code.clone(),
            self.course_name.clone(),
            self.credits_label(),
            self.grade_label().to_string(),
        ]
    }
}

/// Formats an optional count, substituting [`MISSING_VALUE`] when absent.
pub fn count_label(value: Option<i64>) -> String {
    value.map_or_else(|| MISSING_VALUE.to_string(), |value| value.to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer).map(Option::unwrap_or_default)
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| T::deserialize(item).map_err(serde::de::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

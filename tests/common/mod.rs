#![allow(dead_code)]

use exit_report::model::{Category, Course, Report};

pub const STUDENT_ID: &str = "2100030123";

pub fn course(year: &str, semester: &str, code: &str, name: &str, credits: f64, grade: Option<&str>) -> Course {
    Course {
        year: Some(year.to_string()),
        semester: Some(semester.to_string()),
        course_code: code.to_string(),
        course_name: name.to_string(),
        credits: Some(credits),
        grade: grade.map(str::to_string),
    }
}

/// A report with one populated category and one without courses.
pub fn sample_report() -> Report {
    Report {
        student_name: "Asha Rao".to_string(),
        student_id: STUDENT_ID.to_string(),
        total_registered_courses: Some(3),
        total_registered_credits: Some(9),
        categories: vec![
            Category {
                category_name: "Humanities".to_string(),
                min_required_courses: Some(2),
                registered_courses: Some(2),
                courses: vec![
                    course("2022-2023", "Even Sem", "HS202", "Economics", 3.0, None),
                    course("2021-2022", "Odd Sem", "HS101", "Ethics", 3.0, Some("A")),
                    course("2021-2022", "Even Sem", "HS102", "Psychology", 3.0, Some("B")),
                ],
            },
            Category {
                category_name: "Open Electives".to_string(),
                min_required_courses: Some(1),
                registered_courses: Some(0),
                courses: Vec::new(),
            },
        ],
    }
}

/// A report whose single category needs several pages of rows.
pub fn long_report(rows: usize) -> Report {
    let courses = (0..rows)
        .map(|index| {
            course(
                &format!("20{:02}-20{:02}", 10 + index / 10, 11 + index / 10),
                if index % 2 == 0 { "Odd Sem" } else { "Even Sem" },
                &format!("CS{:03}", index),
                "Data Structures and Algorithms",
                4.0,
                Some("A"),
            )
        })
        .collect();

    Report {
        student_name: "Long Student".to_string(),
        student_id: "2000000001".to_string(),
        total_registered_courses: Some(rows as i64),
        total_registered_credits: Some(4 * rows as i64),
        categories: vec![Category {
            category_name: "Core".to_string(),
            min_required_courses: Some(rows as i64),
            registered_courses: Some(rows as i64),
            courses,
        }],
    }
}

//! Pure progress and grading arithmetic. No I/O here; the orchestration in
//! `progress_service` feeds these from the catalog and the store.

use crate::services::error::LearningError;

/// Integer course-completion percentage: round(100 * completed / total).
/// An empty course reads 0, never a division error.
pub fn progress_percent(total: usize, completed: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed as f64 / total as f64) * 100.0).round() as i32
}

#[derive(Debug, Clone, Copy)]
pub struct QuizGrade {
    pub score: u32,
    pub passed: bool,
    pub correct_count: usize,
}

/// Grade a submission against the answer key. The submission must carry
/// exactly one answer per question; a quiz with zero questions fails closed
/// instead of vacuously passing.
pub fn grade_quiz(
    answer_key: &[usize],
    answers: &[usize],
    passing_score: u32,
) -> Result<QuizGrade, LearningError> {
    if answers.len() != answer_key.len() {
        return Err(LearningError::MalformedSubmission {
            expected: answer_key.len(),
            submitted: answers.len(),
        });
    }

    if answer_key.is_empty() {
        return Ok(QuizGrade {
            score: 0,
            passed: false,
            correct_count: 0,
        });
    }

    let correct_count = answer_key
        .iter()
        .zip(answers.iter())
        .filter(|(key, answer)| key == answer)
        .count();

    let score = ((correct_count as f64 / answer_key.len() as f64) * 100.0).round() as u32;

    Ok(QuizGrade {
        score,
        passed: score >= passing_score,
        correct_count,
    })
}

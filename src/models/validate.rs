//! Content rules every stored exercise satisfies, on create and after a patch.

use super::exercise::{ChoiceQuestion, ExerciseContent, NewExercise};

/// A schema-valid exercise whose content is incomplete or inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("{label} is required")]
    Required { label: String },
    #[error("{label}: correct answer {index} is out of range for {len} options")]
    AnswerOutOfRange {
        label: String,
        index: usize,
        len: usize,
    },
    #[error("Expected one correct answer per content block ({expected}), got {got}")]
    AnswerCount { expected: usize, got: usize },
    #[error("Word bank must contain \"{word}\"")]
    MissingFromWordBank { word: String },
}

impl NewExercise {
    /// Check required texts, answer indices and the word bank.
    pub fn validate(&self) -> Result<(), ContentError> {
        require_text(&self.title, "Title")?;
        require_text(&self.description, "Description")?;

        match &self.content {
            ExerciseContent::ReadingTitleMatch { texts } => {
                for (i, text) in texts.iter().enumerate() {
                    require_text(&text.content, &format!("Text {} content", i + 1))?;
                    require_text(&text.correct_title, &format!("Text {} title", i + 1))?;
                }
            }
            ExerciseContent::ReadingMultipleChoice { content, questions } => {
                require_text(content, "Content")?;
                validate_questions(questions)?;
            }
            ExerciseContent::ReadingMatching {
                content,
                options,
                correct_answers,
            } => {
                if content.len() != correct_answers.len() {
                    return Err(ContentError::AnswerCount {
                        expected: content.len(),
                        got: correct_answers.len(),
                    });
                }
                for (i, block) in content.iter().enumerate() {
                    require_text(block, &format!("Content block {}", i + 1))?;
                }
                for (i, answer) in correct_answers.iter().enumerate() {
                    require_index(*answer, options.len(), &format!("Answer {}", i + 1))?;
                }
            }
            ExerciseContent::Listening {
                audio_url,
                questions,
                ..
            } => {
                require_text(audio_url, "Audio URL")?;
                validate_questions(questions)?;
            }
            ExerciseContent::GrammarChoice {
                text_with_blanks,
                blanks,
            } => {
                require_text(text_with_blanks, "Text with blanks")?;
                for (i, blank) in blanks.iter().enumerate() {
                    require_index(
                        blank.correct_answer,
                        blank.options.len(),
                        &format!("Blank {}", i + 1),
                    )?;
                }
            }
            ExerciseContent::GrammarWordBank {
                text_with_blanks,
                blanks,
                word_bank,
            } => {
                require_text(text_with_blanks, "Text with blanks")?;
                for (i, blank) in blanks.iter().enumerate() {
                    require_text(&blank.correct_word, &format!("Blank {} word", i + 1))?;
                    if !word_bank.contains(&blank.correct_word) {
                        return Err(ContentError::MissingFromWordBank {
                            word: blank.correct_word.clone(),
                        });
                    }
                }
            }
            ExerciseContent::Writing { prompt, .. } => {
                require_text(prompt, "Prompt")?;
            }
        }

        Ok(())
    }
}

fn validate_questions(questions: &[ChoiceQuestion]) -> Result<(), ContentError> {
    for (i, question) in questions.iter().enumerate() {
        let label = format!("Question {}", i + 1);
        require_text(&question.question, &label)?;
        require_index(question.correct_answer, question.options.len(), &label)?;
    }
    Ok(())
}

fn require_text(value: &str, label: &str) -> Result<(), ContentError> {
    if value.trim().is_empty() {
        return Err(ContentError::Required {
            label: label.to_string(),
        });
    }
    Ok(())
}

fn require_index(index: usize, len: usize, label: &str) -> Result<(), ContentError> {
    if index >= len {
        return Err(ContentError::AnswerOutOfRange {
            label: label.to_string(),
            index,
            len,
        });
    }
    Ok(())
}

//! Exercise model: a closed union of exam item variants.
//!
//! On the wire an exercise is one flat JSON object whose `type` and `part`
//! select which payload fields must be present. In Rust the union is
//! [`ExerciseContent`]; conversion goes through [`RawExercise`], which rejects
//! any payload field that does not belong to the declared variant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exam section an exercise belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Reading,
    Listening,
    Grammar,
    Writing,
}

impl ExerciseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Reading => "reading",
            ExerciseType::Listening => "listening",
            ExerciseType::Grammar => "grammar",
            ExerciseType::Writing => "writing",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part ("Teil") within an exam section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExercisePart {
    Part1,
    Part2,
    Part3,
}

impl ExercisePart {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExercisePart::Part1 => "part1",
            ExercisePart::Part2 => "part2",
            ExercisePart::Part3 => "part3",
        }
    }
}

impl fmt::Display for ExercisePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parts a writing exercise may use. Writing has no part 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritingPart {
    Part1,
    Part2,
}

impl From<WritingPart> for ExercisePart {
    fn from(part: WritingPart) -> Self {
        match part {
            WritingPart::Part1 => ExercisePart::Part1,
            WritingPart::Part2 => ExercisePart::Part2,
        }
    }
}

impl TryFrom<ExercisePart> for WritingPart {
    type Error = SchemaError;

    fn try_from(part: ExercisePart) -> Result<Self, Self::Error> {
        match part {
            ExercisePart::Part1 => Ok(WritingPart::Part1),
            ExercisePart::Part2 => Ok(WritingPart::Part2),
            ExercisePart::Part3 => Err(SchemaError::UnsupportedVariant {
                variant: variant_label(ExerciseType::Writing, part),
            }),
        }
    }
}

/// A text whose title the student has to pick (reading part 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TitledText {
    pub content: String,
    pub correct_title: String,
}

/// Multiple-choice question shared by reading part 2 and listening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChoiceQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
}

/// Blank filled by choosing one of several options (grammar part 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceBlank {
    pub options: Vec<String>,
    pub correct_answer: usize,
}

/// Blank filled by dragging a word from the word bank (grammar part 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBlank {
    pub correct_word: String,
}

/// Variant-specific payload of an exercise.
///
/// Each variant fixes the `(type, part)` pair it may be stored under, except
/// listening and writing which carry their part explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseContent {
    /// reading/part1: match each text with its title.
    ReadingTitleMatch { texts: Vec<TitledText> },
    /// reading/part2: one text with multiple-choice questions.
    ReadingMultipleChoice {
        content: String,
        questions: Vec<ChoiceQuestion>,
    },
    /// reading/part3: match content blocks against a shared option list.
    ReadingMatching {
        content: Vec<String>,
        options: Vec<String>,
        correct_answers: Vec<usize>,
    },
    /// listening/any part: audio with multiple-choice questions.
    Listening {
        part: ExercisePart,
        audio_url: String,
        questions: Vec<ChoiceQuestion>,
        transcript: Option<String>,
    },
    /// grammar/part1: blanks answered by choosing an option.
    GrammarChoice {
        text_with_blanks: String,
        blanks: Vec<ChoiceBlank>,
    },
    /// grammar/part2: blanks answered from a word bank.
    GrammarWordBank {
        text_with_blanks: String,
        blanks: Vec<WordBlank>,
        word_bank: Vec<String>,
    },
    /// writing/part1 or part2: free text judged against criteria.
    Writing {
        part: WritingPart,
        prompt: String,
        evaluation_criteria: Vec<String>,
    },
}

impl ExerciseContent {
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            ExerciseContent::ReadingTitleMatch { .. }
            | ExerciseContent::ReadingMultipleChoice { .. }
            | ExerciseContent::ReadingMatching { .. } => ExerciseType::Reading,
            ExerciseContent::Listening { .. } => ExerciseType::Listening,
            ExerciseContent::GrammarChoice { .. } | ExerciseContent::GrammarWordBank { .. } => {
                ExerciseType::Grammar
            }
            ExerciseContent::Writing { .. } => ExerciseType::Writing,
        }
    }

    pub fn part(&self) -> ExercisePart {
        match self {
            ExerciseContent::ReadingTitleMatch { .. } | ExerciseContent::GrammarChoice { .. } => {
                ExercisePart::Part1
            }
            ExerciseContent::ReadingMultipleChoice { .. }
            | ExerciseContent::GrammarWordBank { .. } => ExercisePart::Part2,
            ExerciseContent::ReadingMatching { .. } => ExercisePart::Part3,
            ExerciseContent::Listening { part, .. } => *part,
            ExerciseContent::Writing { part, .. } => (*part).into(),
        }
    }
}

/// A schema-conformant exercise that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExercise", into = "RawExercise")]
pub struct NewExercise {
    pub title: String,
    pub description: String,
    /// Minutes, always positive.
    pub time_limit: u32,
    pub content: ExerciseContent,
}

impl NewExercise {
    pub fn exercise_type(&self) -> ExerciseType {
        self.content.exercise_type()
    }

    pub fn part(&self) -> ExercisePart {
        self.content.part()
    }

    /// Attach the identifier the store assigned.
    pub fn with_id(self, id: impl Into<String>) -> Exercise {
        Exercise {
            id: id.into(),
            title: self.title,
            description: self.description,
            time_limit: self.time_limit,
            content: self.content,
        }
    }
}

/// A stored exercise, annotated with its store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExercise", into = "RawExercise")]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub description: String,
    pub time_limit: u32,
    pub content: ExerciseContent,
}

impl Exercise {
    pub fn exercise_type(&self) -> ExerciseType {
        self.content.exercise_type()
    }

    pub fn part(&self) -> ExercisePart {
        self.content.part()
    }

    /// Split into the identifier and the stored body.
    pub fn into_parts(self) -> (String, NewExercise) {
        (
            self.id,
            NewExercise {
                title: self.title,
                description: self.description,
                time_limit: self.time_limit,
                content: self.content,
            },
        )
    }
}

/// Reasons a payload does not conform to the exercise schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("{variant} is not a valid exercise variant")]
    UnsupportedVariant { variant: String },
    #[error("`{field}` is required for {variant} exercises")]
    MissingField { field: &'static str, variant: String },
    #[error("`{field}` is not allowed on {variant} exercises")]
    ForeignField { field: &'static str, variant: String },
    #[error("`{field}` must be {expected} for {variant} exercises")]
    WrongShape {
        field: &'static str,
        expected: &'static str,
        variant: String,
    },
    #[error("`timeLimit` must be a positive number of minutes")]
    NonPositiveTimeLimit,
    #[error("`id` is assigned by the store and cannot be supplied")]
    IdNotAllowed,
    #[error("stored exercise has no `id`")]
    MissingId,
}

fn variant_label(exercise_type: ExerciseType, part: ExercisePart) -> String {
    format!("{}/{}", exercise_type, part)
}

// ==================== WIRE REPRESENTATION ====================

/// `content` is a single text for reading part 2 and a list of blocks for part 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<String>),
}

/// Either blank shape; which fields must be set depends on the grammar part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawBlank {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_answer: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_word: Option<String>,
}

impl RawBlank {
    fn into_choice(self, variant: &str) -> Result<ChoiceBlank, SchemaError> {
        if self.correct_word.is_some() {
            return Err(SchemaError::ForeignField {
                field: "blanks.correctWord",
                variant: variant.to_string(),
            });
        }
        Ok(ChoiceBlank {
            options: require(self.options, "blanks.options", variant)?,
            correct_answer: require(self.correct_answer, "blanks.correctAnswer", variant)?,
        })
    }

    fn into_word(self, variant: &str) -> Result<WordBlank, SchemaError> {
        if self.options.is_some() {
            return Err(SchemaError::ForeignField {
                field: "blanks.options",
                variant: variant.to_string(),
            });
        }
        if self.correct_answer.is_some() {
            return Err(SchemaError::ForeignField {
                field: "blanks.correctAnswer",
                variant: variant.to_string(),
            });
        }
        Ok(WordBlank {
            correct_word: require(self.correct_word, "blanks.correctWord", variant)?,
        })
    }
}

impl From<ChoiceBlank> for RawBlank {
    fn from(blank: ChoiceBlank) -> Self {
        Self {
            options: Some(blank.options),
            correct_answer: Some(blank.correct_answer),
            correct_word: None,
        }
    }
}

impl From<WordBlank> for RawBlank {
    fn from(blank: WordBlank) -> Self {
        Self {
            correct_word: Some(blank.correct_word),
            ..Self::default()
        }
    }
}

/// Flat wire form of an exercise: common fields plus every variant's payload
/// field as optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawExercise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type")]
    exercise_type: ExerciseType,
    part: ExercisePart,
    title: String,
    description: String,
    time_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    texts: Option<Vec<TitledText>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<RawContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    questions: Option<Vec<ChoiceQuestion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_answers: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_with_blanks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blanks: Option<Vec<RawBlank>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    word_bank: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluation_criteria: Option<Vec<String>>,
}

/// Payload layouts; one per valid `(type, part)` family.
#[derive(Debug, Clone, Copy)]
enum Shape {
    TitleMatch,
    MultipleChoice,
    Matching,
    Listening,
    GrammarChoice,
    GrammarWordBank,
    Writing,
}

impl Shape {
    fn of(exercise_type: ExerciseType, part: ExercisePart) -> Option<Self> {
        match (exercise_type, part) {
            (ExerciseType::Reading, ExercisePart::Part1) => Some(Shape::TitleMatch),
            (ExerciseType::Reading, ExercisePart::Part2) => Some(Shape::MultipleChoice),
            (ExerciseType::Reading, ExercisePart::Part3) => Some(Shape::Matching),
            (ExerciseType::Listening, _) => Some(Shape::Listening),
            (ExerciseType::Grammar, ExercisePart::Part1) => Some(Shape::GrammarChoice),
            (ExerciseType::Grammar, ExercisePart::Part2) => Some(Shape::GrammarWordBank),
            (ExerciseType::Writing, ExercisePart::Part1 | ExercisePart::Part2) => {
                Some(Shape::Writing)
            }
            (ExerciseType::Grammar | ExerciseType::Writing, ExercisePart::Part3) => None,
        }
    }

    fn fields(self) -> &'static [&'static str] {
        match self {
            Shape::TitleMatch => &["texts"],
            Shape::MultipleChoice => &["content", "questions"],
            Shape::Matching => &["content", "options", "correctAnswers"],
            Shape::Listening => &["audioUrl", "questions", "transcript"],
            Shape::GrammarChoice => &["textWithBlanks", "blanks"],
            Shape::GrammarWordBank => &["textWithBlanks", "blanks", "wordBank"],
            Shape::Writing => &["prompt", "evaluationCriteria"],
        }
    }
}

fn require<T>(value: Option<T>, field: &'static str, variant: &str) -> Result<T, SchemaError> {
    value.ok_or_else(|| SchemaError::MissingField {
        field,
        variant: variant.to_string(),
    })
}

impl RawContent {
    fn into_text(self, variant: &str) -> Result<String, SchemaError> {
        match self {
            RawContent::Text(text) => Ok(text),
            RawContent::Blocks(_) => Err(SchemaError::WrongShape {
                field: "content",
                expected: "a single text",
                variant: variant.to_string(),
            }),
        }
    }

    fn into_blocks(self, variant: &str) -> Result<Vec<String>, SchemaError> {
        match self {
            RawContent::Blocks(blocks) => Ok(blocks),
            RawContent::Text(_) => Err(SchemaError::WrongShape {
                field: "content",
                expected: "a list of text blocks",
                variant: variant.to_string(),
            }),
        }
    }
}

impl RawExercise {
    fn present_payload_fields(&self) -> Vec<&'static str> {
        let flags = [
            ("texts", self.texts.is_some()),
            ("content", self.content.is_some()),
            ("questions", self.questions.is_some()),
            ("options", self.options.is_some()),
            ("correctAnswers", self.correct_answers.is_some()),
            ("audioUrl", self.audio_url.is_some()),
            ("transcript", self.transcript.is_some()),
            ("textWithBlanks", self.text_with_blanks.is_some()),
            ("blanks", self.blanks.is_some()),
            ("wordBank", self.word_bank.is_some()),
            ("prompt", self.prompt.is_some()),
            ("evaluationCriteria", self.evaluation_criteria.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect()
    }

    /// Validate the payload against the declared variant and build the typed form.
    fn into_parts(self) -> Result<(Option<String>, NewExercise), SchemaError> {
        let variant = variant_label(self.exercise_type, self.part);
        let shape = Shape::of(self.exercise_type, self.part).ok_or_else(|| {
            SchemaError::UnsupportedVariant {
                variant: variant.clone(),
            }
        })?;

        if self.time_limit == 0 {
            return Err(SchemaError::NonPositiveTimeLimit);
        }

        let allowed = shape.fields();
        if let Some(field) = self
            .present_payload_fields()
            .into_iter()
            .find(|field| !allowed.contains(field))
        {
            return Err(SchemaError::ForeignField { field, variant });
        }

        let content = match shape {
            Shape::TitleMatch => ExerciseContent::ReadingTitleMatch {
                texts: require(self.texts, "texts", &variant)?,
            },
            Shape::MultipleChoice => ExerciseContent::ReadingMultipleChoice {
                content: require(self.content, "content", &variant)?.into_text(&variant)?,
                questions: require(self.questions, "questions", &variant)?,
            },
            Shape::Matching => ExerciseContent::ReadingMatching {
                content: require(self.content, "content", &variant)?.into_blocks(&variant)?,
                options: require(self.options, "options", &variant)?,
                correct_answers: require(self.correct_answers, "correctAnswers", &variant)?,
            },
            Shape::Listening => ExerciseContent::Listening {
                part: self.part,
                audio_url: require(self.audio_url, "audioUrl", &variant)?,
                questions: require(self.questions, "questions", &variant)?,
                transcript: self.transcript,
            },
            Shape::GrammarChoice => ExerciseContent::GrammarChoice {
                text_with_blanks: require(self.text_with_blanks, "textWithBlanks", &variant)?,
                blanks: require(self.blanks, "blanks", &variant)?
                    .into_iter()
                    .map(|blank| blank.into_choice(&variant))
                    .collect::<Result<_, _>>()?,
            },
            Shape::GrammarWordBank => ExerciseContent::GrammarWordBank {
                text_with_blanks: require(self.text_with_blanks, "textWithBlanks", &variant)?,
                blanks: require(self.blanks, "blanks", &variant)?
                    .into_iter()
                    .map(|blank| blank.into_word(&variant))
                    .collect::<Result<_, _>>()?,
                word_bank: require(self.word_bank, "wordBank", &variant)?,
            },
            Shape::Writing => ExerciseContent::Writing {
                part: WritingPart::try_from(self.part)?,
                prompt: require(self.prompt, "prompt", &variant)?,
                evaluation_criteria: require(
                    self.evaluation_criteria,
                    "evaluationCriteria",
                    &variant,
                )?,
            },
        };

        Ok((
            self.id,
            NewExercise {
                title: self.title,
                description: self.description,
                time_limit: self.time_limit,
                content,
            },
        ))
    }
}

impl TryFrom<RawExercise> for NewExercise {
    type Error = SchemaError;

    fn try_from(raw: RawExercise) -> Result<Self, Self::Error> {
        if raw.id.is_some() {
            return Err(SchemaError::IdNotAllowed);
        }
        raw.into_parts().map(|(_, exercise)| exercise)
    }
}

impl TryFrom<RawExercise> for Exercise {
    type Error = SchemaError;

    fn try_from(raw: RawExercise) -> Result<Self, Self::Error> {
        let (id, exercise) = raw.into_parts()?;
        let id = id.ok_or(SchemaError::MissingId)?;
        Ok(exercise.with_id(id))
    }
}

impl From<NewExercise> for RawExercise {
    fn from(exercise: NewExercise) -> Self {
        let mut raw = RawExercise {
            id: None,
            exercise_type: exercise.exercise_type(),
            part: exercise.part(),
            title: exercise.title,
            description: exercise.description,
            time_limit: exercise.time_limit,
            texts: None,
            content: None,
            questions: None,
            options: None,
            correct_answers: None,
            audio_url: None,
            transcript: None,
            text_with_blanks: None,
            blanks: None,
            word_bank: None,
            prompt: None,
            evaluation_criteria: None,
        };

        match exercise.content {
            ExerciseContent::ReadingTitleMatch { texts } => raw.texts = Some(texts),
            ExerciseContent::ReadingMultipleChoice { content, questions } => {
                raw.content = Some(RawContent::Text(content));
                raw.questions = Some(questions);
            }
            ExerciseContent::ReadingMatching {
                content,
                options,
                correct_answers,
            } => {
                raw.content = Some(RawContent::Blocks(content));
                raw.options = Some(options);
                raw.correct_answers = Some(correct_answers);
            }
            ExerciseContent::Listening {
                audio_url,
                questions,
                transcript,
                ..
            } => {
                raw.audio_url = Some(audio_url);
                raw.questions = Some(questions);
                raw.transcript = transcript;
            }
            ExerciseContent::GrammarChoice {
                text_with_blanks,
                blanks,
            } => {
                raw.text_with_blanks = Some(text_with_blanks);
                raw.blanks = Some(blanks.into_iter().map(RawBlank::from).collect());
            }
            ExerciseContent::GrammarWordBank {
                text_with_blanks,
                blanks,
                word_bank,
            } => {
                raw.text_with_blanks = Some(text_with_blanks);
                raw.blanks = Some(blanks.into_iter().map(RawBlank::from).collect());
                raw.word_bank = Some(word_bank);
            }
            ExerciseContent::Writing {
                prompt,
                evaluation_criteria,
                ..
            } => {
                raw.prompt = Some(prompt);
                raw.evaluation_criteria = Some(evaluation_criteria);
            }
        }

        raw
    }
}

impl From<Exercise> for RawExercise {
    fn from(exercise: Exercise) -> Self {
        let (id, body) = exercise.into_parts();
        let mut raw = RawExercise::from(body);
        raw.id = Some(id);
        raw
    }
}

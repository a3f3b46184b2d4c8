//! Sample exercise documents shared by the unit and integration tests.

use serde_json::{json, Value};

use super::{ExercisePart, ExerciseType, NewExercise};

/// Every `(type, part)` pair the schema accepts.
pub const VALID_VARIANTS: [(ExerciseType, ExercisePart); 10] = [
    (ExerciseType::Reading, ExercisePart::Part1),
    (ExerciseType::Reading, ExercisePart::Part2),
    (ExerciseType::Reading, ExercisePart::Part3),
    (ExerciseType::Listening, ExercisePart::Part1),
    (ExerciseType::Listening, ExercisePart::Part2),
    (ExerciseType::Listening, ExercisePart::Part3),
    (ExerciseType::Grammar, ExercisePart::Part1),
    (ExerciseType::Grammar, ExercisePart::Part2),
    (ExerciseType::Writing, ExercisePart::Part1),
    (ExerciseType::Writing, ExercisePart::Part2),
];

/// A complete, valid wire document for the given variant (without `id`).
pub fn exercise_json(exercise_type: ExerciseType, part: ExercisePart) -> Value {
    let mut value = json!({
        "type": exercise_type.as_str(),
        "part": part.as_str(),
        "title": format!("{} {}", exercise_type, part),
        "description": "Practice item",
        "timeLimit": 15,
    });

    let payload = match (exercise_type, part) {
        (ExerciseType::Reading, ExercisePart::Part1) => json!({
            "texts": [
                { "content": "Der Zug fährt heute nicht.", "correctTitle": "Bahnstreik" },
                { "content": "Das Museum öffnet um neun.", "correctTitle": "Öffnungszeiten" }
            ]
        }),
        (ExerciseType::Reading, ExercisePart::Part2) => json!({
            "content": "Liebe Anna, ich komme am Samstag später.",
            "questions": [
                { "question": "Wann kommt sie?", "options": ["Freitag", "Samstag", "Sonntag"], "correctAnswer": 1 }
            ]
        }),
        (ExerciseType::Reading, ExercisePart::Part3) => json!({
            "content": ["Ich suche eine Wohnung.", "Ich möchte Deutsch lernen."],
            "options": ["Immobilien", "Sprachschule", "Reisebüro"],
            "correctAnswers": [0, 1]
        }),
        (ExerciseType::Listening, _) => json!({
            "audioUrl": "https://cdn.example.org/audio/track1.mp3",
            "questions": [
                { "question": "Wohin fährt der Bus?", "options": ["Bahnhof", "Flughafen"], "correctAnswer": 0 }
            ],
            "transcript": "Der Bus fährt zum Bahnhof."
        }),
        (ExerciseType::Grammar, ExercisePart::Part1) => json!({
            "textWithBlanks": "Ich ___ nach Hause, ___ ich müde bin.",
            "blanks": [
                { "options": ["gehe", "gehst"], "correctAnswer": 0 },
                { "options": ["weil", "denn"], "correctAnswer": 0 }
            ]
        }),
        (ExerciseType::Grammar, _) => json!({
            "textWithBlanks": "Er bleibt zu Hause, ___ es regnet.",
            "blanks": [ { "correctWord": "weil" } ],
            "wordBank": ["weil", "obwohl", "dass"]
        }),
        (ExerciseType::Writing, _) => json!({
            "prompt": "Schreiben Sie eine E-Mail an Ihren Vermieter.",
            "evaluationCriteria": ["Aufgabenerfüllung", "Kommunikative Gestaltung"]
        }),
    };

    if let (Some(target), Value::Object(fields)) = (value.as_object_mut(), payload) {
        target.extend(fields);
    }
    value
}

/// Typed form of [`exercise_json`].
pub fn new_exercise(exercise_type: ExerciseType, part: ExercisePart) -> NewExercise {
    serde_json::from_value(exercise_json(exercise_type, part)).unwrap()
}

//! Quiz questions and the per-topic question bank

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Subject of a lab; keys quiz counters, questions and challenges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabTopic {
    Physics,
    Chemistry,
    Biology,
}

impl LabTopic {
    pub const ALL: [LabTopic; 3] = [LabTopic::Physics, LabTopic::Chemistry, LabTopic::Biology];

    pub fn as_str(&self) -> &'static str {
        match self {
            LabTopic::Physics => "physics",
            LabTopic::Chemistry => "chemistry",
            LabTopic::Biology => "biology",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LabTopic::Physics => "Physics",
            LabTopic::Chemistry => "Chemistry",
            LabTopic::Biology => "Biology",
        }
    }
}

/// Question as authored in the content file, answers in authored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    pub topic: LabTopic,
    pub text: String,
    pub answers: Vec<String>,
    pub correct: usize,
    #[serde(default = "default_correct_response")]
    pub correct_response: String,
    #[serde(default = "default_incorrect_response")]
    pub incorrect_response: String,
}

fn default_correct_response() -> String {
    "Correct! Well done.".to_string()
}

fn default_incorrect_response() -> String {
    "Not quite. Keep studying!".to_string()
}

/// A question ready to be shown. Answers are shuffled once on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueQuestion {
    topic: LabTopic,
    text: String,
    answers: Vec<String>,
    correct_index: usize,
    correct_response: String,
    incorrect_response: String,
}

impl DialogueQuestion {
    /// Build a question, clamping `correct` into range and shuffling answers
    pub fn new(
        topic: LabTopic,
        text: impl Into<String>,
        answers: Vec<String>,
        correct: usize,
        responses: (String, String),
        rng: &mut impl Rng,
    ) -> Self {
        let mut answers = answers;
        let mut correct_index = correct.min(answers.len().saturating_sub(1));

        // Fisher-Yates, following the correct answer as it moves
        for i in (1..answers.len()).rev() {
            let j = rng.gen_range(0..=i);
            answers.swap(i, j);
            if correct_index == i {
                correct_index = j;
            } else if correct_index == j {
                correct_index = i;
            }
        }

        Self {
            topic,
            text: text.into(),
            answers,
            correct_index,
            correct_response: responses.0,
            incorrect_response: responses.1,
        }
    }

    pub fn from_template(template: &QuestionTemplate, rng: &mut impl Rng) -> Self {
        Self::new(
            template.topic,
            template.text.clone(),
            template.answers.clone(),
            template.correct,
            (template.correct_response.clone(), template.incorrect_response.clone()),
            rng,
        )
    }

    pub fn topic(&self) -> LabTopic {
        self.topic
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index && index < self.answers.len()
    }

    pub fn response(&self, correct: bool) -> &str {
        if correct {
            &self.correct_response
        } else {
            &self.incorrect_response
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionFile {
    #[serde(default)]
    question: Vec<QuestionTemplate>,
}

/// Question pools per topic
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pools: HashMap<LabTopic, Vec<QuestionTemplate>>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self { pools: HashMap::new() }
    }

    /// Load the bank from `path`, falling back to the built-in pool
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(bank) => bank,
            Err(e) => {
                log::warn!("Using built-in questions ({}): {}", path.display(), e);
                Self::builtin()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let file: QuestionFile =
            toml::from_str(content).map_err(|e| format!("Failed to parse questions: {}", e))?;
        let mut bank = Self::new();
        for template in file.question {
            if template.answers.is_empty() {
                log::warn!("Skipping question without answers: {}", template.text);
                continue;
            }
            bank.insert(template);
        }
        if bank.is_empty() {
            return Err("question file has no usable questions".to_string());
        }
        // Topics missing from the file still get something to ask
        let builtin = Self::builtin();
        for topic in LabTopic::ALL {
            if bank.pool(topic).is_empty() {
                log::debug!("No {} questions in file, using built-in pool", topic.as_str());
                for template in builtin.pool(topic) {
                    bank.insert(template.clone());
                }
            }
        }
        log::info!("Loaded {} questions", bank.len());
        Ok(bank)
    }

    pub fn insert(&mut self, template: QuestionTemplate) {
        self.pools.entry(template.topic).or_default().push(template);
    }

    pub fn pool(&self, topic: LabTopic) -> &[QuestionTemplate] {
        self.pools.get(&topic).map(|p| p.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.pools.values().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn builtin() -> Self {
        let mut bank = Self::new();
        let entries: &[(LabTopic, &str, &[&str], usize)] = &[
            (LabTopic::Physics, "What is the SI unit of force?", &["Newton", "Joule", "Watt", "Pascal"], 0),
            (LabTopic::Physics, "What is the acceleration due to gravity on Earth?", &["9.8 m/s^2", "3.0 m/s^2", "15 m/s^2", "1.6 m/s^2"], 0),
            (LabTopic::Physics, "Which quantity is a vector?", &["Velocity", "Mass", "Temperature", "Energy"], 0),
            (LabTopic::Physics, "Ohm's law relates voltage, current and...", &["Resistance", "Power", "Charge", "Frequency"], 0),
            (LabTopic::Physics, "What does a lens that converges light do?", &["Focuses rays to a point", "Spreads rays apart", "Absorbs all light", "Reflects light back"], 0),
            (LabTopic::Physics, "Energy of motion is called...", &["Kinetic energy", "Potential energy", "Thermal energy", "Nuclear energy"], 0),
            (LabTopic::Chemistry, "What is the chemical symbol for water?", &["H2O", "CO2", "O2", "NaCl"], 0),
            (LabTopic::Chemistry, "What is the pH of a neutral solution?", &["7", "1", "10", "14"], 0),
            (LabTopic::Chemistry, "Which particle has a negative charge?", &["Electron", "Proton", "Neutron", "Nucleus"], 0),
            (LabTopic::Chemistry, "What is the most abundant gas in air?", &["Nitrogen", "Oxygen", "Carbon dioxide", "Argon"], 0),
            (LabTopic::Chemistry, "NaCl is commonly known as...", &["Table salt", "Baking soda", "Vinegar", "Chalk"], 0),
            (LabTopic::Chemistry, "An acid turns litmus paper...", &["Red", "Blue", "Green", "Yellow"], 0),
            (LabTopic::Biology, "What is the powerhouse of the cell?", &["Mitochondria", "Nucleus", "Ribosome", "Vacuole"], 0),
            (LabTopic::Biology, "Which molecule carries genetic information?", &["DNA", "ATP", "Glucose", "Lipid"], 0),
            (LabTopic::Biology, "Plants make food through...", &["Photosynthesis", "Respiration", "Digestion", "Fermentation"], 0),
            (LabTopic::Biology, "Which organ pumps blood?", &["Heart", "Lung", "Liver", "Kidney"], 0),
            (LabTopic::Biology, "Red blood cells carry...", &["Oxygen", "Bile", "Insulin", "Starch"], 0),
            (LabTopic::Biology, "The basic unit of life is the...", &["Cell", "Atom", "Organ", "Tissue"], 0),
        ];
        for (topic, text, answers, correct) in entries {
            bank.insert(QuestionTemplate {
                topic: *topic,
                text: text.to_string(),
                answers: answers.iter().map(|a| a.to_string()).collect(),
                correct: *correct,
                correct_response: default_correct_response(),
                incorrect_response: format!("Not quite. The answer was: {}.", answers[*correct]),
            });
        }
        bank
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn answers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn responses() -> (String, String) {
        ("yes".to_string(), "no".to_string())
    }

    #[test]
    fn test_shuffle_preserves_correct_text() {
        let given = answers(&["alpha", "beta", "gamma", "delta"]);
        for seed in 0..200 {
            for correct in 0..given.len() {
                let mut rng = StdRng::seed_from_u64(seed);
                let q = DialogueQuestion::new(LabTopic::Physics, "q", given.clone(), correct, responses(), &mut rng);
                assert_eq!(q.answers()[q.correct_index()], given[correct]);
                let mut sorted = q.answers().to_vec();
                sorted.sort();
                let mut expected = given.clone();
                expected.sort();
                assert_eq!(sorted, expected);
            }
        }
    }

    #[test]
    fn test_shuffle_actually_reorders() {
        let given = answers(&["a", "b", "c", "d"]);
        let moved = (0..50).any(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let q = DialogueQuestion::new(LabTopic::Biology, "q", given.clone(), 0, responses(), &mut rng);
            q.answers() != given.as_slice()
        });
        assert!(moved);
    }

    #[test]
    fn test_out_of_range_correct_is_clamped() {
        let given = answers(&["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(7);
        let q = DialogueQuestion::new(LabTopic::Chemistry, "q", given, 99, responses(), &mut rng);
        assert_eq!(q.answers()[q.correct_index()], "c");
        assert!(q.is_correct(q.correct_index()));
    }

    #[test]
    fn test_single_answer_and_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let q = DialogueQuestion::new(LabTopic::Physics, "q", answers(&["only"]), 3, responses(), &mut rng);
        assert_eq!(q.correct_index(), 0);

        let q = DialogueQuestion::new(LabTopic::Physics, "q", Vec::new(), 0, responses(), &mut rng);
        assert!(!q.is_correct(0));
    }

    #[test]
    fn test_response_depends_on_correctness() {
        let mut rng = StdRng::seed_from_u64(1);
        let q = DialogueQuestion::new(LabTopic::Physics, "q", answers(&["x", "y"]), 0, responses(), &mut rng);
        assert_eq!(q.response(true), "yes");
        assert_eq!(q.response(false), "no");
    }

    #[test]
    fn test_builtin_has_every_topic() {
        let bank = QuestionBank::builtin();
        for topic in LabTopic::ALL {
            assert!(bank.pool(topic).len() >= 5, "{} pool too small", topic.as_str());
        }
    }

    #[test]
    fn test_bank_from_toml_fills_missing_topics() {
        let content = r#"
            [[question]]
            topic = "physics"
            text = "Unit of power?"
            answers = ["Watt", "Volt"]
            correct = 0

            [[question]]
            topic = "physics"
            text = "Broken"
            answers = []
            correct = 0
        "#;
        let bank = QuestionBank::from_toml(content).unwrap();
        assert_eq!(bank.pool(LabTopic::Physics).len(), 1);
        assert_eq!(bank.pool(LabTopic::Physics)[0].correct_response, "Correct! Well done.");
        assert!(!bank.pool(LabTopic::Biology).is_empty());
    }

    #[test]
    fn test_bank_rejects_garbage() {
        assert!(QuestionBank::from_toml("this is = = not toml").is_err());
        assert!(QuestionBank::from_toml("").is_err());
    }

    #[test]
    fn test_topic_names() {
        assert_eq!(LabTopic::Biology.as_str(), "biology");
        assert_eq!(LabTopic::Chemistry.display_name(), "Chemistry");
    }

    #[test]
    fn test_shipped_questions_parse() {
        let bank = QuestionBank::from_toml(include_str!("../../assets/content/questions.toml")).unwrap();
        for topic in LabTopic::ALL {
            let pool = bank.pool(topic);
            assert!(pool.len() >= 5, "{:?}", topic);
            assert!(pool.iter().all(|q| q.correct < q.answers.len()));
        }
    }
}

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::models::{JudgeVerdict, Verdict};
use crate::services::llm_provider::{GenerationRequest, LLMError, TextGenerator};

const PARSE_FAILURE_FEEDBACK: &str = "Failed to parse AI response";
const MISSING_FEEDBACK: &str = "No feedback provided";

const SINGLE_RUBRIC: &str = r#"You are a ruthless senior engineer auditing a practice submission.
Check that the code applies the named pattern with the expected complexity and respects the stated invariant.
1. Brute force instead of the pattern: REPEAT.
2. Invariant ignored: REPEAT.
3. Optimal and on-pattern: ADVANCE.
Reply with JSON only: { "verdict": "ADVANCE" | "REPEAT", "feedback": "one or two sentences of technical critique" }"#;

const CHECKPOINT_RUBRIC: &str = r#"You are an extremely strict tier checkpoint auditor.
The submission must demonstrate every required pattern at once.
Rules:
1. Each required pattern must be explicitly present in the code.
2. A single missing or brute-forced pattern means REPEAT.
3. Every pattern must be optimal (no O(N^2) where the pattern gives O(N)).
4. Check the pattern is real, e.g. binary search must be logarithmic, not a linear scan.
5. No partial credit.
Reply with JSON only:
{
  "verdict": "ADVANCE" | "REPEAT",
  "feedback": "critique of each pattern: which held up, which did not, and why",
  "patterns_found": ["..."],
  "missing_patterns": ["..."]
}"#;

const COMPLEXITY_RUBRIC: &str = r#"You are a performance engineer. For the submitted code give:
1. Time complexity (Big O)
2. Space complexity (Big O)
3. The bottleneck line
Be extremely concise. Use markdown."#;

/// Grades submissions through an upstream text generator.
#[derive(Clone)]
pub struct AiJudge {
    generator: Arc<dyn TextGenerator>,
}

impl AiJudge {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Single practice problem. `OPTIMAL` is accepted as a synonym for `ADVANCE` here only.
    pub async fn judge_single(
        &self,
        code: &str,
        topic_label: &str,
        problem_title: &str,
        invariant: &str,
    ) -> Result<JudgeVerdict, LLMError> {
        let prompt = format!(
            "Pattern: {topic_label}\nProblem: {problem_title}\nInvariant strategy: {invariant}\nUser code:\n{code}\n"
        );
        let request = GenerationRequest::new(prompt)
            .with_system(SINGLE_RUBRIC)
            .json();

        let raw = self.generator.generate(&request).await?;
        let verdict = match parse_object(&raw) {
            Some(obj) => JudgeVerdict {
                verdict: read_verdict(&obj, true),
                feedback: read_feedback(&obj),
                patterns_found: Vec::new(),
                missing_patterns: Vec::new(),
            },
            None => {
                warn!(raw_len = raw.len(), "Unparseable single-problem verdict");
                JudgeVerdict {
                    verdict: Verdict::Error,
                    feedback: PARSE_FAILURE_FEEDBACK.to_string(),
                    patterns_found: Vec::new(),
                    missing_patterns: Vec::new(),
                }
            }
        };

        Ok(verdict)
    }

    pub async fn judge_checkpoint(
        &self,
        code: &str,
        tier: u8,
        required_patterns: &[String],
        description: &str,
    ) -> Result<JudgeVerdict, LLMError> {
        let prompt = format!(
            "Tier {tier} checkpoint problem:\n{description}\n\nRequired patterns (all must be present):\n{}\n\nUser code:\n{code}\n",
            required_patterns.join(", ")
        );
        let request = GenerationRequest::new(prompt)
            .with_system(CHECKPOINT_RUBRIC)
            .json();

        let raw = self.generator.generate(&request).await?;
        let verdict = match parse_object(&raw) {
            Some(obj) => JudgeVerdict {
                verdict: read_verdict(&obj, false),
                feedback: read_feedback(&obj),
                patterns_found: read_patterns(&obj, "patterns_found"),
                missing_patterns: read_patterns(&obj, "missing_patterns"),
            },
            None => {
                warn!(tier, raw_len = raw.len(), "Unparseable checkpoint verdict");
                JudgeVerdict {
                    verdict: Verdict::Error,
                    feedback: PARSE_FAILURE_FEEDBACK.to_string(),
                    patterns_found: Vec::new(),
                    missing_patterns: required_patterns.to_vec(),
                }
            }
        };

        Ok(verdict)
    }

    /// Socratic mentor reply for a topic. Free text.
    pub async fn chat(&self, topic_label: &str, message: &str) -> Result<String, LLMError> {
        let system = format!(
            "You are the {topic_label} Architect. Help the learner understand the concept of \
             {topic_label} through analogies and Socratic questions. Do not write code. Focus on \
             intuition, the why, and the trade-offs. Keep replies under 50 words unless asked for detail."
        );
        let request = GenerationRequest::new(message).with_system(system);
        self.generator.generate(&request).await
    }

    pub async fn analyze_complexity(&self, code: &str) -> Result<String, LLMError> {
        let request = GenerationRequest::new(code).with_system(COMPLEXITY_RUBRIC);
        self.generator.generate(&request).await
    }
}

/// Substring from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_object(raw: &str) -> Option<serde_json::Map<String, Value>> {
    let block = extract_json_block(raw)?;
    match serde_json::from_str::<Value>(block) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Lenient decoding trims, ignores case and takes `OPTIMAL`; strict decoding
/// only takes the exact upper-case tokens.
fn read_verdict(obj: &serde_json::Map<String, Value>, lenient: bool) -> Verdict {
    let Some(raw) = obj.get("verdict").and_then(Value::as_str) else {
        return Verdict::Error;
    };
    let token = if lenient {
        raw.trim().to_ascii_uppercase()
    } else {
        raw.to_string()
    };

    match token.as_str() {
        "ADVANCE" => Verdict::Advance,
        "OPTIMAL" if lenient => Verdict::Advance,
        "REPEAT" => Verdict::Repeat,
        "ERROR" => Verdict::Error,
        other => {
            warn!(verdict = other, "Unrecognized verdict from judge");
            Verdict::Error
        }
    }
}

fn read_feedback(obj: &serde_json::Map<String, Value>) -> String {
    obj.get("feedback")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(MISSING_FEEDBACK)
        .to_string()
}

fn read_patterns(obj: &serde_json::Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

//! 프롬프트 템플릿
//!
//! `{context}` 와 `{question}` 자리표시자를 치환하여 렌더링합니다.

use std::fmt;
use std::str::FromStr;

/// 증상 분류(트리아지) 프롬프트
const SYMPTOM_TRIAGE_TEMPLATE: &str = "\
You are a veterinary AI assistant helping pet owners by providing clear, compassionate, and informative advice.
Use the information provided in the context below to answer the user's question.

Context:
{context}

Question:
{question}

Instructions:
- Use only the context information to answer.
- If the context does not contain enough information, politely say so.
- Avoid giving any emergency or medical diagnosis; always recommend consulting a qualified veterinarian if serious symptoms are present.
- Provide advice in simple, friendly language suitable for pet owners.
- If appropriate, suggest general next steps like monitoring symptoms, ensuring hydration, or visiting a vet.

Answer:";

/// 예방 관리 프롬프트
const PREVENTATIVE_CARE_TEMPLATE: &str = "\
You are a knowledgeable veterinary assistant.

Based on the following veterinary information, provide friendly advice about how pet owners can prevent common illnesses and keep their pets healthy.

Information:
{context}

Question:
{question}

Answer:";

/// 사용할 프롬프트 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptKind {
    #[default]
    SymptomTriage,
    PreventativeCare,
}

impl PromptKind {
    pub fn template(self) -> PromptTemplate {
        match self {
            PromptKind::SymptomTriage => PromptTemplate::new(SYMPTOM_TRIAGE_TEMPLATE),
            PromptKind::PreventativeCare => PromptTemplate::new(PREVENTATIVE_CARE_TEMPLATE),
        }
    }
}

impl FromStr for PromptKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "triage" | "symptom_triage" => Ok(PromptKind::SymptomTriage),
            "preventative" | "preventative_care" => Ok(PromptKind::PreventativeCare),
            other => Err(format!(
                "unknown prompt '{}', expected 'triage' or 'preventative'",
                other
            )),
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptKind::SymptomTriage => write!(f, "triage"),
            PromptKind::PreventativeCare => write!(f, "preventative"),
        }
    }
}

/// `{context}`, `{question}` 템플릿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// 자리표시자 치환
    ///
    /// context 를 먼저 치환하지 않도록 한 번에 처리합니다 (문서 안의 `{question}` 보존).
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template;

        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("{context}") {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{question}") {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

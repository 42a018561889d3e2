use crate::Message;

const GENERAL: [&str; 4] = [
    "Can you summarize the key points?",
    "What are the main topics covered?",
    "Are there any important dates or deadlines?",
    "What are the next steps or action items?",
];

const FOLLOW_UP: [&str; 3] = [
    "Can you elaborate on that?",
    "What does that mean?",
    "Can you provide more details?",
];

const PDF: [&str; 4] = [
    "Extract the main headings from this document",
    "Summarize this document in bullet points",
    "What are the key findings in this document?",
    "Extract any tables or figures from this document",
];

const CONTRACT: [&str; 4] = [
    "What are the key terms and conditions?",
    "What are the termination clauses?",
    "What are the payment terms?",
    "What are the key obligations of each party?",
];

const FINANCIAL: [&str; 4] = [
    "What are the key financial metrics?",
    "Can you analyze the revenue trends?",
    "What are the main expenses?",
    "What are the profit margins?",
];

const DOCUMENT: [&str; 4] = [
    "What is this document about?",
    "Can you provide a summary?",
    "What are the key points?",
    "Are there any important dates or deadlines?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Pdf,
    Contract,
    Financial,
    Default,
}

impl DocumentType {
    fn prompts(self) -> &'static [&'static str] {
        match self {
            DocumentType::Pdf => &PDF,
            DocumentType::Contract => &CONTRACT,
            DocumentType::Financial => &FINANCIAL,
            DocumentType::Default => &DOCUMENT,
        }
    }
}

/// Guesses what kind of document a file name refers to.
///
/// Name keywords win over the extension, so `Q3_report_financial.pdf` is
/// financial rather than a generic pdf.
pub fn classify_document(file_name: Option<&str>) -> DocumentType {
    let Some(name) = file_name else {
        return DocumentType::Default;
    };
    let lower = name.to_lowercase();
    if lower.contains("contract") || lower.contains("agreement") {
        DocumentType::Contract
    } else if ["financial", "report", "statement"]
        .iter()
        .any(|keyword| lower.contains(keyword))
    {
        DocumentType::Financial
    } else if lower.ends_with(".pdf") {
        DocumentType::Pdf
    } else {
        DocumentType::Default
    }
}

/// Follow-up prompts for the current conversation.
///
/// Pure: the same history and file name always give the same list.
pub fn suggestions(messages: &[Message], selected_file_name: Option<&str>) -> Vec<&'static str> {
    let Some(last) = messages.last() else {
        return GENERAL.to_vec();
    };

    let document_type = classify_document(selected_file_name);
    if last.is_bot() {
        FOLLOW_UP
            .iter()
            .chain(document_type.prompts())
            .copied()
            .collect()
    } else if selected_file_name.is_some() {
        document_type.prompts().to_vec()
    } else {
        GENERAL.to_vec()
    }
}

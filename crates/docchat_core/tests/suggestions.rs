use std::time::Duration;

use docchat_core::{
    classify_document, suggestions, update, AppState, DocumentType, Effect, Msg, RequestToken,
};

fn ask(state: AppState, text: &str) -> (AppState, RequestToken) {
    let (state, _) = update(state, Msg::InputChanged(text.to_string()));
    let (state, effects) = update(state, Msg::SendSubmitted);
    let token = match effects.as_slice() {
        [Effect::Ask { token, .. }] => *token,
        other => panic!("expected one ask effect, got {other:?}"),
    };
    (state, token)
}

#[test]
fn keywords_take_precedence_over_pdf_extension() {
    assert_eq!(
        classify_document(Some("Q3_report_financial.pdf")),
        DocumentType::Financial
    );
    assert_eq!(
        classify_document(Some("Lease-AGREEMENT.pdf")),
        DocumentType::Contract
    );
    assert_eq!(classify_document(Some("notes.PDF")), DocumentType::Pdf);
    assert_eq!(classify_document(Some("notes.txt")), DocumentType::Default);
    assert_eq!(classify_document(None), DocumentType::Default);
}

#[test]
fn empty_history_gives_general_starters() {
    let list = suggestions(&[], Some("contract.pdf"));
    assert_eq!(list[0], "Can you summarize the key points?");
    assert_eq!(list.len(), 4);
}

#[test]
fn user_message_with_selected_file_gives_document_prompts() {
    let (state, _) = ask(AppState::new(), "hello");
    let list = suggestions(state.messages(), Some("Q3_report_financial.pdf"));
    assert_eq!(list[0], "What are the key financial metrics?");

    let without_file = suggestions(state.messages(), None);
    assert_eq!(without_file[0], "Can you summarize the key points?");
}

#[test]
fn bot_reply_prepends_elaboration_prompts() {
    let (state, token) = ask(AppState::new(), "hello");
    let (state, _) = update(
        state,
        Msg::AskAnswered {
            token,
            answer: "hi".to_string(),
            conversation_id: None,
            elapsed: Duration::from_millis(10),
        },
    );

    let list = suggestions(state.messages(), Some("service contract.docx"));
    assert_eq!(
        &list[..4],
        &[
            "Can you elaborate on that?",
            "What does that mean?",
            "Can you provide more details?",
            "What are the key terms and conditions?",
        ]
    );
    assert_eq!(list.len(), 7);
}

#[test]
fn suggestions_are_pure() {
    let (state, _) = ask(AppState::new(), "hello");
    let first = suggestions(state.messages(), Some("report.pdf"));
    let second = suggestions(state.messages(), Some("report.pdf"));
    assert_eq!(first, second);
    assert_eq!(state.view().suggestions, state.view().suggestions);
}

#[test]
fn choosing_a_suggestion_sends_it() {
    let (state, effects) = update(AppState::new(), Msg::SuggestionChosen(1));
    assert_eq!(
        state.messages().last().map(|m| m.content.as_str()),
        Some("What are the main topics covered?")
    );
    assert!(matches!(
        effects.as_slice(),
        [Effect::Ask { question, .. }] if question == "What are the main topics covered?"
    ));

    let (_, effects) = update(AppState::new(), Msg::SuggestionChosen(99));
    assert!(effects.is_empty());
}

#[test]
fn choosing_a_suggestion_while_pending_keeps_typed_input() {
    let (state, _) = ask(AppState::new(), "first question");
    let (state, _) = update(state, Msg::InputChanged("half typed".to_string()));
    let messages_before = state.messages().len();

    let (state, effects) = update(state, Msg::SuggestionChosen(0));

    assert!(effects.is_empty());
    assert_eq!(state.input(), "half typed");
    assert_eq!(state.messages().len(), messages_before);
}

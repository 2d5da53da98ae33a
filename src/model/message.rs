use crate::model::round::RoundRecord;
use crate::model::session::SessionState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersonaSpeaker {
    Trigger,
    Devil,
    Guide,
    Strategist,
}

impl PersonaSpeaker {
    pub fn settings_key(self) -> &'static str {
        match self {
            PersonaSpeaker::Trigger => "Trigger",
            PersonaSpeaker::Devil => "Devil",
            PersonaSpeaker::Guide => "Guide",
            PersonaSpeaker::Strategist => "Strategist",
        }
    }
}

/// One bubble in the dialogue view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    User(String),
    Persona {
        speaker: PersonaSpeaker,
        text: String,
    },
    System(String),
}

/// Flattens committed rounds plus the working draft into display order.
pub fn transcript(state: &SessionState) -> Vec<Message> {
    let mut messages = Vec::new();

    if !state.concern.is_empty() {
        let theme = state.theme.as_deref().unwrap_or("未选择");
        messages.push(Message::User(format!("【{theme}】{}", state.concern)));
    }

    for record in state.history.all() {
        push_round(&mut messages, record);
    }

    if let Some(draft) = &state.draft {
        messages.push(Message::System(format!("第 {} 轮", draft.round_number)));
        if !draft.scene.is_empty() {
            messages.push(persona(PersonaSpeaker::Trigger, format!("🌆 {}", draft.scene)));
        }
        if !draft.inner_thought.is_empty() {
            messages.push(persona(
                PersonaSpeaker::Devil,
                format!("😈 [{}] {}", draft.distortion_type, draft.inner_thought),
            ));
        }
        if let Some(comfort) = &draft.user_comfort {
            messages.push(Message::User(comfort.clone()));
        }
    }

    if let Some(summary) = &state.journey_summary {
        messages.push(Message::System(format!("🪞 自我融合总结\n{summary}")));
    }

    messages
}

fn push_round(messages: &mut Vec<Message>, record: &RoundRecord) {
    messages.push(Message::System(format!("第 {} 轮", record.round_number)));
    messages.push(persona(PersonaSpeaker::Trigger, format!("🌆 {}", record.scene)));
    messages.push(persona(
        PersonaSpeaker::Devil,
        format!("😈 [{}] {}", record.distortion_type, record.inner_thought),
    ));
    messages.push(Message::User(record.user_comfort.clone()));

    let suggestions = record
        .guidance_suggestions
        .iter()
        .map(|s| format!("• {s}"))
        .collect::<Vec<_>>()
        .join("\n");
    messages.push(persona(PersonaSpeaker::Guide, format!("🧭 {suggestions}")));

    let directive = &record.progression_directive;
    let plan = if directive.is_end {
        "🏁 对话在此结束".to_string()
    } else {
        format!(
            "➡ 场景：{}\n➡ 想法：{}",
            directive.next_scene_directive, directive.next_thought_directive
        )
    };
    messages.push(persona(PersonaSpeaker::Strategist, plan));
}

fn persona(speaker: PersonaSpeaker, text: String) -> Message {
    Message::Persona { speaker, text }
}

use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::request::{DATE_FORMAT, Request, RequestStatus};

/// How many of a user's requests the history card shows.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Blue,
    Green,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Success,
    Danger,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CardButton {
    /// Stable id the gateway routes clicks by, e.g. `approve_12`
    #[schema(example = "approve_12")]
    pub custom_id: String,
    pub label: String,
    pub emoji: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

/// Platform-neutral message the gateway turns into an embed with buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: CardColor,
    /// Role names to ping alongside the card
    pub mentions: Vec<String>,
    pub fields: Vec<CardField>,
    pub footer: String,
    pub buttons: Vec<CardButton>,
}

fn field(name: &str, value: impl Into<String>, inline: bool) -> CardField {
    CardField {
        name: name.to_string(),
        value: value.into(),
        inline,
    }
}

fn button(custom_id: String, label: &str, emoji: &str, style: ButtonStyle, disabled: bool) -> CardButton {
    CardButton {
        custom_id,
        label: label.to_string(),
        emoji: emoji.to_string(),
        style,
        disabled,
    }
}

fn moderator(request: &Request) -> &str {
    request.moderator_name.as_deref().unwrap_or("—")
}

fn status_line(request: &Request) -> String {
    match request.status {
        RequestStatus::Pending => "⏳ Ожидает рассмотрения".to_string(),
        RequestStatus::Approved => format!("✅ Одобрено\n👤 Одобрил: {}", moderator(request)),
        RequestStatus::Rejected => format!("❌ Отклонено\n👤 Отклонил: {}", moderator(request)),
    }
}

/// Card for a single request. Buttons are disabled once it leaves Pending.
pub fn render_request_card(request: &Request, mentions: &[String]) -> Card {
    let time = match (request.time_range, request.duration_label()) {
        (Some(range), Some(label)) => format!("{range} ({label})"),
        _ => "—".to_string(),
    };

    let mut fields = vec![
        field("👤 Заявитель", request.requester_display_name.clone(), false),
        field("🏷️ Статик", request.static_id.clone(), true),
        field("📅 Дата", request.date.format(DATE_FORMAT).to_string(), true),
        field("⏰ Время", time, true),
        field("✏️ Причина", request.reason.clone(), false),
        field("🏛️ Подразделение", request.department.clone(), false),
        field("📢 Статус:", status_line(request), false),
    ];
    if let Some(reason) = &request.rejection_reason {
        fields.push(field("Причина отклонения", reason.clone(), false));
    }

    let color = match request.status {
        RequestStatus::Pending => CardColor::Blue,
        RequestStatus::Approved => CardColor::Green,
        RequestStatus::Rejected => CardColor::Red,
    };
    let locked = !request.is_pending();
    let id = request.id;

    Card {
        request_id: Some(id),
        requester_id: Some(request.requester_id.clone()),
        title: "🧳 Заявка на отгул".to_string(),
        description: None,
        color,
        mentions: mentions.to_vec(),
        fields,
        footer: format!("ID запроса: #{id}"),
        buttons: vec![
            button(format!("approve_{id}"), "Одобрить", "✅", ButtonStyle::Success, locked),
            button(format!("reject_{id}"), "Отклонить", "❌", ButtonStyle::Danger, locked),
            button(format!("delete_{id}"), "Удалить", "🗑️", ButtonStyle::Secondary, locked),
        ],
    }
}

/// Summary of a user's requests; `None` when there are none.
pub fn render_history(requests: &[Request]) -> Option<Card> {
    if requests.is_empty() {
        return None;
    }

    let skip = requests.len().saturating_sub(HISTORY_LIMIT);
    let fields = requests[skip..]
        .iter()
        .map(|request| {
            let (emoji, text) = match request.status {
                RequestStatus::Pending => ("⏳", "Ожидает"),
                RequestStatus::Approved => ("✅", "Одобрен"),
                RequestStatus::Rejected => ("❌", "Отклонен"),
            };
            let mut info = format!("Статус: {text}");
            match (&request.status, &request.moderator_name) {
                (RequestStatus::Approved, Some(name)) => info.push_str(&format!("\nОдобрил: {name}")),
                (RequestStatus::Rejected, Some(name)) => info.push_str(&format!("\nОтклонил: {name}")),
                _ => {}
            }
            field(
                &format!(
                    "{emoji} Запрос #{} - {}",
                    request.id,
                    request.date.format(DATE_FORMAT)
                ),
                info,
                false,
            )
        })
        .collect();

    Some(Card {
        request_id: None,
        requester_id: None,
        title: format!("📋 Ваши запросы на отгул ({})", requests.len()),
        description: None,
        color: CardColor::Green,
        mentions: Vec::new(),
        fields,
        footer: String::new(),
        buttons: Vec::new(),
    })
}

/// Explanatory card with the "submit" button, posted by moderators.
pub fn render_info_card(now: NaiveDateTime) -> Card {
    Card {
        request_id: None,
        requester_id: None,
        title: "🧳 Система подачи заявок на отгулы".to_string(),
        description: Some("Здесь вы можете подать заявку на отгул в рабочее время.".to_string()),
        color: CardColor::Blue,
        mentions: Vec::new(),
        fields: vec![
            field(
                "⚠️ Важные ограничения:",
                "• Максимальная длительность отгула: **1 час**\n\
                 • Можно подать только на **сегодняшний день**\n\
                 • Отгул разрешен только в **рабочее время**\n\
                 • Можно подать только **одну заявку в день**\n\
                 • Время должно быть в **будущем** относительно текущего момента",
                false,
            ),
            field(
                "📝 Что нужно указать:",
                "• Имя и фамилия\n\
                 • Статик (123-456)\n\
                 • Время начала и конца отгула (формат НН:ММ)\n\
                 • Причина взятия отгула",
                false,
            ),
            field(
                "🔍 Рассмотрение заявок:",
                "• Заявки рассматривают командиры вашего подразделения\n\
                 • Уведомление о результате придет в **личные сообщения**\n\
                 • Вы можете **удалить** свою заявку до рассмотрения\n\
                 • При отклонении можно подать новую заявку в тот же день",
                false,
            ),
        ],
        footer: format!(
            "Нажмите кнопку ниже, чтобы подать заявку • {}",
            now.format("%d.%m.%Y %H:%M")
        ),
        buttons: vec![button(
            "submit_otgul".to_string(),
            "Подать заявку на отгул",
            "✈️",
            ButtonStyle::Success,
            false,
        )],
    }
}

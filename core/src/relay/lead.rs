//! Lead record parsing, validation and notification text

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::error::RelayError;
use crate::relay::mappers::value_to_text;

const DEFAULT_SOURCE: &str = "web";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadRecord {
    pub name: String,
    pub phone: String,
    pub date: String,
    pub time: Option<String>,
    pub inn: Option<String>,
    pub note: Option<String>,
    pub source: String,
    pub created_at: String,
}

fn field(payload: &Value, key: &str) -> String {
    payload.get(key).map(value_to_text).unwrap_or_default().trim().to_string()
}

fn optional_field(payload: &Value, key: &str) -> Option<String> {
    Some(field(payload, key)).filter(|v| !v.is_empty())
}

impl LeadRecord {
    /// Validate a lead payload. name, phone and date must be non-empty
    /// after trimming; nothing else is required.
    pub fn from_payload(payload: &Value) -> Result<Self, RelayError> {
        let name = field(payload, "name");
        let phone = field(payload, "phone");
        let date = field(payload, "date");

        if name.is_empty() || phone.is_empty() || date.is_empty() {
            return Err(RelayError::Validation("name/phone/date required".to_string()));
        }

        let source = optional_field(payload, "source").unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let created_at = optional_field(payload, "createdAt")
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        Ok(Self {
            name,
            phone,
            date,
            time: optional_field(payload, "time"),
            inn: optional_field(payload, "inn"),
            note: optional_field(payload, "note"),
            source,
            created_at,
        })
    }

    /// Human-readable notification; optional lines only appear when set
    pub fn render_message(&self) -> String {
        let mut lines = vec![
            "🆕 Заявка на консультацию по кредиту".to_string(),
            format!("Контакт: {}", self.name),
            format!("Телефон: {}", self.phone),
            format!("Дата звонка: {}", self.date),
        ];
        if let Some(time) = &self.time {
            lines.push(format!("Время: {}", time));
        }
        if let Some(inn) = &self.inn {
            lines.push(format!("ИНН: {}", inn));
        }
        if let Some(note) = &self.note {
            lines.push(format!("Комментарий: {}", note));
        }
        lines.push(format!("Источник: {}", self.source));
        lines.push(format!("Создано: {}", self.created_at));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_name_phone_and_date() {
        let cases = [
            json!({}),
            json!({"name": "Ivanov", "phone": "+7900"}),
            json!({"name": "  ", "phone": "+7900", "date": "2024-05-01"}),
            json!({"name": "Ivanov", "phone": null, "date": "2024-05-01"}),
            json!("not an object"),
        ];
        for payload in cases {
            let err = LeadRecord::from_payload(&payload).unwrap_err();
            assert!(matches!(err, RelayError::Validation(_)), "payload: {payload}");
        }
    }

    #[test]
    fn trims_and_defaults_fields() {
        let lead = LeadRecord::from_payload(&json!({
            "name": " Ivanov ",
            "phone": 79001234567u64,
            "date": "2024-05-01",
            "note": "   "
        }))
        .unwrap();

        assert_eq!(lead.name, "Ivanov");
        assert_eq!(lead.phone, "79001234567");
        assert_eq!(lead.source, "web");
        assert!(lead.note.is_none());
        assert!(lead.created_at.ends_with('Z'));
    }

    #[test]
    fn renders_only_present_optional_fields() {
        let lead = LeadRecord::from_payload(&json!({
            "name": "Ivanov",
            "phone": "+7900",
            "date": "2024-05-01",
            "inn": "7707083893",
            "source": "landing",
            "createdAt": "2024-04-30T10:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(
            lead.render_message(),
            "🆕 Заявка на консультацию по кредиту\n\
             Контакт: Ivanov\n\
             Телефон: +7900\n\
             Дата звонка: 2024-05-01\n\
             ИНН: 7707083893\n\
             Источник: landing\n\
             Создано: 2024-04-30T10:00:00.000Z"
        );
    }

    #[test]
    fn renders_time_and_note() {
        let lead = LeadRecord::from_payload(&json!({
            "name": "Ivanov",
            "phone": "+7900",
            "date": "2024-05-01",
            "time": "10:30",
            "note": "call after lunch"
        }))
        .unwrap();
        let text = lead.render_message();

        assert!(text.contains("\nВремя: 10:30\n"));
        assert!(text.contains("\nКомментарий: call after lunch\n"));
        assert!(!text.contains("ИНН"));
    }
}

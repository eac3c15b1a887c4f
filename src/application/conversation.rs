use crate::application::keyed_lock::KeyedLocks;
use crate::domain::payment::{Id, Link, PaymentTemplate, TemplateSource, User};
use crate::domain::ports::PaymentAdminBox;
use crate::error::PaymentError;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// Chat identity as assigned by the messaging platform.
pub type ChatId = i64;

/// Currencies an administrator may issue payments in.
pub const SUPPORTED_CURRENCIES: &[&str] = &["RUB"];

pub const CONFIRM_YES: &str = "да";
pub const CONFIRM_NO: &str = "нет";

const MSG_UNAUTHORIZED: &str =
    "у вас нет прав доступа к функциям бота, обратитесь к администратору";
const MSG_HELP: &str = "вы успешно авторизованы, список доступных команд:\n\
    1) /new_payment - создание нового платежа\n\
    2) /all_payment - получение статусов всех платежей\n\
    3) /get_payment <id> - получение статуса платежа по его id";
const MSG_UNKNOWN: &str = "неизвестная команда, введите /start для получения списка команд";
const MSG_ASK_AMOUNT: &str = "для создания платежа введите сумму и валюту в формате \"1000 RUB\"";
const MSG_BAD_AMOUNT_FORMAT: &str = "неверный формат суммы и валюты платежа, пример \"1000 RUB\"";
const MSG_BAD_AMOUNT: &str = "некорректная сумма платежа, ожидается положительное целое число";
const MSG_BAD_CURRENCY: &str = "некорректная валюта платежа, пример \"RUB\"";
const MSG_ASK_DESCRIPTION: &str = "сумма и валюта платежа успешно добавлены\nвведите описание платежа:";
const MSG_ASK_LINK: &str = "описание платежа успешно добавлено\nвведите ссылку на ресурс:";
const MSG_BAD_LINK: &str = "некорректная ссылка";
const MSG_BAD_CONFIRMATION: &str =
    "некорректный ответ, введите \"да\"/\"нет\" или нажмите на одну из соответствующих кнопок";
const MSG_CREATED: &str = "платеж успешно создан, платежная ссылка:\n";
const MSG_CREATE_FAILED: &str = "не удалось создать платеж";
const MSG_CANCELLED: &str = "создание нового платежа отменено";
const MSG_STATUSES: &str = "список статусов платежей в формате \"id: status\"";
const MSG_NO_PAYMENTS: &str = "платежей пока нет";
const MSG_STATUSES_FAILED: &str = "не удалось получить статусы платежей";
const MSG_BAD_GET_PAYMENT: &str = "неверный формат команды, ожидается \"/get_payment <id>\"";

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat: ChatId,
    /// Display name of the author.
    pub sender: String,
    pub text: String,
}

/// What the bot answers with. `buttons` become a one-row reply keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub buttons: Option<Vec<String>>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: None,
        }
    }

    fn confirm(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Some(vec![CONFIRM_YES.to_string(), CONFIRM_NO.to_string()]),
        }
    }
}

/// A fully collected payment request awaiting the administrator's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    pub amount: u32,
    pub currency: String,
    pub description: String,
    pub resource_link: Link,
}

impl PaymentDraft {
    fn summary(&self) -> String {
        format!(
            "сумма: {} {}\nописание: {}\nссылка на ресурс: {}",
            self.amount, self.currency, self.description, self.resource_link
        )
    }
}

/// Step of a guided payment creation. A chat without a session is idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    AwaitingAmountCurrency,
    AwaitingDescription {
        amount: u32,
        currency: String,
    },
    AwaitingResourceLink {
        amount: u32,
        currency: String,
        description: String,
    },
    AwaitingConfirmation(PaymentDraft),
}

/// Drives administrators through payment creation and status queries.
///
/// Messages from one chat are handled one at a time in the order they arrive;
/// different chats proceed in parallel. Sessions live in memory only.
pub struct ConversationService {
    admin: PaymentAdminBox,
    whitelist: HashSet<ChatId>,
    admin_email: String,
    locks: KeyedLocks<ChatId>,
    sessions: Mutex<HashMap<ChatId, ConversationState>>,
}

impl ConversationService {
    /// Creates a new `ConversationService`.
    ///
    /// # Arguments
    ///
    /// * `admin` - Payment operations, in-process or remote.
    /// * `whitelist` - Chats allowed to use the bot.
    /// * `admin_email` - Contact email attached to payments created from chat.
    pub fn new(
        admin: PaymentAdminBox,
        whitelist: impl IntoIterator<Item = ChatId>,
        admin_email: impl Into<String>,
    ) -> Self {
        Self {
            admin,
            whitelist: whitelist.into_iter().collect(),
            admin_email: admin_email.into(),
            locks: KeyedLocks::new(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_authorized(&self, chat: ChatId) -> bool {
        self.whitelist.contains(&chat)
    }

    /// Current step of the chat's guided creation, `None` when idle.
    pub fn session(&self, chat: ChatId) -> Option<ConversationState> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chat)
            .cloned()
    }

    pub fn has_session(&self, chat: ChatId) -> bool {
        self.session(chat).is_some()
    }

    /// Processes one message and returns the reply to send back.
    pub async fn handle(&self, message: IncomingMessage) -> Reply {
        if !self.is_authorized(message.chat) {
            tracing::warn!(chat_id = message.chat, "unauthorized chat");
            return Reply::text(MSG_UNAUTHORIZED);
        }

        let _guard = self.locks.lock(&message.chat).await;

        let command = command_name(&message.text);
        let state = self.take_session(message.chat);

        match (command, state) {
            ("/start", _) => Reply::text(MSG_HELP),
            ("/new_payment", _) => {
                self.put_session(message.chat, ConversationState::AwaitingAmountCurrency);
                Reply::text(MSG_ASK_AMOUNT)
            }
            (_, Some(state)) => {
                let (reply, next) = self.step(state, &message).await;
                if let Some(next) = next {
                    self.put_session(message.chat, next);
                }
                reply
            }
            ("/all_payment", None) => self.all_payments(message.chat).await,
            ("/get_payment", None) => self.one_payment(&message).await,
            (_, None) => Reply::text(MSG_UNKNOWN),
        }
    }

    fn take_session(&self, chat: ChatId) -> Option<ConversationState> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chat)
    }

    fn put_session(&self, chat: ChatId, state: ConversationState) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chat, state);
    }

    /// Advances a session by one message. `None` as the next state ends the session.
    async fn step(
        &self,
        state: ConversationState,
        message: &IncomingMessage,
    ) -> (Reply, Option<ConversationState>) {
        match state {
            ConversationState::AwaitingAmountCurrency => match parse_amount_currency(&message.text) {
                Ok((amount, currency)) => (
                    Reply::text(MSG_ASK_DESCRIPTION),
                    Some(ConversationState::AwaitingDescription { amount, currency }),
                ),
                Err(reprompt) => (
                    Reply::text(reprompt),
                    Some(ConversationState::AwaitingAmountCurrency),
                ),
            },
            ConversationState::AwaitingDescription { amount, currency } => (
                Reply::text(MSG_ASK_LINK),
                Some(ConversationState::AwaitingResourceLink {
                    amount,
                    currency,
                    description: message.text.clone(),
                }),
            ),
            ConversationState::AwaitingResourceLink {
                amount,
                currency,
                description,
            } => {
                let mut tokens = message.text.split_whitespace();
                let link = match (tokens.next(), tokens.next()) {
                    (Some(token), None) => Link::parse(token).ok(),
                    _ => None,
                };
                match link {
                    Some(resource_link) => {
                        let draft = PaymentDraft {
                            amount,
                            currency,
                            description,
                            resource_link,
                        };
                        let prompt = format!(
                            "ссылка на ресурс успешно добавлена, подтвердить создание платежа со следующими параметрами?\n{}",
                            draft.summary()
                        );
                        (
                            Reply::confirm(prompt),
                            Some(ConversationState::AwaitingConfirmation(draft)),
                        )
                    }
                    None => (
                        Reply::text(MSG_BAD_LINK),
                        Some(ConversationState::AwaitingResourceLink {
                            amount,
                            currency,
                            description,
                        }),
                    ),
                }
            }
            ConversationState::AwaitingConfirmation(draft) => match message.text.trim() {
                "да" | "yes" => (self.submit(draft, message).await, None),
                "нет" | "no" => (Reply::text(MSG_CANCELLED), None),
                _ => (
                    Reply::confirm(MSG_BAD_CONFIRMATION),
                    Some(ConversationState::AwaitingConfirmation(draft)),
                ),
            },
        }
    }

    async fn submit(&self, draft: PaymentDraft, message: &IncomingMessage) -> Reply {
        let name = match message.sender.trim() {
            "" => message.chat.to_string(),
            sender => sender.to_string(),
        };
        let user = User {
            id: message.chat.to_string(),
            name,
            email: self.admin_email.clone(),
        };
        let template = PaymentTemplate {
            currency: draft.currency,
            amount: draft.amount,
            description: draft.description,
            resource_link: draft.resource_link,
        };

        match self
            .admin
            .create_payment(TemplateSource::Inline(template), user)
            .await
        {
            Ok(link) => {
                tracing::info!(chat_id = message.chat, "payment created from chat");
                Reply::text(format!("{MSG_CREATED}{link}"))
            }
            Err(e) => {
                tracing::error!(chat_id = message.chat, error = %e, "failed to create payment");
                Reply::text(MSG_CREATE_FAILED)
            }
        }
    }

    async fn all_payments(&self, chat: ChatId) -> Reply {
        match self.admin.payment_statuses().await {
            Ok(statuses) if statuses.is_empty() => Reply::text(MSG_NO_PAYMENTS),
            Ok(statuses) => {
                let mut statuses: Vec<_> = statuses.into_iter().collect();
                statuses.sort_by(|a, b| a.0.cmp(&b.0));

                let mut text = String::from(MSG_STATUSES);
                for (id, status) in statuses {
                    text.push_str(&format!("\n{id}: {status}"));
                }
                Reply::text(text)
            }
            Err(e) => {
                tracing::error!(chat_id = chat, error = %e, "failed to list payment statuses");
                Reply::text(MSG_STATUSES_FAILED)
            }
        }
    }

    async fn one_payment(&self, message: &IncomingMessage) -> Reply {
        let tokens: Vec<&str> = message.text.split_whitespace().collect();
        let [_, raw_id] = tokens.as_slice() else {
            return Reply::text(MSG_BAD_GET_PAYMENT);
        };
        let Ok(id) = Id::new(*raw_id) else {
            return Reply::text(MSG_BAD_GET_PAYMENT);
        };

        match self.admin.payment_status(&id).await {
            Ok(status) => Reply::text(format!("статус платежа {id}: {status}")),
            Err(PaymentError::NotFound(_)) => Reply::text(format!("платеж {id} не найден")),
            Err(e) => {
                tracing::error!(chat_id = message.chat, payment_id = %id, error = %e, "failed to get payment status");
                Reply::text(format!("не удалось получить статус платежа {id}"))
            }
        }
    }
}

/// First token of `text`, with the `@botname` suffix group chats append to commands removed.
fn command_name(text: &str) -> &str {
    let token = text.split_whitespace().next().unwrap_or_default();
    match token.split_once('@') {
        Some((command, _)) if command.starts_with('/') => command,
        _ => token,
    }
}

/// Parses `"<amount> <currency>"`, returning the re-prompt on failure.
fn parse_amount_currency(text: &str) -> Result<(u32, String), &'static str> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [amount, currency] = tokens.as_slice() else {
        return Err(MSG_BAD_AMOUNT_FORMAT);
    };
    let amount = match amount.parse::<u32>() {
        Ok(amount) if amount > 0 => amount,
        _ => return Err(MSG_BAD_AMOUNT),
    };
    if !SUPPORTED_CURRENCIES.contains(currency) {
        return Err(MSG_BAD_CURRENCY);
    }
    Ok((amount, currency.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_currency() {
        assert_eq!(parse_amount_currency("1000 RUB"), Ok((1000, "RUB".to_string())));
        assert_eq!(parse_amount_currency("  7   RUB "), Ok((7, "RUB".to_string())));
        assert_eq!(parse_amount_currency("1000"), Err(MSG_BAD_AMOUNT_FORMAT));
        assert_eq!(parse_amount_currency("1000 RUB extra"), Err(MSG_BAD_AMOUNT_FORMAT));
        assert_eq!(parse_amount_currency("abc RUB"), Err(MSG_BAD_AMOUNT));
        assert_eq!(parse_amount_currency("-5 RUB"), Err(MSG_BAD_AMOUNT));
        assert_eq!(parse_amount_currency("0 RUB"), Err(MSG_BAD_AMOUNT));
        assert_eq!(parse_amount_currency("4294967296 RUB"), Err(MSG_BAD_AMOUNT));
        assert_eq!(parse_amount_currency("1000 USD"), Err(MSG_BAD_CURRENCY));
        assert_eq!(parse_amount_currency("1000 rub"), Err(MSG_BAD_CURRENCY));
    }

    #[test]
    fn test_command_name() {
        assert_eq!(command_name("/start"), "/start");
        assert_eq!(command_name("/new_payment@paylink_bot"), "/new_payment");
        assert_eq!(command_name("  /get_payment@paylink_bot abc"), "/get_payment");
        assert_eq!(command_name("admin@example.com"), "admin@example.com");
        assert_eq!(command_name(""), "");
    }

    #[test]
    fn test_draft_summary_lists_all_fields() {
        let draft = PaymentDraft {
            amount: 1000,
            currency: "RUB".into(),
            description: "курс".into(),
            resource_link: Link::parse("https://example.com/res").unwrap(),
        };
        let summary = draft.summary();
        assert!(summary.contains("1000 RUB"));
        assert!(summary.contains("курс"));
        assert!(summary.contains("https://example.com/res"));
    }
}

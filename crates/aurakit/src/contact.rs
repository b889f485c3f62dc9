use crate::gate::query_param;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

pub const MESSAGING_BASE_URL: &str = "https://wa.me";
pub const DEFAULT_PHONE: &str = "5491125124207";
pub const DEFAULT_RECIPIENT: &str = "Guido";
pub const SIGNATURE: &str = "Enviado desde la web.";

pub const NAME_REQUIRED: &str = "El nombre es requerido.";
pub const EMAIL_REQUIRED: &str = "El correo es requerido.";
pub const EMAIL_INVALID: &str = "El formato del correo es inválido.";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactMode {
    #[default]
    Consulta,
    Sesion,
}

impl ContactMode {
    pub fn greeting(&self, recipient: &str) -> String {
        match self {
            Self::Sesion => format!(
                "Hola {}, quiero agendar una sesión de Coaching Cuántico.",
                recipient
            ),
            Self::Consulta => format!("Hola {}, tengo una consulta sobre este proceso.", recipient),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Consulta => "Hacer una consulta",
            Self::Sesion => "Agendar una sesión",
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct PhoneNumber(String);

crate::impl_string_newtype!(PhoneNumber);

impl Default for PhoneNumber {
    fn default() -> Self {
        Self::new(DEFAULT_PHONE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
    pub mode: ContactMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<&'static str>,
    pub email: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LinkError {
    #[error("Contact form is incomplete")]
    Invalid(FieldErrors),
}

/// `non-space @ non-space . non-space`, anywhere in the string.
fn looks_like_email(email: &str) -> bool {
    email.split_whitespace().any(|token| {
        token.char_indices().filter(|(_, c)| *c == '@').any(|(at, _)| {
            let (local, domain) = (&token[..at], &token[at + 1..]);
            !local.is_empty()
                && domain
                    .char_indices()
                    .any(|(dot, c)| c == '.' && dot > 0 && dot + 1 < domain.len())
        })
    })
}

impl ContactForm {
    pub fn validate(&self) -> FieldErrors {
        let name = self.name.trim().is_empty().then_some(NAME_REQUIRED);
        let email = if self.email.is_empty() {
            Some(EMAIL_REQUIRED)
        } else if !looks_like_email(&self.email) {
            Some(EMAIL_INVALID)
        } else {
            None
        };
        FieldErrors { name, email }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    pub fn message_text(&self, recipient: &str) -> String {
        format!(
            "{}\n\nNombre completo: {}\nCorreo: {}\nMensaje: {}\n\n{}",
            self.mode.greeting(recipient),
            self.name,
            self.email,
            self.message,
            SIGNATURE
        )
    }

    /// Pre-filled messaging link. Only produced for a valid form.
    pub fn messaging_link(&self, phone: &PhoneNumber, recipient: &str) -> Result<String, LinkError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(LinkError::Invalid(errors));
        }
        Ok(build_link(phone, &self.message_text(recipient)))
    }

    pub fn apply_prefill(&mut self, prefill: &Prefill) {
        if let Some(mode) = prefill.mode {
            self.mode = mode;
        }
        if !prefill.message.is_empty() {
            self.message = prefill.message.clone();
        }
    }
}

pub fn build_link(phone: &PhoneNumber, text: &str) -> String {
    format!(
        "{}/{}?text={}",
        MESSAGING_BASE_URL,
        phone.as_str(),
        urlencoding::encode(text)
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefill {
    pub mode: Option<ContactMode>,
    pub message: String,
}

impl Prefill {
    pub fn new(mode: ContactMode, message: impl Into<String>) -> Self {
        Self {
            mode: Some(mode),
            message: message.into(),
        }
    }

    /// Reads `mode` and `msg` from a query string; `None` when neither applies.
    pub fn from_query(query: &str) -> Option<Self> {
        let mode = query_param(query, "mode").and_then(|m| m.parse::<ContactMode>().ok());
        let message = query_param(query, "msg").unwrap_or_default();
        (mode.is_some() || !message.is_empty()).then_some(Self { mode, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Ana Pérez".into(),
            email: "ana@example.com".into(),
            message: "Hola & chau".into(),
            mode: ContactMode::Sesion,
        }
    }

    #[test]
    fn test_link_encodes_all_lines() {
        let link = form()
            .messaging_link(&PhoneNumber::default(), DEFAULT_RECIPIENT)
            .unwrap();
        let (base, text) = link.split_once("?text=").unwrap();
        assert_eq!(base, "https://wa.me/5491125124207");
        assert!(!text.contains(' ') && !text.contains('\n') && !text.contains('&'));

        let decoded = urlencoding::decode(text).unwrap();
        assert_eq!(
            decoded,
            "Hola Guido, quiero agendar una sesión de Coaching Cuántico.\n\n\
             Nombre completo: Ana Pérez\n\
             Correo: ana@example.com\n\
             Mensaje: Hola & chau\n\n\
             Enviado desde la web."
        );
    }

    #[test]
    fn test_greeting_follows_mode() {
        let mut f = form();
        f.mode = ContactMode::Consulta;
        assert!(
            f.message_text("Guido")
                .starts_with("Hola Guido, tengo una consulta sobre este proceso.")
        );
    }

    #[test]
    fn test_validation_messages() {
        let mut f = ContactForm::default();
        let errors = f.validate();
        assert_eq!(errors.name, Some(NAME_REQUIRED));
        assert_eq!(errors.email, Some(EMAIL_REQUIRED));

        f.name = "   ".into();
        f.email = "ana@example".into();
        let errors = f.validate();
        assert_eq!(errors.name, Some(NAME_REQUIRED));
        assert_eq!(errors.email, Some(EMAIL_INVALID));

        assert!(matches!(
            f.messaging_link(&PhoneNumber::default(), "Guido"),
            Err(LinkError::Invalid(_))
        ));

        assert!(form().is_valid());
    }

    #[test]
    fn test_email_shapes() {
        for ok in ["a@b.c", "x y@z.io", "first.last@mail.example.org"] {
            assert!(looks_like_email(ok), "{}", ok);
        }
        for bad in ["", "@b.c", "a@.c", "a@b.", "a@b", "a b@c"] {
            assert!(!looks_like_email(bad), "{}", bad);
        }
    }

    #[test]
    fn test_prefill_from_query() {
        let p = Prefill::from_query("?mode=sesion&msg=Quiero%20agendar").unwrap();
        assert_eq!(p.mode, Some(ContactMode::Sesion));
        assert_eq!(p.message, "Quiero agendar");

        let p = Prefill::from_query("msg=hola").unwrap();
        assert_eq!(p.mode, None);

        assert_eq!(Prefill::from_query("mode=otro"), None);
        assert_eq!(Prefill::from_query("pin=2233"), None);

        let mut f = ContactForm::default();
        f.message = "previo".into();
        f.apply_prefill(&Prefill {
            mode: Some(ContactMode::Sesion),
            message: String::new(),
        });
        assert_eq!(f.mode, ContactMode::Sesion);
        assert_eq!(f.message, "previo");
    }

    #[test]
    fn test_mode_deserialization() {
        let cases = vec![
            ("\"consulta\"", ContactMode::Consulta),
            ("\"sesion\"", ContactMode::Sesion),
        ];
        for (json, expected) in cases {
            let deserialized: ContactMode = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
        assert!(serde_json::from_str::<ContactMode>("\"SESION\"").is_err());
        assert_eq!(ContactMode::Sesion.to_string(), "sesion");
    }

    #[test]
    fn test_prefill_mode_is_case_sensitive() {
        for query in ["mode=SESION", "mode=Sesion", "mode=Consulta"] {
            assert_eq!(Prefill::from_query(query), None, "{}", query);
        }
        assert_eq!(
            Prefill::from_query("mode=Sesion&msg=hola").and_then(|p| p.mode),
            None
        );
    }
}

//! Launch links such as `aura://open?pin=2233&mode=sesion`.

use aurakit::contact::Prefill;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchLink {
    pub query: String,
}

impl LaunchLink {
    /// Accepts a full URL, a bare `?query` or a bare `key=value&...` string.
    pub fn parse(arg: &str) -> Option<Self> {
        let arg = arg.trim();
        if arg.is_empty() {
            return None;
        }

        let query = match Url::parse(arg) {
            Ok(url) => url.query().unwrap_or_default().to_string(),
            Err(_) if arg.starts_with('?') || arg.contains('=') => {
                arg.trim_start_matches('?').to_string()
            }
            Err(e) => {
                log::warn!("Ignoring launch argument '{}': {}", arg, e);
                return None;
            }
        };

        Some(Self { query })
    }

    pub fn from_args(args: impl IntoIterator<Item = String>) -> Option<Self> {
        args.into_iter().find_map(|a| Self::parse(&a))
    }

    pub fn prefill(&self) -> Option<Prefill> {
        Prefill::from_query(&self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurakit::contact::ContactMode;

    #[test]
    fn test_link_shapes() {
        for arg in [
            "aura://open?pin=2233&mode=sesion",
            "?pin=2233&mode=sesion",
            "pin=2233&mode=sesion",
        ] {
            let link = LaunchLink::parse(arg).unwrap();
            assert_eq!(link.query, "pin=2233&mode=sesion", "{}", arg);
            assert_eq!(link.prefill().unwrap().mode, Some(ContactMode::Sesion));
        }
        assert_eq!(LaunchLink::parse(""), None);
        assert_eq!(LaunchLink::parse("--verbose"), None);
    }

    #[test]
    fn test_first_usable_argument_wins() {
        let args = vec!["".to_string(), "?msg=hola".to_string(), "?pin=1".to_string()];
        let link = LaunchLink::from_args(args).unwrap();
        assert_eq!(link.query, "msg=hola");
    }
}

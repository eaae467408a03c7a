//! Request-scoped user identity.

pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// Resolves the name of the user behind the current request, if any.
pub trait UserAccessor: Send + Sync {
    fn username(&self) -> Option<String>;
}

/// Pick a comment author: the explicit value, then the request identity,
/// then [`ANONYMOUS_AUTHOR`].
pub fn resolve_author(explicit: Option<&str>, accessor: &dyn UserAccessor) -> String {
    explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| accessor.username())
        .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl UserAccessor for Fixed {
        fn username(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn explicit_author_wins() {
        assert_eq!(resolve_author(Some(" Ada "), &Fixed(Some("proxy"))), "Ada");
    }

    #[test]
    fn falls_back_to_request_identity() {
        assert_eq!(resolve_author(Some("  "), &Fixed(Some("proxy"))), "proxy");
    }

    #[test]
    fn defaults_to_anonymous() {
        assert_eq!(resolve_author(None, &Fixed(None)), ANONYMOUS_AUTHOR);
    }
}

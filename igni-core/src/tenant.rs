//! Bearer-token to tenant resolution, injected as a single function so the
//! real account system can replace it without touching route code
//! (SPEC_FULL.md §6).

use std::collections::HashMap;
use std::sync::Arc;

use crate::ids::TenantId;

pub type TokenResolver = Arc<dyn Fn(&str) -> Option<TenantId> + Send + Sync>;

/// An in-memory `token -> tenant` map, used by this crate's own tests and
/// as a conservative default when no real account system is wired in.
pub fn static_resolver(tokens: HashMap<String, TenantId>) -> TokenResolver {
    Arc::new(move |token: &str| tokens.get(token).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_token_only() {
        let mut tokens = HashMap::new();
        tokens.insert("secret".to_string(), TenantId("acme".into()));
        let resolver = static_resolver(tokens);
        assert_eq!(resolver("secret"), Some(TenantId("acme".into())));
        assert_eq!(resolver("other"), None);
    }
}

use quiz_core::model::UserId;

/// Identity provider consulted when a finished session persists its score.
///
/// Nothing else in the engine cares who the user is, so the contract is a
/// single lookup at persistence time.
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, or `None` when nobody is authenticated.
    fn current_user(&self) -> Option<UserId>;
}

/// `AuthProvider` with a fixed answer, for embedding and tests.
#[derive(Debug, Clone)]
pub struct StaticAuthProvider {
    user: Option<UserId>,
}

impl StaticAuthProvider {
    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl AuthProvider for StaticAuthProvider {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_provider_reports_fixed_identity() {
        let signed_in = StaticAuthProvider::signed_in(UserId::new("uid-1"));
        assert_eq!(signed_in.current_user(), Some(UserId::new("uid-1")));

        let signed_out = StaticAuthProvider::signed_out();
        assert_eq!(signed_out.current_user(), None);
    }
}

use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update,
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(&'static str),
}

impl Access {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied(reason) => Err(Error::Forbidden(reason.to_string())),
        }
    }
}

/// Only the author may change or remove a post or comment.
pub fn check_author(actor: Option<Uuid>, owner: Uuid, action: Action) -> Access {
    if actor == Some(owner) {
        return Access::Allowed;
    }

    match action {
        Action::Update => Access::Denied("Editing someone else's content is forbidden!"),
        Action::Destroy => Access::Denied("Deleting someone else's content is forbidden!"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_is_allowed() {
        let owner = Uuid::now_v7();
        assert!(check_author(Some(owner), owner, Action::Update).is_allowed());
        assert!(check_author(Some(owner), owner, Action::Destroy).is_allowed());
    }

    #[test]
    fn stranger_is_denied_with_action_specific_reason() {
        let owner = Uuid::now_v7();
        let stranger = Some(Uuid::now_v7());

        assert_eq!(
            check_author(stranger, owner, Action::Update),
            Access::Denied("Editing someone else's content is forbidden!")
        );
        assert_eq!(
            check_author(stranger, owner, Action::Destroy),
            Access::Denied("Deleting someone else's content is forbidden!")
        );
    }

    #[test]
    fn anonymous_is_denied() {
        let err = check_author(None, Uuid::now_v7(), Action::Update)
            .into_result()
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }
}

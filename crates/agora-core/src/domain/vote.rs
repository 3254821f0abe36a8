use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// An active upvote. Its existence is the whole signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: Uuid,
    pub post_id: Uuid,
}

impl Vote {
    pub fn new(user_id: Uuid, post_id: Uuid) -> Self {
        Self { user_id, post_id }
    }
}

/// What a vote request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Upvote,
    RemoveVote,
}

/// Wire encoding: `1` adds a vote, `0` removes it. Anything else is rejected.
impl TryFrom<i32> for VoteDirection {
    type Error = DomainError;

    fn try_from(dir: i32) -> Result<Self, Self::Error> {
        match dir {
            1 => Ok(VoteDirection::Upvote),
            0 => Ok(VoteDirection::RemoveVote),
            other => Err(DomainError::Validation(format!(
                "dir must be 0 or 1, got {other}"
            ))),
        }
    }
}

/// Result of a successful vote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Added,
    Removed,
}

impl VoteOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            VoteOutcome::Added => "Successfully added vote",
            VoteOutcome::Removed => "Successfully deleted vote",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_decoding() {
        assert_eq!(VoteDirection::try_from(1).unwrap(), VoteDirection::Upvote);
        assert_eq!(
            VoteDirection::try_from(0).unwrap(),
            VoteDirection::RemoveVote
        );
    }

    #[test]
    fn test_out_of_domain_direction_is_rejected() {
        for dir in [-1, 2, i32::MIN] {
            assert!(matches!(
                VoteDirection::try_from(dir),
                Err(DomainError::Validation(_))
            ));
        }
    }
}
